//! Type definitions for the loan default predictor

pub mod application;
pub mod report;

pub use application::{ClusterDomain, RawApplication};
pub use report::{Outcome, PredictionReport};
