//! Loan Default Predictor Library
//!
//! Encodes personal-loan applications into the feature row a pre-fitted
//! scaler and classifier expect, and runs them to predict default.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod form;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::{EncodeError, InputError};
pub use feature_extractor::{FeatureEncoder, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use form::{Form, FormVariant};
pub use models::Predictor;
pub use types::{application::RawApplication, report::PredictionReport};
