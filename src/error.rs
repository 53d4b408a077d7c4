//! Error types for application encoding and input validation

use thiserror::Error;

/// Contract violations raised while encoding an application.
///
/// These are never recovered from: a label outside its closed set means the
/// caller bypassed the enumerated choices of the input surface.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    #[error("unknown {field} label {value:?} (expected one of: {})", .expected.join(", "))]
    UnknownLabel {
        field: &'static str,
        value: String,
        expected: &'static [&'static str],
    },

    #[error("cluster {0} outside selector range 1..=3")]
    ClusterOutOfRange(u32),

    #[error("feature {feature} is not finite ({value})")]
    NonFinite { feature: &'static str, value: f64 },
}

/// Numeric input rejected at the input boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
}
