//! Prediction report data structures

use crate::feature_extractor::FeatureVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicted loan outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Class 1: the applicant defaults
    #[serde(rename = "Impago")]
    Default,
    /// Class 0
    #[serde(rename = "No Impago")]
    NoDefault,
}

impl Outcome {
    /// Map a binary classifier label to an outcome (1 = default, 0 = no default)
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            1 => Some(Outcome::Default),
            0 => Some(Outcome::NoDefault),
            _ => None,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Default => "Impago",
            Outcome::NoDefault => "No Impago",
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Outcome::Default)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of running one application through the predictor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// Unique report identifier
    pub prediction_id: String,

    /// Predicted outcome
    pub outcome: Outcome,

    /// Probability of class 1 (0.0 - 1.0)
    pub default_probability: f64,

    /// Encoded features as sent to the scaler
    pub features: FeatureVector,

    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl PredictionReport {
    /// Create a new report
    pub fn new(outcome: Outcome, default_probability: f64, features: FeatureVector) -> Self {
        Self {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            outcome,
            default_probability,
            features,
            timestamp: Utc::now(),
        }
    }

    /// Default probability formatted as a percentage with two decimals
    pub fn probability_percent(&self) -> String {
        format!("{:.2}%", self.default_probability * 100.0)
    }
}

impl fmt::Display for PredictionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Predicción: {}", self.outcome)?;
        write!(f, "Probabilidad de Impago: {}", self.default_probability)
    }
}
