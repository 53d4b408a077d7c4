//! Pre-fitted artifacts and the prediction path built on them

pub mod inference;
pub mod loader;
pub mod scaler;

use anyhow::{bail, Result};

pub use inference::{OnnxClassifier, Predictor};
pub use loader::ModelLoader;
pub use scaler::StandardScaler;

/// Fitted feature-wise transform applied before inference.
pub trait Scaler {
    /// Column names recorded when the scaler was fitted, if the artifact kept them.
    fn feature_names(&self) -> Option<&[String]>;

    /// Number of columns the scaler was fitted on.
    fn width(&self) -> usize;

    /// Transform one row. The output has the same width as the input.
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>>;

    /// Assert the recorded column names equal `expected`, position by position.
    ///
    /// A scaler without recorded names passes.
    fn verify_feature_names(&self, expected: &[&str]) -> Result<()> {
        let Some(names) = self.feature_names() else {
            return Ok(());
        };

        if names.len() != expected.len() {
            bail!(
                "scaler was fitted on {} columns, encoder produces {}",
                names.len(),
                expected.len()
            );
        }

        for (position, (found, want)) in names.iter().zip(expected).enumerate() {
            if found != want {
                bail!(
                    "feature order mismatch at column {}: scaler has {:?}, encoder has {:?}",
                    position,
                    found,
                    want
                );
            }
        }
        Ok(())
    }
}

/// Output of a binary classifier for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierOutput {
    /// Predicted class (1 = default)
    pub label: i64,
    /// Class probabilities `[p0, p1]`
    pub probabilities: [f64; 2],
}

impl ClassifierOutput {
    /// Build an output from the positive-class probability alone.
    ///
    /// The label is the argmax, with ties going to class 0.
    pub fn from_positive_probability(p1: f64) -> Self {
        Self {
            label: if p1 > 0.5 { 1 } else { 0 },
            probabilities: [1.0 - p1, p1],
        }
    }
}

/// Fitted binary classifier.
pub trait Classifier {
    fn name(&self) -> &str;

    /// Run the model once, returning both label and probabilities.
    fn classify(&self, row: &[f64]) -> Result<ClassifierOutput>;

    fn predict(&self, row: &[f64]) -> Result<i64> {
        Ok(self.classify(row)?.label)
    }

    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2]> {
        Ok(self.classify(row)?.probabilities)
    }
}
