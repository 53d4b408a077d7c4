//! Standard scaler restored from a JSON export

use super::Scaler;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Fitted standardization: `(x - mean) / scale` per column.
///
/// Mirrors the attributes a fitted standard scaler exposes (`mean_`,
/// `scale_`, `feature_names_in_`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column names seen at fit time
    #[serde(default, alias = "feature_names_in_")]
    pub feature_names: Option<Vec<String>>,
    /// Per-column mean
    #[serde(alias = "mean_")]
    pub mean: Vec<f64>,
    /// Per-column standard deviation
    #[serde(alias = "scale_")]
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler, checking the parameter widths agree.
    pub fn new(feature_names: Option<Vec<String>>, mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let scaler = Self {
            feature_names,
            mean,
            scale,
        };
        scaler.check_shape()?;
        Ok(scaler)
    }

    /// Parse a scaler from its JSON export.
    pub fn from_json(json: &str) -> Result<Self> {
        let scaler: Self = serde_json::from_str(json)?;
        scaler.check_shape()?;
        Ok(scaler)
    }

    fn check_shape(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            bail!(
                "scaler mean has {} columns but scale has {}",
                self.mean.len(),
                self.scale.len()
            );
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.mean.len() {
                bail!(
                    "scaler records {} feature names for {} columns",
                    names.len(),
                    self.mean.len()
                );
            }
        }
        if let Some(i) = self.mean.iter().chain(&self.scale).position(|v| !v.is_finite()) {
            bail!("scaler parameter {} is not finite", i % self.mean.len().max(1));
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn width(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            bail!(
                "scaler expects {} columns, got {}",
                self.width(),
                row.len()
            );
        }

        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (&mean, &scale))| {
                // Constant columns were fitted with zero variance
                let scale = if scale == 0.0 { 1.0 } else { scale };
                (x - mean) / scale
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform() {
        let scaler = StandardScaler::new(None, vec![10.0, 0.0, 5.0], vec![2.0, 1.0, 0.0]).unwrap();
        let out = scaler.transform(&[14.0, -3.0, 7.0]).unwrap();
        assert_eq!(out, vec![2.0, -3.0, 2.0]);
    }

    #[test]
    fn test_transform_width_mismatch() {
        let scaler = StandardScaler::new(None, vec![0.0; 3], vec![1.0; 3]).unwrap();
        assert!(scaler.transform(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_from_json_with_sklearn_attribute_names() {
        let json = r#"{"feature_names_in_": ["a", "b"], "mean_": [1.0, 2.0], "scale_": [0.5, 4.0]}"#;
        let scaler = StandardScaler::from_json(json).unwrap();
        assert_eq!(scaler.width(), 2);
        assert_eq!(scaler.feature_names().unwrap()[1], "b");
        assert_eq!(scaler.transform(&[2.0, 6.0]).unwrap(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_shape_checks() {
        assert!(StandardScaler::new(None, vec![0.0; 2], vec![1.0; 3]).is_err());
        assert!(StandardScaler::new(Some(vec!["a".into()]), vec![0.0; 2], vec![1.0; 2]).is_err());
        assert!(StandardScaler::new(None, vec![f64::NAN], vec![1.0]).is_err());
    }

    #[test]
    fn test_verify_feature_names() {
        let names = vec!["Age".to_string(), "Income".to_string()];
        let scaler = StandardScaler::new(Some(names), vec![0.0; 2], vec![1.0; 2]).unwrap();

        assert!(scaler.verify_feature_names(&["Age", "Income"]).is_ok());

        let err = scaler.verify_feature_names(&["Income", "Age"]).unwrap_err();
        assert!(err.to_string().contains("column 0"));

        assert!(scaler.verify_feature_names(&["Age"]).is_err());
    }

    #[test]
    fn test_verify_without_names_passes() {
        let scaler = StandardScaler::new(None, vec![0.0; 2], vec![1.0; 2]).unwrap();
        assert!(scaler.verify_feature_names(&["x", "y", "z"]).is_ok());
    }
}
