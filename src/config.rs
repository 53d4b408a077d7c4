//! Configuration management for the loan default predictor

use crate::form::FormVariant;
use crate::types::application::ClusterDomain;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub form: FormConfig,
    pub logging: LoggingConfig,
}

/// Pre-fitted artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory containing the artifacts
    pub models_dir: String,
    /// Scaler JSON file name, relative to `models_dir`
    #[serde(default = "default_scaler")]
    pub scaler: String,
    /// Classifier ONNX file name, relative to `models_dir`
    #[serde(default = "default_classifier")]
    pub classifier: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Check the scaler's recorded column names at startup
    #[serde(default = "default_verify_feature_names")]
    pub verify_feature_names: bool,
}

fn default_scaler() -> String {
    "scaler.json".to_string()
}

fn default_classifier() -> String {
    "model_lgbm.onnx".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

fn default_verify_feature_names() -> bool {
    true
}

impl ArtifactsConfig {
    pub fn scaler_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.scaler)
    }

    pub fn classifier_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.classifier)
    }
}

/// Input form presentation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormConfig {
    /// Presentation variant: "plain", "styled" or "colored"
    #[serde(default)]
    pub variant: FormVariant,
    /// Override of the variant's cluster widget
    #[serde(default)]
    pub cluster_input: Option<ClusterDomain>,
}

impl FormConfig {
    /// Cluster domain in effect: the override if set, otherwise the variant's.
    pub fn cluster_domain(&self) -> ClusterDomain {
        self.cluster_input
            .unwrap_or_else(|| self.variant.cluster_domain())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                models_dir: "models".to_string(),
                scaler: default_scaler(),
                classifier: default_classifier(),
                onnx_threads: 1,
                verify_feature_names: true,
            },
            form: FormConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
