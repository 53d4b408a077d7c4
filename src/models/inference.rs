//! Classifier inference and the end-to-end predictor

use super::loader::{LoadedModel, ModelLoader};
use super::{Classifier, ClassifierOutput, Scaler};
use crate::config::AppConfig;
use crate::feature_extractor::{FeatureEncoder, FEATURE_COUNT, FEATURE_NAMES};
use crate::types::application::RawApplication;
use crate::types::report::{Outcome, PredictionReport};
use anyhow::{anyhow, bail, Context, Result};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::sync::Mutex;
use tracing::{debug, info};

/// Binary classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    name: String,
    /// Session runs need exclusive access
    model: Mutex<LoadedModel>,
}

impl OnnxClassifier {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            name: model.name.clone(),
            model: Mutex::new(model),
        }
    }

    /// Extract default probability from model output.
    /// Handles both tensor outputs and seq(map) outputs (ZipMap exports).
    fn extract_probability(
        &self,
        outputs: &ort::session::SessionOutputs,
        output_name: &str,
    ) -> Result<f64> {
        if let Some(output) = outputs.get(output_name) {
            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                let prob = self.extract_default_prob_from_tensor(&shape, data)?;
                debug!(model = %self.name, prob = prob, "Extracted from tensor");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                return self.extract_from_sequence_map(output);
            }
        }

        // Fallback: any non-label output that holds probabilities
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }

            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                let prob = self.extract_default_prob_from_tensor(&shape, data)?;
                debug!(model = %self.name, output = %name, prob = prob, "Extracted from tensor (fallback)");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = self.extract_from_sequence_map(&output) {
                    return Ok(prob);
                }
            }
        }

        bail!("model {} produced no probability output", self.name)
    }

    /// Extract probability from seq(map(int64, float)) format
    fn extract_from_sequence_map(&self, output: &ort::value::DynValue) -> Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

        // batch size is always 1
        let map_value = maps.first().ok_or_else(|| anyhow!("Empty sequence"))?;
        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

        if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
            debug!(model = %self.name, prob = *prob, "Extracted from seq(map)");
            return Ok(*prob as f64);
        }

        if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
            return Ok(1.0 - *prob as f64);
        }

        Err(anyhow!("No probability found in map"))
    }

    /// Extract default-class probability from tensor data
    fn extract_default_prob_from_tensor(&self, shape: &ort::tensor::Shape, data: &[f32]) -> Result<f64> {
        let dims: Vec<i64> = shape.iter().copied().collect();
        let num_classes = dims.last().copied().unwrap_or(0);

        // [batch, classes] or [classes]; class 1 is the default probability
        let prob = match (dims.len(), num_classes) {
            (1 | 2, n) if n >= 2 => data.get(1),
            (1 | 2, 1) => data.first(),
            _ => None,
        };

        prob.map(|&p| p as f64)
            .ok_or_else(|| anyhow!("unexpected probability tensor shape {:?}", dims))
    }

    fn extract_label(outputs: &ort::session::SessionOutputs, label_name: &str) -> Option<i64> {
        let output = outputs.get(label_name)?;
        let (_, data) = output.try_extract_tensor::<i64>().ok()?;
        data.first().copied()
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, row: &[f64]) -> Result<ClassifierOutput> {
        use ort::value::Tensor;

        // Prepare input tensor - shape [1, num_features]
        let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features)).context("Failed to create input tensor")?;

        let mut guard = self
            .model
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;
        let model = &mut *guard;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        let p1 = self.extract_probability(&outputs, &model.output_name)?;
        let mut result = ClassifierOutput::from_positive_probability(p1);

        if let Some(label) = model
            .label_name
            .as_deref()
            .and_then(|name| Self::extract_label(&outputs, name))
        {
            result.label = label;
        }

        Ok(result)
    }
}

/// Encoder, scaler and classifier wired together
pub struct Predictor {
    encoder: FeatureEncoder,
    scaler: Box<dyn Scaler>,
    classifier: Box<dyn Classifier>,
}

impl Predictor {
    /// Load artifacts from configuration. Any load or verification failure is fatal.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let artifacts = &config.artifacts;
        let scaler = ModelLoader::load_scaler(artifacts.scaler_path())?;

        let loader = ModelLoader::with_threads(artifacts.onnx_threads)?;
        let model = loader.load_model(artifacts.classifier_path(), &artifacts.classifier)?;

        let encoder = FeatureEncoder::with_cluster_domain(config.form.cluster_domain());

        Self::from_parts(
            encoder,
            Box::new(scaler),
            Box::new(OnnxClassifier::new(model)),
            artifacts.verify_feature_names,
        )
    }

    /// Assemble a predictor from already-loaded parts.
    pub fn from_parts(
        encoder: FeatureEncoder,
        scaler: Box<dyn Scaler>,
        classifier: Box<dyn Classifier>,
        verify_feature_names: bool,
    ) -> Result<Self> {
        if scaler.width() != FEATURE_COUNT {
            bail!(
                "scaler was fitted on {} columns, encoder produces {}",
                scaler.width(),
                FEATURE_COUNT
            );
        }

        if verify_feature_names {
            scaler
                .verify_feature_names(&FEATURE_NAMES)
                .context("Scaler does not match the encoder's feature order")?;
        }

        info!(
            classifier = %classifier.name(),
            cluster_domain = ?encoder.cluster_domain(),
            features = encoder.feature_count(),
            verified = verify_feature_names && scaler.feature_names().is_some(),
            "Predictor initialized"
        );

        Ok(Self {
            encoder,
            scaler,
            classifier,
        })
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Validate, encode, scale and classify one application.
    pub fn predict(&self, application: &RawApplication) -> Result<PredictionReport> {
        application.validate()?;

        let features = self.encoder.encode(application)?;
        debug!(features = ?features.named(), "Application encoded");

        let scaled = self.scaler.transform(&features.to_row())?;
        let output = self.classifier.classify(&scaled)?;

        let outcome = Outcome::from_label(output.label).ok_or_else(|| {
            anyhow!(
                "classifier {} returned non-binary label {}",
                self.classifier.name(),
                output.label
            )
        })?;
        let report = PredictionReport::new(outcome, output.probabilities[1], features);

        info!(
            prediction_id = %report.prediction_id,
            outcome = %report.outcome,
            default_probability = report.default_probability,
            "Prediction complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StandardScaler;

    /// Logistic model over the scaled row
    struct LinearStub {
        weights: Vec<f64>,
    }

    impl Classifier for LinearStub {
        fn name(&self) -> &str {
            "linear-stub"
        }

        fn classify(&self, row: &[f64]) -> Result<ClassifierOutput> {
            if row.len() != self.weights.len() {
                bail!("expected {} columns", self.weights.len());
            }
            let z: f64 = row.iter().zip(&self.weights).map(|(x, w)| x * w).sum();
            Ok(ClassifierOutput::from_positive_probability(1.0 / (1.0 + (-z).exp())))
        }
    }

    fn identity_scaler(names: bool) -> StandardScaler {
        let names = names.then(|| FEATURE_NAMES.iter().map(|s| s.to_string()).collect());
        StandardScaler::new(names, vec![0.0; 22], vec![1.0; 22]).unwrap()
    }

    fn predictor(weights: Vec<f64>) -> Predictor {
        Predictor::from_parts(
            FeatureEncoder::new(),
            Box::new(identity_scaler(true)),
            Box::new(LinearStub { weights }),
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_predict_default_and_no_default() {
        let app = RawApplication {
            age: 30,
            ..RawApplication::default()
        };

        // Only Age contributes
        let mut weights = vec![0.0; 22];
        weights[0] = 1.0;
        let report = predictor(weights.clone()).predict(&app).unwrap();
        assert_eq!(report.outcome, Outcome::Default);
        assert!(report.default_probability > 0.99);
        assert_eq!(report.features.age, 30.0);

        weights[0] = -1.0;
        let report = predictor(weights).predict(&app).unwrap();
        assert_eq!(report.outcome, Outcome::NoDefault);
        assert!(report.default_probability < 0.01);
    }

    #[test]
    fn test_contract_violation_propagates() {
        let app = RawApplication {
            education: "PhD".to_string(),
            ..RawApplication::default()
        };
        let err = predictor(vec![0.0; 22]).predict(&app).unwrap_err();
        assert!(err.to_string().contains("PhD"));
    }

    #[test]
    fn test_mismatched_scaler_names_rejected() {
        let mut names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        names.swap(1, 2);
        let scaler = StandardScaler::new(Some(names), vec![0.0; 22], vec![1.0; 22]).unwrap();

        let result = Predictor::from_parts(
            FeatureEncoder::new(),
            Box::new(scaler),
            Box::new(LinearStub { weights: vec![0.0; 22] }),
            true,
        );
        let err = result.err().unwrap();
        assert!(format!("{:#}", err).contains("column 1"));
    }

    #[test]
    fn test_verification_can_be_disabled() {
        let scaler = StandardScaler::new(
            Some((0..22).map(|i| format!("f{i}")).collect()),
            vec![0.0; 22],
            vec![1.0; 22],
        )
        .unwrap();

        assert!(Predictor::from_parts(
            FeatureEncoder::new(),
            Box::new(scaler),
            Box::new(LinearStub { weights: vec![0.0; 22] }),
            false,
        )
        .is_ok());
    }

    #[test]
    fn test_scaler_width_mismatch_fails_at_startup() {
        // No recorded names, so only the width can catch it
        let scaler = StandardScaler::new(None, vec![0.0; 21], vec![1.0; 21]).unwrap();
        let result = Predictor::from_parts(
            FeatureEncoder::new(),
            Box::new(scaler),
            Box::new(LinearStub { weights: vec![0.0; 22] }),
            false,
        );

        let err = result.err().unwrap();
        assert!(err.to_string().contains("fitted on 21 columns"));
    }

    #[test]
    fn test_invalid_numerics_never_reach_classifier() {
        let predictor = predictor(vec![0.0; 22]);

        let app = RawApplication {
            interest_rate: f64::NAN,
            ..RawApplication::default()
        };
        let err = predictor.predict(&app).unwrap_err();
        assert!(err.to_string().contains("interest_rate"));

        let app = RawApplication {
            income: -5.0,
            ..RawApplication::default()
        };
        let err = predictor.predict(&app).unwrap_err();
        assert!(err.to_string().contains("income must be >= 0"));
    }

    /// Returns a fixed output whatever the row
    struct FixedOutput(ClassifierOutput);

    impl Classifier for FixedOutput {
        fn name(&self) -> &str {
            "fixed"
        }

        fn classify(&self, _row: &[f64]) -> Result<ClassifierOutput> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_non_binary_label_is_an_error() {
        let predictor = Predictor::from_parts(
            FeatureEncoder::new(),
            Box::new(identity_scaler(true)),
            Box::new(FixedOutput(ClassifierOutput {
                label: 7,
                probabilities: [0.1, 0.9],
            })),
            true,
        )
        .unwrap();

        let err = predictor.predict(&RawApplication::default()).unwrap_err();
        assert!(err.to_string().contains("non-binary label 7"));
    }
}
