//! End-to-end encoding and prediction tests

use loan_default::feature_extractor::{FeatureEncoder, FEATURE_COUNT, FEATURE_NAMES};
use loan_default::models::{Classifier, ClassifierOutput, ModelLoader, Predictor, Scaler};
use loan_default::types::application::{
    Categorical, ClusterDomain, Education, EmploymentType, LoanPurpose, MaritalStatus, YesNo,
};
use loan_default::types::report::Outcome;
use loan_default::{EncodeError, RawApplication};
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

fn scenario() -> RawApplication {
    serde_json::from_str(
        r#"{
            "age": 30, "income": 50000, "loan_amount": 10000, "credit_score": 650,
            "months_employed": 24, "num_credit_lines": 3, "interest_rate": 5.0,
            "loan_term": 36, "dti_ratio": 0.3, "education": "Universidad",
            "employment_type": "Tiempo Completo", "marital_status": "Soltero",
            "has_mortgage": "No", "has_dependents": "No", "loan_purpose": "Educación",
            "has_co_signer": "No", "cluster": 2
        }"#,
    )
    .unwrap()
}

#[test]
fn example_scenario_encodes_to_documented_row() {
    let fv = FeatureEncoder::new().encode(&scenario()).unwrap();

    let expected = [
        ("Age", 30.0),
        ("Income", 50000.0),
        ("LoanAmount", 10000.0),
        ("CreditScore", 650.0),
        ("MonthsEmployed", 24.0),
        ("NumCreditLines", 3.0),
        ("InterestRate", 5.0),
        ("LoanTerm", 36.0),
        ("DTIRatio", 0.3),
        ("Education", 2.0),
        ("EmploymentType", 4.0),
        ("MaritalStatus", 3.0),
        ("HasMortgage", 0.0),
        ("HasDependents", 0.0),
        ("LoanPurpose", 3.0),
        ("HasCoSigner", 0.0),
        ("Cluster", 1.0),
        ("LoanAmount_to_Income", 0.2),
        ("InterestRate_Term", 180.0),
        ("DTIRatio_to_LoanAmount", 0.00003),
        ("CreditScore_Income", 32_500_000.0),
        ("Age_EmploymentType", 120.0),
    ];

    let named = fv.named();
    assert_eq!(named.len(), FEATURE_COUNT);
    for ((name, value), (want_name, want)) in named.iter().zip(expected) {
        assert_eq!(*name, want_name);
        assert!(
            (value - want).abs() <= 1e-12 * want.abs().max(1.0),
            "{name}: {value} != {want}"
        );
    }
}

#[test]
fn every_label_maps_to_its_code() {
    fn check<C: Categorical>(expected: &[(&str, u8)]) {
        assert_eq!(C::LABELS.len(), expected.len());
        for (label, code) in expected {
            assert_eq!(C::from_label(label).unwrap().code(), *code, "{label}");
        }
    }

    check::<Education>(&[
        ("Bachillerato", 1),
        ("Universidad", 2),
        ("Master", 3),
        ("Doctorado", 4),
    ]);
    check::<EmploymentType>(&[
        ("Medio Tiempo", 1),
        ("Desempleado", 2),
        ("Autónomo", 3),
        ("Tiempo Completo", 4),
    ]);
    check::<MaritalStatus>(&[("Casado", 1), ("Divorciado", 2), ("Soltero", 3)]);
    check::<YesNo>(&[("Sí", 1), ("No", 0)]);
    check::<LoanPurpose>(&[
        ("Negocios", 1),
        ("Compra de Vivienda", 2),
        ("Educación", 3),
        ("Compra Automóvil", 4),
        ("Otros", 5),
    ]);
}

#[test]
fn encoded_flags_follow_labels() {
    let app = RawApplication {
        has_mortgage: "Sí".to_string(),
        has_dependents: "No".to_string(),
        has_co_signer: "Sí".to_string(),
        ..scenario()
    };
    let fv = FeatureEncoder::new().encode(&app).unwrap();
    assert_eq!(fv.has_mortgage, 1.0);
    assert_eq!(fv.has_dependents, 0.0);
    assert_eq!(fv.has_co_signer, 1.0);
}

#[test]
fn cluster_selector_is_zero_based() {
    let encoder = FeatureEncoder::new();
    for (selected, code) in [(1, 0.0), (2, 1.0), (3, 2.0)] {
        let app = RawApplication {
            cluster: selected,
            ..scenario()
        };
        assert_eq!(encoder.encode(&app).unwrap().cluster, code);
    }
}

#[test]
fn free_cluster_is_not_shifted() {
    let encoder = FeatureEncoder::with_cluster_domain(ClusterDomain::Free);
    let app = RawApplication {
        cluster: 2,
        ..scenario()
    };
    assert_eq!(encoder.encode(&app).unwrap().cluster, 2.0);
}

#[test]
fn unknown_labels_fail() {
    let encoder = FeatureEncoder::new();

    let app = RawApplication {
        education: "PhD".to_string(),
        ..scenario()
    };
    match encoder.encode(&app) {
        Err(EncodeError::UnknownLabel { field, value, .. }) => {
            assert_eq!(field, "education");
            assert_eq!(value, "PhD");
        }
        other => panic!("expected contract violation, got {other:?}"),
    }

    let app = RawApplication {
        has_co_signer: "Yes".to_string(),
        ..scenario()
    };
    assert!(matches!(
        encoder.encode(&app),
        Err(EncodeError::UnknownLabel {
            field: "has_co_signer",
            ..
        })
    ));

    // Labels are exact; no case folding or trimming
    let app = RawApplication {
        loan_purpose: "otros".to_string(),
        ..scenario()
    };
    assert!(encoder.encode(&app).is_err());
}

#[test]
fn degenerate_denominators_yield_zero() {
    let encoder = FeatureEncoder::new();

    let app = RawApplication {
        income: 0.0,
        ..scenario()
    };
    let fv = encoder.encode(&app).unwrap();
    assert_eq!(fv.loan_amount_to_income, 0.0);
    assert_eq!(fv.credit_score_income, 0.0);

    let app = RawApplication {
        loan_amount: 0.0,
        ..scenario()
    };
    assert_eq!(encoder.encode(&app).unwrap().dti_ratio_to_loan_amount, 0.0);

    let app = RawApplication {
        loan_term: 0,
        ..scenario()
    };
    assert_eq!(encoder.encode(&app).unwrap().interest_rate_term, 0.0);
}

/// Records the row it receives and returns a fixed answer
struct RecordingClassifier {
    seen: Rc<RefCell<Vec<f64>>>,
    output: ClassifierOutput,
}

impl Classifier for RecordingClassifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn classify(&self, row: &[f64]) -> anyhow::Result<ClassifierOutput> {
        *self.seen.borrow_mut() = row.to_vec();
        Ok(self.output)
    }
}

#[test]
fn predictor_scales_before_classifying() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scaler.json");

    // Centre every column on the scenario, unit scale except Income
    let row = FeatureEncoder::new().encode(&scenario()).unwrap().to_row();
    let mut scale = vec![1.0; FEATURE_COUNT];
    scale[1] = 10_000.0;
    let artifact = serde_json::json!({
        "feature_names_in_": FEATURE_NAMES,
        "mean_": row.to_vec(),
        "scale_": scale,
    });
    fs::write(&path, artifact.to_string()).unwrap();

    let scaler = ModelLoader::load_scaler(&path).unwrap();
    assert!(scaler.verify_feature_names(&FEATURE_NAMES).is_ok());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let classifier = RecordingClassifier {
        seen: Rc::clone(&seen),
        output: ClassifierOutput {
            label: 1,
            probabilities: [0.27, 0.73],
        },
    };
    let predictor =
        Predictor::from_parts(FeatureEncoder::new(), Box::new(scaler), Box::new(classifier), true)
            .unwrap();

    let app = RawApplication {
        income: 70_000.0,
        ..scenario()
    };
    let report = predictor.predict(&app).unwrap();

    assert_eq!(report.outcome, Outcome::Default);
    assert_eq!(report.default_probability, 0.73);
    assert_eq!(report.probability_percent(), "73.00%");
    assert_eq!(report.features.income, 70_000.0);

    let seen = seen.borrow();
    assert_eq!(seen.len(), FEATURE_COUNT);
    assert_eq!(seen[0], 0.0);
    assert!((seen[1] - 2.0).abs() < 1e-12);
}

#[test]
fn label_zero_reports_no_default() {
    let classifier = RecordingClassifier {
        seen: Rc::new(RefCell::new(Vec::new())),
        output: ClassifierOutput {
            label: 0,
            probabilities: [0.9, 0.1],
        },
    };
    assert_eq!(classifier.predict(&[0.0; 22]).unwrap(), 0);
    assert_eq!(classifier.predict_proba(&[0.0; 22]).unwrap(), [0.9, 0.1]);

    let scaler = loan_default::models::StandardScaler::new(
        None,
        vec![0.0; FEATURE_COUNT],
        vec![1.0; FEATURE_COUNT],
    )
    .unwrap();
    let predictor =
        Predictor::from_parts(FeatureEncoder::new(), Box::new(scaler), Box::new(classifier), true)
            .unwrap();

    let report = predictor.predict(&scenario()).unwrap();
    assert_eq!(report.outcome, Outcome::NoDefault);
    assert_eq!(report.default_probability, 0.1);
}
