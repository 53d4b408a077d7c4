//! Feature encoding for loan default model inference.
//!
//! Turns a raw application into the 22-column row the scaler and classifier
//! were fitted on. The scaler is positional, so [`FEATURE_NAMES`] and
//! [`FeatureVector::to_row`] must stay in lockstep with the training columns.

use crate::error::EncodeError;
use crate::types::application::{
    Categorical, ClusterDomain, Education, EmploymentType, LoanPurpose, MaritalStatus,
    RawApplication, YesNo,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of model input columns.
pub const FEATURE_COUNT: usize = 22;

/// Column names in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    // Raw numeric (9)
    "Age",
    "Income",
    "LoanAmount",
    "CreditScore",
    "MonthsEmployed",
    "NumCreditLines",
    "InterestRate",
    "LoanTerm",
    "DTIRatio",
    // Categorical codes (7)
    "Education",
    "EmploymentType",
    "MaritalStatus",
    "HasMortgage",
    "HasDependents",
    "LoanPurpose",
    "HasCoSigner",
    // Segment
    "Cluster",
    // Engineered (5)
    "LoanAmount_to_Income",
    "InterestRate_Term",
    "DTIRatio_to_LoanAmount",
    "CreditScore_Income",
    "Age_EmploymentType",
];

/// Encoded application, one named field per model column.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "Income")]
    pub income: f64,
    #[serde(rename = "LoanAmount")]
    pub loan_amount: f64,
    #[serde(rename = "CreditScore")]
    pub credit_score: f64,
    #[serde(rename = "MonthsEmployed")]
    pub months_employed: f64,
    #[serde(rename = "NumCreditLines")]
    pub num_credit_lines: f64,
    #[serde(rename = "InterestRate")]
    pub interest_rate: f64,
    #[serde(rename = "LoanTerm")]
    pub loan_term: f64,
    #[serde(rename = "DTIRatio")]
    pub dti_ratio: f64,
    #[serde(rename = "Education")]
    pub education: f64,
    #[serde(rename = "EmploymentType")]
    pub employment_type: f64,
    #[serde(rename = "MaritalStatus")]
    pub marital_status: f64,
    #[serde(rename = "HasMortgage")]
    pub has_mortgage: f64,
    #[serde(rename = "HasDependents")]
    pub has_dependents: f64,
    #[serde(rename = "LoanPurpose")]
    pub loan_purpose: f64,
    #[serde(rename = "HasCoSigner")]
    pub has_co_signer: f64,
    #[serde(rename = "Cluster")]
    pub cluster: f64,
    #[serde(rename = "LoanAmount_to_Income")]
    pub loan_amount_to_income: f64,
    #[serde(rename = "InterestRate_Term")]
    pub interest_rate_term: f64,
    #[serde(rename = "DTIRatio_to_LoanAmount")]
    pub dti_ratio_to_loan_amount: f64,
    #[serde(rename = "CreditScore_Income")]
    pub credit_score_income: f64,
    #[serde(rename = "Age_EmploymentType")]
    pub age_employment_type: f64,
}

impl FeatureVector {
    /// Flatten into a row ordered as [`FEATURE_NAMES`].
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.income,
            self.loan_amount,
            self.credit_score,
            self.months_employed,
            self.num_credit_lines,
            self.interest_rate,
            self.loan_term,
            self.dti_ratio,
            self.education,
            self.employment_type,
            self.marital_status,
            self.has_mortgage,
            self.has_dependents,
            self.loan_purpose,
            self.has_co_signer,
            self.cluster,
            self.loan_amount_to_income,
            self.interest_rate_term,
            self.dti_ratio_to_loan_amount,
            self.credit_score_income,
            self.age_employment_type,
        ]
    }

    /// Look up a column by its training name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.to_row()[i])
    }

    /// Name/value pairs in column order.
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES.iter().copied().zip(self.to_row()).collect()
    }
}

/// Encoder that transforms raw applications into model input features.
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    cluster_domain: ClusterDomain,
}

impl FeatureEncoder {
    /// Create an encoder for the bounded cluster selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder for a specific cluster input domain.
    pub fn with_cluster_domain(cluster_domain: ClusterDomain) -> Self {
        Self { cluster_domain }
    }

    pub fn cluster_domain(&self) -> ClusterDomain {
        self.cluster_domain
    }

    /// Encode an application.
    ///
    /// Fails when a categorical label (or a selector cluster) falls outside
    /// its closed set, or when any column comes out NaN or infinite. Zero or
    /// negative denominators produce 0 for the affected ratio.
    pub fn encode(&self, raw: &RawApplication) -> Result<FeatureVector, EncodeError> {
        let education = Education::from_label(&raw.education)?.code();
        let employment_type = EmploymentType::from_label(&raw.employment_type)?.code();
        let marital_status = MaritalStatus::from_label(&raw.marital_status)?.code();
        let has_mortgage = YesNo::parse("has_mortgage", &raw.has_mortgage)?.code();
        let has_dependents = YesNo::parse("has_dependents", &raw.has_dependents)?.code();
        let loan_purpose = LoanPurpose::from_label(&raw.loan_purpose)?.code();
        let has_co_signer = YesNo::parse("has_co_signer", &raw.has_co_signer)?.code();
        let cluster = self.encode_cluster(raw.cluster)?;

        let age = raw.age as f64;
        let credit_score = raw.credit_score as f64;
        let loan_term = raw.loan_term as f64;
        let employment_code = employment_type as f64;

        // The product guards are redundant at zero but match what the model was fit on.
        let loan_amount_to_income = if raw.income > 0.0 {
            raw.loan_amount / raw.income
        } else {
            0.0
        };
        let interest_rate_term = if loan_term > 0.0 {
            raw.interest_rate * loan_term
        } else {
            0.0
        };
        let dti_ratio_to_loan_amount = if raw.loan_amount > 0.0 {
            raw.dti_ratio / raw.loan_amount
        } else {
            0.0
        };
        let credit_score_income = if raw.income > 0.0 {
            credit_score * raw.income
        } else {
            0.0
        };
        let age_employment_type = age * employment_code;

        let features = FeatureVector {
            age,
            income: raw.income,
            loan_amount: raw.loan_amount,
            credit_score,
            months_employed: raw.months_employed as f64,
            num_credit_lines: raw.num_credit_lines as f64,
            interest_rate: raw.interest_rate,
            loan_term,
            dti_ratio: raw.dti_ratio,
            education: education as f64,
            employment_type: employment_code,
            marital_status: marital_status as f64,
            has_mortgage: has_mortgage as f64,
            has_dependents: has_dependents as f64,
            loan_purpose: loan_purpose as f64,
            has_co_signer: has_co_signer as f64,
            cluster,
            loan_amount_to_income,
            interest_rate_term,
            dti_ratio_to_loan_amount,
            credit_score_income,
            age_employment_type,
        };

        // Extreme but valid inputs can still overflow a ratio or product
        if let Some((feature, value)) = features
            .named()
            .into_iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(EncodeError::NonFinite { feature, value });
        }
        Ok(features)
    }

    fn encode_cluster(&self, cluster: u32) -> Result<f64, EncodeError> {
        match self.cluster_domain {
            ClusterDomain::Selector => match cluster {
                1..=3 => Ok((cluster - 1) as f64),
                other => Err(EncodeError::ClusterOutOfRange(other)),
            },
            ClusterDomain::Free => {
                // Training used zero-based cluster ids; free entry is not shifted.
                warn!(
                    cluster = cluster,
                    "Free cluster input passed to model without zero-based offset"
                );
                Ok(cluster as f64)
            }
        }
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names in training order.
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}
