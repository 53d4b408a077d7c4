//! Loan application data structures

use crate::error::{EncodeError, InputError};
use serde::{Deserialize, Serialize};

/// A closed set of labels with fixed integer codes.
///
/// `LABELS` and `VARIANTS` are parallel: the label at index `i` names the
/// variant at index `i`.
pub trait Categorical: Sized + Copy + PartialEq + 'static {
    /// Field name used in error messages
    const FIELD: &'static str;
    /// Accepted labels in presentation order
    const LABELS: &'static [&'static str];
    /// Variants in presentation order
    const VARIANTS: &'static [Self];

    /// Integer code the model was trained on
    fn code(self) -> u8;

    /// Parse a label, failing on anything outside the closed set.
    fn from_label(label: &str) -> Result<Self, EncodeError> {
        Self::LABELS
            .iter()
            .position(|l| *l == label)
            .map(|i| Self::VARIANTS[i])
            .ok_or_else(|| EncodeError::UnknownLabel {
                field: Self::FIELD,
                value: label.to_string(),
                expected: Self::LABELS,
            })
    }

    /// Presentation label of this variant, if it is listed in `VARIANTS`.
    fn label(self) -> Option<&'static str> {
        Self::VARIANTS
            .iter()
            .zip(Self::LABELS)
            .find(|(variant, _)| **variant == self)
            .map(|(_, label)| *label)
    }
}

/// Education level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Education {
    Bachillerato,
    Universidad,
    Master,
    Doctorado,
}

impl Categorical for Education {
    const FIELD: &'static str = "education";
    const LABELS: &'static [&'static str] = &["Bachillerato", "Universidad", "Master", "Doctorado"];
    const VARIANTS: &'static [Self] = &[
        Self::Bachillerato,
        Self::Universidad,
        Self::Master,
        Self::Doctorado,
    ];

    fn code(self) -> u8 {
        match self {
            Self::Bachillerato => 1,
            Self::Universidad => 2,
            Self::Master => 3,
            Self::Doctorado => 4,
        }
    }
}

/// Employment type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmploymentType {
    PartTime,
    Unemployed,
    SelfEmployed,
    FullTime,
}

impl Categorical for EmploymentType {
    const FIELD: &'static str = "employment_type";
    const LABELS: &'static [&'static str] =
        &["Medio Tiempo", "Desempleado", "Autónomo", "Tiempo Completo"];
    const VARIANTS: &'static [Self] = &[
        Self::PartTime,
        Self::Unemployed,
        Self::SelfEmployed,
        Self::FullTime,
    ];

    fn code(self) -> u8 {
        match self {
            Self::PartTime => 1,
            Self::Unemployed => 2,
            Self::SelfEmployed => 3,
            Self::FullTime => 4,
        }
    }
}

/// Marital status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaritalStatus {
    Married,
    Divorced,
    Single,
}

impl Categorical for MaritalStatus {
    const FIELD: &'static str = "marital_status";
    const LABELS: &'static [&'static str] = &["Casado", "Divorciado", "Soltero"];
    const VARIANTS: &'static [Self] = &[Self::Married, Self::Divorced, Self::Single];

    fn code(self) -> u8 {
        match self {
            Self::Married => 1,
            Self::Divorced => 2,
            Self::Single => 3,
        }
    }
}

/// Loan purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanPurpose {
    Business,
    Home,
    Education,
    Auto,
    Other,
}

impl Categorical for LoanPurpose {
    const FIELD: &'static str = "loan_purpose";
    const LABELS: &'static [&'static str] = &[
        "Negocios",
        "Compra de Vivienda",
        "Educación",
        "Compra Automóvil",
        "Otros",
    ];
    const VARIANTS: &'static [Self] = &[
        Self::Business,
        Self::Home,
        Self::Education,
        Self::Auto,
        Self::Other,
    ];

    fn code(self) -> u8 {
        match self {
            Self::Business => 1,
            Self::Home => 2,
            Self::Education => 3,
            Self::Auto => 4,
            Self::Other => 5,
        }
    }
}

/// Sí/No flag. The field name differs per use, so parsing goes through
/// [`YesNo::parse`] rather than the blanket `from_label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
}

impl Categorical for YesNo {
    const FIELD: &'static str = "flag";
    const LABELS: &'static [&'static str] = &["Sí", "No"];
    const VARIANTS: &'static [Self] = &[Self::Yes, Self::No];

    fn code(self) -> u8 {
        match self {
            Self::Yes => 1,
            Self::No => 0,
        }
    }
}

impl YesNo {
    /// Parse a Sí/No label, reporting `field` on failure.
    pub fn parse(field: &'static str, label: &str) -> Result<Self, EncodeError> {
        Self::from_label(label).map_err(|_| EncodeError::UnknownLabel {
            field,
            value: label.to_string(),
            expected: Self::LABELS,
        })
    }
}

/// How the cluster input is collected and interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClusterDomain {
    /// Bounded selector over {1, 2, 3}, shifted to zero-based codes
    #[default]
    Selector,
    /// Free non-negative number passed to the model unchanged
    Free,
}

/// Raw applicant attributes as entered on the form.
///
/// Categorical fields hold the presentation labels; they are only checked
/// against their closed sets when the application is encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawApplication {
    /// Age in years
    #[serde(alias = "Age")]
    pub age: u32,

    /// Annual income
    #[serde(alias = "Income")]
    pub income: f64,

    #[serde(alias = "LoanAmount")]
    pub loan_amount: f64,

    #[serde(alias = "CreditScore")]
    pub credit_score: u32,

    #[serde(alias = "MonthsEmployed")]
    pub months_employed: u32,

    #[serde(alias = "NumCreditLines")]
    pub num_credit_lines: u32,

    /// Interest rate in percent
    #[serde(alias = "InterestRate")]
    pub interest_rate: f64,

    /// Loan term in months
    #[serde(alias = "LoanTerm")]
    pub loan_term: u32,

    /// Debt-to-income ratio
    #[serde(alias = "DTIRatio")]
    pub dti_ratio: f64,

    #[serde(alias = "Education")]
    pub education: String,

    #[serde(alias = "EmploymentType")]
    pub employment_type: String,

    #[serde(alias = "MaritalStatus")]
    pub marital_status: String,

    #[serde(alias = "HasMortgage")]
    pub has_mortgage: String,

    #[serde(alias = "HasDependents")]
    pub has_dependents: String,

    #[serde(alias = "LoanPurpose")]
    pub loan_purpose: String,

    #[serde(alias = "HasCoSigner")]
    pub has_co_signer: String,

    /// Cluster as entered (1-based for the selector widget)
    #[serde(alias = "Cluster")]
    pub cluster: u32,
}

impl RawApplication {
    /// Parse a stream of JSON applications: one document, or several
    /// separated by whitespace (JSON lines).
    pub fn stream_from_json(
        input: &str,
    ) -> impl Iterator<Item = serde_json::Result<RawApplication>> + '_ {
        serde_json::Deserializer::from_str(input).into_iter::<RawApplication>()
    }

    /// Check the real-valued inputs are finite and non-negative.
    ///
    /// Integer fields are unsigned and need no check.
    pub fn validate(&self) -> Result<(), InputError> {
        let reals = [
            ("income", self.income),
            ("loan_amount", self.loan_amount),
            ("interest_rate", self.interest_rate),
            ("dti_ratio", self.dti_ratio),
        ];

        for (field, value) in reals {
            if !value.is_finite() {
                return Err(InputError::NotFinite { field, value });
            }
            if value < 0.0 {
                return Err(InputError::Negative { field, value });
            }
        }
        Ok(())
    }
}

impl Default for RawApplication {
    /// Initial state of the form: zeroed numerics, first choice of every selector.
    fn default() -> Self {
        Self {
            age: 0,
            income: 0.0,
            loan_amount: 0.0,
            credit_score: 0,
            months_employed: 0,
            num_credit_lines: 0,
            interest_rate: 0.0,
            loan_term: 0,
            dti_ratio: 0.0,
            education: Education::LABELS[0].to_string(),
            employment_type: EmploymentType::LABELS[0].to_string(),
            marital_status: MaritalStatus::LABELS[0].to_string(),
            has_mortgage: YesNo::LABELS[0].to_string(),
            has_dependents: YesNo::LABELS[0].to_string(),
            loan_purpose: LoanPurpose::LABELS[0].to_string(),
            has_co_signer: YesNo::LABELS[0].to_string(),
            cluster: 1,
        }
    }
}
