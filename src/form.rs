//! Terminal input form and result rendering.
//!
//! The three presentation variants only differ in default values, the
//! cluster widget and how the result is styled. They all feed the same
//! encoder.

use crate::types::application::{
    Categorical, ClusterDomain, Education, EmploymentType, LoanPurpose, MaritalStatus,
    RawApplication, YesNo,
};
use crate::types::report::PredictionReport;
use anyhow::{bail, Result};
use console::style;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

/// Presentation variant of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormVariant {
    /// No defaults, free cluster number, raw probability
    Plain,
    /// Defaults, cluster selector starting at 1, percentage output
    Styled,
    /// Defaults, cluster selector starting at 2, outcome-colored output
    #[default]
    Colored,
}

impl FormVariant {
    pub const NAMES: [&'static str; 3] = ["plain", "styled", "colored"];

    /// Cluster widget used by this variant
    pub fn cluster_domain(&self) -> ClusterDomain {
        match self {
            FormVariant::Plain => ClusterDomain::Free,
            FormVariant::Styled | FormVariant::Colored => ClusterDomain::Selector,
        }
    }

    /// Initial field values shown on the form
    pub fn defaults(&self) -> RawApplication {
        let base = RawApplication::default();
        match self {
            FormVariant::Plain => RawApplication { cluster: 0, ..base },
            FormVariant::Styled => RawApplication {
                credit_score: 500,
                interest_rate: 10.0,
                dti_ratio: 0.5,
                cluster: 1,
                ..base
            },
            FormVariant::Colored => RawApplication {
                credit_score: 500,
                interest_rate: 10.0,
                dti_ratio: 0.5,
                cluster: 2,
                ..base
            },
        }
    }

    /// Render a prediction for the terminal
    pub fn render(&self, report: &PredictionReport) -> String {
        let outcome = report.outcome.label();
        match self {
            FormVariant::Plain => report.to_string(),
            FormVariant::Styled => format!(
                "{}\n{}",
                style(format!("Predicción: {}", outcome)).color256(202).bold(),
                style(format!("Probabilidad de Impago: {}", report.probability_percent()))
                    .green()
                    .bold()
            ),
            FormVariant::Colored => {
                let prediction = style(format!("Predicción: {}", outcome)).bold();
                let prediction = if report.outcome.is_default() {
                    prediction.red()
                } else {
                    prediction.green()
                };
                format!(
                    "{}\n{}",
                    prediction,
                    style(format!("Probabilidad de Impago: {}", report.probability_percent()))
                        .yellow()
                )
            }
        }
    }
}

impl FromStr for FormVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(FormVariant::Plain),
            "styled" => Ok(FormVariant::Styled),
            "colored" => Ok(FormVariant::Colored),
            other => bail!("unknown form variant {:?} (expected plain, styled or colored)", other),
        }
    }
}

/// Line-oriented form over any reader/writer pair
pub struct Form<R, W> {
    input: R,
    output: W,
    variant: FormVariant,
    cluster_domain: ClusterDomain,
}

impl<R: BufRead, W: Write> Form<R, W> {
    pub fn new(input: R, output: W, variant: FormVariant, cluster_domain: ClusterDomain) -> Self {
        Self {
            input,
            output,
            variant,
            cluster_domain,
        }
    }

    /// Ask for every field and return the completed application.
    ///
    /// Empty answers keep the default; invalid answers are asked again.
    pub fn fill(&mut self) -> Result<RawApplication> {
        let d = self.variant.defaults();

        writeln!(
            self.output,
            "{}",
            style("Predicción de Impagos en Préstamos Personales").bold()
        )?;

        let age = self.integer("Edad", d.age)?;
        let income = self.real("Ingreso Anual", d.income)?;
        let loan_amount = self.real("Monto del Préstamo", d.loan_amount)?;
        let credit_score = self.integer("Puntuación de Crédito", d.credit_score)?;
        let months_employed = self.integer("Meses Empleados", d.months_employed)?;
        let num_credit_lines = self.integer("Número de Líneas de Crédito", d.num_credit_lines)?;
        let interest_rate = self.real("Tasa de Interés", d.interest_rate)?;
        let loan_term = self.integer("Duración del Préstamo (meses)", d.loan_term)?;
        let dti_ratio = self.real("Relación Deuda-Ingreso (DTI)", d.dti_ratio)?;

        let education = self.select::<Education>("Nivel Educativo")?;
        let employment_type = self.select::<EmploymentType>("Tipo de Empleo")?;
        let marital_status = self.select::<MaritalStatus>("Estado Civil")?;
        let has_mortgage = self.select::<YesNo>("Tiene Hipoteca")?;
        let has_dependents = self.select::<YesNo>("Tiene Dependientes")?;
        let loan_purpose = self.select::<LoanPurpose>("Finalidad del Préstamo")?;
        let has_co_signer = self.select::<YesNo>("Tiene Avalista")?;

        let cluster = match self.cluster_domain {
            ClusterDomain::Selector => {
                let default = d.cluster.clamp(1, 3) as usize - 1;
                self.choose("Cluster", &["1", "2", "3"], default)? as u32 + 1
            }
            ClusterDomain::Free => self.integer("Cluster", d.cluster)?,
        };

        Ok(RawApplication {
            age,
            income,
            loan_amount,
            credit_score,
            months_employed,
            num_credit_lines,
            interest_rate,
            loan_term,
            dti_ratio,
            education,
            employment_type,
            marital_status,
            has_mortgage,
            has_dependents,
            loan_purpose,
            has_co_signer,
            cluster,
        })
    }

    fn read_answer(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}: ", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed while reading {:?}", prompt);
        }
        Ok(line.trim().to_string())
    }

    fn ask<T>(&mut self, label: &str, default: T, accept: impl Fn(&T) -> bool) -> Result<T>
    where
        T: FromStr + Display + Copy,
    {
        loop {
            let answer = self.read_answer(&format!("{} [{}]", label, default))?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<T>() {
                Ok(value) if accept(&value) => return Ok(value),
                _ => writeln!(self.output, "  valor no válido: {:?}", answer)?,
            }
        }
    }

    fn integer(&mut self, label: &str, default: u32) -> Result<u32> {
        self.ask(label, default, |_| true)
    }

    fn real(&mut self, label: &str, default: f64) -> Result<f64> {
        self.ask(label, default, |v| v.is_finite() && *v >= 0.0)
    }

    /// Pick one of `choices` by number (1-based) or exact label; returns the index.
    fn choose(&mut self, label: &str, choices: &[&str], default: usize) -> Result<usize> {
        writeln!(self.output, "{}", label)?;
        for (i, choice) in choices.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, choice)?;
        }

        loop {
            let answer = self.read_answer(&format!("{} [{}]", label, choices[default]))?;
            if answer.is_empty() {
                return Ok(default);
            }
            if let Some(i) = choices.iter().position(|c| *c == answer) {
                return Ok(i);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=choices.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(self.output, "  opción no válida: {:?}", answer)?,
            }
        }
    }

    fn select<C: Categorical>(&mut self, label: &str) -> Result<String> {
        let index = self.choose(label, C::LABELS, 0)?;
        Ok(C::LABELS[index].to_string())
    }
}
