//! Sample Application Generator
//!
//! Writes random loan applications as JSON lines, for driving
//! `loan-default predict` and `loan-default encode` end to end.

use loan_default::types::application::{
    Categorical, Education, EmploymentType, LoanPurpose, MaritalStatus, RawApplication, YesNo,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, Write};
use tracing::info;

/// Application generator for testing
struct ApplicationGenerator {
    rng: StdRng,
}

impl ApplicationGenerator {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Generate a typical applicant
    fn generate_typical(&mut self) -> RawApplication {
        RawApplication {
            age: self.rng.gen_range(25..65),
            income: self.rng.gen_range(40_000.0..150_000.0),
            loan_amount: self.rng.gen_range(5_000.0..100_000.0),
            credit_score: self.rng.gen_range(550..850),
            months_employed: self.rng.gen_range(12..120),
            num_credit_lines: self.rng.gen_range(1..4),
            interest_rate: self.rng.gen_range(2.0..12.0),
            loan_term: self.random_term(),
            dti_ratio: self.rng.gen_range(0.1..0.5),
            education: self.random_label::<Education>(),
            employment_type: self.random_label::<EmploymentType>(),
            marital_status: self.random_label::<MaritalStatus>(),
            has_mortgage: self.random_label::<YesNo>(),
            has_dependents: self.random_label::<YesNo>(),
            loan_purpose: self.random_label::<LoanPurpose>(),
            has_co_signer: self.random_label::<YesNo>(),
            cluster: self.rng.gen_range(1..=3),
        }
    }

    /// Generate a high-risk applicant
    fn generate_risky(&mut self) -> RawApplication {
        RawApplication {
            age: self.rng.gen_range(18..30),                       // Young
            income: self.rng.gen_range(15_000.0..40_000.0),        // Low income
            loan_amount: self.rng.gen_range(100_000.0..250_000.0), // Large loan
            credit_score: self.rng.gen_range(300..550),
            months_employed: self.rng.gen_range(0..12),
            num_credit_lines: self.rng.gen_range(3..5),
            interest_rate: self.rng.gen_range(15.0..25.0),
            loan_term: self.random_term(),
            dti_ratio: self.rng.gen_range(0.6..0.9),
            education: self.random_label::<Education>(),
            employment_type: self.choice(&["Desempleado", "Medio Tiempo"]).to_string(),
            marital_status: self.random_label::<MaritalStatus>(),
            has_mortgage: "No".to_string(),
            has_dependents: "Sí".to_string(),
            loan_purpose: self.random_label::<LoanPurpose>(),
            has_co_signer: "No".to_string(),
            cluster: self.rng.gen_range(1..=3),
        }
    }

    fn random_term(&mut self) -> u32 {
        *[12, 24, 36, 48, 60]
            .get(self.rng.gen_range(0..5))
            .unwrap_or(&36)
    }

    fn random_label<C: Categorical>(&mut self) -> String {
        self.choice(C::LABELS).to_string()
    }

    fn choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Share of risky applicants, clamped to a probability. Unparseable or
/// non-finite input falls back to 0.2.
fn parse_risky_rate(arg: Option<&str>) -> f64 {
    arg.and_then(|s| s.parse::<f64>().ok())
        .filter(|rate| rate.is_finite())
        .unwrap_or(0.2)
        .clamp(0.0, 1.0)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_applications=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let count: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(10);
    let risky_rate = parse_risky_rate(args.get(2).map(String::as_str));
    let seed: Option<u64> = args.get(3).and_then(|s| s.parse().ok());

    info!(count = count, risky_rate = risky_rate, seed = ?seed, "Generating applications");

    let mut generator = ApplicationGenerator::new(seed);
    let mut risky_count = 0;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for _ in 0..count {
        let application = if generator.rng.gen_bool(risky_rate) {
            risky_count += 1;
            generator.generate_risky()
        } else {
            generator.generate_typical()
        };

        writeln!(out, "{}", serde_json::to_string(&application)?)?;
    }

    info!(
        "Completed! Generated {} applications ({} typical, {} high-risk)",
        count,
        count - risky_count,
        risky_count
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risky_rate_is_a_probability() {
        assert_eq!(parse_risky_rate(None), 0.2);
        assert_eq!(parse_risky_rate(Some("0.5")), 0.5);
        assert_eq!(parse_risky_rate(Some("3")), 1.0);
        assert_eq!(parse_risky_rate(Some("-1")), 0.0);
        assert_eq!(parse_risky_rate(Some("NaN")), 0.2);
        assert_eq!(parse_risky_rate(Some("inf")), 0.2);
        assert_eq!(parse_risky_rate(Some("lots")), 0.2);
    }

    #[test]
    fn test_generated_lines_are_valid_applications() {
        let mut generator = ApplicationGenerator::new(Some(7));
        let lines: String = (0..6)
            .map(|i| {
                let app = if i % 2 == 0 {
                    generator.generate_typical()
                } else {
                    generator.generate_risky()
                };
                serde_json::to_string(&app).unwrap() + "\n"
            })
            .collect();

        let encoder = loan_default::FeatureEncoder::new();
        let mut count = 0;
        for app in RawApplication::stream_from_json(&lines) {
            let app = app.unwrap();
            app.validate().unwrap();
            encoder.encode(&app).unwrap();
            count += 1;
        }
        assert_eq!(count, 6);
    }
}
