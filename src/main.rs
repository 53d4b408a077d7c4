//! Loan Default Predictor - Main Entry Point
//!
//! Collects one loan application (JSON or interactive form), encodes it,
//! and runs the pre-fitted scaler and classifier over it.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use loan_default::{
    config::{AppConfig, LoggingConfig},
    feature_extractor::{FeatureEncoder, FEATURE_NAMES},
    form::{Form, FormVariant},
    models::Predictor,
    types::application::RawApplication,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_CONFIG: &str = "config/config.toml";

/// Personal loan default prediction
#[derive(Parser, Debug)]
#[command(name = "loan-default", version)]
#[command(after_help = "\
Examples:
  loan-default form                           Fill in the form interactively
  loan-default predict --input app.json       Predict from a JSON application
  loan-default encode < app.json              Show the encoded feature row
  loan-default features                       List model columns in order")]
struct Cli {
    /// Configuration file (default: config/config.toml if present)
    #[arg(long, short = 'c', global = true, env = "LOAN_DEFAULT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Predict default for applications read as JSON (one document or JSON lines)
    Predict {
        /// Application JSON file (default: stdin)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fill in the application form on the terminal, then predict
    Form {
        /// Presentation variant (overrides the config file)
        #[arg(long, value_parser = FormVariant::NAMES)]
        variant: Option<String>,
    },

    /// Encode applications and print their feature rows without running the model
    Encode {
        /// Application JSON file (default: stdin)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
    },

    /// List model input columns in order
    Features,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging)?;

    debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Predict { input, json } => {
            let applications = read_applications(input.as_deref())?;
            let predictor = Predictor::new(&config)?;

            for (index, application) in applications.iter().enumerate() {
                let report = predictor
                    .predict(application)
                    .with_context(|| format!("Prediction failed for application {}", index + 1))?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!("{}", config.form.variant.render(&report));
                }
            }
        }
        Commands::Form { variant } => {
            if let Some(variant) = variant {
                config.form.variant = variant.parse()?;
            }
            // Artifacts first: a broken install fails before the operator types anything
            let predictor = Predictor::new(&config)?;
            info!(variant = ?config.form.variant, "Starting form");

            let stdin = io::stdin();
            let mut form = Form::new(
                stdin.lock(),
                io::stdout(),
                config.form.variant,
                config.form.cluster_domain(),
            );
            let application = form.fill()?;
            application.validate()?;

            let report = predictor.predict(&application)?;
            println!("{}", config.form.variant.render(&report));
        }
        Commands::Encode { input } => {
            let applications = read_applications(input.as_deref())?;
            let encoder = FeatureEncoder::with_cluster_domain(config.form.cluster_domain());

            for (index, application) in applications.iter().enumerate() {
                let features = encoder
                    .encode(application)
                    .with_context(|| format!("Encoding failed for application {}", index + 1))?;
                println!("{}", serde_json::to_string_pretty(&features)?);
            }
        }
        Commands::Features => {
            for (i, name) in FEATURE_NAMES.iter().enumerate() {
                println!("{:>2}  {}", i, name);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => AppConfig::load(),
        None => Ok(AppConfig::default()),
    }
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("loan_default={}", logging.level).parse()?);

    // stdout carries results
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

/// Read every application in the input, validating each one.
fn read_applications(input: Option<&Path>) -> Result<Vec<RawApplication>> {
    let json = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read application from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read application from stdin")?;
            buf
        }
    };

    let mut applications = Vec::new();
    for (index, application) in RawApplication::stream_from_json(&json).enumerate() {
        let application = application
            .with_context(|| format!("Failed to deserialize application {}", index + 1))?;
        application
            .validate()
            .with_context(|| format!("Invalid application {}", index + 1))?;
        applications.push(application);
    }

    if applications.is_empty() {
        bail!("No application in input");
    }
    Ok(applications)
}
