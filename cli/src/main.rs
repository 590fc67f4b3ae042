//! carebase command line.
//!
//! Runs the HTTP API, or queries the advisory rules directly without a
//! server.
//!
//! Usage:
//!   cargo run -p carebase -- serve --config carebase.toml
//!   cargo run -p carebase -- analyze --symptom fever --symptom cough
//!   cargo run -p carebase -- tests --symptom "chest pain" --age 54 --gender male
//!   cargo run -p carebase -- interactions --medication warfarin --medication aspirin
//!   cargo run -p carebase -- alternatives --medication lisinopril --reason cough

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use carebase_advisor::Advisor;
use carebase_api::Settings;
use carebase_contracts::{
    advisory::MedicationEntry,
    error::{CarebaseError, CarebaseResult},
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Healthcare records API with rule-based clinical advisory helpers.
#[derive(Parser)]
#[command(
    name = "carebase",
    about = "Healthcare records API and advisory rules",
    long_about = "Serves the carebase HTTP API, or runs the symptom, test and\n\
                  drug-interaction rules from the command line."
)]
struct Cli {
    /// Symptom table (JSON). Defaults to the configured table.
    #[arg(long, global = true)]
    symptom_table: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API until Ctrl-C.
    Serve {
        /// TOML settings file. CAREBASE_* environment variables override it.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Listen address, e.g. 127.0.0.1:8000.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Rank possible conditions for the reported symptoms.
    Analyze {
        #[arg(long = "symptom", required = true)]
        symptoms: Vec<String>,
    },
    /// Suggest diagnostic tests.
    Tests {
        #[arg(long = "symptom")]
        symptoms: Vec<String>,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        gender: String,
    },
    /// Check a medication list for known interactions.
    Interactions {
        #[arg(long = "medication", required = true)]
        medications: Vec<String>,
    },
    /// Suggest substitutes for a medication.
    Alternatives {
        #[arg(long)]
        medication: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    // The server logs requests at info; offline queries stay quiet.
    let default_level = match cli.command {
        Command::Serve { .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = dispatch(cli) {
        eprintln!("carebase error: {}", e);
        std::process::exit(1);
    }
}

// ── Command dispatch ──────────────────────────────────────────────────────────

fn dispatch(cli: Cli) -> CarebaseResult<()> {
    match cli.command {
        Command::Serve { config, bind } => {
            let mut settings = Settings::load(config.as_deref())?;
            if let Some(bind) = bind {
                settings.bind = bind;
            }
            if let Some(table) = cli.symptom_table {
                settings.symptom_table = table;
            }
            info!(
                config = ?config,
                bind = %settings.bind,
                symptom_table = %settings.symptom_table.display(),
                "starting carebase"
            );
            serve(settings)
        }
        Command::Analyze { symptoms } => {
            let advisor = advisor(cli.symptom_table);
            print_json(&advisor.analyze_symptoms(&symptoms))
        }
        Command::Tests {
            symptoms,
            age,
            gender,
        } => {
            let advisor = advisor(cli.symptom_table);
            print_json(&advisor.suggest_tests(&symptoms, age, &gender))
        }
        Command::Interactions { medications } => {
            let entries: Vec<MedicationEntry> =
                medications.into_iter().map(MedicationEntry::named).collect();
            print_json(&advisor(cli.symptom_table).check_interactions(&entries))
        }
        Command::Alternatives { medication, reason } => {
            print_json(&advisor(cli.symptom_table).suggest_alternatives(&medication, &reason))
        }
    }
}

fn serve(settings: Settings) -> CarebaseResult<()> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CarebaseError::internal(format!("cannot start async runtime: {e}")))?;
    runtime.block_on(carebase_api::run(settings))
}

fn advisor(symptom_table: Option<PathBuf>) -> Advisor {
    let path = symptom_table.unwrap_or_else(|| Settings::default().symptom_table);
    debug!(path = %path.display(), "loading symptom table");
    Advisor::from_table_path(&path)
}

fn print_json<T: Serialize>(value: &T) -> CarebaseResult<()> {
    println!("{}", render_json(value)?);
    Ok(())
}

fn render_json<T: Serialize>(value: &T) -> CarebaseResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CarebaseError::internal(format!("cannot render result: {e}")))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_accepts_config_and_bind() {
        let cli = Cli::try_parse_from(["carebase", "serve", "--config", "c.toml", "--bind", "127.0.0.1:9000"]).unwrap();
        match cli.command {
            Command::Serve { config, bind } => {
                assert_eq!(config, Some(PathBuf::from("c.toml")));
                assert_eq!(bind.as_deref(), Some("127.0.0.1:9000"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn repeated_flags_collect_in_order() {
        let cli = Cli::try_parse_from([
            "carebase",
            "interactions",
            "--medication",
            "warfarin",
            "--medication",
            "aspirin",
        ])
        .unwrap();
        match cli.command {
            Command::Interactions { medications } => assert_eq!(medications, vec!["warfarin", "aspirin"]),
            _ => panic!("expected interactions"),
        }
    }

    #[test]
    fn analyze_requires_a_symptom() {
        assert!(Cli::try_parse_from(["carebase", "analyze"]).is_err());
    }

    #[test]
    fn unrenderable_result_is_internal_error() {
        use std::collections::HashMap;

        // JSON object keys must be strings.
        let value = HashMap::from([((1, 2), "pair")]);
        let err = render_json(&value).unwrap_err();
        assert!(matches!(err, CarebaseError::Internal { .. }));
        assert_eq!(render_json(&vec!["ok"]).unwrap(), "[\n  \"ok\"\n]");
    }

    #[test]
    fn alternatives_reason_defaults_to_empty() {
        let cli = Cli::try_parse_from(["carebase", "alternatives", "--medication", "ibuprofen"]).unwrap();
        match cli.command {
            Command::Alternatives { reason, .. } => assert!(reason.is_empty()),
            _ => panic!("expected alternatives"),
        }
    }
}
