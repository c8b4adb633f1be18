use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use grader_checks::{evaluate_pending, EngineConfig};
use grader_core::Catalog;
use grader_ledger_sqlite::SqliteLedger;
use grader_pipeline::{load_roster, run_round1, run_round2, Round2Config, RoundConfig};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "graderctl", version, about = "Operator CLI for the grading pipeline")]
struct Cli {
    /// Path to the sqlite ledger file.
    #[arg(long, default_value = "grader.db")]
    db_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate and dispatch fresh round-1 tasks to every roster entry.
    Round1 {
        /// Roster CSV: timestamp,email,endpoint,secret
        roster: PathBuf,

        /// Collector URL participants must submit to.
        #[arg(long)]
        evaluation_url: String,

        /// Override the hour bucket driving task selection (for re-runs).
        #[arg(long)]
        hour_bucket: Option<String>,

        /// Pause between participants, in seconds.
        #[arg(long, default_value_t = 1)]
        pacing_seconds: u64,
    },
    /// Dispatch enhancement tasks to participants whose round-1 work passed.
    Round2 {
        roster: PathBuf,

        #[arg(long)]
        evaluation_url: String,

        #[arg(long)]
        hour_bucket: Option<String>,

        #[arg(long, default_value_t = 1)]
        pacing_seconds: u64,

        /// Round-1 checks that must have passed, repeatable.
        #[arg(long = "critical-check")]
        critical_checks: Vec<String>,
    },
    /// Grade submissions that have no results yet.
    Evaluate {
        /// Restrict grading to one round.
        #[arg(long)]
        round: Option<u32>,

        /// Re-grade submissions that already have results, filling gaps.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// WebDriver endpoint for interactive checks; omit to grade
        /// statically.
        #[arg(long)]
        webdriver_url: Option<String>,
    },
    /// Write all stored results to a CSV file.
    ExportResults {
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let ledger = SqliteLedger::open(&cli.db_path)?;
    let client = reqwest::Client::new();
    let catalog = Catalog::builtin();

    match cli.command {
        Command::Round1 {
            roster,
            evaluation_url,
            hour_bucket,
            pacing_seconds,
        } => {
            let roster = load_roster(&roster)?;
            let config = RoundConfig {
                evaluation_url,
                hour_bucket,
                pacing_delay: Duration::from_secs(pacing_seconds),
                ..RoundConfig::new("")
            };
            let summary = run_round1(&ledger, &client, &catalog, &roster, &config).await;
            println!(
                "round 1: {} delivered, {} skipped, {} failed of {}",
                summary.processed, summary.skipped, summary.failed, summary.total
            );
        }
        Command::Round2 {
            roster,
            evaluation_url,
            hour_bucket,
            pacing_seconds,
            critical_checks,
        } => {
            let roster = load_roster(&roster)?;
            let round = RoundConfig {
                evaluation_url,
                hour_bucket,
                pacing_delay: Duration::from_secs(pacing_seconds),
                ..RoundConfig::new("")
            };
            let mut config = Round2Config::new(round);
            if !critical_checks.is_empty() {
                config.critical_checks = critical_checks;
            }
            let summary = run_round2(&ledger, &client, &catalog, &roster, &config).await;
            println!(
                "round 2: {} delivered, {} skipped, {} failed of {}",
                summary.processed, summary.skipped, summary.failed, summary.total
            );
        }
        Command::Evaluate {
            round,
            force,
            webdriver_url,
        } => {
            let config = EngineConfig {
                webdriver_url,
                force,
                ..EngineConfig::default()
            };
            let summary = evaluate_pending(&ledger, &client, round, &config).await;
            println!(
                "evaluate: {} graded, {} skipped, {} failed of {}",
                summary.graded, summary.skipped, summary.failed, summary.total
            );
        }
        Command::ExportResults { out } => {
            let csv = ledger.export_results_csv()?;
            std::fs::write(&out, csv)
                .with_context(|| format!("write {}", out.display()))?;
            println!("wrote {}", out.display());
        }
    }

    Ok(())
}
