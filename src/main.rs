use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loadscope_cli::replay::{replay_file, ReplayOptions};
use loadscope_cli::telemetry;
use run_report::{derive_insights_with, RunReport, Thresholds};

#[derive(Parser)]
#[command(name = "loadscope", version, about = "Browsing-session performance measurement")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a captured link event log into a full measurement session
    /// and print the resulting report as JSON.
    Replay {
        /// JSON Lines capture of link events.
        capture: PathBuf,
        /// Measure as a cold load (navigations in the capture will not
        /// end the session).
        #[arg(long)]
        cold_load: bool,
        /// Collect trace fragments present in the capture.
        #[arg(long)]
        trace: bool,
        /// Print compact JSON instead of pretty.
        #[arg(long)]
        compact: bool,
    },
    /// Re-derive findings from a saved report.
    Insights {
        /// A previously exported report.
        report: PathBuf,
        /// JSON file overriding insight thresholds.
        #[arg(long)]
        thresholds: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            capture,
            cold_load,
            trace,
            compact,
        } => {
            let report = replay_file(
                &capture,
                ReplayOptions {
                    cold_load,
                    trace_enabled: trace,
                },
            )
            .await?;
            print_json(&report, compact)?;
        }
        Command::Insights { report, thresholds } => {
            let raw = std::fs::read_to_string(&report)
                .with_context(|| format!("reading report {}", report.display()))?;
            let report: RunReport =
                serde_json::from_str(&raw).context("parsing report JSON")?;
            let limits = match thresholds {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading thresholds {}", path.display()))?;
                    serde_json::from_str::<Thresholds>(&raw).context("parsing thresholds JSON")?
                }
                None => Thresholds::default(),
            };
            let findings = derive_insights_with(&report, &limits);
            print_json(&findings, false)?;
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}
