#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the property enrichment pipeline.
//!
//! Uses `indicatif-log-bridge` (via [`property_map_cli_utils::init_logger`])
//! so that log lines and progress bars share the terminal. Set `RUST_LOG`
//! (e.g. `RUST_LOG=info`) to see phase logs.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use property_map_cli_utils::IndicatifProgress;
use property_map_enrich::{CaseSourceMode, Pipeline, PipelineConfig, output};

#[derive(Parser)]
#[command(name = "property_map", about = "Property enrichment pipeline")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short, global = true, default_value = "property_map.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the enriched CSV
    Run {
        /// Output CSV path (overrides `output` in the config)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Case page source: `live` or `snapshot` (overrides `cases.mode`)
        #[arg(long)]
        case_source: Option<CaseSourceMode>,
        /// Maximum concurrent case page fetches (overrides `cases.concurrency`)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Fetch every region's case page and save it for snapshot runs
    FetchCases {
        /// Directory to save pages to (defaults to `cases.snapshot_dir`)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Maximum concurrent fetches (overrides `cases.concurrency`)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Print the configuration with defaults filled in
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = property_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = PipelineConfig::load(&cli.config)?;

    match cli.command {
        Commands::Run {
            output,
            case_source,
            concurrency,
        } => {
            if let Some(path) = output {
                config.output = path;
            }
            if let Some(mode) = case_source {
                config.cases.mode = mode;
            }
            if let Some(n) = concurrency {
                config.cases.concurrency = n;
            }

            let start = Instant::now();
            let progress = IndicatifProgress::phase_bar(&multi, "Enriching properties");
            let pipeline = Pipeline::new(config).with_progress(progress);
            let result = pipeline.run().await?;

            output::write_csv(&pipeline.config().output, &result.rows)?;
            log::info!(
                "Done in {:.1}s: {} rows ({} rejected, {} duplicates removed)",
                start.elapsed().as_secs_f64(),
                result.rows.len(),
                result.merge.rejected,
                result.merge.duplicates_removed
            );
        }
        Commands::FetchCases { dir, concurrency } => {
            let Some(dir) = dir.or_else(|| config.cases.snapshot_dir.clone()) else {
                return Err("no snapshot directory: pass --dir or set cases.snapshot_dir".into());
            };
            if let Some(n) = concurrency {
                config.cases.concurrency = n;
            }

            let table = Pipeline::new(config).save_case_snapshots(dir.clone()).await?;
            log::info!("Saved case pages for {} regions to {}", table.len(), dir.display());
        }
        Commands::ShowConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "property_map",
            "run",
            "--case-source",
            "snapshot",
            "--concurrency",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("property_map.toml"));
        assert!(matches!(
            cli.command,
            Commands::Run {
                case_source: Some(CaseSourceMode::Snapshot),
                concurrency: Some(2),
                output: None,
            }
        ));
    }

    #[test]
    fn unknown_case_source_is_rejected() {
        assert!(Cli::try_parse_from(["property_map", "run", "--case-source", "ftp"]).is_err());
    }
}
