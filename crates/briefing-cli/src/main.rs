//! Market briefing CLI
//!
//! # Usage
//!
//! ```bash
//! # One post-close briefing with the LLM narrative
//! briefing run --variant post-close --narrative
//!
//! # Today's research digest from already-downloaded PDFs
//! briefing research --skip-crawl
//!
//! # Run the configured schedule until interrupted
//! briefing daemon
//! ```
//!
//! API keys are read from the environment (a `.env` file is loaded first).

mod commands;
mod output;

use anyhow::Context;
use briefing_core::{BriefingConfig, ReportVariant, SourceKey};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_FILE: &str = "briefing.toml";

#[derive(Parser, Debug)]
#[command(name = "briefing")]
#[command(about = "Korean market briefings and research digests", long_about = None)]
struct Args {
    /// TOML configuration file (defaults to ./briefing.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate and publish one briefing
    Run {
        #[arg(long, short, value_parser = parse_variant)]
        variant: ReportVariant,

        /// Add the LLM narrative section
        #[arg(long)]
        narrative: bool,
    },

    /// Run the configured schedule until interrupted
    Daemon,

    /// Fetch a single source and print its section
    Diagnose {
        #[arg(value_parser = parse_source)]
        source: SourceKey,

        #[arg(long, short, value_parser = parse_variant, default_value = "post-close")]
        variant: ReportVariant,
    },

    /// Show which sources and credentials are usable
    Status,

    /// Crawl, extract and summarize the day's research reports
    Research {
        /// Target date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Use the PDFs already in the working folder
        #[arg(long)]
        skip_crawl: bool,

        /// Use the text files already in the working folder
        #[arg(long)]
        skip_extract: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn parse_variant(value: &str) -> Result<ReportVariant, String> {
    value.parse()
}

fn parse_source(value: &str) -> Result<SourceKey, String> {
    value.parse()
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BriefingConfig> {
    let config = match path {
        Some(path) => BriefingConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            BriefingConfig::load(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("Failed to load {DEFAULT_CONFIG_FILE}"))?
        }
        None => {
            debug!("No config file, using defaults");
            BriefingConfig::default()
        }
    };

    let config = config.with_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.log_format);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Run { variant, narrative } => commands::run(&config, variant, narrative).await,
        Command::Daemon => commands::daemon(&config).await,
        Command::Diagnose { source, variant } => commands::diagnose(&config, source, variant).await,
        Command::Status => commands::status(&config).await,
        Command::Research {
            date,
            skip_crawl,
            skip_extract,
        } => commands::research(&config, date, skip_crawl, skip_extract).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args =
            Args::try_parse_from(["briefing", "run", "--variant", "pre-open", "--narrative"])
                .unwrap();
        match args.command {
            Command::Run { variant, narrative } => {
                assert_eq!(variant, ReportVariant::PreOpen);
                assert!(narrative);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(args.log_format, LogFormat::Text);
    }

    #[test]
    fn test_parse_research_flags() {
        let args = Args::try_parse_from([
            "briefing",
            "--log-format",
            "json",
            "research",
            "--date",
            "2024-01-02",
            "--skip-crawl",
        ])
        .unwrap();
        assert_eq!(args.log_format, LogFormat::Json);
        match args.command {
            Command::Research {
                date,
                skip_crawl,
                skip_extract,
            } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 2));
                assert!(skip_crawl);
                assert!(!skip_extract);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_diagnose_defaults() {
        let args = Args::try_parse_from(["briefing", "diagnose", "dart"]).unwrap();
        match args.command {
            Command::Diagnose { source, variant } => {
                assert_eq!(source, SourceKey::Disclosures);
                assert_eq!(variant, ReportVariant::PostClose);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_variant() {
        assert!(Args::try_parse_from(["briefing", "run", "--variant", "evening"]).is_err());
        assert!(Args::try_parse_from(["briefing", "run"]).is_err());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let result = load_config(Some(Path::new("/nonexistent/briefing.toml")));
        assert!(result.is_err());
    }
}
