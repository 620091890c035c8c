use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rotortrim_core::{report, ConfigProvider, RunSet, RunsDocument, StageId, TabOption};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod render;

/// Rotortrim - rotor track and balance diagnostics
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Parameter set (.toml or .json); defaults to the shipped set
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct RunsArgs {
    /// Measurements: a run set, or a flight log keyed by flight id
    #[arg(short, long, value_name = "FILE")]
    runs: PathBuf,

    /// Flight to diagnose when the file is a flight log (default: latest)
    #[arg(short, long, value_name = "ID")]
    flight: Option<String>,

    /// Output in JSON format for integrations
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the gated status of all five stages
    Status {
        #[command(flatten)]
        runs: RunsArgs,
    },

    /// Show the next stage to work on and its correction
    Next {
        #[command(flatten)]
        runs: RunsArgs,

        /// 120 KIAS strategy: 1 = bend nearest tab up, 2 = opposite tab down
        #[arg(short, long, default_value_t = 1)]
        option: u8,
    },

    /// Show the correction detail for one stage
    Detail {
        /// Stage id (track60, ground100, hover, kias120, letdown)
        step: String,

        #[command(flatten)]
        runs: RunsArgs,

        /// 120 KIAS strategy: 1 = bend nearest tab up, 2 = opposite tab down
        #[arg(short, long, default_value_t = 1)]
        option: u8,
    },

    /// List every checked quantity against its limit
    Limits {
        #[command(flatten)]
        runs: RunsArgs,
    },

    /// List out-of-limit and incomplete stages
    Warnings {
        #[command(flatten)]
        runs: RunsArgs,
    },

    /// Show the per-blade hub weight split
    Corrections {
        #[command(flatten)]
        runs: RunsArgs,
    },

    /// Show lateral and vertical 1/rev for every recorded regime
    Overview {
        #[command(flatten)]
        runs: RunsArgs,
    },

    /// Validate and print the effective parameter set
    Config {
        /// Output in JSON format for integrations
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let provider = match &cli.config {
        Some(path) => ConfigProvider::from_path(path),
        None => ConfigProvider::embedded(),
    };
    let config = provider.load().context("Failed to load configuration")?;

    match cli.command {
        Commands::Status { runs } => {
            let (flight, run_set) = load_runs(&runs)?;
            let summaries = rotortrim_core::evaluate(&run_set, &config);
            if runs.json {
                render::json(flight, &summaries)?;
            } else {
                render::header("STATUS", flight.as_deref());
                render::summaries(&summaries);
            }
        }
        Commands::Next { runs, option } => {
            let option = parse_option(option)?;
            let (flight, run_set) = load_runs(&runs)?;
            let diagnosis = rotortrim_core::diagnose(&run_set, &config, option);
            if runs.json {
                render::json(flight, &diagnosis)?;
            } else {
                render::header("NEXT STEP", flight.as_deref());
                render::summaries(&diagnosis.summaries);
                println!();
                println!("Next: {}", diagnosis.next_step);
                render::detail(&diagnosis.detail);
            }
        }
        Commands::Detail { step, runs, option } => {
            let option = parse_option(option)?;
            if step.parse::<StageId>().is_err() {
                tracing::warn!("{} is not a workflow stage", step);
            }
            let (flight, run_set) = load_runs(&runs)?;
            let detail = rotortrim_core::detail(&run_set, &config, &step, option);
            if runs.json {
                render::json(flight, &detail)?;
            } else {
                render::header("DETAIL", flight.as_deref());
                render::detail(&detail);
            }
        }
        Commands::Limits { runs } => {
            let (flight, run_set) = load_runs(&runs)?;
            let rows = report::limits_table(&run_set, &config);
            if runs.json {
                render::json(flight, &rows)?;
            } else {
                render::header("ALL LIMITS", flight.as_deref());
                render::limits(&rows);
            }
        }
        Commands::Warnings { runs } => {
            let (flight, run_set) = load_runs(&runs)?;
            let warnings = report::warnings(&run_set, &config);
            if runs.json {
                render::json(flight, &warnings)?;
            } else {
                render::header("DIAGNOSTIC WARNINGS", flight.as_deref());
                render::warnings(&warnings);
            }
        }
        Commands::Corrections { runs } => {
            let (flight, run_set) = load_runs(&runs)?;
            let table = report::hub_weight_table(&run_set, &config);
            if runs.json {
                render::json(flight, &table)?;
            } else {
                render::header("CORRECTIONS", flight.as_deref());
                render::hub_weights(&table);
            }
        }
        Commands::Overview { runs } => {
            let (flight, run_set) = load_runs(&runs)?;
            let rows = report::flight_overview(&run_set);
            if runs.json {
                render::json(flight, &rows)?;
            } else {
                render::header("COMPLETE FLIGHT", flight.as_deref());
                render::overview(&rows);
            }
        }
        Commands::Config { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config.as_ref())?);
            } else {
                render::config(provider.source(), &config)?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_option(option: u8) -> anyhow::Result<TabOption> {
    Ok(TabOption::try_from(option)?)
}

/// Read a run set, or pick one flight out of a flight log
fn load_runs(args: &RunsArgs) -> anyhow::Result<(Option<String>, RunSet)> {
    let document = RunsDocument::from_path(&args.runs)?;
    Ok(document.select(args.flight.as_deref()))
}
