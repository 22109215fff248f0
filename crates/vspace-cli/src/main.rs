use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vspace_engine::{Experiments, LogFormat, Outcome, ServiceConfig};

mod commands;

use commands::{
    doe::{self, DoeArgs},
    optimize::{self, OptimizeArgs},
    runs::{self, RunsArgs},
    serve::{self, ServeArgs},
};

#[derive(Parser, Debug)]
#[command(name = "vspace", about = "Design of experiments and seeded search over variable domains")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a space-filling design over the selected variables.
    Doe(DoeArgs),
    /// Run a seeded random search for the best point.
    Optimize(OptimizeArgs),
    /// List, inspect, delete or replay recorded runs.
    Runs(RunsArgs),
    /// Serve the HTTP JSON interface.
    Serve(ServeArgs),
}

#[derive(ClapArgs, Debug)]
struct GlobalArgs {
    /// YAML service configuration; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Variable catalog (`.yaml`, `.yml` or `.json`).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// SQLite run database.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Do not record DOE and optimize calls as runs.
    #[arg(long, global = true)]
    no_record: bool,
    /// Disable insight summaries.
    #[arg(long, global = true)]
    no_insight: bool,
    /// Log line format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl GlobalArgs {
    fn service_config(&self) -> Result<ServiceConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::load(path)?,
            None => ServiceConfig::default(),
        };
        if let Some(catalog) = &self.catalog {
            config.catalog = catalog.clone();
        }
        if let Some(db) = &self.db {
            config.database = Some(db.clone());
        }
        if self.no_record {
            config.record_runs = false;
        }
        if self.no_insight {
            config.insight = false;
        }
        if let Some(format) = self.log_format {
            config.log_format = match format {
                LogFormatArg::Text => LogFormat::Text,
                LogFormatArg::Json => LogFormat::Json,
            };
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.global.service_config()?;
    init_tracing(config.log_format);
    match cli.command {
        Command::Doe(args) => doe::run(&engine(&config)?, &args).await,
        Command::Optimize(args) => optimize::run(&engine(&config)?, &args).await,
        Command::Runs(args) => runs::run(&config, &args).await,
        Command::Serve(args) => serve::run(engine(&config)?, &config, &args).await,
    }
}

/// Catalog, store and recorder for the compute commands. The recorder task
/// keeps running after its handle is dropped.
fn engine(config: &ServiceConfig) -> Result<Experiments, Box<dyn Error>> {
    let (experiments, _recorder) = Experiments::from_config(config)?;
    Ok(experiments)
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vspace=info,tower_http=info"));
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

/// Reports the non-fatal side effects of a compute call and waits for the
/// run to be written.
async fn settle<T>(outcome: Outcome<T>) -> T {
    if let Some(err) = &outcome.insight_error {
        warn!(error = %err, "insight unavailable");
    }
    if let Some(ticket) = outcome.persist {
        match ticket.wait().await {
            Ok(run) => info!(id = %run.id, title = %run.title, "run recorded"),
            Err(err) => warn!(error = %err, "run was not recorded"),
        }
    }
    outcome.result
}

/// Pretty JSON to `out`, or to stdout when no path is given.
fn emit<T: serde::Serialize>(value: &T, out: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
        }
        None => println!("{json}"),
    }
    Ok(())
}
