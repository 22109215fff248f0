use std::error::Error;

use clap::{Args, Subcommand, ValueEnum};
use vspace_engine::{Experiments, ServiceConfig};
use vspace_runs::{RunId, RunQuery, RunStore, RunType};

use crate::emit;

#[derive(Args, Debug)]
pub struct RunsArgs {
    #[command(subcommand)]
    pub command: RunsCommand,
}

#[derive(Subcommand, Debug)]
pub enum RunsCommand {
    /// List runs, newest first.
    List {
        #[arg(long, value_enum)]
        run_type: Option<RunTypeArg>,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        /// Page size; defaults to the configured list limit.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print one run.
    Get { id: i64 },
    /// Delete one run.
    Delete { id: i64 },
    /// Re-execute a run's request and record the result as a new run.
    Replay { id: i64 },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RunTypeArg {
    Doe,
    Optimize,
}

impl From<RunTypeArg> for RunType {
    fn from(value: RunTypeArg) -> Self {
        match value {
            RunTypeArg::Doe => RunType::Doe,
            RunTypeArg::Optimize => RunType::Optimize,
        }
    }
}

/// Only `replay` loads the catalog; the other commands read the store alone.
pub async fn run(config: &ServiceConfig, args: &RunsArgs) -> Result<(), Box<dyn Error>> {
    if config.database.is_none() {
        return Err("runs commands need a database: pass --db or set `database` in the config".into());
    }
    let store = || config.open_store();
    match &args.command {
        RunsCommand::List {
            run_type,
            skip,
            limit,
        } => {
            let query = RunQuery {
                run_type: run_type.map(Into::into),
                skip: *skip,
                limit: limit.unwrap_or(config.list_limit),
            };
            emit(&store()?.list(&query)?, None)
        }
        RunsCommand::Get { id } => emit(&store()?.get(RunId::from_raw(*id))?, None),
        RunsCommand::Delete { id } => {
            store()?.delete(RunId::from_raw(*id))?;
            println!("deleted run {id}");
            Ok(())
        }
        RunsCommand::Replay { id } => {
            let (experiments, _recorder) = Experiments::from_config(config)?;
            emit(&experiments.replay(RunId::from_raw(*id))?, None)
        }
    }
}
