use std::error::Error;
use std::net::SocketAddr;

use clap::Args;
use vspace_engine::{Experiments, ServiceConfig};
use vspace_server::AppState;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address; overrides the configured `bind`.
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

pub async fn run(
    experiments: Experiments,
    config: &ServiceConfig,
    args: &ServeArgs,
) -> Result<(), Box<dyn Error>> {
    let addr = args.bind.unwrap_or(config.bind);
    let state = AppState::new(experiments, config.list_limit);
    vspace_server::serve(addr, state).await?;
    Ok(())
}
