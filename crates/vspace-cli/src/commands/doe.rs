use std::error::Error;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use vspace_core::VariableId;
use vspace_doe::{DoeMethod, DoeRequest};
use vspace_engine::Experiments;

use crate::{emit, settle};

#[derive(Args, Debug)]
pub struct DoeArgs {
    /// Comma separated variable ids, in column order.
    #[arg(long = "vars", value_delimiter = ',', required = true)]
    pub variable_ids: Vec<i64>,
    /// Number of points.
    #[arg(long, default_value_t = 20)]
    pub n_points: usize,
    #[arg(long, value_enum, default_value_t = MethodArg::Sobol)]
    pub method: MethodArg,
    /// Explicit latin hypercube seed.
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,
    /// Attach a template insight to the result.
    #[arg(long)]
    pub insight: bool,
    /// Write the result here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MethodArg {
    Sobol,
    Lhs,
}

impl From<MethodArg> for DoeMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Sobol => DoeMethod::Sobol,
            MethodArg::Lhs => DoeMethod::Lhs,
        }
    }
}

pub async fn run(experiments: &Experiments, args: &DoeArgs) -> Result<(), Box<dyn Error>> {
    let mut request = DoeRequest::new(
        args.variable_ids.iter().copied().map(VariableId::from_raw).collect(),
        args.n_points,
        args.method.into(),
    );
    request.seed = args.seed;
    request.include_insight = args.insight;
    let result = settle(experiments.doe(request)?).await;
    emit(&result, args.out.as_deref())
}
