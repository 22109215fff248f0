use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use vspace_core::{Point, VariableId};
use vspace_engine::Experiments;
use vspace_opt::{LinearTerm, ObjectiveSpec, OptimizeRequest};

use crate::{emit, settle};

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Comma separated variable ids.
    #[arg(long = "vars", value_delimiter = ',', required = true)]
    pub variable_ids: Vec<i64>,
    /// Number of random draws.
    #[arg(long, default_value_t = 30)]
    pub n_iter: usize,
    /// Seed of the draw stream; drawn from OS entropy when omitted.
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,
    /// Maximize this variable's value.
    #[arg(long, conflicts_with_all = ["minimize", "term"])]
    pub maximize: Option<i64>,
    /// Minimize this variable's value.
    #[arg(long, conflicts_with = "term")]
    pub minimize: Option<i64>,
    /// Linear objective term `ID=WEIGHT`; repeat for a weighted sum.
    #[arg(long, value_parser = parse_term)]
    pub term: Vec<LinearTerm>,
    /// JSON array of warm-start points keyed by variable id.
    #[arg(long)]
    pub initial_points: Option<PathBuf>,
    /// Cap on consumed warm-start points.
    #[arg(long, default_value_t = 200)]
    pub max_initial_points: usize,
    /// Attach a template insight to the result.
    #[arg(long)]
    pub insight: bool,
    /// Write the result here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn parse_term(raw: &str) -> Result<LinearTerm, String> {
    let (id, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=WEIGHT, got {raw}"))?;
    Ok(LinearTerm {
        variable_id: VariableId::from_raw(id.trim().parse().map_err(|_| format!("bad id {id}"))?),
        weight: weight
            .trim()
            .parse()
            .map_err(|_| format!("bad weight {weight}"))?,
    })
}

impl OptimizeArgs {
    fn objective(&self) -> Result<ObjectiveSpec, Box<dyn Error>> {
        match (self.maximize, self.minimize, self.term.is_empty()) {
            (Some(id), None, true) => Ok(ObjectiveSpec::MaximizeVariable {
                variable_id: VariableId::from_raw(id),
            }),
            (None, Some(id), true) => Ok(ObjectiveSpec::MinimizeVariable {
                variable_id: VariableId::from_raw(id),
            }),
            (None, None, false) => Ok(ObjectiveSpec::Linear {
                terms: self.term.clone(),
            }),
            _ => Err("choose exactly one of --maximize, --minimize or --term".into()),
        }
    }
}

pub async fn run(experiments: &Experiments, args: &OptimizeArgs) -> Result<(), Box<dyn Error>> {
    let initial_points: Vec<Point> = match &args.initial_points {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    let mut request = OptimizeRequest::new(
        args.variable_ids.iter().copied().map(VariableId::from_raw).collect(),
        args.n_iter,
        args.objective()?,
    )
    .with_initial_points(initial_points, args.max_initial_points);
    request.seed = args.seed;
    request.include_insight = args.insight;
    let result = settle(experiments.optimize(request)?).await;
    emit(&result, args.out.as_deref())
}
