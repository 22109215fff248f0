use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use vspace_core::{
    check_count, entropy_seed, Domain, DomainRegistry, DomainSnapshot, EngineError, ErrorInfo,
    Insight, Point, RngHandle, VariableId, MAX_POINTS,
};

use crate::objective::{Objective, ObjectiveSpec};

/// Search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OptimizeMethod {
    /// Uniform random draws within the domain.
    #[default]
    Random,
}

impl OptimizeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizeMethod::Random => "random",
        }
    }
}

/// Request to search the listed variables for a best point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub variable_ids: Vec<VariableId>,
    /// Number of random draws, in `[1, 5000]`.
    #[serde(default = "OptimizeRequest::default_n_iter")]
    pub n_iter: usize,
    #[serde(default)]
    pub method: OptimizeMethod,
    /// Seed of the draw stream; any integer, negative included. Drawn
    /// from OS entropy when absent.
    #[serde(default)]
    pub seed: Option<i64>,
    pub objective: ObjectiveSpec,
    /// Warm-start points, clamped into the domain and evaluated first.
    #[serde(default)]
    pub initial_points: Vec<Point>,
    /// How many of `initial_points` are consumed, at most 5000.
    #[serde(default = "OptimizeRequest::default_max_initial_points")]
    pub max_initial_points: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_insight: bool,
}

impl OptimizeRequest {
    const fn default_n_iter() -> usize {
        30
    }

    const fn default_max_initial_points() -> usize {
        200
    }

    /// Builds an unseeded request with no warm-start points.
    pub fn new(variable_ids: Vec<VariableId>, n_iter: usize, objective: ObjectiveSpec) -> Self {
        Self {
            variable_ids,
            n_iter,
            method: OptimizeMethod::Random,
            seed: None,
            objective,
            initial_points: Vec::new(),
            max_initial_points: Self::default_max_initial_points(),
            include_insight: false,
        }
    }

    /// Sets the seed of the draw stream.
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the warm-start points and the cap on how many are consumed.
    pub fn with_initial_points(mut self, points: Vec<Point>, cap: usize) -> Self {
        self.initial_points = points;
        self.max_initial_points = cap;
        self
    }
}

/// Summary of how the search ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeMeta {
    /// Extremal objective score over the history.
    pub best_score: f64,
    pub objective: ObjectiveSpec,
    pub domain: DomainSnapshot,
    /// Warm-start points actually consumed.
    pub initial_points: usize,
    /// Cap that was applied to the warm-start points.
    pub max_initial_points: usize,
    /// Seed the draw stream used; replaying with it reproduces the history.
    pub seed: i64,
    pub n_iter: usize,
    pub method: OptimizeMethod,
}

/// Outcome of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    pub method: OptimizeMethod,
    pub n_iter: usize,
    pub variable_ids: Vec<VariableId>,
    pub best_point: Point,
    /// Every evaluated point: consumed warm-start points, then draws.
    pub history: Vec<Point>,
    pub meta: OptimizeMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<Insight>,
}

/// Runs the search described by `request`.
#[instrument(skip_all, fields(method = request.method.as_str(), n_iter = request.n_iter, k = request.variable_ids.len()))]
pub fn optimize(
    registry: &dyn DomainRegistry,
    request: &OptimizeRequest,
) -> Result<OptimizeResult, EngineError> {
    check_count("n_iter", request.n_iter)?;
    if request.max_initial_points > MAX_POINTS {
        return Err(EngineError::Validation(
            ErrorInfo::new(
                "max_initial_points.range",
                format!("max_initial_points must lie in [0, {MAX_POINTS}]"),
            )
            .with_context("max_initial_points", request.max_initial_points.to_string()),
        ));
    }
    let objective = request.objective.build(&request.variable_ids)?;
    let domain = registry.resolve(&request.variable_ids)?;

    let consumed = request.max_initial_points.min(request.initial_points.len());
    let mut history = Vec::with_capacity(consumed + request.n_iter);
    for (index, raw) in request.initial_points.iter().take(consumed).enumerate() {
        history.push(clamp_point(&domain, raw, index)?);
    }

    let seed = request.seed.unwrap_or_else(|| entropy_seed() as i64);
    // Bit-preserving; every i64 names a distinct stream.
    let mut rng = RngHandle::from_seed(seed as u64);
    for _ in 0..request.n_iter {
        history.push(draw_point(&domain, &mut rng));
    }

    let (best_index, best_score) = select_best(objective.as_ref(), &history)?;
    let best_point = history[best_index].clone();
    debug!(seed, consumed, best_index, best_score, "search finished");

    Ok(OptimizeResult {
        method: request.method,
        n_iter: request.n_iter,
        variable_ids: request.variable_ids.clone(),
        best_point,
        history,
        meta: OptimizeMeta {
            best_score,
            objective: request.objective.clone(),
            domain: domain.snapshot(),
            initial_points: consumed,
            max_initial_points: request.max_initial_points,
            seed,
            n_iter: request.n_iter,
            method: request.method,
        },
        insight: None,
    })
}

/// Projects a warm-start point onto the domain. Extra coordinates are dropped.
fn clamp_point(domain: &Domain, raw: &Point, index: usize) -> Result<Point, EngineError> {
    domain
        .iter()
        .map(|(id, bounds)| match raw.get(&id) {
            Some(value) if value.is_finite() => Ok((id, bounds.clamp(*value))),
            Some(_) => Err(initial_point_error(index, id, "coordinate is not finite")),
            None => Err(initial_point_error(index, id, "coordinate is missing")),
        })
        .collect()
}

fn initial_point_error(index: usize, id: VariableId, message: &str) -> EngineError {
    EngineError::Validation(
        ErrorInfo::new("optimize.initial_point", message)
            .with_context("index", index.to_string())
            .with_context("variable_id", id.to_string()),
    )
}

/// Draws one point, consuming the stream in identifier order.
fn draw_point(domain: &Domain, rng: &mut RngHandle) -> Point {
    domain
        .iter()
        .map(|(id, bounds)| (id, bounds.scale(rng.gen::<f64>())))
        .collect()
}

/// Index and score of the first point with the extremal score.
fn select_best(objective: &dyn Objective, history: &[Point]) -> Result<(usize, f64), EngineError> {
    let sense = objective.sense();
    let mut best: Option<(usize, f64)> = None;
    for (index, point) in history.iter().enumerate() {
        let score = objective.score(point)?;
        match best {
            Some((_, incumbent)) if !sense.improves(score, incumbent) => {}
            _ => best = Some((index, score)),
        }
    }
    best.ok_or_else(|| EngineError::validation("optimize.history", "no points were evaluated"))
}
