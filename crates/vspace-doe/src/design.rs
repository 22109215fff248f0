use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use vspace_core::{
    check_count, derive_request_seed, Domain, DomainRegistry, DomainSnapshot, EngineError,
    ErrorInfo, Insight, Point, RngHandle, VariableId,
};

use crate::lhs::latin_hypercube;
use crate::sobol::{sobol_unit, MAX_DIMENSIONS};

/// Space-filling method used to build the unit matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DoeMethod {
    /// Digitally shifted Sobol sequence; deterministic in `(ids, n)`.
    #[default]
    Sobol,
    /// Latin hypercube; seeded from the request.
    Lhs,
}

impl DoeMethod {
    /// Wire label of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            DoeMethod::Sobol => "sobol",
            DoeMethod::Lhs => "lhs",
        }
    }
}

/// Request to generate a design over the listed variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoeRequest {
    /// Ordered, duplicate-free variable identifiers.
    pub variable_ids: Vec<VariableId>,
    /// Number of points, in `[1, 5000]`.
    #[serde(default = "DoeRequest::default_n_points")]
    pub n_points: usize,
    /// Sampling method.
    #[serde(default)]
    pub method: DoeMethod,
    /// Explicit LHS seed. Ignored by Sobol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Ask orchestration to attach an insight to the result.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_insight: bool,
}

impl DoeRequest {
    const fn default_n_points() -> usize {
        20
    }

    /// Builds a request with default options.
    pub fn new(variable_ids: Vec<VariableId>, n_points: usize, method: DoeMethod) -> Self {
        Self {
            variable_ids,
            n_points,
            method,
            seed: None,
            include_insight: false,
        }
    }

    /// Seed the LHS stream will use: the explicit one, or one derived from
    /// `(variable_ids, n_points)`.
    pub fn effective_seed(&self) -> i64 {
        self.seed.unwrap_or_else(|| {
            let mut words: Vec<u64> = self
                .variable_ids
                .iter()
                .map(|id| id.as_raw() as u64)
                .collect();
            words.push(self.n_points as u64);
            derive_request_seed(&words) as i64
        })
    }
}

/// Metadata describing how a design was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoeMeta {
    /// Column order used to build the unit matrix.
    pub variable_order: Vec<VariableId>,
    /// Bounds the unit matrix was scaled into.
    pub domain: DomainSnapshot,
    /// Seed of the LHS stream; absent for Sobol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

/// Generated design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoeResult {
    /// Method used.
    pub method: DoeMethod,
    /// Number of points generated.
    pub n_points: usize,
    /// Variable identifiers in request order.
    pub variable_ids: Vec<VariableId>,
    /// Points in generation order.
    pub points: Vec<Point>,
    /// Build metadata.
    pub meta: DoeMeta,
    /// Optional summary attached by orchestration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<Insight>,
}

/// Resolves the request's variables and generates the design.
#[instrument(skip_all, fields(method = request.method.as_str(), n = request.n_points, k = request.variable_ids.len()))]
pub fn generate(
    registry: &dyn DomainRegistry,
    request: &DoeRequest,
) -> Result<DoeResult, EngineError> {
    check_count("n_points", request.n_points)?;
    let domain = registry.resolve(&request.variable_ids)?;
    let seed = match request.method {
        DoeMethod::Sobol => None,
        DoeMethod::Lhs => Some(request.effective_seed()),
    };
    let points = sample_domain(&domain, request.n_points, request.method, seed)?;
    debug!(points = points.len(), ?seed, "design generated");
    Ok(DoeResult {
        method: request.method,
        n_points: request.n_points,
        variable_ids: request.variable_ids.clone(),
        points,
        meta: DoeMeta {
            variable_order: domain.ids().to_vec(),
            domain: domain.snapshot(),
            seed,
        },
        insight: None,
    })
}

/// Builds the unit matrix for `domain` and scales each column into bounds.
///
/// `seed` is required for [`DoeMethod::Lhs`] and ignored for Sobol.
pub fn sample_domain(
    domain: &Domain,
    n: usize,
    method: DoeMethod,
    seed: Option<i64>,
) -> Result<Vec<Point>, EngineError> {
    check_count("n_points", n)?;
    let k = domain.dimensions();
    let unit = match method {
        DoeMethod::Sobol => {
            if k > MAX_DIMENSIONS {
                return Err(EngineError::Validation(
                    ErrorInfo::new("doe.dimensions", "too many variables for a Sobol design")
                        .with_context("variables", k.to_string())
                        .with_context("max", MAX_DIMENSIONS.to_string())
                        .with_hint("use the lhs method or select fewer variables"),
                ));
            }
            sobol_unit(n, k)
        }
        DoeMethod::Lhs => {
            let seed = seed.ok_or_else(|| {
                EngineError::validation("doe.seed", "latin hypercube sampling requires a seed")
            })?;
            latin_hypercube(n, k, &mut RngHandle::from_seed(seed as u64))
        }
    };
    Ok(unit
        .into_iter()
        .map(|row| {
            domain
                .iter()
                .zip(row)
                .map(|((id, bounds), u)| (id, bounds.scale(u)))
                .collect()
        })
        .collect())
}
