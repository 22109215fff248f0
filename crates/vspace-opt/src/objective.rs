//! Pluggable scoring of evaluated points.

use serde::{Deserialize, Serialize};
use vspace_core::{EngineError, ErrorInfo, Point, VariableId};

/// Direction in which scores improve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    Maximize,
    Minimize,
}

impl Sense {
    /// Whether `candidate` strictly improves on `incumbent`.
    pub fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Sense::Maximize => candidate > incumbent,
            Sense::Minimize => candidate < incumbent,
        }
    }
}

/// Scoring capability used to rank evaluated points.
pub trait Objective: Send + Sync {
    /// Direction of improvement.
    fn sense(&self) -> Sense;

    /// Scores a point. Every variable the objective reads must be present.
    fn score(&self, point: &Point) -> Result<f64, EngineError>;
}

/// Identity read of one coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadVariable {
    pub variable_id: VariableId,
    pub sense: Sense,
}

impl Objective for ReadVariable {
    fn sense(&self) -> Sense {
        self.sense
    }

    fn score(&self, point: &Point) -> Result<f64, EngineError> {
        coordinate(point, self.variable_id)
    }
}

/// One weighted term of a [`LinearObjective`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTerm {
    pub variable_id: VariableId,
    pub weight: f64,
}

/// Weighted sum of coordinates, maximized.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearObjective {
    pub terms: Vec<LinearTerm>,
}

impl Objective for LinearObjective {
    fn sense(&self) -> Sense {
        Sense::Maximize
    }

    fn score(&self, point: &Point) -> Result<f64, EngineError> {
        self.terms.iter().try_fold(0.0, |acc, term| {
            Ok(acc + term.weight * coordinate(point, term.variable_id)?)
        })
    }
}

fn coordinate(point: &Point, id: VariableId) -> Result<f64, EngineError> {
    point.get(&id).copied().ok_or_else(|| {
        EngineError::Validation(
            ErrorInfo::new("objective.coordinate", "point has no value for the objective variable")
                .with_context("variable_id", id.to_string()),
        )
    })
}

/// Wire description of an objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectiveSpec {
    /// Maximize the raw value of one variable.
    MaximizeVariable { variable_id: VariableId },
    /// Minimize the raw value of one variable.
    MinimizeVariable { variable_id: VariableId },
    /// Maximize `sum(weight_i * x_i)`.
    Linear { terms: Vec<LinearTerm> },
}

impl ObjectiveSpec {
    /// Variables the objective reads.
    pub fn variables(&self) -> Vec<VariableId> {
        match self {
            ObjectiveSpec::MaximizeVariable { variable_id }
            | ObjectiveSpec::MinimizeVariable { variable_id } => vec![*variable_id],
            ObjectiveSpec::Linear { terms } => terms.iter().map(|t| t.variable_id).collect(),
        }
    }

    /// Checks the objective against the request's variable list and builds
    /// the scorer.
    pub fn build(&self, variable_ids: &[VariableId]) -> Result<Box<dyn Objective>, EngineError> {
        if let ObjectiveSpec::Linear { terms } = self {
            if terms.is_empty() {
                return Err(EngineError::validation(
                    "objective.terms",
                    "linear objective needs at least one term",
                ));
            }
            if let Some(term) = terms.iter().find(|t| !t.weight.is_finite()) {
                return Err(EngineError::Validation(
                    ErrorInfo::new("objective.weight", "weights must be finite")
                        .with_context("variable_id", term.variable_id.to_string()),
                ));
            }
        }
        let outside: Vec<String> = self
            .variables()
            .into_iter()
            .filter(|id| !variable_ids.contains(id))
            .map(|id| id.to_string())
            .collect();
        if !outside.is_empty() {
            return Err(EngineError::Validation(
                ErrorInfo::new(
                    "objective.variable",
                    "objective variables must be part of variable_ids",
                )
                .with_context("variable_ids", outside.join(",")),
            ));
        }
        Ok(match self {
            ObjectiveSpec::MaximizeVariable { variable_id } => Box::new(ReadVariable {
                variable_id: *variable_id,
                sense: Sense::Maximize,
            }),
            ObjectiveSpec::MinimizeVariable { variable_id } => Box::new(ReadVariable {
                variable_id: *variable_id,
                sense: Sense::Minimize,
            }),
            ObjectiveSpec::Linear { terms } => Box::new(LinearObjective {
                terms: terms.clone(),
            }),
        })
    }
}
