use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a catalog variable.
///
/// Serialises as a bare integer, and as its decimal string form when used as
/// a map key (`{"3": 1.5}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(i64);

impl VariableId {
    /// Creates a new identifier from its raw integer representation.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in variable space: one coordinate per variable identifier.
pub type Point = BTreeMap<VariableId, f64>;

/// Category of a catalog variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariableCategory {
    /// Fixed physical quantity.
    PhysicalConstant,
    /// Measured or controlled engineering process parameter.
    #[default]
    EngineeringProcessMetric,
    /// Business key performance indicator.
    BusinessKpi,
    /// Subjective, judgement-based factor.
    SubjectiveFactor,
}

/// Provenance of a variable's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariableSource {
    /// Measured data.
    HardData,
    /// Entered by a user.
    #[default]
    UserInput,
    /// Proposed by an assistant.
    AiSuggestion,
    /// Combination of the above.
    Mixed,
}

/// Catalog entry describing a single variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Unique identifier.
    pub id: VariableId,
    /// Display name, unique within a catalog.
    pub name: String,
    /// Variable category.
    #[serde(default)]
    pub category: VariableCategory,
    /// Lower bound of the variable's domain.
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound of the variable's domain.
    #[serde(default)]
    pub max: Option<f64>,
    /// Optional unit label.
    #[serde(default)]
    pub unit: Option<String>,
    /// Where the variable's data came from.
    #[serde(default)]
    pub source: VariableSource,
    /// Confidence in the variable's data, in `[0, 1]`.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Inactive variables are treated as absent by the registry.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_confidence() -> f64 {
    1.0
}

fn default_active() -> bool {
    true
}

impl Variable {
    /// Creates an active, bounded variable with default metadata.
    pub fn bounded(id: i64, name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            id: VariableId::from_raw(id),
            name: name.into(),
            category: VariableCategory::default(),
            min: Some(min),
            max: Some(max),
            unit: None,
            source: VariableSource::default(),
            confidence: default_confidence(),
            active: true,
        }
    }

    /// Sets the unit label.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Returns the bounds when both ends are known and ordered.
    pub fn bounds(&self) -> Option<Bounds> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min.is_finite() && max.is_finite() && min < max => {
                Some(Bounds {
                    min,
                    max,
                    unit: self.unit.clone(),
                })
            }
            _ => None,
        }
    }
}

/// Numeric bounds of one dimension of a [`crate::Domain`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
    /// Unit label copied from the variable.
    pub unit: Option<String>,
}

impl Bounds {
    /// Width of the interval.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Maps a unit-interval value linearly into the bounds.
    pub fn scale(&self, unit: f64) -> f64 {
        (self.min + unit * self.span()).clamp(self.min, self.max)
    }

    /// Clips a value into the bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Whether the value lies inside the closed interval.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}
