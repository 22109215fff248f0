//! Best-effort summaries of engine results.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::json;
use vspace_core::{EngineError, ErrorInfo, Insight, Point, VariableId};

/// Input of a DOE summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoeDigest {
    pub variable_ids: Vec<VariableId>,
    pub points: Vec<Point>,
}

/// Subset of the optimize metadata a summary reads. Other fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizeMetaDigest {
    #[serde(default)]
    pub n_iter: Option<usize>,
    #[serde(default)]
    pub best_score: Option<f64>,
    #[serde(default)]
    pub initial_points: Option<usize>,
}

/// Input of an optimize summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeDigest {
    pub variable_ids: Vec<VariableId>,
    pub best_point: Point,
    #[serde(default)]
    pub meta: OptimizeMetaDigest,
}

/// External summarizer. Failures are reported as [`EngineError::Upstream`]
/// and never discard the numeric result they describe.
pub trait InsightProvider: Send + Sync {
    fn summarize_doe(&self, digest: &DoeDigest) -> Result<Insight, EngineError>;

    fn summarize_optimize(&self, digest: &OptimizeDigest) -> Result<Insight, EngineError>;
}

/// Deterministic template summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateInsight;

#[derive(Serialize)]
struct Range {
    min: f64,
    max: f64,
}

fn ensure_unique(ids: &[VariableId]) -> Result<(), EngineError> {
    let mut seen = BTreeSet::new();
    if let Some(dup) = ids.iter().find(|id| !seen.insert(**id)) {
        return Err(EngineError::Validation(
            ErrorInfo::new("insight.variable_ids", "variable_ids must be unique")
                .with_context("variable_id", dup.to_string()),
        ));
    }
    Ok(())
}

impl InsightProvider for TemplateInsight {
    fn summarize_doe(&self, digest: &DoeDigest) -> Result<Insight, EngineError> {
        ensure_unique(&digest.variable_ids)?;
        let mut stats = BTreeMap::new();
        for id in &digest.variable_ids {
            let range = digest
                .points
                .iter()
                .filter_map(|p| p.get(id).copied())
                .fold(None, |acc: Option<Range>, v| {
                    Some(match acc {
                        None => Range { min: v, max: v },
                        Some(r) => Range {
                            min: r.min.min(v),
                            max: r.max.max(v),
                        },
                    })
                });
            if let Some(range) = range {
                stats.insert(*id, range);
            }
        }

        let mut bullets = vec![
            "Design generated within the hard min/max bounds of every variable.".to_string(),
            format!("Number of points: {}.", digest.points.len()),
        ];
        for id in &digest.variable_ids {
            bullets.push(match stats.get(id) {
                Some(r) => format!("Variable {id}: observed range ≈ [{:.4}, {:.4}].", r.min, r.max),
                None => format!("Variable {id}: no values in the points."),
            });
        }
        Ok(Insight {
            summary: "DOE quick summary".to_string(),
            bullets,
            meta: json!({ "stats": stats }),
        })
    }

    fn summarize_optimize(&self, digest: &OptimizeDigest) -> Result<Insight, EngineError> {
        ensure_unique(&digest.variable_ids)?;
        let meta = &digest.meta;
        let mut bullets =
            vec!["Search ran within the hard min/max bounds of every variable.".to_string()];
        if let Some(seeded) = meta.initial_points {
            bullets.push(format!("Warm-start points consumed: {seeded}."));
        }
        if let Some(n_iter) = meta.n_iter.filter(|n| *n > 0) {
            bullets.push(format!("Random search iterations: {n_iter}."));
        }
        if let Some(score) = meta.best_score {
            bullets.push(format!("Best score: {score:.4}."));
        }
        for id in &digest.variable_ids {
            bullets.push(match digest.best_point.get(id) {
                Some(v) => format!("Best point, variable {id}: {v:.4}."),
                None => format!("Best point, variable {id}: no value."),
            });
        }
        Ok(Insight {
            summary: "Optimize quick summary".to_string(),
            bullets,
            meta: json!({ "variable_ids": digest.variable_ids }),
        })
    }
}
