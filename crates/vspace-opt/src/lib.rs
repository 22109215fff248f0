//! Seeded random search over a resolved domain.
//!
//! [`optimize`] evaluates any warm-start points first, then `n_iter` uniform
//! draws from a stream seeded by the request, and ranks every point with the
//! request's [`Objective`].

pub mod objective;
mod optimizer;

pub use objective::{LinearObjective, LinearTerm, Objective, ObjectiveSpec, ReadVariable, Sense};
pub use optimizer::{optimize, OptimizeMeta, OptimizeMethod, OptimizeRequest, OptimizeResult};
