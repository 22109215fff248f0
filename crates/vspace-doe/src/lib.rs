//! Design of experiments over bounded variable domains.

mod design;
pub mod lhs;
pub mod sobol;

pub use design::{generate, sample_domain, DoeMeta, DoeMethod, DoeRequest, DoeResult};
pub use lhs::latin_hypercube;
pub use sobol::{sobol_unit, MAX_DIMENSIONS};
