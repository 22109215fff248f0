//! Orchestration around the DOE and optimize engines.
//!
//! [`Experiments`] runs an engine call, attaches an optional insight and
//! queues the run on the [`RunRecorder`]; insight and persistence failures
//! travel beside the result in an [`Outcome`] instead of replacing it.

mod config;
mod experiments;
pub mod insight;
mod recorder;
mod session;

pub use config::{LogFormat, ServiceConfig};
pub use experiments::{Experiments, Outcome};
pub use insight::{
    DoeDigest, InsightProvider, OptimizeDigest, OptimizeMetaDigest, TemplateInsight,
};
pub use recorder::{PersistTicket, RunRecorder};
pub use session::Session;
