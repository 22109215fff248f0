//! Structured error types shared across vspace crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine readable description carried by every [`EngineError`].
///
/// `code` is a dotted identifier such as `domain.unknown`; transports expose
/// it verbatim so clients can branch on it without parsing `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Dotted error code.
    pub code: String,
    /// Diagnostic text for humans.
    pub message: String,
    /// Offending values keyed by field name.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Suggested fix, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with an empty context and no hint.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorInfo {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::default(),
            hint: None,
        }
    }

    /// Records an offending value under `key`; a repeated key overwrites.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut pairs = self.context.iter();
        if let Some((key, value)) = pairs.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in pairs {
                write!(f, ", {key}={value}")?;
            }
            f.write_str(")")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

/// Canonical error type for the experiment engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail", rename_all = "snake_case")]
pub enum EngineError {
    /// Malformed or out-of-range request fields, empty selections.
    #[error("validation error: {0}")]
    Validation(ErrorInfo),
    /// Unknown variable identifiers or variables without bounds.
    #[error("domain error: {0}")]
    Domain(ErrorInfo),
    /// Unknown run identifier.
    #[error("not found: {0}")]
    NotFound(ErrorInfo),
    /// Insight collaborator failure.
    #[error("upstream error: {0}")]
    Upstream(ErrorInfo),
    /// Run store read or write failure.
    #[error("persistence error: {0}")]
    Persistence(ErrorInfo),
    /// Payload encoding and decoding errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl EngineError {
    /// Shorthand for a [`EngineError::Validation`] with no context.
    pub fn validation(code: &str, message: impl Into<String>) -> Self {
        EngineError::Validation(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`EngineError::Persistence`] wrapping a backend error.
    pub fn persistence(code: &str, err: impl ToString) -> Self {
        EngineError::Persistence(ErrorInfo::new(code, err.to_string()))
    }

    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            EngineError::Validation(info)
            | EngineError::Domain(info)
            | EngineError::NotFound(info)
            | EngineError::Upstream(info)
            | EngineError::Persistence(info)
            | EngineError::Serde(info) => info,
        }
    }

    /// Stable family label used by transports (`validation`, `domain`, ...).
    pub fn family(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::Domain(_) => "domain",
            EngineError::NotFound(_) => "not_found",
            EngineError::Upstream(_) => "upstream",
            EngineError::Persistence(_) => "persistence",
            EngineError::Serde(_) => "serde",
        }
    }

    /// Whether the error leaves an already computed numeric result valid.
    pub fn is_non_fatal(&self) -> bool {
        matches!(self, EngineError::Upstream(_) | EngineError::Persistence(_))
    }
}
