use std::collections::BTreeMap;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use vspace_core::{EngineError, ErrorInfo};

/// JSON error body shared by every route.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub code: String,
    pub message: String,
    pub context: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Engine error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Domain(info) if info.code == "domain.unknown" => StatusCode::NOT_FOUND,
            EngineError::Domain(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Upstream(_) => StatusCode::BAD_GATEWAY,
            EngineError::Persistence(_) | EngineError::Serde(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub(crate) fn rejected(code: &str, message: impl Into<String>) -> Self {
        Self(EngineError::Validation(ErrorInfo::new(code, message)))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        let info = self.0.info().clone();
        let body = ErrorBody {
            error: self.0.family(),
            code: info.code,
            message: info.message,
            context: info.context,
            hint: info.hint,
        };
        (status, Json(body)).into_response()
    }
}

/// Header carrying the code of a non-fatal insight failure.
pub const INSIGHT_ERROR_HEADER: &str = "x-insight-error";

/// Header carrying the code of a persistence failure already known when the
/// response is built. Writes that fail later are only logged.
pub const PERSIST_ERROR_HEADER: &str = "x-persist-error";

pub(crate) fn error_code_header(err: &EngineError) -> Option<HeaderValue> {
    HeaderValue::from_str(&err.info().code).ok()
}
