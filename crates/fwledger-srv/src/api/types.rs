use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fwledger_core::{ErrorResponse, FwError};
use std::sync::Arc;
use tracing::{error, warn};

use crate::session::SessionManager;

#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<SessionManager>,
}

impl ApiState {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }
}

/// Error returned by a route handler.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed body or missing field; answered with 400 `{error}`.
    BadRequest(String),
    /// A collaborator failed; answered with 500 `{error, details}`.
    Failed {
        summary: &'static str,
        source: FwError,
    },
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                warn!(error = %message, "rejected request");
                let body = ErrorResponse {
                    error: message,
                    details: None,
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::Failed { summary, source } => {
                error!(error = %source, "{summary}");
                let body = ErrorResponse {
                    error: summary.to_string(),
                    details: Some(source.to_string()),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Attach the route's failure summary to a core error.
pub(crate) trait OrFail<T> {
    fn or_fail(self, summary: &'static str) -> Result<T, ApiError>;
}

impl<T> OrFail<T> for fwledger_core::Result<T> {
    fn or_fail(self, summary: &'static str) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::Failed { summary, source })
    }
}
