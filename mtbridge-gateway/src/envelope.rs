//! Uniform failure envelope: `{"kind": "...", "detail": "..."}`.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mtbridge_core::{BridgeError, ErrorKind};
use serde::Serialize;

use crate::config::ErrorStatusPolicy;

/// Failure kinds the gateway reports. Bridge kinds pass through; the rest
/// originate in the gateway itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Bridge(ErrorKind),
    Timeout,
    Internal,
}

impl EnvelopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeKind::Bridge(kind) => kind.as_str(),
            EnvelopeKind::Timeout => "timeout",
            EnvelopeKind::Internal => "internal",
        }
    }

    fn status(self, policy: ErrorStatusPolicy) -> StatusCode {
        if policy == ErrorStatusPolicy::Uniform {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            EnvelopeKind::Bridge(ErrorKind::InvalidArgument) => StatusCode::BAD_REQUEST,
            EnvelopeKind::Bridge(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            EnvelopeKind::Bridge(ErrorKind::OrderRejected) => StatusCode::CONFLICT,
            EnvelopeKind::Bridge(ErrorKind::NotConnected) => StatusCode::SERVICE_UNAVAILABLE,
            EnvelopeKind::Bridge(ErrorKind::CapabilityError) => StatusCode::BAD_GATEWAY,
            EnvelopeKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            EnvelopeKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct EnvelopeBody<'a> {
    kind: &'static str,
    detail: &'a str,
}

/// A failed request, ready to be rendered.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: EnvelopeKind,
    pub detail: String,
    pub status: StatusCode,
}

impl ApiError {
    pub fn new(kind: EnvelopeKind, detail: impl Into<String>, policy: ErrorStatusPolicy) -> Self {
        Self {
            kind,
            detail: detail.into(),
            status: kind.status(policy),
        }
    }

    pub fn from_bridge(err: &BridgeError, policy: ErrorStatusPolicy) -> Self {
        Self::new(EnvelopeKind::Bridge(err.kind()), err.detail(), policy)
    }

    /// Request could not be parsed into a command.
    pub fn invalid(detail: impl Into<String>, policy: ErrorStatusPolicy) -> Self {
        Self::new(EnvelopeKind::Bridge(ErrorKind::InvalidArgument), detail, policy)
    }

    pub fn timeout(limit: Duration, policy: ErrorStatusPolicy) -> Self {
        Self::new(
            EnvelopeKind::Timeout,
            format!(
                "no answer from the terminal within {}s; the command may still complete",
                limit.as_secs()
            ),
            policy,
        )
    }

    pub fn internal(detail: impl Into<String>, policy: ErrorStatusPolicy) -> Self {
        Self::new(EnvelopeKind::Internal, detail, policy)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = EnvelopeBody {
            kind: self.kind.as_str(),
            detail: &self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}
