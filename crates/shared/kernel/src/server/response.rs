//! JSON envelope shared by every endpoint and the error type handlers return.

use crate::operations::OperationError;
use crate::security::DenyReason;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::borrow::Cow;
use tracing::{error, warn};
use utoipa::ToSchema;

/// `{timestamp, status, code, data | error}`
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T> {
    /// RFC 3339 timestamp in UTC
    pub timestamp: String,
    /// HTTP reason phrase
    pub status: &'static str,
    /// HTTP status code
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    fn new(code: StatusCode, data: Option<T>, error: Option<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status: code.canonical_reason().unwrap_or("Unknown"),
            code: code.as_u16(),
            data,
            error,
        }
    }

    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, Some(data), None)
    }
}

impl Envelope<()> {
    pub fn error(code: StatusCode, message: impl Into<String>) -> Self {
        Self::new(code, None, Some(message.into()))
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let code = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Json(self)).into_response()
    }
}

#[creg_derive::registry_error]
pub enum ApiError {
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: DenyReason },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: DenyReason },

    #[error("Certificate '{key}' is not declared")]
    UnknownCertificate { key: String },

    #[error("Certificate operation failed{}: {source}", format_context(.context))]
    Operation { source: OperationError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::UnknownCertificate { .. }
            | Self::Operation { source: OperationError::NotIssued { .. }, .. } => {
                StatusCode::NOT_FOUND
            }
            Self::Operation { source: OperationError::Command { .. }, .. } => StatusCode::BAD_GATEWAY,
            Self::Operation { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else if matches!(self, Self::Operation { .. }) {
            warn!(error = %self, "Certificate operation rejected");
        }
        Envelope::error(status, self.to_string()).into_response()
    }
}
