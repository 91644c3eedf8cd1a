//! Error taxonomy for the batching proxy
//!
//! This module defines every failure kind that can be surfaced at the proxy's HTTP boundary,
//! and the mapping from each kind to an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the proxy
#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    /// Rejected at the edge, before the ticket is ever enqueued
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Downstream could not be reached, or the connection dropped mid-call
    #[error("downstream transport error: {0}")]
    DownstreamTransport(String),

    /// Downstream returned a non-success status, or a malformed/mismatched result list
    #[error("downstream protocol error: {0}")]
    DownstreamProtocol(String),

    /// The configured downstream round-trip deadline was exceeded
    #[error("downstream timeout: {0}")]
    DownstreamTimeout(String),

    /// An internal invariant was violated (queue corruption, double-signalled handle, ...)
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Create a bad-request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ProxyError::BadRequest(msg.into())
    }

    /// Create a downstream-transport error
    pub fn downstream_transport(msg: impl Into<String>) -> Self {
        ProxyError::DownstreamTransport(msg.into())
    }

    /// Create a downstream-protocol error
    pub fn downstream_protocol(msg: impl Into<String>) -> Self {
        ProxyError::DownstreamProtocol(msg.into())
    }

    /// Create a downstream-timeout error
    pub fn downstream_timeout(msg: impl Into<String>) -> Self {
        ProxyError::DownstreamTimeout(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        ProxyError::Internal(msg.into())
    }

    /// HTTP status this error kind is surfaced as
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::DownstreamTransport(_) => StatusCode::BAD_GATEWAY,
            ProxyError::DownstreamProtocol(_) => StatusCode::BAD_GATEWAY,
            ProxyError::DownstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;
