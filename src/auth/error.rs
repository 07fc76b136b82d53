// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `X-UserId` header present
    MissingUserId,
    /// `X-UserId` is not valid visible ASCII or is blank
    InvalidUserId,
    /// No `X-Digest` header present
    MissingDigest,
    /// `X-Digest` does not match the request body
    InvalidDigest,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingUserId => "missing_user_id",
            AuthError::InvalidUserId => "invalid_user_id",
            AuthError::MissingDigest => "missing_digest",
            AuthError::InvalidDigest => "invalid_digest",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingUserId => write!(f, "X-UserId header required"),
            AuthError::InvalidUserId => write!(f, "invalid X-UserId header value"),
            AuthError::MissingDigest => write!(f, "X-Digest header required"),
            AuthError::InvalidDigest => write!(f, "invalid X-Digest header value"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
