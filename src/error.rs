// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP error responses and the mapping from ledger errors.
//!
//! | Ledger outcome | Status |
//! |----------------|--------|
//! | Invalid input | 400 |
//! | Missing or bad `X-Digest` | 401 |
//! | Wallet not found | 404 |
//! | Limit exceeded | 422, with `limit` details |
//! | Fatal | 500, opaque message |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::ledger::{DepositError, ServiceError};
use crate::money;

/// Structured context of a limit rejection.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LimitDetails {
    /// Display name of the wallet type's limit
    pub wallet_type: String,
    /// Maximum balance in currency units
    pub max_amount: f64,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub limit: Option<LimitDetails>,
}

/// Error body returned by every failing endpoint.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<LimitDetails>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            limit: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Opaque server error. Details belong in the logs, not the response.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl From<DepositError> for ApiError {
    fn from(e: DepositError) -> Self {
        match &e {
            DepositError::Invalid(reason) => {
                ApiError::bad_request(format!("invalid amount: {reason}"))
            }
            DepositError::WalletNotFound { .. } => ApiError::not_found("wallet not found"),
            DepositError::LimitExceeded {
                wallet_type_name,
                max_amount,
            } => ApiError {
                limit: Some(LimitDetails {
                    wallet_type: wallet_type_name.clone(),
                    max_amount: money::to_decimal(*max_amount),
                }),
                ..ApiError::unprocessable(e.to_string())
            },
            DepositError::Fatal(_) => ApiError::internal(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::WalletNotFound { .. } => ApiError::not_found("wallet not found"),
            ServiceError::Fatal(_) => ApiError::internal(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::new(e.status_code(), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            limit: self.limit,
        });
        (self.status, body).into_response()
    }
}
