// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet API endpoints.
//!
//! Every route is mounted under `/api/v1` behind
//! [`crate::auth::middleware::require_user_id`]. Ledger calls block on
//! redb, so they run on the blocking thread pool.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    auth::{Auth, AuthError, DIGEST_HEADER},
    error::ApiError,
    ledger::ServiceError,
    models::{BalanceResponse, DepositRequest, DepositResponse, StatsResponse},
    money,
    state::AppState,
};

/// Run a ledger call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(error = %e, "Ledger task failed");
        ApiError::internal()
    })
}

fn read_side_error(e: ServiceError, user_id: &str) -> ApiError {
    match &e {
        ServiceError::WalletNotFound { .. } => {
            tracing::warn!(user_id = %user_id, "Wallet not found")
        }
        ServiceError::Fatal(source) => {
            tracing::error!(user_id = %user_id, error = %source, "Wallet query failed")
        }
    }
    e.into()
}

/// Check the `X-Digest` header against the raw body.
fn verify_digest(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), AuthError> {
    let digest = headers
        .get(DIGEST_HEADER)
        .ok_or(AuthError::MissingDigest)?
        .to_str()
        .map_err(|_| AuthError::InvalidDigest)?;
    state.digest.verify(body, digest)
}

/// Check whether the caller owns a wallet.
#[utoipa::path(
    head,
    path = "/api/v1/wallets",
    tag = "Wallets",
    params(("X-UserId" = String, Header, description = "Caller user id")),
    responses(
        (status = 200, description = "Wallet exists"),
        (status = 401, description = "Missing X-UserId"),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn wallet_exists(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let ledger = state.ledger.clone();
    let user_id = user.user_id.clone();
    run_blocking(move || ledger.wallet_exists(&user_id))
        .await?
        .map_err(|e| read_side_error(e, &user.user_id))?;
    Ok(StatusCode::OK)
}

/// Top up the caller's wallet.
///
/// The body must be signed: `X-Digest` is the base64 HMAC-SHA256 of the raw
/// body. The signature is checked before the body is parsed.
#[utoipa::path(
    post,
    path = "/api/v1/wallets",
    tag = "Wallets",
    params(
        ("X-UserId" = String, Header, description = "Caller user id"),
        ("X-Digest" = String, Header, description = "base64(HMAC-SHA256(secret, body))")
    ),
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Deposit committed", body = DepositResponse),
        (status = 400, description = "Invalid body or amount", body = crate::error::ErrorBody),
        (status = 401, description = "Missing X-UserId or bad X-Digest"),
        (status = 404, description = "Wallet not found", body = crate::error::ErrorBody),
        (status = 422, description = "Balance limit exceeded", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody)
    )
)]
pub async fn deposit(
    Auth(user): Auth,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DepositResponse>, ApiError> {
    if let Err(e) = verify_digest(&state, &headers, &body) {
        tracing::warn!(user_id = %user.user_id, error = %e, "Rejected deposit signature");
        return Err(e.into());
    }

    let request: DepositRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?;

    let ledger = state.ledger.clone();
    run_blocking(move || ledger.deposit(&user.user_id, request.amount)).await??;

    Ok(Json(DepositResponse {
        status: "ok".to_string(),
    }))
}

/// Current balance of the caller's wallet.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/balance",
    tag = "Wallets",
    params(("X-UserId" = String, Header, description = "Caller user id")),
    responses(
        (status = 200, description = "Wallet balance", body = BalanceResponse),
        (status = 401, description = "Missing X-UserId"),
        (status = 404, description = "Wallet not found", body = crate::error::ErrorBody)
    )
)]
pub async fn balance(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let ledger = state.ledger.clone();
    let user_id = user.user_id.clone();
    let minor = run_blocking(move || ledger.balance(&user_id))
        .await?
        .map_err(|e| read_side_error(e, &user.user_id))?;

    Ok(Json(BalanceResponse {
        balance: money::to_decimal(minor),
    }))
}

/// Number and total of top-ups in the current calendar month.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/stats",
    tag = "Wallets",
    params(("X-UserId" = String, Header, description = "Caller user id")),
    responses(
        (status = 200, description = "Monthly top-up statistics", body = StatsResponse),
        (status = 401, description = "Missing X-UserId"),
        (status = 404, description = "Wallet not found", body = crate::error::ErrorBody)
    )
)]
pub async fn stats(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let ledger = state.ledger.clone();
    let user_id = user.user_id.clone();
    let stat = run_blocking(move || ledger.monthly_stats(&user_id))
        .await?
        .map_err(|e| read_side_error(e, &user.user_id))?;

    Ok(Json(StatsResponse {
        number: stat.count,
        amount: money::to_decimal(stat.sum),
    }))
}
