// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum::{
    extract::Request,
    http::{HeaderName, StatusCode},
    middleware,
    routing::{get, head},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::middleware::require_user_id,
    error::{ErrorBody, LimitDetails},
    models::{BalanceResponse, DepositRequest, DepositResponse, StatsResponse},
    state::AppState,
};

pub mod health;
pub mod wallets;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let v1_routes = Router::new()
        .route("/wallets", head(wallets::wallet_exists).post(wallets::deposit))
        .route("/wallets/balance", get(wallets::balance))
        .route("/wallets/stats", get(wallets::stats))
        .route_layer(middleware::from_fn(require_user_id))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/api/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                        user_id = tracing::field::Empty,
                    )
                }))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        wallets::wallet_exists,
        wallets::deposit,
        wallets::balance,
        wallets::stats,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            DepositRequest,
            DepositResponse,
            BalanceResponse,
            StatsResponse,
            ErrorBody,
            LimitDetails,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Wallets", description = "Wallet top-ups, balance and statistics"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{DigestVerifier, DIGEST_HEADER, USER_ID_HEADER};
    use crate::ledger::{DepositPolicy, LedgerService};
    use crate::models::{Limit, WalletType};
    use crate::storage::LedgerDatabase;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";

    fn test_app() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDatabase::open(&dir.path().join("ledger.redb")).unwrap();
        db.put_limit(
            WalletType(1),
            &Limit {
                name: "unidentified".to_string(),
                max_amount: 1_000,
            },
        )
        .unwrap();
        db.create_wallet("alice", WalletType(1)).unwrap();

        let state = AppState::new(
            LedgerService::new(db, DepositPolicy::default()),
            DigestVerifier::new(SECRET),
            dir.path(),
        );
        (router(state, Duration::from_secs(4)), dir)
    }

    fn deposit_request(user_id: Option<&str>, body: &str, digest: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/wallets")
            .header("content-type", "application/json");
        if let Some(user_id) = user_id {
            builder = builder.header(USER_ID_HEADER, user_id);
        }
        if let Some(digest) = digest {
            builder = builder.header(DIGEST_HEADER, digest);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn signed_deposit(user_id: &str, body: &str) -> Request<Body> {
        let digest = DigestVerifier::new(SECRET).sign(body.as_bytes());
        deposit_request(Some(user_id), body, Some(digest))
    }

    fn get_request(method: Method, uri: &str, user_id: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_ID_HEADER, user_id)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn deposit_then_read_balance() {
        let (app, _dir) = test_app();

        let (status, body) = send(&app, signed_deposit("alice", r#"{"amount":4.00}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));

        let (status, body) =
            send(&app, get_request(Method::GET, "/api/v1/wallets/balance", "alice")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "balance": 4.0 }));
    }

    #[tokio::test]
    async fn stats_count_this_months_deposits() {
        let (app, _dir) = test_app();
        send(&app, signed_deposit("alice", r#"{"amount":4.00}"#)).await;
        send(&app, signed_deposit("alice", r#"{"amount":2.50}"#)).await;

        let (status, body) =
            send(&app, get_request(Method::GET, "/api/v1/wallets/stats", "alice")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "number": 2, "amount": 6.5 }));
    }

    #[tokio::test]
    async fn missing_user_id_is_unauthorized() {
        let (app, _dir) = test_app();

        let (status, body) = send(&app, deposit_request(None, r#"{"amount":4.00}"#, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "missing_user_id");

        let request = Request::builder()
            .uri("/api/v1/wallets/balance")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_or_wrong_digest_is_unauthorized() {
        let (app, _dir) = test_app();

        let (status, _) =
            send(&app, deposit_request(Some("alice"), r#"{"amount":4.00}"#, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let digest = DigestVerifier::new(SECRET).sign(br#"{"amount":1.00}"#);
        let (status, body) = send(
            &app,
            deposit_request(Some("alice"), r#"{"amount":9.00}"#, Some(digest)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid X-Digest header value");

        let (_, body) =
            send(&app, get_request(Method::GET, "/api/v1/wallets/balance", "alice")).await;
        assert_eq!(body, json!({ "balance": 0.0 }));
    }

    #[tokio::test]
    async fn limit_exceeded_is_unprocessable() {
        let (app, _dir) = test_app();

        let (status, body) = send(&app, signed_deposit("alice", r#"{"amount":11.00}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({
                "error": "limit exceeded, for unidentified is 10 TJS",
                "limit": { "wallet_type": "unidentified", "max_amount": 10.0 }
            })
        );
    }

    #[tokio::test]
    async fn unknown_wallet_is_not_found() {
        let (app, _dir) = test_app();

        let (status, body) = send(&app, signed_deposit("ghost", r#"{"amount":4.00}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "wallet not found" }));

        let (status, _) =
            send(&app, get_request(Method::GET, "/api/v1/wallets/stats", "ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_bodies_and_amounts_are_rejected() {
        let (app, _dir) = test_app();

        for body in [
            r#"{"amount":0.99}"#,
            r#"{"amount":4.00,"currency":"TJS"}"#,
            r#"{"amount":"4.00"}"#,
            "not json",
        ] {
            let (status, _) = send(&app, signed_deposit("alice", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        }
    }

    #[tokio::test]
    async fn head_reports_wallet_existence() {
        let (app, _dir) = test_app();

        let (status, _) = send(&app, get_request(Method::HEAD, "/api/v1/wallets", "alice")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, get_request(Method::HEAD, "/api/v1/wallets", "ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_probes_report_ok() {
        let (app, _dir) = test_app();

        let request = Request::builder().uri("/health/live").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));

        let request = Request::builder().uri("/health/ready").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"], "ok");
        assert_eq!(body["checks"]["data_dir"], "ok");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (app, _dir) = test_app();

        let request = Request::builder().uri("/health/live").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }
}
