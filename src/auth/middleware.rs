// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied to the whole `/api/v1` router so that no wallet route can be
//! reached without a caller identity:
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/wallets", post(deposit))
//!     .layer(axum::middleware::from_fn(require_user_id));
//! ```

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::user_from_headers;

/// Reject requests without `X-UserId` and stash the caller in the request
/// extensions for the [`super::Auth`] extractor.
pub async fn require_user_id(mut request: Request, next: Next) -> Response {
    match user_from_headers(request.headers()) {
        Ok(user) => {
            tracing::Span::current().record("user_id", user.user_id.as_str());
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %request.uri().path(),
                "Rejected unauthenticated request"
            );
            e.into_response()
        }
    }
}
