// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Caller identity and request integrity for the wallet API.
//!
//! ## Auth Flow
//!
//! 1. The upstream gateway authenticates the end user and forwards the
//!    canonical user id in `X-UserId`.
//! 2. [`middleware::require_user_id`] rejects any `/api/v1` request without
//!    it and stores an [`AuthenticatedUser`] in the request extensions.
//! 3. Mutating requests carry `X-Digest`, the base64 HMAC-SHA256 of the raw
//!    body under the shared secret, checked by [`DigestVerifier`].

pub mod digest;
pub mod error;
pub mod extractor;
pub mod middleware;

pub use digest::DigestVerifier;
pub use error::AuthError;
pub use extractor::Auth;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-userid";

/// Header carrying the body signature.
pub const DIGEST_HEADER: &str = "x-digest";

/// Identity of the caller, as forwarded by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}
