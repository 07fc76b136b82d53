// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the calling user.
//!
//! Use the `Auth` extractor in handlers to require a caller identity:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};

use super::{AuthError, AuthenticatedUser, USER_ID_HEADER};

/// Extractor for the authenticated caller.
///
/// Reuses the user set by [`super::middleware::require_user_id`] when the
/// middleware ran, otherwise reads `X-UserId` directly.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        user_from_headers(&parts.headers).map(Auth)
    }
}

/// Read and validate the `X-UserId` header.
pub fn user_from_headers(headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
    let value = headers
        .get(USER_ID_HEADER)
        .ok_or(AuthError::MissingUserId)?
        .to_str()
        .map_err(|_| AuthError::InvalidUserId)?
        .trim();

    if value.is_empty() {
        return Err(AuthError::MissingUserId);
    }

    Ok(AuthenticatedUser {
        user_id: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_user_id() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" user-42 "));
        let user = user_from_headers(&headers).unwrap();
        assert_eq!(user.user_id, "user-42");
    }

    #[test]
    fn missing_or_blank_user_id_is_rejected() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_from_headers(&headers), Err(AuthError::MissingUserId));

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        assert_eq!(user_from_headers(&headers), Err(AuthError::MissingUserId));
    }

    #[test]
    fn non_ascii_user_id_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());
        assert_eq!(user_from_headers(&headers), Err(AuthError::InvalidUserId));
    }
}
