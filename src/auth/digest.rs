// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `X-Digest` request body signatures.
//!
//! The digest is `base64(HMAC-SHA256(secret, raw_body))` using the standard
//! alphabet with padding. Verification is constant-time.

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies request bodies with a shared secret.
#[derive(Clone)]
pub struct DigestVerifier {
    key: Vec<u8>,
}

impl std::fmt::Debug for DigestVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestVerifier").finish_non_exhaustive()
    }
}

impl DigestVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length")
    }

    /// Digest header value for `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = self.mac();
        mac.update(body);
        Base64::encode_string(&mac.finalize().into_bytes())
    }

    /// Check a digest header value against `body`.
    pub fn verify(&self, body: &[u8], digest: &str) -> Result<(), AuthError> {
        let expected = Base64::decode_vec(digest.trim()).map_err(|_| AuthError::InvalidDigest)?;
        let mut mac = self.mac();
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| AuthError::InvalidDigest)
    }
}
