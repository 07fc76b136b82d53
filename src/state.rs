// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::DigestVerifier;
use crate::ledger::LedgerService;
use crate::storage::LedgerDatabase;

/// Shared handler state. Cloned per request; everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerService<LedgerDatabase>>,
    pub digest: Arc<DigestVerifier>,
    /// Directory holding the database, checked by the readiness probe
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(
        ledger: LedgerService<LedgerDatabase>,
        digest: DigestVerifier,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ledger: Arc::new(ledger),
            digest: Arc::new(digest),
            data_dir: data_dir.into(),
        }
    }
}
