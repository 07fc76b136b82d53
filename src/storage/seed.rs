// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Out-of-band provisioning of limits and wallets from a JSON seed file.
//!
//! ```json
//! {
//!   "limits": [
//!     { "wallet_type": 1, "name": "unidentified", "max_amount": 1000000 },
//!     { "wallet_type": 2, "name": "identified", "max_amount": 10000000 }
//!   ],
//!   "wallets": [
//!     { "user_id": "alice", "wallet_type": 2 }
//!   ]
//! }
//! ```
//!
//! Wallets always start with a zero balance. Seeding is idempotent: limits
//! are upserted and wallets that already exist are skipped.

use std::path::Path;

use serde::Deserialize;

use super::{LedgerDatabase, StoreError, StoreErrorKind};
use crate::models::{Limit, WalletType};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedLimit {
    pub wallet_type: u32,
    pub name: String,
    /// Minor units
    pub max_amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedWallet {
    pub user_id: String,
    pub wallet_type: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub limits: Vec<SeedLimit>,
    #[serde(default)]
    pub wallets: Vec<SeedWallet>,
}

impl SeedFile {
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let data = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Summary of what a seed run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub limits: usize,
    pub wallets_created: usize,
    pub wallets_skipped: usize,
}

/// Apply a seed file to the database.
pub fn apply_seed(db: &LedgerDatabase, seed: &SeedFile) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for limit in &seed.limits {
        db.put_limit(
            WalletType(limit.wallet_type),
            &Limit {
                name: limit.name.clone(),
                max_amount: limit.max_amount,
            },
        )?;
        report.limits += 1;
    }

    for wallet in &seed.wallets {
        match db.create_wallet(&wallet.user_id, WalletType(wallet.wallet_type)) {
            Ok(created) => {
                tracing::info!(
                    user_id = %wallet.user_id,
                    wallet_id = %created.id,
                    "Seeded wallet"
                );
                report.wallets_created += 1;
            }
            Err(StoreError {
                kind: StoreErrorKind::AlreadyExists(_),
                ..
            }) => {
                report.wallets_skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(report)
}
