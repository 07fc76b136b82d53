// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Storage
//!
//! Two logical stores back the ledger:
//!
//! - **Wallet ledger**: wallet identity, balance and type, plus the limit
//!   configured for each type. See [`WalletLedger`].
//! - **Transaction log**: append-only record of top-ups with a monthly
//!   aggregate query. See [`TransactionLog`].
//!
//! All mutation goes through a [`UnitOfWork`] opened with
//! [`Transactional::begin_unit_of_work`]. A unit that is dropped without
//! [`UnitOfWork::commit`] is rolled back.
//!
//! [`LedgerDatabase`] implements both stores on a single embedded redb file.

pub mod ledger_db;
pub mod seed;

pub use ledger_db::LedgerDatabase;
pub use seed::{apply_seed, SeedError, SeedFile};

use crate::models::{
    Limit, MonthlyStat, StatsRange, TransactionId, WalletId, WalletSnapshot, WalletType,
};

// =============================================================================
// Error Type
// =============================================================================

/// What went wrong inside a store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreErrorKind {
    #[error("wallet not found")]
    WalletNotFound,

    #[error("no limit configured for wallet type {0}")]
    LimitNotFound(WalletType),

    #[error("limit for wallet type {0} must be positive")]
    InvalidLimit(WalletType),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("balance overflow on wallet {0}")]
    BalanceOverflow(WalletId),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}

/// Store error tagged with the operation that produced it.
#[derive(Debug, thiserror::Error)]
#[error("{op}: {kind}")]
pub struct StoreError {
    pub op: &'static str,
    #[source]
    pub kind: StoreErrorKind,
}

impl StoreError {
    pub fn new(op: &'static str, kind: impl Into<StoreErrorKind>) -> Self {
        Self {
            op,
            kind: kind.into(),
        }
    }

    /// Whether the wallet addressed by the operation does not exist.
    pub fn is_wallet_not_found(&self) -> bool {
        matches!(self.kind, StoreErrorKind::WalletNotFound)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Attach an operation name to any error convertible into [`StoreErrorKind`].
pub trait OpContext<T> {
    fn op(self, op: &'static str) -> StoreResult<T>;
}

impl<T, E: Into<StoreErrorKind>> OpContext<T> for Result<T, E> {
    fn op(self, op: &'static str) -> StoreResult<T> {
        self.map_err(|e| StoreError::new(op, e))
    }
}

// =============================================================================
// Store Contracts
// =============================================================================

/// An all-or-nothing unit of work at serializable isolation.
///
/// Implementations must roll back when dropped without `commit`.
pub trait UnitOfWork {
    /// Balance of a wallet as seen inside this unit.
    fn balance(&mut self, wallet_id: WalletId) -> StoreResult<u64>;

    /// Make every change in this unit durable.
    fn commit(self) -> StoreResult<()>;

    /// Discard every change in this unit and report whether the backend
    /// released it cleanly. Dropping the unit discards too, but silently.
    fn rollback(self) -> StoreResult<()>;
}

/// Storage that can open a [`UnitOfWork`].
pub trait Transactional {
    type Unit: UnitOfWork;

    /// Start a unit of work at the strongest isolation the backend offers.
    fn begin_unit_of_work(&self) -> StoreResult<Self::Unit>;
}

/// Wallet identity, balances and the per-type limit table.
pub trait WalletLedger: Transactional {
    /// Wallet owned by `user_id`. Fails with `WalletNotFound` if none.
    fn find_wallet_by_owner(&self, user_id: &str) -> StoreResult<WalletId>;

    /// Balance and type of the wallet owned by `user_id`.
    fn wallet_snapshot(&self, user_id: &str) -> StoreResult<WalletSnapshot>;

    /// Limit configured for `wallet_type`. Fails with `LimitNotFound` if none.
    fn limit(&self, wallet_type: WalletType) -> StoreResult<Limit>;

    /// Add `delta` to the wallet balance inside `unit` as one store-side
    /// arithmetic update.
    fn increment_balance(
        &self,
        unit: &mut Self::Unit,
        wallet_id: WalletId,
        delta: u64,
    ) -> StoreResult<()>;
}

/// Append-only record of top-ups.
pub trait TransactionLog: Transactional {
    /// Record one top-up inside `unit` and return its identity.
    fn append(
        &self,
        unit: &mut Self::Unit,
        wallet_id: WalletId,
        amount: u64,
    ) -> StoreResult<TransactionId>;

    /// Count and sum of top-ups on `wallet_id` within `range` (inclusive).
    /// An empty range yields zeros, not an error.
    fn monthly_aggregate(&self, wallet_id: WalletId, range: &StatsRange)
        -> StoreResult<MonthlyStat>;
}
