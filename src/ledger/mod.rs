// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Service
//!
//! Entry point used by the HTTP layer. Wraps the deposit workflow with
//! logging and exposes the read-side queries (existence, balance, monthly
//! statistics).
//!
//! The service holds no mutable state of its own; every call goes to the
//! backing stores.

pub mod deposit;

pub use deposit::{DepositError, DepositPolicy, DepositReceipt, InvalidInput};

use chrono::{DateTime, Local, TimeZone};
use tracing::{error, info, warn};

use crate::calendar::month_range;
use crate::models::{MonthlyStat, WalletId};
use crate::storage::{StoreError, TransactionLog, WalletLedger};

/// Failure of a read-side query.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("wallet not found for user {user_id}")]
    WalletNotFound { user_id: String },

    #[error(transparent)]
    Fatal(StoreError),
}

impl ServiceError {
    fn from_store(e: StoreError, user_id: &str) -> Self {
        if e.is_wallet_not_found() {
            ServiceError::WalletNotFound {
                user_id: user_id.to_string(),
            }
        } else {
            ServiceError::Fatal(e)
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Ledger operations over a store implementing both ledger contracts.
pub struct LedgerService<S> {
    store: S,
    policy: DepositPolicy,
}

impl<S> LedgerService<S>
where
    S: WalletLedger + TransactionLog,
{
    pub fn new(store: S, policy: DepositPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &DepositPolicy {
        &self.policy
    }

    /// Top up the wallet owned by `user_id` by a decimal `amount`.
    pub fn deposit(&self, user_id: &str, amount: f64) -> Result<DepositReceipt, DepositError> {
        let result = deposit::deposit(&self.store, &self.policy, user_id, amount);

        match &result {
            Ok(receipt) => info!(
                user_id = %user_id,
                wallet_id = %receipt.wallet_id,
                transaction_id = %receipt.transaction_id,
                amount = receipt.amount,
                "Deposit committed"
            ),
            Err(DepositError::Invalid(reason)) => {
                warn!(
                    user_id = %user_id,
                    amount,
                    reason = %reason,
                    "Deposit rejected: invalid input"
                )
            }
            Err(DepositError::WalletNotFound { .. }) => {
                warn!(user_id = %user_id, "Deposit rejected: wallet not found")
            }
            Err(e @ DepositError::LimitExceeded { .. }) => {
                warn!(user_id = %user_id, amount, error = %e, "Deposit rejected: limit exceeded")
            }
            Err(DepositError::Fatal(e)) => {
                error!(user_id = %user_id, amount, error = %e, "Deposit failed")
            }
        }

        result
    }

    /// Wallet owned by `user_id`, if any.
    pub fn wallet_exists(&self, user_id: &str) -> ServiceResult<WalletId> {
        self.store
            .find_wallet_by_owner(user_id)
            .map_err(|e| ServiceError::from_store(e, user_id))
    }

    /// Current balance in minor units.
    pub fn balance(&self, user_id: &str) -> ServiceResult<u64> {
        let snapshot = self
            .store
            .wallet_snapshot(user_id)
            .map_err(|e| ServiceError::from_store(e, user_id))?;
        Ok(snapshot.balance)
    }

    /// Top-up count and sum for the calendar month containing `now`.
    pub fn monthly_stats_at<Tz: TimeZone>(
        &self,
        user_id: &str,
        now: &DateTime<Tz>,
    ) -> ServiceResult<MonthlyStat> {
        let wallet_id = self.wallet_exists(user_id)?;
        let range = month_range(now);
        self.store
            .monthly_aggregate(wallet_id, &range)
            .map_err(|e| ServiceError::from_store(e, user_id))
    }

    /// Top-up count and sum for the current local calendar month.
    pub fn monthly_stats(&self, user_id: &str) -> ServiceResult<MonthlyStat> {
        self.monthly_stats_at(user_id, &Local::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Limit, WalletType};
    use crate::storage::LedgerDatabase;
    use chrono::{Duration, Utc};

    fn service() -> (LedgerService<LedgerDatabase>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDatabase::open(&dir.path().join("ledger.redb")).unwrap();
        db.put_limit(
            WalletType(2),
            &Limit {
                name: "identified".to_string(),
                max_amount: 10_000_000,
            },
        )
        .unwrap();
        db.create_wallet("alice", WalletType(2)).unwrap();
        (LedgerService::new(db, DepositPolicy::default()), dir)
    }

    #[test]
    fn balance_reflects_deposits() {
        let (svc, _dir) = service();
        assert_eq!(svc.balance("alice").unwrap(), 0);

        svc.deposit("alice", 12.34).unwrap();
        svc.deposit("alice", 1.00).unwrap();
        assert_eq!(svc.balance("alice").unwrap(), 1334);
    }

    #[test]
    fn read_side_reports_missing_wallet() {
        let (svc, _dir) = service();
        assert!(matches!(
            svc.wallet_exists("bob"),
            Err(ServiceError::WalletNotFound { .. })
        ));
        assert!(matches!(
            svc.balance("bob"),
            Err(ServiceError::WalletNotFound { .. })
        ));
        assert!(matches!(
            svc.monthly_stats("bob"),
            Err(ServiceError::WalletNotFound { .. })
        ));
    }

    #[test]
    fn monthly_stats_cover_current_month() {
        let (svc, _dir) = service();
        assert_eq!(svc.monthly_stats("alice").unwrap(), MonthlyStat::default());

        svc.deposit("alice", 4.00).unwrap();
        svc.deposit("alice", 2.50).unwrap();

        let stats = svc.monthly_stats_at("alice", &Utc::now()).unwrap();
        assert_eq!(stats, MonthlyStat { count: 2, sum: 650 });
    }

    #[test]
    fn monthly_stats_exclude_other_months() {
        let (svc, _dir) = service();
        svc.deposit("alice", 4.00).unwrap();

        let two_months_ago = Utc::now() - Duration::days(62);
        let stats = svc.monthly_stats_at("alice", &two_months_ago).unwrap();
        assert_eq!(stats, MonthlyStat { count: 0, sum: 0 });
    }
}
