// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Deposit Workflow
//!
//! A top-up is one linear attempt that ends in exactly one of: committed,
//! rejected by the limit, wallet not found, or fatal error.
//!
//! ## Steps
//!
//! 1. Validate the decimal amount and convert it to minor units. No store is
//!    touched for invalid input.
//! 2. Read the wallet snapshot (balance, type) of the owner.
//! 3. Resolve the limit for the wallet type.
//! 4. Reject with [`DepositError::LimitExceeded`] if
//!    `balance + amount > limit.max_amount`.
//! 5. Open a unit of work, append the transaction, increment the balance,
//!    commit. Any failure after the unit is opened drops it, which rolls it
//!    back.
//!
//! ## Limit Check Race
//!
//! Step 4 reads the balance before the unit of work exists. Two concurrent
//! top-ups can both pass the check against the same balance and both
//! commit. Serialized writes keep `balance == sum(transactions)`, but the
//! limit is not re-validated. Setting [`DepositPolicy::revalidate_in_unit`]
//! repeats the check against the balance read inside the unit.

use std::fmt;

use crate::money::{self, MoneyError, CURRENCY};
use crate::models::{Limit, TransactionId, WalletId};
use crate::storage::{StoreError, TransactionLog, UnitOfWork, WalletLedger};

/// Smallest accepted top-up in currency units.
pub const DEFAULT_MIN_AMOUNT: f64 = 1.0;

/// Tunables of the deposit workflow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositPolicy {
    /// Amounts strictly below this (currency units) are rejected.
    pub min_amount: f64,
    /// Re-check the limit against the balance read inside the unit of work.
    pub revalidate_in_unit: bool,
}

impl Default for DepositPolicy {
    fn default() -> Self {
        Self {
            min_amount: DEFAULT_MIN_AMOUNT,
            revalidate_in_unit: false,
        }
    }
}

/// Why a deposit request was rejected before touching any store.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("user id is empty")]
    EmptyUserId,

    #[error("amount {amount} is below the minimum of {minimum}")]
    BelowMinimum { amount: f64, minimum: f64 },

    #[error("amount rounds down to zero")]
    ZeroAmount,

    #[error(transparent)]
    Amount(#[from] MoneyError),
}

/// Outcome of a failed deposit.
#[derive(Debug)]
pub enum DepositError {
    /// The user has no wallet.
    WalletNotFound { user_id: String },
    /// The top-up would push the balance above the wallet type's limit.
    LimitExceeded {
        wallet_type_name: String,
        /// Minor units
        max_amount: u64,
    },
    /// The request was malformed; no store was accessed.
    Invalid(InvalidInput),
    /// A store failed. Detail is for operators only.
    Fatal(StoreError),
}

impl DepositError {
    /// Classify a store failure at the workflow boundary.
    fn from_store(e: StoreError, user_id: &str) -> Self {
        if e.is_wallet_not_found() {
            DepositError::WalletNotFound {
                user_id: user_id.to_string(),
            }
        } else {
            DepositError::Fatal(e)
        }
    }

    fn limit_exceeded(limit: &Limit) -> Self {
        DepositError::LimitExceeded {
            wallet_type_name: limit.name.clone(),
            max_amount: limit.max_amount,
        }
    }
}

impl fmt::Display for DepositError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepositError::WalletNotFound { user_id } => {
                write!(f, "wallet not found for user {user_id}")
            }
            DepositError::LimitExceeded {
                wallet_type_name,
                max_amount,
            } => write!(
                f,
                "limit exceeded, for {wallet_type_name} is {} {CURRENCY}",
                money::whole_units(*max_amount)
            ),
            DepositError::Invalid(reason) => write!(f, "invalid deposit: {reason}"),
            DepositError::Fatal(e) => write!(f, "deposit failed: {e}"),
        }
    }
}

impl std::error::Error for DepositError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DepositError::Invalid(e) => Some(e),
            DepositError::Fatal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InvalidInput> for DepositError {
    fn from(e: InvalidInput) -> Self {
        DepositError::Invalid(e)
    }
}

/// A committed top-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositReceipt {
    pub transaction_id: TransactionId,
    pub wallet_id: WalletId,
    /// Minor units
    pub amount: u64,
}

/// Check the request and convert the amount to minor units.
pub fn validate(policy: &DepositPolicy, user_id: &str, amount: f64) -> Result<u64, InvalidInput> {
    if user_id.trim().is_empty() {
        return Err(InvalidInput::EmptyUserId);
    }
    if !amount.is_finite() {
        return Err(MoneyError::NotFinite.into());
    }
    if amount < policy.min_amount {
        return Err(InvalidInput::BelowMinimum {
            amount,
            minimum: policy.min_amount,
        });
    }

    let minor = money::to_minor_units(amount)?;
    if minor == 0 {
        return Err(InvalidInput::ZeroAmount);
    }
    Ok(minor)
}

fn check_limit(balance: u64, amount: u64, limit: &Limit) -> Result<(), DepositError> {
    match balance.checked_add(amount) {
        Some(projected) if projected <= limit.max_amount => Ok(()),
        _ => Err(DepositError::limit_exceeded(limit)),
    }
}

/// Run one top-up attempt for `user_id`.
pub fn deposit<S>(
    store: &S,
    policy: &DepositPolicy,
    user_id: &str,
    amount: f64,
) -> Result<DepositReceipt, DepositError>
where
    S: WalletLedger + TransactionLog,
{
    let minor = validate(policy, user_id, amount)?;

    let wallet = store
        .wallet_snapshot(user_id)
        .map_err(|e| DepositError::from_store(e, user_id))?;

    let limit = store.limit(wallet.wallet_type).map_err(DepositError::Fatal)?;

    check_limit(wallet.balance, minor, &limit)?;

    // Dropping `unit` on any early return below rolls it back.
    let mut unit = store.begin_unit_of_work().map_err(DepositError::Fatal)?;

    if policy.revalidate_in_unit {
        let current = unit.balance(wallet.id).map_err(DepositError::Fatal)?;
        if let Err(rejected) = check_limit(current, minor, &limit) {
            unit.rollback().map_err(DepositError::Fatal)?;
            return Err(rejected);
        }
    }

    let transaction_id = store
        .append(&mut unit, wallet.id, minor)
        .map_err(DepositError::Fatal)?;
    store
        .increment_balance(&mut unit, wallet.id, minor)
        .map_err(DepositError::Fatal)?;
    unit.commit().map_err(DepositError::Fatal)?;

    Ok(DepositReceipt {
        transaction_id,
        wallet_id: wallet.id,
        amount: minor,
    })
}
