// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Data Models
//!
//! Domain records persisted by the ledger stores, plus the request and
//! response bodies of the REST API.
//!
//! ## Model Categories
//!
//! - **Identifiers**: [`WalletId`], [`WalletType`], [`TransactionId`]
//! - **Stored records**: [`Wallet`], [`Limit`], [`Transaction`]
//! - **Derived views**: [`WalletSnapshot`], [`MonthlyStat`], [`StatsRange`]
//! - **API bodies**: deposit request, balance and stats responses
//!
//! All amounts inside the domain are integer minor units. Decimal amounts
//! only appear in API bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Identifiers
// =============================================================================

/// Wallet identity, unique across the ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct WalletId(pub u64);

impl std::fmt::Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wallet type; selects the [`Limit`] that applies to a wallet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct WalletType(pub u32);

impl std::fmt::Display for WalletType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction identity. Assigned on append, strictly increasing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Stored Records
// =============================================================================

/// Wallet record. The balance lives in its own table so that increments
/// never rewrite this record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wallet {
    /// Unique wallet identifier
    pub id: WalletId,
    /// Owning user (one wallet per user)
    pub user_id: String,
    /// Wallet type, selects the limit
    pub wallet_type: WalletType,
    /// When the wallet was created
    pub created_at: DateTime<Utc>,
}

/// Balance ceiling for a wallet type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Limit {
    /// Display name, e.g. "identified"
    pub name: String,
    /// Maximum balance in minor units
    pub max_amount: u64,
}

/// One recorded top-up. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    /// Amount in minor units (always positive)
    pub amount: u64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Derived Views
// =============================================================================

/// Point-in-time view of a wallet used by the deposit workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub id: WalletId,
    /// Balance in minor units
    pub balance: u64,
    pub wallet_type: WalletType,
}

/// Inclusive time range for monthly statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsRange {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Count and sum of transactions within a [`StatsRange`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthlyStat {
    pub count: u64,
    /// Sum in minor units
    pub sum: u64,
}

// =============================================================================
// API Bodies
// =============================================================================

/// Request to top up the caller's wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DepositRequest {
    /// Amount in currency units, e.g. `4.00`.
    pub amount: f64,
}

/// Response after a successful top-up.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepositResponse {
    /// Always "ok".
    pub status: String,
}

/// Current wallet balance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    /// Balance in currency units.
    pub balance: f64,
}

/// Top-up statistics for the current calendar month.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    /// Number of top-ups this month.
    pub number: u64,
    /// Total topped up this month, in currency units.
    pub amount: f64,
}
