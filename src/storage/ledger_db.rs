// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded ledger database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `wallets`: wallet_id → serialized Wallet
//! - `wallet_owners`: user_id → wallet_id (one wallet per user)
//! - `balances`: wallet_id → balance in minor units
//! - `limits`: wallet_type → serialized Limit
//! - `transactions`: tx_id → serialized Transaction
//! - `wallet_tx_index`: composite key (wallet_id|created_at|tx_id) → amount
//!
//! redb allows a single write transaction at a time, so every [`LedgerUnit`]
//! is serializable with respect to all other writers.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

use super::{
    OpContext, StoreError, StoreErrorKind, StoreResult, TransactionLog, Transactional,
    UnitOfWork, WalletLedger,
};
use crate::models::{
    Limit, MonthlyStat, StatsRange, Transaction, TransactionId, Wallet, WalletId, WalletSnapshot,
    WalletType,
};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary wallet table: wallet_id → serialized Wallet (JSON bytes).
const WALLETS: TableDefinition<u64, &[u8]> = TableDefinition::new("wallets");

/// Unique owner index: user_id → wallet_id.
const WALLET_OWNERS: TableDefinition<&str, u64> = TableDefinition::new("wallet_owners");

/// Balances: wallet_id → minor units.
const BALANCES: TableDefinition<u64, u64> = TableDefinition::new("balances");

/// Limits: wallet_type → serialized Limit (JSON bytes).
const LIMITS: TableDefinition<u32, &[u8]> = TableDefinition::new("limits");

/// Append-only log: tx_id → serialized Transaction (JSON bytes).
const TRANSACTIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("transactions");

/// Index: composite key → amount in minor units.
/// Key format: `wallet_id_be|created_at_be|tx_id_be` for time range scans.
const WALLET_TX_INDEX: TableDefinition<&[u8], u64> = TableDefinition::new("wallet_tx_index");

// =============================================================================
// Index Key Helpers
// =============================================================================

const INDEX_KEY_LEN: usize = 24;

/// Map a signed timestamp onto unsigned bytes that sort in time order.
fn sortable_timestamp(micros: i64) -> [u8; 8] {
    ((micros as u64) ^ (1 << 63)).to_be_bytes()
}

/// Build a composite key for the wallet_tx_index table.
///
/// Format: `wallet_id | created_at (µs, order-preserving) | tx_id`, each
/// eight bytes big-endian. Keys of one wallet are contiguous and
/// oldest-first.
fn make_index_key(wallet_id: WalletId, created_at_micros: i64, tx_id: u64) -> [u8; INDEX_KEY_LEN] {
    let mut key = [0u8; INDEX_KEY_LEN];
    key[..8].copy_from_slice(&wallet_id.0.to_be_bytes());
    key[8..16].copy_from_slice(&sortable_timestamp(created_at_micros));
    key[16..].copy_from_slice(&tx_id.to_be_bytes());
    key
}

fn micros(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

// =============================================================================
// Unit of Work
// =============================================================================

/// A redb write transaction used as the ledger's unit of work.
///
/// redb aborts a write transaction that is dropped uncommitted.
pub struct LedgerUnit {
    txn: WriteTransaction,
}

impl UnitOfWork for LedgerUnit {
    fn balance(&mut self, wallet_id: WalletId) -> StoreResult<u64> {
        const OP: &str = "ledger_db.unit_balance";

        let table = self.txn.open_table(BALANCES).op(OP)?;
        let balance = table
            .get(wallet_id.0)
            .op(OP)?
            .ok_or_else(|| StoreError::new(OP, StoreErrorKind::WalletNotFound))?
            .value();
        Ok(balance)
    }

    fn commit(self) -> StoreResult<()> {
        self.txn.commit().op("ledger_db.commit")
    }

    fn rollback(self) -> StoreResult<()> {
        self.txn.abort().op("ledger_db.rollback")
    }
}

// =============================================================================
// LedgerDatabase
// =============================================================================

/// Embedded ACID ledger database.
pub struct LedgerDatabase {
    db: Database,
}

impl LedgerDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        const OP: &str = "ledger_db.open";

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).op(OP)?;
        }
        let db = Database::create(path).op(OP)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write().op(OP)?;
        {
            write_txn.open_table(WALLETS).op(OP)?;
            write_txn.open_table(WALLET_OWNERS).op(OP)?;
            write_txn.open_table(BALANCES).op(OP)?;
            write_txn.open_table(LIMITS).op(OP)?;
            write_txn.open_table(TRANSACTIONS).op(OP)?;
            write_txn.open_table(WALLET_TX_INDEX).op(OP)?;
        }
        write_txn.commit().op(OP)?;

        Ok(Self { db })
    }

    /// Open a read transaction on the limits table. Used by readiness probes.
    pub fn ping(&self) -> StoreResult<()> {
        const OP: &str = "ledger_db.ping";

        let read_txn = self.db.begin_read().op(OP)?;
        read_txn.open_table(LIMITS).op(OP)?;
        Ok(())
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Insert or replace the limit for a wallet type. The maximum must be
    /// positive.
    pub fn put_limit(&self, wallet_type: WalletType, limit: &Limit) -> StoreResult<()> {
        const OP: &str = "ledger_db.put_limit";

        if limit.max_amount == 0 {
            return Err(StoreError::new(OP, StoreErrorKind::InvalidLimit(wallet_type)));
        }

        let json = serde_json::to_vec(limit).op(OP)?;
        let write_txn = self.db.begin_write().op(OP)?;
        {
            let mut table = write_txn.open_table(LIMITS).op(OP)?;
            table.insert(wallet_type.0, json.as_slice()).op(OP)?;
        }
        write_txn.commit().op(OP)?;
        Ok(())
    }

    /// Create an empty wallet for `user_id`.
    ///
    /// Fails with `AlreadyExists` if the user already owns a wallet and with
    /// `LimitNotFound` if `wallet_type` has no limit.
    pub fn create_wallet(&self, user_id: &str, wallet_type: WalletType) -> StoreResult<Wallet> {
        const OP: &str = "ledger_db.create_wallet";

        let write_txn = self.db.begin_write().op(OP)?;
        let wallet = {
            let limits = write_txn.open_table(LIMITS).op(OP)?;
            if limits.get(wallet_type.0).op(OP)?.is_none() {
                return Err(StoreError::new(OP, StoreErrorKind::LimitNotFound(wallet_type)));
            }

            let mut owners = write_txn.open_table(WALLET_OWNERS).op(OP)?;
            if owners.get(user_id).op(OP)?.is_some() {
                return Err(StoreError::new(
                    OP,
                    StoreErrorKind::AlreadyExists(format!("wallet for user {user_id}")),
                ));
            }

            let mut wallets = write_txn.open_table(WALLETS).op(OP)?;
            let next_id = match wallets.last().op(OP)? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };

            let wallet = Wallet {
                id: WalletId(next_id),
                user_id: user_id.to_string(),
                wallet_type,
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&wallet).op(OP)?;
            wallets.insert(next_id, json.as_slice()).op(OP)?;
            owners.insert(user_id, next_id).op(OP)?;

            let mut balances = write_txn.open_table(BALANCES).op(OP)?;
            balances.insert(next_id, 0u64).op(OP)?;

            wallet
        };
        write_txn.commit().op(OP)?;

        Ok(wallet)
    }

    /// Look up a wallet record by ID.
    pub fn wallet(&self, wallet_id: WalletId) -> StoreResult<Wallet> {
        const OP: &str = "ledger_db.wallet";

        let read_txn = self.db.begin_read().op(OP)?;
        let table = read_txn.open_table(WALLETS).op(OP)?;
        match table.get(wallet_id.0).op(OP)? {
            Some(value) => serde_json::from_slice(value.value()).op(OP),
            None => Err(StoreError::new(OP, StoreErrorKind::WalletNotFound)),
        }
    }

    /// All transactions of a wallet, oldest first.
    pub fn transactions_for_wallet(&self, wallet_id: WalletId) -> StoreResult<Vec<Transaction>> {
        const OP: &str = "ledger_db.transactions_for_wallet";

        let read_txn = self.db.begin_read().op(OP)?;
        let idx_table = read_txn.open_table(WALLET_TX_INDEX).op(OP)?;
        let tx_table = read_txn.open_table(TRANSACTIONS).op(OP)?;

        let start = make_index_key(wallet_id, i64::MIN, 0);
        let end = make_index_key(wallet_id, i64::MAX, u64::MAX);

        let mut results = Vec::new();
        for entry in idx_table.range(start.as_slice()..=end.as_slice()).op(OP)? {
            let (key, _) = entry.op(OP)?;
            let key = key.value();
            let mut tx_id = [0u8; 8];
            tx_id.copy_from_slice(&key[16..INDEX_KEY_LEN]);
            if let Some(value) = tx_table.get(u64::from_be_bytes(tx_id)).op(OP)? {
                results.push(serde_json::from_slice(value.value()).op(OP)?);
            }
        }
        Ok(results)
    }

    /// Check that the stored balance equals the sum of the wallet's
    /// transactions.
    pub fn verify_wallet_invariant(&self, wallet_id: WalletId) -> StoreResult<bool> {
        const OP: &str = "ledger_db.verify_wallet_invariant";

        let total: u64 = self
            .transactions_for_wallet(wallet_id)?
            .iter()
            .map(|tx| tx.amount)
            .sum();

        let read_txn = self.db.begin_read().op(OP)?;
        let balances = read_txn.open_table(BALANCES).op(OP)?;
        let balance = balances
            .get(wallet_id.0)
            .op(OP)?
            .ok_or_else(|| StoreError::new(OP, StoreErrorKind::WalletNotFound))?
            .value();

        Ok(balance == total)
    }
}

impl Transactional for LedgerDatabase {
    type Unit = LedgerUnit;

    fn begin_unit_of_work(&self) -> StoreResult<LedgerUnit> {
        let txn = self.db.begin_write().op("ledger_db.begin_unit_of_work")?;
        Ok(LedgerUnit { txn })
    }
}

impl WalletLedger for LedgerDatabase {
    fn find_wallet_by_owner(&self, user_id: &str) -> StoreResult<WalletId> {
        const OP: &str = "ledger_db.find_wallet_by_owner";

        let read_txn = self.db.begin_read().op(OP)?;
        let owners = read_txn.open_table(WALLET_OWNERS).op(OP)?;
        match owners.get(user_id).op(OP)? {
            Some(id) => Ok(WalletId(id.value())),
            None => Err(StoreError::new(OP, StoreErrorKind::WalletNotFound)),
        }
    }

    fn wallet_snapshot(&self, user_id: &str) -> StoreResult<WalletSnapshot> {
        const OP: &str = "ledger_db.wallet_snapshot";

        // Owner, record and balance are read from one consistent snapshot.
        let read_txn = self.db.begin_read().op(OP)?;
        let owners = read_txn.open_table(WALLET_OWNERS).op(OP)?;
        let wallet_id = owners
            .get(user_id)
            .op(OP)?
            .ok_or_else(|| StoreError::new(OP, StoreErrorKind::WalletNotFound))?
            .value();

        let wallets = read_txn.open_table(WALLETS).op(OP)?;
        let wallet: Wallet = match wallets.get(wallet_id).op(OP)? {
            Some(value) => serde_json::from_slice(value.value()).op(OP)?,
            None => return Err(StoreError::new(OP, StoreErrorKind::WalletNotFound)),
        };

        let balances = read_txn.open_table(BALANCES).op(OP)?;
        let balance = balances
            .get(wallet_id)
            .op(OP)?
            .ok_or_else(|| StoreError::new(OP, StoreErrorKind::WalletNotFound))?
            .value();

        Ok(WalletSnapshot {
            id: wallet.id,
            balance,
            wallet_type: wallet.wallet_type,
        })
    }

    fn limit(&self, wallet_type: WalletType) -> StoreResult<Limit> {
        const OP: &str = "ledger_db.limit";

        let read_txn = self.db.begin_read().op(OP)?;
        let table = read_txn.open_table(LIMITS).op(OP)?;
        match table.get(wallet_type.0).op(OP)? {
            Some(value) => serde_json::from_slice(value.value()).op(OP),
            None => Err(StoreError::new(OP, StoreErrorKind::LimitNotFound(wallet_type))),
        }
    }

    fn increment_balance(
        &self,
        unit: &mut LedgerUnit,
        wallet_id: WalletId,
        delta: u64,
    ) -> StoreResult<()> {
        const OP: &str = "ledger_db.increment_balance";

        let txn = &unit.txn;
        let mut table = txn.open_table(BALANCES).op(OP)?;
        let current = table
            .get(wallet_id.0)
            .op(OP)?
            .ok_or_else(|| StoreError::new(OP, StoreErrorKind::WalletNotFound))?
            .value();
        let updated = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::new(OP, StoreErrorKind::BalanceOverflow(wallet_id)))?;
        table.insert(wallet_id.0, updated).op(OP)?;
        Ok(())
    }
}

impl TransactionLog for LedgerDatabase {
    fn append(
        &self,
        unit: &mut LedgerUnit,
        wallet_id: WalletId,
        amount: u64,
    ) -> StoreResult<TransactionId> {
        const OP: &str = "ledger_db.append";

        let txn = &unit.txn;
        let mut tx_table = txn.open_table(TRANSACTIONS).op(OP)?;
        let next_id = match tx_table.last().op(OP)? {
            Some((key, _)) => key.value() + 1,
            None => 1,
        };

        let tx = Transaction {
            id: TransactionId(next_id),
            wallet_id,
            amount,
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&tx).op(OP)?;
        tx_table.insert(next_id, json.as_slice()).op(OP)?;

        let mut idx_table = txn.open_table(WALLET_TX_INDEX).op(OP)?;
        let key = make_index_key(wallet_id, micros(&tx.created_at), next_id);
        idx_table.insert(key.as_slice(), amount).op(OP)?;

        Ok(tx.id)
    }

    fn monthly_aggregate(
        &self,
        wallet_id: WalletId,
        range: &StatsRange,
    ) -> StoreResult<MonthlyStat> {
        const OP: &str = "ledger_db.monthly_aggregate";

        let read_txn = self.db.begin_read().op(OP)?;
        let idx_table = read_txn.open_table(WALLET_TX_INDEX).op(OP)?;

        let start = make_index_key(wallet_id, micros(&range.begin), 0);
        let end = make_index_key(wallet_id, micros(&range.end), u64::MAX);
        if start > end {
            return Ok(MonthlyStat::default());
        }

        let mut stat = MonthlyStat::default();
        for entry in idx_table.range(start.as_slice()..=end.as_slice()).op(OP)? {
            let (_, amount) = entry.op(OP)?;
            stat.count += 1;
            stat.sum = stat.sum.saturating_add(amount.value());
        }
        Ok(stat)
    }
}

// =============================================================================
// Tests
// =============================================================================
