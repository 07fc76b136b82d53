// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet Ledger - Top-up Ledger Service
//!
//! Tracks a per-user wallet balance in minor units, caps it with a limit
//! tied to the wallet type, and records every top-up in an append-only log.
//! The balance update and the log append of a deposit commit together.
//!
//! ## Modules
//!
//! - `ledger` - Deposit workflow and read-side queries
//! - `storage` - Store contracts and the redb-backed implementation
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - `X-UserId` caller identity and `X-Digest` body signatures
//! - `money` / `calendar` - Amount conversion and month ranges

pub mod api;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod money;
pub mod state;
pub mod storage;
