// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for the community contract on Polygon.
//!
//! This module provides:
//! - The `Ledger` seam and its on-chain `CommunityContract` implementation
//! - The `WalletOracle` seam used for login signatures and transactions
//! - Network constants

pub mod community;
pub mod types;
pub mod wallet;

pub use community::{CommunityContract, Ledger, MEMBER_ADMIN_ROLE};
pub use types::*;
pub use wallet::{LocalWallet, WalletOracle};
