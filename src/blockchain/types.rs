// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{CommunityError, CommunityResult};

/// EVM network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Polygon PoS mainnet configuration.
pub const POLYGON_MAINNET: NetworkConfig = NetworkConfig {
    name: "Polygon",
    chain_id: 137,
    rpc_url: "https://polygon-rpc.com",
    explorer_url: "https://polygonscan.com",
};

/// Polygon Amoy testnet configuration.
pub const POLYGON_AMOY: NetworkConfig = NetworkConfig {
    name: "Polygon Amoy Testnet",
    chain_id: 80002,
    rpc_url: "https://rpc-amoy.polygon.technology",
    explorer_url: "https://amoy.polygonscan.com",
};

impl NetworkConfig {
    /// Known network for a chain id, if any.
    pub fn for_chain(chain_id: u64) -> Option<NetworkConfig> {
        [POLYGON_MAINNET, POLYGON_AMOY]
            .into_iter()
            .find(|n| n.chain_id == chain_id)
    }
}

/// Transaction receipt after confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: String,
    /// Block number where transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction was successful
    pub success: bool,
}

/// Parse a `0x` account address (checksum not enforced).
pub fn parse_address(raw: &str) -> CommunityResult<Address> {
    Address::from_str(raw.trim()).map_err(|e| CommunityError::InvalidAddress(format!("{raw}: {e}")))
}
