// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Defaults describe the production community deployment. Every value can be
//! overridden from the environment via [`CommunityConfig::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_ID` | Application id, part of every session id | `bubble-community` |
//! | `CHAIN_ID` | EVM chain id of the community contract | `137` |
//! | `RPC_URL` | JSON-RPC endpoint for the chain | public RPC of a known `CHAIN_ID` |
//! | `COMMUNITY_CONTRACT` | Community membership contract address | production contract |
//! | `ADMIN_PUBLIC_KEY` | Compressed secp256k1 admin public key | production key |
//! | `BUBBLE_PROVIDER` | Bubble content store endpoint | Bubble vault (polygon) |
//! | `BUBBLE_CONTRACT` | Access-control contract of the bubble | community contract |
//! | `SOCIAL_ENCRYPTION_SALT` | Salt mixed into social username hashes | empty |
//! | `DIRECTORY_CACHE` | Where the admin directory cache lives (`local` or `bubble`) | `local` |
//! | `REFRESH_INTERVAL_SECS` | Admin directory background refresh interval | `60` |
//! | `DATA_DIR` | Directory holding the local session database | `./data` |
//! | `WALLET_PRIVATE_KEY` | Hex key for the CLI's local wallet | Required for the CLI |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::time::Duration;

use crate::blockchain::{NetworkConfig, POLYGON_MAINNET};

pub const APP_ID_ENV: &str = "APP_ID";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const COMMUNITY_CONTRACT_ENV: &str = "COMMUNITY_CONTRACT";
pub const ADMIN_PUBLIC_KEY_ENV: &str = "ADMIN_PUBLIC_KEY";
pub const BUBBLE_PROVIDER_ENV: &str = "BUBBLE_PROVIDER";
pub const BUBBLE_CONTRACT_ENV: &str = "BUBBLE_CONTRACT";
pub const SOCIAL_SALT_ENV: &str = "SOCIAL_ENCRYPTION_SALT";
pub const DIRECTORY_CACHE_ENV: &str = "DIRECTORY_CACHE";
pub const REFRESH_INTERVAL_ENV: &str = "REFRESH_INTERVAL_SECS";

/// Environment variable name for the local data directory.
///
/// The redb session database is created as `session.redb` inside it.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable holding the CLI wallet key (hex, no `0x` needed).
pub const WALLET_PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";

/// Logging format selector (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_APP_ID: &str = "bubble-community";
pub const DEFAULT_COMMUNITY_CONTRACT: &str = "0x3108E692053bEC9988B8d257B843eE658A810804";
pub const DEFAULT_ADMIN_PUBLIC_KEY: &str =
    "0x020ca76933ec34c4035aeb3a5d91538a2f0979baadcd796d23019e39308ba5e419";
pub const DEFAULT_BUBBLE_PROVIDER: &str = "https://vault.bubbleprotocol.com/v2/polygon";
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Message the wallet signs to derive the login key. Changing it changes
/// every member's login key.
pub const LOGIN_MESSAGE: &str = "Bubble Community: sign to log in. This does not cost gas.";

const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Validity period requested for admin delegations.
const DEFAULT_DELEGATION_LIFETIME_DAYS: i64 = 365;

/// Where the admin directory cache is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLocation {
    /// Local key-value store, keyed by session id.
    Local,
    /// Admin-only zone of the bubble, shared between admins.
    Bubble,
}

impl CacheLocation {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" => Some(CacheLocation::Local),
            "bubble" => Some(CacheLocation::Bubble),
            _ => None,
        }
    }
}

/// Community deployment configuration.
#[derive(Debug, Clone)]
pub struct CommunityConfig {
    pub app_id: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub community_contract: String,
    pub admin_public_key: String,
    pub bubble_provider: String,
    pub bubble_contract: String,
    pub login_message: String,
    pub social_salt: String,
    pub cache_location: CacheLocation,
    pub refresh_interval: Duration,
    pub delegation_lifetime: chrono::Duration,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            chain_id: POLYGON_MAINNET.chain_id,
            rpc_url: POLYGON_MAINNET.rpc_url.to_string(),
            community_contract: DEFAULT_COMMUNITY_CONTRACT.to_string(),
            admin_public_key: DEFAULT_ADMIN_PUBLIC_KEY.to_string(),
            bubble_provider: DEFAULT_BUBBLE_PROVIDER.to_string(),
            bubble_contract: DEFAULT_COMMUNITY_CONTRACT.to_string(),
            login_message: LOGIN_MESSAGE.to_string(),
            social_salt: String::new(),
            cache_location: CacheLocation::Local,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            delegation_lifetime: chrono::Duration::days(DEFAULT_DELEGATION_LIFETIME_DAYS),
        }
    }
}

impl CommunityConfig {
    /// Load configuration, applying environment overrides to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup(APP_ID_ENV) {
            config.app_id = v;
        }
        if let Some(v) = lookup(CHAIN_ID_ENV) {
            match v.trim().parse() {
                Ok(id) => {
                    config.chain_id = id;
                    if let Some(network) = NetworkConfig::for_chain(id) {
                        config.rpc_url = network.rpc_url.to_string();
                    }
                }
                Err(_) => tracing::warn!(value = %v, "Ignoring invalid {CHAIN_ID_ENV}"),
            }
        }
        if let Some(v) = lookup(RPC_URL_ENV) {
            config.rpc_url = v;
        }
        if let Some(v) = lookup(COMMUNITY_CONTRACT_ENV) {
            // The bubble is controlled by the community contract unless told otherwise.
            config.bubble_contract = v.clone();
            config.community_contract = v;
        }
        if let Some(v) = lookup(ADMIN_PUBLIC_KEY_ENV) {
            config.admin_public_key = v;
        }
        if let Some(v) = lookup(BUBBLE_PROVIDER_ENV) {
            config.bubble_provider = v;
        }
        if let Some(v) = lookup(BUBBLE_CONTRACT_ENV) {
            config.bubble_contract = v;
        }
        if let Some(v) = lookup(SOCIAL_SALT_ENV) {
            config.social_salt = v;
        }
        if let Some(v) = lookup(DIRECTORY_CACHE_ENV) {
            match CacheLocation::parse(&v) {
                Some(location) => config.cache_location = location,
                None => tracing::warn!(value = %v, "Ignoring invalid {DIRECTORY_CACHE_ENV}"),
            }
        }
        if let Some(v) = lookup(REFRESH_INTERVAL_ENV) {
            match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.refresh_interval = Duration::from_secs(secs),
                _ => tracing::warn!(value = %v, "Ignoring invalid {REFRESH_INTERVAL_ENV}"),
            }
        }

        config
    }
}
