// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Delegations allowing a login key to act for a wallet on a bubble.
//!
//! A member admin signs requests to the content store with their login key,
//! but the bubble's access control checks the wallet account. The wallet
//! therefore signs a delegation naming the login address, the bubble and an
//! expiry; the content store client attaches it to every request.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blockchain::WalletOracle;
use crate::error::CommunityResult;

/// Wallet-signed permission for `delegate` to access one bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegation {
    /// Login address permitted to act for the wallet.
    pub delegate: String,
    /// Chain hosting the bubble's access-control contract.
    pub chain_id: u64,
    /// Access-control contract of the bubble.
    pub bubble: String,
    /// Unix timestamp (seconds) after which the delegation is void.
    pub expires: i64,
    /// EIP-191 signature by the wallet over [`Delegation::message`].
    pub signature: String,
}

impl Delegation {
    /// Text the wallet signs.
    pub fn message(delegate: &str, chain_id: u64, bubble: &str, expires: i64) -> String {
        format!(
            "Bubble delegation\ndelegate: {}\nchain: {chain_id}\nbubble: {}\nexpires: {expires}",
            delegate.to_lowercase(),
            bubble.to_lowercase()
        )
    }

    /// Ask the wallet to sign a delegation for `delegate` valid for `lifetime`.
    pub async fn request(
        wallet: &dyn WalletOracle,
        delegate: &Address,
        chain_id: u64,
        bubble: &str,
        lifetime: chrono::Duration,
    ) -> CommunityResult<Self> {
        let delegate = format!("{delegate:?}");
        let expires = (Utc::now() + lifetime).timestamp();
        let message = Self::message(&delegate, chain_id, bubble, expires);

        let signature = wallet.sign(message.as_bytes()).await?;
        tracing::info!(delegate = %delegate, expires, "Wallet signed bubble delegation");

        Ok(Self {
            delegate,
            chain_id,
            bubble: bubble.to_string(),
            expires,
            signature: format!("0x{}", alloy::hex::encode(signature)),
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires
    }

    /// Whether this delegation covers `delegate` on `bubble` at `now`.
    pub fn is_valid_for(&self, delegate: &Address, bubble: &str, now: DateTime<Utc>) -> bool {
        !self.is_expired(now)
            && self.delegate.eq_ignore_ascii_case(&format!("{delegate:?}"))
            && self.bubble.eq_ignore_ascii_case(bubble)
    }
}
