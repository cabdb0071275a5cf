// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Locally persisted session state.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bubble::Delegation;
use crate::crypto::LoginKey;
use crate::error::CommunityResult;
use crate::member::MemberRecord;
use crate::storage::LocalStore;

/// One session per (app, chain, account) on a device.
pub fn session_id(app_id: &str, chain_id: u64, account: &Address) -> String {
    format!("{app_id}-{chain_id}-{}", alloy::hex::encode(account))
}

/// Stored as JSON under the session id. An absent entry is a fresh session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// PKCS#8 PEM of the login key, present only after "remember me".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_data: Option<MemberRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation: Option<Delegation>,
}

impl PersistedState {
    /// Read the state for `id`. Anything unreadable counts as no state.
    pub fn load(store: &dyn LocalStore, id: &str) -> Self {
        let bytes = match store.get(id) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Self::default(),
            Err(e) => {
                warn!(session = %id, error = %e, "Failed to read session state");
                return Self::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(e) => {
                warn!(session = %id, error = %e, "Discarding corrupt session state");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn LocalStore, id: &str) -> CommunityResult<()> {
        let bytes = serde_json::to_vec(self)?;
        store.set(id, &bytes)?;
        Ok(())
    }

    /// Decode the stored key; an undecodable key is treated as absent.
    pub fn login_key(&self) -> Option<LoginKey> {
        let pem = self.key.as_deref()?;
        match LoginKey::from_pem(pem) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "Ignoring undecodable stored login key");
                None
            }
        }
    }
}
