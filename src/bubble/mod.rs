// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bubble access: content store plus encryption policy.
//!
//! - `handle` - content handles and zone classification
//! - `store` - the list/read/write/delete seam and the in-memory store
//! - `http` - JSON-RPC content store client
//! - `policy` - per-zone encryption dispatch
//! - `envelope` - per-account envelope format
//! - `keyring` - sealed admin keyrings
//! - `delegation` - wallet delegations for login keys

pub mod delegation;
pub mod envelope;
pub mod handle;
pub mod http;
pub mod keyring;
pub mod policy;
pub mod store;

use std::sync::Arc;

pub use delegation::Delegation;
pub use envelope::EncryptedEnvelope;
pub use handle::{account_string, ContentHandle, Directory, Zone};
pub use http::{HttpConnector, HttpContentStore};
pub use keyring::AdminKeyring;
pub use policy::{EncryptionPolicyEngine, Route};
pub use store::{ContentConnector, ContentStore, FileInfo, MemoryContentStore};

use crate::error::CommunityResult;

/// A content store viewed through one encryption policy.
///
/// Callers never choose ciphers; every read and write goes through the
/// policy engine.
pub struct Bubble {
    store: Arc<dyn ContentStore>,
    policy: EncryptionPolicyEngine,
}

impl Bubble {
    pub fn new(store: Arc<dyn ContentStore>, policy: EncryptionPolicyEngine) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn policy(&self) -> &EncryptionPolicyEngine {
        &self.policy
    }

    pub async fn list(&self, parent: &ContentHandle) -> CommunityResult<Vec<FileInfo>> {
        self.store.list(parent).await
    }

    /// Read and decrypt. A missing file reads as empty plaintext.
    pub async fn read(&self, handle: &ContentHandle) -> CommunityResult<Vec<u8>> {
        let raw = self.store.read(handle).await?.unwrap_or_default();
        self.policy.decrypt(handle, &raw)
    }

    pub async fn write(&self, handle: &ContentHandle, plaintext: &[u8]) -> CommunityResult<()> {
        let data = self.policy.encrypt(handle, plaintext)?;
        self.store.write(handle, &data).await
    }

    pub async fn delete(&self, handle: &ContentHandle) -> CommunityResult<()> {
        self.store.delete(handle).await
    }
}
