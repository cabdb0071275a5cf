// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted admin directory cache.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bubble::{Bubble, ContentHandle, Directory, FileInfo};
use crate::error::CommunityResult;
use crate::member::MemberRecord;
use crate::storage::LocalStore;

/// Name of the shared cache file inside the admin directory.
pub const STATE_FILE: &str = "state";

/// One member as seen by the admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEntry {
    pub file: FileInfo,
    /// Lower-case `0x` account recovered from the file handle.
    pub account: String,
    /// Decoded record fields; empty when the record could not be read.
    #[serde(flatten)]
    pub details: MemberRecord,
}

/// Snapshot of the decoded member directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminDirectoryCache {
    /// High-water mark: largest modification time already processed.
    #[serde(default)]
    pub mtime: u64,
    #[serde(default)]
    pub members: Vec<MemberEntry>,
}

/// Where the cache is persisted between runs.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn load(&self) -> CommunityResult<Option<AdminDirectoryCache>>;

    async fn save(&self, cache: &AdminDirectoryCache) -> CommunityResult<()>;
}

/// Cache kept in the local key-value store, private to this device.
pub struct LocalCacheStore {
    store: Arc<dyn LocalStore>,
    key: String,
}

impl LocalCacheStore {
    pub fn new(store: Arc<dyn LocalStore>, session_id: &str) -> Self {
        Self {
            store,
            key: format!("{session_id}-member-admin"),
        }
    }

    /// Drop the stored snapshot.
    pub fn clear(&self) -> CommunityResult<()> {
        self.store.remove(&self.key)?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for LocalCacheStore {
    async fn load(&self) -> CommunityResult<Option<AdminDirectoryCache>> {
        match self.store.get(&self.key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, cache: &AdminDirectoryCache) -> CommunityResult<()> {
        self.store.set(&self.key, &serde_json::to_vec(cache)?)?;
        Ok(())
    }
}

/// Cache kept in the admin-only zone of the bubble, shared by all admins.
pub struct BubbleCacheStore {
    bubble: Arc<Bubble>,
}

impl BubbleCacheStore {
    pub fn new(bubble: Arc<Bubble>) -> Self {
        Self { bubble }
    }

    fn handle() -> CommunityResult<ContentHandle> {
        ContentHandle::file_in(Directory::MemberAdmin, STATE_FILE)
    }
}

#[async_trait]
impl CacheStore for BubbleCacheStore {
    async fn load(&self) -> CommunityResult<Option<AdminDirectoryCache>> {
        let plaintext = self.bubble.read(&Self::handle()?).await?;
        if plaintext.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&plaintext)?))
    }

    async fn save(&self, cache: &AdminDirectoryCache) -> CommunityResult<()> {
        self.bubble
            .write(&Self::handle()?, &serde_json::to_vec(cache)?)
            .await
    }
}
