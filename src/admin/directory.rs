// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Admin Directory Sync
//!
//! Keeps a decoded copy of every member record using only the content
//! store's list/read/write/delete primitives.
//!
//! ## Refresh
//!
//! 1. List the bubble root once.
//! 2. Drop reserved (directory) handles. Cached entries keep their decoded
//!    fields; new handles get their account from the trailing 20 bytes;
//!    entries whose handle is no longer listed are dropped.
//! 3. Select files modified after the high-water mark.
//! 4. Read and decrypt the selection concurrently. A failure clears that
//!    entry's fields and leaves the rest untouched.
//! 5. Raise the high-water mark to the newest selected modification time.
//! 6. Sort by account.
//! 7. Persist the cache if anything was selected.
//! 8. Publish the member list.
//!
//! The listing is ground truth on every refresh, so a deletion that never
//! reached the persisted cache is healed by the next refresh.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::Address;
use futures::future::join_all;
use k256::SecretKey;
use tracing::{info, warn};

use super::cache::{
    AdminDirectoryCache, BubbleCacheStore, CacheStore, LocalCacheStore, MemberEntry,
};
use crate::bubble::{
    account_string, AdminKeyring, Bubble, ContentHandle, ContentStore, EncryptionPolicyEngine,
};
use crate::crypto::{parse_public_key, LoginKey};
use crate::error::CommunityResult;
use crate::events::EventBus;
use crate::member::MemberRecord;
use crate::storage::LocalStore;

/// Where [`AdminDirectorySync`] persists its cache.
pub enum CacheTarget {
    /// Local key-value store under the session id.
    Local {
        store: Arc<dyn LocalStore>,
        session_id: String,
    },
    /// The admin-only `state` file in the bubble.
    Bubble,
}

/// Outcome of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshSummary {
    /// Member files in the listing.
    pub listed: usize,
    /// Files read because they changed after the previous high-water mark.
    pub updated: usize,
    /// Cached entries dropped because their file disappeared.
    pub removed: usize,
    pub high_water_mark: u64,
}

pub struct AdminDirectorySync {
    bubble: Arc<Bubble>,
    keyring: AdminKeyring,
    cache_store: Box<dyn CacheStore>,
    cache: AdminDirectoryCache,
    events: EventBus,
}

impl AdminDirectorySync {
    /// Build from an unlocked keyring.
    pub fn new(
        store: Arc<dyn ContentStore>,
        keyring: AdminKeyring,
        cache: CacheTarget,
        events: EventBus,
    ) -> Self {
        let policy = EncryptionPolicyEngine::for_admin(
            keyring.admin_key().clone(),
            keyring.directory_key().clone(),
        );
        let bubble = Arc::new(Bubble::new(store, policy));
        let cache_store: Box<dyn CacheStore> = match cache {
            CacheTarget::Local { store, session_id } => {
                Box::new(LocalCacheStore::new(store, &session_id))
            }
            CacheTarget::Bubble => Box::new(BubbleCacheStore::new(bubble.clone())),
        };
        Self {
            bubble,
            keyring,
            cache_store,
            cache: AdminDirectoryCache::default(),
            events,
        }
    }

    /// Unlock `account`'s keyring with the login key and build the sync.
    ///
    /// Fails with `MissingAdminUserFile` when the admin has not been enrolled.
    pub async fn open(
        store: Arc<dyn ContentStore>,
        account: &Address,
        login_key: &LoginKey,
        cache: CacheTarget,
        events: EventBus,
    ) -> CommunityResult<Self> {
        let keyring = AdminKeyring::load(store.as_ref(), account, login_key).await?;
        info!(account = %account_string(account), "Unlocked admin keyring");
        Ok(Self::new(store, keyring, cache, events))
    }

    /// Set up the admin zone for a new community: a fresh directory key and
    /// the creator's keyring.
    pub async fn create(
        store: Arc<dyn ContentStore>,
        account: &Address,
        login_key: &LoginKey,
        initial_admin_key: SecretKey,
        cache: CacheTarget,
        events: EventBus,
    ) -> CommunityResult<Self> {
        let keyring = AdminKeyring::generate(initial_admin_key)?;
        keyring
            .store_for(store.as_ref(), account, &login_key.public_key())
            .await?;
        info!(account = %account_string(account), "Created member admin zone");
        Ok(Self::new(store, keyring, cache, events))
    }

    /// Load the persisted cache, then refresh.
    pub async fn initialise(&mut self) -> CommunityResult<RefreshSummary> {
        self.cache = match self.cache_store.load().await {
            Ok(Some(cache)) => cache,
            Ok(None) => AdminDirectoryCache::default(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable admin directory cache");
                AdminDirectoryCache::default()
            }
        };
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> CommunityResult<RefreshSummary> {
        let listing = self.bubble.list(&ContentHandle::root()).await?;

        // The cache is only replaced once every read has finished, so a
        // refresh dropped mid-way leaves it untouched.
        let mut known: HashMap<String, MemberEntry> = self
            .cache
            .members
            .iter()
            .map(|entry| (entry.file.name.to_lowercase(), entry.clone()))
            .collect();

        let mut members = Vec::with_capacity(listing.len());
        let mut handles = Vec::with_capacity(listing.len());
        for file in listing {
            let handle = match ContentHandle::parse(&file.name) {
                Ok(handle) => handle,
                Err(e) => {
                    warn!(file = %file.name, error = %e, "Skipping unrecognised file in listing");
                    continue;
                }
            };
            let Some(account) = handle.account() else {
                continue;
            };
            let entry = match known.remove(&file.name.to_lowercase()) {
                Some(mut entry) => {
                    entry.file = file;
                    entry
                }
                None => MemberEntry {
                    file,
                    account: account_string(&account),
                    details: MemberRecord::default(),
                },
            };
            members.push(entry);
            handles.push(handle);
        }
        let removed = known.len();

        let mark = self.cache.mtime;
        let selected: Vec<usize> = (0..members.len())
            .filter(|&i| members[i].file.modified > mark)
            .collect();

        let bubble = &self.bubble;
        let reads = selected.iter().map(|&i| {
            let handle = &handles[i];
            async move { (i, bubble.read(handle).await) }
        });
        for (i, result) in join_all(reads).await {
            let entry = &mut members[i];
            entry.details = match result {
                Ok(plaintext) if plaintext.is_empty() => MemberRecord::default(),
                Ok(plaintext) => match serde_json::from_slice::<MemberRecord>(&plaintext) {
                    Ok(mut record) => {
                        record.extra.remove("file");
                        record.extra.remove("account");
                        record
                    }
                    Err(e) => {
                        warn!(account = %entry.account, error = %e, "Member record is not valid JSON");
                        MemberRecord::default()
                    }
                },
                Err(e) => {
                    warn!(account = %entry.account, error = %e, "Failed to read member record");
                    MemberRecord::default()
                }
            };
        }

        self.cache.mtime = selected
            .iter()
            .map(|&i| members[i].file.modified)
            .fold(mark, u64::max);

        members.sort_by_key(|entry| entry.account.to_lowercase());
        self.cache.members = members;

        if !selected.is_empty() {
            if let Err(e) = self.cache_store.save(&self.cache).await {
                warn!(error = %e, "Failed to persist admin directory cache");
            }
        }

        self.events.publish_members(self.cache.members.clone());

        let summary = RefreshSummary {
            listed: self.cache.members.len(),
            updated: selected.len(),
            removed,
            high_water_mark: self.cache.mtime,
        };
        info!(
            listed = summary.listed,
            updated = summary.updated,
            removed = summary.removed,
            high_water_mark = summary.high_water_mark,
            "Refreshed member directory"
        );
        Ok(summary)
    }

    /// Delete a member's record file and drop them from the list.
    pub async fn delete_member_file(&mut self, account: &Address) -> CommunityResult<()> {
        self.bubble
            .delete(&ContentHandle::for_account(account))
            .await?;

        let account = account_string(account);
        self.cache
            .members
            .retain(|entry| !entry.account.eq_ignore_ascii_case(&account));
        info!(account = %account, "Deleted member file");
        self.events.publish_members(self.cache.members.clone());
        Ok(())
    }

    /// Enrol another admin by sealing a keyring copy to their login key.
    pub async fn add_admin_member(
        &self,
        account: &Address,
        public_key: &str,
    ) -> CommunityResult<()> {
        let public_key = parse_public_key(public_key)?;
        self.keyring
            .store_for(self.bubble.store().as_ref(), account, &public_key)
            .await
    }

    pub fn members(&self) -> &[MemberEntry] {
        &self.cache.members
    }

    pub fn high_water_mark(&self) -> u64 {
        self.cache.mtime
    }

    pub fn cache(&self) -> &AdminDirectoryCache {
        &self.cache
    }
}
