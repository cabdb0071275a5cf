// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Load, save and delete the logged-in member's own record.

use alloy::primitives::Address;

use super::record::MemberRecord;
use crate::bubble::{Bubble, ContentHandle};
use crate::error::CommunityResult;

pub struct MemberRecordStore {
    bubble: Bubble,
    handle: ContentHandle,
    cached: Option<MemberRecord>,
}

impl MemberRecordStore {
    pub fn new(bubble: Bubble, account: &Address) -> Self {
        Self {
            bubble,
            handle: ContentHandle::for_account(account),
            cached: None,
        }
    }

    /// Seed the cache, e.g. from locally persisted session state.
    pub fn with_cached(mut self, record: Option<MemberRecord>) -> Self {
        self.cached = record;
        self
    }

    pub fn handle(&self) -> &ContentHandle {
        &self.handle
    }

    /// Fetch the record, reading the bubble only on the first call.
    ///
    /// A missing or empty file means the member has no record yet.
    pub async fn load(&mut self) -> CommunityResult<Option<MemberRecord>> {
        if let Some(record) = &self.cached {
            return Ok(Some(record.clone()));
        }

        let plaintext = self.bubble.read(&self.handle).await?;
        if plaintext.is_empty() {
            tracing::debug!(handle = %self.handle, "No member record in bubble");
            return Ok(None);
        }
        let record: MemberRecord = serde_json::from_slice(&plaintext)?;
        self.cached = Some(record.clone());
        Ok(Some(record))
    }

    /// Replace the record. The cache changes only once the write succeeds.
    pub async fn save(&mut self, record: MemberRecord) -> CommunityResult<()> {
        let json = serde_json::to_vec(&record)?;
        self.bubble.write(&self.handle, &json).await?;
        tracing::info!(handle = %self.handle, "Saved member record");
        self.cached = Some(record);
        Ok(())
    }

    pub async fn delete(&mut self) -> CommunityResult<()> {
        self.bubble.delete(&self.handle).await?;
        tracing::info!(handle = %self.handle, "Deleted member record");
        self.cached = None;
        Ok(())
    }

    pub fn cached(&self) -> Option<&MemberRecord> {
        self.cached.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::{EncryptionPolicyEngine, MemoryContentStore};
    use crate::crypto::LoginKey;
    use crate::error::CommunityError;
    use std::sync::Arc;

    fn member_store(mem: &MemoryContentStore, key: &LoginKey, account: &Address) -> MemberRecordStore {
        let admin = LoginKey::generate();
        let policy = EncryptionPolicyEngine::for_member(key, account, &admin.public_key());
        MemberRecordStore::new(Bubble::new(Arc::new(mem.clone()), policy), account)
    }

    fn alice() -> MemberRecord {
        MemberRecord {
            twitter: Some("@alice".into()),
            name: Some("Alice".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_record_loads_as_none() {
        let mem = MemoryContentStore::new();
        let mut store = member_store(&mem, &LoginKey::generate(), &Address::repeat_byte(1));
        assert_eq!(store.load().await.unwrap(), None);
        assert!(store.cached().is_none());
    }

    #[tokio::test]
    async fn save_seals_record_and_serves_cache() {
        let mem = MemoryContentStore::new();
        let key = LoginKey::generate();
        let account = Address::repeat_byte(2);

        let mut store = member_store(&mem, &key, &account);
        store.save(alice()).await.unwrap();
        assert_eq!(store.cached(), Some(&alice()));

        // Stored bytes are an envelope, not the plaintext.
        let raw = mem.raw(store.handle()).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("alice"));

        let reads_before = mem.read_count();
        assert_eq!(store.load().await.unwrap(), Some(alice()));
        assert_eq!(mem.read_count(), reads_before);
    }

    #[tokio::test]
    async fn load_is_cached_after_first_read() {
        let mem = MemoryContentStore::new();
        let key = LoginKey::generate();
        let account = Address::repeat_byte(3);
        let admin = LoginKey::generate();
        let policy = || EncryptionPolicyEngine::for_member(&key, &account, &admin.public_key());

        let mut writer = MemberRecordStore::new(Bubble::new(Arc::new(mem.clone()), policy()), &account);
        writer.save(alice()).await.unwrap();

        let mut reader = MemberRecordStore::new(Bubble::new(Arc::new(mem.clone()), policy()), &account);
        assert_eq!(reader.load().await.unwrap(), Some(alice()));
        assert_eq!(reader.load().await.unwrap(), Some(alice()));
        assert_eq!(mem.read_count(), 1);
    }

    #[tokio::test]
    async fn delete_clears_cache_and_tolerates_missing_file() {
        let mem = MemoryContentStore::new();
        let mut store = member_store(&mem, &LoginKey::generate(), &Address::repeat_byte(4));
        store.save(alice()).await.unwrap();

        store.delete().await.unwrap();
        assert!(store.cached().is_none());
        assert!(!mem.contains(store.handle()));
        store.delete().await.unwrap();
    }

    #[tokio::test]
    async fn failed_write_leaves_cache_untouched() {
        let mem = MemoryContentStore::new();
        let account = Address::repeat_byte(5);
        // Public-only policy cannot encrypt into a per-account file.
        let mut store = MemberRecordStore::new(
            Bubble::new(Arc::new(mem), EncryptionPolicyEngine::public_only()),
            &account,
        )
        .with_cached(Some(alice()));

        let result = store.save(MemberRecord::default()).await;
        assert!(matches!(result, Err(CommunityError::NotAuthorized(_))));
        assert_eq!(store.cached(), Some(&alice()));
    }
}
