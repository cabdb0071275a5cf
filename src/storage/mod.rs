// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Local Storage Module
//!
//! Device-local key-value persistence for session state. Nothing stored here
//! is shared with other devices; shared state lives in the bubble.
//!
//! ## Keys
//!
//! ```text
//! {appId}-{chainId}-{account}                 # persisted session state (JSON)
//! {appId}-{chainId}-{account}-member-admin    # admin directory cache (JSON)
//! ```

pub mod session_db;

use std::collections::HashMap;
use std::sync::Mutex;

pub use session_db::{RedbLocalStore, SESSION_DB_FILE};

#[derive(Debug, thiserror::Error)]
pub enum LocalStoreError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("local store lock poisoned")]
    Poisoned,
}

pub type LocalStoreResult<T> = Result<T, LocalStoreError>;

/// Synchronous key-value persistence. Writes are last-write-wins.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> LocalStoreResult<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> LocalStoreResult<()>;

    fn remove(&self, key: &str) -> LocalStoreResult<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> LocalStoreResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().map_err(|_| LocalStoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> LocalStoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| LocalStoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> LocalStoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| LocalStoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
