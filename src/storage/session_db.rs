// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded session database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `session_state`: key → JSON bytes (persisted session state, admin
//!   directory cache)

use std::path::Path;

use redb::{Database, ReadableDatabase, TableDefinition};

use super::{LocalStore, LocalStoreError, LocalStoreResult};

/// Session state: key → serialized value (JSON bytes).
const SESSION_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("session_state");

/// File name of the database inside the data directory.
pub const SESSION_DB_FILE: &str = "session.redb";

pub struct RedbLocalStore {
    db: Database,
}

impl RedbLocalStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> LocalStoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LocalStoreError::Io(format!("{}: {e}", parent.display())))?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SESSION_STATE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open `session.redb` inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> LocalStoreResult<Self> {
        Self::open(&data_dir.join(SESSION_DB_FILE))
    }
}

impl LocalStore for RedbLocalStore {
    fn get(&self, key: &str) -> LocalStoreResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSION_STATE)?;
        Ok(table.get(key)?.map(|value| value.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> LocalStoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSION_STATE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> LocalStoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSION_STATE)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
