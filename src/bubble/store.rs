// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content store seam.
//!
//! The remote bubble is an opaque list/read/write/delete service. The core
//! only ever calls these four primitives; confidentiality is applied above
//! this layer by the encryption policy engine.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::delegation::Delegation;
use super::handle::ContentHandle;
use crate::crypto::LoginKey;
use crate::error::{CommunityError, CommunityResult};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Handle string as reported by the store.
    pub name: String,
    /// Last modification time (milliseconds).
    pub modified: u64,
    /// Creation time (milliseconds), when the store reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
}

/// Remote content store primitives.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// List the files directly under `parent`.
    async fn list(&self, parent: &ContentHandle) -> CommunityResult<Vec<FileInfo>>;

    /// Read a file. `None` when the file does not exist.
    async fn read(&self, handle: &ContentHandle) -> CommunityResult<Option<Vec<u8>>>;

    /// Create or fully replace a file.
    async fn write(&self, handle: &ContentHandle, data: &[u8]) -> CommunityResult<()>;

    /// Delete a file. Deleting a missing file succeeds.
    async fn delete(&self, handle: &ContentHandle) -> CommunityResult<()>;
}

/// Builds a content store client authenticated as a session's login key.
pub trait ContentConnector: Send + Sync {
    fn connect(
        &self,
        login_key: &LoginKey,
        delegation: Option<&Delegation>,
    ) -> CommunityResult<Arc<dyn ContentStore>>;
}

#[derive(Debug, Clone)]
struct StoredFile {
    data: Vec<u8>,
    created: u64,
    modified: u64,
}

#[derive(Default)]
struct MemoryInner {
    files: Mutex<BTreeMap<ContentHandle, StoredFile>>,
    clock: AtomicU64,
    reads: AtomicUsize,
}

/// In-process content store with a logical modification clock.
///
/// Listing the root returns every per-account file plus one entry per
/// non-empty shared directory, mirroring what the remote store reports.
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    inner: Arc<MemoryInner>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write with an explicit modification time. Advances the logical clock
    /// so later plain writes are newer.
    pub fn write_at(&self, handle: &ContentHandle, data: &[u8], modified: u64) {
        self.inner.clock.fetch_max(modified, Ordering::SeqCst);
        self.put(handle, data.to_vec(), modified);
    }

    /// Number of `read` calls served so far.
    pub fn read_count(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    pub fn contains(&self, handle: &ContentHandle) -> bool {
        self.lock().map(|files| files.contains_key(handle)).unwrap_or(false)
    }

    /// Raw stored bytes, bypassing any policy.
    pub fn raw(&self, handle: &ContentHandle) -> Option<Vec<u8>> {
        self.lock()
            .ok()
            .and_then(|files| files.get(handle).map(|f| f.data.clone()))
    }

    fn tick(&self) -> u64 {
        self.inner.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn lock(
        &self,
    ) -> CommunityResult<std::sync::MutexGuard<'_, BTreeMap<ContentHandle, StoredFile>>> {
        self.inner
            .files
            .lock()
            .map_err(|_| CommunityError::RemoteStoreFailure("memory store poisoned".to_string()))
    }

    fn put(&self, handle: &ContentHandle, data: Vec<u8>, modified: u64) {
        if let Ok(mut files) = self.lock() {
            let created = files.get(handle).map(|f| f.created).unwrap_or(modified);
            files.insert(
                handle.clone(),
                StoredFile {
                    data,
                    created,
                    modified,
                },
            );
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn list(&self, parent: &ContentHandle) -> CommunityResult<Vec<FileInfo>> {
        let files = self.lock()?;

        if parent.is_reserved() {
            return Ok(files
                .iter()
                .filter(|(handle, _)| {
                    handle.name().is_some()
                        && handle.parent_directory().as_ref() == Some(parent)
                })
                .map(|(handle, file)| FileInfo {
                    name: handle.to_string(),
                    modified: file.modified,
                    created: Some(file.created),
                })
                .collect());
        }

        if *parent != ContentHandle::root() {
            return Err(CommunityError::RemoteStoreFailure(format!(
                "{parent} is not a directory"
            )));
        }

        let mut listing: Vec<FileInfo> = Vec::new();
        let mut directories: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for (handle, file) in files.iter() {
            match handle.parent_directory() {
                Some(dir) => {
                    let entry = directories
                        .entry(dir.to_string())
                        .or_insert((file.created, file.modified));
                    entry.0 = entry.0.min(file.created);
                    entry.1 = entry.1.max(file.modified);
                }
                None => listing.push(FileInfo {
                    name: handle.to_string(),
                    modified: file.modified,
                    created: Some(file.created),
                }),
            }
        }
        listing.extend(
            directories
                .into_iter()
                .map(|(name, (created, modified))| FileInfo {
                    name,
                    modified,
                    created: Some(created),
                }),
        );
        Ok(listing)
    }

    async fn read(&self, handle: &ContentHandle) -> CommunityResult<Option<Vec<u8>>> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock()?.get(handle).map(|f| f.data.clone()))
    }

    async fn write(&self, handle: &ContentHandle, data: &[u8]) -> CommunityResult<()> {
        if handle.is_reserved() && handle.name().is_none() {
            return Err(CommunityError::RemoteStoreFailure(format!(
                "cannot write to directory {handle}"
            )));
        }
        let modified = self.tick();
        self.put(handle, data.to_vec(), modified);
        Ok(())
    }

    async fn delete(&self, handle: &ContentHandle) -> CommunityResult<()> {
        self.lock()?.remove(handle);
        Ok(())
    }
}

impl ContentConnector for MemoryContentStore {
    fn connect(
        &self,
        _login_key: &LoginKey,
        _delegation: Option<&Delegation>,
    ) -> CommunityResult<Arc<dyn ContentStore>> {
        Ok(Arc::new(self.clone()))
    }
}
