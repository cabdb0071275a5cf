// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Directory Poller
//!
//! Background task that refreshes the admin member directory on an interval,
//! so new and updated member records appear without the admin asking.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`. Cancellation wins over a
//! pending tick, and a refresh still in flight is dropped before it can
//! publish.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::directory::AdminDirectorySync;

pub struct DirectoryPoller {
    sync: Arc<Mutex<AdminDirectorySync>>,
    poll_interval: Duration,
}

impl DirectoryPoller {
    pub fn new(sync: Arc<Mutex<AdminDirectorySync>>, poll_interval: Duration) -> Self {
        Self {
            sync,
            poll_interval,
        }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(poller.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Member directory poller starting"
        );

        loop {
            let step = async {
                tokio::time::sleep(self.poll_interval).await;
                self.poll_step().await;
            };
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Member directory poller shutting down");
                    return;
                }
                _ = step => {}
            }
        }
    }

    async fn poll_step(&self) {
        let mut sync = self.sync.lock().await;
        if let Err(e) = sync.refresh().await {
            warn!(error = %e, "Member directory poller: refresh failed");
        }
    }
}
