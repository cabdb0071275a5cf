// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session
//!
//! One [`Session`] per (app, chain, wallet account) on this device. The
//! session owns the login key and decides when it is persisted.
//!
//! ## States
//!
//! ```text
//!            login(remember_me)
//!   Open  ─────────────────────────▶  LoggedIn
//!         ◀─────────────────────────
//!                  logout()
//! ```
//!
//! A remembered key is restored on construction, so a restart resumes
//! `LoggedIn` without asking the wallet again. Unreadable local state always
//! falls back to `Open`.
//!
//! Once logged in, [`Session::initialise`] loads the member's own record and,
//! for accounts holding the member-admin role, opens the
//! [`AdminDirectorySync`] over every member record.
//!
//! Logging out stops the directory poller and removes the locally cached
//! member directory along with the login key.

pub mod state;

use std::sync::Arc;

use alloy::primitives::Address;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::admin::{AdminDirectorySync, CacheTarget, DirectoryPoller, LocalCacheStore};
use crate::blockchain::{Ledger, WalletOracle};
use crate::bubble::{account_string, Bubble, ContentConnector, Delegation, EncryptionPolicyEngine};
use crate::config::{CacheLocation, CommunityConfig};
use crate::crypto::{parse_public_key, LoginKey};
use crate::error::{CommunityError, CommunityResult};
use crate::events::{CommunityStats, EventBus, MembershipStatus, SessionState};
use crate::member::{registration_hashes, unban_hashes, validate_details, MemberRecord, MemberRecordStore};
use crate::storage::LocalStore;

pub use state::{session_id, PersistedState};

/// External collaborators a session talks to.
#[derive(Clone)]
pub struct SessionDeps {
    pub wallet: Arc<dyn WalletOracle>,
    pub ledger: Arc<dyn Ledger>,
    pub connector: Arc<dyn ContentConnector>,
    pub local: Arc<dyn LocalStore>,
    pub events: EventBus,
}

pub struct Session {
    id: String,
    account: Address,
    config: CommunityConfig,
    deps: SessionDeps,
    login_key: Option<LoginKey>,
    /// Whether the login key is persisted locally.
    remembered: bool,
    delegation: Option<Delegation>,
    member_data: Option<MemberRecord>,
    member_store: Option<MemberRecordStore>,
    admin: Option<Arc<Mutex<AdminDirectorySync>>>,
    /// Cancels the poller over `admin`, if one was spawned.
    poller_shutdown: Option<CancellationToken>,
    membership: MembershipStatus,
}

impl Session {
    /// Restore the session for `account` from local state.
    pub fn new(config: CommunityConfig, account: Address, deps: SessionDeps) -> Self {
        let id = session_id(&config.app_id, config.chain_id, &account);
        let persisted = PersistedState::load(deps.local.as_ref(), &id);
        let login_key = persisted.login_key();
        let remembered = login_key.is_some();

        let mut session = Self {
            id,
            account,
            config,
            deps,
            login_key,
            remembered,
            delegation: None,
            member_data: None,
            member_store: None,
            admin: None,
            poller_shutdown: None,
            membership: MembershipStatus::default(),
        };
        if remembered {
            session.delegation = persisted.delegation;
            session.member_data = persisted.member_data;
        }
        info!(session = %session.id, state = ?session.state(), "Session restored");
        session.publish_state();
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn state(&self) -> SessionState {
        if self.login_key.is_some() {
            SessionState::LoggedIn
        } else {
            SessionState::Open
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.login_key.is_some()
    }

    pub fn login_key(&self) -> Option<&LoginKey> {
        self.login_key.as_ref()
    }

    pub fn member_data(&self) -> Option<&MemberRecord> {
        self.member_data.as_ref()
    }

    pub fn membership(&self) -> MembershipStatus {
        self.membership
    }

    pub fn events(&self) -> &EventBus {
        &self.deps.events
    }

    /// The admin directory, once [`Session::initialise`] has opened it.
    pub fn admin_directory(&self) -> Option<Arc<Mutex<AdminDirectorySync>>> {
        self.admin.clone()
    }

    /// Ask the wallet to sign the login message and derive the login key.
    ///
    /// Does nothing when already logged in. Errors cover the login itself;
    /// once the key is set, a failed [`Session::initialise`] is logged and
    /// left on the error channel.
    pub async fn login(&mut self, remember_me: bool) -> CommunityResult<()> {
        if self.is_logged_in() {
            return Ok(());
        }

        let signature = self
            .deps
            .wallet
            .sign(self.config.login_message.as_bytes())
            .await?;
        let login_key = LoginKey::from_signature(&signature)?;
        info!(
            session = %self.id,
            login_address = %login_key.address(),
            remember_me,
            "Logged in"
        );

        self.login_key = Some(login_key);
        self.remembered = remember_me;
        self.persist()?;
        self.publish_state();

        if let Err(e) = self.initialise().await {
            warn!(session = %self.id, code = e.error_code(), error = %e, "Initialisation after login failed");
        }
        Ok(())
    }

    /// Forget the login key, member data and delegation, and drop the admin
    /// directory from memory and local storage.
    pub fn logout(&mut self) -> CommunityResult<()> {
        self.stop_poller();
        self.login_key = None;
        self.remembered = false;
        self.delegation = None;
        self.member_data = None;
        self.member_store = None;
        self.admin = None;

        PersistedState::default().save(self.deps.local.as_ref(), &self.id)?;
        LocalCacheStore::new(self.deps.local.clone(), &self.id).clear()?;
        info!(session = %self.id, "Logged out");

        self.deps.events.publish_member_data(None);
        self.deps.events.publish_members(Vec::new());
        self.publish_state();
        Ok(())
    }

    /// Query the ledger and bring the member and admin views up to date.
    ///
    /// Clears the last published error first. A running directory poller is
    /// stopped, and the admin directory is reopened only while the account
    /// holds the admin role.
    pub async fn initialise(&mut self) -> CommunityResult<()> {
        self.deps.events.clear_error();
        let result = self.initialise_inner().await;
        if let Err(e) = &result {
            self.deps.events.publish_error(e);
        }
        result
    }

    async fn initialise_inner(&mut self) -> CommunityResult<()> {
        self.refresh_membership().await?;
        if let Err(e) = self.refresh_member_count().await {
            warn!(error = %e, "Failed to fetch member count");
        }

        let Some(login_key) = self.login_key.clone() else {
            return Ok(());
        };

        let record = self.member_store(&login_key)?.load().await?;
        self.set_member_data(record)?;

        self.stop_poller();
        if !self.membership.is_admin {
            self.admin = None;
        } else {
            match self.open_admin_directory(&login_key).await {
                Ok(sync) => self.admin = Some(Arc::new(Mutex::new(sync))),
                Err(e @ CommunityError::MissingAdminUserFile { .. }) => {
                    warn!(account = %account_string(&self.account), "Admin keyring missing from bubble");
                    self.admin = None;
                    self.deps.events.publish_error(&e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Register the wallet account as a member with the given socials.
    pub async fn register(&mut self, details: MemberRecord) -> CommunityResult<()> {
        let login_key = self.require_login()?.clone();
        validate_details(&details)?;
        let hashes = registration_hashes(&self.config.social_salt, &details)?;

        info!(account = %account_string(&self.account), "Registering member");
        self.deps
            .ledger
            .register_as_member(&login_key.address(), hashes)
            .await?;

        self.member_store(&login_key)?.save(details.clone()).await?;
        self.set_member_data(Some(details))?;

        self.refresh_membership().await?;
        self.refresh_member_count().await
    }

    /// Leave the community and delete the member's own record.
    pub async fn deregister(&mut self) -> CommunityResult<()> {
        let login_key = self.require_login()?.clone();
        let wallet_account = self.deps.wallet.account();
        if wallet_account != self.account {
            return Err(CommunityError::NotAuthorized(format!(
                "wallet account {} does not match session account {}",
                account_string(&wallet_account),
                account_string(&self.account)
            )));
        }

        info!(account = %account_string(&self.account), "Deregistering member");
        self.deps.ledger.deregister_as_member().await?;

        self.member_store(&login_key)?.delete().await?;
        self.set_member_data(None)?;

        self.refresh_membership().await?;
        self.refresh_member_count().await
    }

    /// Overlay `details` onto the member's record and save it.
    pub async fn update_details(&mut self, details: MemberRecord) -> CommunityResult<()> {
        let login_key = self.require_login()?.clone();
        let mut record = self.member_data.clone().unwrap_or_default();
        record.merge(details);

        self.member_store(&login_key)?.save(record.clone()).await?;
        self.set_member_data(Some(record))
    }

    /// Admin: remove a member from the ledger and delete their record.
    pub async fn deregister_member(&mut self, account: &Address) -> CommunityResult<()> {
        let admin = self.require_admin()?;
        info!(member = %account_string(account), "Deregistering member as admin");
        self.deps.ledger.deregister_member(account).await?;
        admin.lock().await.delete_member_file(account).await?;
        self.refresh_member_count().await
    }

    /// Admin: ban a member and delete their record.
    pub async fn ban_member(&mut self, account: &Address) -> CommunityResult<()> {
        let admin = self.require_admin()?;
        info!(member = %account_string(account), "Banning member");
        self.deps.ledger.ban_member(account).await?;
        admin.lock().await.delete_member_file(account).await?;
        self.refresh_member_count().await
    }

    /// Admin: lift the ban on whichever socials are set in `details`.
    pub async fn unban_socials(&mut self, details: &MemberRecord) -> CommunityResult<()> {
        self.require_admin()?;
        let hashes = unban_hashes(&self.config.social_salt, details);
        if hashes.is_empty() {
            return Ok(());
        }
        info!(count = hashes.len(), "Unbanning socials");
        self.deps.ledger.unban_socials(hashes).await?;
        Ok(())
    }

    /// Admin: enrol another admin's login key.
    pub async fn add_admin_member(&self, account: &Address, public_key: &str) -> CommunityResult<()> {
        let admin = self.require_admin()?;
        admin.lock().await.add_admin_member(account, public_key).await?;
        info!(admin = %account_string(account), "Enrolled member admin");
        Ok(())
    }

    /// Fetch the member count and publish it.
    pub async fn refresh_member_count(&self) -> CommunityResult<()> {
        let member_count = self.deps.ledger.member_count().await?;
        self.deps.events.publish_stats(CommunityStats { member_count });
        Ok(())
    }

    /// Start background refreshes of the admin directory.
    ///
    /// The poller runs on a child of `shutdown` and also stops on logout or
    /// when the directory is reopened. Returns `None` when no admin directory
    /// is open.
    pub fn spawn_directory_poller(&mut self, shutdown: &CancellationToken) -> Option<JoinHandle<()>> {
        let sync = self.admin.clone()?;
        self.stop_poller();

        let token = shutdown.child_token();
        self.poller_shutdown = Some(token.clone());
        let poller = DirectoryPoller::new(sync, self.config.refresh_interval);
        Some(tokio::spawn(poller.run(token)))
    }

    fn stop_poller(&mut self) {
        if let Some(token) = self.poller_shutdown.take() {
            token.cancel();
            info!(session = %self.id, "Stopped member directory poller");
        }
    }

    async fn refresh_membership(&mut self) -> CommunityResult<()> {
        let ledger = &self.deps.ledger;
        let (is_member, is_banned, is_admin) = tokio::try_join!(
            ledger.is_member(&self.account),
            ledger.is_banned(&self.account),
            ledger.is_member_admin(&self.account),
        )?;
        self.membership = MembershipStatus {
            is_member,
            is_banned,
            is_admin,
        };
        self.deps.events.publish_membership(self.membership);
        Ok(())
    }

    fn member_store(&mut self, login_key: &LoginKey) -> CommunityResult<&mut MemberRecordStore> {
        if self.member_store.is_none() {
            let admin_public = parse_public_key(&self.config.admin_public_key)?;
            let store = self.deps.connector.connect(login_key, None)?;
            let policy = EncryptionPolicyEngine::for_member(login_key, &self.account, &admin_public);
            let member_store = MemberRecordStore::new(Bubble::new(store, policy), &self.account)
                .with_cached(self.member_data.clone());
            self.member_store = Some(member_store);
        }
        self.member_store.as_mut().ok_or(CommunityError::NotLoggedIn)
    }

    async fn open_admin_directory(&mut self, login_key: &LoginKey) -> CommunityResult<AdminDirectorySync> {
        let delegation = self.admin_delegation(login_key).await?;
        let store = self.deps.connector.connect(login_key, Some(&delegation))?;
        let cache = match self.config.cache_location {
            CacheLocation::Local => CacheTarget::Local {
                store: self.deps.local.clone(),
                session_id: self.id.clone(),
            },
            CacheLocation::Bubble => CacheTarget::Bubble,
        };

        let mut sync = AdminDirectorySync::open(
            store,
            &self.account,
            login_key,
            cache,
            self.deps.events.clone(),
        )
        .await?;
        sync.initialise().await?;
        Ok(sync)
    }

    /// Reuse the stored delegation while valid, otherwise ask the wallet.
    async fn admin_delegation(&mut self, login_key: &LoginKey) -> CommunityResult<Delegation> {
        let delegate = login_key.address();
        if let Some(delegation) = &self.delegation {
            if delegation.is_valid_for(&delegate, &self.config.bubble_contract, Utc::now()) {
                return Ok(delegation.clone());
            }
        }

        let delegation = Delegation::request(
            self.deps.wallet.as_ref(),
            &delegate,
            self.config.chain_id,
            &self.config.bubble_contract,
            self.config.delegation_lifetime,
        )
        .await?;
        self.delegation = Some(delegation.clone());
        self.persist()?;
        Ok(delegation)
    }

    fn set_member_data(&mut self, record: Option<MemberRecord>) -> CommunityResult<()> {
        self.member_data = record.clone();
        self.deps.events.publish_member_data(record);
        self.persist()
    }

    fn require_login(&self) -> CommunityResult<&LoginKey> {
        self.login_key.as_ref().ok_or(CommunityError::NotLoggedIn)
    }

    fn require_admin(&self) -> CommunityResult<Arc<Mutex<AdminDirectorySync>>> {
        self.require_login()?;
        if !self.membership.is_admin {
            return Err(CommunityError::NotAuthorized(
                "account does not hold the member admin role".to_string(),
            ));
        }
        self.admin.clone().ok_or_else(|| {
            CommunityError::NotAuthorized("member admin directory is not open".to_string())
        })
    }

    /// Write local state when the login is remembered.
    fn persist(&self) -> CommunityResult<()> {
        if !self.remembered {
            return Ok(());
        }
        let Some(login_key) = &self.login_key else {
            return Ok(());
        };
        let state = PersistedState {
            key: Some(login_key.to_pem()?),
            member_data: self.member_data.clone(),
            delegation: self.delegation.clone(),
        };
        state.save(self.deps.local.as_ref(), &self.id)
    }

    fn publish_state(&self) {
        self.deps.events.publish_session_state(self.state());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::community::mock::MockLedger;
    use crate::blockchain::LocalWallet;
    use crate::bubble::{AdminKeyring, ContentHandle, MemoryContentStore};
    use crate::crypto::public_key_to_hex;
    use crate::storage::MemoryLocalStore;
    use k256::SecretKey;

    struct Harness {
        config: CommunityConfig,
        account: Address,
        wallet: Arc<LocalWallet>,
        ledger: Arc<MockLedger>,
        content: MemoryContentStore,
        local: Arc<MemoryLocalStore>,
        admin_secret: SecretKey,
    }

    impl Harness {
        fn new() -> Self {
            let wallet = Arc::new(LocalWallet::random());
            let account = wallet.account();
            let admin_secret = LoginKey::generate().secret().clone();
            let config = CommunityConfig {
                admin_public_key: public_key_to_hex(&admin_secret.public_key()),
                social_salt: "salt".to_string(),
                ..CommunityConfig::default()
            };
            Self {
                config,
                account,
                wallet,
                ledger: Arc::new(MockLedger::new(account)),
                content: MemoryContentStore::new(),
                local: Arc::new(MemoryLocalStore::new()),
                admin_secret,
            }
        }

        fn session(&self) -> Session {
            let deps = SessionDeps {
                wallet: self.wallet.clone(),
                ledger: self.ledger.clone(),
                connector: Arc::new(self.content.clone()),
                local: self.local.clone(),
                events: EventBus::new(),
            };
            Session::new(self.config.clone(), self.account, deps)
        }
    }

    fn socials() -> MemberRecord {
        MemberRecord {
            twitter: Some("@alice".into()),
            discord: Some("alice#1".into()),
            telegram: Some("@alice_t".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn restart_without_remember_me_is_open() {
        let h = Harness::new();
        let mut session = h.session();
        assert_eq!(session.state(), SessionState::Open);

        session.login(false).await.unwrap();
        assert_eq!(session.state(), SessionState::LoggedIn);
        assert_eq!(session.events().session_state(), SessionState::LoggedIn);

        let restarted = h.session();
        assert_eq!(restarted.state(), SessionState::Open);
        assert_eq!(restarted.events().session_state(), SessionState::Open);
    }

    #[tokio::test]
    async fn remembered_login_resumes_with_same_key() {
        let h = Harness::new();
        let mut session = h.session();
        session.login(true).await.unwrap();
        let key = session.login_key().unwrap().public_key_hex();

        let restarted = h.session();
        assert_eq!(restarted.state(), SessionState::LoggedIn);
        assert_eq!(restarted.login_key().unwrap().public_key_hex(), key);
    }

    #[tokio::test]
    async fn login_key_is_deterministic_per_wallet() {
        let h = Harness::new();
        let mut first = h.session();
        first.login(false).await.unwrap();
        let mut second = h.session();
        second.login(false).await.unwrap();
        assert_eq!(
            first.login_key().unwrap().public_key_hex(),
            second.login_key().unwrap().public_key_hex()
        );
    }

    #[test]
    fn corrupt_state_restores_open() {
        let h = Harness::new();
        let id = session_id(&h.config.app_id, h.config.chain_id, &h.account);

        h.local.set(&id, b"\x00\x01 not json").unwrap();
        assert_eq!(h.session().state(), SessionState::Open);

        h.local.set(&id, br#"{"key":"not a pem"}"#).unwrap();
        assert_eq!(h.session().state(), SessionState::Open);
    }

    #[tokio::test]
    async fn logout_forgets_remembered_login() {
        let h = Harness::new();
        let mut session = h.session();
        session.login(true).await.unwrap();

        session.logout().unwrap();
        assert_eq!(session.state(), SessionState::Open);
        assert!(session.member_data().is_none());
        assert_eq!(h.session().state(), SessionState::Open);
    }

    async fn enrolled_admin(h: &Harness) -> Session {
        h.ledger.grant_admin(h.account);
        let mut session = h.session();
        session.login(true).await.unwrap();
        let login_public = session.login_key().unwrap().public_key();
        AdminKeyring::generate(h.admin_secret.clone())
            .unwrap()
            .store_for(&h.content, &h.account, &login_public)
            .await
            .unwrap();
        session.initialise().await.unwrap();
        session
    }

    fn write_member(h: &Harness, member: &Address, record: &MemberRecord, modified: u64) {
        let policy = EncryptionPolicyEngine::for_member(
            &LoginKey::generate(),
            member,
            &h.admin_secret.public_key(),
        );
        let handle = ContentHandle::for_account(member);
        let sealed = policy
            .encrypt(&handle, &serde_json::to_vec(record).unwrap())
            .unwrap();
        h.content.write_at(&handle, &sealed, modified);
    }

    #[tokio::test(start_paused = true)]
    async fn admin_logout_stops_poller_and_drops_cached_directory() {
        let h = Harness::new();
        write_member(&h, &Address::repeat_byte(0x06), &socials(), 10);
        let mut session = enrolled_admin(&h).await;
        assert_eq!(session.events().members().len(), 1);

        let cache_key = format!("{}-member-admin", session.id());
        assert!(h.local.get(&cache_key).unwrap().is_some());

        let shutdown = CancellationToken::new();
        let poller = session.spawn_directory_poller(&shutdown).unwrap();

        session.logout().unwrap();
        assert!(session.admin_directory().is_none());
        assert!(session.events().members().is_empty());
        assert!(h.local.get(&cache_key).unwrap().is_none());

        let secret = MemberRecord {
            twitter: Some("@secret".into()),
            ..Default::default()
        };
        write_member(&h, &Address::repeat_byte(0x07), &secret, 500);
        tokio::time::advance(h.config.refresh_interval + std::time::Duration::from_secs(1)).await;

        poller.await.unwrap();
        assert!(!shutdown.is_cancelled());
        assert_eq!(session.state(), SessionState::Open);
        assert!(session.events().members().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reinitialise_replaces_running_poller() {
        let h = Harness::new();
        let mut session = enrolled_admin(&h).await;

        let shutdown = CancellationToken::new();
        let first = session.spawn_directory_poller(&shutdown).unwrap();
        session.initialise().await.unwrap();
        first.await.unwrap();

        let second = session.spawn_directory_poller(&shutdown).unwrap();
        shutdown.cancel();
        second.await.unwrap();
    }

    #[tokio::test]
    async fn login_succeeds_when_initialise_fails() {
        let h = Harness::new();
        let mut session = h.session();
        session.config = CommunityConfig {
            admin_public_key: "0xnot-a-key".to_string(),
            ..h.config.clone()
        };

        session.login(false).await.unwrap();
        assert_eq!(session.state(), SessionState::LoggedIn);
        assert!(session.member_data().is_none());
        assert!(session.events().last_error().is_some());
    }

    #[tokio::test]
    async fn successful_initialise_clears_stale_error() {
        let h = Harness::new();
        h.ledger.grant_admin(h.account);
        let mut session = h.session();
        session.login(false).await.unwrap();
        assert!(session.events().last_error().is_some());

        let login_public = session.login_key().unwrap().public_key();
        AdminKeyring::generate(h.admin_secret.clone())
            .unwrap()
            .store_for(&h.content, &h.account, &login_public)
            .await
            .unwrap();
        session.initialise().await.unwrap();
        assert!(session.events().last_error().is_none());
        assert!(session.admin_directory().is_some());
    }

    #[tokio::test]
    async fn register_binds_login_address_and_saves_record() {
        let h = Harness::new();
        let mut session = h.session();
        session.login(false).await.unwrap();
        assert!(!session.membership().is_member);

        session.register(socials()).await.unwrap();

        let login_address = session.login_key().unwrap().address();
        let (registered, hashes) = h.ledger.registration(&h.account).unwrap();
        assert_eq!(registered, login_address);
        assert_eq!(hashes, registration_hashes("salt", &socials()).unwrap());

        assert!(session.membership().is_member);
        assert_eq!(session.events().stats().member_count, 1);
        assert_eq!(session.events().member_data(), Some(socials()));

        // The admin can read what the member wrote.
        let handle = ContentHandle::for_account(&h.account);
        let sealed = h.content.raw(&handle).unwrap();
        let admin = EncryptionPolicyEngine::for_admin(
            h.admin_secret.clone(),
            crate::crypto::SymmetricKey::generate().unwrap(),
        );
        let plaintext = admin.decrypt_strict(&handle, &sealed).unwrap();
        let record: MemberRecord = serde_json::from_slice(&plaintext).unwrap();
        assert_eq!(record, socials());
    }

    #[tokio::test]
    async fn register_rejects_missing_socials_before_ledger_call() {
        let h = Harness::new();
        let mut session = h.session();
        session.login(false).await.unwrap();

        let details = MemberRecord {
            twitter: Some("@alice".into()),
            ..Default::default()
        };
        let err = session.register(details).await.unwrap_err();
        assert_eq!(err.error_code(), "invalid-details");
        assert!(h.ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn operations_require_login() {
        let h = Harness::new();
        let mut session = h.session();
        let err = session.update_details(socials()).await.unwrap_err();
        assert!(matches!(err, CommunityError::NotLoggedIn));
    }

    #[tokio::test]
    async fn update_details_merges_and_reloads_after_restart() {
        let h = Harness::new();
        let mut session = h.session();
        session.login(true).await.unwrap();
        session.register(socials()).await.unwrap();

        session
            .update_details(MemberRecord {
                name: Some("Alice".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let record = session.member_data().unwrap().clone();
        assert_eq!(record.name.as_deref(), Some("Alice"));
        assert_eq!(record.twitter.as_deref(), Some("@alice"));

        let mut restarted = h.session();
        assert_eq!(restarted.member_data(), Some(&record));
        restarted.initialise().await.unwrap();
        assert_eq!(restarted.events().member_data(), Some(record));
    }

    #[tokio::test]
    async fn deregister_removes_record() {
        let h = Harness::new();
        let mut session = h.session();
        session.login(false).await.unwrap();
        session.register(socials()).await.unwrap();

        session.deregister().await.unwrap();
        assert!(!session.membership().is_member);
        assert!(session.member_data().is_none());
        assert!(!h.content.contains(&ContentHandle::for_account(&h.account)));
    }

    #[tokio::test]
    async fn non_admin_cannot_ban() {
        let h = Harness::new();
        let mut session = h.session();
        session.login(false).await.unwrap();
        let err = session
            .ban_member(&Address::repeat_byte(0x01))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "not-authorized");
    }

    #[tokio::test]
    async fn admin_without_keyring_gets_missing_file_event() {
        let h = Harness::new();
        h.ledger.grant_admin(h.account);
        let mut session = h.session();
        session.login(false).await.unwrap();

        assert!(session.membership().is_admin);
        assert!(session.admin_directory().is_none());
        let event = session.events().last_error().unwrap();
        assert_eq!(event.code, "missing-admin-file");
        assert_eq!(
            event.public_key.as_deref(),
            Some(session.login_key().unwrap().public_key_hex().as_str())
        );
    }

    #[tokio::test]
    async fn enrolled_admin_sees_and_bans_members() {
        let h = Harness::new();
        h.ledger.grant_admin(h.account);

        // A member writes their record.
        let member = Address::repeat_byte(0x07);
        h.ledger.add_member(member);
        let member_policy = EncryptionPolicyEngine::for_member(
            &LoginKey::generate(),
            &member,
            &h.admin_secret.public_key(),
        );
        let member_handle = ContentHandle::for_account(&member);
        let sealed = member_policy
            .encrypt(&member_handle, &serde_json::to_vec(&socials()).unwrap())
            .unwrap();
        h.content.write_at(&member_handle, &sealed, 10);

        // The admin logs in once to learn their login key, then is enrolled.
        let mut session = h.session();
        session.login(true).await.unwrap();
        let login_public = session.login_key().unwrap().public_key();
        AdminKeyring::generate(h.admin_secret.clone())
            .unwrap()
            .store_for(&h.content, &h.account, &login_public)
            .await
            .unwrap();

        session.initialise().await.unwrap();
        let directory = session.admin_directory().unwrap();
        {
            let sync = directory.lock().await;
            assert_eq!(sync.members().len(), 1);
            assert_eq!(sync.members()[0].details.twitter.as_deref(), Some("@alice"));
        }

        session.ban_member(&member).await.unwrap();
        assert!(h.ledger.is_banned(&member).await.unwrap());
        assert!(!h.content.contains(&member_handle));
        assert!(session.events().members().is_empty());

        // The delegation requested for the admin is remembered.
        let restarted = h.session();
        let id = session_id(&h.config.app_id, h.config.chain_id, &h.account);
        let stored = PersistedState::load(h.local.as_ref(), &id);
        assert!(stored.delegation.is_some());
        assert_eq!(restarted.state(), SessionState::LoggedIn);
    }

    #[tokio::test]
    async fn unban_without_socials_skips_ledger() {
        let h = Harness::new();
        h.ledger.grant_admin(h.account);
        let mut session = h.session();
        session.login(false).await.unwrap();
        let login_public = session.login_key().unwrap().public_key();
        AdminKeyring::generate(h.admin_secret.clone())
            .unwrap()
            .store_for(&h.content, &h.account, &login_public)
            .await
            .unwrap();
        session.initialise().await.unwrap();

        session.unban_socials(&MemberRecord::default()).await.unwrap();
        assert!(!h.ledger.calls().contains(&"unbanSocials".to_string()));

        session.unban_socials(&socials()).await.unwrap();
        assert!(h.ledger.calls().contains(&"unbanSocials".to_string()));
    }
}
