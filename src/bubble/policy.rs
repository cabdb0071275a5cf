// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Encryption Policy Engine
//!
//! Every handle in the bubble resolves to exactly one policy:
//!
//! | Zone | Policy |
//! |------|--------|
//! | `Public` | plaintext pass-through |
//! | `MembersOnly` | AES-256-GCM under the members directory key |
//! | `AdminOnly` | AES-256-GCM under the admin directory key |
//! | `PerAccount` (own handle) | envelope sealed with ECDH(own, admin public) |
//! | `PerAccount` (admin engine) | decrypt-only, ECDH(admin, envelope sender) |
//!
//! Directory-zone files are stored as `0x`-prefixed hex text of the sealed
//! bytes. Per-account files hold an [`EncryptedEnvelope`].

use alloy::primitives::Address;
use k256::{PublicKey, SecretKey};

use super::envelope::EncryptedEnvelope;
use super::handle::{ContentHandle, Zone};
use crate::crypto::{shared_key, LoginKey, SymmetricKey};
use crate::error::{CommunityError, CommunityResult};

/// What the engine will do with a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Plaintext,
    DirectoryAead(Zone),
    SelfRecord,
    AdminView,
    Denied,
}

enum AccountPolicy {
    /// Member side: only the member's own file, sealed for the admin.
    SelfRecord {
        own_handle: ContentHandle,
        public_key_hex: String,
        shared: SymmetricKey,
    },
    /// Admin side: any member file, read only.
    AdminView { admin_secret: SecretKey },
    None,
}

enum Policy<'a> {
    Plaintext,
    Directory(&'a SymmetricKey),
    SelfRecord {
        shared: &'a SymmetricKey,
        public_key_hex: &'a str,
    },
    AdminView(&'a SecretKey),
    Denied(String),
}

/// Chooses and applies the cipher for each handle.
pub struct EncryptionPolicyEngine {
    members_key: Option<SymmetricKey>,
    admin_key: Option<SymmetricKey>,
    accounts: AccountPolicy,
}

impl EncryptionPolicyEngine {
    /// Engine for a member writing their own record.
    ///
    /// The shared secret with the admin is derived once here.
    pub fn for_member(login_key: &LoginKey, account: &Address, admin_public: &PublicKey) -> Self {
        Self {
            members_key: None,
            admin_key: None,
            accounts: AccountPolicy::SelfRecord {
                own_handle: ContentHandle::for_account(account),
                public_key_hex: login_key.public_key_hex(),
                shared: shared_key(login_key.secret(), admin_public),
            },
        }
    }

    /// Engine for a member admin holding the unlocked keyring.
    pub fn for_admin(admin_secret: SecretKey, admin_directory_key: SymmetricKey) -> Self {
        Self {
            members_key: None,
            admin_key: Some(admin_directory_key),
            accounts: AccountPolicy::AdminView { admin_secret },
        }
    }

    /// Engine that can only touch the public zone.
    pub fn public_only() -> Self {
        Self {
            members_key: None,
            admin_key: None,
            accounts: AccountPolicy::None,
        }
    }

    /// Grant access to the members-only directory.
    pub fn with_members_key(mut self, key: SymmetricKey) -> Self {
        self.members_key = Some(key);
        self
    }

    pub fn route(&self, handle: &ContentHandle) -> Route {
        match self.policy(handle) {
            Policy::Plaintext => Route::Plaintext,
            Policy::Directory(_) => Route::DirectoryAead(handle.zone()),
            Policy::SelfRecord { .. } => Route::SelfRecord,
            Policy::AdminView(_) => Route::AdminView,
            Policy::Denied(_) => Route::Denied,
        }
    }

    fn policy(&self, handle: &ContentHandle) -> Policy<'_> {
        match handle.zone() {
            Zone::Public => Policy::Plaintext,
            Zone::MembersOnly => match &self.members_key {
                Some(key) => Policy::Directory(key),
                None => Policy::Denied("no members directory key".to_string()),
            },
            Zone::AdminOnly => match &self.admin_key {
                Some(key) => Policy::Directory(key),
                None => Policy::Denied("no admin directory key".to_string()),
            },
            Zone::PerAccount => match &self.accounts {
                AccountPolicy::SelfRecord {
                    own_handle,
                    public_key_hex,
                    shared,
                } if own_handle == handle => Policy::SelfRecord {
                    shared,
                    public_key_hex,
                },
                AccountPolicy::SelfRecord { .. } => {
                    Policy::Denied(format!("{handle} belongs to another account"))
                }
                AccountPolicy::AdminView { admin_secret } => Policy::AdminView(admin_secret),
                AccountPolicy::None => Policy::Denied("no account key".to_string()),
            },
        }
    }

    /// Encrypt `plaintext` for storage at `handle`.
    pub fn encrypt(&self, handle: &ContentHandle, plaintext: &[u8]) -> CommunityResult<Vec<u8>> {
        match self.policy(handle) {
            Policy::Plaintext => Ok(plaintext.to_vec()),
            Policy::Directory(key) => {
                let sealed = key
                    .seal(plaintext)
                    .map_err(|e| CommunityError::DecryptionFailure(format!("seal failed: {e}")))?;
                Ok(format!("0x{}", alloy::hex::encode(sealed)).into_bytes())
            }
            Policy::SelfRecord {
                shared,
                public_key_hex,
            } => EncryptedEnvelope::seal(shared, public_key_hex, plaintext)?.to_bytes(),
            Policy::AdminView(_) => Err(CommunityError::ReadOnlyRecord(handle.to_string())),
            Policy::Denied(reason) => Err(CommunityError::NotAuthorized(reason)),
        }
    }

    /// Decrypt, reporting malformed data as [`CommunityError::DecryptionFailure`].
    pub fn decrypt_strict(&self, handle: &ContentHandle, data: &[u8]) -> CommunityResult<Vec<u8>> {
        match self.policy(handle) {
            Policy::Denied(reason) => Err(CommunityError::NotAuthorized(reason)),
            _ if data.is_empty() => Ok(Vec::new()),
            Policy::Plaintext => Ok(data.to_vec()),
            Policy::Directory(key) => {
                let text = std::str::from_utf8(data)
                    .map_err(|_| CommunityError::DecryptionFailure("directory file is not text".to_string()))?;
                let sealed = alloy::hex::decode(text.trim().trim_start_matches("0x"))
                    .map_err(|e| CommunityError::DecryptionFailure(format!("directory file: {e}")))?;
                key.open(&sealed)
                    .map_err(|e| CommunityError::DecryptionFailure(e.to_string()))
            }
            Policy::SelfRecord { shared, .. } => EncryptedEnvelope::parse(data)?.open(shared),
            Policy::AdminView(admin_secret) => {
                let envelope = EncryptedEnvelope::parse(data)?;
                let sender = envelope.sender_public_key()?;
                envelope.open(&shared_key(admin_secret, &sender))
            }
        }
    }

    /// Decrypt, treating a malformed per-account envelope as an empty file.
    pub fn decrypt(&self, handle: &ContentHandle, data: &[u8]) -> CommunityResult<Vec<u8>> {
        match self.decrypt_strict(handle, data) {
            Err(CommunityError::DecryptionFailure(reason))
                if matches!(self.route(handle), Route::SelfRecord | Route::AdminView) =>
            {
                tracing::warn!(handle = %handle, reason = %reason, "Ignoring undecryptable member file");
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::handle::Directory;

    struct Pair {
        member_key: LoginKey,
        account: Address,
        admin_secret: SecretKey,
        member: EncryptionPolicyEngine,
        admin: EncryptionPolicyEngine,
    }

    fn pair() -> Pair {
        let member_key = LoginKey::generate();
        let account = Address::repeat_byte(0x5a);
        let admin_secret = LoginKey::generate().secret().clone();
        let member = EncryptionPolicyEngine::for_member(&member_key, &account, &admin_secret.public_key());
        let admin = EncryptionPolicyEngine::for_admin(admin_secret.clone(), SymmetricKey::generate().unwrap());
        Pair {
            member_key,
            account,
            admin_secret,
            member,
            admin,
        }
    }

    #[test]
    fn member_round_trips_own_record() {
        let p = pair();
        let handle = ContentHandle::for_account(&p.account);
        let sealed = p.member.encrypt(&handle, br#"{"name":"alice"}"#).unwrap();

        let envelope = EncryptedEnvelope::parse(&sealed).unwrap();
        assert_eq!(envelope.public_key, p.member_key.public_key_hex());
        assert_eq!(p.member.decrypt_strict(&handle, &sealed).unwrap(), br#"{"name":"alice"}"#);
    }

    #[test]
    fn admin_reads_record_from_previously_unseen_member() {
        let p = pair();
        let handle = ContentHandle::for_account(&p.account);
        let sealed = p.member.encrypt(&handle, b"socials").unwrap();

        assert_eq!(p.admin.route(&handle), Route::AdminView);
        assert_eq!(p.admin.decrypt_strict(&handle, &sealed).unwrap(), b"socials");

        // A second member the admin has never interacted with.
        let stranger = LoginKey::generate();
        let stranger_account = Address::repeat_byte(0x77);
        let engine =
            EncryptionPolicyEngine::for_member(&stranger, &stranger_account, &p.admin_secret.public_key());
        let stranger_handle = ContentHandle::for_account(&stranger_account);
        let sealed = engine.encrypt(&stranger_handle, b"hi").unwrap();
        assert_eq!(p.admin.decrypt_strict(&stranger_handle, &sealed).unwrap(), b"hi");
    }

    #[test]
    fn admin_cannot_write_member_records() {
        let p = pair();
        let handle = ContentHandle::for_account(&p.account);
        assert!(matches!(
            p.admin.encrypt(&handle, b"x"),
            Err(CommunityError::ReadOnlyRecord(_))
        ));
    }

    #[test]
    fn member_cannot_touch_other_accounts() {
        let p = pair();
        let other = ContentHandle::for_account(&Address::repeat_byte(0x01));
        assert_eq!(p.member.route(&other), Route::Denied);
        assert!(matches!(
            p.member.encrypt(&other, b"x"),
            Err(CommunityError::NotAuthorized(_))
        ));
        assert!(matches!(
            p.member.decrypt(&other, b"x"),
            Err(CommunityError::NotAuthorized(_))
        ));
    }

    #[test]
    fn public_zone_is_never_encrypted() {
        let p = pair();
        let handle = ContentHandle::file_in(Directory::Public, "logo.png").unwrap();
        let envelope_like = br#"{"publicKey":"0x02","data":"0xdeadbeef"}"#;

        for engine in [&p.member, &p.admin, &EncryptionPolicyEngine::public_only()] {
            assert_eq!(engine.route(&handle), Route::Plaintext);
            assert_eq!(engine.encrypt(&handle, envelope_like).unwrap(), envelope_like);
            assert_eq!(engine.decrypt(&handle, envelope_like).unwrap(), envelope_like);
        }
    }

    #[test]
    fn admin_directory_files_are_hex_text() {
        let p = pair();
        let handle = ContentHandle::file_in(Directory::MemberAdmin, "state").unwrap();
        let sealed = p.admin.encrypt(&handle, b"{}").unwrap();

        assert!(sealed.starts_with(b"0x"));
        assert_eq!(p.admin.decrypt(&handle, &sealed).unwrap(), b"{}");
        assert_eq!(p.admin.decrypt(&handle, b"").unwrap(), b"");
    }

    #[test]
    fn directory_without_key_is_not_authorized() {
        let p = pair();
        let members = ContentHandle::file_in(Directory::Members, "news").unwrap();
        let admin = ContentHandle::file_in(Directory::MemberAdmin, "state").unwrap();

        assert!(matches!(
            p.admin.encrypt(&members, b"x"),
            Err(CommunityError::NotAuthorized(_))
        ));
        assert!(matches!(
            p.member.decrypt(&admin, b""),
            Err(CommunityError::NotAuthorized(_))
        ));

        let granted = EncryptionPolicyEngine::public_only().with_members_key(SymmetricKey::generate().unwrap());
        let sealed = granted.encrypt(&members, b"news").unwrap();
        assert_eq!(granted.decrypt(&members, &sealed).unwrap(), b"news");
    }

    #[test]
    fn malformed_envelopes_decrypt_to_empty_on_both_sides() {
        let p = pair();
        let handle = ContentHandle::for_account(&p.account);

        let other_admin = LoginKey::generate();
        let foreign = EncryptionPolicyEngine::for_member(&p.member_key, &p.account, &other_admin.public_key())
            .encrypt(&handle, b"x")
            .unwrap();

        let garbage: [&[u8]; 4] = [
            b"not json",
            br#"{"publicKey":"0x02"}"#,
            br#"{"publicKey":"zz","data":"0x00"}"#,
            &foreign,
        ];
        for raw in garbage {
            assert_eq!(p.admin.decrypt(&handle, raw).unwrap(), b"");
            assert!(matches!(
                p.admin.decrypt_strict(&handle, raw),
                Err(CommunityError::DecryptionFailure(_))
            ));
        }
        assert_eq!(p.member.decrypt(&handle, b"not json").unwrap(), b"");
        assert_eq!(p.member.decrypt(&handle, &foreign).unwrap(), b"");
    }

    #[test]
    fn missing_file_decrypts_to_empty() {
        let p = pair();
        let handle = ContentHandle::for_account(&p.account);
        assert_eq!(p.member.decrypt_strict(&handle, b"").unwrap(), b"");
        assert_eq!(p.admin.decrypt_strict(&handle, b"").unwrap(), b"");
    }
}
