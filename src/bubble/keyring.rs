// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Member admin keyrings.
//!
//! Each admin owns a file `0x80…03/<account>` holding the admin directory key
//! and the admin private key, sealed to the admin's login public key with an
//! ephemeral ECDH key. Any admin holding the keyring can enrol another admin
//! by sealing a copy to the newcomer's login public key.

use alloy::primitives::Address;
use k256::elliptic_curve::rand_core::OsRng;
use k256::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};

use super::envelope::EncryptedEnvelope;
use super::handle::{account_string, ContentHandle, Directory};
use super::store::ContentStore;
use crate::crypto::{public_key_to_hex, shared_key, LoginKey, SymmetricKey};
use crate::error::{CommunityError, CommunityResult};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyringFile {
    directory_key: String,
    admin_private_key: String,
}

/// Secrets shared by every member admin.
#[derive(Clone)]
pub struct AdminKeyring {
    directory_key: SymmetricKey,
    admin_key: SecretKey,
}

impl AdminKeyring {
    pub fn new(directory_key: SymmetricKey, admin_key: SecretKey) -> Self {
        Self {
            directory_key,
            admin_key,
        }
    }

    /// Fresh directory key paired with an existing admin private key.
    pub fn generate(admin_key: SecretKey) -> CommunityResult<Self> {
        let directory_key = SymmetricKey::generate()
            .map_err(|e| CommunityError::InvalidKey(format!("directory key: {e}")))?;
        Ok(Self::new(directory_key, admin_key))
    }

    pub fn directory_key(&self) -> &SymmetricKey {
        &self.directory_key
    }

    pub fn admin_key(&self) -> &SecretKey {
        &self.admin_key
    }

    /// Location of an admin's keyring file.
    pub fn handle_for(account: &Address) -> CommunityResult<ContentHandle> {
        ContentHandle::file_in(Directory::MemberAdmin, &account_string(account))
    }

    /// Seal the keyring so only the holder of `recipient`'s private key can open it.
    pub fn seal_for(&self, recipient: &PublicKey) -> CommunityResult<Vec<u8>> {
        let ephemeral = SecretKey::random(&mut OsRng);
        let file = KeyringFile {
            directory_key: self.directory_key.to_hex(),
            admin_private_key: alloy::hex::encode(self.admin_key.to_bytes()),
        };
        let plaintext = serde_json::to_vec(&file)?;
        EncryptedEnvelope::seal(
            &shared_key(&ephemeral, recipient),
            &public_key_to_hex(&ephemeral.public_key()),
            &plaintext,
        )?
        .to_bytes()
    }

    /// Open a keyring sealed to `login_key`.
    pub fn open(login_key: &LoginKey, sealed: &[u8]) -> CommunityResult<Self> {
        let envelope = EncryptedEnvelope::parse(sealed)?;
        let ephemeral = envelope.sender_public_key()?;
        let plaintext = envelope.open(&shared_key(login_key.secret(), &ephemeral))?;

        let file: KeyringFile = serde_json::from_slice(&plaintext)
            .map_err(|e| CommunityError::DecryptionFailure(format!("keyring contents: {e}")))?;
        let directory_key = SymmetricKey::from_hex(&file.directory_key)
            .map_err(|e| CommunityError::DecryptionFailure(format!("keyring directory key: {e}")))?;
        let admin_key = LoginKey::from_hex(&file.admin_private_key)
            .map_err(|e| CommunityError::DecryptionFailure(format!("keyring admin key: {e}")))?;

        Ok(Self::new(directory_key, admin_key.secret().clone()))
    }

    /// Read and open `account`'s keyring from the bubble.
    pub async fn load(
        store: &dyn ContentStore,
        account: &Address,
        login_key: &LoginKey,
    ) -> CommunityResult<Self> {
        let handle = Self::handle_for(account)?;
        match store.read(&handle).await? {
            Some(sealed) if !sealed.is_empty() => Self::open(login_key, &sealed),
            _ => Err(CommunityError::MissingAdminUserFile {
                public_key: login_key.public_key_hex(),
            }),
        }
    }

    /// Write a keyring copy for `account`, sealed to `public_key`.
    pub async fn store_for(
        &self,
        store: &dyn ContentStore,
        account: &Address,
        public_key: &PublicKey,
    ) -> CommunityResult<()> {
        let handle = Self::handle_for(account)?;
        store.write(&handle, &self.seal_for(public_key)?).await?;
        tracing::info!(account = %account_string(account), "Stored admin keyring");
        Ok(())
    }
}

impl std::fmt::Debug for AdminKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminKeyring")
            .field("admin_public_key", &public_key_to_hex(&self.admin_key.public_key()))
            .finish_non_exhaustive()
    }
}
