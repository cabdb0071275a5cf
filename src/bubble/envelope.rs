// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON envelope stored in per-account files.
//!
//! ```json
//! { "publicKey": "0x02…", "data": "0x<nonce || ciphertext || tag>" }
//! ```
//!
//! `publicKey` is the sender's compressed key, letting a reader holding the
//! counterparty private key rebuild the shared secret without a lookup.

use k256::PublicKey;
use serde::{Deserialize, Serialize};

use crate::crypto::{parse_public_key, SymmetricKey};
use crate::error::{CommunityError, CommunityResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    pub public_key: String,
    pub data: String,
}

impl EncryptedEnvelope {
    /// Seal `plaintext` under `key` and tag it with the sender's public key.
    pub fn seal(key: &SymmetricKey, sender_public_key: &str, plaintext: &[u8]) -> CommunityResult<Self> {
        let sealed = key
            .seal(plaintext)
            .map_err(|e| CommunityError::DecryptionFailure(format!("seal failed: {e}")))?;
        Ok(Self {
            public_key: sender_public_key.to_string(),
            data: format!("0x{}", alloy::hex::encode(sealed)),
        })
    }

    /// Parse raw file bytes as an envelope.
    pub fn parse(raw: &[u8]) -> CommunityResult<Self> {
        let envelope: Self = serde_json::from_slice(raw)
            .map_err(|e| CommunityError::DecryptionFailure(format!("envelope is not valid JSON: {e}")))?;
        if envelope.data.is_empty() {
            return Err(CommunityError::DecryptionFailure(
                "envelope has no data".to_string(),
            ));
        }
        Ok(envelope)
    }

    pub fn to_bytes(&self) -> CommunityResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn sender_public_key(&self) -> CommunityResult<PublicKey> {
        parse_public_key(&self.public_key).map_err(|e| {
            CommunityError::DecryptionFailure(format!("envelope public key: {e}"))
        })
    }

    /// Sealed bytes carried in `data`.
    pub fn ciphertext(&self) -> CommunityResult<Vec<u8>> {
        alloy::hex::decode(self.data.trim_start_matches("0x"))
            .map_err(|e| CommunityError::DecryptionFailure(format!("envelope data: {e}")))
    }

    /// Open the envelope with an already derived key.
    pub fn open(&self, key: &SymmetricKey) -> CommunityResult<Vec<u8>> {
        key.open(&self.ciphertext()?)
            .map_err(|e| CommunityError::DecryptionFailure(e.to_string()))
    }
}
