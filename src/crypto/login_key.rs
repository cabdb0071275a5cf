// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login keys derived from wallet signatures.
//!
//! The wallet signs a fixed login message; the keccak256 hash of that
//! signature becomes the private scalar of a secp256k1 keypair. The same
//! wallet and message always yield the same login key, so no key has to be
//! distributed or backed up.

use alloy::primitives::{keccak256, Address};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::rand_core::OsRng;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use k256::{PublicKey, SecretKey};

use crate::error::{CommunityError, CommunityResult};

/// A secp256k1 keypair owned by a session.
#[derive(Clone)]
pub struct LoginKey {
    secret: SecretKey,
}

impl LoginKey {
    /// Derive the login key from a wallet signature.
    pub fn from_signature(signature: &[u8]) -> CommunityResult<Self> {
        if signature.is_empty() {
            return Err(CommunityError::InvalidSignature(
                "signature is empty".to_string(),
            ));
        }
        let digest = keccak256(signature);
        let secret = SecretKey::from_slice(digest.as_slice()).map_err(|_| {
            CommunityError::InvalidSignature(
                "signature hash is not a valid secp256k1 scalar".to_string(),
            )
        })?;
        Ok(Self { secret })
    }

    /// Wrap an existing secret key.
    pub fn from_secret(secret: SecretKey) -> Self {
        Self { secret }
    }

    /// Parse a 32-byte hex private key (with or without `0x`).
    pub fn from_hex(hex: &str) -> CommunityResult<Self> {
        let bytes = alloy::hex::decode(hex.trim().trim_start_matches("0x"))
            .map_err(|e| CommunityError::InvalidKey(format!("invalid hex: {e}")))?;
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|e| CommunityError::InvalidKey(format!("invalid secret key: {e}")))?;
        Ok(Self { secret })
    }

    /// Generate a random key.
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    /// Decode the PKCS#8 PEM form written by [`LoginKey::to_pem`].
    pub fn from_pem(pem: &str) -> CommunityResult<Self> {
        let secret = SecretKey::from_pkcs8_pem(pem)
            .map_err(|e| CommunityError::InvalidKey(format!("invalid PEM: {e}")))?;
        Ok(Self { secret })
    }

    /// Encode as PKCS#8 PEM for local persistence.
    pub fn to_pem(&self) -> CommunityResult<String> {
        let pem = self
            .secret
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CommunityError::InvalidKey(format!("failed to encode key: {e}")))?;
        Ok(pem.to_string())
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    /// Compressed SEC1 public key as `0x`-prefixed hex.
    pub fn public_key_hex(&self) -> String {
        public_key_to_hex(&self.public_key())
    }

    /// Private key as lower-case hex without prefix.
    pub fn to_hex(&self) -> String {
        alloy::hex::encode(self.secret.to_bytes())
    }

    /// EVM address of this key, registered on the ledger as the login address.
    pub fn address(&self) -> Address {
        let uncompressed = self.public_key().to_encoded_point(false);
        let hash = keccak256(&uncompressed.as_bytes()[1..]);
        Address::from_slice(&hash[12..])
    }

    /// Recoverable ECDSA signature over a 32-byte digest: `r || s || v`,
    /// with `v` in `{27, 28}`.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> CommunityResult<[u8; 65]> {
        let signing_key = SigningKey::from(&self.secret);
        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| CommunityError::InvalidKey(format!("signing failed: {e}")))?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(out)
    }
}

impl std::fmt::Debug for LoginKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginKey")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

/// Compressed SEC1 encoding as `0x`-prefixed hex.
pub fn public_key_to_hex(public_key: &PublicKey) -> String {
    format!(
        "0x{}",
        alloy::hex::encode(public_key.to_encoded_point(true).as_bytes())
    )
}

/// Parse a SEC1 public key (compressed or uncompressed) from hex.
pub fn parse_public_key(hex: &str) -> CommunityResult<PublicKey> {
    let bytes = alloy::hex::decode(hex.trim().trim_start_matches("0x"))
        .map_err(|e| CommunityError::InvalidKey(format!("invalid public key hex: {e}")))?;
    PublicKey::from_sec1_bytes(&bytes)
        .map_err(|_| CommunityError::InvalidKey("not a secp256k1 public key".to_string()))
}
