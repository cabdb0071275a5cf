// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet seam.
//!
//! The session never touches the wallet's private key. It asks a
//! [`WalletOracle`] to sign the login message, sign delegations, and send
//! ledger transactions. [`LocalWallet`] is the in-process implementation
//! used by the CLI and tests.

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::{local::PrivateKeySigner, Signer},
};
use async_trait::async_trait;

use super::types::TxReceipt;
use crate::error::{CommunityError, CommunityResult};

#[async_trait]
pub trait WalletOracle: Send + Sync {
    /// Account the wallet is connected with.
    fn account(&self) -> Address;

    /// EIP-191 personal signature over `message` (65 bytes, `r || s || v`).
    async fn sign(&self, message: &[u8]) -> CommunityResult<Vec<u8>>;

    /// Sign, broadcast and await confirmation of a contract call.
    async fn send_transaction(&self, to: Address, calldata: Vec<u8>) -> CommunityResult<TxReceipt>;
}

/// Wallet backed by a local private key.
pub struct LocalWallet {
    signer: PrivateKeySigner,
    rpc_url: Option<url::Url>,
}

impl LocalWallet {
    /// Create a wallet from a hex private key (with or without `0x`).
    pub fn from_hex(private_key_hex: &str, rpc_url: &str) -> CommunityResult<Self> {
        let key_bytes = alloy::hex::decode(private_key_hex.trim().trim_start_matches("0x"))
            .map_err(|e| CommunityError::InvalidKey(e.to_string()))?;
        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| CommunityError::InvalidKey(e.to_string()))?;

        let rpc_url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| CommunityError::LedgerCallFailure(format!("invalid RPC URL: {e}")))?;

        Ok(Self {
            signer,
            rpc_url: Some(rpc_url),
        })
    }

    /// Throwaway wallet without an RPC endpoint. Signs, but cannot transact.
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
            rpc_url: None,
        }
    }
}

#[async_trait]
impl WalletOracle for LocalWallet {
    fn account(&self) -> Address {
        self.signer.address()
    }

    async fn sign(&self, message: &[u8]) -> CommunityResult<Vec<u8>> {
        let signature = self
            .signer
            .sign_message(message)
            .await
            .map_err(|e| CommunityError::InvalidSignature(e.to_string()))?;
        Ok(signature.as_bytes().to_vec())
    }

    async fn send_transaction(&self, to: Address, calldata: Vec<u8>) -> CommunityResult<TxReceipt> {
        let url = self.rpc_url.clone().ok_or_else(|| {
            CommunityError::LedgerCallFailure("wallet has no RPC endpoint".to_string())
        })?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .connect_http(url);

        let tx = TransactionRequest::default()
            .from(self.signer.address())
            .to(to)
            .input(calldata.into());

        let pending = provider.send_transaction(tx).await.map_err(|e| {
            CommunityError::LedgerCallFailure(format!("Failed to send transaction: {e}"))
        })?;
        let tx_hash = format!("{:?}", pending.tx_hash());
        tracing::info!(tx_hash = %tx_hash, to = %to, "Transaction broadcast");

        let receipt = pending.get_receipt().await.map_err(|e| {
            CommunityError::LedgerCallFailure(format!("Failed to get receipt: {e}"))
        })?;

        let receipt = TxReceipt {
            tx_hash,
            block_number: receipt.block_number.unwrap_or(0),
            gas_used: receipt.gas_used as u64,
            success: receipt.status(),
        };
        if !receipt.success {
            return Err(CommunityError::LedgerCallFailure(format!(
                "transaction {} reverted",
                receipt.tx_hash
            )));
        }
        Ok(receipt)
    }
}
