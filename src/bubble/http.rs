// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC client for a remote bubble.
//!
//! Every request carries a packet `{method, timestamp, nonce, chainId,
//! contract, file, data?, options?}` plus a signature over the keccak256
//! hash of the packet's JSON, made with the session's login key. When a
//! delegation is present it is attached so the store checks access against
//! the delegating wallet instead of the login address.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::keccak256;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::delegation::Delegation;
use super::handle::ContentHandle;
use super::store::{ContentConnector, ContentStore, FileInfo};
use crate::crypto::LoginKey;
use crate::error::{CommunityError, CommunityResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error code the store returns when reading a file that does not exist.
const FILE_DOES_NOT_EXIST: i64 = -32004;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Packet<'a> {
    method: &'a str,
    timestamp: i64,
    nonce: String,
    chain_id: u64,
    contract: &'a str,
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Content store client for one login key.
pub struct HttpContentStore {
    http: Client,
    provider: String,
    chain_id: u64,
    contract: String,
    login_key: LoginKey,
    delegation: Option<Delegation>,
    next_id: AtomicU64,
}

impl HttpContentStore {
    pub fn new(
        http: Client,
        provider: &str,
        chain_id: u64,
        contract: &str,
        login_key: LoginKey,
        delegation: Option<Delegation>,
    ) -> Self {
        Self {
            http,
            provider: provider.trim_end_matches('/').to_string(),
            chain_id,
            contract: contract.to_string(),
            login_key,
            delegation,
            next_id: AtomicU64::new(1),
        }
    }

    /// Build signed params for one RPC call.
    fn signed_params(
        &self,
        method: &str,
        file: &ContentHandle,
        data: Option<&str>,
        options: Option<Value>,
    ) -> CommunityResult<Value> {
        let packet = Packet {
            method,
            timestamp: chrono::Utc::now().timestamp_millis(),
            nonce: uuid::Uuid::new_v4().to_string(),
            chain_id: self.chain_id,
            contract: &self.contract,
            file: file.to_string(),
            data,
            options,
        };
        let digest = keccak256(serde_json::to_vec(&packet)?);
        let signature = self.login_key.sign_digest(&digest.0)?;

        let mut params = serde_json::to_value(&packet)?;
        let signature = match &self.delegation {
            Some(delegation) => json!({
                "type": "delegated",
                "signature": format!("0x{}", alloy::hex::encode(signature)),
                "delegate": delegation,
            }),
            None => json!({
                "type": "plain",
                "signature": format!("0x{}", alloy::hex::encode(signature)),
            }),
        };
        if let Value::Object(map) = &mut params {
            map.insert("signature".to_string(), signature);
        }
        Ok(params)
    }

    async fn call(&self, method: &str, params: Value) -> CommunityResult<RpcResponse> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let response = self
            .http
            .post(&self.provider)
            .json(&body)
            .send()
            .await
            .map_err(|e| CommunityError::RemoteStoreFailure(format!("{method} request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CommunityError::RemoteStoreFailure(format!(
                "{method} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CommunityError::RemoteStoreFailure(format!("{method} invalid JSON: {e}")))
    }

    async fn call_ok(&self, method: &str, params: Value) -> CommunityResult<Option<Value>> {
        let response = self.call(method, params).await?;
        match response.error {
            Some(err) => Err(CommunityError::RemoteStoreFailure(format!(
                "{method} failed ({}): {}",
                err.code, err.message
            ))),
            None => Ok(response.result),
        }
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn list(&self, parent: &ContentHandle) -> CommunityResult<Vec<FileInfo>> {
        let params = self.signed_params("list", parent, None, Some(json!({ "modified": true })))?;
        match self.call_ok("list", params).await? {
            Some(result) => serde_json::from_value(result).map_err(|e| {
                CommunityError::RemoteStoreFailure(format!("invalid listing: {e}"))
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn read(&self, handle: &ContentHandle) -> CommunityResult<Option<Vec<u8>>> {
        let params = self.signed_params("read", handle, None, None)?;
        let response = self.call("read", params).await?;
        if let Some(err) = response.error {
            if err.code == FILE_DOES_NOT_EXIST {
                return Ok(None);
            }
            return Err(CommunityError::RemoteStoreFailure(format!(
                "read failed ({}): {}",
                err.code, err.message
            )));
        }
        match response.result {
            Some(Value::String(data)) => Ok(Some(data.into_bytes())),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(CommunityError::RemoteStoreFailure(format!(
                "unexpected read result: {other}"
            ))),
        }
    }

    async fn write(&self, handle: &ContentHandle, data: &[u8]) -> CommunityResult<()> {
        let text = std::str::from_utf8(data).map_err(|_| {
            CommunityError::RemoteStoreFailure("bubble content must be text".to_string())
        })?;
        let params = self.signed_params("write", handle, Some(text), None)?;
        self.call_ok("write", params).await?;
        Ok(())
    }

    async fn delete(&self, handle: &ContentHandle) -> CommunityResult<()> {
        let params = self.signed_params("delete", handle, None, Some(json!({ "silent": true })))?;
        let response = self.call("delete", params).await?;
        match response.error {
            Some(err) if err.code != FILE_DOES_NOT_EXIST => Err(CommunityError::RemoteStoreFailure(
                format!("delete failed ({}): {}", err.code, err.message),
            )),
            _ => Ok(()),
        }
    }
}

/// Builds [`HttpContentStore`] clients sharing one HTTP connection pool.
pub struct HttpConnector {
    http: Client,
    provider: String,
    chain_id: u64,
    contract: String,
}

impl HttpConnector {
    pub fn new(provider: &str, chain_id: u64, contract: &str) -> CommunityResult<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| CommunityError::RemoteStoreFailure(format!("failed to build HTTP client: {e}")))?;
        url::Url::parse(provider)
            .map_err(|e| CommunityError::RemoteStoreFailure(format!("invalid provider URL: {e}")))?;
        Ok(Self {
            http,
            provider: provider.to_string(),
            chain_id,
            contract: contract.to_string(),
        })
    }
}

impl ContentConnector for HttpConnector {
    fn connect(
        &self,
        login_key: &LoginKey,
        delegation: Option<&Delegation>,
    ) -> CommunityResult<Arc<dyn ContentStore>> {
        Ok(Arc::new(HttpContentStore::new(
            self.http.clone(),
            &self.provider,
            self.chain_id,
            &self.contract,
            login_key.clone(),
            delegation.cloned(),
        )))
    }
}
