// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Community membership contract.
//!
//! Reads go straight to the RPC provider. Writes are ABI-encoded here and
//! handed to the [`WalletOracle`], which signs and broadcasts them from the
//! connected account.

use std::sync::Arc;

use alloy::{
    network::Ethereum,
    primitives::{b256, Address, B256, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, ProviderBuilder, RootProvider,
    },
    sol,
    sol_types::SolCall,
};
use async_trait::async_trait;

use super::types::TxReceipt;
use super::wallet::WalletOracle;
use crate::error::{CommunityError, CommunityResult};

/// Role granting access to every member record.
pub const MEMBER_ADMIN_ROLE: B256 =
    b256!("5160d718b3cafa04f8d51bbd7b6f2828ba2c83e2c57f3ca11850ce45d05be042");

/// Number of social hash slots taken by `registerAsMember`.
pub const SOCIAL_SLOTS: usize = 5;

sol! {
    #[sol(rpc)]
    interface ICommunity {
        function isMember(address account) external view returns (bool);
        function isBanned(address account) external view returns (bool);
        function hasRole(bytes32 role, address account) external view returns (bool);
        function getMemberCount() external view returns (uint256);
        function registerAsMember(address loginAddress, bytes32[5] socials) external;
        function deregisterAsMember() external;
        function deregisterMember(address member) external;
        function banMember(address member) external;
        function unbanSocials(bytes32[] socials) external;
    }
}

/// HTTP provider type (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Consumer-side view of the membership ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn is_member(&self, account: &Address) -> CommunityResult<bool>;

    async fn is_banned(&self, account: &Address) -> CommunityResult<bool>;

    async fn has_role(&self, role: B256, account: &Address) -> CommunityResult<bool>;

    async fn member_count(&self) -> CommunityResult<u64>;

    /// Register the wallet account, binding it to `login_address`.
    async fn register_as_member(
        &self,
        login_address: &Address,
        social_hashes: Vec<B256>,
    ) -> CommunityResult<TxReceipt>;

    async fn deregister_as_member(&self) -> CommunityResult<TxReceipt>;

    async fn deregister_member(&self, account: &Address) -> CommunityResult<TxReceipt>;

    async fn ban_member(&self, account: &Address) -> CommunityResult<TxReceipt>;

    async fn unban_socials(&self, social_hashes: Vec<B256>) -> CommunityResult<TxReceipt>;

    async fn is_member_admin(&self, account: &Address) -> CommunityResult<bool> {
        self.has_role(MEMBER_ADMIN_ROLE, account).await
    }
}

/// On-chain community contract.
pub struct CommunityContract {
    contract: ICommunity::ICommunityInstance<HttpProvider>,
    address: Address,
    wallet: Arc<dyn WalletOracle>,
}

impl CommunityContract {
    pub fn new(
        rpc_url: &str,
        contract_address: &str,
        wallet: Arc<dyn WalletOracle>,
    ) -> CommunityResult<Self> {
        let url: url::Url = rpc_url.parse().map_err(|e: url::ParseError| {
            CommunityError::LedgerCallFailure(format!("invalid RPC URL: {e}"))
        })?;
        let address = super::types::parse_address(contract_address)?;

        let provider = ProviderBuilder::new().connect_http(url);
        let contract = ICommunity::new(address, provider);

        Ok(Self {
            contract,
            address,
            wallet,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn send(&self, method: &'static str, calldata: Vec<u8>) -> CommunityResult<TxReceipt> {
        tracing::info!(method, contract = %self.address, from = %self.wallet.account(), "Sending ledger transaction");
        let receipt = self.wallet.send_transaction(self.address, calldata).await?;
        tracing::info!(method, tx_hash = %receipt.tx_hash, block = receipt.block_number, "Ledger transaction confirmed");
        Ok(receipt)
    }
}

fn call_failed(method: &str, e: impl std::fmt::Display) -> CommunityError {
    CommunityError::LedgerCallFailure(format!("{method}: {e}"))
}

#[async_trait]
impl Ledger for CommunityContract {
    async fn is_member(&self, account: &Address) -> CommunityResult<bool> {
        self.contract
            .isMember(*account)
            .call()
            .await
            .map_err(|e| call_failed("isMember", e))
    }

    async fn is_banned(&self, account: &Address) -> CommunityResult<bool> {
        self.contract
            .isBanned(*account)
            .call()
            .await
            .map_err(|e| call_failed("isBanned", e))
    }

    async fn has_role(&self, role: B256, account: &Address) -> CommunityResult<bool> {
        self.contract
            .hasRole(role, *account)
            .call()
            .await
            .map_err(|e| call_failed("hasRole", e))
    }

    async fn member_count(&self) -> CommunityResult<u64> {
        let count: U256 = self
            .contract
            .getMemberCount()
            .call()
            .await
            .map_err(|e| call_failed("getMemberCount", e))?;
        u64::try_from(count).map_err(|e| call_failed("getMemberCount", e))
    }

    async fn register_as_member(
        &self,
        login_address: &Address,
        social_hashes: Vec<B256>,
    ) -> CommunityResult<TxReceipt> {
        let socials: [B256; SOCIAL_SLOTS] = social_hashes.try_into().map_err(|v: Vec<B256>| {
            CommunityError::InvalidDetails(format!(
                "expected {SOCIAL_SLOTS} social hashes, got {}",
                v.len()
            ))
        })?;
        let call = ICommunity::registerAsMemberCall {
            loginAddress: *login_address,
            socials,
        };
        self.send("registerAsMember", call.abi_encode()).await
    }

    async fn deregister_as_member(&self) -> CommunityResult<TxReceipt> {
        let call = ICommunity::deregisterAsMemberCall {};
        self.send("deregisterAsMember", call.abi_encode()).await
    }

    async fn deregister_member(&self, account: &Address) -> CommunityResult<TxReceipt> {
        let call = ICommunity::deregisterMemberCall { member: *account };
        self.send("deregisterMember", call.abi_encode()).await
    }

    async fn ban_member(&self, account: &Address) -> CommunityResult<TxReceipt> {
        let call = ICommunity::banMemberCall { member: *account };
        self.send("banMember", call.abi_encode()).await
    }

    async fn unban_socials(&self, social_hashes: Vec<B256>) -> CommunityResult<TxReceipt> {
        let call = ICommunity::unbanSocialsCall {
            socials: social_hashes,
        };
        self.send("unbanSocials", call.abi_encode()).await
    }
}

/// In-memory ledger for tests.
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct LedgerState {
        members: HashMap<Address, (Address, Vec<B256>)>,
        banned: HashSet<Address>,
        banned_socials: HashSet<B256>,
        admins: HashSet<Address>,
        calls: Vec<String>,
    }

    /// Ledger whose write calls come from `caller`.
    pub struct MockLedger {
        caller: Address,
        state: Mutex<LedgerState>,
    }

    impl MockLedger {
        pub fn new(caller: Address) -> Self {
            Self {
                caller,
                state: Mutex::new(LedgerState::default()),
            }
        }

        pub fn grant_admin(&self, account: Address) {
            self.state.lock().unwrap().admins.insert(account);
        }

        pub fn add_member(&self, account: Address) {
            self.state
                .lock()
                .unwrap()
                .members
                .insert(account, (Address::ZERO, vec![]));
        }

        pub fn ban_social(&self, hash: B256) {
            self.state.lock().unwrap().banned_socials.insert(hash);
        }

        pub fn is_social_banned(&self, hash: &B256) -> bool {
            self.state.lock().unwrap().banned_socials.contains(hash)
        }

        pub fn registration(&self, account: &Address) -> Option<(Address, Vec<B256>)> {
            self.state.lock().unwrap().members.get(account).cloned()
        }

        pub fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }

        fn receipt(state: &mut LedgerState, method: &str) -> TxReceipt {
            state.calls.push(method.to_string());
            TxReceipt {
                tx_hash: format!("0x{:064x}", state.calls.len()),
                block_number: state.calls.len() as u64,
                gas_used: 21_000,
                success: true,
            }
        }
    }

    #[async_trait]
    impl Ledger for MockLedger {
        async fn is_member(&self, account: &Address) -> CommunityResult<bool> {
            Ok(self.state.lock().unwrap().members.contains_key(account))
        }

        async fn is_banned(&self, account: &Address) -> CommunityResult<bool> {
            Ok(self.state.lock().unwrap().banned.contains(account))
        }

        async fn has_role(&self, role: B256, account: &Address) -> CommunityResult<bool> {
            Ok(role == MEMBER_ADMIN_ROLE && self.state.lock().unwrap().admins.contains(account))
        }

        async fn member_count(&self) -> CommunityResult<u64> {
            Ok(self.state.lock().unwrap().members.len() as u64)
        }

        async fn register_as_member(
            &self,
            login_address: &Address,
            social_hashes: Vec<B256>,
        ) -> CommunityResult<TxReceipt> {
            let mut state = self.state.lock().unwrap();
            if state.banned.contains(&self.caller) {
                return Err(CommunityError::LedgerCallFailure("member is banned".into()));
            }
            if social_hashes
                .iter()
                .any(|h| *h != B256::ZERO && state.banned_socials.contains(h))
            {
                return Err(CommunityError::LedgerCallFailure("social is banned".into()));
            }
            state
                .members
                .insert(self.caller, (*login_address, social_hashes));
            Ok(Self::receipt(&mut state, "registerAsMember"))
        }

        async fn deregister_as_member(&self) -> CommunityResult<TxReceipt> {
            let mut state = self.state.lock().unwrap();
            state.members.remove(&self.caller);
            Ok(Self::receipt(&mut state, "deregisterAsMember"))
        }

        async fn deregister_member(&self, account: &Address) -> CommunityResult<TxReceipt> {
            let mut state = self.state.lock().unwrap();
            state.members.remove(account);
            Ok(Self::receipt(&mut state, "deregisterMember"))
        }

        async fn ban_member(&self, account: &Address) -> CommunityResult<TxReceipt> {
            let mut state = self.state.lock().unwrap();
            if let Some((_, socials)) = state.members.remove(account) {
                state
                    .banned_socials
                    .extend(socials.into_iter().filter(|h| *h != B256::ZERO));
            }
            state.banned.insert(*account);
            Ok(Self::receipt(&mut state, "banMember"))
        }

        async fn unban_socials(&self, social_hashes: Vec<B256>) -> CommunityResult<TxReceipt> {
            let mut state = self.state.lock().unwrap();
            for hash in &social_hashes {
                state.banned_socials.remove(hash);
            }
            Ok(Self::receipt(&mut state, "unbanSocials"))
        }
    }
}
