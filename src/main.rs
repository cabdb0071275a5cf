// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `bubble-community` CLI.
//!
//! Logs the wallet in to its community session and prints the member's own
//! record, or for member admins the decrypted member directory, as JSON.
//! Configuration comes from the environment (see `config`).

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bubble_community::blockchain::{CommunityContract, LocalWallet, WalletOracle};
use bubble_community::bubble::HttpConnector;
use bubble_community::config::{
    CommunityConfig, DATA_DIR_ENV, DEFAULT_DATA_DIR, LOG_FORMAT_ENV, WALLET_PRIVATE_KEY_ENV,
};
use bubble_community::events::EventBus;
use bubble_community::storage::RedbLocalStore;
use bubble_community::{CommunityError, CommunityResult, Session, SessionDeps};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}

async fn run() -> CommunityResult<serde_json::Value> {
    let config = CommunityConfig::from_env();

    let private_key = env::var(WALLET_PRIVATE_KEY_ENV).map_err(|_| {
        CommunityError::InvalidKey(format!("{WALLET_PRIVATE_KEY_ENV} is not set"))
    })?;
    let wallet = Arc::new(LocalWallet::from_hex(&private_key, &config.rpc_url)?);
    let account = wallet.account();

    let data_dir = PathBuf::from(env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()));
    let local = Arc::new(RedbLocalStore::open_in(&data_dir)?);

    let ledger = Arc::new(CommunityContract::new(
        &config.rpc_url,
        &config.community_contract,
        wallet.clone(),
    )?);
    let connector = Arc::new(HttpConnector::new(
        &config.bubble_provider,
        config.chain_id,
        &config.bubble_contract,
    )?);

    let deps = SessionDeps {
        wallet,
        ledger,
        connector,
        local,
        events: EventBus::new(),
    };
    let mut session = Session::new(config, account, deps);

    if session.is_logged_in() {
        session.initialise().await?;
    } else {
        session.login(true).await?;
    }

    let events = session.events();
    let members = match session.admin_directory() {
        Some(directory) => Some(directory.lock().await.members().to_vec()),
        None => None,
    };

    Ok(json!({
        "session": session.id(),
        "state": session.state(),
        "membership": session.membership(),
        "stats": events.stats(),
        "memberData": session.member_data(),
        "members": members,
        "error": events.last_error(),
    }))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode output");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "bubble-community failed");
            ExitCode::FAILURE
        }
    }
}
