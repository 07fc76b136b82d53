// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use wallet_ledger::{
    api::router,
    auth::DigestVerifier,
    config::Config,
    ledger::LedgerService,
    logging::init_logging,
    state::AppState,
    storage::{apply_seed, LedgerDatabase, SeedFile},
};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(config.log_format) {
        eprintln!("Failed to initialise logging: {e}");
        process::exit(1);
    }

    let db_path = config.database_path();
    let db = match LedgerDatabase::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            error!(path = %db_path.display(), error = %e, "Failed to open ledger database");
            process::exit(1);
        }
    };
    info!(path = %db_path.display(), "Ledger database opened");

    if let Some(seed_path) = &config.seed_file {
        let seeded = SeedFile::load(seed_path).and_then(|seed| apply_seed(&db, &seed));
        match seeded {
            Ok(report) => info!(
                limits = report.limits,
                wallets_created = report.wallets_created,
                wallets_skipped = report.wallets_skipped,
                "Seed applied"
            ),
            Err(e) => {
                error!(path = %seed_path.display(), error = %e, "Failed to apply seed");
                process::exit(1);
            }
        }
    }

    let state = AppState::new(
        LedgerService::new(db, config.deposit_policy),
        DigestVerifier::new(&config.digest_secret),
        config.data_dir.clone(),
    );
    let app = router(state, config.request_timeout);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "Failed to bind");
            process::exit(1);
        }
    };
    info!(
        addr = %config.bind_addr,
        min_deposit = config.deposit_policy.min_amount,
        revalidate_limit_in_unit = config.deposit_policy.revalidate_in_unit,
        "Wallet ledger listening on http://{} (docs at /docs)",
        config.bind_addr
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
    {
        error!(error = %e, "Server error");
        process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received");
}
