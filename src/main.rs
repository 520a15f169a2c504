// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, net::SocketAddr, sync::Arc, time::Duration};

use axum_server::tls_rustls::RustlsConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use card_vault::{
    api::router,
    auth::{HttpKeySetFetcher, TokenVerifier},
    cards::CardService,
    config::{Config, TlsPaths},
    keys::KeysProvider,
    reaper::OrphanReaper,
    state::AppState,
    storage::{Database, StoragePaths, UserRepository},
    telemetry::init_tracing,
    vault::{VaultClient, VaultConfig},
};

/// Time allowed for in-flight requests once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // A missing .env file is fine; the environment may be set directly.
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    // Relational store
    let paths = StoragePaths::new(&config.data_dir);
    let db = Arc::new(Database::open(&paths.database())?);
    info!(path = %paths.database().display(), "Opened card database");

    let users = UserRepository::new(db.clone());
    if let Some(subject) = &config.seed_user_subject {
        let user = users.register(subject, None, None)?;
        info!(user_id = %user.id, "Seed user ready");
    }

    // Vault
    let vault = Arc::new(VaultClient::new(
        VaultConfig::new(&config.vault_addr, &config.vault_token)
            .with_transit_mount(&config.vault_transit_mount)
            .with_kv_mount(&config.vault_kv_mount),
    )?);

    let cards = Arc::new(CardService::new(db.clone(), vault.clone(), vault.clone()));
    let keys = KeysProvider::new(vault);

    // Authentication
    let fetcher = HttpKeySetFetcher::new(&config.keycloak_url, &config.keycloak_realm)?;
    info!(jwks_url = %fetcher.certs_url(), "Verifying tokens against identity provider");
    let mut verifier = TokenVerifier::new(Arc::new(fetcher), Arc::new(users));
    if let Some(issuer) = &config.auth_issuer {
        verifier = verifier.with_issuer(issuer);
    }
    if let Some(audience) = &config.auth_audience {
        verifier = verifier.with_audience(audience);
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let reaper = OrphanReaper::new(cards.clone()).with_interval(config.orphan_sweep_interval);
    let reaper_task = tokio::spawn(reaper.run(shutdown.clone()));

    let app = router(AppState::new(cards, keys, verifier, db));
    let addr: SocketAddr = config.bind_address().parse()?;

    match &config.tls {
        Some(tls) => serve_https(addr, tls, app, shutdown.clone()).await?,
        None => {
            warn!("TLS_CERT_PATH not set; serving plain HTTP");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("Card vault listening on http://{addr} (docs at /docs)");
            let token = shutdown.clone();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await?;
        }
    }

    shutdown.cancel();
    if let Err(e) = reaper_task.await {
        error!(error = %e, "Reaper task panicked");
    }
    info!("Card vault stopped");
    Ok(())
}

async fn serve_https(
    addr: SocketAddr,
    tls: &TlsPaths,
    app: axum::Router,
    shutdown: CancellationToken,
) -> Result<(), BoxError> {
    // Must happen before any TLS configuration is built.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;

    let handle: axum_server::Handle<SocketAddr> = axum_server::Handle::new();
    let graceful = handle.clone();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        graceful.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!("Card vault listening on https://{addr} (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    use tokio::signal;

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

    info!("Shutdown signal received");
    shutdown.cancel();
}
