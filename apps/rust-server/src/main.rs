// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

use std::{error::Error, net::SocketAddr, sync::Arc};

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tuldok_social_server::{
    api::router,
    auth::SessionKeys,
    config::AppConfig,
    mailer::{HttpMailer, LogMailer, Mailer},
    state::{AppState, Settings},
    storage::SocialDatabase,
    xrpl::XrplClient,
    xumm::{SigningService, UnconfiguredSigning, XummClient},
};

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Resolves on Ctrl-C or SIGTERM and cancels `shutdown`.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
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

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env();
    init_tracing(config.log_json);

    if config.using_dev_jwt_secret {
        warn!("JWT_SECRET is not set; using the development secret");
    }

    std::fs::create_dir_all(&config.data_dir)?;
    let db_path = config.database_path();
    let db = SocialDatabase::open(&db_path)?;
    info!(path = %db_path.display(), "Database opened");

    let ledger = Arc::new(XrplClient::new(&config.xrpl_rpc_url)?);
    info!(endpoint = %config.xrpl_rpc_url, issuer = %config.issuer_address, "XRPL client ready");

    let signing: Arc<dyn SigningService> = match config.xumm.clone() {
        Some(credentials) => Arc::new(XummClient::new(&config.xumm_api_url, credentials)?),
        None => {
            warn!("XUMM credentials not set; payload endpoints will return 503");
            Arc::new(UnconfiguredSigning)
        }
    };

    let mailer: Arc<dyn Mailer> = match config.mail.clone() {
        Some(settings) => Arc::new(HttpMailer::new(settings)?),
        None => {
            warn!("MAIL_API_URL not set; verification emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let shutdown = CancellationToken::new();
    let state = AppState::new(
        db,
        ledger,
        SessionKeys::new(&config.jwt_secret),
        Settings::from_config(&config),
    )
    .with_signing(signing)
    .with_mailer(mailer)
    .with_shutdown(shutdown.clone());

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("TULDOK Social server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
