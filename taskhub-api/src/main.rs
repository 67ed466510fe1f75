//! # TaskHub API Server
//!
//! REST API for a multi-user task manager, built with Axum:
//! - User accounts with token-list sessions (register, login, logout,
//!   logout-everywhere)
//! - Per-user task CRUD with filtering, sorting, and pagination
//! - Avatar upload normalized to PNG
//! - Best-effort transactional email
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskhub-api
//! ```

use taskhub_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskhub_shared::{
    db::{migrations::run_migrations, pool},
    email::{EmailConfig, Mailer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhub_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskHub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db_config = pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    };
    let db = pool::create_pool(db_config).await?;
    run_migrations(&db).await?;

    let mailer = match &config.email {
        Some(email) => {
            let mailer = Mailer::new(EmailConfig {
                smtp_host: email.smtp_host.clone(),
                smtp_username: email.smtp_username.clone(),
                smtp_password: email.smtp_password.clone(),
                from: email.from.clone(),
            })?;
            tracing::info!(host = %email.smtp_host, "email notifications enabled");
            mailer
        }
        None => {
            tracing::info!("SMTP not configured, email notifications disabled");
            Mailer::disabled()
        }
    };

    let bind_address = config.bind_address();
    let state = AppState::new(db, config, mailer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
