//! Timeclock API - time tracking backend
//!
//! JWT authentication with access/refresh token pairs, role-based access
//! control (employee < manager < admin), user management, and a Slack
//! slash-command integration.
//!
//! Tokens are stateless bearer credentials: validity is signature + expiry,
//! there is no session table and no revocation list. A role change becomes
//! effective when the user's tokens are next reissued.

mod auth;
mod config;
mod db;
mod error;
mod routes;
mod slack;
mod state;

use crate::auth::TokenKeys;
use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting Timeclock API...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    // A missing or empty SECRET_KEY aborts startup here, never surfacing as
    // a per-request failure later.
    let token_keys = TokenKeys::from_config(&settings.auth)?;

    let pool = db::init_pool(&settings.database).await?;
    db::init_schema(&pool).await?;
    info!("✅ Database pool created successfully");

    let state = Arc::new(AppState::new(pool, token_keys, settings.slack.clone()));

    // Build the router
    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Authentication ───");
    info!("   POST /api/v1/auth/login      - Login with username/email + password");
    info!("   POST /api/v1/auth/register   - Register new account");
    info!("   POST /api/v1/auth/refresh    - Refresh access token");
    info!("   POST /api/v1/auth/logout     - Logout (client-side token discard)");
    info!("   GET  /api/v1/auth/me         - Get current user");
    info!("");
    info!("   ─── User Management ───");
    info!("   GET    /api/v1/users         - List users (Manager+)");
    info!("   POST   /api/v1/users         - Create user (Admin)");
    info!("   GET    /api/v1/users/:id     - Get user");
    info!("   PUT    /api/v1/users/:id     - Update user");
    info!("   DELETE /api/v1/users/:id     - Delete user (Admin)");
    info!("");
    info!("   ─── Slack ───");
    info!("   POST /api/v1/slack/commands  - Slash commands");
    info!("   POST /api/v1/slack/events    - Event subscriptions");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,timeclock_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
