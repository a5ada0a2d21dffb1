//! REST API served by axum
//!
//! Routes:
//! - `GET /` health message
//! - `/api/auth`: `POST login`, `GET verify`, `POST change-password`
//! - `/api/tickets`: create, list, fetch, status update and receipt (signed in)
//! - `/api/users`: account administration (administrators only)
//!
//! Every JSON body uses the `{ success, message, data, pagination }` envelope
//! from [`response`].

pub mod extract;
pub mod handlers;
pub mod response;

use crate::service::ClinicContext;
use anyhow::Context as _;
use axum::Router;
use axum::routing::{get, patch, post};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub context: ClinicContext,
}

impl AppState {
    pub const fn new(context: ClinicContext) -> Self {
        Self { context }
    }
}

pub fn build_router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/verify", get(handlers::auth::verify))
        .route("/change-password", post(handlers::auth::change_password));

    let tickets = Router::new()
        .route(
            "/",
            post(handlers::tickets::create_ticket).get(handlers::tickets::list_tickets),
        )
        .route("/:id", get(handlers::tickets::get_ticket))
        .route("/:id/status", patch(handlers::tickets::update_status))
        .route("/:id/receipt", get(handlers::tickets::receipt));

    let users = Router::new()
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/:id", patch(handlers::users::update_user))
        .route("/:id/reset-password", post(handlers::users::reset_password));

    Router::new()
        .route("/", get(handlers::health))
        .nest("/api/auth", auth)
        .nest("/api/tickets", tickets)
        .nest("/api/users", users)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(context: ClinicContext, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("{} API listening on http://{addr}", context.config.clinic.name);

    let app = build_router(AppState::new(context));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
