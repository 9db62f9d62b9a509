//! Store Review Server - Main Application Entry Point
//!
//! A REST API for an open store directory: anyone can register a store or post
//! a review without an account. Ownership is proven with an edit key issued at
//! creation time and required for every later update or delete.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, or in-memory when no database is configured
//! - **Ownership**: Per-entity edit keys, stored as SHA-256 digests
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations (if `DATABASE_URL` is set)
//! 3. Build HTTP router
//! 4. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod repository;
mod services;
mod state;


use std::sync::Arc;

use axum::{
    Router,
    http::Request,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::{
    repository::{Repository, memory::MemoryRepository, postgres::PgRepository},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber.
    // Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let repo: Arc<dyn Repository> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, config.database_max_connections).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data is kept in memory and lost on restart");
            Arc::new(MemoryRepository::new())
        }
    };

    let addr = format!("0.0.0.0:{}", config.server_port);
    let app = create_router(AppState::new(repo, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the HTTP router with all routes and middleware.
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        // Stores
        .route(
            "/api/stores",
            post(handlers::stores::create_store).get(handlers::stores::list_stores),
        )
        .route(
            "/api/stores/{id}",
            get(handlers::stores::get_store)
                .patch(handlers::stores::update_store)
                .delete(handlers::stores::delete_store),
        )
        .route(
            "/api/stores/{id}/reviews",
            get(handlers::reviews::list_reviews).post(handlers::reviews::create_review),
        )
        // Reviews
        .route("/api/reviews", get(handlers::reviews::recent_reviews))
        .route(
            "/api/reviews/{id}",
            get(handlers::reviews::get_review)
                .patch(handlers::reviews::update_review)
                .delete(handlers::reviews::delete_review),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                // Path only: the query string can carry an edit key
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .with_state(state)
}
