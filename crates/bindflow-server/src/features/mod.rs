//! Feature modules implementing the BindFlow API
//!
//! Each feature is a vertical slice with its own commands, queries, and
//! routes:
//!
//! - **runs**: run submission (multipart upload of ligand and target tables)
//!   and run listing for the authenticated user
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//! - `types.rs` - Shared types (if needed)

pub mod runs;

use axum::Router;

use crate::services::ExternalServices;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool
    pub db: sqlx::PgPool,
    /// Outbound HTTP clients (identity, gene lookup, association ranking)
    pub services: ExternalServices,
    /// Model version stamped into every submitted run
    pub model_version: String,
}

/// Creates the main API router with all feature routes mounted
///
/// - `/runs` - Run submission and listing
/// - `/indications` - The indication allow-list
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/runs", runs::runs_routes().with_state(state.clone()))
        .nest("/indications", runs::indications_routes().with_state(state))
}
