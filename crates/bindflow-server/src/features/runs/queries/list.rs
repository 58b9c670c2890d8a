//! List runs query

use sqlx::PgPool;

use crate::api::response::PaginationMeta;
use crate::db;
use crate::db::runs::RunListItem;

/// Query to list a user's runs, newest first
#[derive(Debug, Clone)]
pub struct ListRunsQuery {
    pub user_id: String,
    pub page: u32,
    pub per_page: u32,
}

/// Response from listing runs
#[derive(Debug, Clone, serde::Serialize)]
pub struct ListRunsResponse {
    pub runs: Vec<RunListItem>,
    #[serde(skip)]
    pub meta: PaginationMeta,
}

/// Errors that can occur when listing runs
#[derive(Debug, thiserror::Error)]
pub enum ListRunsError {
    #[error("Page must be at least 1")]
    InvalidPage,
    #[error("Per-page must be between 1 and 100")]
    InvalidPerPage,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Handles the list runs query
#[tracing::instrument(skip(pool), fields(user_id = %query.user_id))]
pub async fn handle(pool: PgPool, query: ListRunsQuery) -> Result<ListRunsResponse, ListRunsError> {
    if query.page < 1 {
        return Err(ListRunsError::InvalidPage);
    }
    if query.per_page < 1 || query.per_page > 100 {
        return Err(ListRunsError::InvalidPerPage);
    }

    let limit = i64::from(query.per_page);
    let offset = i64::from(query.page - 1) * limit;

    let (runs, total) = db::runs::list_for_user(&pool, &query.user_id, limit, offset).await?;

    Ok(ListRunsResponse {
        runs,
        meta: PaginationMeta::new(i64::from(query.page), i64::from(query.per_page), total),
    })
}
