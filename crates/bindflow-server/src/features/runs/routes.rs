//! Run routes
//!
//! POST /runs accepts a multipart submission (ligand and target tables plus
//! optional memo and indication) behind bearer authentication. GET /runs
//! lists the caller's runs. GET /indications lists the accepted indication
//! identifiers and needs no authentication.

use axum::{
    extract::{Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;
use crate::services::identity::IdentityError;

use super::commands::{self, SubmitRunsCommand, SubmitRunsError};
use super::indications::INDICATIONS;
use super::queries::{self, ListRunsError, ListRunsQuery};

/// Create run routes
pub fn runs_routes() -> Router<FeatureState> {
    Router::new().route("/", post(submit_runs).get(list_runs))
}

/// Create indication routes
pub fn indications_routes() -> Router<FeatureState> {
    Router::new().route("/", get(list_indications))
}

/// Submit a run batch
///
/// POST /runs with multipart fields: ligand_csv, target_csv, memo (optional),
/// indication_id (optional). Requires a bearer token.
#[tracing::instrument(skip(state, headers, multipart))]
async fn submit_runs(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, RunsApiError> {
    let token = bearer_token(&headers).ok_or(RunsApiError::MissingToken)?;
    let user_id = state.services.identity.verify_token(&token).await?;

    let mut ligand_csv = String::new();
    let mut target_csv = String::new();
    let mut memo = String::new();
    let mut indication_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RunsApiError::Multipart(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        let text = field
            .text()
            .await
            .map_err(|e| RunsApiError::Multipart(e.to_string()))?;

        match field_name.as_str() {
            "ligand_csv" => ligand_csv = text,
            "target_csv" => target_csv = text,
            "memo" => memo = text,
            "indication_id" => indication_id = Some(text),
            _ => tracing::debug!(field = %field_name, "Ignoring unknown multipart field"),
        }
    }

    let command = SubmitRunsCommand {
        user_id,
        memo,
        indication_id,
        ligand_csv,
        target_csv,
    };

    let response = commands::submit::handle(
        state.db,
        &state.services,
        &state.model_version,
        command,
    )
    .await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[derive(Debug, Deserialize)]
struct ListRunsParams {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

/// List the authenticated user's runs
///
/// GET /runs?page=1&per_page=20
#[tracing::instrument(skip(state, headers))]
async fn list_runs(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Query(params): Query<ListRunsParams>,
) -> Result<Response, RunsApiError> {
    let token = bearer_token(&headers).ok_or(RunsApiError::MissingToken)?;
    let user_id = state.services.identity.verify_token(&token).await?;

    let query = ListRunsQuery {
        user_id,
        page: params.page,
        per_page: params.per_page,
    };

    let response = queries::list::handle(state.db, query).await?;
    let meta = json!(response.meta);

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success_with_meta(response, meta)),
    )
        .into_response())
}

/// List accepted indications
///
/// GET /indications
async fn list_indications() -> Response {
    (StatusCode::OK, Json(ApiResponse::success(INDICATIONS))).into_response()
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[derive(Debug)]
enum RunsApiError {
    MissingToken,
    Identity(IdentityError),
    Multipart(String),
    Submit(SubmitRunsError),
    List(ListRunsError),
}

impl From<IdentityError> for RunsApiError {
    fn from(err: IdentityError) -> Self {
        Self::Identity(err)
    }
}

impl From<SubmitRunsError> for RunsApiError {
    fn from(err: SubmitRunsError) -> Self {
        Self::Submit(err)
    }
}

impl From<ListRunsError> for RunsApiError {
    fn from(err: ListRunsError) -> Self {
        Self::List(err)
    }
}

impl IntoResponse for RunsApiError {
    fn into_response(self) -> Response {
        match self {
            RunsApiError::MissingToken
            | RunsApiError::Identity(IdentityError::InvalidToken)
            | RunsApiError::Identity(IdentityError::Transport(_)) => {
                let error = ErrorResponse::new("UNAUTHORIZED", "Invalid or missing bearer token");
                (StatusCode::UNAUTHORIZED, Json(error)).into_response()
            },
            RunsApiError::Identity(IdentityError::NotConfigured)
            | RunsApiError::Submit(SubmitRunsError::Config(_)) => {
                tracing::error!("Configuration error: {}", self);
                let error = ErrorResponse::new("CONFIG_ERROR", "The server is misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            RunsApiError::Multipart(_) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            RunsApiError::Submit(SubmitRunsError::Database(_))
            | RunsApiError::List(ListRunsError::Database(_)) => {
                tracing::error!("Database error: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            RunsApiError::Submit(_) | RunsApiError::List(_) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
        }
    }
}

impl std::fmt::Display for RunsApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(f, "Missing bearer token"),
            Self::Identity(e) => write!(f, "{}", e),
            Self::Multipart(e) => write!(f, "Invalid multipart payload: {}", e),
            Self::Submit(e) => write!(f, "{}", e),
            Self::List(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            value.parse().unwrap(),
        );
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let headers = headers_with_auth("Bearer abc123");
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let headers = headers_with_auth("Basic abc123");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_empty_value() {
        let headers = headers_with_auth("Bearer ");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_error_display() {
        let err = RunsApiError::Submit(SubmitRunsError::SmilesColumnMissing);
        assert!(err.to_string().contains("smiles"));
    }
}
