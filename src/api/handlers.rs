use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{
    ArtifactStatus, RecommendationQuery, RecommendationResponse, UserNotFoundResponse,
};

use super::page::{self, Outcome, EXAMPLE_SAMPLE_SIZE};
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub user_id: Option<String>,
}

/// Runs a lookup off the async executor. `None` covers both an unknown user
/// and an empty result.
async fn lookup(
    state: &AppState,
    request_id: &RequestId,
    user_id: &str,
    num_rec: usize,
) -> AppResult<Option<Vec<String>>> {
    let engine = state.engine.clone();
    let user_id = user_id.trim().to_string();

    let result = {
        let user_id = user_id.clone();
        tokio::task::spawn_blocking(move || engine.recommend(&user_id, num_rec))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??
    };

    match result {
        Some(items) if !items.is_empty() => {
            tracing::info!(
                request_id = %request_id,
                user_id = %user_id,
                count = items.len(),
                "Recommendations served"
            );
            Ok(Some(items))
        }
        _ => {
            tracing::warn!(
                request_id = %request_id,
                user_id = %user_id,
                num_rec,
                "User not found or no recommendations available"
            );
            Ok(None)
        }
    }
}

fn mapping_warning(state: &AppState) -> Option<String> {
    state.engine.mapping_warning().map(ToString::to_string)
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Summary of the loaded artifacts
pub async fn status(State(state): State<AppState>) -> Json<ArtifactStatus> {
    Json(state.status.as_ref().clone())
}

/// The empty form
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let warning = mapping_warning(&state);
    Html(page::render(
        &state.shell,
        warning.as_deref(),
        &state.shell.default_user_id,
        None,
    ))
}

/// Form submission: the page again, with results, a hint, or the failure
pub async fn recommend_page(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let Some(user_input) = query.user_id else {
        return index(State(state)).await;
    };

    let user_id = user_input.trim();
    let num_rec = state.shell.num_recommendations;
    let outcome = match lookup(&state, &request_id, user_id, num_rec).await {
        Ok(Some(items)) => Outcome::Found {
            user_id: user_id.to_string(),
            items,
        },
        Ok(None) => Outcome::NotFound {
            example_user_ids: state.engine.sample_user_ids(EXAMPLE_SAMPLE_SIZE),
        },
        Err(e) => {
            tracing::error!(request_id = %request_id, user_id = %user_id, error = %e, "Lookup failed");
            Outcome::Failed {
                message: e.to_string(),
            }
        }
    };

    let warning = mapping_warning(&state);
    Html(page::render(
        &state.shell,
        warning.as_deref(),
        &user_input,
        Some(&outcome),
    ))
}

/// JSON lookup
pub async fn recommend_json(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
    let num_rec = query.num_rec.unwrap_or(state.shell.num_recommendations);
    let user_id = query.user_id.trim().to_string();

    let response = match lookup(&state, &request_id, &user_id, num_rec).await? {
        Some(recommendations) => Json(RecommendationResponse {
            user_id,
            recommendations,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(UserNotFoundResponse {
                error: "User not found or no recommendations available.".to_string(),
                example_user_ids: state.engine.sample_user_ids(EXAMPLE_SAMPLE_SIZE),
            }),
        )
            .into_response(),
    };

    Ok(response)
}
