use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{ModelStatus, RecommendationMethod};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: String,
    pub recommended_item_ids: Vec<String>,
    pub method: RecommendationMethod,
}

#[derive(Debug, Serialize)]
pub struct RetrainResponse {
    pub status: &'static str,
    pub message: String,
    pub is_trained: bool,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Ranked courts for one user
///
/// A zero or negative `limit` yields an empty list.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    if user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("User ID is required".to_string()));
    }

    let limit = query.limit.unwrap_or(state.default_limit);
    let limit = usize::try_from(limit).unwrap_or(0);

    let recommendations = state.engine.recommend(&user_id, limit).await;

    tracing::info!(
        user_id = %user_id,
        limit,
        returned = recommendations.item_ids.len(),
        method = %recommendations.method,
        "Recommendations served"
    );

    Ok(Json(RecommendationResponse {
        user_id,
        recommended_item_ids: recommendations.item_ids,
        method: recommendations.method,
    }))
}

/// Retrain the model synchronously
pub async fn retrain(State(state): State<AppState>) -> AppResult<Json<RetrainResponse>> {
    let outcome = state.engine.train().await.map_err(|e| {
        tracing::error!(error = %e, "Retrain failed");
        e
    })?;

    Ok(Json(RetrainResponse {
        status: "success",
        message: outcome.message(),
        is_trained: outcome.is_trained(),
    }))
}

/// Current model status
pub async fn model_status(State(state): State<AppState>) -> Json<ModelStatus> {
    Json(state.engine.status().await)
}
