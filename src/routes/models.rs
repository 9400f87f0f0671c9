//! Models endpoint
//!
//! Lists the configured aliases in the OpenAI models format.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Model information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

/// Models list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<Model>,
}

/// List configured aliases, sorted by name
///
/// `created` is the server start time for every entry.
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    let created = state.started_at.timestamp();

    let data = state
        .snapshot
        .aliases()
        .map(|(alias, _)| Model {
            id: alias.to_string(),
            object: "model".to_string(),
            created,
            owned_by: "portus".to_string(),
        })
        .collect();

    Json(ModelsResponse {
        object: "list".to_string(),
        data,
    })
}
