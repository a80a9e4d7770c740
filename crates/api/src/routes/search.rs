//! Direct search and calculation routes.

use axum::extract::State;
use axum::Json;
use calculator::{calculate, Calculation, CalculationRequest};
use database::DocumentType;
use documents::{search_chunks, SearchHit};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchBody {
    pub query: String,
    #[serde(default)]
    pub document_types: Option<Vec<DocumentType>>,
}

pub async fn search(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<SearchBody>,
) -> Result<Json<Vec<SearchHit>>> {
    let hits = search_chunks(
        &state.db,
        &user_id,
        &body.query,
        body.document_types.as_deref(),
    )
    .await?;
    Ok(Json(hits))
}

pub async fn calculate_quantity(
    CurrentUser(_user_id): CurrentUser,
    Json(request): Json<CalculationRequest>,
) -> Result<Json<Calculation>> {
    Ok(Json(calculate(&request)?))
}
