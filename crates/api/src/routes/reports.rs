//! Report routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::{report, Report, ReportType};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateBody {
    pub report_type: ReportType,
    pub title: String,
    #[serde(default)]
    pub document_ids: Option<Vec<String>>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

pub async fn generate(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<GenerateBody>,
) -> Result<(StatusCode, Json<Report>)> {
    let generated = state
        .reports
        .generate(
            &user_id,
            body.report_type,
            &body.title,
            body.document_ids.as_deref(),
            body.conversation_id.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(generated)))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Report>>> {
    Ok(Json(report::list_reports(state.db.pool(), &user_id).await?))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Report>> {
    Ok(Json(report::get_report(state.db.pool(), &id, &user_id).await?))
}
