use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer};

use super::filename::content_disposition;
use super::pipeline::SelectionRequest;
use super::render::DocumentFormat;
use super::roster::RosterSource;
use super::service::RegistrationExporter;
use crate::error::AppError;

/// JSON body posted by the member picker.
#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default, deserialize_with = "deserialize_codes")]
    pub selected: Vec<String>,
    #[serde(default)]
    pub exam_code: String,
    #[serde(default)]
    pub format: Option<DocumentFormat>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MemberCode {
    Text(String),
    Number(serde_json::Number),
}

/// Member codes may arrive as JSON strings or bare numbers.
fn deserialize_codes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let codes = Option::<Vec<MemberCode>>::deserialize(deserializer)?;
    Ok(codes
        .unwrap_or_default()
        .into_iter()
        .map(|code| match code {
            MemberCode::Text(text) => text,
            MemberCode::Number(number) => number.to_string(),
        })
        .collect())
}

/// Router exposing the export boundary and the member listing.
pub fn registration_router<S>(exporter: Arc<RegistrationExporter<S>>) -> Router
where
    S: RosterSource + 'static,
{
    Router::new()
        .route("/export", post(export_handler::<S>))
        .route("/api/v1/registrations/export", post(export_handler::<S>))
        .route("/api/v1/members", get(members_handler::<S>))
        .with_state(exporter)
}

pub(crate) async fn export_handler<S>(
    State(exporter): State<Arc<RegistrationExporter<S>>>,
    Json(payload): Json<ExportRequest>,
) -> Result<Response, AppError>
where
    S: RosterSource + 'static,
{
    let ExportRequest {
        selected,
        exam_code,
        format,
    } = payload;
    let request = SelectionRequest {
        exam_code,
        selected_codes: selected,
    };

    let document = exporter.export(&request, format)?;
    let disposition = content_disposition(&document.filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

pub(crate) async fn members_handler<S>(
    State(exporter): State<Arc<RegistrationExporter<S>>>,
) -> Result<Response, AppError>
where
    S: RosterSource + 'static,
{
    let members = exporter.members()?;
    Ok((StatusCode::OK, Json(members)).into_response())
}
