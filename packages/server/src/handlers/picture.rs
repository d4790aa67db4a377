use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use sea_orm::*;
use tracing::instrument;

use crate::entity::event;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[utoipa::path(
    get,
    path = "/event_picture/{id}",
    tag = "Events",
    operation_id = "getEventPicture",
    summary = "Stream an event's picture",
    description = "Returns the stored bytes unchanged with the stored content type.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Picture bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Event not found or has no picture (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_event_picture(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let (picture, content_type) = event::Entity::find_by_id(id)
        .select_only()
        .column(event::Column::Picture)
        .column(event::Column::ContentType)
        .into_tuple::<(Option<Vec<u8>>, Option<String>)>()
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;

    let bytes = picture.ok_or_else(|| AppError::NotFound("Event has no picture".into()))?;

    let content_type = content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
        .unwrap_or(HeaderValue::from_static(FALLBACK_CONTENT_TYPE));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
