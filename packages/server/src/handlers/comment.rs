use axum::extract::{Path, State};
use axum::response::Redirect;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::event::ensure_event_exists;
use crate::entity::comment;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::AppForm;
use crate::models::comment::{CreateCommentRequest, validate_comment};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/event/{id}/comment",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on an event",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 303, description = "Created, redirect to the event"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id, user_id = auth_user.user_id))]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    AppForm(payload): AppForm<CreateCommentRequest>,
) -> Result<Redirect, AppError> {
    ensure_event_exists(&state.db, event_id).await?;
    let text = validate_comment(&payload)?;

    let now = Utc::now();
    let new_comment = comment::ActiveModel {
        text: Set(text),
        event_id: Set(event_id),
        owner_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    new_comment.insert(&state.db).await?;

    Ok(Redirect::to(&format!("/event/{event_id}")))
}

#[utoipa::path(
    post,
    path = "/comment/{id}/delete",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete one of your comments",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 303, description = "Deleted, redirect to the event"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Comment not found or not owned (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let existing = comment::Entity::find_by_id(id)
        .filter(comment::Column::OwnerId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

    let event_id = existing.event_id;
    comment::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Redirect::to(&format!("/event/{event_id}")))
}
