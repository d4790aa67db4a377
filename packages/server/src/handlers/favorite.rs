use axum::extract::{Path, State};
use axum::http::StatusCode;
use sea_orm::*;
use tracing::instrument;

use super::event::ensure_event_exists;
use crate::entity::favorite;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/event/{id}/favorite",
    tag = "Favorites",
    operation_id = "favoriteEvent",
    summary = "Mark an event as a favorite",
    description = "Idempotent: favoriting an already favorited event succeeds without change.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Favorited"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(event_id, user_id = auth_user.user_id))]
pub async fn favorite_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    ensure_event_exists(&state.db, event_id).await?;

    let link = favorite::ActiveModel {
        event_id: Set(event_id),
        user_id: Set(auth_user.user_id),
        ..Default::default()
    };
    match favorite::Entity::insert(link)
        .exec_without_returning(&state.db)
        .await
    {
        Ok(_) => {}
        Err(e) => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                tracing::debug!("Event already favorited");
            }
            _ => return Err(AppError::from(e)),
        },
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/event/{id}/unfavorite",
    tag = "Favorites",
    operation_id = "unfavoriteEvent",
    summary = "Remove an event from favorites",
    description = "Idempotent: succeeds whether or not the event was favorited.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Unfavorited"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(event_id, user_id = auth_user.user_id))]
pub async fn unfavorite_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    ensure_event_exists(&state.db, event_id).await?;

    favorite::Entity::delete_many()
        .filter(favorite::Column::EventId.eq(event_id))
        .filter(favorite::Column::UserId.eq(auth_user.user_id))
        .exec(&state.db)
        .await?;

    Ok(StatusCode::OK)
}
