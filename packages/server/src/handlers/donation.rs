use axum::extract::{Path, State};
use axum::response::Redirect;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::event::ensure_event_exists;
use crate::entity::donation;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::AppForm;
use crate::models::donation::{CreateDonationRequest, validate_donation};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/event/{id}/donation",
    tag = "Donations",
    operation_id = "createDonation",
    summary = "Donate to an event",
    description = "The amount must be one of 25, 50, ..., 475.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CreateDonationRequest,
    responses(
        (status = 303, description = "Created, redirect to the event"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id, user_id = auth_user.user_id))]
pub async fn create_donation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    AppForm(payload): AppForm<CreateDonationRequest>,
) -> Result<Redirect, AppError> {
    ensure_event_exists(&state.db, event_id).await?;
    let amount = validate_donation(&payload)?;

    let now = Utc::now();
    let new_donation = donation::ActiveModel {
        amount: Set(amount),
        event_id: Set(event_id),
        owner_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = new_donation.insert(&state.db).await?;

    tracing::info!(donation_id = model.id, %amount, "Recorded donation");
    Ok(Redirect::to(&format!("/event/{event_id}")))
}

#[utoipa::path(
    post,
    path = "/donation/{id}/delete",
    tag = "Donations",
    operation_id = "deleteDonation",
    summary = "Withdraw one of your donations",
    params(("id" = i32, Path, description = "Donation ID")),
    responses(
        (status = 303, description = "Deleted, redirect to the event"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Donation not found or not owned (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_donation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let existing = donation::Entity::find_by_id(id)
        .filter(donation::Column::OwnerId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Donation not found".into()))?;

    let event_id = existing.event_id;
    donation::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Redirect::to(&format!("/event/{event_id}")))
}
