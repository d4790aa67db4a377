use std::collections::HashMap;

use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::response::Redirect;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType, NullOrdering, OnConflict, Order};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{comment, donation, event, event_tag, favorite, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::AppMultipart;
use crate::models::comment::CommentResponse;
use crate::models::donation::{DonationFormResponse, DonationResponse};
use crate::models::event::*;
use crate::models::shared::escape_like;
use crate::state::AppState;
use crate::utils::humanize::natural_time;

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List or search events",
    description = "Without `search`, returns every event ordered by ID plus the IDs the caller has \
        favorited. With `search`, returns at most 10 events whose performer contains the term \
        (case-insensitive), ordered by show time with untimed events last; favorites are not \
        computed for searches.",
    params(EventListQuery),
    responses(
        (status = 200, description = "Events", body = EventListResponse),
        (status = 401, description = "Bad token (TOKEN_INVALID)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_events(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<EventListResponse>, AppError> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    let mut select = event::Entity::find()
        .select_only()
        .column(event::Column::Id)
        .column(event::Column::Performer)
        .column(event::Column::Pledge)
        .column(event::Column::Venue)
        .column(event::Column::ShowDate)
        .column(event::Column::ShowTime)
        .column(event::Column::OwnerId)
        .column(event::Column::ContentType)
        .column(event::Column::UpdatedAt);

    if let Some(ref term) = search {
        let term = escape_like(term);
        select = select
            .filter(
                Expr::expr(Func::lower(Expr::col(event::Column::Performer)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            )
            .order_by_with_nulls(event::Column::ShowTime, Order::Asc, NullOrdering::Last)
            .order_by_asc(event::Column::Id)
            .limit(Some(SEARCH_LIMIT));
    } else {
        select = select.order_by_asc(event::Column::Id);
    }

    let rows = select.into_model::<EventListRow>().all(&state.db).await?;
    let mut tags = load_tags(&state.db, rows.iter().map(|r| r.id).collect()).await?;

    let favorites = match (&search, auth_user) {
        (None, Some(user)) => {
            favorite::Entity::find()
                .select_only()
                .column(favorite::Column::EventId)
                .filter(favorite::Column::UserId.eq(user.user_id))
                .order_by_asc(favorite::Column::EventId)
                .into_tuple::<i32>()
                .all(&state.db)
                .await?
        }
        _ => Vec::new(),
    };

    let now = Utc::now();
    let events = rows
        .into_iter()
        .map(|row| {
            let natural_updated = natural_time(row.updated_at, now);
            let event_tags = tags.remove(&row.id).unwrap_or_default();
            EventSummary::from_row(row, event_tags, natural_updated)
        })
        .collect();

    Ok(Json(EventListResponse {
        events,
        favorites,
        search,
    }))
}

#[utoipa::path(
    get,
    path = "/event/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Event detail",
    description = "Returns the event with its donations and comments, both newest first, and the \
        amounts offered by the donation form.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event detail", body = EventDetailResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventDetailResponse>, AppError> {
    let model = find_event(&state.db, id).await?;
    let tags = load_tags(&state.db, vec![id])
        .await?
        .remove(&id)
        .unwrap_or_default();

    let donations = donation::Entity::find()
        .filter(donation::Column::EventId.eq(id))
        .order_by_desc(donation::Column::UpdatedAt)
        .order_by_desc(donation::Column::Id)
        .all(&state.db)
        .await?;

    let comments = comment::Entity::find()
        .filter(comment::Column::EventId.eq(id))
        .order_by_desc(comment::Column::UpdatedAt)
        .order_by_desc(comment::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(EventDetailResponse {
        event: EventResponse::new(model, tags),
        donations: donations.into_iter().map(DonationResponse::from).collect(),
        comments: comments.into_iter().map(CommentResponse::from).collect(),
        donation_form: DonationFormResponse::default(),
    }))
}

#[utoipa::path(
    get,
    path = "/event/create",
    tag = "Events",
    operation_id = "newEventForm",
    summary = "Blank event form",
    responses(
        (status = 200, description = "Form description", body = EventFormResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id))]
pub async fn new_event_form(auth_user: AuthUser) -> Json<EventFormResponse> {
    Json(EventFormResponse::new(None))
}

#[utoipa::path(
    post,
    path = "/event/create",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event",
    description = "Accepts the event form as multipart. Fields: `performer`, `pledge`, `venue`, \
        `text`, `show_date` (YYYY-MM-DD), `show_time` and an optional `picture` file of at most \
        2 MiB. `tags` is a comma separated list. Redirects to the listing on success.",
    request_body(content_type = "multipart/form-data", description = "Event form"),
    responses(
        (status = 303, description = "Created, redirect to `/`"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<Redirect, AppError> {
    let form = read_event_form(multipart).await?;
    let valid = validate_event_form(form, Utc::now().date_naive())?;

    let now = Utc::now();
    let (picture, content_type) = match valid.picture {
        Some((bytes, content_type)) => (Some(bytes), Some(content_type)),
        None => (None, None),
    };

    let new_event = event::ActiveModel {
        performer: Set(valid.performer),
        pledge: Set(valid.pledge),
        venue: Set(valid.venue),
        text: Set(valid.text),
        show_date: Set(valid.show_date),
        show_time: Set(valid.show_time),
        owner_id: Set(auth_user.user_id),
        picture: Set(picture),
        content_type: Set(content_type),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let txn = state.db.begin().await?;
    let model = new_event.insert(&txn).await?;
    replace_event_tags(&txn, model.id, &valid.tags).await?;
    txn.commit().await?;

    tracing::info!(event_id = model.id, "Created event");
    Ok(Redirect::to("/"))
}

#[utoipa::path(
    get,
    path = "/event/{id}/update",
    tag = "Events",
    operation_id = "editEventForm",
    summary = "Event form prefilled with current values",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Form description", body = EventFormResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found or not owned (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn edit_event_form(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventFormResponse>, AppError> {
    let model = find_owned_event(&state.db, id, auth_user.user_id).await?;
    let tags = load_tags(&state.db, vec![id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    let initial = EventFormValues::new(model, &tags);
    Ok(Json(EventFormResponse::new(Some(initial))))
}

#[utoipa::path(
    post,
    path = "/event/{id}/update",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "Same form and validation as creation. Only the owner may update; ownership is \
        checked before the body is read. The stored picture is kept when no new file is \
        uploaded. The submitted `tags` replace the current set.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body(content_type = "multipart/form-data", description = "Event form"),
    responses(
        (status = 303, description = "Updated, redirect to `/`"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found or not owned (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id, user_id = auth_user.user_id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppMultipart(multipart): AppMultipart,
) -> Result<Redirect, AppError> {
    ensure_owned_event(&state.db, id, auth_user.user_id).await?;
    let form = read_event_form(multipart).await?;

    let txn = state.db.begin().await?;
    let existing = find_owned_event_for_update(&txn, id, auth_user.user_id).await?;
    let valid = validate_event_form(form, Utc::now().date_naive())?;

    let mut active: event::ActiveModel = existing.into();
    active.performer = Set(valid.performer);
    active.pledge = Set(valid.pledge);
    active.venue = Set(valid.venue);
    active.text = Set(valid.text);
    active.show_date = Set(valid.show_date);
    active.show_time = Set(valid.show_time);
    if let Some((bytes, content_type)) = valid.picture {
        active.picture = Set(Some(bytes));
        active.content_type = Set(Some(content_type));
    }
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;
    replace_event_tags(&txn, id, &valid.tags).await?;

    txn.commit().await?;
    Ok(Redirect::to("/"))
}

#[utoipa::path(
    post,
    path = "/event/{id}/delete",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    description = "Deletes the event together with its favorites, tag links, comments and \
        donations. Only the owner may delete.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 303, description = "Deleted, redirect to `/`"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found or not owned (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let txn = state.db.begin().await?;
    find_owned_event_for_update(&txn, id, auth_user.user_id).await?;

    favorite::Entity::delete_many()
        .filter(favorite::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    event_tag::Entity::delete_many()
        .filter(event_tag::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    comment::Entity::delete_many()
        .filter(comment::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    donation::Entity::delete_many()
        .filter(donation::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    event::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!("Deleted event");
    Ok(Redirect::to("/"))
}

/// Body limit for the event form routes (8MB), above the picture limit so
/// that oversize pictures reach validation.
pub fn event_form_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(8 * 1024 * 1024)
}

async fn find_event<C: ConnectionTrait>(db: &C, id: i32) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Existence check that skips loading the picture.
pub(crate) async fn ensure_event_exists<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<(), AppError> {
    let found = event::Entity::find_by_id(id)
        .select_only()
        .column(event::Column::Id)
        .into_tuple::<i32>()
        .one(db)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

async fn find_owned_event<C: ConnectionTrait>(
    db: &C,
    id: i32,
    owner_id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .filter(event::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Ownership check that skips loading the picture.
async fn ensure_owned_event<C: ConnectionTrait>(
    db: &C,
    id: i32,
    owner_id: i32,
) -> Result<(), AppError> {
    let found = event::Entity::find_by_id(id)
        .select_only()
        .column(event::Column::Id)
        .filter(event::Column::OwnerId.eq(owner_id))
        .into_tuple::<i32>()
        .one(db)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

async fn find_owned_event_for_update(
    txn: &DatabaseTransaction,
    id: i32,
    owner_id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .filter(event::Column::OwnerId.eq(owner_id))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Tag names per event, sorted by name. Events without tags are absent.
async fn load_tags<C: ConnectionTrait>(
    db: &C,
    event_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<String>>, AppError> {
    let mut tags: HashMap<i32, Vec<String>> = HashMap::new();
    if event_ids.is_empty() {
        return Ok(tags);
    }

    let rows = event_tag::Entity::find()
        .filter(event_tag::Column::EventId.is_in(event_ids))
        .find_also_related(tag::Entity)
        .all(db)
        .await?;
    for (link, found) in rows {
        if let Some(t) = found {
            tags.entry(link.event_id).or_default().push(t.name);
        }
    }
    for names in tags.values_mut() {
        names.sort();
    }

    Ok(tags)
}

/// Make `names` the event's complete tag set, creating missing tags.
async fn replace_event_tags(
    txn: &DatabaseTransaction,
    event_id: i32,
    names: &[String],
) -> Result<(), AppError> {
    event_tag::Entity::delete_many()
        .filter(event_tag::Column::EventId.eq(event_id))
        .exec(txn)
        .await?;
    if names.is_empty() {
        return Ok(());
    }

    for name in names {
        let model = tag::ActiveModel {
            name: Set(name.clone()),
            ..Default::default()
        };
        let result = tag::Entity::insert(model)
            .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
            .exec_without_returning(txn)
            .await;
        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let tag_ids: Vec<i32> = tag::Entity::find()
        .select_only()
        .column(tag::Column::Id)
        .filter(tag::Column::Name.is_in(names.iter().cloned()))
        .into_tuple()
        .all(txn)
        .await?;

    for tag_id in tag_ids {
        let link = event_tag::ActiveModel {
            event_id: Set(event_id),
            tag_id: Set(tag_id),
            ..Default::default()
        };
        event_tag::Entity::insert(link)
            .exec_without_returning(txn)
            .await?;
    }

    tracing::debug!(event_id, count = names.len(), "Replaced event tags");
    Ok(())
}

/// Collect the event form fields from a multipart body. Unknown fields are
/// ignored.
async fn read_event_form(mut multipart: Multipart) -> Result<EventForm, AppError> {
    let mut form = EventForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        let slot = match name.as_str() {
            "picture" => {
                form.picture = read_picture(field).await?;
                continue;
            }
            "performer" => &mut form.performer,
            "pledge" => &mut form.pledge,
            "venue" => &mut form.venue,
            "text" => &mut form.text,
            "show_date" => &mut form.show_date,
            "show_time" => &mut form.show_time,
            "tags" => &mut form.tags,
            _ => continue,
        };
        let text = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))?;
        *slot = Some(text);
    }

    Ok(form)
}

/// Read the `picture` part. Bytes past the size limit are counted but not
/// kept. A part with no filename and no bytes means nothing was chosen.
async fn read_picture(mut field: Field<'_>) -> Result<Option<UploadedPicture>, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let declared_type = field.content_type().map(str::to_owned);

    let mut picture = UploadedPicture::default();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        picture.size += chunk.len() as u64;
        if picture.size <= MAX_PICTURE_SIZE {
            picture.bytes.extend_from_slice(&chunk);
        }
    }

    if file_name.is_empty() && picture.size == 0 {
        return Ok(None);
    }

    picture.content_type = declared_type
        .or_else(|| {
            mime_guess::from_path(&file_name)
                .first()
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(Some(picture))
}
