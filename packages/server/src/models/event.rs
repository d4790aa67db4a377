use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{FromQueryResult, Iterable};
use serde::{Deserialize, Serialize};

use super::comment::CommentResponse;
use super::donation::{DonationFormResponse, DonationResponse};
use super::shared::{FormErrors, invalid_choice, optional, required};
use crate::entity::event::{self, Venue};
use crate::error::AppError;
use crate::utils::humanize::natural_size;

/// Largest picture accepted on create/update.
pub const MAX_PICTURE_SIZE: u64 = 2 * 1024 * 1024;

/// Cap on search results.
pub const SEARCH_LIMIT: u64 = 10;

pub const PERFORMER_MIN_LEN: usize = 2;
pub const PERFORMER_MAX_LEN: usize = 200;

/// Hourly show slots offered by the form.
pub const SHOW_TIMES: [&str; 9] = [
    "12:00PM", "1:00PM", "2:00PM", "3:00PM", "4:00PM", "5:00PM", "6:00PM", "7:00PM", "8:00PM",
];

pub const TAG_MAX_LEN: usize = 100;

/// `decimal(7, 2)`: five whole digits, two decimal places.
const PLEDGE_MAX_WHOLE: i64 = 100_000;
const PLEDGE_MAX_SCALE: u32 = 2;

/// A file received in the `picture` part of a multipart submission.
///
/// `bytes` stops growing once the limit is crossed; `size` keeps counting so
/// the form can still report the real upload size.
#[derive(Debug, Default)]
pub struct UploadedPicture {
    pub bytes: Vec<u8>,
    pub size: u64,
    pub content_type: String,
}

/// Raw fields of an event submission, exactly as received.
#[derive(Debug, Default)]
pub struct EventForm {
    pub performer: Option<String>,
    pub pledge: Option<String>,
    pub venue: Option<String>,
    pub text: Option<String>,
    pub show_date: Option<String>,
    pub show_time: Option<String>,
    /// Comma separated, or space separated when there is no comma.
    pub tags: Option<String>,
    pub picture: Option<UploadedPicture>,
}

/// An event submission that passed validation.
#[derive(Debug)]
pub struct ValidEvent {
    pub performer: String,
    pub pledge: Option<Decimal>,
    pub venue: Venue,
    pub text: String,
    pub show_date: Option<NaiveDate>,
    pub show_time: Option<String>,
    /// Distinct and sorted. Replaces the event's whole tag set.
    pub tags: Vec<String>,
    /// `(bytes, content type)` of a freshly uploaded picture.
    pub picture: Option<(Vec<u8>, String)>,
}

/// Check every field of an event submission. `today` bounds the show date.
pub fn validate_event_form(form: EventForm, today: NaiveDate) -> Result<ValidEvent, AppError> {
    let mut errors = FormErrors::default();

    let performer = required(&mut errors, "performer", form.performer.as_deref());
    if let Some(ref p) = performer {
        let len = p.chars().count();
        if len < PERFORMER_MIN_LEN {
            errors.add(
                "performer",
                format!("Performer must be at least {PERFORMER_MIN_LEN} characters"),
            );
        } else if len > PERFORMER_MAX_LEN {
            errors.add(
                "performer",
                format!("Ensure this value has at most {PERFORMER_MAX_LEN} characters (it has {len})."),
            );
        }
    }

    let pledge = optional(form.pledge.as_deref()).and_then(|raw| {
        parse_pledge(raw)
            .map_err(|msg| errors.add("pledge", msg))
            .ok()
    });

    let venue = required(&mut errors, "venue", form.venue.as_deref()).and_then(|raw| {
        let venue = Venue::from_label(&raw);
        if venue.is_none() {
            errors.add("venue", invalid_choice(&raw));
        }
        venue
    });

    let text = required(&mut errors, "text", form.text.as_deref());

    let show_date = optional(form.show_date.as_deref()).and_then(|raw| {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) if date < today => {
                errors.add(
                    "show_date",
                    format!("Ensure this value is greater than or equal to {today}."),
                );
                None
            }
            Ok(date) => Some(date),
            Err(_) => {
                errors.add("show_date", "Enter a valid date.");
                None
            }
        }
    });

    let show_time = optional(form.show_time.as_deref()).and_then(|raw| {
        if SHOW_TIMES.contains(&raw) {
            Some(raw.to_string())
        } else {
            errors.add("show_time", invalid_choice(raw));
            None
        }
    });

    let tags = parse_tags(form.tags.as_deref().unwrap_or_default());
    if let Some(long) = tags.iter().find(|t| t.chars().count() > TAG_MAX_LEN) {
        errors.add(
            "tags",
            format!("Ensure each tag has at most {TAG_MAX_LEN} characters ({long:?} is too long)."),
        );
    }

    let picture = form.picture.and_then(|pic| {
        if pic.size == 0 {
            errors.add("picture", "The submitted file is empty.");
            None
        } else if pic.size > MAX_PICTURE_SIZE {
            errors.add(
                "picture",
                format!("File must be < {}", natural_size(MAX_PICTURE_SIZE)),
            );
            None
        } else {
            Some((pic.bytes, pic.content_type))
        }
    });

    // A missing required value has always been recorded in `errors`.
    match (performer, venue, text) {
        (Some(performer), Some(venue), Some(text)) => errors.finish(ValidEvent {
            performer,
            pledge,
            venue,
            text,
            show_date,
            show_time,
            tags,
            picture,
        }),
        _ => Err(errors.into_error()),
    }
}

/// Split a tag input into distinct, sorted names. Commas separate tags when
/// any are present, otherwise whitespace does, so "rock, indie pop" is two
/// tags and "rock indie" is also two.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let parts: Vec<&str> = if raw.contains(',') {
        raw.split(',').collect()
    } else {
        raw.split_whitespace().collect()
    };

    let mut tags: Vec<String> = parts
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

fn parse_pledge(raw: &str) -> Result<Decimal, String> {
    let value = Decimal::from_str(raw).map_err(|_| "Enter a number.".to_string())?;
    if value.scale() > PLEDGE_MAX_SCALE {
        return Err(format!(
            "Ensure that there are no more than {PLEDGE_MAX_SCALE} decimal places."
        ));
    }
    if value.trunc().abs() >= Decimal::from(PLEDGE_MAX_WHOLE) {
        return Err("Ensure that there are no more than 5 digits before the decimal point.".into());
    }
    Ok(value)
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    /// Case-insensitive performer substring.
    pub search: Option<String>,
}

/// Full event as shown on the detail page. Picture bytes are served
/// separately by `picture_url`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Test Band")]
    pub performer: String,
    #[schema(value_type = Option<String>, example = "1500.00")]
    pub pledge: Option<Decimal>,
    pub venue: Venue,
    pub text: String,
    pub show_date: Option<NaiveDate>,
    #[schema(example = "7:00PM")]
    pub show_time: Option<String>,
    pub owner_id: i32,
    #[schema(example = json!(["indie", "rock"]))]
    pub tags: Vec<String>,
    pub has_picture: bool,
    #[schema(example = "/event_picture/1")]
    pub picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn picture_url(id: i32) -> String {
    format!("/event_picture/{id}")
}

impl EventResponse {
    pub fn new(m: event::Model, tags: Vec<String>) -> Self {
        let has_picture = m.picture.is_some();
        Self {
            tags,
            has_picture,
            picture_url: has_picture.then(|| picture_url(m.id)),
            id: m.id,
            performer: m.performer,
            pledge: m.pledge,
            venue: m.venue,
            text: m.text,
            show_date: m.show_date,
            show_time: m.show_time,
            owner_id: m.owner_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Listing row. Selected without the picture blob; a stored content type
/// marks a stored picture.
#[derive(FromQueryResult)]
pub struct EventListRow {
    pub id: i32,
    pub performer: String,
    pub pledge: Option<Decimal>,
    pub venue: Venue,
    pub show_date: Option<NaiveDate>,
    pub show_time: Option<String>,
    pub owner_id: i32,
    pub content_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventSummary {
    pub id: i32,
    pub performer: String,
    #[schema(value_type = Option<String>)]
    pub pledge: Option<Decimal>,
    pub venue: Venue,
    pub show_date: Option<NaiveDate>,
    pub show_time: Option<String>,
    pub owner_id: i32,
    pub tags: Vec<String>,
    pub has_picture: bool,
    pub picture_url: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Relative age of the last update, e.g. "5 minutes ago".
    #[schema(example = "5 minutes ago")]
    pub natural_updated: String,
}

impl EventSummary {
    pub fn from_row(row: EventListRow, tags: Vec<String>, natural_updated: String) -> Self {
        let has_picture = row.content_type.is_some();
        Self {
            tags,
            has_picture,
            picture_url: has_picture.then(|| picture_url(row.id)),
            id: row.id,
            performer: row.performer,
            pledge: row.pledge,
            venue: row.venue,
            show_date: row.show_date,
            show_time: row.show_time,
            owner_id: row.owner_id,
            updated_at: row.updated_at,
            natural_updated,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub events: Vec<EventSummary>,
    /// IDs of events the caller has favorited. Empty for anonymous callers
    /// and for searches.
    pub favorites: Vec<i32>,
    pub search: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventDetailResponse {
    pub event: EventResponse,
    /// Newest first.
    pub donations: Vec<DonationResponse>,
    /// Newest first.
    pub comments: Vec<CommentResponse>,
    pub donation_form: DonationFormResponse,
}

/// Current values of an event, used to prefill the edit form.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EventFormValues {
    pub performer: String,
    #[schema(value_type = Option<String>)]
    pub pledge: Option<Decimal>,
    pub venue: Venue,
    pub text: String,
    pub show_date: Option<NaiveDate>,
    pub show_time: Option<String>,
    /// Current tags joined with ", ", ready to submit back unchanged.
    #[schema(example = "indie, rock")]
    pub tags: String,
    pub has_picture: bool,
}

impl EventFormValues {
    pub fn new(m: event::Model, tags: &[String]) -> Self {
        Self {
            tags: tags.join(", "),
            has_picture: m.picture.is_some(),
            performer: m.performer,
            pledge: m.pledge,
            venue: m.venue,
            text: m.text,
            show_date: m.show_date,
            show_time: m.show_time,
        }
    }
}

/// Everything a client needs to render the event form.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EventFormResponse {
    pub venues: Vec<Venue>,
    pub show_times: Vec<String>,
    #[schema(example = 2097152)]
    pub max_upload_size: u64,
    #[schema(example = "2.0MB")]
    pub max_upload_size_text: String,
    /// Present when editing an existing event.
    pub initial: Option<EventFormValues>,
}

impl EventFormResponse {
    pub fn new(initial: Option<EventFormValues>) -> Self {
        Self {
            venues: Venue::iter().collect(),
            show_times: SHOW_TIMES.iter().map(|t| t.to_string()).collect(),
            max_upload_size: MAX_PICTURE_SIZE,
            max_upload_size_text: natural_size(MAX_PICTURE_SIZE),
            initial,
        }
    }
}
