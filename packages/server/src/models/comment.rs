use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::comment;
use crate::error::AppError;

pub const COMMENT_MIN_LEN: usize = 3;
pub const COMMENT_MAX_LEN: usize = 500;

/// Request body for posting a comment on an event.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCommentRequest {
    /// Comment text (3-500 characters after trimming).
    #[schema(example = "Can't wait for this one!")]
    #[serde(default)]
    pub comment: String,
}

/// Returns the trimmed comment text.
pub fn validate_comment(payload: &CreateCommentRequest) -> Result<String, AppError> {
    let text = payload.comment.trim();
    let len = text.chars().count();
    if len == 0 {
        return Err(AppError::field("comment", super::shared::REQUIRED));
    }
    if len < COMMENT_MIN_LEN {
        return Err(AppError::field(
            "comment",
            format!("Ensure this value has at least {COMMENT_MIN_LEN} characters (it has {len})."),
        ));
    }
    if len > COMMENT_MAX_LEN {
        return Err(AppError::field(
            "comment",
            format!("Ensure this value has at most {COMMENT_MAX_LEN} characters (it has {len})."),
        ));
    }
    Ok(text.to_string())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub text: String,
    pub event_id: i32,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<comment::Model> for CommentResponse {
    fn from(m: comment::Model) -> Self {
        Self {
            id: m.id,
            text: m.text,
            event_id: m.event_id,
            owner_id: m.owner_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
