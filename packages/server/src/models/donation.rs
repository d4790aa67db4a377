use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::shared::{REQUIRED, invalid_choice};
use crate::entity::donation;
use crate::error::AppError;

const DONATION_STEP: i64 = 25;
const DONATION_STEPS: i64 = 19;

/// The amounts a donation may take: 25, 50, ..., 475.
pub fn donation_choices() -> Vec<Decimal> {
    (1..=DONATION_STEPS)
        .map(|n| Decimal::from(n * DONATION_STEP))
        .collect()
}

/// Request body for pledging a donation to an event.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateDonationRequest {
    /// One of 25, 50, ..., 475. Accepts a number or a numeric string.
    #[schema(value_type = Option<String>, example = "25")]
    #[serde(default)]
    pub donation: Option<Decimal>,
}

pub fn validate_donation(payload: &CreateDonationRequest) -> Result<Decimal, AppError> {
    let Some(amount) = payload.donation else {
        return Err(AppError::field("donation", REQUIRED));
    };
    // Decimal equality is numeric, so 25 and 25.00 both match.
    if donation_choices().contains(&amount) {
        Ok(amount)
    } else {
        Err(AppError::field(
            "donation",
            invalid_choice(&amount.to_string()),
        ))
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DonationResponse {
    pub id: i32,
    #[schema(value_type = String, example = "25.00")]
    pub amount: Decimal,
    pub event_id: i32,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<donation::Model> for DonationResponse {
    fn from(m: donation::Model) -> Self {
        Self {
            id: m.id,
            amount: m.amount,
            event_id: m.event_id,
            owner_id: m.owner_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// The empty donation form shown on an event page.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DonationFormResponse {
    #[schema(value_type = Vec<String>)]
    pub choices: Vec<Decimal>,
}

impl Default for DonationFormResponse {
    fn default() -> Self {
        Self {
            choices: donation_choices(),
        }
    }
}
