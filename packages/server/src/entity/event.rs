use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};

/// The fixed set of venues an event can be booked at.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(200))")]
pub enum Venue {
    #[sea_orm(string_value = "Babeville")]
    #[serde(rename = "Babeville")]
    Babeville,
    #[sea_orm(string_value = "Town Ballroom")]
    #[serde(rename = "Town Ballroom")]
    TownBallroom,
    #[sea_orm(string_value = "Tralf Music Hall")]
    #[serde(rename = "Tralf Music Hall")]
    TralfMusicHall,
    #[sea_orm(string_value = "Iron Works")]
    #[serde(rename = "Iron Works")]
    IronWorks,
    #[sea_orm(string_value = "The Icon")]
    #[serde(rename = "The Icon")]
    TheIcon,
    #[sea_orm(string_value = "Mohawk Place")]
    #[serde(rename = "Mohawk Place")]
    MohawkPlace,
    #[sea_orm(string_value = "The Cave")]
    #[serde(rename = "The Cave")]
    TheCave,
    #[sea_orm(string_value = "Rec Room")]
    #[serde(rename = "Rec Room")]
    RecRoom,
    #[sea_orm(string_value = "Riviera Theater")]
    #[serde(rename = "Riviera Theater")]
    RivieraTheater,
    #[sea_orm(string_value = "Keybank Center")]
    #[serde(rename = "Keybank Center")]
    KeybankCenter,
}

impl Venue {
    /// Display name, identical to the stored value.
    pub fn label(self) -> &'static str {
        match self {
            Venue::Babeville => "Babeville",
            Venue::TownBallroom => "Town Ballroom",
            Venue::TralfMusicHall => "Tralf Music Hall",
            Venue::IronWorks => "Iron Works",
            Venue::TheIcon => "The Icon",
            Venue::MohawkPlace => "Mohawk Place",
            Venue::TheCave => "The Cave",
            Venue::RecRoom => "Rec Room",
            Venue::RivieraTheater => "Riviera Theater",
            Venue::KeybankCenter => "Keybank Center",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::iter().find(|v| v.label() == label)
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub performer: String,
    /// Fundraising goal.
    #[sea_orm(column_type = "Decimal(Some((7, 2)))")]
    pub pledge: Option<Decimal>,
    pub show_date: Option<Date>,
    /// One of the hourly slot labels, e.g. "7:00PM".
    pub show_time: Option<String>,
    pub venue: Venue,
    #[sea_orm(column_type = "Text")]
    pub text: String,

    pub owner_id: i32,
    #[sea_orm(belongs_to, from = "owner_id", to = "id")]
    pub owner: HasOne<super::user::Entity>,

    /// Raw image bytes, at most 2 MiB.
    #[serde(skip)]
    pub picture: Option<Vec<u8>>,
    /// MIME type of `picture`.
    pub content_type: Option<String>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,
    #[sea_orm(has_many)]
    pub donations: HasMany<super::donation::Entity>,
    #[sea_orm(has_many)]
    pub favorites: HasMany<super::favorite::Entity>,
    #[sea_orm(has_many)]
    pub event_tags: HasMany<super::event_tag::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
