use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A free-form label shared by any number of events. Names are matched
/// exactly, so "Jazz" and "jazz" are different tags.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique, column_type = "String(StringLen::N(100))")]
    pub name: String,

    #[sea_orm(has_many)]
    pub event_tags: HasMany<super::event_tag::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
