use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::{comment, donation, event, favorite};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("events_server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Ensure the secondary indexes used by listing queries exist.
///
/// Schema sync only creates what the entities declare, so composite
/// indexes are created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Search results: ORDER BY show_time
    let show_time = Index::create()
        .if_not_exists()
        .name("idx_event_show_time")
        .table(event::Entity)
        .col(event::Column::ShowTime)
        .to_owned();

    // Detail page: comments and donations of one event, newest first
    let comments = Index::create()
        .if_not_exists()
        .name("idx_comment_event_updated")
        .table(comment::Entity)
        .col(comment::Column::EventId)
        .col(comment::Column::UpdatedAt)
        .to_owned();

    let donations = Index::create()
        .if_not_exists()
        .name("idx_donation_event_updated")
        .table(donation::Entity)
        .col(donation::Column::EventId)
        .col(donation::Column::UpdatedAt)
        .to_owned();

    // Listing: the caller's favorites. The primary key leads with event_id.
    let favorites = Index::create()
        .if_not_exists()
        .name("idx_favorite_user")
        .table(favorite::Entity)
        .col(favorite::Column::UserId)
        .to_owned();

    for (name, stmt) in [
        ("idx_event_show_time", show_time),
        ("idx_comment_event_updated", comments),
        ("idx_donation_event_updated", donations),
        ("idx_favorite_user", favorites),
    ] {
        match db.execute(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
