pub mod comment;
pub mod donation;
pub mod event;
pub mod event_tag;
pub mod favorite;
pub mod tag;
pub mod user;
