pub mod auth;
pub mod comment;
pub mod donation;
pub mod event;
pub mod shared;
