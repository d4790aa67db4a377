pub mod hash;
pub mod humanize;
pub mod jwt;
