// File: ./src/client/mod.rs
pub mod auth;
pub mod core;
pub mod manager;

pub use crate::client::core::{GOOGLE_CALENDAR_BASE, GoogleCalendarClient, GoogleProvider};
