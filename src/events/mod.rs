//! # Events Module
//!
//! Fetching calendar events from the Google Calendar API and turning them
//! into the display-ready records the search engine indexes.
//!
//! ## Key Components
//!
//! - [`model`] - `CalendarEvent` and `SearchableEvent`
//! - [`google`] - Calendar API payloads and the item mapping
//! - [`source`] - HTTP client for `events.list`
//! - [`error`] - Typed fetch errors

pub mod error;
pub mod google;
pub mod model;
pub mod source;

pub use error::{FetchError, FetchResult};
pub use model::{CalendarEvent, SearchableEvent};
pub use source::{FetchRequest, GoogleCalendarClient, GoogleCalendarConfig};
