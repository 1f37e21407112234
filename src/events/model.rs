//! Display-ready event types shared by the fetch layer and the search engine.

use serde::{Deserialize, Serialize};

/// A calendar entry as shown to the user.
///
/// Produced by mapping a provider item; every field except the optional ones
/// already carries its display fallback. `end` is always inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub title: String,
    pub start: String,
    pub end: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_maps_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_link: Option<String>,
}

impl CalendarEvent {
    /// Location text, or the empty string when the event has none.
    pub fn location_text(&self) -> &str {
        self.location.as_deref().unwrap_or_default()
    }
}

/// A [`CalendarEvent`] keyed for indexing.
///
/// The id is the event's position in the batch it was loaded with, so it is
/// unique within one batch and meaningless across fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchableEvent {
    pub id: String,
    #[serde(flatten)]
    pub event: CalendarEvent,
}

impl SearchableEvent {
    pub fn new(id: impl Into<String>, event: CalendarEvent) -> Self {
        Self {
            id: id.into(),
            event,
        }
    }

    /// Assign load-order ids to a freshly fetched batch.
    pub fn from_batch(events: Vec<CalendarEvent>) -> Vec<Self> {
        events
            .into_iter()
            .enumerate()
            .map(|(index, event)| Self::new(index.to_string(), event))
            .collect()
    }

    /// The text fields literal phrases and index terms are matched against.
    pub fn searchable_fields(&self) -> [&str; 4] {
        [
            &self.event.title,
            self.event.location_text(),
            &self.event.start,
            &self.event.end,
        ]
    }
}
