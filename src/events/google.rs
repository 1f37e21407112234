//! Google Calendar API v3 payloads and their mapping to [`CalendarEvent`].

use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;

use super::model::CalendarEvent;

const NO_TITLE: &str = "No Title";
const NO_DESCRIPTION: &str = "No description";
const NOT_AVAILABLE: &str = "N/A";
const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// Response body of `events.list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleCalendarResponse {
    #[serde(default)]
    pub items: Option<Vec<GoogleCalendarEventItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCalendarEventItem {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start: Option<GoogleEventTime>,
    #[serde(default)]
    pub end: Option<GoogleEventTime>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub html_link: Option<String>,
}

/// Either a timed (`dateTime`) or an all-day (`date`) boundary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventTime {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl GoogleCalendarResponse {
    /// Map every item; a response without `items` is an empty calendar.
    pub fn into_events(self) -> Vec<CalendarEvent> {
        self.items
            .unwrap_or_default()
            .into_iter()
            .map(CalendarEvent::from)
            .collect()
    }
}

impl From<GoogleCalendarEventItem> for CalendarEvent {
    fn from(item: GoogleCalendarEventItem) -> Self {
        let location = non_empty(item.location);
        let google_maps_url = location.as_deref().and_then(maps_url);

        CalendarEvent {
            title: non_empty(item.summary).unwrap_or_else(|| NO_TITLE.to_string()),
            start: start_text(item.start.as_ref()),
            end: end_text(item.end.as_ref()),
            description: non_empty(item.description)
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            location,
            google_maps_url,
            detail_link: non_empty(item.html_link),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn start_text(start: Option<&GoogleEventTime>) -> String {
    start
        .and_then(|t| {
            non_empty(t.date_time.clone()).or_else(|| non_empty(t.date.clone()))
        })
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// All-day end dates are exclusive upstream; shift them back one day so the
/// stored end is the last day the event covers.
fn end_text(end: Option<&GoogleEventTime>) -> String {
    let Some(end) = end else {
        return NOT_AVAILABLE.to_string();
    };

    if let Some(date_time) = non_empty(end.date_time.clone()) {
        return date_time;
    }

    match non_empty(end.date.clone()) {
        Some(date) => inclusive_end_date(&date).unwrap_or_else(|| {
            tracing::warn!("Unparsable all-day end date '{}', keeping it as-is", date);
            date
        }),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `2024-06-04` (exclusive) becomes `2024-06-03`.
pub fn inclusive_end_date(exclusive: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(exclusive, "%Y-%m-%d").ok()?;
    date.pred_opt().map(|d| d.format("%Y-%m-%d").to_string())
}

fn maps_url(location: &str) -> Option<String> {
    Url::parse_with_params(MAPS_SEARCH_URL, &[("api", "1"), ("query", location)])
        .ok()
        .map(String::from)
}
