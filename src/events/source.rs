//! HTTP client for the public Google Calendar `events.list` endpoint.

use std::fmt;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use reqwest::{Client, Url};
use zeroize::Zeroizing;

use super::error::{FetchError, FetchResult};
use super::google::GoogleCalendarResponse;
use super::model::CalendarEvent;

/// Default Calendar API root
pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Default number of upcoming events requested per fetch
pub const DEFAULT_MAX_RESULTS: u32 = 100;

/// Upper bound accepted by the Calendar API for `maxResults`
pub const MAX_RESULTS_LIMIT: u32 = 2500;

/// Default HTTP timeout for a single fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct GoogleCalendarConfig {
    pub api_key: Option<Zeroizing<String>>,
    pub base_url: String,
    pub max_results: u32,
    pub timeout: Duration,
}

impl Default for GoogleCalendarConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_CALENDAR_API_BASE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl fmt::Debug for GoogleCalendarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleCalendarConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("max_results", &self.max_results)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Parameters of one fetch: which calendar, and an optional server-side
/// free-text filter forwarded as `q`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub calendar_id: String,
    pub query: Option<String>,
}

impl FetchRequest {
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            query: None,
        }
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http: Client,
    config: GoogleCalendarConfig,
}

impl GoogleCalendarClient {
    pub fn new(config: GoogleCalendarConfig) -> FetchResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GoogleCalendarConfig {
        &self.config
    }

    /// Fetch upcoming events of a public calendar, mapped for display.
    pub async fn fetch_events(&self, request: &FetchRequest) -> FetchResult<Vec<CalendarEvent>> {
        let url = self.events_url(request)?;

        tracing::info!(
            calendar_id = %request.calendar_id,
            query = ?request.query,
            "Fetching calendar events"
        );

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                calendar_id = %request.calendar_id,
                status = status.as_u16(),
                "Calendar API request failed"
            );
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        let payload: GoogleCalendarResponse = serde_json::from_str(&body)?;
        let events = payload.into_events();

        tracing::info!(
            calendar_id = %request.calendar_id,
            count = events.len(),
            "Fetched calendar events"
        );
        Ok(events)
    }

    /// Build the `events.list` URL for a request, including the API key.
    pub fn events_url(&self, request: &FetchRequest) -> FetchResult<Url> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(FetchError::NotConfigured)?;

        let calendar_id = request.calendar_id.trim();
        if calendar_id.is_empty() {
            return Err(FetchError::InvalidArgument(
                "a calendar id is required".to_string(),
            ));
        }

        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| FetchError::Url(format!("{}: {e}", self.config.base_url)))?;

        url.path_segments_mut()
            .map_err(|_| FetchError::Url(format!("{} cannot be a base", self.config.base_url)))?
            .pop_if_empty()
            .push("calendars")
            .push(calendar_id)
            .push("events");

        let time_min = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let max_results = self.config.max_results.clamp(1, MAX_RESULTS_LIMIT);

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("key", api_key)
                .append_pair("singleEvents", "true")
                .append_pair("orderBy", "startTime")
                .append_pair("timeMin", &time_min)
                .append_pair("maxResults", &max_results.to_string());
            if let Some(query) = request.query.as_deref() {
                pairs.append_pair("q", query);
            }
        }

        Ok(url)
    }
}

/// Pull `error.message` out of a Google error body, falling back to the raw text.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_key(key: Option<&str>) -> GoogleCalendarClient {
        GoogleCalendarClient::new(GoogleCalendarConfig {
            api_key: key.map(|k| Zeroizing::new(k.to_string())),
            ..Default::default()
        })
        .unwrap()
    }

    fn query_value(url: &Url, name: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_events_url_parameters() {
        let client = client_with_key(Some("secret"));
        let request = FetchRequest::new("team@group.calendar.google.com")
            .with_query(Some("offsite".to_string()));

        let url = client.events_url(&request).unwrap();

        assert_eq!(
            url.path(),
            "/calendar/v3/calendars/team@group.calendar.google.com/events"
        );
        assert_eq!(query_value(&url, "key").as_deref(), Some("secret"));
        assert_eq!(query_value(&url, "singleEvents").as_deref(), Some("true"));
        assert_eq!(query_value(&url, "orderBy").as_deref(), Some("startTime"));
        assert_eq!(query_value(&url, "maxResults").as_deref(), Some("100"));
        assert_eq!(query_value(&url, "q").as_deref(), Some("offsite"));
        assert!(query_value(&url, "timeMin").is_some());
    }

    #[test]
    fn test_calendar_id_is_percent_encoded() {
        let client = client_with_key(Some("secret"));
        let url = client
            .events_url(&FetchRequest::new("en.usa#holiday@group.v.calendar.google.com"))
            .unwrap();
        assert!(url.path().contains("en.usa%23holiday@group.v.calendar.google.com"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_blank_server_query_is_omitted() {
        let client = client_with_key(Some("secret"));
        let request = FetchRequest::new("cal").with_query(Some("   ".to_string()));
        let url = client.events_url(&request).unwrap();
        assert_eq!(query_value(&url, "q"), None);
    }

    #[test]
    fn test_missing_api_key() {
        let client = client_with_key(None);
        let err = client.events_url(&FetchRequest::new("cal")).unwrap_err();
        assert!(matches!(err, FetchError::NotConfigured));
        assert_eq!(err.kind(), "failed-precondition");
    }

    #[test]
    fn test_empty_calendar_id() {
        let client = client_with_key(Some("secret"));
        let err = client.events_url(&FetchRequest::new("  ")).unwrap_err();
        assert!(matches!(err, FetchError::InvalidArgument(_)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = client_with_key(Some("super-secret-key"));
        let debug = format!("{:?}", client.config());
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_upstream_message_extraction() {
        let body = r#"{"error":{"code":404,"message":"Not Found"}}"#;
        assert_eq!(upstream_message(body), "Not Found");
        assert_eq!(upstream_message("  bad gateway "), "bad gateway");
    }
}
