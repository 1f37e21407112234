use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use chrono::Utc;
use rmcp::schemars;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::config::SearchConfig;
use super::orchestrator::SearchOrchestrator;
use super::outputs::{GetEventOutput, ListEventsOutput, LoadEventsOutput, SearchEventsOutput};
use crate::events::{FetchRequest, GoogleCalendarClient};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoadCalendarEventsParams {
    #[schemars(description = "The Google Calendar ID (e.g., 'en.usa#holiday@group.v.calendar.google.com')")]
    pub calendar_id: String,
    #[schemars(description = "Optional free-text filter applied by the Calendar API before events are fetched")]
    pub server_query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchEventsParams {
    #[schemars(
        description = "The search query. Unquoted words match fuzzily and by prefix; \"quoted phrases\" must appear exactly (case-insensitive) in the title, location, start or end"
    )]
    pub query: String,
    #[schemars(description = "Include the events that did not match (default: true)")]
    pub include_unmatched: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetEventParams {
    #[schemars(description = "The event ID from list_events or search_events results")]
    pub id: String,
}

/// Calendar currently backing the index
#[derive(Debug, Clone)]
struct LoadedCalendar {
    calendar_id: String,
    server_query: Option<String>,
}

#[derive(Debug)]
struct SessionState {
    orchestrator: SearchOrchestrator,
    calendar: Option<LoadedCalendar>,
    /// Ticket of the load that produced the current batch (0 before any load)
    loaded_ticket: u64,
}

#[derive(Debug, Clone)]
pub struct SearchTools {
    client: GoogleCalendarClient,
    state: Arc<Mutex<SessionState>>,
    next_ticket: Arc<AtomicU64>,
}

impl SearchTools {
    pub fn new(client: GoogleCalendarClient, config: &SearchConfig) -> Result<Self> {
        let state = SessionState {
            orchestrator: SearchOrchestrator::new(config)?,
            calendar: None,
            loaded_ticket: 0,
        };

        Ok(Self {
            client,
            state: Arc::new(Mutex::new(state)),
            next_ticket: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Fetch a calendar and replace the indexed batch with it
    pub async fn load_calendar_events(&self, params: LoadCalendarEventsParams) -> String {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let request = FetchRequest::new(params.calendar_id.trim())
            .with_query(params.server_query.clone());

        // Fetch without holding the lock so searches keep working meanwhile
        let events = match self.client.fetch_events(&request).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Failed to load calendar {}: {}", request.calendar_id, e);
                return LoadEventsOutput::Error {
                    error: e.to_string(),
                    kind: Some(e.kind().to_string()),
                }
                .to_json();
            }
        };

        let mut state = self.state.lock().await;

        // Only a newer load that actually committed wins; failed ones never do
        if state.loaded_ticket > ticket {
            tracing::info!(
                "Dropping events for {}: a newer load already replaced them",
                request.calendar_id
            );
            return LoadEventsOutput::Superseded {
                calendar_id: request.calendar_id,
                message: "A newer load_calendar_events call replaced this one".to_string(),
            }
            .to_json();
        }

        let total_events = match state.orchestrator.load(events) {
            Ok(batch) => batch.len(),
            Err(e) => {
                tracing::error!("Failed to index calendar {}: {:#}", request.calendar_id, e);
                return LoadEventsOutput::Error {
                    error: format!("{e:#}"),
                    kind: Some("internal".to_string()),
                }
                .to_json();
            }
        };

        state.loaded_ticket = ticket;
        state.calendar = Some(LoadedCalendar {
            calendar_id: request.calendar_id.clone(),
            server_query: request.query.clone(),
        });

        LoadEventsOutput::Success {
            calendar_id: request.calendar_id,
            server_query: request.query,
            total_events,
            loaded_at: Utc::now().to_rfc3339(),
        }
        .to_json()
    }

    /// Partition the loaded events for a query
    pub async fn search_events(&self, params: SearchEventsParams) -> String {
        let state = self.state.lock().await;

        match state.orchestrator.search(&params.query) {
            Ok(partition) => {
                let parsed = state.orchestrator.parse(&params.query);
                let include_unmatched = params.include_unmatched.unwrap_or(true);

                SearchEventsOutput::Success {
                    query: params.query,
                    parsed,
                    calendar_id: state.calendar.as_ref().map(|c| c.calendar_id.clone()),
                    matched_count: partition.matched.len(),
                    unmatched_count: partition.unmatched.len(),
                    matched: partition.matched,
                    unmatched: include_unmatched.then_some(partition.unmatched),
                }
                .to_json()
            }
            Err(e) => SearchEventsOutput::Error {
                error: format!("Search failed: {e:#}"),
            }
            .to_json(),
        }
    }

    /// List every loaded event in load order
    pub async fn list_events(&self) -> String {
        let state = self.state.lock().await;
        let events = state.orchestrator.events().to_vec();

        ListEventsOutput::Success {
            calendar_id: state.calendar.as_ref().map(|c| c.calendar_id.clone()),
            server_query: state.calendar.as_ref().and_then(|c| c.server_query.clone()),
            total_events: events.len(),
            index: state.orchestrator.index().stats(),
            events,
        }
        .to_json()
    }

    /// Fetch a single loaded event by id
    pub async fn get_event(&self, params: GetEventParams) -> String {
        let state = self.state.lock().await;

        match state.orchestrator.get(params.id.trim()) {
            Ok(Some(event)) => GetEventOutput::Success { event }.to_json(),
            Ok(None) => GetEventOutput::NotFound { id: params.id }.to_json(),
            Err(e) => GetEventOutput::Error {
                error: format!("{e:#}"),
            }
            .to_json(),
        }
    }
}
