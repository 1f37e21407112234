//! Output types for event tools
//!
//! These types are used as the return values from event tool methods.
//! They are serialized to JSON strings for the MCP protocol, and can be
//! deserialized in tests for type-safe validation.

use serde::{Deserialize, Serialize};

use super::index::IndexStats;
use super::query::ParsedQuery;
use crate::events::SearchableEvent;

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| r#"{"status":"error","error":"Failed to serialize response"}"#.to_string())
}

/// Output from load_calendar_events
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "status")]
pub enum LoadEventsOutput {
    /// Events fetched and indexed
    #[serde(rename = "success")]
    Success {
        calendar_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        server_query: Option<String>,
        total_events: usize,
        loaded_at: String,
    },
    /// A newer load started before this one finished; its result was dropped
    #[serde(rename = "superseded")]
    Superseded { calendar_id: String, message: String },
    #[serde(rename = "error")]
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
}

impl LoadEventsOutput {
    /// Convert to JSON string for MCP response
    pub fn to_json(&self) -> String {
        to_json(self)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoadEventsOutput::Success { .. })
    }
}

/// Output from search_events
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "status")]
pub enum SearchEventsOutput {
    #[serde(rename = "success")]
    Success {
        query: String,
        parsed: ParsedQuery,
        #[serde(skip_serializing_if = "Option::is_none")]
        calendar_id: Option<String>,
        matched_count: usize,
        unmatched_count: usize,
        matched: Vec<SearchableEvent>,
        #[serde(skip_serializing_if = "Option::is_none")]
        unmatched: Option<Vec<SearchableEvent>>,
    },
    #[serde(rename = "error")]
    Error { error: String },
}

impl SearchEventsOutput {
    /// Convert to JSON string for MCP response
    pub fn to_json(&self) -> String {
        to_json(self)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchEventsOutput::Success { .. })
    }
}

/// Output from list_events
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "status")]
pub enum ListEventsOutput {
    #[serde(rename = "success")]
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        calendar_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        server_query: Option<String>,
        total_events: usize,
        index: IndexStats,
        events: Vec<SearchableEvent>,
    },
}

impl ListEventsOutput {
    /// Convert to JSON string for MCP response
    pub fn to_json(&self) -> String {
        to_json(self)
    }
}

/// Output from get_event
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "status")]
pub enum GetEventOutput {
    #[serde(rename = "success")]
    Success { event: SearchableEvent },
    #[serde(rename = "not_found")]
    NotFound { id: String },
    #[serde(rename = "error")]
    Error { error: String },
}

impl GetEventOutput {
    /// Convert to JSON string for MCP response
    pub fn to_json(&self) -> String {
        to_json(self)
    }
}
