//! Integration tests for calendar-events-mcp
//!
//! These tests run the MCP tools end to end against a mocked Google Calendar
//! API: fetching, indexing and searching a calendar.

use std::time::Duration;

use anyhow::Result;
use calendar_events_mcp::CalendarEventsService;
use calendar_events_mcp::events::{GoogleCalendarClient, GoogleCalendarConfig};
use calendar_events_mcp::search::SearchConfig;
use calendar_events_mcp::search::outputs::{
    GetEventOutput, ListEventsOutput, LoadEventsOutput, SearchEventsOutput,
};
use calendar_events_mcp::search::tools::{
    GetEventParams, LoadCalendarEventsParams, SearchEventsParams,
};
use rmcp::handler::server::wrapper::Parameters;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeroize::Zeroizing;

const API_KEY: &str = "test-api-key";
const CALENDAR_ID: &str = "team-calendar";
const EVENTS_PATH: &str = "/calendars/team-calendar/events";

fn events_fixture() -> Value {
    json!({
        "kind": "calendar#events",
        "items": [
            {
                "summary": "Team Offsite",
                "location": "Lake Tahoe",
                "description": "Two days of planning",
                "htmlLink": "https://calendar.google.com/event?eid=offsite",
                "start": { "date": "2030-06-03" },
                "end": { "date": "2030-06-05" }
            },
            {
                "summary": "Offsite planning",
                "location": "Office",
                "start": { "dateTime": "2030-05-20T10:00:00-07:00" },
                "end": { "dateTime": "2030-05-20T11:00:00-07:00" }
            },
            {
                "summary": "Quarterly Review",
                "start": { "dateTime": "2030-07-01T09:00:00-07:00" },
                "end": { "dateTime": "2030-07-01T10:30:00-07:00" }
            }
        ]
    })
}

fn client_for(server: &MockServer, api_key: Option<&str>) -> Result<GoogleCalendarClient> {
    let config = GoogleCalendarConfig {
        api_key: api_key.map(|k| Zeroizing::new(k.to_string())),
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    };
    Ok(GoogleCalendarClient::new(config)?)
}

fn service_for(server: &MockServer) -> Result<CalendarEventsService> {
    CalendarEventsService::new(client_for(server, Some(API_KEY))?, &SearchConfig::default())
}

async fn mount_events(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("key", API_KEY))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn load(service: &CalendarEventsService, calendar_id: &str) -> Result<LoadEventsOutput> {
    let response = service
        .load_calendar_events(Parameters(LoadCalendarEventsParams {
            calendar_id: calendar_id.to_string(),
            server_query: None,
        }))
        .await;
    parse(&response)
}

async fn search(service: &CalendarEventsService, query: &str) -> Result<SearchEventsOutput> {
    let response = service
        .search_events(Parameters(SearchEventsParams {
            query: query.to_string(),
            include_unmatched: None,
        }))
        .await;
    parse(&response)
}

// Response validation helper
fn parse<T: serde::de::DeserializeOwned>(response: &str) -> Result<T> {
    serde_json::from_str(response).map_err(|e| {
        anyhow::anyhow!("Failed to parse response: {}\nResponse: {}", e, response)
    })
}

fn titles(events: &[calendar_events_mcp::events::SearchableEvent]) -> Vec<&str> {
    events.iter().map(|e| e.event.title.as_str()).collect()
}

#[tokio::test]
async fn test_load_calendar_events() -> Result<()> {
    let server = MockServer::start().await;
    mount_events(&server, events_fixture()).await;
    let service = service_for(&server)?;

    match load(&service, CALENDAR_ID).await? {
        LoadEventsOutput::Success {
            calendar_id,
            server_query,
            total_events,
            ..
        } => {
            assert_eq!(calendar_id, CALENDAR_ID);
            assert_eq!(server_query, None);
            assert_eq!(total_events, 3);
        }
        other => panic!("Expected success, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_list_events_maps_fields() -> Result<()> {
    let server = MockServer::start().await;
    mount_events(&server, events_fixture()).await;
    let service = service_for(&server)?;
    load(&service, CALENDAR_ID).await?;

    let ListEventsOutput::Success {
        calendar_id,
        total_events,
        index,
        events,
        ..
    } = parse(&service.list_events().await)?;

    assert_eq!(calendar_id.as_deref(), Some(CALENDAR_ID));
    assert_eq!(total_events, 3);
    assert_eq!(index.total_docs, 3);
    assert_eq!(
        titles(&events),
        vec!["Team Offsite", "Offsite planning", "Quarterly Review"]
    );

    let offsite = &events[0];
    assert_eq!(offsite.id, "0");
    assert_eq!(offsite.event.start, "2030-06-03");
    // All-day end dates are exclusive upstream
    assert_eq!(offsite.event.end, "2030-06-04");
    assert_eq!(
        offsite.event.google_maps_url.as_deref(),
        Some("https://www.google.com/maps/search/?api=1&query=Lake+Tahoe")
    );
    assert_eq!(
        offsite.event.detail_link.as_deref(),
        Some("https://calendar.google.com/event?eid=offsite")
    );

    let review = &events[2];
    assert_eq!(review.event.description, "No description");
    assert_eq!(review.event.location, None);
    assert_eq!(review.event.google_maps_url, None);

    Ok(())
}

#[tokio::test]
async fn test_search_with_literal_phrase() -> Result<()> {
    let server = MockServer::start().await;
    mount_events(&server, events_fixture()).await;
    let service = service_for(&server)?;
    load(&service, CALENDAR_ID).await?;

    match search(&service, "offsite \"lake tahoe\"").await? {
        SearchEventsOutput::Success {
            parsed,
            matched,
            unmatched,
            matched_count,
            unmatched_count,
            ..
        } => {
            assert_eq!(parsed.literal_phrases, vec!["lake tahoe"]);
            assert_eq!(parsed.residual_term, "offsite");
            assert_eq!(titles(&matched), vec!["Team Offsite"]);
            let unmatched = unmatched.unwrap_or_default();
            assert_eq!(titles(&unmatched), vec!["Offsite planning", "Quarterly Review"]);
            assert_eq!(matched_count, 1);
            assert_eq!(unmatched_count, 2);
        }
        other => panic!("Expected success, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_search_fuzzy_and_prefix() -> Result<()> {
    let server = MockServer::start().await;
    mount_events(&server, events_fixture()).await;
    let service = service_for(&server)?;
    load(&service, CALENDAR_ID).await?;

    // Prefix of "offsite", matched in both titles, kept in load order
    let SearchEventsOutput::Success { matched, .. } = search(&service, "offs").await? else {
        panic!("Expected success");
    };
    assert_eq!(titles(&matched), vec!["Team Offsite", "Offsite planning"]);

    // One typo in "quarterly"
    let SearchEventsOutput::Success { matched, .. } = search(&service, "quartely").await? else {
        panic!("Expected success");
    };
    assert_eq!(titles(&matched), vec!["Quarterly Review"]);

    Ok(())
}

#[tokio::test]
async fn test_empty_query_matches_everything() -> Result<()> {
    let server = MockServer::start().await;
    mount_events(&server, events_fixture()).await;
    let service = service_for(&server)?;
    load(&service, CALENDAR_ID).await?;

    let SearchEventsOutput::Success {
        matched, unmatched, ..
    } = search(&service, "   ").await?
    else {
        panic!("Expected success");
    };
    assert_eq!(matched.len(), 3);
    assert_eq!(unmatched, Some(Vec::new()));

    Ok(())
}

#[tokio::test]
async fn test_search_without_unmatched() -> Result<()> {
    let server = MockServer::start().await;
    mount_events(&server, events_fixture()).await;
    let service = service_for(&server)?;
    load(&service, CALENDAR_ID).await?;

    let response = service
        .search_events(Parameters(SearchEventsParams {
            query: "\"office\"".to_string(),
            include_unmatched: Some(false),
        }))
        .await;

    let SearchEventsOutput::Success {
        matched,
        unmatched,
        unmatched_count,
        ..
    } = parse(&response)?
    else {
        panic!("Expected success, got {response}");
    };
    assert_eq!(titles(&matched), vec!["Offsite planning"]);
    assert_eq!(unmatched, None);
    assert_eq!(unmatched_count, 2);

    Ok(())
}

#[tokio::test]
async fn test_get_event() -> Result<()> {
    let server = MockServer::start().await;
    mount_events(&server, events_fixture()).await;
    let service = service_for(&server)?;
    load(&service, CALENDAR_ID).await?;

    let response = service
        .get_event(Parameters(GetEventParams {
            id: "1".to_string(),
        }))
        .await;
    match parse(&response)? {
        GetEventOutput::Success { event } => {
            assert_eq!(event.event.title, "Offsite planning");
            assert_eq!(event.event.start, "2030-05-20T10:00:00-07:00");
        }
        other => panic!("Expected success, got {other:?}"),
    }

    let response = service
        .get_event(Parameters(GetEventParams {
            id: "42".to_string(),
        }))
        .await;
    assert_eq!(
        parse::<GetEventOutput>(&response)?,
        GetEventOutput::NotFound {
            id: "42".to_string()
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_server_query_is_forwarded() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("q", "offsite"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "summary": "Team Offsite",
                "start": { "date": "2030-06-03" },
                "end": { "date": "2030-06-04" }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let service = service_for(&server)?;

    let response = service
        .load_calendar_events(Parameters(LoadCalendarEventsParams {
            calendar_id: CALENDAR_ID.to_string(),
            server_query: Some("offsite".to_string()),
        }))
        .await;

    match parse(&response)? {
        LoadEventsOutput::Success {
            server_query,
            total_events,
            ..
        } => {
            assert_eq!(server_query.as_deref(), Some("offsite"));
            assert_eq!(total_events, 1);
        }
        other => panic!("Expected success, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_upstream_error_keeps_previous_batch() -> Result<()> {
    let server = MockServer::start().await;
    mount_events(&server, events_fixture()).await;
    Mock::given(method("GET"))
        .and(path("/calendars/missing/events"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Not Found" }
        })))
        .mount(&server)
        .await;
    let service = service_for(&server)?;
    load(&service, CALENDAR_ID).await?;

    match load(&service, "missing").await? {
        LoadEventsOutput::Error { error, kind } => {
            assert!(error.contains("404"), "unexpected error: {error}");
            assert!(error.contains("Not Found"), "unexpected error: {error}");
            assert_eq!(kind.as_deref(), Some("internal"));
        }
        other => panic!("Expected error, got {other:?}"),
    }

    let ListEventsOutput::Success {
        calendar_id,
        total_events,
        ..
    } = parse(&service.list_events().await)?;
    assert_eq!(calendar_id.as_deref(), Some(CALENDAR_ID));
    assert_eq!(total_events, 3);

    Ok(())
}

#[tokio::test]
async fn test_missing_api_key() -> Result<()> {
    let server = MockServer::start().await;
    let service = CalendarEventsService::new(client_for(&server, None)?, &SearchConfig::default())?;

    match load(&service, CALENDAR_ID).await? {
        LoadEventsOutput::Error { kind, .. } => {
            assert_eq!(kind.as_deref(), Some("failed-precondition"));
        }
        other => panic!("Expected error, got {other:?}"),
    }

    // No request may reach the API without a key
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_empty_calendar_id() -> Result<()> {
    let server = MockServer::start().await;
    let service = service_for(&server)?;

    match load(&service, "  ").await? {
        LoadEventsOutput::Error { kind, .. } => {
            assert_eq!(kind.as_deref(), Some("invalid-argument"));
        }
        other => panic!("Expected error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_search_before_load() -> Result<()> {
    let server = MockServer::start().await;
    let service = service_for(&server)?;

    match search(&service, "anything \"at all\"").await? {
        SearchEventsOutput::Success {
            calendar_id,
            matched,
            unmatched,
            ..
        } => {
            assert_eq!(calendar_id, None);
            assert!(matched.is_empty());
            assert_eq!(unmatched, Some(Vec::new()));
        }
        other => panic!("Expected success, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_reload_replaces_batch() -> Result<()> {
    let server = MockServer::start().await;
    mount_events(&server, events_fixture()).await;
    Mock::given(method("GET"))
        .and(path("/calendars/holidays/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "summary": "Independence Day",
                "start": { "date": "2030-07-04" },
                "end": { "date": "2030-07-05" }
            }]
        })))
        .mount(&server)
        .await;
    let service = service_for(&server)?;

    load(&service, CALENDAR_ID).await?;
    assert!(load(&service, "holidays").await?.is_success());

    let SearchEventsOutput::Success {
        calendar_id,
        matched,
        unmatched,
        ..
    } = search(&service, "offsite").await?
    else {
        panic!("Expected success");
    };
    assert_eq!(calendar_id.as_deref(), Some("holidays"));
    assert!(matched.is_empty());
    assert_eq!(titles(&unmatched.unwrap_or_default()), vec!["Independence Day"]);

    let SearchEventsOutput::Success { matched, .. } = search(&service, "independence").await?
    else {
        panic!("Expected success");
    };
    assert_eq!(matched[0].id, "0");
    assert_eq!(matched[0].event.end, "2030-07-04");

    Ok(())
}

#[tokio::test]
async fn test_newer_load_supersedes_slow_one() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/slow/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(events_fixture())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    mount_events(&server, events_fixture()).await;
    let service = service_for(&server)?;

    // The slow load takes its ticket first, then the fast one overtakes it
    let (slow, fast) = tokio::join!(load(&service, "slow"), load(&service, CALENDAR_ID));

    match slow? {
        LoadEventsOutput::Superseded { calendar_id, .. } => assert_eq!(calendar_id, "slow"),
        other => panic!("Expected superseded, got {other:?}"),
    }
    assert!(fast?.is_success());

    let ListEventsOutput::Success { calendar_id, .. } = parse(&service.list_events().await)?;
    assert_eq!(calendar_id.as_deref(), Some(CALENDAR_ID));

    Ok(())
}

#[tokio::test]
async fn test_failed_newer_load_does_not_supersede() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/slow/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(events_fixture())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendars/missing/events"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Not Found" }
        })))
        .mount(&server)
        .await;
    let service = service_for(&server)?;

    // The newer load fails before the older one returns
    let (slow, failed) = tokio::join!(load(&service, "slow"), load(&service, "missing"));

    assert!(matches!(failed?, LoadEventsOutput::Error { .. }));
    match slow? {
        LoadEventsOutput::Success {
            calendar_id,
            total_events,
            ..
        } => {
            assert_eq!(calendar_id, "slow");
            assert_eq!(total_events, 3);
        }
        other => panic!("Expected success, got {other:?}"),
    }

    let ListEventsOutput::Success {
        calendar_id,
        total_events,
        ..
    } = parse(&service.list_events().await)?;
    assert_eq!(calendar_id.as_deref(), Some("slow"));
    assert_eq!(total_events, 3);

    Ok(())
}
