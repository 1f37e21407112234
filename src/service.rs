use anyhow::Result;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::events::GoogleCalendarClient;
use crate::search::{
    SearchConfig, SearchTools,
    tools::{GetEventParams, LoadCalendarEventsParams, SearchEventsParams},
};

#[derive(Clone)]
pub struct CalendarEventsService {
    search_tools: SearchTools,
    tool_router: ToolRouter<Self>,
}

impl CalendarEventsService {
    pub fn new(client: GoogleCalendarClient, config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            search_tools: SearchTools::new(client, config)?,
            tool_router: Self::tool_router(),
        })
    }
}

#[tool_router]
impl CalendarEventsService {
    #[tool(
        description = "Fetch upcoming events from a public Google Calendar and index them for searching. Replaces any previously loaded calendar. Optionally pass server_query to let the Calendar API pre-filter events before they are fetched. Call this before search_events, list_events or get_event."
    )]
    pub async fn load_calendar_events(
        &self,
        params: Parameters<LoadCalendarEventsParams>,
    ) -> String {
        self.search_tools.load_calendar_events(params.0).await
    }

    #[tool(
        description = "Search the loaded calendar events. Unquoted words match titles, locations and dates with prefix and typo tolerance; \"quoted phrases\" must appear exactly (ignoring case). Returns the matched events and, unless include_unmatched is false, the events that did not match, both in calendar order. An empty query matches every event."
    )]
    pub async fn search_events(&self, params: Parameters<SearchEventsParams>) -> String {
        self.search_tools.search_events(params.0).await
    }

    #[tool(
        description = "List every loaded event in calendar order, along with the calendar ID they were loaded from and index statistics."
    )]
    pub async fn list_events(&self) -> String {
        self.search_tools.list_events().await
    }

    #[tool(
        description = "Get a single loaded event by the ID returned from list_events or search_events. IDs are only valid until the next load_calendar_events call."
    )]
    pub async fn get_event(&self, params: Parameters<GetEventParams>) -> String {
        self.search_tools.get_event(params.0).await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for CalendarEventsService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
                    .with_title("Calendar Events"),
            )
            .with_instructions(
                "MCP server for browsing public Google Calendars. Start with load_calendar_events to fetch a calendar by ID, then use search_events to filter it: plain words are matched loosely (prefixes and small typos are fine) while \"quoted phrases\" must appear exactly. Use list_events to see everything that was loaded and get_event to fetch one event by ID.",
            )
    }
}
