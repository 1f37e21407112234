use std::time::Duration;

use anyhow::{Result, bail};
use calendar_events_mcp::CalendarEventsService;
use calendar_events_mcp::events::source::{
    DEFAULT_CALENDAR_API_BASE, DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT,
};
use calendar_events_mcp::events::{GoogleCalendarClient, GoogleCalendarConfig};
use calendar_events_mcp::search::config::DEFAULT_FUZZY_RATIO;
use calendar_events_mcp::search::outputs::LoadEventsOutput;
use calendar_events_mcp::search::tools::{LoadCalendarEventsParams, SearchEventsParams};
use calendar_events_mcp::search::{SearchConfig, SearchTools};
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

/// MCP server for fetching and searching public Google Calendar events
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Google Calendar API key used for events.list requests
    #[arg(long, env = "GOOGLE_CALENDAR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Calendar API root (override for proxies and tests)
    #[arg(long, env = "CALENDAR_API_BASE", default_value = DEFAULT_CALENDAR_API_BASE)]
    calendar_api_base: String,

    /// Maximum number of upcoming events fetched per calendar
    #[arg(long, env = "CALENDAR_EVENTS_MAX_RESULTS", default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: u32,

    /// Fuzzy tolerance as a fraction of each search word's length (0-1)
    #[arg(long, env = "CALENDAR_EVENTS_FUZZY_RATIO", default_value_t = DEFAULT_FUZZY_RATIO)]
    fuzzy_ratio: f64,

    /// HTTP timeout for calendar requests, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a calendar once, run a query against it and print the result as JSON
    Search {
        /// The Google Calendar ID to fetch
        #[arg(long)]
        calendar_id: String,
        /// Free-text filter applied by the Calendar API before fetching
        #[arg(long)]
        server_query: Option<String>,
        /// Leave unmatched events out of the output
        #[arg(long)]
        matched_only: bool,
        /// The search query; "quoted phrases" must match exactly
        query: String,
    },
}

impl Args {
    fn calendar_config(&self) -> Result<GoogleCalendarConfig> {
        if !(1..=MAX_RESULTS_LIMIT).contains(&self.max_results) {
            bail!("--max-results must be between 1 and {MAX_RESULTS_LIMIT}");
        }

        Ok(GoogleCalendarConfig {
            api_key: self.api_key.clone().map(Zeroizing::new),
            base_url: self.calendar_api_base.clone(),
            max_results: self.max_results,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            fuzzy_ratio: self.fuzzy_ratio,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing to stderr to avoid conflicts with stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let client = GoogleCalendarClient::new(args.calendar_config()?)?;
    let search_config = args.search_config();
    search_config.validate()?;

    if args.api_key.is_none() {
        tracing::warn!("GOOGLE_CALENDAR_API_KEY is not set; loading calendars will fail");
    }

    if let Some(command) = args.command {
        return handle_command(command, client, &search_config).await;
    }

    tracing::info!("Starting MCP Calendar Events server on stdio...");

    let calendar_service = CalendarEventsService::new(client, &search_config)?;

    // Serve using stdio transport
    let service = calendar_service.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    // Wait for the service to complete
    service.waiting().await?;
    Ok(())
}

async fn handle_command(
    command: Commands,
    client: GoogleCalendarClient,
    search_config: &SearchConfig,
) -> Result<()> {
    match command {
        Commands::Search {
            calendar_id,
            server_query,
            matched_only,
            query,
        } => {
            let tools = SearchTools::new(client, search_config)?;

            let loaded = tools
                .load_calendar_events(LoadCalendarEventsParams {
                    calendar_id,
                    server_query,
                })
                .await;
            let output: LoadEventsOutput = serde_json::from_str(&loaded)?;
            if let LoadEventsOutput::Error { error, .. } = output {
                bail!("Failed to load calendar: {error}");
            }

            let result = tools
                .search_events(SearchEventsParams {
                    query,
                    include_unmatched: Some(!matched_only),
                })
                .await;
            println!("{result}");
            Ok(())
        }
    }
}
