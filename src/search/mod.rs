//! # Search Module
//!
//! Client-side search over the loaded calendar events, built on the Tantivy
//! full-text search engine.
//!
//! Queries mix free text with "quoted phrases". Free text is matched against
//! an in-memory index with prefix and typo tolerance; quoted phrases must
//! appear verbatim (ignoring case). Every search partitions the loaded events
//! into matched and unmatched lists.
//!
//! ## Key Components
//!
//! - [`query`] - Splits a raw query into literal phrases and a residual term
//! - [`index`] - Tantivy index over the loaded events
//! - [`literal`] - Exact phrase predicate
//! - [`orchestrator`] - Two-stage search and batch ownership
//! - [`tools`] - MCP tool implementations
//! - [`config`] - Configuration constants and tunables

pub mod config;
pub mod index;
pub mod literal;
pub mod orchestrator;
pub mod outputs;
pub mod query;
pub mod tools;

pub use config::{SearchConfig, SearchOptions};
pub use index::{EventIndex, SearchHit};
pub use literal::matches_all_phrases;
pub use orchestrator::{SearchOrchestrator, SearchPartition, search};
pub use query::{ParsedQuery, parse};
pub use tools::SearchTools;
