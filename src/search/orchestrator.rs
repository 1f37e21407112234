//! Query evaluation over the loaded event batch.
//!
//! Quoted phrases are checked literally; the rest of the query goes through
//! the fuzzy/prefix index. Fuzzy matching alone would let quoted phrases
//! drift, so phrases act as a hard filter on top of index hits.

use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::config::{SearchConfig, SearchOptions};
use super::index::EventIndex;
use super::literal::matches_all_phrases;
use super::query::{self, ParsedQuery};
use crate::events::{CalendarEvent, SearchableEvent};

/// The matched/unmatched split of a batch for one query.
///
/// Both sides keep the batch's original order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPartition {
    pub matched: Vec<SearchableEvent>,
    pub unmatched: Vec<SearchableEvent>,
}

impl SearchPartition {
    fn everything(events: &[SearchableEvent]) -> Self {
        Self {
            matched: events.to_vec(),
            unmatched: Vec::new(),
        }
    }

    fn split(events: &[SearchableEvent], matched_ids: &HashSet<String>) -> Self {
        let (matched, unmatched) = events
            .iter()
            .cloned()
            .partition(|event| matched_ids.contains(&event.id));
        Self { matched, unmatched }
    }

    pub fn len(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition `events` for `raw_query`.
///
/// `index` must already hold exactly `events`; nothing is indexed here.
pub fn search(
    index: &EventIndex,
    events: &[SearchableEvent],
    raw_query: &str,
    options: &SearchOptions,
) -> Result<SearchPartition> {
    let trimmed = raw_query.trim();
    if trimmed.is_empty() {
        return Ok(SearchPartition::everything(events));
    }

    let parsed = query::parse(trimmed);
    if parsed.is_empty() {
        return Ok(SearchPartition::everything(events));
    }

    let matched_ids = if parsed.residual_term.is_empty() {
        events
            .iter()
            .filter(|event| matches_all_phrases(event, &parsed.literal_phrases))
            .map(|event| event.id.clone())
            .collect::<HashSet<_>>()
    } else {
        let hits = index
            .search(&parsed.residual_term, options)
            .with_context(|| format!("Index search failed for {:?}", parsed.residual_term))?;
        let candidates: HashSet<String> = hits.into_iter().map(|hit| hit.id).collect();

        events
            .iter()
            .filter(|event| candidates.contains(&event.id))
            .filter(|event| matches_all_phrases(event, &parsed.literal_phrases))
            .map(|event| event.id.clone())
            .collect()
    };

    let partition = SearchPartition::split(events, &matched_ids);
    tracing::debug!(
        "Query {:?} matched {} of {} events",
        trimmed,
        partition.matched.len(),
        events.len()
    );
    Ok(partition)
}

/// Owns the current event batch and the index built from it.
#[derive(Debug)]
pub struct SearchOrchestrator {
    index: EventIndex,
    events: Vec<SearchableEvent>,
    options: SearchOptions,
}

impl SearchOrchestrator {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index: EventIndex::new(config)?,
            events: Vec::new(),
            options: config.search_options(),
        })
    }

    /// Replace the batch: assign ids and rebuild the index as one unit.
    ///
    /// If indexing fails, the previous batch and index stay in place.
    pub fn load(&mut self, events: Vec<CalendarEvent>) -> Result<&[SearchableEvent]> {
        let batch = SearchableEvent::from_batch(events);
        self.index.rebuild(&batch)?;
        self.events = batch;

        tracing::info!("Loaded {} events into the search index", self.events.len());
        Ok(&self.events)
    }

    pub fn events(&self) -> &[SearchableEvent] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Result<Option<SearchableEvent>> {
        self.index.get(id)
    }

    pub fn index(&self) -> &EventIndex {
        &self.index
    }

    /// Parse a query the way [`search`](Self::search) does.
    pub fn parse(&self, raw_query: &str) -> ParsedQuery {
        query::parse(raw_query.trim())
    }

    /// Partition the current batch for `raw_query`.
    pub fn search(&self, raw_query: &str) -> Result<SearchPartition> {
        search(&self.index, &self.events, raw_query, &self.options)
    }
}
