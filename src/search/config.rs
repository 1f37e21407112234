//! # Search Configuration Module
//!
//! Provides configuration constants and the tunable [`SearchConfig`] for
//! event indexing and querying.

use anyhow::{Result, bail};

/// Default memory budget for the Tantivy index writer (15MB, Tantivy's per-thread minimum)
pub const DEFAULT_WRITER_MEMORY_BUDGET: usize = 15_000_000;

/// Maximum memory budget for the Tantivy index writer (200MB)
pub const MAX_WRITER_MEMORY_BUDGET: usize = 200_000_000;

/// Default fuzzy tolerance, as a fraction of each query token's length
pub const DEFAULT_FUZZY_RATIO: f64 = 0.2;

/// Largest edit distance the Levenshtein automata support
pub const MAX_FUZZY_DISTANCE: u8 = 2;

/// Options passed to [`EventIndex::search`](super::EventIndex::search).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Match indexed tokens that start with a query token.
    pub prefix: bool,
    /// Edit distance allowed per token, as a fraction of the token's length.
    pub fuzzy: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            prefix: true,
            fuzzy: DEFAULT_FUZZY_RATIO,
        }
    }
}

impl SearchOptions {
    /// Edit distance allowed for a token of `token_len` characters.
    pub fn fuzzy_distance(&self, token_len: usize) -> u8 {
        let distance = (token_len as f64 * self.fuzzy).round();
        if distance <= 0.0 {
            0
        } else {
            distance.min(MAX_FUZZY_DISTANCE as f64) as u8
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub fuzzy_ratio: f64,
    pub prefix: bool,
    pub writer_memory_budget: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_ratio: DEFAULT_FUZZY_RATIO,
            prefix: true,
            writer_memory_budget: DEFAULT_WRITER_MEMORY_BUDGET,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.fuzzy_ratio.is_finite() || !(0.0..=1.0).contains(&self.fuzzy_ratio) {
            bail!(
                "Fuzzy ratio must be between 0 and 1, got {}",
                self.fuzzy_ratio
            );
        }
        if !(DEFAULT_WRITER_MEMORY_BUDGET..=MAX_WRITER_MEMORY_BUDGET)
            .contains(&self.writer_memory_budget)
        {
            bail!(
                "Writer memory budget must be between {} and {} bytes",
                DEFAULT_WRITER_MEMORY_BUDGET,
                MAX_WRITER_MEMORY_BUDGET
            );
        }
        Ok(())
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            prefix: self.prefix,
            fuzzy: self.fuzzy_ratio,
        }
    }
}
