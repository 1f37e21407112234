//! Query parsing.
//!
//! A raw query mixes quoted literal phrases with free text, e.g.
//! `Offsite "Lake Tahoe"`. Quoted content must match exactly (as a
//! case-insensitive substring); everything else goes to the full-text index.

use serde::{Deserialize, Serialize};

/// A raw query split into its literal and free-text parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Lowercased quoted phrases, in query order.
    pub literal_phrases: Vec<String>,
    /// Lowercased unquoted text, fragments joined with single spaces.
    pub residual_term: String,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.literal_phrases.is_empty() && self.residual_term.is_empty()
    }
}

/// Split `raw` into literal phrases and a residual term.
///
/// Total over all input: an unmatched trailing quote is treated as if it
/// were absent, so its text joins the residual term.
pub fn parse(raw: &str) -> ParsedQuery {
    let fragments: Vec<&str> = raw.split('"').collect();
    let last = fragments.len() - 1;
    let unterminated = fragments.len() % 2 == 0;

    let mut literal_phrases = Vec::new();
    let mut unquoted = Vec::new();

    for (position, fragment) in fragments.into_iter().enumerate() {
        let quoted = position % 2 == 1 && !(unterminated && position == last);

        if quoted {
            if !fragment.is_empty() {
                literal_phrases.push(fragment.to_lowercase());
            }
        } else {
            let fragment = fragment.trim();
            if !fragment.is_empty() {
                unquoted.push(fragment.to_lowercase());
            }
        }
    }

    ParsedQuery {
        literal_phrases,
        residual_term: unquoted.join(" ").trim().to_string(),
    }
}
