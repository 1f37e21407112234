//! Exact phrase filtering.

use crate::events::SearchableEvent;

/// Whether every phrase occurs, case-insensitively, in at least one of the
/// event's title, location, start or end.
///
/// An empty phrase list places no constraint and always matches.
pub fn matches_all_phrases<S: AsRef<str>>(event: &SearchableEvent, phrases: &[S]) -> bool {
    if phrases.is_empty() {
        return true;
    }

    let fields = event.searchable_fields().map(str::to_lowercase);

    phrases.iter().all(|phrase| {
        let phrase = phrase.as_ref().to_lowercase();
        fields.iter().any(|field| field.contains(&phrase))
    })
}
