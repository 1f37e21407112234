use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tantivy::{
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term,
    collector::TopDocs,
    doc,
    query::{BooleanQuery, FuzzyTermQuery, Occur, Query},
    schema::{Field, STORED, STRING, Schema, TEXT, Value},
    tokenizer::TokenStream,
};

use super::config::{SearchConfig, SearchOptions};
use crate::events::SearchableEvent;

/// In-memory Tantivy index over the currently loaded events
pub struct EventIndex {
    index: Index,
    reader: IndexReader,
    writer: IndexWriter,
    fields: IndexFields,
}

#[derive(Debug, Clone, Copy)]
struct IndexFields {
    id: Field,
    title: Field,
    location: Field,
    start: Field,
    end: Field,
    record: Field,
}

impl IndexFields {
    fn searchable(&self) -> [Field; 4] {
        [self.title, self.location, self.start, self.end]
    }
}

/// A single index match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_docs: u64,
    pub total_segments: usize,
}

impl EventIndex {
    /// Create an empty index
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let mut schema_builder = Schema::builder();

        // Key used for deletes and for mapping hits back to events
        let id = schema_builder.add_text_field("id", STRING | STORED);

        // Searchable fields
        let title = schema_builder.add_text_field("title", TEXT);
        let location = schema_builder.add_text_field("location", TEXT);
        let start = schema_builder.add_text_field("start", TEXT);
        let end = schema_builder.add_text_field("end", TEXT);

        // Full record as JSON
        let record = schema_builder.add_text_field("record", STORED);

        let schema = schema_builder.build();
        let fields = IndexFields {
            id,
            title,
            location,
            start,
            end,
            record,
        };

        let index = Index::create_in_ram(schema);
        let writer = index
            .writer_with_num_threads(1, config.writer_memory_budget)
            .context("Failed to create event index writer")?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .context("Failed to create event index reader")?;

        Ok(Self {
            index,
            reader,
            writer,
            fields,
        })
    }

    /// Remove every event. Calling it on an empty index is a no-op.
    pub fn clear(&mut self) -> Result<()> {
        self.writer.delete_all_documents()?;
        self.commit()
    }

    /// Index a batch of events. Ids must be unique and not already present.
    pub fn add_all(&mut self, events: &[SearchableEvent]) -> Result<()> {
        if let Err(e) = self.stage_events(events) {
            self.writer.rollback()?;
            return Err(e);
        }
        self.commit()
    }

    /// Remove a single event by id
    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.writer
            .delete_term(Term::from_field_text(self.fields.id, id));
        self.commit()
    }

    /// Replace the whole contents with `events` in one commit.
    ///
    /// On failure the index keeps its previous contents.
    pub fn rebuild(&mut self, events: &[SearchableEvent]) -> Result<()> {
        let staged = self
            .writer
            .delete_all_documents()
            .map_err(anyhow::Error::from)
            .and_then(|_| self.stage_events(events));

        if let Err(e) = staged {
            self.writer.rollback()?;
            return Err(e.context("Failed to rebuild event index"));
        }

        self.commit()?;
        tracing::debug!("Rebuilt event index with {} events", events.len());
        Ok(())
    }

    fn stage_events(&mut self, events: &[SearchableEvent]) -> Result<()> {
        for event in events {
            let doc = self.create_document(event)?;
            self.writer.add_document(doc)?;
        }
        Ok(())
    }

    fn create_document(&self, event: &SearchableEvent) -> Result<TantivyDocument> {
        let record = serde_json::to_string(event)
            .with_context(|| format!("Failed to serialize event {}", event.id))?;

        Ok(doc!(
            self.fields.id => event.id.as_str(),
            self.fields.title => event.event.title.as_str(),
            self.fields.location => event.event.location_text(),
            self.fields.start => event.event.start.as_str(),
            self.fields.end => event.event.end.as_str(),
            self.fields.record => record,
        ))
    }

    fn commit(&mut self) -> Result<()> {
        self.writer.commit().context("Failed to commit event index")?;
        self.reader.reload().context("Failed to reload event index")?;
        Ok(())
    }

    /// Full-text search returning matching ids, best first.
    ///
    /// Each query token matches whole indexed tokens within its fuzzy
    /// distance and, when `options.prefix` is set, any indexed token it is an
    /// exact prefix of. Tokens and fields are OR-ed together. A term with no
    /// tokens matches nothing.
    pub fn search(&self, term: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        let tokens = self.tokenize(term)?;
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let total_docs = searcher.num_docs();
        if total_docs == 0 {
            return Ok(Vec::new());
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for token in &tokens {
            let distance = options.fuzzy_distance(token.chars().count());
            for field in self.fields.searchable() {
                let term = Term::from_field_text(field, token);
                // A fuzzy prefix automaton would also accept tokens whose
                // prefix is merely close, so prefix matching stays exact
                if options.prefix {
                    clauses.push((
                        Occur::Should,
                        Box::new(FuzzyTermQuery::new_prefix(term.clone(), 0, true)),
                    ));
                }
                clauses.push((
                    Occur::Should,
                    Box::new(FuzzyTermQuery::new(term, distance, true)),
                ));
            }
        }

        let query = BooleanQuery::new(clauses);
        let top_docs = searcher.search(&query, &TopDocs::with_limit(total_docs as usize))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            if let Some(id) = doc.get_first(self.fields.id).and_then(|v| v.as_str()) {
                hits.push(SearchHit {
                    id: id.to_string(),
                    score,
                });
            }
        }

        tracing::debug!("Index search for {:?} matched {} events", term, hits.len());
        Ok(hits)
    }

    /// Split text the same way indexed fields are split
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let mut analyzer = self.index.tokenizer_for_field(self.fields.title)?;
        let mut stream = analyzer.token_stream(text);

        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        while stream.advance() {
            let token = stream.token().text.clone();
            if seen.insert(token.clone()) {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }

    /// Look up the stored record for an id
    pub fn get(&self, id: &str) -> Result<Option<SearchableEvent>> {
        let searcher = self.reader.searcher();
        let query = tantivy::query::TermQuery::new(
            Term::from_field_text(self.fields.id, id),
            tantivy::schema::IndexRecordOption::Basic,
        );

        let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;
        let Some((_, doc_address)) = top_docs.into_iter().next() else {
            return Ok(None);
        };

        let doc: TantivyDocument = searcher.doc(doc_address)?;
        let record = doc
            .get_first(self.fields.record)
            .and_then(|v| v.as_str())
            .with_context(|| format!("Event {id} has no stored record"))?;

        let event = serde_json::from_str(record)
            .with_context(|| format!("Failed to decode stored record for event {id}"))?;
        Ok(Some(event))
    }

    /// Number of indexed events
    pub fn len(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> IndexStats {
        let searcher = self.reader.searcher();
        IndexStats {
            total_docs: searcher.num_docs(),
            total_segments: searcher.segment_readers().len(),
        }
    }
}

impl std::fmt::Debug for EventIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventIndex")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
