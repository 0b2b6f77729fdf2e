use trawl_index::{Database, IndexManager};
use trawl_types::{EventRole, Match, SearchMode, SearchRequest};

use crate::assemble::find_match_span;
use crate::{Error, Result};

/// One way of executing a search. Which variant runs is decided per call
/// from the recorded index state, so fallback behavior is testable without
/// touching the environment.
pub trait QueryStrategy {
    fn execute(
        &self,
        db: &Database,
        request: &SearchRequest,
        roles: &[EventRole],
    ) -> trawl_index::Result<Vec<Match>>;
}

/// Ranked path through the FTS5 index.
pub struct FullTextStrategy;

impl QueryStrategy for FullTextStrategy {
    fn execute(
        &self,
        db: &Database,
        request: &SearchRequest,
        roles: &[EventRole],
    ) -> trawl_index::Result<Vec<Match>> {
        db.search_fulltext(&request.query, roles, request.sort, request.limit)
    }
}

/// Case-insensitive scan over stored content; no relevance score.
pub struct SubstringStrategy;

impl QueryStrategy for SubstringStrategy {
    fn execute(
        &self,
        db: &Database,
        request: &SearchRequest,
        roles: &[EventRole],
    ) -> trawl_index::Result<Vec<Match>> {
        db.search_substring(&request.query, roles, request.limit)
    }
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub matches: Vec<Match>,
    pub mode: SearchMode,
}

/// Read-only search entry point. Runs concurrently with sync in another
/// process; a rebuild happening mid-query surfaces as a fallback, never as
/// an error.
pub struct QueryEngine<'a> {
    db: &'a Database,
}

impl<'a> QueryEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        if request.query.trim().is_empty() {
            return Err(Error::InvalidQuery("query must not be empty".to_string()));
        }
        if request.scope.is_empty() {
            return Err(Error::InvalidQuery(
                "scope must include at least one role".to_string(),
            ));
        }

        let roles = request.scope.roles();
        let state = IndexManager::new(self.db).state();

        if state.usable() {
            // Failures here are almost always the shadow table being swapped
            // by a concurrent rebuild or MATCH rejecting the query text;
            // both degrade to the substring path. An empty result set falls
            // through too, so a stale-but-marked-ready index cannot hide
            // matches the scan would find.
            if let Ok(matches) = FullTextStrategy.execute(self.db, request, &roles)
                && !matches.is_empty()
            {
                return Ok(self.finish(matches, request, SearchMode::FullText));
            }
        }

        let matches = SubstringStrategy
            .execute(self.db, request, &roles)
            .map_err(Error::Index)?;

        Ok(self.finish(matches, request, SearchMode::Substring))
    }

    fn finish(&self, mut matches: Vec<Match>, request: &SearchRequest, mode: SearchMode) -> SearchResponse {
        for m in &mut matches {
            m.span = find_match_span(&m.content, &request.query);
        }

        SearchResponse { matches, mode }
    }
}
