use crate::QueryPayload;
use crate::github::FetchError;
use crate::issue::{Issue, issue_from_node};
use crate::queries::{Query, QueryLimits, SearchIssues};
use crate::types::{Cursor, JsonMap};

/// A sans-I/O state machine for carrying out a sequence of GraphQL requests.
///
/// The driver alternates between calling `get_next_query()` and passing the
/// response to that query to `handle_response()`, collecting any values from
/// `get_output()` after each step, until `get_next_query()` returns `None`.
pub trait QueryMachine {
    type Output;

    fn get_next_query(&mut self) -> Option<QueryPayload>;
    fn handle_response(&mut self, data: JsonMap) -> Result<(), FetchError>;
    fn get_output(&mut self) -> Vec<Self::Output>;
}

/// A [`QueryMachine`] that pages through the results of a GitHub issue search
/// one page at a time, outputting each issue & pull request as an [`Issue`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaginatedSearch {
    paginator: SearchIssues,

    /// The cursor for the next page to request, if any.  The outer `Option`
    /// is `None` when no request should be made, either because the previous
    /// request has not yet been answered or because all pages have been
    /// fetched.
    pending: Option<Option<Cursor>>,

    /// The most recent non-null `endCursor`
    cursor: Option<Cursor>,

    /// The number of search result nodes received so far, including ones
    /// that were not issues or pull requests
    processed: usize,

    results: Vec<Issue>,
}

impl PaginatedSearch {
    pub fn new(search_query: String, limits: QueryLimits) -> PaginatedSearch {
        PaginatedSearch {
            paginator: SearchIssues::new(search_query, limits),
            pending: Some(None),
            cursor: None,
            processed: 0,
            results: Vec::new(),
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }
}

impl QueryMachine for PaginatedSearch {
    type Output = Issue;

    fn get_next_query(&mut self) -> Option<QueryPayload> {
        let cursor = self.pending.take()?;
        if cursor.is_some() {
            tracing::debug!("Fetching additional page");
        } else {
            tracing::debug!(query = self.paginator.search_query(), "Searching issues");
        }
        Some(self.paginator.for_cursor(cursor.as_ref()).payload())
    }

    fn handle_response(&mut self, data: JsonMap) -> Result<(), FetchError> {
        let search = self.paginator.for_cursor(None).parse_response(data)?;
        let start = self.processed;
        self.processed += search.page.items.len();
        tracing::info!(
            "Fetching issues {start}..{}/{}",
            self.processed,
            search.issue_count
        );
        for node in search.page.items {
            if node.is_issue_or_pr() {
                // On failure, issues from earlier in the page remain in
                // `results` for `get_output()`.
                self.results.push(issue_from_node(node)?);
            } else {
                tracing::debug!(?node, "Excluding search result that is not an issue");
            }
        }
        if search.page.end_cursor.is_some() {
            // endCursor is null when the page has no items, so don't reset
            // the cursor in that case.
            self.cursor = search.page.end_cursor;
        }
        if !search.page.has_next_page {
            tracing::debug!("Last page");
        } else if self.cursor.is_none() {
            tracing::warn!("Server reported another page of search results without a cursor");
        } else {
            self.pending = Some(self.cursor.clone());
        }
        Ok(())
    }

    fn get_output(&mut self) -> Vec<Issue> {
        self.results.drain(..).collect()
    }
}
