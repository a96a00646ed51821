use super::{Query, Variable, parse_data};
use crate::issue::SearchNode;
use crate::types::{Cursor, JsonMap, Page, Singleton};
use indoc::indoc;
use serde::Deserialize;
use std::fmt::{self, Write};
use std::num::NonZeroUsize;

/// Limits on the number of items requested per page of search results
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QueryLimits {
    /// How many issues & pull requests to request per page
    pub page_size: NonZeroUsize,

    /// How many labels to request per issue
    pub label_page_size: NonZeroUsize,

    /// How many participants to request per issue
    pub participant_page_size: NonZeroUsize,
}

impl QueryLimits {
    pub const DEFAULT_PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(100).expect("100 != 0");
    pub const DEFAULT_LABEL_PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(20).expect("20 != 0");
    pub const DEFAULT_PARTICIPANT_PAGE_SIZE: NonZeroUsize =
        NonZeroUsize::new(50).expect("50 != 0");
}

impl Default for QueryLimits {
    fn default() -> QueryLimits {
        QueryLimits {
            page_size: QueryLimits::DEFAULT_PAGE_SIZE,
            label_page_size: QueryLimits::DEFAULT_LABEL_PAGE_SIZE,
            participant_page_size: QueryLimits::DEFAULT_PARTICIPANT_PAGE_SIZE,
        }
    }
}

/// Produces [`SearchIssuesQuery`] values for successive pages of the issues
/// & pull requests matching a GitHub search query
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchIssues {
    /// The search query, in GitHub's search syntax
    search_query: String,

    limits: QueryLimits,
}

impl SearchIssues {
    pub fn new(search_query: String, limits: QueryLimits) -> SearchIssues {
        SearchIssues {
            search_query,
            limits,
        }
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn for_cursor(&self, cursor: Option<&Cursor>) -> SearchIssuesQuery {
        SearchIssuesQuery {
            search_query: self.search_query.clone(),
            cursor: cursor.cloned(),
            limits: self.limits,
        }
    }
}

/// A [`Query`] for one page of the issues & pull requests matching a GitHub
/// search query, starting after a given cursor
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchIssuesQuery {
    /// The search query, in GitHub's search syntax
    search_query: String,

    /// The pagination cursor after which to retrieve results
    cursor: Option<Cursor>,

    limits: QueryLimits,
}

impl Query for SearchIssuesQuery {
    type Output = SearchPage;

    fn write_graphql<W: Write>(&self, mut s: W) -> fmt::Result {
        write!(
            s,
            indoc! {"
            search(query: $query, type: ISSUE, first: {page_size}, after: $cursor) {{
                issueCount
                nodes {{
                    __typename
                    ... on Issue {{
                        number
                        author {{
                            login
                        }}
                        createdAt
                        state
                        closedAt
                        labels(first: {label_page_size}) {{
                            nodes {{
                                name
                            }}
                        }}
                        participants(first: {participant_page_size}) {{
                            nodes {{
                                login
                            }}
                        }}
                        milestone {{
                            title
                        }}
                    }}
                    ... on PullRequest {{
                        number
                        author {{
                            login
                        }}
                        createdAt
                        state
                        closedAt
                        labels(first: {label_page_size}) {{
                            nodes {{
                                name
                            }}
                        }}
                        participants(first: {participant_page_size}) {{
                            nodes {{
                                login
                            }}
                        }}
                        milestone {{
                            title
                        }}
                    }}
                }}
                pageInfo {{
                    endCursor
                    hasNextPage
                }}
            }}
        "},
            page_size = self.limits.page_size,
            label_page_size = self.limits.label_page_size,
            participant_page_size = self.limits.participant_page_size,
        )
    }

    fn variables(&self) -> [(String, Variable); 2] {
        [
            (
                String::from("query"),
                Variable::new("String!", self.search_query.clone()),
            ),
            (
                String::from("cursor"),
                Variable::new("String", self.cursor.clone()),
            ),
        ]
    }

    fn parse_response(&self, data: JsonMap) -> Result<SearchPage, serde_json::Error> {
        parse_data::<Singleton<SearchPage>>(data).map(|s| s.0)
    }
}

/// One page of search results
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// The total number of issues & pull requests matching the query
    pub issue_count: u64,

    #[serde(flatten)]
    pub page: Page<SearchNode>,
}
