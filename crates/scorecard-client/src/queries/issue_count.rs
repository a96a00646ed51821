use super::{Query, Variable, parse_data};
use crate::types::{JsonMap, Singleton};
use indoc::indoc;
use std::fmt::{self, Write};

/// A [`Query`] for the total number of issues & pull requests matching a
/// GitHub search query
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IssueCount {
    /// The search query, in GitHub's search syntax
    search_query: String,
}

impl IssueCount {
    pub fn new(search_query: String) -> IssueCount {
        IssueCount { search_query }
    }
}

impl Query for IssueCount {
    type Output = u64;

    fn write_graphql<W: Write>(&self, mut s: W) -> fmt::Result {
        write!(
            s,
            indoc! {"
            search(query: $query, type: ISSUE) {{
                issueCount
            }}
        "}
        )
    }

    fn variables(&self) -> [(String, Variable); 1] {
        [(
            String::from("query"),
            Variable::new("String!", self.search_query.clone()),
        )]
    }

    fn parse_response(&self, data: JsonMap) -> Result<u64, serde_json::Error> {
        parse_data::<Singleton<Singleton<u64>>>(data).map(|s| s.0.0)
    }
}
