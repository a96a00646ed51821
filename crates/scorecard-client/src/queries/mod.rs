mod assignable_users;
mod issue_count;
mod search_issues;
pub use self::assignable_users::AssignableUsers;
pub use self::issue_count::IssueCount;
pub use self::search_issues::{QueryLimits, SearchIssues, SearchIssuesQuery, SearchPage};
use crate::QueryPayload;
use crate::types::JsonMap;
use indenter::indented;
use std::fmt::Write;

/// A single GraphQL query against the GitHub API
pub trait Query {
    type Output;

    /// Write the body of the query (everything inside the outermost braces)
    fn write_graphql<W: Write>(&self, s: W) -> std::fmt::Result;

    /// The variables used by the query, along with their GraphQL types
    fn variables(&self) -> impl IntoIterator<Item = (String, Variable)>;

    /// Deserialize the `data` field of a successful response
    fn parse_response(&self, data: JsonMap) -> Result<Self::Output, serde_json::Error>;

    /// Assemble the full query document and its variables
    fn payload(&self) -> QueryPayload {
        let mut variables = JsonMap::new();
        let mut decls = Vec::new();
        for (name, Variable { gql_type, value }) in self.variables() {
            decls.push(format!("${name}: {gql_type}"));
            variables.insert(name, value);
        }
        let mut body = String::new();
        self.write_graphql(indented(&mut body).with_str("    "))
            .expect("writing to a string should not fail");
        let query = format!("query ({}) {{\n{body}}}\n", decls.join(", "));
        QueryPayload { query, variables }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variable {
    pub gql_type: String,
    pub value: serde_json::Value,
}

impl Variable {
    pub(crate) fn new<V: Into<serde_json::Value>>(gql_type: &str, value: V) -> Variable {
        Variable {
            gql_type: gql_type.to_owned(),
            value: value.into(),
        }
    }
}

fn parse_data<T: serde::de::DeserializeOwned>(data: JsonMap) -> Result<T, serde_json::Error> {
    serde_json::from_value(serde_json::Value::Object(data))
}
