use crate::types::{NodeList, Singleton};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The login GitHub shows in place of an author whose account was deleted
static GHOST_LOGIN: &str = "ghost";

/// An issue or pull request, as retrieved by a search
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Issue {
    /// The issue's or pull request's number within its repository
    pub number: u64,

    /// The login of the user who opened the issue or pull request
    pub author: String,

    /// The timestamp at which the issue or pull request was created
    pub created: DateTime<Utc>,

    /// Whether the issue or pull request is currently open
    pub open: bool,

    /// The timestamp at which the issue or pull request was closed, if any
    pub closed: Option<DateTime<Utc>>,

    /// The names of the labels, in the order returned by GitHub
    pub labels: Vec<String>,

    /// The logins of the participants, in the order returned by GitHub
    pub participants: Vec<String>,

    /// The title of the associated milestone, if any
    pub milestone: Option<String>,
}

/// A single node in the results of an issue search.  The search endpoint can
/// return things other than issues & pull requests; those are deserialized as
/// `Other`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(tag = "__typename")]
pub enum SearchNode {
    Issue(IssueNode),
    PullRequest(PullRequestNode),
    #[serde(other)]
    Other,
}

impl SearchNode {
    pub fn is_issue_or_pr(&self) -> bool {
        matches!(self, SearchNode::Issue(_) | SearchNode::PullRequest(_))
    }
}

pub type IssueNode = RawNode<IssueState>;

pub type PullRequestNode = RawNode<PullRequestState>;

/// The fields queried for both issue and pull request search results,
/// parametrized by the type of the `state` enum
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawNode<S> {
    number: u64,
    author: Option<Singleton<String>>,
    created_at: String,
    state: S,
    closed_at: Option<String>,
    labels: NodeList<Singleton<String>>,
    participants: NodeList<Singleton<String>>,
    milestone: Option<Singleton<String>>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueState {
    Open,
    Closed,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

pub trait NodeState {
    fn is_open(&self) -> bool;
}

impl NodeState for IssueState {
    fn is_open(&self) -> bool {
        *self == IssueState::Open
    }
}

impl NodeState for PullRequestState {
    fn is_open(&self) -> bool {
        *self == PullRequestState::Open
    }
}

impl<S: NodeState> RawNode<S> {
    fn into_issue(self) -> Result<Issue, NodeError> {
        let created = parse_timestamp(self.created_at)?;
        let closed = self.closed_at.map(parse_timestamp).transpose()?;
        Ok(Issue {
            number: self.number,
            author: self
                .author
                .map_or_else(|| String::from(GHOST_LOGIN), |a| a.0),
            created,
            open: self.state.is_open(),
            closed,
            labels: self.labels.into_vec().into_iter().map(|s| s.0).collect(),
            participants: self
                .participants
                .into_vec()
                .into_iter()
                .map(|s| s.0)
                .collect(),
            milestone: self.milestone.map(|s| s.0),
        })
    }
}

/// Convert an issue or pull request search result to an [`Issue`]
///
/// # Errors
///
/// Fails if a timestamp cannot be parsed or if `node` is
/// [`SearchNode::Other`].
pub fn issue_from_node(node: SearchNode) -> Result<Issue, NodeError> {
    match node {
        SearchNode::Issue(n) => n.into_issue(),
        SearchNode::PullRequest(n) => n.into_issue(),
        SearchNode::Other => Err(NodeError::Unprocessable),
    }
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>, NodeError> {
    match DateTime::parse_from_rfc3339(&value) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(source) => Err(NodeError::Timestamp { value, source }),
    }
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid timestamp {value:?} in search result")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("unprocessable search result: neither an issue nor a pull request")]
    Unprocessable,
}
