use super::*;
use crate::GqlError;
use assert_matches::assert_matches;
use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A [`Transport`] that replays canned responses and records the payloads it
/// was sent
#[derive(Debug)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<JsonMap, QueryError>>>,
    requests: Mutex<Vec<QueryPayload>>,
}

impl ScriptedTransport {
    fn new<I: IntoIterator<Item = Result<JsonMap, QueryError>>>(responses: I) -> Arc<Self> {
        Arc::new(ScriptedTransport {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn cursors(&self) -> Vec<serde_json::Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.variables.get("cursor").cloned().unwrap_or_default())
            .collect()
    }
}

impl Transport for Arc<ScriptedTransport> {
    fn query(&self, payload: QueryPayload) -> Result<JsonMap, QueryError> {
        self.requests.lock().unwrap().push(payload);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("more requests made than expected")
    }
}

fn data(value: serde_json::Value) -> JsonMap {
    let serde_json::Value::Object(map) = value else {
        panic!("test data is not an object");
    };
    map
}

fn gql_error(messages: &[&str]) -> QueryError {
    let errors = messages
        .iter()
        .map(|m| serde_json::json!({"message": m}))
        .collect::<Vec<_>>();
    QueryError::GraphQL(serde_json::from_value::<GqlError>(errors.into()).unwrap())
}

fn issue_json(number: u64) -> serde_json::Value {
    serde_json::json!({
        "__typename": "Issue",
        "number": number,
        "author": {"login": "alice"},
        "createdAt": "2023-01-01T00:00:00Z",
        "state": "OPEN",
        "closedAt": null,
        "labels": {"nodes": [{"name": "bug"}]},
        "participants": {"nodes": [{"login": "alice"}]},
        "milestone": null
    })
}

fn page(numbers: &[u64], end_cursor: Option<&str>, has_next_page: bool) -> JsonMap {
    data(serde_json::json!({
        "search": {
            "issueCount": 100,
            "nodes": numbers.iter().copied().map(issue_json).collect::<Vec<_>>(),
            "pageInfo": {"endCursor": end_cursor, "hasNextPage": has_next_page}
        }
    }))
}

async fn collect_numbers(mut stream: ResultStream<Issue>) -> (Vec<u64>, Option<FetchError>) {
    let mut numbers = Vec::new();
    let mut error = None;
    while let Some(r) = stream.next().await {
        assert!(error.is_none(), "stream yielded an item after an error");
        match r {
            Ok(issue) => numbers.push(issue.number),
            Err(e) => error = Some(e),
        }
    }
    (numbers, error)
}

#[tokio::test]
async fn search_no_results() {
    let transport = ScriptedTransport::new([Ok(page(&[], None, false))]);
    let github = GitHub::with_transport(Arc::clone(&transport));
    let (numbers, error) = collect_numbers(github.search_issues("label:nothing")).await;
    assert!(numbers.is_empty());
    assert!(error.is_none());
    assert_eq!(transport.cursors(), [serde_json::Value::Null]);
}

#[tokio::test]
async fn search_multiple_pages() {
    let transport = ScriptedTransport::new([
        Ok(page(&[1, 2, 3], Some("c1"), true)),
        Ok(page(&[4], Some("c2"), true)),
        Ok(page(&[5, 6], Some("c3"), false)),
    ]);
    let github = GitHub::with_transport(Arc::clone(&transport));
    let (numbers, error) = collect_numbers(github.search_issues("is:open")).await;
    assert_eq!(numbers, [1, 2, 3, 4, 5, 6]);
    assert!(error.is_none());
    assert_eq!(
        transport.cursors(),
        [
            serde_json::Value::Null,
            serde_json::Value::from("c1"),
            serde_json::Value::from("c2"),
        ]
    );
}

#[tokio::test]
async fn search_server_error_ends_stream() {
    let transport = ScriptedTransport::new([
        Ok(page(&[1, 2], Some("c1"), true)),
        Err(gql_error(&["Something went wrong", "Timeout on validation"])),
    ]);
    let github = GitHub::with_transport(Arc::clone(&transport));
    let (numbers, error) = collect_numbers(github.search_issues("is:open")).await;
    assert_eq!(numbers, [1, 2]);
    let error = error.unwrap();
    assert_matches!(error, FetchError::Query(QueryError::GraphQL(_)));
    assert_eq!(
        error.to_string(),
        "Error in response: Something went wrong, Timeout on validation"
    );
    assert_eq!(transport.cursors().len(), 2);
}

#[tokio::test]
async fn search_transport_error_ends_stream() {
    let transport = ScriptedTransport::new([
        Ok(page(&[1], Some("c1"), true)),
        Err(QueryError::Json(
            serde_json::from_str::<serde_json::Value>("<html>").unwrap_err(),
        )),
    ]);
    let github = GitHub::with_transport(Arc::clone(&transport));
    let (numbers, error) = collect_numbers(github.search_issues("is:open")).await;
    assert_eq!(numbers, [1]);
    assert_matches!(error, Some(FetchError::Query(QueryError::Json(_))));
}

#[tokio::test]
async fn search_bad_timestamp_ends_stream() {
    let mut nodes = vec![issue_json(1), issue_json(2), issue_json(3)];
    nodes[1]["closedAt"] = "not a date".into();
    let transport = ScriptedTransport::new([Ok(data(serde_json::json!({
        "search": {
            "issueCount": 3,
            "nodes": nodes,
            "pageInfo": {"endCursor": "c1", "hasNextPage": true}
        }
    })))]);
    let github = GitHub::with_transport(Arc::clone(&transport));
    let (numbers, error) = collect_numbers(github.search_issues("is:open")).await;
    assert_eq!(numbers, [1]);
    assert_matches!(error, Some(FetchError::Node(NodeError::Timestamp { .. })));
    assert_eq!(transport.cursors().len(), 1);
}

#[tokio::test]
async fn search_excludes_other_nodes() {
    let transport = ScriptedTransport::new([Ok(data(serde_json::json!({
        "search": {
            "issueCount": 3,
            "nodes": [
                {"__typename": "Discussion"},
                issue_json(2),
                {"__typename": "Repository"},
            ],
            "pageInfo": {"endCursor": "c1", "hasNextPage": false}
        }
    })))]);
    let github = GitHub::with_transport(transport);
    let (numbers, error) = collect_numbers(github.search_issues("is:open")).await;
    assert_eq!(numbers, [2]);
    assert!(error.is_none());
}

#[tokio::test]
async fn issue_count() {
    let transport = ScriptedTransport::new([Ok(data(serde_json::json!({
        "search": {"issueCount": 42}
    })))]);
    let github = GitHub::with_transport(Arc::clone(&transport));
    assert_eq!(
        github
            .search_issue_count("repo:spring-projects/spring-boot")
            .await
            .unwrap(),
        42
    );
    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].variables["query"],
        "repo:spring-projects/spring-boot"
    );
}

#[tokio::test]
async fn issue_count_error() {
    let transport = ScriptedTransport::new([Err(gql_error(&["Bad query"]))]);
    let github = GitHub::with_transport(transport);
    let r = github.search_issue_count("repo:").await;
    assert_matches!(r, Err(FetchError::Query(QueryError::GraphQL(_))));
}

#[tokio::test]
async fn assignable_users() {
    let transport = ScriptedTransport::new([Ok(data(serde_json::json!({
        "repository": {
            "assignableUsers": {
                "nodes": [{"login": "bob"}, {"login": "carol"}]
            }
        }
    })))]);
    let github = GitHub::with_transport(Arc::clone(&transport));
    let users = github
        .assignable_users("spring-projects", "spring-boot")
        .await
        .unwrap();
    assert_eq!(users, ["bob", "carol"]);
    let requests = transport.requests.lock().unwrap();
    assert_eq!(
        requests[0].variables,
        JsonMap::from_iter([
            ("owner".into(), "spring-projects".into()),
            ("name".into(), "spring-boot".into()),
        ])
    );
}

#[tokio::test]
async fn assignable_users_not_found() {
    let transport = ScriptedTransport::new([Err(gql_error(&[
        "Could not resolve to a Repository with the name 'octocat/nope'.",
    ]))]);
    let github = GitHub::with_transport(transport);
    let r = github.assignable_users("octocat", "nope").await;
    assert_matches!(r, Err(FetchError::Query(QueryError::GraphQL(_))));
}
