#[cfg(test)]
mod tests;
use crate::issue::{Issue, NodeError};
use crate::machine::{PaginatedSearch, QueryMachine};
use crate::queries::{AssignableUsers, IssueCount, Query, QueryLimits};
use crate::types::JsonMap;
use crate::{BuildClientError, Client, QueryError, QueryPayload, Transport};
use futures_util::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Asynchronous access to GitHub issue search & repository data.
///
/// Each request is performed on Tokio's blocking thread pool, so the methods
/// that return futures or streams must be used within a Tokio runtime.
#[derive(Debug)]
pub struct GitHub<T = Client> {
    transport: Arc<T>,
}

impl GitHub<Client> {
    pub fn new(token: &str) -> Result<GitHub<Client>, BuildClientError> {
        Client::new(token).map(GitHub::with_transport)
    }

    pub fn new_with_local_token() -> Result<GitHub<Client>, BuildClientError> {
        Client::new_with_local_token().map(GitHub::with_transport)
    }
}

impl<T> Clone for GitHub<T> {
    fn clone(&self) -> GitHub<T> {
        GitHub {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> GitHub<T> {
    pub fn with_transport(transport: T) -> GitHub<T> {
        GitHub {
            transport: Arc::new(transport),
        }
    }

    /// Return the total number of issues & pull requests matching the given
    /// search query
    pub async fn search_issue_count(&self, search_query: &str) -> Result<u64, FetchError> {
        tracing::debug!(query = search_query, "Counting issues");
        let query = IssueCount::new(search_query.to_owned());
        let data = execute(Arc::clone(&self.transport), query.payload()).await?;
        Ok(query.parse_response(data)?)
    }

    /// Fetch all issues & pull requests matching the given search query as a
    /// stream, requesting the next page of results only after the previous
    /// one has been processed.
    ///
    /// The stream ends after the last issue, or after yielding the first
    /// error encountered.
    pub fn search_issues(&self, search_query: &str) -> ResultStream<Issue> {
        self.search_issues_with_limits(search_query, QueryLimits::default())
    }

    pub fn search_issues_with_limits(
        &self,
        search_query: &str,
        limits: QueryLimits,
    ) -> ResultStream<Issue> {
        self.run(PaginatedSearch::new(search_query.to_owned(), limits))
    }

    /// Return the logins of the users that can be assigned to issues in the
    /// given repository.  Only the first 100 users are returned.
    pub async fn assignable_users(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<String>, FetchError> {
        let query = AssignableUsers::new(owner.to_owned(), repo.to_owned());
        let data = execute(Arc::clone(&self.transport), query.payload()).await?;
        Ok(query.parse_response(data)?)
    }

    /// Run a [`QueryMachine`] to completion in a background task, yielding
    /// its outputs as they become available
    pub fn run<M>(&self, machine: M) -> ResultStream<M::Output>
    where
        M: QueryMachine + Send + 'static,
        M::Output: Send + 'static,
    {
        let (sender, receiver) = unbounded_channel();
        // The task ends on its own once the machine is done or the stream is
        // dropped, so its handle is not kept.
        tokio::spawn(drive(Arc::clone(&self.transport), machine, sender));
        ResultStream { receiver }
    }
}

async fn execute<T: Transport>(
    transport: Arc<T>,
    payload: QueryPayload,
) -> Result<JsonMap, FetchError> {
    tokio::task::spawn_blocking(move || transport.query(payload))
        .await?
        .map_err(Into::into)
}

async fn drive<T, M>(
    transport: Arc<T>,
    mut machine: M,
    sender: UnboundedSender<Result<M::Output, FetchError>>,
) where
    T: Transport,
    M: QueryMachine + Send,
    M::Output: Send,
{
    loop {
        for value in machine.get_output() {
            if sender.send(Ok(value)).is_err() {
                tracing::debug!("Result stream dropped; stopping");
                return;
            }
        }
        let Some(payload) = machine.get_next_query() else {
            break;
        };
        let outcome = match execute(Arc::clone(&transport), payload).await {
            Ok(data) => machine.handle_response(data),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            tracing::debug!(error = %e, "Query failed; ending result stream");
            for value in machine.get_output() {
                if sender.send(Ok(value)).is_err() {
                    return;
                }
            }
            let _ = sender.send(Err(e));
            return;
        }
    }
}

/// A stream of the values produced by a [`QueryMachine`] run via
/// [`GitHub::run()`]
#[derive(Debug)]
pub struct ResultStream<T> {
    receiver: UnboundedReceiver<Result<T, FetchError>>,
}

impl<T> Stream for ResultStream<T> {
    type Item = Result<T, FetchError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("failed to deserialize GraphQL response data")]
    Data(#[from] serde_json::Error),
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error("GraphQL request task failed")]
    Task(#[from] tokio::task::JoinError),
}
