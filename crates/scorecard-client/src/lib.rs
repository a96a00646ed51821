mod github;
mod issue;
mod machine;
mod queries;
mod types;
pub use crate::github::*;
pub use crate::issue::*;
pub use crate::machine::*;
pub use crate::queries::*;
pub use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ureq::{
    Agent, SendBody,
    http::{
        Request,
        header::{AUTHORIZATION, HeaderValue, InvalidHeaderValue},
    },
    middleware::MiddlewareNext,
};

static GRAPHQL_API_URL: &str = "https://api.github.com/graphql";

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A blocking GraphQL transport: something that can submit a query payload
/// and return the `data` of a successful response
pub trait Transport: Send + Sync + 'static {
    fn query(&self, payload: QueryPayload) -> Result<JsonMap, QueryError>;
}

/// An HTTP client for the GitHub GraphQL API that authenticates every
/// request with a bearer token
#[derive(Clone, Debug)]
pub struct Client {
    inner: Agent,
}

impl Client {
    pub fn new(token: &str) -> Result<Client, BuildClientError> {
        let auth = HeaderValue::from_str(&format!("Bearer {token}"))?;
        let inner = Agent::config_builder()
            .https_only(true)
            .user_agent(USER_AGENT)
            .middleware(
                move |mut req: Request<SendBody<'_>>, next: MiddlewareNext<'_>| {
                    let _ = req.headers_mut().insert(AUTHORIZATION, auth.clone());
                    next.handle(req)
                },
            )
            .build()
            .into();
        Ok(Client { inner })
    }

    pub fn new_with_local_token() -> Result<Client, BuildClientError> {
        let token = gh_token::get()?;
        Client::new(&token)
    }

    pub fn query(&self, payload: QueryPayload) -> Result<JsonMap, QueryError> {
        let bytes = self
            .inner
            .post(GRAPHQL_API_URL)
            .send_json(payload)
            .map_err(|e| QueryError::Http(Box::new(e)))?
            .into_body()
            .read_to_vec()
            .map_err(|e| QueryError::Read(Box::new(e)))?;
        serde_json::from_slice::<Response>(&bytes)?
            .into_data()
            .map_err(Into::into)
    }
}

impl Transport for Client {
    fn query(&self, payload: QueryPayload) -> Result<JsonMap, QueryError> {
        Client::query(self, payload)
    }
}

#[derive(Debug, Error)]
pub enum BuildClientError {
    #[error("invalid authorization token")]
    Auth(#[from] InvalidHeaderValue),
    #[error("failed to fetch GitHub access token")]
    GetToken(#[from] gh_token::Error),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to perform GraphQL request")]
    Http(#[source] Box<ureq::Error>),
    #[error("failed to read GraphQL response")]
    Read(#[source] Box<ureq::Error>),
    #[error("failed to deserialize GraphQL response")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    GraphQL(#[from] GqlError),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct QueryPayload {
    pub query: String,
    pub variables: JsonMap,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct Response {
    #[serde(default)]
    data: Option<JsonMap>,
    #[serde(default)]
    errors: GqlError,
}

impl Response {
    // Any reported error fails the whole response, even if `data` was also
    // returned.
    fn into_data(self) -> Result<JsonMap, GqlError> {
        if self.errors.is_empty() {
            Ok(self.data.unwrap_or_default())
        } else {
            Err(self.errors)
        }
    }
}

/// The errors reported in a GraphQL response
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct GqlError(Vec<GqlInnerError>);

impl GqlError {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.message.as_str())
    }
}

impl fmt::Display for GqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in response: ")?;
        let mut first = true;
        for msg in self.messages() {
            if !std::mem::take(&mut first) {
                write!(f, ", ")?;
            }
            write!(f, "{msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for GqlError {}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct GqlInnerError {
    message: String,
}
