use serde::{
    Deserialize, Serialize,
    de::{self, Deserializer, IgnoredAny, MapAccess, Visitor},
};
use std::fmt;
use std::marker::PhantomData;

pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// An opaque GraphQL pagination cursor
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Cursor {
        Cursor(value)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Cursor {
        Cursor(value.to_owned())
    }
}

impl From<Cursor> for serde_json::Value {
    fn from(value: Cursor) -> serde_json::Value {
        value.0.into()
    }
}

/// One page of a GraphQL connection, deserialized from an object with
/// `nodes` and `pageInfo` fields
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(from = "Connection<T>")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub end_cursor: Option<Cursor>,
    pub has_next_page: bool,
}

impl<T> From<Connection<T>> for Page<T> {
    fn from(value: Connection<T>) -> Page<T> {
        Page {
            items: value.nodes,
            end_cursor: value.page_info.end_cursor,
            has_next_page: value.page_info.has_next_page,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    nodes: Vec<T>,
    page_info: PageInfo,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub(crate) end_cursor: Option<Cursor>,
    pub(crate) has_next_page: bool,
}

/// The `nodes` of a connection queried without its `pageInfo`
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub(crate) struct NodeList<T> {
    pub(crate) nodes: Vec<T>,
}

impl<T> NodeList<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        self.nodes
    }
}

// Utility type for use in deserializing just `foo` from a map of the form
// `{"anything": foo}`, e.g., `{"login": "octocat"}` or `{"search": {...}}`
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Singleton<T>(pub(crate) T);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Singleton<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SingletonVisitor(PhantomData))
    }
}

struct SingletonVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for SingletonVisitor<T> {
    type Value = Singleton<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string-keyed map containing a single field")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let Some((_, value)) = map.next_entry::<String, T>()? else {
            return Err(de::Error::invalid_length(0, &self));
        };
        if map.next_entry::<String, IgnoredAny>()?.is_some() {
            Err(de::Error::invalid_length(
                map.size_hint().unwrap_or(0).saturating_add(2),
                &self,
            ))
        } else {
            Ok(Singleton(value))
        }
    }
}
