use super::{Query, Variable, parse_data};
use crate::types::{JsonMap, NodeList, Singleton};
use indoc::indoc;
use std::fmt::{self, Write};

/// How many assignable users to request.  Only the first page is ever
/// fetched.
const ASSIGNABLE_USERS_LIMIT: usize = 100;

/// A [`Query`] for the logins of the users that can be assigned to issues in
/// a given GitHub repository
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssignableUsers {
    /// The login of the repository's owner
    owner: String,

    /// The name of the repository
    name: String,
}

impl AssignableUsers {
    pub fn new(owner: String, name: String) -> AssignableUsers {
        AssignableUsers { owner, name }
    }
}

impl Query for AssignableUsers {
    type Output = Vec<String>;

    fn write_graphql<W: Write>(&self, mut s: W) -> fmt::Result {
        write!(
            s,
            indoc! {"
            repository(owner: $owner, name: $name) {{
                assignableUsers(first: {limit}) {{
                    nodes {{
                        login
                    }}
                }}
            }}
        "},
            limit = ASSIGNABLE_USERS_LIMIT,
        )
    }

    fn variables(&self) -> [(String, Variable); 2] {
        [
            (
                String::from("owner"),
                Variable::new("String!", self.owner.clone()),
            ),
            (
                String::from("name"),
                Variable::new("String!", self.name.clone()),
            ),
        ]
    }

    fn parse_response(&self, data: JsonMap) -> Result<Vec<String>, serde_json::Error> {
        let users = parse_data::<Singleton<Singleton<NodeList<Singleton<String>>>>>(data)?;
        Ok(users.0.0.into_vec().into_iter().map(|s| s.0).collect())
    }
}
