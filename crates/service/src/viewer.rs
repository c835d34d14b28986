use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated identity a request is evaluated for. `global_admin`
/// is resolved once, at authentication time, against the configured
/// allow-list; every authorization predicate downstream only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewer {
    pub id: Uuid,
    pub username: String,
    pub global_admin: bool,
}

impl Viewer {
    pub fn new(id: Uuid, username: impl Into<String>, admins: &GlobalAdmins) -> Self {
        let username = username.into();
        let global_admin = admins.contains(&username);
        Self { id, username, global_admin }
    }
}

/// Immutable allow-list of globally-privileged usernames, loaded from
/// configuration at process start. Matching is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct GlobalAdmins(HashSet<String>);

impl GlobalAdmins {
    pub fn new<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            usernames
                .into_iter()
                .map(|u| u.as_ref().to_ascii_lowercase())
                .collect(),
        )
    }

    pub fn contains(&self, username: &str) -> bool {
        self.0.contains(&username.to_ascii_lowercase())
    }
}
