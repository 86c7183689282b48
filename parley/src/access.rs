//! Allow list for inbound senders.

use std::collections::BTreeSet;

/// Usernames allowed to use the relay. An empty list allows everyone.
///
/// Names compare case-insensitively and a leading `@` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed: BTreeSet<String>,
}

fn normalize(user: &str) -> String {
    user.trim().trim_start_matches('@').to_lowercase()
}

impl AccessPolicy {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = users
            .into_iter()
            .map(|user| normalize(user.as_ref()))
            .filter(|user| !user.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Senders without a username are only let in when the list is open.
    pub fn allows(&self, user: Option<&str>) -> bool {
        if self.is_open() {
            return true;
        }
        user.is_some_and(|user| self.allowed.contains(&normalize(user)))
    }
}
