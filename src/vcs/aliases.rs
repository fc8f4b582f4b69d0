//! Username to email alias table

use std::collections::BTreeMap;

use serde::Deserialize;

/// Maps a VCS username to an email address (or a quoted display string)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct EmailAliases(BTreeMap<String, String>);

impl EmailAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user: impl Into<String>, address: impl Into<String>) {
        self.0.insert(user.into(), address.into());
    }

    /// Look up a username; unmapped users resolve to None
    pub fn resolve(&self, user: &str) -> Option<String> {
        self.0.get(user).cloned()
    }

    /// Overlay `other` on top of this table (other wins)
    pub fn merged_with(&self, other: &EmailAliases) -> EmailAliases {
        let mut merged = self.clone();
        merged
            .0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EmailAliases {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
