//! Properties sink
//!
//! Key/value side channel populated during one poll and read once afterward.
//! Flags are written as the literal `"true"`; an absent key is the negative
//! signal, never `"false"`.

use std::collections::BTreeMap;

use super::Modification;

/// Value written for boolean-ish flags
pub const TRUE_VALUE: &str = "true";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    /// Name of the "changes exist" flag, if configured
    modification_name: Option<String>,

    /// Name of the "a deletion occurred" flag, if configured
    deletion_name: Option<String>,

    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink with the two conventional flag names
    pub fn with_names(modification: Option<String>, deletion: Option<String>) -> Self {
        Self {
            modification_name: modification,
            deletion_name: deletion,
            values: BTreeMap::new(),
        }
    }

    /// Set the "changes exist" flag (no-op when no name is configured)
    pub fn modification_found(&mut self) {
        if let Some(name) = &self.modification_name {
            self.values.insert(name.clone(), TRUE_VALUE.to_string());
        }
    }

    /// Set the "a deletion occurred" flag (no-op when no name is configured)
    pub fn deletion_found(&mut self) {
        if let Some(name) = &self.deletion_name {
            self.values.insert(name.clone(), TRUE_VALUE.to_string());
        }
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn extend(&mut self, other: BTreeMap<String, String>) {
        self.values.extend(other);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Clear accumulated values, keeping the configured flag names
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Return the accumulated values and reset the sink
    pub fn take(&mut self) -> BTreeMap<String, String> {
        std::mem::take(&mut self.values)
    }

    /// Set the conventional flags from one poll's result
    pub fn record_standard(&mut self, modifications: &[Modification]) {
        if !modifications.is_empty() {
            self.modification_found();
        }
        if modifications.iter().any(Modification::has_deletion) {
            self.deletion_found();
        }
    }
}
