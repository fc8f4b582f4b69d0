//! FakeSource: a SourceControl with canned modifications.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use modwatch::model::{FileAction, Modification, ModifiedFile, PollWindow, SourceKind};
use modwatch::vcs::{ConfigError, PollError, SourceControl};

pub struct FakeSource {
    modifications: Vec<Modification>,
    properties: BTreeMap<String, String>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            modifications: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Add a one-file modification at `time`.
    pub fn change(mut self, kind: SourceKind, time: DateTime<Utc>, revision: &str) -> Self {
        let mut m = Modification::new(kind, time);
        m.revision = revision.to_string();
        m.user_name = "tester".to_string();
        m.files
            .push(ModifiedFile::from_path("src/main.rs", FileAction::Modified, None));
        self.modifications.push(m);
        self
    }

    pub fn property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn boxed(self) -> Box<dyn SourceControl> {
        Box::new(self)
    }
}

impl SourceControl for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    fn get_modifications(&mut self, window: PollWindow) -> Result<Vec<Modification>, PollError> {
        Ok(self
            .modifications
            .iter()
            .filter(|m| window.contains(m.modified_time))
            .cloned()
            .collect())
    }

    fn take_properties(&mut self) -> BTreeMap<String, String> {
        self.properties.clone()
    }
}
