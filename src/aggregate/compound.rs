//! Compound source: triggers decide, targets report

use std::collections::BTreeMap;

use tracing::debug;

use super::{Sources, poll_all, validate_block};
use crate::model::{Modification, PollWindow, Properties};
use crate::vcs::{ConfigError, PollError, SourceControl};

const ADAPTER: &str = "compound";
const TRIGGERS_REASON: &str =
    "Error: there must be exactly one \"triggers\" block in a compound block.";
const TARGETS_REASON: &str =
    "Error: there must be exactly one \"targets\" block in a compound block.";

/// Polls a trigger block and a target block over the same window
///
/// Target modifications are always reported. Trigger modifications are
/// added only with `include_trigger_changes`, together with the trigger
/// properties.
#[derive(Default)]
pub struct Compound {
    triggers: Option<Sources>,
    targets: Option<Sources>,
    include_trigger_changes: bool,
    properties: Properties,
}

impl Compound {
    pub fn new(include_trigger_changes: bool) -> Self {
        Self {
            include_trigger_changes,
            ..Default::default()
        }
    }

    pub fn set_triggers(&mut self, sources: Sources) -> Result<(), ConfigError> {
        if self.triggers.is_some() {
            return Err(ConfigError::Conflict {
                adapter: ADAPTER,
                reason: TRIGGERS_REASON.to_string(),
            });
        }
        self.triggers = Some(sources);
        Ok(())
    }

    pub fn set_targets(&mut self, sources: Sources) -> Result<(), ConfigError> {
        if self.targets.is_some() {
            return Err(ConfigError::Conflict {
                adapter: ADAPTER,
                reason: TARGETS_REASON.to_string(),
            });
        }
        self.targets = Some(sources);
        Ok(())
    }
}

impl std::fmt::Debug for Compound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compound")
            .field("triggers", &self.triggers.as_ref().map(Vec::len))
            .field("targets", &self.targets.as_ref().map(Vec::len))
            .field("include_trigger_changes", &self.include_trigger_changes)
            .finish()
    }
}

impl SourceControl for Compound {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_block(ADAPTER, "triggers", self.triggers.as_ref(), TRIGGERS_REASON)?;
        validate_block(ADAPTER, "targets", self.targets.as_ref(), TARGETS_REASON)
    }

    fn get_modifications(&mut self, window: PollWindow) -> Result<Vec<Modification>, PollError> {
        self.properties.reset();

        let (trigger_mods, trigger_props) = match self.triggers.as_mut() {
            Some(triggers) => poll_all(triggers, window)?,
            None => Default::default(),
        };
        let (mut modifications, target_props) = match self.targets.as_mut() {
            Some(targets) => poll_all(targets, window)?,
            None => Default::default(),
        };
        debug!(
            triggers = trigger_mods.len(),
            targets = modifications.len(),
            "Compound poll finished"
        );

        self.properties.extend(target_props);
        if self.include_trigger_changes {
            modifications.extend(trigger_mods);
            self.properties.extend(trigger_props);
        }
        Ok(crate::vcs::finish_poll(modifications, window))
    }

    fn take_properties(&mut self) -> BTreeMap<String, String> {
        self.properties.take()
    }
}
