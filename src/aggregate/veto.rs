//! Veto: hold a build until a dependency has rebuilt

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{Sources, poll_all, validate_block};
use crate::model::{Modification, PollWindow, Properties};
use crate::vcs::{ConfigError, PollError, SourceControl};

const ADAPTER: &str = "veto";

/// Reports trigger changes only once the companion build status has caught up
///
/// The companion is usually a [`BuildStatus`](crate::vcs::BuildStatus); the
/// newest modification it reports is taken as the dependency's last
/// successful build.
#[derive(Default)]
pub struct Veto {
    triggers: Option<Sources>,
    build_status: Option<Box<dyn SourceControl>>,
    properties: Properties,
}

impl Veto {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_triggers(&mut self, sources: Sources) -> Result<(), ConfigError> {
        if self.triggers.is_some() {
            return Err(ConfigError::Conflict {
                adapter: ADAPTER,
                reason: "only one nested triggers allowed".to_string(),
            });
        }
        self.triggers = Some(sources);
        Ok(())
    }

    pub fn set_build_status(&mut self, source: Box<dyn SourceControl>) -> Result<(), ConfigError> {
        if self.build_status.is_some() {
            return Err(ConfigError::Conflict {
                adapter: ADAPTER,
                reason: "only one nested buildstatus allowed".to_string(),
            });
        }
        self.build_status = Some(source);
        Ok(())
    }
}

impl std::fmt::Debug for Veto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Veto")
            .field("triggers", &self.triggers.as_ref().map(Vec::len))
            .field("build_status", &self.build_status.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl SourceControl for Veto {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_block(
            ADAPTER,
            "triggers",
            self.triggers.as_ref(),
            "a nested triggers block is required",
        )?;
        match &self.build_status {
            Some(status) => status.validate(),
            None => Err(ConfigError::Missing {
                adapter: ADAPTER,
                field: "buildstatus",
            }),
        }
    }

    fn get_modifications(&mut self, window: PollWindow) -> Result<Vec<Modification>, PollError> {
        self.properties.reset();

        let (trigger_mods, trigger_props) = match self.triggers.as_mut() {
            Some(triggers) => poll_all(triggers, window)?,
            None => return Ok(Vec::new()),
        };
        let Some(latest_trigger) = trigger_mods.iter().map(|m| m.modified_time).max() else {
            debug!("No trigger changes, nothing to veto");
            return Ok(Vec::new());
        };

        let status_mods = match self.build_status.as_mut() {
            Some(status) => {
                let mods = status.get_modifications(window)?;
                status.take_properties();
                mods
            }
            None => Vec::new(),
        };
        let Some(last_build) = status_mods.iter().map(|m| m.modified_time).max() else {
            return Err(PollError::InconsistentBuildStatus);
        };
        if last_build < latest_trigger {
            info!(%last_build, %latest_trigger, "Dependency has not rebuilt past the trigger changes");
            return Err(PollError::BuildStatusOutOfDate {
                latest_trigger,
                last_build,
            });
        }

        self.properties.extend(trigger_props);
        Ok(crate::vcs::finish_poll(trigger_mods, window))
    }

    fn take_properties(&mut self) -> BTreeMap<String, String> {
        self.properties.take()
    }
}
