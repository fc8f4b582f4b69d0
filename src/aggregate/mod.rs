//! Aggregating sources
//!
//! Sources that compose other sources behind the same [`SourceControl`]
//! contract: [`Compound`] (triggers decide, targets report), [`Veto`]
//! (hold builds until a dependency has rebuilt) and [`ProjectStatus`]
//! (another project's build outcome as a pseudo-VCS).

mod compound;
mod project_status;
mod veto;

pub use compound::Compound;
pub use project_status::{LogDirProject, ProjectQuery, ProjectStatus, ProjectStatusConfig};
pub use veto::Veto;

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{Modification, PollWindow};
use crate::vcs::{ConfigError, PollError, SourceControl};

/// An ordered block of nested sources
pub type Sources = Vec<Box<dyn SourceControl>>;

/// Poll every source over the same window, collecting their properties
///
/// Aggregation errors from a nested source abort the whole block.
pub(crate) fn poll_all(
    sources: &mut [Box<dyn SourceControl>],
    window: PollWindow,
) -> Result<(Vec<Modification>, BTreeMap<String, String>), PollError> {
    let mut modifications = Vec::new();
    let mut properties = BTreeMap::new();
    for source in sources.iter_mut() {
        let found = source.get_modifications(window)?;
        debug!(source = source.name(), count = found.len(), "Nested source polled");
        modifications.extend(found);
        properties.extend(source.take_properties());
    }
    Ok((modifications, properties))
}

/// Validate a nested block: present, non-empty, and every child valid
pub(crate) fn validate_block(
    adapter: &'static str,
    block: &'static str,
    sources: Option<&Sources>,
    missing_reason: &str,
) -> Result<(), ConfigError> {
    let Some(sources) = sources else {
        return Err(ConfigError::Invalid {
            adapter,
            reason: missing_reason.to_string(),
        });
    };
    if sources.is_empty() {
        return Err(ConfigError::Invalid {
            adapter,
            reason: format!(
                "Error: there must be at least one source control in a {} block.",
                block
            ),
        });
    }
    sources.iter().try_for_each(|s| s.validate())
}
