//! modwatch - modification detection for version control systems
//!
//! Polls CVS, Subversion, Git, Mercurial and ClearCase (plus build status
//! logs of other projects) for the changes made in a time window and
//! normalizes them into one changeset model.
//!
//! This library provides:
//! - [`model`]: Modification data model, polling window, properties sink
//! - [`exec`]: External command execution
//! - [`vcs`]: Per-tool sources and output parsers
//! - [`aggregate`]: Compound, veto and project status sources
//! - [`config`]: TOML configuration
//! - [`logging`]: Tracing subscriber setup

pub mod aggregate;
pub mod config;
pub mod exec;
pub mod logging;
pub mod model;
pub mod vcs;
