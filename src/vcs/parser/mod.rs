//! VCS output parsers
//!
//! Turns the raw text or XML each tool prints into [`Modification`]s. Parsers
//! are pure: no process spawning, no window filtering, no sorting. A
//! malformed entry inside otherwise valid output is skipped with a warning;
//! only output that cannot be read at all is a [`ParseError`].
//!
//! [`Modification`]: crate::model::Modification

mod clearcase;
mod cvs;
pub mod dates;
mod git;
mod mercurial;
mod svn;

pub use cvs::{CvsGrammar, CvsLogOptions};
pub use mercurial::HG_XML_TEMPLATE;

#[cfg(test)]
mod tests;

use thiserror::Error;

/// Output that could not be read at all
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Parser for VCS command output
pub struct Parser;
