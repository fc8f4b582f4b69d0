//! Data models for modwatch
//!
//! Tool-independent structures shared by every source control: the
//! normalized modification record, the polling window and the properties sink.

mod modification;
mod properties;
mod window;

pub use modification::{FileAction, Modification, ModifiedFile, SourceKind, sort_chronologically};
pub use properties::{Properties, TRUE_VALUE};
pub use window::PollWindow;
