//! Tool-specific constants
//!
//! Centralized definitions for VCS binary names, subcommands, flags,
//! output markers and date formats.

/// Tool binary names
pub mod programs {
    pub const CVS: &str = "cvs";
    pub const SVN: &str = "svn";
    pub const GIT: &str = "git";
    pub const HG: &str = "hg";
    pub const CLEARTOOL: &str = "cleartool";
}

/// Minimum CVS server version whose `log` output uses ISO dates with offsets
///
/// Derived from the CVS changelog; revise here if a server proves otherwise.
pub const CVS_MODERN_LOG_VERSION: &str = "1.12.9";

/// Version assumed when the CVS version probe fails
pub const CVS_FALLBACK_VERSION: (&str, &str) = ("CVS", "1.11");

/// CVS command pieces and log markers
pub mod cvs {
    pub const LOG: &str = "log";
    pub const RLOG: &str = "rlog";
    pub const VERSION: &str = "version";
    pub const CHECKOUT: &str = "co";
    pub const QUIET: &str = "-q";
    pub const REALLY_QUIET: &str = "-Q";
    pub const CVSROOT: &str = "-d";
    pub const NO_TAGS: &str = "-N";
    pub const SKIP_EMPTY: &str = "-S";
    pub const DEFAULT_BRANCH: &str = "-b";
    pub const TO_STDOUT: &str = "-p";
    pub const USERS_FILE: &str = "CVSROOT/users";
    pub const HEAD_TAG: &str = "HEAD";
    /// Date format of the `-d` window argument (always GMT)
    pub const WINDOW_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S GMT";

    pub const RCS_FILE: &str = "RCS file: ";
    pub const WORKING_FILE: &str = "Working file: ";
    pub const REVISION: &str = "revision ";
    pub const BRANCHES: &str = "branches:";
    pub const REVISION_DELIMITER: &str = "----------------------------";
    pub const FILE_DELIMITER: &str =
        "=============================================================================";
    pub const DEAD_STATE: &str = "dead";
    pub const INITIALLY_ADDED_ON_BRANCH: &str = "was initially added on branch";
    /// Marker CVS prints on stderr when a command gives up
    pub const ABORTED: &str = "aborted]";
    /// Directory marking a checked-out CVS working copy
    pub const ADMIN_DIR: &str = "CVS";
}

/// Subversion command pieces
pub mod svn {
    pub const LOG: &str = "log";
    pub const INFO: &str = "info";
    pub const NON_INTERACTIVE: &str = "--non-interactive";
    pub const XML: &str = "--xml";
    pub const VERBOSE: &str = "-v";
    pub const REVISION: &str = "-r";
    pub const CONFIG_DIR: &str = "--config-dir";
    pub const NO_AUTH_CACHE: &str = "--no-auth-cache";
    pub const USERNAME: &str = "--username";
    pub const PASSWORD: &str = "--password";
    /// Date format inside `{...}` revision arguments (always UTC)
    pub const WINDOW_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
    pub const REVISION_PROPERTY: &str = "svnrevision";
}

/// Git command pieces
pub mod git {
    pub const LOG: &str = "log";
    pub const PATCH: &str = "-p";
    pub const PRETTY_RAW: &str = "--pretty=raw";
    pub const COMMIT_ID_PROPERTY: &str = "gitcommitid";
}

/// Mercurial command pieces
pub mod hg {
    pub const INCOMING: &str = "incoming";
    pub const DEBUG: &str = "--debug";
    pub const TEMPLATE: &str = "--template";
    /// Exit code of `hg incoming` when there is nothing to pull
    pub const NO_CHANGES_EXIT_CODE: i32 = 1;
}

/// ClearCase command pieces
pub mod clearcase {
    pub const LSHISTORY: &str = "lshistory";
    pub const BRANCH: &str = "-branch";
    pub const RECURSIVE: &str = "-r";
    pub const ALL: &str = "-all";
    pub const NO_CHECKOUTS: &str = "-nco";
    pub const SINCE: &str = "-since";
    pub const FORMAT: &str = "-fmt";
    /// `-since` date format, local time with English month names
    pub const SINCE_DATE_FORMAT: &str = "%d-%B-%Y.%H:%M:%S";
    /// Numeric `%Nd` date as printed by lshistory (no zone)
    pub const HISTORY_DATE_FORMAT: &str = "%Y%m%d.%H%M%S";
    pub const FIELD_DELIMITER: &str = "#~#";
    pub const END_OF_ENTRY: &str = "@#@#@#@#@#@#@#@#@#@#@#@";
    /// `-fmt` argument; cleartool expands the literal `\n` itself
    pub const HISTORY_FORMAT: &str =
        "%u#~#%Nd#~#%En#~#%Vn#~#%o#~#!%l#~#!%a#~#%Nc@#@#@#@#@#@#@#@#@#@#@#@\\n";
    pub const LAST_BUILD_PROPERTY: &str = "clearcaselastbuild";
    pub const NOW_PROPERTY: &str = "clearcasenow";
    /// Property date format for the two properties above
    pub const PROPERTY_DATE_FORMAT: &str = "%d-%B-%Y.%H:%M:%S";
}

/// Build log naming used by build status sources
pub mod build_log {
    pub const PREFIX: &str = "log";
    pub const SUFFIX: &str = ".xml";
    pub const LABEL_MARKER: char = 'L';
    pub const TIME_FORMAT: &str = "%Y%m%d%H%M%S";
    pub const USER_PREFIX: &str = "cc-";
    pub const UNKNOWN_PROJECT: &str = "Unknown";

    pub const MOST_RECENT_LOGDIR: &str = "most.recent.logdir";
    pub const MOST_RECENT_LOGFILE: &str = "most.recent.logfile";
    pub const MOST_RECENT_LOGTIME: &str = "most.recent.logtime";
    pub const MOST_RECENT_LOGLABEL: &str = "most.recent.loglabel";
}
