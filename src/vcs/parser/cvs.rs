//! CVS output parser (cvs log / rlog, cvs version, CVSROOT/users)

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use super::dates::{parse_date_time_with_zone, utc_offset};
use super::{ParseError, Parser};
use crate::model::{FileAction, Modification, ModifiedFile, SourceKind};
use crate::vcs::EmailAliases;
use crate::vcs::ToolVersion;
use crate::vcs::constants::cvs::{
    BRANCHES, DEAD_STATE, FILE_DELIMITER, INITIALLY_ADDED_ON_BRANCH, RCS_FILE, REVISION,
    REVISION_DELIMITER, WORKING_FILE,
};
use crate::vcs::constants::{CVS_FALLBACK_VERSION, CVS_MODERN_LOG_VERSION};

/// Date grammar of `cvs log` output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvsGrammar {
    /// `date: 2002/03/13 19:56:34;` always GMT
    Legacy,
    /// `date: 2004-03-25 00:58:49 +0000;` offset optional, slash dates allowed
    Modern,
}

impl CvsGrammar {
    /// Modern only for CVS (not CVSNT) at or past the threshold version
    pub fn for_version(version: &ToolVersion) -> Self {
        if version.is_at_least("CVS", CVS_MODERN_LOG_VERSION) {
            Self::Modern
        } else {
            Self::Legacy
        }
    }
}

/// Context needed to interpret a log
#[derive(Debug, Clone, Copy)]
pub struct CvsLogOptions<'a> {
    pub grammar: CvsGrammar,
    /// Repository path (CVSROOT after its last ':') when parsing `rlog`
    /// output, where file paths come from the `RCS file:` line
    pub repository_root: Option<&'a str>,
    pub aliases: &'a EmailAliases,
}

impl Parser {
    /// Parse `cvs log` / `cvs rlog` output
    ///
    /// Format (one block per file, one entry per revision):
    /// ```text
    /// RCS file: /cvsroot/project/main/build.xml,v
    /// Working file: main/build.xml
    /// ...header...
    /// ----------------------------
    /// revision 1.2
    /// date: 2002/03/13 19:56:34;  author: alden;  state: Exp;  lines: +1 -1
    /// message
    /// =============================================================================
    /// ```
    ///
    /// Produces one Modification per file revision; CVS has no transactions.
    pub fn parse_cvs_log(
        output: &str,
        options: &CvsLogOptions<'_>,
    ) -> Result<Vec<Modification>, ParseError> {
        let mut modifications = Vec::new();
        let mut lines = output.lines();

        while let Some(line) = lines.next() {
            let Some(rcs_path) = line.strip_prefix(RCS_FILE) else {
                continue;
            };
            let block: Vec<&str> = lines
                .by_ref()
                .take_while(|l| !l.starts_with(FILE_DELIMITER))
                .collect();
            modifications.extend(Self::parse_cvs_file_block(rcs_path, &block, options));
        }

        Ok(modifications)
    }

    fn parse_cvs_file_block(
        rcs_path: &str,
        block: &[&str],
        options: &CvsLogOptions<'_>,
    ) -> Vec<Modification> {
        let mut sections = block.split(|l| *l == REVISION_DELIMITER);
        let header = sections.next().unwrap_or_default();

        let working_file = options
            .repository_root
            .and_then(|root| Self::working_file_from_rcs(rcs_path, root))
            .or_else(|| {
                header
                    .iter()
                    .find_map(|l| l.strip_prefix(WORKING_FILE))
                    .map(|p| p.trim().to_string())
            })
            .or_else(|| Self::working_file_from_rcs(rcs_path, ""));
        let Some(path) = working_file else {
            warn!(rcs_file = %rcs_path.trim(), "No working file for CVS log block, skipping");
            return Vec::new();
        };

        sections
            .filter_map(|entry| Self::parse_cvs_revision(&path, entry, options))
            .collect()
    }

    /// Derive the repository-relative path from an `RCS file:` value
    ///
    /// `/cvsroot/proj/main/Attic/old.txt,v` with root `/cvsroot/proj`
    /// becomes `main/old.txt`. An empty root keeps the whole path.
    pub(super) fn working_file_from_rcs(rcs_path: &str, root: &str) -> Option<String> {
        let relative = rcs_path
            .trim()
            .strip_prefix(root.trim_end_matches('/'))?
            .trim_start_matches('/');
        let relative = relative.strip_suffix(",v").unwrap_or(relative);
        let relative = relative.replace("/Attic/", "/");
        let relative = relative.strip_prefix("Attic/").unwrap_or(&relative);
        (!relative.is_empty()).then(|| relative.to_string())
    }

    fn parse_cvs_revision(
        path: &str,
        entry: &[&str],
        options: &CvsLogOptions<'_>,
    ) -> Option<Modification> {
        let mut lines = entry.iter().copied();

        // "revision 1.2" possibly followed by "\tlocked by: ..."
        let revision = lines
            .next()?
            .strip_prefix(REVISION)?
            .split_whitespace()
            .next()?
            .to_string();

        let date_line = lines.next()?;
        let fields = Self::cvs_date_line_fields(date_line)?;
        let field = |key: &str| fields.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

        let Some(modified_time) = field("date").and_then(|d| Self::parse_cvs_date(d, options.grammar))
        else {
            warn!(file = %path, revision = %revision, date_line, "Unparsable CVS date, skipping revision");
            return None;
        };
        let author = field("author")?.to_string();
        let state = field("state").unwrap_or_default();
        let has_line_counts = field("lines").is_some();

        let mut message: Vec<&str> = lines.collect();
        if message.first().is_some_and(|l| l.starts_with(BRANCHES)) {
            message.remove(0);
        }
        let comment = message.join("\n");

        let action = if state == DEAD_STATE {
            if comment.contains(INITIALLY_ADDED_ON_BRANCH) {
                return None;
            }
            FileAction::Deleted
        } else if has_line_counts {
            FileAction::Modified
        } else {
            FileAction::Added
        };

        let mut modification = Modification::new(SourceKind::Cvs, modified_time);
        modification.email_address = options.aliases.resolve(&author);
        modification.user_name = author;
        modification.comment = comment;
        modification.files.push(ModifiedFile::from_path(
            path,
            action,
            Some(revision.clone()),
        ));
        modification.revision = revision;
        Some(modification)
    }

    /// Split `date: ...;  author: x;  state: Exp;  lines: +1 -1` into pairs
    fn cvs_date_line_fields(line: &str) -> Option<Vec<(&str, &str)>> {
        let fields: Vec<(&str, &str)> = line
            .split(';')
            .filter_map(|part| part.split_once(':'))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();
        (fields.first()?.0 == "date").then_some(fields)
    }

    pub(super) fn parse_cvs_date(value: &str, grammar: CvsGrammar) -> Option<DateTime<Utc>> {
        match grammar {
            CvsGrammar::Legacy => NaiveDateTime::parse_from_str(value.trim(), "%Y/%m/%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc()),
            CvsGrammar::Modern => parse_date_time_with_zone(value, utc_offset()),
        }
    }

    /// Parse `cvs version` output
    ///
    /// Formats:
    /// ```text
    /// Client: Concurrent Versions System (CVS) 1.11.16 (client/server)
    /// Server: Concurrent Versions System (CVS) 1.11.16 (client/server)
    /// ```
    /// or a single `Concurrent Versions System (CVS) 1.12.13 (client/server)`.
    /// The server line wins when present. Anything unreadable yields the
    /// legacy fallback version.
    pub fn parse_cvs_version(output: &str) -> ToolVersion {
        let lines: Vec<&str> = output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let line = lines
            .iter()
            .find(|l| l.starts_with("Server:"))
            .or_else(|| lines.first())
            .copied();

        line.and_then(Self::parse_cvs_version_line).unwrap_or_else(|| {
            warn!(output = %output.trim(), "Unreadable CVS version, assuming legacy server");
            ToolVersion::new(CVS_FALLBACK_VERSION.0, CVS_FALLBACK_VERSION.1)
        })
    }

    fn parse_cvs_version_line(line: &str) -> Option<ToolVersion> {
        let open = line.find(" (")?;
        let after_open = &line[open + 2..];
        let close = after_open.find(") ")?;
        let name = &after_open[..close];
        let version = after_open[close + 2..].split_whitespace().next()?;
        if name.is_empty() {
            return None;
        }
        Some(ToolVersion::new(name, version))
    }

    /// Parse the `CVSROOT/users` file: `user:address` per line
    ///
    /// Example: `roberto:'Roberto DaMana <damana@cs.unipr.it>'`. Lines
    /// without a colon are ignored.
    pub fn parse_cvs_users(output: &str) -> EmailAliases {
        output
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(user, address)| (user.trim(), address.trim()))
            .filter(|(user, address)| !user.is_empty() && !address.is_empty())
            .collect()
    }
}
