//! ClearCase output parser (cleartool lshistory -fmt)

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::dates::in_local_zone;
use super::{ParseError, Parser};
use crate::model::{FileAction, Modification, ModifiedFile, SourceKind};
use crate::vcs::EmailAliases;
use crate::vcs::constants::clearcase::{END_OF_ENTRY, FIELD_DELIMITER, HISTORY_DATE_FORMAT};

/// Fields per entry; the trailing comment may be absent
const MAX_FIELDS: usize = 8;
const MIN_FIELDS: usize = MAX_FIELDS - 1;

impl Parser {
    /// Parse `cleartool lshistory` output produced with the history format
    ///
    /// Each entry is
    /// `user#~#yyyyMMdd.HHmmss#~#element#~#version#~#operation#~#!labels#~#!attrs#~#comment`
    /// terminated by the end-of-entry marker. Comments may span lines.
    /// Branch creation/removal and `@@` extended names are skipped. Dates
    /// carry no zone and are read in the host zone.
    pub fn parse_clearcase_history(
        output: &str,
        aliases: &EmailAliases,
    ) -> Result<Vec<Modification>, ParseError> {
        Ok(output
            .split(END_OF_ENTRY)
            .map(|chunk| chunk.trim_start_matches(['\r', '\n']))
            .filter(|chunk| !chunk.trim().is_empty())
            .filter_map(|chunk| Self::parse_clearcase_entry(chunk, aliases))
            .collect())
    }

    fn parse_clearcase_entry(entry: &str, aliases: &EmailAliases) -> Option<Modification> {
        let fields: Vec<&str> = entry.splitn(MAX_FIELDS, FIELD_DELIMITER).collect();
        if fields.len() < MIN_FIELDS {
            warn!(entry, "Truncated ClearCase history entry, skipping");
            return None;
        }

        let user = fields[0].trim();
        let stamp = fields[1].trim();
        let element = fields[2].trim();
        let version = fields[3].trim();
        let operation = fields[4].trim();
        let comment = fields.get(7).map(|c| c.trim()).unwrap_or_default();

        if matches!(operation, "mkbranch" | "rmbranch") {
            debug!(element, operation, "Ignoring ClearCase branch event");
            return None;
        }
        if element.contains("@@") {
            return None;
        }

        let Some(time) = NaiveDateTime::parse_from_str(stamp, HISTORY_DATE_FORMAT)
            .ok()
            .and_then(in_local_zone)
        else {
            warn!(element, stamp, "Unparsable ClearCase date, skipping entry");
            return None;
        };

        let action = match operation {
            "mkelem" => FileAction::Added,
            "checkin" => FileAction::Modified,
            "rmelem" | "rmname" => FileAction::Deleted,
            other => FileAction::Other(other.to_string()),
        };

        let mut modification = Modification::new(SourceKind::ClearCase, time);
        modification.user_name = user.to_string();
        modification.email_address = aliases.resolve(user);
        modification.comment = comment.to_string();
        modification.revision = version.to_string();
        modification.files.push(ModifiedFile::from_path(
            element,
            action,
            Some(version.to_string()),
        ));
        Some(modification)
    }
}
