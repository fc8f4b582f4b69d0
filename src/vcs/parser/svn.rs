//! Subversion output parser (svn log --xml, svn info --xml)

use roxmltree::{Document, Node};
use tracing::warn;

use super::dates::from_rfc3339;
use super::{ParseError, Parser};
use crate::model::{FileAction, Modification, ModifiedFile, SourceKind};
use crate::vcs::EmailAliases;

impl Parser {
    /// Parse `svn log --xml -v` output
    ///
    /// Format:
    /// ```xml
    /// <log>
    ///   <logentry revision="663">
    ///     <author>lee</author>
    ///     <date>2004-12-30T10:15:30.123456Z</date>
    ///     <paths><path action="A">/trunk/a.txt</path></paths>
    ///     <msg>message</msg>
    ///   </logentry>
    /// </log>
    /// ```
    ///
    /// One Modification per log entry (an SVN revision is a transaction).
    /// Entries without a parsable date are skipped.
    pub fn parse_svn_log(xml: &str, aliases: &EmailAliases) -> Result<Vec<Modification>, ParseError> {
        if xml.trim().is_empty() {
            return Ok(Vec::new());
        }
        let doc = Document::parse(xml)?;

        Ok(doc
            .descendants()
            .filter(|n| n.has_tag_name("logentry"))
            .filter_map(|entry| Self::parse_svn_entry(entry, aliases))
            .collect())
    }

    fn parse_svn_entry(entry: Node<'_, '_>, aliases: &EmailAliases) -> Option<Modification> {
        let revision = entry.attribute("revision")?.to_string();
        let date = child_text(entry, "date");
        let Some(modified_time) = from_rfc3339(date) else {
            warn!(revision = %revision, date, "Unparsable SVN date, skipping entry");
            return None;
        };

        let author = child_text(entry, "author").to_string();
        let mut modification = Modification::new(SourceKind::Svn, modified_time);
        modification.email_address = aliases.resolve(&author);
        modification.user_name = author;
        modification.comment = child_text(entry, "msg").to_string();
        modification.files = entry
            .descendants()
            .filter(|n| n.has_tag_name("path"))
            .filter_map(|path| {
                let text = path.text()?.trim();
                (!text.is_empty()).then(|| {
                    ModifiedFile::from_path(text, Self::svn_action(path.attribute("action")), None)
                })
            })
            .collect();
        modification.revision = revision;
        Some(modification)
    }

    fn svn_action(code: Option<&str>) -> FileAction {
        match code {
            Some("A") => FileAction::Added,
            Some("M") => FileAction::Modified,
            Some("D") => FileAction::Deleted,
            Some("R") => FileAction::Other("replaced".to_string()),
            Some(other) => FileAction::Other(other.to_lowercase()),
            None => FileAction::Other("unknown".to_string()),
        }
    }

    /// Read the revision of the first `<entry>` in `svn info --xml` output
    pub fn parse_svn_info_revision(xml: &str) -> Result<Option<String>, ParseError> {
        let doc = Document::parse(xml)?;
        Ok(doc
            .descendants()
            .find(|n| n.has_tag_name("entry"))
            .and_then(|n| n.attribute("revision"))
            .map(str::to_string))
    }
}

/// Text of the first child element named `name`, or ""
pub(super) fn child_text<'a>(node: Node<'a, '_>, name: &str) -> &'a str {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .unwrap_or_default()
}
