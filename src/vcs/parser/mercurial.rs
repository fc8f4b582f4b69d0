//! Mercurial output parser (hg incoming --template)

use roxmltree::{Document, Node};
use tracing::warn;

use super::dates::from_epoch_seconds;
use super::svn::child_text;
use super::{ParseError, Parser};
use crate::model::{FileAction, Modification, ModifiedFile, SourceKind};
use crate::vcs::EmailAliases;

/// Template making `hg incoming` print one XML element per changeset
///
/// `hgdate` renders as `<epoch seconds> <offset seconds>`; the epoch is
/// already absolute, so the offset is ignored.
pub const HG_XML_TEMPLATE: &str = concat!(
    "<hgChange>\n",
    "\t<author>{author|person|escape}</author>\n",
    "\t<email>{author|email|escape}</email>\n",
    "\t<rev>{rev}</rev>\n",
    "\t<node>{node}</node>\n",
    "\t<description>{desc|escape}</description>\n",
    "\t<date>{date|hgdate}</date>\n",
    "\t<addedFiles>{file_adds|escape}</addedFiles>\n",
    "\t<removedFiles>{file_dels|escape}</removedFiles>\n",
    "\t<changedFiles>{files|escape}</changedFiles>\n",
    "</hgChange>\n",
);

const HG_CHANGE_END: &str = "</hgChange>";

impl Parser {
    /// Parse `hg incoming --debug --template HG_XML_TEMPLATE` output
    ///
    /// Lines before the first `<` ("comparing with ...", "searching for
    /// changes") are skipped; the rest is wrapped in `<hgChanges>`.
    /// One Modification per changeset, revision `rev:node`. Changed files
    /// that are neither added nor removed are "modified".
    pub fn parse_hg_incoming(
        output: &str,
        aliases: &EmailAliases,
    ) -> Result<Vec<Modification>, ParseError> {
        let body: Vec<&str> = output
            .lines()
            .skip_while(|l| !l.trim_start().starts_with('<'))
            .collect();
        if body.is_empty() {
            return Ok(Vec::new());
        }

        let xml = format!("<hgChanges>\n{}\n</hgChanges>", body.join("\n"));
        match Document::parse(&xml) {
            Ok(doc) => Ok(changesets(&doc, aliases)),
            Err(err) => {
                warn!(error = %err, "Malformed hg incoming output, parsing changesets one by one");
                Ok(salvage_changesets(&body.join("\n"), aliases))
            }
        }
    }
}

fn changesets(doc: &Document, aliases: &EmailAliases) -> Vec<Modification> {
    doc.descendants()
        .filter(|n| n.has_tag_name("hgChange"))
        .filter_map(|change| changeset(change, aliases))
        .collect()
}

/// Parses each `<hgChange>` element on its own so one broken changeset
/// does not hide the others
fn salvage_changesets(body: &str, aliases: &EmailAliases) -> Vec<Modification> {
    let mut modifications = Vec::new();
    for chunk in body.split_inclusive(HG_CHANGE_END) {
        let Some(offset) = chunk.find("<hgChange>") else {
            continue;
        };
        match Document::parse(&chunk[offset..]) {
            Ok(doc) => modifications.extend(changesets(&doc, aliases)),
            Err(err) => warn!(error = %err, "Skipping malformed Mercurial changeset"),
        }
    }
    modifications
}

fn changeset(change: Node, aliases: &EmailAliases) -> Option<Modification> {
    let rev = child_text(change, "rev");
    let node = child_text(change, "node");
    let date = child_text(change, "date");
    let Some(time) = date.split_whitespace().next().and_then(from_epoch_seconds) else {
        warn!(rev, date, "Unparsable Mercurial date, skipping changeset");
        return None;
    };

    let added = split_files(child_text(change, "addedFiles"));
    let removed = split_files(child_text(change, "removedFiles"));
    let changed = split_files(child_text(change, "changedFiles"));

    let author = child_text(change, "author").to_string();
    let mut modification = Modification::new(SourceKind::Mercurial, time);
    modification.email_address = aliases
        .resolve(&author)
        .or_else(|| Some(child_text(change, "email").to_string()).filter(|e| !e.is_empty()));
    modification.user_name = author;
    modification.comment = child_text(change, "description").to_string();
    modification.revision = format!("{}:{}", rev, node);

    let mut files: Vec<ModifiedFile> = added
        .iter()
        .map(|f| ModifiedFile::from_path(f, FileAction::Added, None))
        .collect();
    files.extend(
        changed
            .iter()
            .filter(|f| !added.contains(f) && !removed.contains(f))
            .map(|f| ModifiedFile::from_path(f, FileAction::Modified, None)),
    );
    files.extend(
        removed
            .iter()
            .map(|f| ModifiedFile::from_path(f, FileAction::Deleted, None)),
    );
    modification.files = files;
    Some(modification)
}

fn split_files(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
