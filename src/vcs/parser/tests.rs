//! Fixture tests for the VCS output parsers

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use super::*;
use crate::model::{FileAction, Modification, sort_chronologically};
use crate::vcs::{EmailAliases, ToolVersion};

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn aliases() -> EmailAliases {
    [("alden", "alden@x.org")].into_iter().collect()
}

fn actions(m: &Modification) -> Vec<FileAction> {
    m.files.iter().map(|f| f.action.clone()).collect()
}

// =============================================================================
// CVS log
// =============================================================================

const CVS_LEGACY_LOG: &str = "\
? stray.txt

RCS file: /cvsroot/cruisecontrol/cruisecontrol/main/build.xml,v
Working file: main/build.xml
head: 1.3
branch:
locks: strict
access list:
keyword substitution: kv
total revisions: 3;\tselected revisions: 2
description:
----------------------------
revision 1.3
date: 2002/03/13 19:56:34;  author: alden;  state: Exp;  lines: +1 -1
Shortening line
----------------------------
revision 1.2
date: 2002/03/13 13:45:50;  author: alden;  state: Exp;  lines: +2 -2
branches:  1.2.2;
Added the new build targets
with a second line
=============================================================================

RCS file: /cvsroot/cruisecontrol/cruisecontrol/main/log4j.properties,v
Working file: main/log4j.properties
head: 1.2
description:
----------------------------
revision 1.2
date: 2002/03/12 21:12:47;  author: alden;  state: dead;  lines: +0 -0
Removing log4j properties
=============================================================================

RCS file: /cvsroot/cruisecontrol/cruisecontrol/NewFile.txt,v
Working file: NewFile.txt
head: 1.1
description:
----------------------------
revision 1.1
date: 2002/03/14 08:01:02;  author: pj;  state: Exp;
Initial
=============================================================================

RCS file: /cvsroot/cruisecontrol/cruisecontrol/main/branchfile.txt,v
Working file: main/branchfile.txt
head: 1.1
description:
----------------------------
revision 1.1
date: 2002/03/15 10:00:00;  author: pj;  state: dead;
file branchfile.txt was initially added on branch BRANCH_1.
=============================================================================
";

const CVS_MODERN_LOG: &str = "\
RCS file: /cvs/proj/src/Main.java,v
Working file: src/Main.java
head: 1.2
description:
----------------------------
revision 1.2
date: 2004-03-25 02:58:49 +0200;  author: jerome;  state: Exp;  lines: +3 -1;  commitid: 4f0406225c1f4567;
Fix loop
----------------------------
revision 1.1
date: 2004/03/24 10:00:00;  author: jerome;  state: Exp;  commitid: 1a2b3c;
Initial revision
=============================================================================
";

fn legacy_options(aliases: &EmailAliases) -> CvsLogOptions<'_> {
    CvsLogOptions {
        grammar: CvsGrammar::Legacy,
        repository_root: None,
        aliases,
    }
}

#[test]
fn test_cvs_legacy_log_one_modification_per_revision() {
    let aliases = aliases();
    let mods = Parser::parse_cvs_log(CVS_LEGACY_LOG, &legacy_options(&aliases)).unwrap();

    assert_eq!(mods.len(), 4, "branch-only addition must be skipped");

    let first = &mods[0];
    assert_eq!(first.revision, "1.3");
    assert_eq!(first.user_name, "alden");
    assert_eq!(first.modified_time, utc(2002, 3, 13, 19, 56, 34));
    assert_eq!(first.comment, "Shortening line");
    assert_eq!(first.files.len(), 1);
    assert_eq!(first.files[0].file_name, "build.xml");
    assert_eq!(first.files[0].folder_name.as_deref(), Some("main"));
    assert_eq!(first.files[0].revision.as_deref(), Some("1.3"));
    assert_eq!(first.files[0].action, FileAction::Modified);
}

#[test]
fn test_cvs_multiline_comment_skips_branches_line() {
    let aliases = aliases();
    let mods = Parser::parse_cvs_log(CVS_LEGACY_LOG, &legacy_options(&aliases)).unwrap();
    assert_eq!(mods[1].comment, "Added the new build targets\nwith a second line");
}

#[test]
fn test_cvs_dead_state_is_deletion_and_no_lines_is_addition() {
    let aliases = aliases();
    let mods = Parser::parse_cvs_log(CVS_LEGACY_LOG, &legacy_options(&aliases)).unwrap();

    assert_eq!(actions(&mods[2]), vec![FileAction::Deleted]);
    assert_eq!(mods[2].files[0].file_name, "log4j.properties");

    assert_eq!(actions(&mods[3]), vec![FileAction::Added]);
    assert_eq!(mods[3].files[0].folder_name, None);
}

#[test]
fn test_cvs_alias_resolution() {
    let aliases = aliases();
    let mods = Parser::parse_cvs_log(CVS_LEGACY_LOG, &legacy_options(&aliases)).unwrap();

    assert_eq!(mods[0].email_address.as_deref(), Some("alden@x.org"));
    assert_eq!(mods[3].user_name, "pj");
    assert_eq!(mods[3].email_address, None);
}

#[test]
fn test_cvs_modern_log_honours_offset_and_slash_dates() {
    let aliases = EmailAliases::new();
    let options = CvsLogOptions {
        grammar: CvsGrammar::Modern,
        repository_root: None,
        aliases: &aliases,
    };
    let mods = Parser::parse_cvs_log(CVS_MODERN_LOG, &options).unwrap();

    assert_eq!(mods.len(), 2);
    assert_eq!(mods[0].modified_time, utc(2004, 3, 25, 0, 58, 49));
    assert_eq!(actions(&mods[0]), vec![FileAction::Modified]);
    assert_eq!(mods[1].modified_time, utc(2004, 3, 24, 10, 0, 0));
    assert_eq!(actions(&mods[1]), vec![FileAction::Added]);
}

#[test]
fn test_cvs_legacy_grammar_skips_modern_dates() {
    let aliases = EmailAliases::new();
    let mods = Parser::parse_cvs_log(CVS_MODERN_LOG, &legacy_options(&aliases)).unwrap();
    // Only the slash-dated revision survives
    assert_eq!(mods.len(), 1);
    assert_eq!(mods[0].revision, "1.1");
}

#[test]
fn test_cvs_rlog_paths_come_from_rcs_file() {
    let log = "\
RCS file: /cvsroot/proj/module/Attic/gone.txt,v
head: 1.2
description:
----------------------------
revision 1.2
date: 2002/03/12 21:12:47;  author: alden;  state: dead;  lines: +0 -0
bye
=============================================================================
";
    let aliases = EmailAliases::new();
    let options = CvsLogOptions {
        grammar: CvsGrammar::Legacy,
        repository_root: Some("/cvsroot/proj"),
        aliases: &aliases,
    };
    let mods = Parser::parse_cvs_log(log, &options).unwrap();
    assert_eq!(mods.len(), 1);
    assert_eq!(mods[0].files[0].path(), "module/gone.txt");
    assert_eq!(mods[0].files[0].action, FileAction::Deleted);
}

#[test]
fn test_cvs_working_file_from_rcs() {
    assert_eq!(
        Parser::working_file_from_rcs("/cvsroot/proj/main/build.xml,v", "/cvsroot/proj").as_deref(),
        Some("main/build.xml")
    );
    assert_eq!(
        Parser::working_file_from_rcs("/cvsroot/proj/Attic/old.txt,v", "/cvsroot/proj/").as_deref(),
        Some("old.txt")
    );
    assert_eq!(Parser::working_file_from_rcs("/elsewhere/x,v", "/cvsroot/proj"), None);
}

#[test]
fn test_cvs_rlog_unmatched_root_keeps_rcs_path() {
    let log = "\
RCS file: /cvsroot/proj/main/Attic/build.xml,v
head: 1.3
description:
----------------------------
revision 1.3
date: 2002/03/12 21:12:47;  author: alden;  state: Exp;  lines: +1 -1
tweak
=============================================================================
";
    let aliases = EmailAliases::new();
    let options = CvsLogOptions {
        grammar: CvsGrammar::Legacy,
        repository_root: Some("/other/root"),
        aliases: &aliases,
    };
    let mods = Parser::parse_cvs_log(log, &options).unwrap();
    assert_eq!(mods.len(), 1);
    assert_eq!(mods[0].files[0].path(), "cvsroot/proj/main/build.xml");
}

#[test]
fn test_cvs_malformed_date_skips_only_that_entry() {
    let log = "\
RCS file: /r/a.txt,v
Working file: a.txt
description:
----------------------------
revision 1.2
date: yesterday-ish;  author: alden;  state: Exp;  lines: +1 -1
broken
----------------------------
revision 1.1
date: 2002/03/12 21:12:47;  author: alden;  state: Exp;
fine
=============================================================================
";
    let aliases = EmailAliases::new();
    let mods = Parser::parse_cvs_log(log, &legacy_options(&aliases)).unwrap();
    assert_eq!(mods.len(), 1);
    assert_eq!(mods[0].revision, "1.1");
}

#[test]
fn test_cvs_empty_output() {
    let aliases = EmailAliases::new();
    assert!(Parser::parse_cvs_log("", &legacy_options(&aliases)).unwrap().is_empty());
}

#[test]
fn test_cvs_parse_is_idempotent() {
    let aliases = aliases();
    let first = Parser::parse_cvs_log(CVS_LEGACY_LOG, &legacy_options(&aliases)).unwrap();
    let second = Parser::parse_cvs_log(CVS_LEGACY_LOG, &legacy_options(&aliases)).unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// CVS version probe and users file
// =============================================================================

#[test]
fn test_cvs_version_client_server() {
    let output = "Client: Concurrent Versions System (CVS) 1.11.16 (client/server)\n\
                  Server: Concurrent Versions System (CVS) 1.12.13 (client/server)\n";
    assert_eq!(Parser::parse_cvs_version(output), ToolVersion::new("CVS", "1.12.13"));
}

#[test]
fn test_cvs_version_single_line() {
    let output = "Concurrent Versions System (CVSNT) 2.0.14 (client/server)\n";
    let version = Parser::parse_cvs_version(output);
    assert_eq!(version, ToolVersion::new("CVSNT", "2.0.14"));
    assert_eq!(CvsGrammar::for_version(&version), CvsGrammar::Legacy);
}

#[test]
fn test_cvs_version_defaults_to_legacy() {
    for output in ["", "garbage", "Server: Concurrent Versions System (CVS) "] {
        let version = Parser::parse_cvs_version(output);
        assert_eq!(version, ToolVersion::new("CVS", "1.11"), "output {:?}", output);
        assert_eq!(CvsGrammar::for_version(&version), CvsGrammar::Legacy);
    }
}

#[test]
fn test_cvs_grammar_threshold() {
    let grammar = |v: &str| CvsGrammar::for_version(&ToolVersion::new("CVS", v));
    assert_eq!(grammar("1.11.16"), CvsGrammar::Legacy);
    assert_eq!(grammar("1.12.8"), CvsGrammar::Legacy);
    assert_eq!(grammar("1.12.9"), CvsGrammar::Modern);
    assert_eq!(grammar("1.12.81"), CvsGrammar::Modern);
    assert_eq!(grammar("1.12"), CvsGrammar::Legacy);
}

#[test]
fn test_cvs_users_file() {
    let output = "roberto:'Roberto DaMana <damana@cs.unipr.it>'\n\
                  hill:hill@cs.unipr.it\n\
                  zolo:zolo\n\
                  nocolon\n\
                  :empty\n";
    let users = Parser::parse_cvs_users(output);
    assert_eq!(users.len(), 3);
    assert_eq!(
        users.resolve("roberto").as_deref(),
        Some("'Roberto DaMana <damana@cs.unipr.it>'")
    );
    assert_eq!(users.resolve("hill").as_deref(), Some("hill@cs.unipr.it"));
    assert_eq!(users.resolve("zolo").as_deref(), Some("zolo"));
}

// =============================================================================
// SVN
// =============================================================================

const SVN_LOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<log>
<logentry revision="663">
<author>lee</author>
<date>2004-12-30T10:15:30.123456Z</date>
<paths>
<path action="A">/trunk/added.txt</path>
<path action="M">/trunk/src/changed.rs</path>
<path action="D">/trunk/removed.txt</path>
</paths>
<msg>Three files &amp; one message</msg>
</logentry>
<logentry revision="664">
<author>alden</author>
<date>2004-12-30T11:00:00.000000Z</date>
<paths>
<path action="M">/trunk/README</path>
</paths>
<msg>Tweak readme</msg>
</logentry>
<logentry revision="665">
<author>alden</author>
<date>not a date</date>
<paths><path action="M">/trunk/README</path></paths>
<msg>bad</msg>
</logentry>
</log>
"#;

#[test]
fn test_svn_log_groups_paths_per_revision() {
    let mods = Parser::parse_svn_log(SVN_LOG, &aliases()).unwrap();
    assert_eq!(mods.len(), 2, "entry with a bad date is skipped");

    assert_eq!(mods[0].revision, "663");
    assert_eq!(mods[0].comment, "Three files & one message");
    assert_eq!(
        actions(&mods[0]),
        vec![FileAction::Added, FileAction::Modified, FileAction::Deleted]
    );
    assert_eq!(mods[0].files[1].folder_name.as_deref(), Some("/trunk/src"));
    assert_eq!(mods[0].email_address, None);

    assert_eq!(mods[1].revision, "664");
    assert_eq!(mods[1].modified_time, utc(2004, 12, 30, 11, 0, 0));
    assert_eq!(mods[1].email_address.as_deref(), Some("alden@x.org"));
}

#[test]
fn test_svn_empty_and_malformed_output() {
    assert!(Parser::parse_svn_log("", &aliases()).unwrap().is_empty());
    assert!(Parser::parse_svn_log("<log>\n</log>", &aliases()).unwrap().is_empty());
    assert!(Parser::parse_svn_log("<log><logentry", &aliases()).is_err());
}

#[test]
fn test_svn_info_revision() {
    let xml = r#"<?xml version="1.0"?>
<info>
<entry kind="dir" path="." revision="1234">
<url>http://svn.example.com/repo/trunk</url>
</entry>
</info>"#;
    assert_eq!(Parser::parse_svn_info_revision(xml).unwrap().as_deref(), Some("1234"));
}

// =============================================================================
// Git
// =============================================================================

/// Two commits, newest first as git prints them
const GIT_LOG: &str = "\
commit 3333333333333333333333333333333333333333
tree 4444444444444444444444444444444444444444
parent 1111111111111111111111111111111111111111
author John Roe <john@example.com> 1104368400 +0000
committer John Roe <john@example.com> 1104368400 +0000

    Tweak readme

diff --git a/README b/README
index 1111111..2222222 100644
--- a/README
+++ b/README
@@ -1 +1 @@
-a
+b

commit 1111111111111111111111111111111111111111
tree 2222222222222222222222222222222222222222
author Jane Doe <jane@example.com> 1104364800 +0100
committer Jane Doe <jane@example.com> 1104364800 +0100

    Add, change and remove files
    
    Second paragraph

diff --git a/added.txt b/added.txt
new file mode 100644
index 0000000..e69de29
diff --git a/src/changed.rs b/src/changed.rs
index 83db48f..bf269f4 100644
--- a/src/changed.rs
+++ b/src/changed.rs
@@ -1,2 +1,2 @@
-old
+new
     indented context that is not a message
diff --git a/removed.txt b/removed.txt
deleted file mode 100644
index e69de29..0000000
";

#[test]
fn test_git_two_transactions() {
    let mut mods = Parser::parse_git_log(GIT_LOG).unwrap();
    sort_chronologically(&mut mods);
    assert_eq!(mods.len(), 2);

    let first = &mods[0];
    assert_eq!(first.revision, "1111111111111111111111111111111111111111");
    assert_eq!(first.modified_time, utc(2004, 12, 30, 0, 0, 0));
    assert_eq!(
        actions(first),
        vec![FileAction::Added, FileAction::Modified, FileAction::Deleted]
    );
    assert_eq!(first.files[1].path(), "src/changed.rs");
    assert_eq!(first.comment, "Add, change and remove files\n\nSecond paragraph");
    assert_eq!(first.user_name, "Jane Doe");
    assert_eq!(first.email_address.as_deref(), Some("jane@example.com"));

    let second = &mods[1];
    assert_eq!(second.revision, "3333333333333333333333333333333333333333");
    assert!(second.modified_time > first.modified_time);
    assert_eq!(actions(second), vec![FileAction::Modified]);
}

#[test]
fn test_git_rename() {
    let log = "\
commit 4c69fc8fc26c937fe59bc15ec69b0204e2da228a
author Jane Doe <j@x> 1104364800 +0000

    mv

diff --git a/a b/b
similarity index 100%
rename from a
rename to b
";
    let mods = Parser::parse_git_log(log).unwrap();
    assert_eq!(actions(&mods[0]), vec![FileAction::Renamed]);
    assert_eq!(mods[0].files[0].file_name, "b");
}

#[test]
fn test_git_commit_without_author_is_skipped() {
    let log = "commit 4c69fc8fc26c937fe59bc15ec69b0204e2da228a\ntree abc\n";
    assert!(Parser::parse_git_log(log).unwrap().is_empty());
}

// =============================================================================
// Mercurial
// =============================================================================

const HG_INCOMING: &str = "\
comparing with http://hg.example.com/repo
searching for changes
<hgChange>
\t<author>Jane Doe</author>
\t<email>jane@example.com</email>
\t<rev>7</rev>
\t<node>9f8e7d6c5b4a39281706f5e4d3c2b1a098765432</node>
\t<description>Add &amp; drop</description>
\t<date>1104364800 -3600</date>
\t<addedFiles>new.txt</addedFiles>
\t<removedFiles>old.txt</removedFiles>
\t<changedFiles>new.txt old.txt src/lib.rs</changedFiles>
</hgChange>
<hgChange>
\t<author>alden</author>
\t<email></email>
\t<rev>8</rev>
\t<node>0123456789abcdef0123456789abcdef01234567</node>
\t<description>Tweak</description>
\t<date>1104368400 0</date>
\t<addedFiles></addedFiles>
\t<removedFiles></removedFiles>
\t<changedFiles>README</changedFiles>
</hgChange>
";

#[test]
fn test_hg_incoming_groups_per_changeset() {
    let mods = Parser::parse_hg_incoming(HG_INCOMING, &aliases()).unwrap();
    assert_eq!(mods.len(), 2);

    let first = &mods[0];
    assert_eq!(first.revision, "7:9f8e7d6c5b4a39281706f5e4d3c2b1a098765432");
    assert_eq!(first.modified_time, utc(2004, 12, 30, 0, 0, 0));
    assert_eq!(first.comment, "Add & drop");
    assert_eq!(first.email_address.as_deref(), Some("jane@example.com"));
    assert_eq!(
        actions(first),
        vec![FileAction::Added, FileAction::Modified, FileAction::Deleted]
    );
    assert_eq!(first.files[1].path(), "src/lib.rs");

    assert_eq!(mods[1].email_address.as_deref(), Some("alden@x.org"));
    assert_eq!(actions(&mods[1]), vec![FileAction::Modified]);
}

#[test]
fn test_hg_template_escapes_free_text() {
    for field in ["author|person", "author|email", "desc", "file_adds", "file_dels", "files"] {
        assert!(
            HG_XML_TEMPLATE.contains(&format!("{{{}|escape}}", field)),
            "{} is not escaped",
            field
        );
    }
}

#[test]
fn test_hg_escaped_author() {
    let output = HG_INCOMING.replace("<author>Jane Doe</author>", "<author>R&amp;D Team</author>");
    let mods = Parser::parse_hg_incoming(&output, &aliases()).unwrap();

    assert_eq!(mods.len(), 2);
    assert_eq!(mods[0].user_name, "R&D Team");
}

#[test]
fn test_hg_malformed_changeset_does_not_hide_others() {
    let output = HG_INCOMING.replace("<author>Jane Doe</author>", "<author>R&D Team</author>");
    let mods = Parser::parse_hg_incoming(&output, &aliases()).unwrap();

    assert_eq!(mods.len(), 1);
    assert_eq!(mods[0].revision, "8:0123456789abcdef0123456789abcdef01234567");
    assert_eq!(mods[0].user_name, "alden");
}

#[test]
fn test_hg_no_changes() {
    let output = "comparing with http://hg.example.com/repo\nsearching for changes\nno changes found\n";
    assert!(Parser::parse_hg_incoming(output, &aliases()).unwrap().is_empty());
}

// =============================================================================
// ClearCase
// =============================================================================

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    let naive = NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap();
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap()
        .with_timezone(&Utc)
}

const CLEARCASE_HISTORY: &str = "\
alden#~#20041230.101500#~#/vobs/proj/src/Main.java#~#/main/7#~#checkin#~#!#~#!#~#Fix the loop
spanning two lines@#@#@#@#@#@#@#@#@#@#@#@
pj#~#20041230.093000#~#/vobs/proj/src/New.java#~#/main/1#~#mkelem#~#!REL_1#~#!#~#@#@#@#@#@#@#@#@#@#@#@#@
pj#~#20041230.080000#~#/vobs/proj/src#~#/main/dev#~#mkbranch#~#!#~#!#~#branching@#@#@#@#@#@#@#@#@#@#@#@
pj#~#20041230.070000#~#/vobs/proj/src/x.c@@/main/3#~#/main/3#~#checkin#~#!#~#!#~#ext@#@#@#@#@#@#@#@#@#@#@#@
pj#~#garbage#~#/vobs/proj/src/y.c#~#/main/2#~#checkin#~#!#~#!#~#bad date@#@#@#@#@#@#@#@#@#@#@#@
";

#[test]
fn test_clearcase_history() {
    let mods = Parser::parse_clearcase_history(CLEARCASE_HISTORY, &aliases()).unwrap();
    assert_eq!(mods.len(), 2);

    let first = &mods[0];
    assert_eq!(first.user_name, "alden");
    assert_eq!(first.email_address.as_deref(), Some("alden@x.org"));
    assert_eq!(first.modified_time, local(2004, 12, 30, 10, 15, 0));
    assert_eq!(first.revision, "/main/7");
    assert_eq!(first.comment, "Fix the loop\nspanning two lines");
    assert_eq!(first.files[0].folder_name.as_deref(), Some("/vobs/proj/src"));
    assert_eq!(first.files[0].action, FileAction::Modified);

    assert_eq!(mods[1].files[0].action, FileAction::Added);
    assert_eq!(mods[1].comment, "");
}

#[test]
fn test_clearcase_empty_output() {
    assert!(Parser::parse_clearcase_history("", &aliases()).unwrap().is_empty());
    assert!(Parser::parse_clearcase_history("\n", &aliases()).unwrap().is_empty());
}
