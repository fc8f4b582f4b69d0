//! CVS source control
//!
//! Polls with `cvs log` (working copy) or `cvs rlog` (cvsroot + module).
//! The server version is probed once to pick the log date grammar, and
//! `CVSROOT/users` is read once for email aliases.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use super::constants::{cvs, programs};
use super::parser::{CvsGrammar, CvsLogOptions, Parser};
use super::{
    AdapterContext, ConfigError, EmailAliases, PollError, SourceControl, ToolVersion, finish_poll,
    require_directory,
};
use crate::exec::CommandLine;
use crate::model::{Modification, PollWindow, Properties};

const ADAPTER: &str = "cvs";

/// CVS adapter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CvsConfig {
    /// `-d` argument; required with `module` when there is no working copy
    pub cvsroot: Option<String>,
    pub local_working_copy: Option<PathBuf>,
    pub module: Option<String>,
    /// Branch or tag to follow; HEAD (or unset) follows the default branch
    pub tag: Option<String>,
    /// Compression level 0-9, validated as text
    #[serde(deserialize_with = "string_or_integer")]
    pub compression: Option<String>,
    /// Use `-Q` instead of `-q`
    pub really_quiet: bool,
    pub property: Option<String>,
    pub property_on_delete: Option<String>,
    /// Skip reading `CVSROOT/users`
    pub skip_email_fetching: bool,
    /// Poll each CVS-controlled sub-directory when the working copy root is not one
    pub recurse_local_working_copy: bool,
}

/// Accept `compression = 3` as well as `compression = "3"`
fn string_or_integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(i64),
        Text(String),
    }
    Ok(Option::<Raw>::deserialize(d)?.map(|raw| match raw {
        Raw::Integer(n) => n.to_string(),
        Raw::Text(s) => s,
    }))
}

impl CvsConfig {
    fn follows_head(&self) -> bool {
        match self.tag.as_deref() {
            None => true,
            Some(tag) => tag.is_empty() || tag == cvs::HEAD_TAG,
        }
    }

    /// Repository path: the part of CVSROOT after its last ':', minus a port
    fn repository_root(&self) -> Option<&str> {
        let root = self.cvsroot.as_deref()?;
        let path = root.rsplit(':').next().unwrap_or(root);
        Some(path.trim_start_matches(|c: char| c.is_ascii_digit()))
    }
}

/// CVS source control
#[derive(Debug)]
pub struct Cvs {
    config: CvsConfig,
    ctx: AdapterContext,
    properties: Properties,
    /// Probed on first poll
    server_version: Option<ToolVersion>,
    /// Configured aliases merged with CVSROOT/users, read on first poll
    mail_aliases: Option<EmailAliases>,
}

impl Cvs {
    pub fn new(config: CvsConfig, ctx: AdapterContext) -> Self {
        let properties =
            Properties::with_names(config.property.clone(), config.property_on_delete.clone());
        Self {
            config,
            ctx,
            properties,
            server_version: None,
            mail_aliases: None,
        }
    }

    /// `cvs [-z<c>] [-d <root>] -q|-Q log|rlog -N -S -d<since><<now> -r<tag>|-b [module]`
    pub fn build_history_command(&self, window: PollWindow) -> CommandLine {
        let config = &self.config;
        let mut cmd = CommandLine::new(programs::CVS);

        if let Some(level) = &config.compression {
            cmd = cmd.arg(format!("-z{}", level));
        }
        if let Some(root) = &config.cvsroot {
            cmd = cmd.arg(cvs::CVSROOT).arg(root);
        }
        cmd = cmd.arg(if config.really_quiet {
            cvs::REALLY_QUIET
        } else {
            cvs::QUIET
        });

        cmd = match &config.local_working_copy {
            Some(local) => cmd.working_dir(local).arg(cvs::LOG),
            None => cmd.arg(cvs::RLOG),
        };

        cmd = cmd
            .arg(cvs::NO_TAGS)
            .arg(cvs::SKIP_EMPTY)
            .arg(format!(
                "-d{}<{}",
                format_cvs_date(window.since),
                format_cvs_date(window.now)
            ));

        cmd = if config.follows_head() {
            cmd.arg(cvs::DEFAULT_BRANCH)
        } else {
            cmd.arg(format!("-r{}", config.tag.as_deref().unwrap_or_default()))
        };

        if config.local_working_copy.is_none()
            && let Some(module) = &config.module
        {
            cmd = cmd.arg(module);
        }
        cmd
    }

    /// `cvs [-d <root>] version`
    pub fn build_version_command(&self) -> CommandLine {
        self.with_root_and_dir(CommandLine::new(programs::CVS))
            .arg(cvs::VERSION)
    }

    /// `cvs [-d <root>] -q co -p CVSROOT/users`
    pub fn build_users_command(&self) -> CommandLine {
        self.with_root_and_dir(CommandLine::new(programs::CVS))
            .args([cvs::QUIET, cvs::CHECKOUT, cvs::TO_STDOUT, cvs::USERS_FILE])
    }

    fn with_root_and_dir(&self, mut cmd: CommandLine) -> CommandLine {
        if let Some(root) = &self.config.cvsroot {
            cmd = cmd.arg(cvs::CVSROOT).arg(root);
        }
        if let Some(local) = &self.config.local_working_copy {
            cmd = cmd.working_dir(local);
        }
        cmd
    }

    /// Server version, probed once; failures fall back to the legacy version
    fn server_version(&mut self) -> ToolVersion {
        if let Some(version) = &self.server_version {
            return version.clone();
        }
        let output = self
            .ctx
            .run(ADAPTER, self.build_version_command())
            .map(|o| o.stdout)
            .unwrap_or_default();
        let version = Parser::parse_cvs_version(&output);
        info!(name = %version.name, version = %version.version, "Detected CVS server");
        self.server_version = Some(version.clone());
        version
    }

    fn mail_aliases(&mut self) -> EmailAliases {
        if let Some(aliases) = &self.mail_aliases {
            return aliases.clone();
        }
        let mut aliases = self.ctx.aliases.clone();
        if !self.config.skip_email_fetching {
            match self.ctx.run_checked(ADAPTER, self.build_users_command()) {
                Some(output) => {
                    let users = Parser::parse_cvs_users(&output.stdout);
                    debug!(count = users.len(), "Read CVSROOT/users");
                    aliases = aliases.merged_with(&users);
                }
                None => warn!("Problem getting CVSROOT/users; using configured aliases only"),
            }
        }
        self.mail_aliases = Some(aliases.clone());
        aliases
    }

    fn is_under_cvs(dir: &Path) -> bool {
        dir.join(cvs::ADMIN_DIR).is_dir()
    }

    fn poll(&mut self, window: PollWindow) -> Vec<Modification> {
        let grammar = CvsGrammar::for_version(&self.server_version());
        let aliases = self.mail_aliases();

        let Some(output) = self.ctx.run(ADAPTER, self.build_history_command(window)) else {
            return Vec::new();
        };
        if output.stderr.contains(cvs::ABORTED) {
            warn!(stderr = %output.stderr.trim(), "CVS log aborted, reporting no modifications");
            return Vec::new();
        }

        let repository_root = if self.config.local_working_copy.is_none() {
            self.config.repository_root()
        } else {
            None
        };
        let options = CvsLogOptions {
            grammar,
            repository_root,
            aliases: &aliases,
        };
        match Parser::parse_cvs_log(&output.stdout, &options) {
            Ok(mods) => mods,
            Err(e) => {
                warn!(error = %e, "Unreadable CVS log, reporting no modifications");
                Vec::new()
            }
        }
    }

    /// Poll every CVS-controlled sub-directory, prefixing folder names
    fn poll_subdirectories(&mut self, local: &Path, window: PollWindow) -> Vec<Modification> {
        let entries = match fs::read_dir(local) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %local.display(), error = %e, "Cannot list working copy");
                return Vec::new();
            }
        };
        let mut subdirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        subdirs.sort();

        let version = self.server_version();
        let aliases = self.mail_aliases();
        let mut modifications = Vec::new();
        for dir in subdirs {
            let Some(dir_name) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            let mut delegate = Cvs::new(
                CvsConfig {
                    local_working_copy: Some(dir.clone()),
                    skip_email_fetching: true,
                    ..self.config.clone()
                },
                self.ctx.clone(),
            );
            delegate.server_version = Some(version.clone());
            delegate.mail_aliases = Some(aliases.clone());

            for mut modification in delegate.poll_tree(window) {
                for file in &mut modification.files {
                    file.folder_name = Some(match file.folder_name.take() {
                        Some(folder) => format!("{}/{}", dir_name, folder),
                        None => dir_name.clone(),
                    });
                }
                modifications.push(modification);
            }
        }
        modifications
    }

    fn poll_tree(&mut self, window: PollWindow) -> Vec<Modification> {
        if self.config.recurse_local_working_copy
            && let Some(local) = self.config.local_working_copy.clone()
            && !Self::is_under_cvs(&local)
        {
            return self.poll_subdirectories(&local, window);
        }
        self.poll(window)
    }
}

/// `yyyy-MM-dd HH:mm:ss GMT`
pub fn format_cvs_date(time: DateTime<Utc>) -> String {
    time.format(cvs::WINDOW_DATE_FORMAT).to_string()
}

impl SourceControl for Cvs {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.config;
        let remote_complete = c.cvsroot.is_some() && c.module.is_some();

        if c.local_working_copy.is_none() && !remote_complete {
            return Err(ConfigError::Invalid {
                adapter: ADAPTER,
                reason: "must specify either 'local_working_copy' or 'cvsroot' and 'module' on CVS"
                    .to_string(),
            });
        }
        if c.local_working_copy.is_some() && (c.cvsroot.is_some() || c.module.is_some()) {
            return Err(ConfigError::Conflict {
                adapter: ADAPTER,
                reason: "if 'local_working_copy' is specified then cvsroot and module are not allowed on CVS"
                    .to_string(),
            });
        }
        if c.local_working_copy.is_none() && c.recurse_local_working_copy {
            return Err(ConfigError::Conflict {
                adapter: ADAPTER,
                reason: "'recurse_local_working_copy' can only be set to true when 'local_working_copy' is specified."
                    .to_string(),
            });
        }
        if let Some(local) = &c.local_working_copy {
            require_directory(ADAPTER, "local_working_copy", local)?;
        }
        if let Some(level) = &c.compression {
            let in_range = level.parse::<u8>().is_ok_and(|n| n <= 9);
            if !in_range {
                return Err(ConfigError::Invalid {
                    adapter: ADAPTER,
                    reason: "'compression' must be an integer between 0 and 9, inclusive.".to_string(),
                });
            }
        }
        Ok(())
    }

    fn get_modifications(&mut self, window: PollWindow) -> Result<Vec<Modification>, PollError> {
        self.properties.reset();
        let modifications = finish_poll(self.poll_tree(window), window);
        self.properties.record_standard(&modifications);
        debug!(count = modifications.len(), "CVS poll finished");
        Ok(modifications)
    }

    fn take_properties(&mut self) -> BTreeMap<String, String> {
        self.properties.take()
    }
}
