//! modwatch - poll configured sources once and print what changed

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use modwatch::model::{Modification, PollWindow, sort_chronologically};
use modwatch::{config, logging};

/// Default look-back when no window start is given
const DEFAULT_WINDOW_MINUTES: i64 = 24 * 60;

#[derive(Parser, Debug)]
#[command(name = "modwatch", version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Window start as RFC 3339 (e.g. 2024-05-01T08:00:00Z)
    #[arg(long, value_parser = parse_rfc3339, conflicts_with = "since_minutes")]
    since: Option<DateTime<Utc>>,

    /// Window start as minutes before now
    #[arg(long)]
    since_minutes: Option<i64>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn window(&self, now: DateTime<Utc>) -> PollWindow {
        let since = self.since.unwrap_or_else(|| {
            now - Duration::minutes(self.since_minutes.unwrap_or(DEFAULT_WINDOW_MINUTES))
        });
        PollWindow::new(since, now)
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

/// Everything one run found
#[derive(Debug, Default, Serialize)]
struct Report {
    since: Option<DateTime<Utc>>,
    now: Option<DateTime<Utc>>,
    modifications: Vec<Modification>,
    properties: BTreeMap<String, String>,
    errors: Vec<String>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let window = cli.window(Utc::now());
    let mut sources = config::load(&cli.config)?;
    info!(sources = sources.len(), since = %window.since, now = %window.now, "Polling");

    let mut report = Report {
        since: Some(window.since),
        now: Some(window.now),
        ..Default::default()
    };
    for source in &mut sources {
        match source.get_modifications(window) {
            Ok(mods) => report.modifications.extend(mods),
            Err(e) => {
                warn!(source = source.name(), error = %e, "Poll aborted");
                report.errors.push(format!("{}: {}", source.name(), e));
            }
        }
        report.properties.extend(source.take_properties());
    }
    sort_chronologically(&mut report.modifications);

    let mut out = io::stdout().lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        print_text(&mut out, &report)?;
    }
    Ok(())
}

fn print_text(out: &mut impl Write, report: &Report) -> io::Result<()> {
    for m in &report.modifications {
        write!(
            out,
            "{} {} {} {}",
            m.modified_time.to_rfc3339(),
            m.kind,
            m.revision,
            m.user_name
        )?;
        if let Some(email) = &m.email_address {
            write!(out, " <{}>", email)?;
        }
        writeln!(out)?;
        if let Some(summary) = m.comment.lines().next() {
            writeln!(out, "    {}", summary)?;
        }
        for file in &m.files {
            writeln!(out, "    {:<9} {}", file.action.as_str(), file.path())?;
        }
    }
    if report.modifications.is_empty() {
        writeln!(out, "No modifications")?;
    }
    for (key, value) in &report.properties {
        writeln!(out, "{}={}", key, value)?;
    }
    for error in &report.errors {
        writeln!(out, "error: {}", error)?;
    }
    Ok(())
}
