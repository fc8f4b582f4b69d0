//! Common test utilities for integration tests.
//!
//! Provides a scripted command runner, canned sources for aggregator
//! tests, build log fixtures and a temporary git repository helper.
//!
//! Note: Each integration test file compiles as a separate crate,
//! so not all helpers are used in every test file. We suppress
//! dead_code warnings at the module level.

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod build_logs;
pub mod fake_source;
pub mod git_repo;
pub mod scripted_runner;

pub use build_logs::write_build_log;
pub use fake_source::FakeSource;
pub use git_repo::GitRepo;
pub use scripted_runner::ScriptedRunner;

use chrono::{DateTime, TimeZone, Utc};

/// True when a `git` binary is on PATH
pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Return early from a test when git is not installed
#[macro_export]
macro_rules! skip_if_no_git {
    () => {
        if !$crate::common::git_available() {
            eprintln!("Skipping test: git not installed");
            return;
        }
    };
}

/// UTC instant on 2004-12-30 at the given hour
pub fn dec30(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2004, 12, 30, hour, minute, 0).unwrap()
}
