//! Shared test utilities for the release-notes test suite.
//!
//! Provides a complete set of report settings, render options rooted in a
//! temp directory, and small record sets shaped like tracker query results.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let options = render_options(tmp.path());
//! let settings = sample_settings();
//! assert_eq!(settings.file_stem(), "Orders Sprint 14 Release Notes");
//! ```

use std::path::Path;

use crate::config::{RenderOptions, ReportSettings};
use crate::records::RecordSet;

// =========================================================================
// Settings
// =========================================================================

/// Settings for the "Orders" project, sprint 14, with every server set.
pub fn sample_settings() -> ReportSettings {
    ReportSettings {
        team_project_path: "https://tracker.example.com/DefaultCollection/Orders".into(),
        project_name: "Orders".into(),
        iteration: "Sprint 14".into(),
        project_subpath: None,
        database: Some("OrdersDb".into()),
        database_server: Some("sql01.example.com".into()),
        web_server: Some("web01.example.com".into()),
        web_location: Some("https://orders.example.com/".into()),
        doc_type: None,
    }
}

/// Default render options with the asset cache under `dir/cache`.
pub fn render_options(dir: &Path) -> RenderOptions {
    let mut options = RenderOptions::default();
    options.assets.cache_dir = dir.join("cache").to_string_lossy().into_owned();
    options
}

// =========================================================================
// Record sets
// =========================================================================

/// Three included requirements; the first description carries tracker markup.
pub fn sample_records() -> RecordSet {
    RecordSet::new(["ID", "Type", "Title", "Area", "Description"])
        .with_row([
            "7",
            "Bug",
            "Fix login",
            "Orders\\Web",
            "<div>Login&nbsp;failed  for <b>SSO</b> users</div>",
        ])
        .with_row([
            "12",
            "User Story",
            "Bulk export",
            "Orders\\Reports",
            "Export up to 10k rows",
        ])
        .with_row(["15", "Task", "Rotate keys", "Orders\\Ops", ""])
}

/// Two test cases.
pub fn sample_test_cases() -> RecordSet {
    RecordSet::new(["ID", "Title", "Steps"])
        .with_row(["101", "Login with SSO", "Open site; click Sign in"])
        .with_row(["102", "Export report", "Open Reports; click Export"])
}
