//! Report configuration module.
//!
//! Handles loading, validating, and merging report config files. Configuration
//! is layered: stock defaults are overridden by each config file in the order
//! given on the command line, so a shared team file can be refined by a
//! per-release file.
//!
//! ## Configuration Options
//!
//! ```toml
//! [settings]
//! team_project_path = "https://tracker.example.com/DefaultCollection/Orders"  # required
//! project_name = "Orders"                  # required
//! iteration = "Sprint 14"                  # required
//! project_subpath = "$/Orders/Main"        # version-control path shown by Source
//! database = "OrdersDb"
//! database_server = "sql01.example.com"
//! web_server = "web01.example.com"
//! web_location = "https://orders.example.com/"
//! doc_type = "APPLICATION BUILD/RELEASE NOTES"
//!
//! [layout]
//! title_width = 6           # Columns the title band spans
//! error_merge = "row"       # "row": merge error text across the band; "cell": one cell
//! wide = false              # Landscape / fit-to-width on every surface
//!
//! [assets]
//! cache_dir = ".release-notes-cache"  # Where the header graphic is cached
//!
//! [output]
//! format = "xlsx"           # "xlsx", "docx" or "html"
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Report settings
//!
//! The `[settings]` table is kept loose while files are merged (every key is
//! optional) and becomes a strongly typed [`ReportSettings`] once, at the end.
//! The three required keys must be present and non-blank by then.

use crate::lookup::NamedLookup;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Report configuration loaded from one or more TOML files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Project and environment facts shown in the report.
    pub settings: SettingsConfig,
    /// Layout knobs shared by every surface.
    pub layout: LayoutConfig,
    /// Cached asset locations.
    pub assets: AssetsConfig,
    /// Output surface selection.
    pub output: OutputConfig,
}

impl ReportConfig {
    /// Validate layout values and the required settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.title_width == 0 {
            return Err(ConfigError::Validation(
                "layout.title_width must be at least 1".into(),
            ));
        }
        if self.assets.cache_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "assets.cache_dir must not be empty".into(),
            ));
        }
        self.settings.resolve()?;
        Ok(())
    }

    /// The typed settings record.
    pub fn report_settings(&self) -> Result<ReportSettings, ConfigError> {
        self.settings.resolve()
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            layout: self.layout.clone(),
            assets: self.assets.clone(),
        }
    }
}

/// Raw `[settings]` table. Every key is optional until [`resolve`](Self::resolve).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsConfig {
    pub team_project_path: Option<String>,
    pub project_name: Option<String>,
    pub iteration: Option<String>,
    pub project_subpath: Option<String>,
    pub database: Option<String>,
    pub database_server: Option<String>,
    pub web_server: Option<String>,
    pub web_location: Option<String>,
    pub doc_type: Option<String>,
}

impl SettingsConfig {
    /// Check required keys and build the typed record. Blank values count as missing.
    pub fn resolve(&self) -> Result<ReportSettings, ConfigError> {
        Ok(ReportSettings {
            team_project_path: required(&self.team_project_path, TEAM_PROJECT_PATH)?,
            project_name: required(&self.project_name, PROJECT_NAME)?,
            iteration: required(&self.iteration, ITERATION)?,
            project_subpath: optional(&self.project_subpath),
            database: optional(&self.database),
            database_server: optional(&self.database_server),
            web_server: optional(&self.web_server),
            web_location: optional(&self.web_location),
            doc_type: optional(&self.doc_type),
        })
    }

    /// Read settings from a lookup keyed by display names ("Project Name", …).
    pub fn from_lookup(lookup: &NamedLookup) -> Self {
        let get = |key: &str| lookup.get(key).map(str::to_string);
        Self {
            team_project_path: get(TEAM_PROJECT_PATH),
            project_name: get(PROJECT_NAME),
            iteration: get(ITERATION),
            project_subpath: get(PROJECT_SUBPATH),
            database: get(DATABASE),
            database_server: get(DATABASE_SERVER),
            web_server: get(WEB_SERVER),
            web_location: get(WEB_LOCATION),
            doc_type: get(DOC_TYPE),
        }
    }
}

pub const TEAM_PROJECT_PATH: &str = "Team Project Path";
pub const PROJECT_NAME: &str = "Project Name";
pub const ITERATION: &str = "Iteration";
pub const PROJECT_SUBPATH: &str = "Project Subpath";
pub const DATABASE: &str = "Database";
pub const DATABASE_SERVER: &str = "Database Server";
pub const WEB_SERVER: &str = "Web Server";
pub const WEB_LOCATION: &str = "Web Location";
pub const DOC_TYPE: &str = "Doc Type";

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    optional(value).ok_or(ConfigError::MissingSetting(name))
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validated report settings. Built once, then passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub team_project_path: String,
    pub project_name: String,
    pub iteration: String,
    pub project_subpath: Option<String>,
    pub database: Option<String>,
    pub database_server: Option<String>,
    pub web_server: Option<String>,
    pub web_location: Option<String>,
    pub doc_type: Option<String>,
}

/// Title used when no `doc_type` is configured.
pub const DEFAULT_DOC_TYPE: &str = "APPLICATION BUILD/RELEASE NOTES";

impl ReportSettings {
    /// Build from a display-name lookup, validating required keys.
    pub fn from_lookup(lookup: &NamedLookup) -> Result<Self, ConfigError> {
        SettingsConfig::from_lookup(lookup).resolve()
    }

    fn project_base(&self) -> &str {
        self.team_project_path.trim_end_matches('/')
    }

    /// Version-control browser for the project (target of the `Source` fact).
    pub fn version_control_url(&self) -> String {
        match &self.project_subpath {
            Some(path) => format!("{}/_versionControl#path={}", self.project_base(), path),
            None => format!("{}/_versionControl", self.project_base()),
        }
    }

    /// Work-item page for `id`.
    pub fn work_item_url(&self, id: &str) -> String {
        format!("{}/_workitems/edit/{}", self.project_base(), id.trim())
    }

    pub fn title_text(&self) -> &str {
        self.doc_type.as_deref().unwrap_or(DEFAULT_DOC_TYPE)
    }

    /// Artifact file name without extension.
    pub fn file_stem(&self) -> String {
        format!("{} {} Release Notes", self.project_name, self.iteration)
    }
}

/// How an error message row occupies the active band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMerge {
    /// Merge the message across the whole band.
    #[default]
    Row,
    /// Message in the first cell; the rest of the band is styled but unmerged.
    Cell,
}

/// Layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Columns the title band spans.
    pub title_width: u32,
    pub error_merge: ErrorMerge,
    /// Landscape orientation and fit-to-width on every surface.
    pub wide: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            title_width: 6,
            error_merge: ErrorMerge::Row,
            wide: false,
        }
    }
}

/// Asset cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Directory the header graphic is written to.
    pub cache_dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            cache_dir: ".release-notes-cache".to_string(),
        }
    }
}

/// Output surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Office Open XML workbook.
    #[default]
    Xlsx,
    /// Office Open XML word-processing document.
    Docx,
    /// Single HTML5 page.
    Html,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            OutputFormat::Html => "text/html",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Everything a backend needs besides the settings.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub layout: LayoutConfig,
    pub assets: AssetsConfig,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Unset settings are omitted, so the base layer carries only layout,
/// asset and output defaults.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ReportConfig::default())?)
}

/// Lay a later settings file over everything loaded before it.
///
/// Sections merge key by key, so a team file can pin `project_name` and
/// `team_project_path` while a per-sprint file only sets `iteration`. A
/// value the later file sets wins; a key it leaves out keeps the earlier
/// value. The stock defaults are always the bottom layer.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut merged), toml::Value::Table(later)) => {
            for (key, value) in later {
                let value = match merged.remove(&key) {
                    Some(earlier) => merge_toml(earlier, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            toml::Value::Table(merged)
        }
        (_, later) => later,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays in order onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<ReportConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: ReportConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given files, later files overriding earlier ones.
///
/// Every path must exist. Unknown keys are rejected and the merged result
/// is validated, required settings included.
pub fn load_config<P: AsRef<Path>>(paths: &[P]) -> Result<ReportConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let mut overlays = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let value = load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.into()))?;
        overlays.push(value);
    }
    resolve_config(base, overlays)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Release Notes Configuration
# ===========================
# Several files may be given with --config; later files override earlier ones.
# Each file only needs the keys it wants to override.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Report settings
# ---------------------------------------------------------------------------
[settings]
# Required. Base URL of the project in the work-item tracker. Work-item and
# version-control links are built from it.
# team_project_path = "https://tracker.example.com/DefaultCollection/Orders"

# Required. Shown in the title row facts and used in the output file name.
# project_name = "Orders"

# Required. Iteration (sprint) being released.
# iteration = "Sprint 14"

# Version-control path appended to the Source link.
# project_subpath = "$/Orders/Main"

# Environment facts for the Details table. Unset keys are left out.
# database = "OrdersDb"
# database_server = "sql01.example.com"
# web_server = "web01.example.com"

# Target of the Access section link.
# web_location = "https://orders.example.com/"

# Title text. Defaults to "APPLICATION BUILD/RELEASE NOTES".
# doc_type = "APPLICATION BUILD/RELEASE NOTES"

# ---------------------------------------------------------------------------
# Layout
# ---------------------------------------------------------------------------
[layout]
# Columns the title band spans.
title_width = 6

# How a failed table's error message occupies its row:
#   "row"  - merged across the whole band
#   "cell" - first cell only, rest of the band styled but unmerged
error_merge = "row"

# Landscape orientation and fit-to-width on every surface.
wide = false

# ---------------------------------------------------------------------------
# Assets
# ---------------------------------------------------------------------------
[assets]
# Directory the header graphic is cached in. Rewritten only when its
# content no longer matches.
cache_dir = ".release-notes-cache"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# "xlsx" (spreadsheet), "docx" (document) or "html" (markup).
format = "xlsx"
"##
}
