//! Data sources: where the facts and records of a report come from.
//!
//! The pipeline asks a [`DataSource`] for six things: the executive summary
//! facts, the detail facts, the included requirements, the test cases, and
//! the latest build and change numbers. Every call distinguishes two kinds
//! of "nothing":
//!
//! - `Err(DataError)`: the source itself is unusable (file unreadable,
//!   malformed document, tracker down).
//! - `Ok(None)`: the source works but has no such data.
//!
//! Absent facts fall back to defaults derived from the report settings
//! ([`summary_facts`], [`detail_facts`]); present ones are overlaid on top of
//! those defaults, so a data file only needs to carry what it wants to change.
//!
//! ## Data file
//!
//! [`JsonDataSource`] reads one JSON document. Every key is optional:
//!
//! ```json
//! {
//!   "summary": { "Release Date": "3/14/2026" },
//!   "details": { "Web Server": "web-01" },
//!   "records": [ { "ID": 7, "Type": "Bug", "Title": "Fix login" } ],
//!   "test_cases": { "columns": ["ID", "Title", "Steps"], "rows": [] },
//!   "build_number": "2026.03.14.2",
//!   "change_number": 4711
//! }
//! ```

use crate::config::ReportSettings;
use crate::lookup::NamedLookup;
use crate::records::RecordSet;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const SUMMARY_NAME: &str = "Executive Summary";
pub const DETAILS_NAME: &str = "Details";

/// Placeholder shown wherever a value could not be obtained.
pub const UNAVAILABLE: &str = "Unavailable";

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed data file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    Invalid(String),
    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}

/// Everything a report pulls from outside its settings.
pub trait DataSource {
    fn summary_facts(&self) -> Result<Option<NamedLookup>, DataError>;

    fn detail_facts(&self) -> Result<Option<NamedLookup>, DataError>;

    /// Included requirements: at least `ID`, `Type`, `Title`, `Area` and
    /// `Description` columns.
    fn records(&self) -> Result<Option<RecordSet>, DataError>;

    /// Test cases: `ID`, `Title` and `Steps` columns.
    fn test_cases(&self) -> Result<Option<RecordSet>, DataError>;

    fn latest_build_number(&self) -> Result<Option<String>, DataError>;

    fn latest_change_number(&self) -> Result<Option<u64>, DataError>;
}

// ============================================================================
// JSON data file
// ============================================================================

/// Numbers in the data file may be written either as JSON numbers or strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(u64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DataDocument {
    summary: Option<NamedLookup>,
    details: Option<NamedLookup>,
    records: Option<RecordSet>,
    test_cases: Option<RecordSet>,
    build_number: Option<Scalar>,
    change_number: Option<Scalar>,
}

/// A data source backed by one parsed JSON document.
#[derive(Debug, Clone, Default)]
pub struct JsonDataSource {
    data: StaticDataSource,
}

impl JsonDataSource {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(json: &str) -> Result<Self, DataError> {
        let doc: DataDocument = serde_json::from_str(json)?;

        let change_number = match doc.change_number {
            None => None,
            Some(Scalar::Number(n)) => Some(n),
            Some(Scalar::Text(s)) => Some(s.trim().parse::<u64>().map_err(|_| {
                DataError::Invalid(format!("change_number must be a whole number, got {s:?}"))
            })?),
        };

        Ok(Self {
            data: StaticDataSource {
                summary: doc.summary.map(|l| renamed(l, SUMMARY_NAME)),
                details: doc.details.map(|l| renamed(l, DETAILS_NAME)),
                records: doc.records,
                test_cases: doc.test_cases,
                build_number: doc
                    .build_number
                    .map(Scalar::into_text)
                    .filter(|s| !s.trim().is_empty()),
                change_number,
            },
        })
    }
}

fn renamed(lookup: NamedLookup, name: &str) -> NamedLookup {
    let mut named = NamedLookup::new(name);
    named.extend_from(&lookup);
    named
}

impl DataSource for JsonDataSource {
    fn summary_facts(&self) -> Result<Option<NamedLookup>, DataError> {
        self.data.summary_facts()
    }

    fn detail_facts(&self) -> Result<Option<NamedLookup>, DataError> {
        self.data.detail_facts()
    }

    fn records(&self) -> Result<Option<RecordSet>, DataError> {
        self.data.records()
    }

    fn test_cases(&self) -> Result<Option<RecordSet>, DataError> {
        self.data.test_cases()
    }

    fn latest_build_number(&self) -> Result<Option<String>, DataError> {
        self.data.latest_build_number()
    }

    fn latest_change_number(&self) -> Result<Option<u64>, DataError> {
        self.data.latest_change_number()
    }
}

// ============================================================================
// In-memory source
// ============================================================================

/// In-memory data source for embedding the generator in another program.
#[derive(Debug, Clone, Default)]
pub struct StaticDataSource {
    summary: Option<NamedLookup>,
    details: Option<NamedLookup>,
    records: Option<RecordSet>,
    test_cases: Option<RecordSet>,
    build_number: Option<String>,
    change_number: Option<u64>,
}

impl StaticDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(mut self, facts: NamedLookup) -> Self {
        self.summary = Some(renamed(facts, SUMMARY_NAME));
        self
    }

    pub fn with_details(mut self, facts: NamedLookup) -> Self {
        self.details = Some(renamed(facts, DETAILS_NAME));
        self
    }

    pub fn with_records(mut self, records: RecordSet) -> Self {
        self.records = Some(records);
        self
    }

    pub fn with_test_cases(mut self, test_cases: RecordSet) -> Self {
        self.test_cases = Some(test_cases);
        self
    }

    pub fn with_build_number(mut self, build: impl Into<String>) -> Self {
        self.build_number = Some(build.into());
        self
    }

    pub fn with_change_number(mut self, change: u64) -> Self {
        self.change_number = Some(change);
        self
    }
}

impl DataSource for StaticDataSource {
    fn summary_facts(&self) -> Result<Option<NamedLookup>, DataError> {
        Ok(self.summary.clone())
    }

    fn detail_facts(&self) -> Result<Option<NamedLookup>, DataError> {
        Ok(self.details.clone())
    }

    fn records(&self) -> Result<Option<RecordSet>, DataError> {
        Ok(self.records.clone())
    }

    fn test_cases(&self) -> Result<Option<RecordSet>, DataError> {
        Ok(self.test_cases.clone())
    }

    fn latest_build_number(&self) -> Result<Option<String>, DataError> {
        Ok(self.build_number.clone())
    }

    fn latest_change_number(&self) -> Result<Option<u64>, DataError> {
        Ok(self.change_number)
    }
}

// ============================================================================
// Default facts
// ============================================================================

/// Release date as shown in the summary: `M/D/YYYY`, no zero padding.
pub fn release_date(today: NaiveDate) -> String {
    today.format("%-m/%-d/%Y").to_string()
}

/// Executive summary facts: defaults from settings, source facts on top.
pub fn summary_facts(
    source: &dyn DataSource,
    settings: &ReportSettings,
    today: NaiveDate,
) -> Result<NamedLookup, DataError> {
    let build = source.latest_build_number()?;
    let mut facts = NamedLookup::new(SUMMARY_NAME)
        .with("Application", settings.project_name.as_str())
        .with("Release Date", release_date(today))
        .with(
            "Release",
            format!("{} {}", settings.project_name, settings.iteration),
        )
        .with("Iteration (Sprint) #", settings.iteration.as_str())
        .with("Build #", build.as_deref().unwrap_or(UNAVAILABLE));
    if let Some(overlay) = source.summary_facts()? {
        facts.extend_from(&overlay);
    }
    Ok(facts)
}

/// Detail facts: servers from settings, unset ones skipped, then the source
/// changeset.
pub fn detail_facts(
    source: &dyn DataSource,
    settings: &ReportSettings,
) -> Result<NamedLookup, DataError> {
    let change = source.latest_change_number()?;
    let mut facts = NamedLookup::new(DETAILS_NAME);
    facts.set(Some("Web Server"), settings.web_server.as_deref());
    facts.set(Some("Database Server"), settings.database_server.as_deref());
    facts.set(Some("Database"), settings.database.as_deref());
    let changeset = change.map_or_else(|| UNAVAILABLE.to_string(), |n| n.to_string());
    facts.insert("Source", format!("(Changeset: {changeset})"));
    if let Some(overlay) = source.detail_facts()? {
        facts.extend_from(&overlay);
    }
    Ok(facts)
}

// ============================================================================
// Inventory
// ============================================================================

/// Row and column counts of a record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableShape {
    pub rows: usize,
    pub columns: usize,
}

impl TableShape {
    fn of(records: &RecordSet) -> Self {
        Self {
            rows: records.row_count(),
            columns: records.column_count(),
        }
    }
}

/// What a data source holds, without rendering anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataInventory {
    pub summary_facts: usize,
    pub detail_facts: usize,
    pub records: Option<TableShape>,
    pub test_cases: Option<TableShape>,
    pub build_number: Option<String>,
    pub change_number: Option<u64>,
}

impl DataInventory {
    pub fn collect(source: &dyn DataSource) -> Result<Self, DataError> {
        Ok(Self {
            summary_facts: source.summary_facts()?.map_or(0, |l| l.len()),
            detail_facts: source.detail_facts()?.map_or(0, |l| l.len()),
            records: source.records()?.as_ref().map(TableShape::of),
            test_cases: source.test_cases()?.as_ref().map(TableShape::of),
            build_number: source.latest_build_number()?,
            change_number: source.latest_change_number()?,
        })
    }
}
