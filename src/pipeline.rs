//! Report generation: the fixed section sequence.
//!
//! ```text
//! pre-format
//! header graphic
//! title
//! Executive Summary      key/value, 2 pairs per row
//! Access                 named hyperlink section
//! Details                key/value, 1 pair per row
//! Included Requirements  heading + vertical table
//! ── new page "Test Cases" ──
//! Test Cases             heading + vertical table
//! post-format
//! save
//! ```
//!
//! The two vertical-table steps are the only recoverable ones. If their data
//! cannot be fetched, is absent, or fails the table preconditions, an error
//! row takes the table's place and generation continues. Any other failure
//! aborts the run: the backend is dropped unsaved and the error is returned.

use crate::backend::{self, Artifact, BackendError, ReportBackend};
use crate::config::{ConfigError, OutputFormat, RenderOptions, ReportConfig, ReportSettings};
use crate::layout::{LayoutError, table_error_message};
use crate::records::RecordSet;
use crate::source::{self, DataError, DataSource, UNAVAILABLE};
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use thiserror::Error;

pub const ACCESS_SECTION: &str = "Access";
pub const ACCESS_LABEL: &str = "Application is accessible at: ";
pub const REQUIREMENTS_HEADING: &str = "Included Requirements";
pub const TEST_CASES_PAGE: &str = "Test Cases";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionStatus {
    Rendered,
    /// An error row was drawn in place of the section's table.
    Substituted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOutcome {
    pub name: String,
    pub status: SectionStatus,
}

impl SectionOutcome {
    fn rendered(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: SectionStatus::Rendered,
        }
    }
}

/// A saved report and what happened to each section.
#[derive(Debug, Clone)]
pub struct Report {
    pub artifact: Artifact,
    pub sections: Vec<SectionOutcome>,
}

impl Report {
    pub fn substitutions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().filter_map(|s| match &s.status {
            SectionStatus::Substituted(message) => Some((s.name.as_str(), message.as_str())),
            SectionStatus::Rendered => None,
        })
    }
}

/// One report run over validated settings and a data source.
pub struct Pipeline<'a> {
    settings: &'a ReportSettings,
    source: &'a dyn DataSource,
    today: NaiveDate,
}

impl<'a> Pipeline<'a> {
    pub fn new(settings: &'a ReportSettings, source: &'a dyn DataSource) -> Self {
        Self {
            settings,
            source,
            today: Local::now().date_naive(),
        }
    }

    /// Fix the release date instead of using today's.
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Drive `backend` through every section and save it.
    pub fn run(
        &self,
        mut backend: Box<dyn ReportBackend>,
        wide: bool,
    ) -> Result<Report, ReportError> {
        info!(
            "Generating {} report for {} {}",
            backend.format().extension(),
            self.settings.project_name,
            self.settings.iteration
        );
        let mut sections = Vec::new();

        backend.pre_format()?;

        debug!("header graphic");
        backend.create_header_graphic()?;

        let title = self.settings.title_text();
        debug!("title: {title}");
        backend.create_title(title)?;

        let summary = source::summary_facts(self.source, self.settings, self.today)?;
        debug!("{}: {} facts", summary.name(), summary.len());
        backend.create_horizontal_table(&summary, 2, true)?;
        sections.push(SectionOutcome::rendered(summary.name()));

        let link = self.settings.web_location.as_deref();
        let location = link.unwrap_or(UNAVAILABLE);
        debug!("{ACCESS_SECTION}: {location}");
        backend.create_named_section(ACCESS_SECTION, ACCESS_LABEL, location, link)?;
        sections.push(SectionOutcome::rendered(ACCESS_SECTION));

        let details = source::detail_facts(self.source, self.settings)?;
        debug!("{}: {} facts", details.name(), details.len());
        backend.create_horizontal_table(&details, 1, true)?;
        sections.push(SectionOutcome::rendered(details.name()));

        sections.push(vertical_section(
            backend.as_mut(),
            REQUIREMENTS_HEADING,
            self.source.records(),
        )?);

        backend.create_new_page(TEST_CASES_PAGE)?;
        sections.push(vertical_section(
            backend.as_mut(),
            TEST_CASES_PAGE,
            self.source.test_cases(),
        )?);

        backend.post_format(wide)?;
        let artifact = backend.save()?;
        info!(
            "Generated {} ({} bytes)",
            artifact.file_name,
            artifact.bytes.len()
        );
        Ok(Report {
            artifact,
            sections,
        })
    }
}

/// Heading plus vertical table, or heading plus error row when the table
/// cannot be built. Failures other than data and layout preconditions
/// propagate.
fn vertical_section(
    backend: &mut dyn ReportBackend,
    heading: &str,
    fetched: Result<Option<RecordSet>, DataError>,
) -> Result<SectionOutcome, ReportError> {
    backend.create_header(heading)?;

    let reason = match fetched {
        Err(e) => e.to_string(),
        Ok(records) => {
            if let Some(records) = &records {
                debug!("{heading}: {} records", records.row_count());
            }
            match backend.create_vertical_table(records.as_ref(), true) {
                Ok(()) => return Ok(SectionOutcome::rendered(heading)),
                Err(BackendError::Layout(e @ LayoutError::MalformedTable(_))) => e.to_string(),
                Err(e) => return Err(e.into()),
            }
        }
    };

    let message = table_error_message(&reason);
    warn!("{heading}: {message}");
    backend.create_error_message(&message)?;
    Ok(SectionOutcome {
        name: heading.to_string(),
        status: SectionStatus::Substituted(message),
    })
}

/// Open the backend for `format` and run the pipeline on it.
pub fn generate(
    format: OutputFormat,
    settings: &ReportSettings,
    options: &RenderOptions,
    source: &dyn DataSource,
) -> Result<Report, ReportError> {
    let backend = backend::open_backend(format, settings.clone(), options.clone())?;
    Pipeline::new(settings, source).run(backend, options.layout.wide)
}

/// Validate a loaded configuration, then [`generate`] with it.
///
/// Configuration errors surface before any backend exists.
pub fn generate_from_config(
    config: &ReportConfig,
    format: OutputFormat,
    source: &dyn DataSource,
) -> Result<Report, ReportError> {
    config.validate()?;
    let settings = config.report_settings()?;
    generate(format, &settings, &config.render_options(), source)
}
