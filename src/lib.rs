//! # Release Notes
//!
//! Generates release-notes reports from a tracker's facts and records. Flat
//! key/value summaries and row-oriented record sets go in; a paginated,
//! styled workbook, document, or web page comes out.
//!
//! # Architecture: Layout Engine Behind a Backend Contract
//!
//! ```text
//! data source  →  pipeline  →  layout (cursor + grids)  →  surface  →  bytes
//! ```
//!
//! The interesting part is not any one file format. It is the layout engine:
//! a cursor that hands out non-overlapping rectangular regions, and the
//! algorithms that turn facts and records into grids of styled cells inside
//! those regions. Every output format consumes the same laid-out blocks, so
//! a report reads the same whether it lands in Excel, Word, or a browser.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`layout`] | Cursor, regions, cell styles, and the key/value and tabular grid algorithms |
//! | [`backend`] | The `ReportBackend` contract and the spreadsheet, document and markup surfaces |
//! | [`pipeline`] | Fixed section order, per-section failure isolation, save |
//! | [`source`] | `DataSource` trait, JSON data file, default facts |
//! | [`config`] | Layered `settings.toml` loading and validation; typed report settings |
//! | [`assets`] | Header graphic rendering and its on-disk cache |
//! | [`lookup`] | `NamedLookup`: named, insertion-ordered facts |
//! | [`records`] | `RecordSet`: rectangular tabular records |
//! | [`naming`] | Column-name spacing and rich-text cleanup |
//! | [`output`] | CLI output formatting for `generate` and `check` |
//!
//! # Design Decisions
//!
//! ## One Cursor, Many Surfaces
//!
//! Backends never do layout arithmetic. [`backend::Generator`] owns the
//! cursor and runs [`layout`]; a [`backend::Surface`] only receives finished
//! [`layout::Block`]s with absolute regions. Adding a format means writing a
//! surface, not re-deriving row math.
//!
//! ## Failure Isolation Is Narrow
//!
//! Only the two vertical tables may fail softly: an error row is drawn in
//! their place and the run still succeeds. Everything else (missing
//! settings, an unreadable data file, a backend that cannot start) aborts,
//! and no file is written.
//!
//! ## Typed Settings
//!
//! Settings are parsed once into [`config::ReportSettings`] and passed by
//! reference. Required values are checked before any backend exists.

pub mod assets;
pub mod backend;
pub mod config;
pub mod layout;
pub mod lookup;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod source;

#[cfg(test)]
pub(crate) mod test_helpers;
