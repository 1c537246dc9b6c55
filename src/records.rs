//! Rectangular tabular records: ordered named columns × rows.
//!
//! Every row holds exactly one value per declared column. Rows built with
//! missing values are padded with the empty string; extra values past the
//! last column are dropped. This keeps the vertical layout free of bounds
//! checks.
//!
//! Two JSON shapes deserialize into a [`RecordSet`]:
//!
//! ```json
//! { "columns": ["ID", "Title"], "rows": [["7", "Fix login"]] }
//! ```
//!
//! ```json
//! [ { "ID": "7", "Title": "Fix login" } ]
//! ```
//!
//! In the second form the columns are the union of object keys in first-seen
//! order, and numeric values are rendered as their decimal text.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row of positional values, padded or truncated to the column count.
    pub fn push_row<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = values
            .into_iter()
            .take(self.columns.len())
            .map(Into::into)
            .collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Builder form of [`push_row`](Self::push_row).
    pub fn with_row<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(values);
        self
    }

    /// Append a row keyed by column name. Unknown names are ignored.
    pub fn push_named(&mut self, values: &[(&str, &str)]) {
        let row = self
            .columns
            .iter()
            .map(|col| {
                values
                    .iter()
                    .find(|(k, _)| k == col)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default()
            })
            .collect();
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at (row, column name), if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }
}

/// A record value as it appears in JSON: strings, numbers, booleans or null.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null(()),
}

impl RawValue {
    fn into_text(self) -> String {
        match self {
            RawValue::Text(s) => s,
            RawValue::Int(n) => n.to_string(),
            RawValue::Float(n) => n.to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Null(()) => String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecordSet {
    Table {
        columns: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<RawValue>>,
    },
    Objects(Vec<IndexMap<String, RawValue>>),
}

impl<'de> Deserialize<'de> for RecordSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawRecordSet::deserialize(deserializer)? {
            RawRecordSet::Table { columns, rows } => {
                let mut set = RecordSet::new(columns);
                for row in rows {
                    set.push_row(row.into_iter().map(RawValue::into_text));
                }
                Ok(set)
            }
            RawRecordSet::Objects(objects) => {
                let columns: IndexSet<String> =
                    objects.iter().flat_map(|obj| obj.keys().cloned()).collect();
                let mut rows = Vec::with_capacity(objects.len());
                for obj in objects {
                    let mut row = vec![String::new(); columns.len()];
                    for (key, value) in obj {
                        if let Some(i) = columns.get_index_of(&key) {
                            row[i] = value.into_text();
                        }
                    }
                    rows.push(row);
                }
                let columns = columns.into_iter().collect();
                Ok(RecordSet { columns, rows })
            }
        }
    }
}
