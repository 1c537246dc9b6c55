//! Column-per-field tables with an optional spaced header row.

use super::{Cell, CellStyle, LayoutError};
use crate::config::ReportSettings;
use crate::naming::{plain_text, space_capitalized_names};
use crate::records::RecordSet;

/// Column whose values link to the work item.
pub const ID_COLUMN: &str = "ID";

/// Check that a record set can be laid out as a table.
pub fn validate(records: Option<&RecordSet>) -> Result<&RecordSet, LayoutError> {
    let records = records
        .ok_or_else(|| LayoutError::MalformedTable("Data object was not initialized.".into()))?;
    if records.column_count() == 0 {
        return Err(LayoutError::MalformedTable(
            "Not enough data was pulled in: no columns.".into(),
        ));
    }
    if records.row_count() == 0 {
        return Err(LayoutError::MalformedTable(
            "Not enough data was pulled in: no rows.".into(),
        ));
    }
    Ok(records)
}

/// Lay out `records` as `(rows [+1 header]) × columns` cells.
///
/// Data rows alternate light/shaded by their index within the table, header
/// row included, so the first data row under a header is shaded.
pub fn table_grid(
    records: Option<&RecordSet>,
    header: bool,
    settings: &ReportSettings,
) -> Result<Vec<Vec<Cell>>, LayoutError> {
    let records = validate(records)?;
    let id_col = records.column_index(ID_COLUMN);
    let mut grid = Vec::with_capacity(records.row_count() + usize::from(header));

    if header {
        grid.push(
            records
                .columns()
                .iter()
                .map(|name| Cell::text(space_capitalized_names(name), CellStyle::ColumnHeader))
                .collect(),
        );
    }

    for row in records.rows() {
        let style = if grid.len() % 2 == 0 {
            CellStyle::RowLight
        } else {
            CellStyle::RowShaded
        };
        let cells = row
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let text = plain_text(value);
                if Some(i) == id_col && !text.is_empty() {
                    let target = settings.work_item_url(&text);
                    Cell::link(text, target, style)
                } else {
                    Cell::text(text, style)
                }
            })
            .collect();
        grid.push(cells);
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_settings;

    fn requirements() -> RecordSet {
        RecordSet::new(["ID", "WorkItemType", "Title", "AreaPath"])
            .with_row(["7", "Bug", "Fix login", "Web"])
            .with_row(["8", "Task", "<b>Tidy</b>&nbsp;up", "Api"])
            .with_row(["9", "Bug", "Crash", "Web"])
    }

    #[test]
    fn absent_records_are_malformed() {
        let err = table_grid(None, true, &sample_settings()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Data object was not initialized."
        );
    }

    #[test]
    fn zero_rows_are_malformed_even_with_header() {
        let set = RecordSet::new(["ID", "Title"]);
        let err = table_grid(Some(&set), true, &sample_settings()).unwrap_err();
        assert!(matches!(err, LayoutError::MalformedTable(_)));
    }

    #[test]
    fn zero_columns_are_malformed() {
        let set = RecordSet::new(Vec::<String>::new());
        let err = table_grid(Some(&set), false, &sample_settings()).unwrap_err();
        assert!(matches!(err, LayoutError::MalformedTable(_)));
    }

    #[test]
    fn header_row_has_spaced_names() {
        let grid = table_grid(Some(&requirements()), true, &sample_settings()).unwrap();
        assert_eq!(grid.len(), 4);
        assert!(grid.iter().all(|r| r.len() == 4));
        let header: Vec<&str> = grid[0].iter().map(|c| c.text.as_str()).collect();
        assert_eq!(header, vec!["ID", "Work Item Type", "Title", "Area Path"]);
        assert!(grid[0].iter().all(|c| c.style == CellStyle::ColumnHeader));
    }

    #[test]
    fn without_header_only_data_rows() {
        let grid = table_grid(Some(&requirements()), false, &sample_settings()).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0][2].text, "Fix login");
    }

    #[test]
    fn rows_alternate_by_table_index() {
        let grid = table_grid(Some(&requirements()), true, &sample_settings()).unwrap();
        assert_eq!(grid[1][0].style, CellStyle::RowShaded);
        assert_eq!(grid[2][0].style, CellStyle::RowLight);
        assert_eq!(grid[3][0].style, CellStyle::RowShaded);
    }

    #[test]
    fn id_cell_links_to_work_item() {
        let settings = sample_settings();
        let set = RecordSet::new(["ID", "Title"]).with_row(["7", "Fix login"]);
        let grid = table_grid(Some(&set), true, &settings).unwrap();
        let id = &grid[1][0];
        assert_eq!(id.text, "7");
        let link = id.link.as_deref().unwrap();
        assert!(link.contains('7'));
        assert_eq!(link, settings.work_item_url("7"));
        assert_eq!(grid[1][1].link, None);
    }

    #[test]
    fn values_are_plain_texted() {
        let grid = table_grid(Some(&requirements()), true, &sample_settings()).unwrap();
        assert_eq!(grid[2][2].text, "Tidy up");
    }
}
