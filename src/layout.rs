//! Layout calculation for tables

use crate::Result;
use crate::error::ActError;
use crate::font::FontSet;
use crate::style::FontStyle;
use crate::table::Table;
use crate::text::truncate_to_width;
use tracing::{debug, trace};

/// Calculated layout information for a table
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub column_width: f32,
    pub row_height: f32,
    pub total_width: f32,
    /// Header labels, never truncated
    pub header_cells: Vec<String>,
    /// Data cells after truncation, row by row
    pub body_cells: Vec<Vec<String>>,
}

impl TableLayout {
    pub fn column_count(&self) -> usize {
        self.header_cells.len()
    }

    /// Height of the header plus every data row
    pub fn total_height(&self) -> f32 {
        (self.body_cells.len() + 1) as f32 * self.row_height
    }
}

/// Calculate the layout for a table spanning `total_width` points.
///
/// Columns share the width equally. Header labels are kept whole; data
/// cells wider than the column's inner width are cut back with an ellipsis.
pub fn calculate_layout(table: &Table, total_width: f32, fonts: &FontSet) -> Result<TableLayout> {
    table.validate()?;

    let columns = table.column_count();
    let column_width = total_width / columns as f32;
    let padding = table.style.cell_padding;
    let inner_width = column_width - 2.0 * padding;

    if inner_width <= 0.0 {
        return Err(ActError::LayoutError(format!(
            "Column width {column_width:.2} leaves no room inside {padding:.2} padding"
        )));
    }

    debug!(
        "Calculating layout for {} columns x {} rows",
        columns,
        table.rows.len()
    );

    let size = table.style.font_size;
    let regular = fonts.metrics(FontStyle::Normal);

    let header_cells = table.headers.clone();
    let body_cells = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| truncate_to_width(cell, inner_width, size, regular))
                .collect()
        })
        .collect();

    let row_height = size + 2.0 * padding;
    trace!(
        "Layout calculated: column {:.2}, row {:.2}",
        column_width, row_height
    );

    Ok(TableLayout {
        column_width,
        row_height,
        total_width,
        header_cells,
        body_cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ELLIPSIS, WIDTH_TOLERANCE, mm};

    #[test]
    fn test_equal_columns_and_row_height() {
        let table = Table::new(["A", "B", "C", "D"])
            .add_row(["1", "2", "3", "4"])
            .with_font_size(10.0)
            .with_cell_padding(mm(3.0));
        let layout = calculate_layout(&table, 400.0, &FontSet::default()).unwrap();

        assert_eq!(layout.column_width, 100.0);
        assert!((layout.row_height - (10.0 + 2.0 * mm(3.0))).abs() < 1e-4);
        assert!((layout.total_height() - 2.0 * layout.row_height).abs() < 1e-4);
    }

    #[test]
    fn test_overflowing_cell_is_truncated() {
        let fonts = FontSet::default();
        let long = "Ļoti gara apraksta teksts, kas nekādi neietilpst šūnā";
        let table = Table::new(["Nr.", "Nosaukums"])
            .add_row(["1", long])
            .with_cell_padding(mm(2.0));
        let layout = calculate_layout(&table, 200.0, &fonts).unwrap();

        let cell = &layout.body_cells[0][1];
        assert!(cell.ends_with(ELLIPSIS));
        let inner = layout.column_width - 2.0 * mm(2.0);
        assert!(fonts.metrics(FontStyle::Normal).text_width(cell, 10.0) <= inner + WIDTH_TOLERANCE);
        assert_eq!(layout.body_cells[0][0], "1");
    }

    #[test]
    fn test_header_labels_are_not_truncated() {
        let headers = [
            "Nr.",
            "Nosaukums",
            "Ražotājs/Modelis",
            "Sērijas Nr.",
            "Daudzums",
            "Stāvoklis",
        ];
        let table = Table::new(headers)
            .add_row(["1", "Dators", "Dell Latitude 5440 ar dokstaciju", "", "1 gab.", ""])
            .with_font_size(9.0)
            .with_cell_padding(mm(2.0));
        let layout = calculate_layout(&table, mm(170.0), &FontSet::default()).unwrap();

        assert_eq!(layout.header_cells, headers);
        assert!(layout.body_cells[0][2].ends_with(ELLIPSIS));
    }

    #[test]
    fn test_padding_wider_than_column_errors() {
        let table = Table::new(["A", "B"]).with_cell_padding(60.0);
        assert!(matches!(
            calculate_layout(&table, 200.0, &FontSet::default()),
            Err(ActError::LayoutError(_))
        ));
    }

    #[test]
    fn test_invalid_table_rejected() {
        let table = Table::new(["A", "B"]).add_row(["only one"]);
        assert!(matches!(
            calculate_layout(&table, 200.0, &FontSet::default()),
            Err(ActError::InvalidTable(_))
        ));
    }
}
