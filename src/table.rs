//! Core table structures

use crate::Result;
use crate::constants::{DEFAULT_BORDER_WIDTH, mm};
use crate::error::ActError;
use crate::style::{Color, Palette};
use tracing::trace;

/// A header row plus data rows drawn with equal-width columns
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub style: TableStyle,
}

impl Table {
    /// Create a table with the given header labels and no rows
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            style: TableStyle::default(),
        }
    }

    /// Add a data row to the table
    pub fn add_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = cells.into_iter().map(Into::into).collect();
        trace!("Adding row with {} cells", row.len());
        self.rows.push(row);
        self
    }

    /// Set the table style
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the font size of every cell
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.style.font_size = size;
        self
    }

    /// Set the padding inside every cell
    pub fn with_cell_padding(mut self, padding: f32) -> Self {
        self.style.cell_padding = padding;
        self
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Validate table structure
    pub fn validate(&self) -> Result<()> {
        if self.headers.is_empty() {
            return Err(ActError::InvalidTable("Table has no columns".to_string()));
        }

        let expected_cols = self.column_count();
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != expected_cols {
                return Err(ActError::InvalidTable(format!(
                    "Row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    expected_cols
                )));
            }
        }

        if self.style.font_size <= 0.0 {
            return Err(ActError::InvalidTable(format!(
                "Font size must be positive, got {}",
                self.style.font_size
            )));
        }

        Ok(())
    }
}

/// Styling for a whole table
#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub header_background: Color,
    pub header_text_color: Color,
    /// Stripe colours cycled over the data rows
    pub row_backgrounds: Vec<Color>,
    pub text_color: Color,
    pub border_color: Color,
    pub border_width: f32,
    pub font_size: f32,
    pub cell_padding: f32,
}

impl TableStyle {
    /// Style derived from a palette: primary header, light grey stripes
    pub fn from_palette(palette: &Palette) -> Self {
        Self {
            header_background: palette.primary,
            header_text_color: Color::white(),
            row_backgrounds: vec![Color::white(), palette.light_gray],
            text_color: palette.text,
            border_color: palette.border,
            ..Default::default()
        }
    }

    /// Background of the data row at `index`, continuing the stripe cycle
    pub fn row_background(&self, index: usize) -> Option<Color> {
        if self.row_backgrounds.is_empty() {
            None
        } else {
            Some(self.row_backgrounds[index % self.row_backgrounds.len()])
        }
    }
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header_background: Color::rgb8(0, 51, 102),
            header_text_color: Color::white(),
            row_backgrounds: vec![Color::white(), Color::rgb8(248, 249, 250)],
            text_color: Color::black(),
            border_color: Color::black(),
            border_width: DEFAULT_BORDER_WIDTH,
            font_size: 10.0,
            cell_padding: mm(3.0),
        }
    }
}
