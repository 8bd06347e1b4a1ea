//! Vertical cursor, page breaks, running headers and footers

use crate::Result;
use crate::canvas::PageCanvas;
use crate::constants::{
    FOOTER_OFFSET, FOOTER_RESERVE, HEADER_BASELINE, HEADER_HEIGHT, HEADER_LOGO_SCALE,
    TABLE_TRAILING_SPACE, WIDTH_TOLERANCE, mm,
};
use crate::drawing::draw_table_rows;
use crate::error::ActError;
use crate::font::FontSet;
use crate::layout::calculate_layout;
use crate::logo::Logo;
use crate::style::{Alignment, Color, FontStyle, Palette};
use crate::table::Table;
use crate::text::{TextOptions, align_offset, normalize_text, shape_lines};
use tracing::{debug, instrument, trace};

/// Page geometry and the write position of one render
#[derive(Debug, Clone)]
pub struct RenderState {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub header_height: f32,
    pub footer_reserve: f32,
    /// Current write position, measured from the top edge
    pub cursor: f32,
    /// Zero-based index of the page being written
    pub page_index: usize,
    pub palette: Palette,
}

impl RenderState {
    pub fn new(page_width: f32, page_height: f32, margin: f32, palette: Palette) -> Self {
        Self {
            page_width,
            page_height,
            margin,
            header_height: HEADER_HEIGHT,
            footer_reserve: FOOTER_RESERVE,
            cursor: margin,
            page_index: 0,
            palette,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Lowest cursor position a block may reach
    pub fn content_bottom(&self) -> f32 {
        self.page_height - self.footer_reserve - self.margin
    }

    /// Where the cursor starts on continuation pages
    pub fn content_top(&self) -> f32 {
        self.margin + self.header_height
    }

    pub fn remaining(&self) -> f32 {
        self.content_bottom() - self.cursor
    }

    pub fn fits(&self, height: f32) -> bool {
        self.cursor + height <= self.content_bottom()
    }
}

/// Label and logo repeated at the top of every page after the first
#[derive(Debug, Clone)]
pub struct RunningHeader {
    pub label: String,
}

/// Places blocks page by page and starts new pages when space runs out
pub struct Paginator<'a> {
    fonts: &'a FontSet,
    state: RenderState,
    pages: Vec<PageCanvas>,
    header: Option<RunningHeader>,
    logo: Option<&'a Logo>,
    // Nothing has been placed below the top of the current page yet
    page_fresh: bool,
}

impl<'a> Paginator<'a> {
    pub fn new(fonts: &'a FontSet, state: RenderState) -> Self {
        let first = PageCanvas::new(state.page_height);
        Self {
            fonts,
            state,
            pages: vec![first],
            header: None,
            logo: None,
            page_fresh: true,
        }
    }

    pub fn with_running_header(mut self, label: impl Into<String>) -> Self {
        self.header = Some(RunningHeader {
            label: label.into(),
        });
        self
    }

    pub fn with_logo(mut self, logo: Option<&'a Logo>) -> Self {
        self.logo = logo;
        self
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn palette(&self) -> &Palette {
        &self.state.palette
    }

    pub fn fonts(&self) -> &'a FontSet {
        self.fonts
    }

    pub fn logo(&self) -> Option<&'a Logo> {
        self.logo
    }

    pub fn cursor(&self) -> f32 {
        self.state.cursor
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn canvas(&mut self) -> &mut PageCanvas {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Start a new page when a block of `height` does not fit below the cursor.
    ///
    /// A page nothing has been written to is never abandoned, so a block
    /// taller than a whole page does not produce blank pages. Returns whether
    /// a page break happened.
    pub fn ensure_space(&mut self, height: f32) -> bool {
        if self.state.fits(height) || self.page_fresh {
            return false;
        }
        trace!(
            "Block of {:.1} pt does not fit at {:.1}, breaking page",
            height, self.state.cursor
        );
        self.new_page();
        true
    }

    /// Start a new page and reset the cursor below the running header
    pub fn new_page(&mut self) {
        self.pages.push(PageCanvas::new(self.state.page_height));
        self.state.page_index += 1;
        self.state.cursor = self.state.content_top();
        self.page_fresh = true;
        debug!("Started page {}", self.state.page_index + 1);
        self.draw_running_header();
    }

    fn draw_running_header(&mut self) {
        if self.state.page_index == 0 {
            return;
        }
        let Some(header) = self.header.clone() else {
            return;
        };
        let fonts = self.fonts;
        let margin = self.state.margin;
        let right = self.state.page_width - margin;
        let text_color = self.state.palette.text;
        let primary = self.state.palette.primary;

        if let Some(logo) = self.logo {
            let (w, h) = logo.scaled(HEADER_LOGO_SCALE);
            self.canvas()
                .image(margin, HEADER_BASELINE - mm(10.0), w, h);
        }

        let label_width = fonts
            .metrics(FontStyle::Normal)
            .text_width(&header.label, 10.0);
        self.canvas().text(
            fonts,
            &header.label,
            right - label_width,
            HEADER_BASELINE,
            10.0,
            FontStyle::Normal,
            text_color,
        );

        let rule_y = HEADER_BASELINE + mm(5.0);
        self.canvas()
            .line(margin, rule_y, right, rule_y, primary, mm(0.5));
    }

    /// Move the cursor down by `dy`
    pub fn advance(&mut self, dy: f32) {
        self.state.cursor += dy;
    }

    /// Place the cursor at an absolute position on the current page
    pub fn set_cursor(&mut self, y: f32) {
        self.state.cursor = y;
    }

    /// Flow text at the cursor, wrapping and breaking pages line by line.
    ///
    /// Returns the number of lines emitted; empty text emits nothing and
    /// leaves the cursor where it was.
    pub fn add_text(&mut self, text: &str, options: &TextOptions) -> usize {
        if text.trim().is_empty() {
            return 0;
        }
        let text = normalize_text(text);
        let fonts = self.fonts;
        let margin = self.state.margin;
        let left = options.x.unwrap_or(margin);
        let width = options
            .max_width
            .unwrap_or_else(|| self.state.content_width() - (left - margin));
        let size = options.font_size;
        let line_height = options.resolved_line_height();
        let color = options.color.unwrap_or(self.state.palette.text);

        let lines = shape_lines(
            &text,
            left,
            width,
            size,
            options.alignment,
            fonts.metrics(options.style),
        );

        for line in &lines {
            self.ensure_space(line_height);
            let baseline = self.state.cursor;
            self.canvas()
                .text(fonts, &line.text, line.x, baseline, size, options.style, color);
            self.state.cursor += line_height;
            self.page_fresh = false;
        }
        lines.len()
    }

    /// Place a single run without touching the cursor
    #[allow(clippy::too_many_arguments)]
    pub fn text_at(
        &mut self,
        text: &str,
        x: f32,
        baseline: f32,
        font_size: f32,
        style: FontStyle,
        color: Color,
    ) {
        let fonts = self.fonts;
        let text = normalize_text(text);
        self.canvas()
            .text(fonts, &text, x, baseline, font_size, style, color);
        self.page_fresh = false;
    }

    /// Horizontal rule across the content width at the cursor
    pub fn rule(&mut self, color: Color, width: f32) {
        let y = self.state.cursor;
        let left = self.state.margin;
        let right = self.state.page_width - left;
        self.canvas().line(left, y, right, y, color, width);
        self.page_fresh = false;
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color, width: f32) {
        self.canvas().line(x1, y1, x2, y2, color, width);
        self.page_fresh = false;
    }

    pub fn rounded_rect(&mut self, x: f32, top: f32, width: f32, height: f32, radius: f32, color: Color) {
        self.canvas().rounded_rect(x, top, width, height, radius, color);
        self.page_fresh = false;
    }

    /// Paint the logo at full size with its top-left corner at `(x, top)`
    pub fn place_logo(&mut self, x: f32, top: f32) -> Option<f32> {
        let logo = self.logo?;
        self.canvas().image(x, top, logo.width, logo.height);
        self.page_fresh = false;
        Some(logo.height)
    }

    /// Draw a table across the content width at the cursor.
    ///
    /// The page is broken up front when the whole table does not fit. A
    /// table taller than a page continues on the following pages with its
    /// header row repeated.
    #[instrument(skip(self, table), fields(rows = table.rows.len()))]
    pub fn add_table(&mut self, table: &Table) -> Result<()> {
        let fonts = self.fonts;
        let layout = calculate_layout(table, self.state.content_width(), fonts)?;
        let row_h = layout.row_height;
        let rows = layout.body_cells.len();

        let page_capacity = self.state.content_bottom() - self.state.content_top();
        let minimum = if rows == 0 { row_h } else { 2.0 * row_h };
        if minimum > page_capacity {
            return Err(ActError::LayoutError(format!(
                "Table rows of {row_h:.1} pt do not fit on a page"
            )));
        }

        self.ensure_space(layout.total_height());

        let x = self.state.margin;
        let mut next = 0;
        loop {
            let available = self.state.remaining() + WIDTH_TOLERANCE;
            let fit = ((available - row_h) / row_h).floor().max(0.0) as usize;
            let end = (next + fit).min(rows);
            if end == next && next < rows {
                self.new_page();
                continue;
            }

            let top = self.state.cursor;
            let height = draw_table_rows(self.canvas(), fonts, &table.style, &layout, x, top, next..end);
            self.state.cursor += height;
            self.page_fresh = false;
            next = end;

            if next >= rows {
                break;
            }
            debug!("Table continues on a new page after row {}", next);
            self.new_page();
        }

        self.state.cursor += TABLE_TRAILING_SPACE;
        Ok(())
    }

    /// Stamp every page footer and hand back the finished pages.
    ///
    /// Runs after layout because the total page count is only known then.
    pub fn finish(mut self, generated_at: &str) -> Vec<PageCanvas> {
        let total = self.pages.len();
        let fonts = self.fonts;
        let metrics = fonts.metrics(FontStyle::Normal);
        let width = self.state.page_width;
        let margin = self.state.margin;
        let footer_y = self.state.page_height - FOOTER_OFFSET;
        let muted = self.state.palette.muted;
        let primary = self.state.palette.primary;
        let stamp = format!("Ģenerēts: {generated_at}");
        let stamp_width = metrics.text_width(&stamp, 9.0);

        for (i, page) in self.pages.iter_mut().enumerate() {
            let label = format!("Lapa {} no {}", i + 1, total);
            let label_width = metrics.text_width(&label, 9.0);
            let label_x = align_offset(0.0, width, label_width, Alignment::Center);
            page.text(fonts, &label, label_x, footer_y, 9.0, FontStyle::Normal, muted);

            let stamp_x = align_offset(margin, width - 2.0 * margin, stamp_width, Alignment::Right);
            page.text(fonts, &stamp, stamp_x, footer_y, 9.0, FontStyle::Normal, muted);

            let rule_y = footer_y - mm(5.0);
            page.line(margin, rule_y, width - margin, rule_y, primary, mm(0.3));
        }

        debug!("Stamped footers on {} pages", total);
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{A4_HEIGHT, A4_WIDTH, DEFAULT_MARGIN};

    fn state() -> RenderState {
        RenderState::new(A4_WIDTH, A4_HEIGHT, DEFAULT_MARGIN, Palette::corporate())
    }

    #[test]
    fn test_empty_text_is_noop() {
        let fonts = FontSet::default();
        let mut p = Paginator::new(&fonts, state());
        let before = p.cursor();
        assert_eq!(p.add_text("", &TextOptions::default()), 0);
        assert_eq!(p.add_text("  \n ", &TextOptions::default()), 0);
        assert_eq!(p.cursor(), before);
    }

    #[test]
    fn test_add_text_advances_per_line() {
        let fonts = FontSet::default();
        let mut p = Paginator::new(&fonts, state());
        let opts = TextOptions::new(11.0).with_line_height(10.0);
        let before = p.cursor();
        let n = p.add_text("viena\notra\ntreša", &opts);
        assert_eq!(n, 3);
        assert!((p.cursor() - before - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_ensure_space_breaks_page() {
        let fonts = FontSet::default();
        let mut p = Paginator::new(&fonts, state()).with_running_header("Akts");
        p.add_text("sākums", &TextOptions::default());
        let bottom = p.state().content_bottom();
        p.set_cursor(bottom - 5.0);

        assert!(!p.ensure_space(5.0));
        assert!(p.ensure_space(6.0));
        assert_eq!(p.page_count(), 2);
        assert!((p.cursor() - p.state().content_top()).abs() < 1e-4);
    }

    #[test]
    fn test_fresh_page_is_not_abandoned() {
        let fonts = FontSet::default();
        let mut p = Paginator::new(&fonts, state());
        assert!(!p.ensure_space(A4_HEIGHT * 2.0));
        assert_eq!(p.page_count(), 1);
    }

    #[test]
    fn test_running_header_only_after_first_page() {
        let fonts = FontSet::default();
        let mut p = Paginator::new(&fonts, state()).with_running_header("Pieņemšanas-nodošanas akts");
        p.new_page();
        let pages = p.finish("01.01.2025. 10:00:00");
        assert!(!pages[0].contains_text("Pieņemšanas-nodošanas akts"));
        assert!(pages[1].contains_text("Pieņemšanas-nodošanas akts"));
    }

    #[test]
    fn test_footers_report_total() {
        let fonts = FontSet::default();
        let mut p = Paginator::new(&fonts, state());
        p.new_page();
        p.new_page();
        let pages = p.finish("01.01.2025. 10:00:00");
        assert_eq!(pages.len(), 3);
        for (i, page) in pages.iter().enumerate() {
            assert!(page.contains_text(&format!("Lapa {} no 3", i + 1)));
            assert!(page.contains_text("Ģenerēts: 01.01.2025. 10:00:00"));
        }
    }

    #[test]
    fn test_table_breaks_up_front() {
        let fonts = FontSet::default();
        let mut p = Paginator::new(&fonts, state());
        p.add_text("ievads", &TextOptions::default());
        let bottom = p.state().content_bottom();
        p.set_cursor(bottom - 30.0);

        let table = Table::new(["A", "B"]).add_row(["1", "2"]).add_row(["3", "4"]);
        p.add_table(&table).unwrap();

        assert_eq!(p.page_count(), 2);
        let pages = p.finish("x");
        assert!(pages[1].contains_text("A"));
        assert!(!pages[0].texts().iter().any(|t| t.text == "B"));
    }

    #[test]
    fn test_long_table_repeats_header() {
        let fonts = FontSet::default();
        let mut p = Paginator::new(&fonts, state());
        let mut table = Table::new(["Nr.", "Nosaukums"]);
        for i in 0..80 {
            table = table.add_row([format!("{}", i + 1), format!("Lieta {}", i + 1)]);
        }
        p.add_table(&table).unwrap();
        let pages = p.finish("x");

        assert!(pages.len() >= 2);
        for page in &pages {
            assert!(page.texts().iter().any(|t| t.text == "Nosaukums"));
        }
        let placed: usize = pages
            .iter()
            .map(|pg| pg.texts().iter().filter(|t| t.text.starts_with("Lieta ")).count())
            .sum();
        assert_eq!(placed, 80);
    }

    #[test]
    fn test_table_advances_cursor() {
        let fonts = FontSet::default();
        let mut p = Paginator::new(&fonts, state());
        let table = Table::new(["A"]).add_row(["1"]).add_row(["2"]);
        let row_h = table.style.font_size + 2.0 * table.style.cell_padding;
        let before = p.cursor();
        p.add_table(&table).unwrap();
        let expected = before + 3.0 * row_h + TABLE_TRAILING_SPACE;
        assert!((p.cursor() - expected).abs() < 1e-3);
    }
}
