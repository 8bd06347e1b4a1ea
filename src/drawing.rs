//! PDF drawing operations
//!
//! Primitives here work in native PDF space (origin bottom-left). The
//! top-down conversion happens in [`crate::canvas::PageCanvas`].

use crate::canvas::PageCanvas;
use crate::font::FontSet;
use crate::layout::TableLayout;
use crate::style::{Color, FontStyle};
use crate::table::TableStyle;
use lopdf::{Object, StringFormat, content::Operation};
use std::ops::Range;
use tracing::trace;

/// Bezier control point offset for quarter circles
const KAPPA: f32 = 0.552_284_8;

fn fill_color(color: Color) -> Operation {
    Operation::new("rg", vec![color.r.into(), color.g.into(), color.b.into()])
}

fn stroke_color(color: Color) -> Operation {
    Operation::new("RG", vec![color.r.into(), color.g.into(), color.b.into()])
}

fn rect(x: f32, y: f32, width: f32, height: f32) -> Operation {
    Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()])
}

/// Draw a filled rectangle
pub fn fill_rect(x: f32, y: f32, width: f32, height: f32, color: Color) -> Vec<Operation> {
    vec![
        fill_color(color),
        rect(x, y, width, height),
        Operation::new("f", vec![]),
    ]
}

/// Draw a stroked rectangle (outline only)
pub fn stroke_rect(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    color: Color,
    line_width: f32,
) -> Vec<Operation> {
    vec![
        stroke_color(color),
        Operation::new("w", vec![line_width.into()]),
        rect(x, y, width, height),
        Operation::new("S", vec![]),
    ]
}

/// Draw a rectangle that is both filled and outlined
pub fn fill_stroke_rect(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    fill: Color,
    stroke: Color,
    line_width: f32,
) -> Vec<Operation> {
    vec![
        fill_color(fill),
        stroke_color(stroke),
        Operation::new("w", vec![line_width.into()]),
        rect(x, y, width, height),
        Operation::new("B", vec![]),
    ]
}

/// Draw a straight line
pub fn line(x1: f32, y1: f32, x2: f32, y2: f32, color: Color, line_width: f32) -> Vec<Operation> {
    vec![
        stroke_color(color),
        Operation::new("w", vec![line_width.into()]),
        Operation::new("m", vec![x1.into(), y1.into()]),
        Operation::new("l", vec![x2.into(), y2.into()]),
        Operation::new("S", vec![]),
    ]
}

/// Fill a rectangle with rounded corners of the given radius
pub fn fill_rounded_rect(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    radius: f32,
    color: Color,
) -> Vec<Operation> {
    let r = radius.min(width / 2.0).min(height / 2.0);
    let k = r * KAPPA;
    let (x1, y1, x2, y2) = (x, y, x + width, y + height);

    let curve = |c: [f32; 6]| Operation::new("c", c.iter().map(|&v| v.into()).collect());

    vec![
        fill_color(color),
        Operation::new("m", vec![(x1 + r).into(), y1.into()]),
        Operation::new("l", vec![(x2 - r).into(), y1.into()]),
        curve([x2 - r + k, y1, x2, y1 + r - k, x2, y1 + r]),
        Operation::new("l", vec![x2.into(), (y2 - r).into()]),
        curve([x2, y2 - r + k, x2 - r + k, y2, x2 - r, y2]),
        Operation::new("l", vec![(x1 + r).into(), y2.into()]),
        curve([x1 + r - k, y2, x1, y2 - r + k, x1, y2 - r]),
        Operation::new("l", vec![x1.into(), (y1 + r).into()]),
        curve([x1, y1 + r - k, x1 + r - k, y1, x1 + r, y1]),
        Operation::new("h", vec![]),
        Operation::new("f", vec![]),
    ]
}

/// Show one run of already-encoded text with its baseline at `(x, y)`
pub fn text(
    font_name: &str,
    font_size: f32,
    color: Color,
    x: f32,
    y: f32,
    encoded: Vec<u8>,
) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font_name.as_bytes().to_vec()), font_size.into()],
        ),
        fill_color(color),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(encoded, StringFormat::Hexadecimal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Paint an image XObject into the box with lower-left corner `(x, y)`
pub fn image(name: &str, x: f32, y: f32, width: f32, height: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                width.into(),
                Object::Integer(0),
                Object::Integer(0),
                height.into(),
                x.into(),
                y.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Draw the header row and the data rows in `rows` with their top edge at `top`.
///
/// Stripe colours follow the absolute row index, so a table split across
/// pages keeps its alternation. Returns the height drawn.
pub fn draw_table_rows(
    canvas: &mut PageCanvas,
    fonts: &FontSet,
    style: &TableStyle,
    layout: &TableLayout,
    x: f32,
    top: f32,
    rows: Range<usize>,
) -> f32 {
    let row_h = layout.row_height;
    let width = layout.total_width;
    let size = style.font_size;
    let padding = style.cell_padding;
    let baseline = row_h / 2.0 + size * 0.35;

    trace!("Drawing table rows {:?} at top {:.2}", rows, top);

    // Header
    canvas.fill_stroke_rect(
        x,
        top,
        width,
        row_h,
        style.header_background,
        style.border_color,
        style.border_width,
    );
    for (col, label) in layout.header_cells.iter().enumerate() {
        let cell_x = x + col as f32 * layout.column_width + padding;
        canvas.text(
            fonts,
            label,
            cell_x,
            top + baseline,
            size,
            FontStyle::Bold,
            style.header_text_color,
        );
    }

    let mut row_top = top + row_h;
    for index in rows.clone() {
        let background = style.row_background(index).unwrap_or(Color::white());
        canvas.fill_stroke_rect(
            x,
            row_top,
            width,
            row_h,
            background,
            style.border_color,
            style.border_width,
        );
        for (col, cell) in layout.body_cells[index].iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let cell_x = x + col as f32 * layout.column_width + padding;
            canvas.text(
                fonts,
                cell,
                cell_x,
                row_top + baseline,
                size,
                FontStyle::Normal,
                style.text_color,
            );
        }
        row_top += row_h;
    }

    let height = row_top - top;

    // Outer border and column separators
    canvas.stroke_rect(x, top, width, height, style.border_color, style.border_width);
    for col in 1..layout.column_count() {
        let sep_x = x + col as f32 * layout.column_width;
        canvas.line(
            sep_x,
            top,
            sep_x,
            row_top,
            style.border_color,
            style.border_width,
        );
    }

    height
}
