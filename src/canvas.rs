//! Per-page drawing buffer in top-down coordinates

use crate::Result;
use crate::drawing;
use crate::font::FontSet;
use crate::style::{Color, FontStyle};
use lopdf::content::{Content, Operation};

/// Resource name of the logo image XObject
pub const LOGO_RESOURCE: &str = "Im1";

/// A text run as it was placed on the page
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x: f32,
    /// Baseline, measured from the top edge
    pub y: f32,
    pub font_size: f32,
    pub style: FontStyle,
    pub color: Color,
}

/// An image placement, measured from the top edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedImage {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Operations of one page plus a record of the text and images placed on it.
///
/// All coordinates are top-down; `y = 0` is the top edge of the page.
#[derive(Debug, Clone)]
pub struct PageCanvas {
    height: f32,
    operations: Vec<Operation>,
    texts: Vec<PlacedText>,
    images: Vec<PlacedImage>,
}

impl PageCanvas {
    pub fn new(height: f32) -> Self {
        Self {
            height,
            operations: Vec::new(),
            texts: Vec::new(),
            images: Vec::new(),
        }
    }

    fn flip(&self, y: f32) -> f32 {
        self.height - y
    }

    pub fn fill_rect(&mut self, x: f32, top: f32, width: f32, height: f32, color: Color) {
        let y = self.flip(top + height);
        self.operations
            .extend(drawing::fill_rect(x, y, width, height, color));
    }

    pub fn stroke_rect(
        &mut self,
        x: f32,
        top: f32,
        width: f32,
        height: f32,
        color: Color,
        line_width: f32,
    ) {
        let y = self.flip(top + height);
        self.operations
            .extend(drawing::stroke_rect(x, y, width, height, color, line_width));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fill_stroke_rect(
        &mut self,
        x: f32,
        top: f32,
        width: f32,
        height: f32,
        fill: Color,
        stroke: Color,
        line_width: f32,
    ) {
        let y = self.flip(top + height);
        self.operations.extend(drawing::fill_stroke_rect(
            x, y, width, height, fill, stroke, line_width,
        ));
    }

    pub fn rounded_rect(
        &mut self,
        x: f32,
        top: f32,
        width: f32,
        height: f32,
        radius: f32,
        color: Color,
    ) {
        let y = self.flip(top + height);
        self.operations
            .extend(drawing::fill_rounded_rect(x, y, width, height, radius, color));
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color, line_width: f32) {
        let (fy1, fy2) = (self.flip(y1), self.flip(y2));
        self.operations
            .extend(drawing::line(x1, fy1, x2, fy2, color, line_width));
    }

    /// Place one line of text with its baseline at `baseline`.
    ///
    /// The text is encoded with the face chosen from `fonts`, so the bytes
    /// match the widths the caller measured with.
    #[allow(clippy::too_many_arguments)]
    pub fn text(
        &mut self,
        fonts: &FontSet,
        text: &str,
        x: f32,
        baseline: f32,
        font_size: f32,
        style: FontStyle,
        color: Color,
    ) {
        if text.is_empty() {
            return;
        }
        let encoded = fonts.metrics(style).encode_text(text);
        let y = self.flip(baseline);
        self.operations.extend(drawing::text(
            FontSet::resource_name(style),
            font_size,
            color,
            x,
            y,
            encoded,
        ));
        self.texts.push(PlacedText {
            text: text.to_string(),
            x,
            y: baseline,
            font_size,
            style,
            color,
        });
    }

    /// Paint the logo XObject into a box whose top-left corner is `(x, top)`
    pub fn image(&mut self, x: f32, top: f32, width: f32, height: f32) {
        let y = self.flip(top + height);
        self.operations
            .extend(drawing::image(LOGO_RESOURCE, x, y, width, height));
        self.images.push(PlacedImage {
            x,
            y: top,
            width,
            height,
        });
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn texts(&self) -> &[PlacedText] {
        &self.texts
    }

    pub fn images(&self) -> &[PlacedImage] {
        &self.images
    }

    /// Whether any placed text contains `needle`
    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts.iter().any(|t| t.text.contains(needle))
    }

    /// Serialize the operations into a content stream body
    pub fn encode(&self) -> Result<Vec<u8>> {
        let content = Content {
            operations: self.operations.clone(),
        };
        Ok(content.encode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_flips_baseline() {
        let fonts = FontSet::default();
        let mut canvas = PageCanvas::new(800.0);
        canvas.text(&fonts, "Lapa", 10.0, 100.0, 9.0, FontStyle::Normal, Color::black());

        let td = canvas
            .operations()
            .iter()
            .find(|op| op.operator == "Td")
            .unwrap();
        assert_eq!(td.operands[1].as_float().unwrap(), 700.0);
        assert_eq!(canvas.texts()[0].y, 100.0);
    }

    #[test]
    fn test_empty_text_is_skipped() {
        let mut canvas = PageCanvas::new(800.0);
        canvas.text(&FontSet::default(), "", 0.0, 0.0, 9.0, FontStyle::Normal, Color::black());
        assert!(canvas.operations().is_empty());
        assert!(canvas.texts().is_empty());
    }

    #[test]
    fn test_rect_flips_bottom_edge() {
        let mut canvas = PageCanvas::new(800.0);
        canvas.fill_rect(5.0, 100.0, 50.0, 20.0, Color::white());
        let re = &canvas.operations()[1];
        assert_eq!(re.operator, "re");
        assert_eq!(re.operands[1].as_float().unwrap(), 680.0);
    }

    #[test]
    fn test_image_recorded() {
        let mut canvas = PageCanvas::new(800.0);
        canvas.image(10.0, 20.0, 30.0, 40.0);
        assert_eq!(canvas.images().len(), 1);
        assert!(canvas.encode().unwrap().windows(6).any(|w| w == b"/Im1 D"));
    }
}
