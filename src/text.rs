//! Text handling, wrapping and truncation utilities

use crate::constants::{ELLIPSIS, mm};
use crate::font::FontMetrics;
use crate::style::{Alignment, Color, FontStyle};
use tracing::trace;

/// Replace typographic punctuation with plain ASCII equivalents
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{201C}' | '\u{201D}' | '\u{201E}' => out.push('"'),
            '\u{2018}' | '\u{2019}' | '\u{201A}' => out.push('\''),
            '\u{2026}' => out.push_str("..."),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            other => out.push(other),
        }
    }
    out
}

/// Break text into lines that fit within `max_width` using font metrics.
///
/// Words are never split unless a single word alone is wider than the line.
/// Explicit newlines start a new line; blank paragraphs produce no line, so
/// empty or whitespace-only input yields no lines at all.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font_size: f32,
    metrics: &dyn FontMetrics,
) -> Vec<String> {
    let mut all_lines = Vec::new();
    let space_width = metrics.char_width(' ', font_size);

    for segment in text.split('\n') {
        let words: Vec<&str> = segment.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let mut current_line = String::new();
        let mut current_width: f32 = 0.0;

        for word in words {
            let word_width = metrics.text_width(word, font_size);

            if word_width > max_width {
                // Flush what we have, then hard-split the oversized word
                if !current_line.is_empty() {
                    all_lines.push(std::mem::take(&mut current_line));
                }
                let (chunks, rest) = split_long_word(word, max_width, font_size, metrics);
                all_lines.extend(chunks);
                current_width = metrics.text_width(&rest, font_size);
                current_line = rest;
                continue;
            }

            if !current_line.is_empty() && current_width + space_width + word_width > max_width {
                all_lines.push(std::mem::take(&mut current_line));
                current_width = 0.0;
            }

            if !current_line.is_empty() {
                current_line.push(' ');
                current_width += space_width;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        if !current_line.is_empty() {
            all_lines.push(current_line);
        }
    }

    trace!("Wrapped text into {} lines", all_lines.len());
    all_lines
}

/// Split a word wider than `max_width` into full-width chunks plus a remainder
fn split_long_word(
    word: &str,
    max_width: f32,
    font_size: f32,
    metrics: &dyn FontMetrics,
) -> (Vec<String>, String) {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut width = 0.0;

    for ch in word.chars() {
        let cw = metrics.char_width(ch, font_size);
        // A single char wider than the line still goes on its own line
        if !current.is_empty() && width + cw > max_width {
            chunks.push(std::mem::take(&mut current));
            width = 0.0;
        }
        current.push(ch);
        width += cw;
    }

    (chunks, current)
}

/// Height needed for wrapped text at the given line height
pub fn wrapped_text_height(
    text: &str,
    max_width: f32,
    font_size: f32,
    line_height: f32,
    metrics: &dyn FontMetrics,
) -> f32 {
    wrap_text(text, max_width, font_size, metrics).len() as f32 * line_height
}

/// Shorten `text` with a trailing ellipsis until it fits within `max_width`.
///
/// Text that already fits is returned unchanged. When not even the ellipsis
/// fits, the result is empty.
pub fn truncate_to_width(
    text: &str,
    max_width: f32,
    font_size: f32,
    metrics: &dyn FontMetrics,
) -> String {
    if metrics.text_width(text, font_size) <= max_width {
        return text.to_string();
    }
    if metrics.text_width(ELLIPSIS, font_size) > max_width {
        return String::new();
    }

    let mut kept = text.to_string();
    let ellipsis_width = metrics.text_width(ELLIPSIS, font_size);
    while !kept.is_empty() && metrics.text_width(&kept, font_size) + ellipsis_width > max_width {
        kept.pop();
    }
    let truncated = format!("{}{}", kept.trim_end(), ELLIPSIS);
    trace!("Truncated {:?} to {:?}", text, truncated);
    truncated
}

/// Options for a block of flowing text
#[derive(Debug, Clone)]
pub struct TextOptions {
    pub font_size: f32,
    pub style: FontStyle,
    pub alignment: Alignment,
    pub color: Option<Color>,
    /// Left edge of the text region; defaults to the page margin
    pub x: Option<f32>,
    /// Width of the text region; defaults to the content width
    pub max_width: Option<f32>,
    /// Vertical advance per line; defaults to `default_line_height(font_size)`
    pub line_height: Option<f32>,
}

impl TextOptions {
    pub fn new(font_size: f32) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.style = FontStyle::Bold;
        self
    }

    pub fn centered(mut self) -> Self {
        self.alignment = Alignment::Center;
        self
    }

    pub fn aligned(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_max_width(mut self, width: f32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_x(mut self, x: f32) -> Self {
        self.x = Some(x);
        self
    }

    pub fn with_line_height(mut self, height: f32) -> Self {
        self.line_height = Some(height);
        self
    }

    pub fn resolved_line_height(&self) -> f32 {
        self.line_height
            .unwrap_or_else(|| default_line_height(self.font_size))
    }
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            font_size: crate::constants::DEFAULT_FONT_SIZE,
            style: FontStyle::Normal,
            alignment: Alignment::Left,
            color: None,
            x: None,
            max_width: None,
            line_height: None,
        }
    }
}

/// Line advance for a font size: `size × 0.4 + 3` millimetres
pub fn default_line_height(font_size: f32) -> f32 {
    mm(font_size * 0.4 + 3.0)
}

/// A wrapped line together with its horizontal placement
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedLine {
    pub text: String,
    pub x: f32,
    pub width: f32,
}

/// Wrap text into the region `[left, left + width]` and align every line on its own
pub fn shape_lines(
    text: &str,
    left: f32,
    width: f32,
    font_size: f32,
    alignment: Alignment,
    metrics: &dyn FontMetrics,
) -> Vec<ShapedLine> {
    wrap_text(text, width, font_size, metrics)
        .into_iter()
        .map(|line| {
            let line_width = metrics.text_width(&line, font_size);
            let x = align_offset(left, width, line_width, alignment);
            ShapedLine {
                text: line,
                x,
                width: line_width,
            }
        })
        .collect()
}

/// Horizontal start of a line of `line_width` inside `[left, left + width]`
pub fn align_offset(left: f32, width: f32, line_width: f32, alignment: Alignment) -> f32 {
    match alignment {
        Alignment::Left => left,
        Alignment::Center => left + (width - line_width) / 2.0,
        Alignment::Right => left + width - line_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{StandardFamily, StandardFontMetrics};

    fn helvetica() -> StandardFontMetrics {
        StandardFontMetrics::new(StandardFamily::Helvetica, FontStyle::Normal)
    }

    #[test]
    fn test_wrap_text() {
        let text = "This is a long piece of text that should be wrapped into multiple lines";
        let lines = wrap_text(text, 100.0, 10.0, &helvetica());
        assert!(lines.len() > 1);
    }

    #[test]
    fn test_empty_text() {
        assert!(wrap_text("", 100.0, 10.0, &helvetica()).is_empty());
        assert!(wrap_text("   \n\t", 100.0, 10.0, &helvetica()).is_empty());
    }

    #[test]
    fn test_single_long_word() {
        let m = helvetica();
        let text = "supercalifragilisticexpialidocious";
        let lines = wrap_text(text, 50.0, 10.0, &m);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), text);
        for line in &lines {
            assert!(m.text_width(line, 10.0) <= 50.0);
        }
    }

    #[test]
    fn test_long_word_after_short_words() {
        let m = helvetica();
        let lines = wrap_text("ab cdefghijklmnopqrstuvwxyz", 40.0, 10.0, &m);
        assert_eq!(lines[0], "ab");
        assert_eq!(lines[1..].concat(), "cdefghijklmnopqrstuvwxyz");
    }

    #[test]
    fn test_text_with_newlines() {
        let lines = wrap_text("Line 1\nLine 2\n\nLine 3", 200.0, 10.0, &helvetica());
        assert_eq!(lines, vec!["Line 1", "Line 2", "Line 3"]);
    }

    #[test]
    fn test_multibyte_long_word_splitting() {
        let text = "ķēķēķēķēķēķēķēķēķēķē";
        let lines = wrap_text(text, 30.0, 10.0, &helvetica());
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn test_wrapped_height() {
        let h = wrapped_text_height("Line 1\nLine 2\nLine 3", 200.0, 10.0, 12.0, &helvetica());
        assert_eq!(h, 36.0);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(
            normalize_text("\u{201C}Līgums\u{201D} \u{2013} nr\u{2026}"),
            "\"Līgums\" - nr..."
        );
    }

    #[test]
    fn test_truncate_fits_unchanged() {
        assert_eq!(truncate_to_width("Dators", 100.0, 10.0, &helvetica()), "Dators");
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        let m = helvetica();
        let out = truncate_to_width("Portatīvais dators ar piederumiem", 60.0, 10.0, &m);
        assert!(out.ends_with(ELLIPSIS));
        assert!(m.text_width(&out, 10.0) <= 60.0);
    }

    #[test]
    fn test_truncate_too_narrow_for_ellipsis() {
        assert_eq!(truncate_to_width("Dators", 3.0, 10.0, &helvetica()), "");
    }

    #[test]
    fn test_center_alignment_is_per_line() {
        let m = helvetica();
        let lines = shape_lines(
            "short words here and a much longer tail line",
            0.0,
            120.0,
            10.0,
            Alignment::Center,
            &m,
        );
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(((line.x * 2.0 + line.width) - 120.0).abs() < 1e-3);
        }
        assert_ne!(lines[0].x, lines[lines.len() - 1].x);
    }

    #[test]
    fn test_right_alignment() {
        let m = helvetica();
        let lines = shape_lines("Lapa", 10.0, 100.0, 10.0, Alignment::Right, &m);
        assert!((lines[0].x + lines[0].width - 110.0).abs() < 1e-3);
    }

    #[test]
    fn test_default_line_height() {
        assert!((default_line_height(11.0) - mm(7.4)).abs() < 1e-4);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::font::{StandardFamily, StandardFontMetrics};
    use crate::constants::WIDTH_TOLERANCE;
    use proptest::prelude::*;

    proptest! {
        /// Property: every wrapped line fits; words that fit survive in order
        #[test]
        fn wrapped_lines_fit_and_rejoin(
            words in prop::collection::vec("[a-zA-Zāčēģīķļņšūž]{1,8}", 0..40),
            seps in prop::collection::vec(prop::sample::select(vec![" ", "  ", "\t", "\n"]), 40),
            max_width in 60.0f32..400.0,
            font_size in 8.0f32..14.0,
        ) {
            let m = StandardFontMetrics::new(StandardFamily::Helvetica, FontStyle::Normal);
            let mut text = String::new();
            for (i, w) in words.iter().enumerate() {
                text.push_str(w);
                text.push_str(seps[i]);
            }
            let lines = wrap_text(&text, max_width, font_size, &m);
            for line in &lines {
                prop_assert!(m.text_width(line, font_size) <= max_width + WIDTH_TOLERANCE);
            }
            // Words wider than the line are split mid-word and cannot rejoin
            if words.iter().all(|w| m.text_width(w, font_size) <= max_width) {
                let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
                prop_assert_eq!(lines.join(" "), normalized);
            }
        }

        /// Property: truncation always fits and marks overflow with an ellipsis
        #[test]
        fn truncated_cells_fit(
            text in "[ a-zA-Z0-9āēū]{0,60}",
            max_width in 15.0f32..200.0,
        ) {
            let m = StandardFontMetrics::new(StandardFamily::Helvetica, FontStyle::Normal);
            let out = truncate_to_width(&text, max_width, 10.0, &m);
            prop_assert!(m.text_width(&out, 10.0) <= max_width + WIDTH_TOLERANCE);
            if m.text_width(&text, 10.0) > max_width {
                prop_assert!(out.ends_with(ELLIPSIS));
            } else {
                prop_assert_eq!(out, text);
            }
        }
    }
}
