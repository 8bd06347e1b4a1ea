//! Font metrics for text measurement and encoding

#[cfg(feature = "ttf-parser")]
use crate::constants::DEFAULT_CHAR_WIDTH_RATIO;
use crate::style::FontStyle;
use std::collections::BTreeSet;

/// Trait for measuring text dimensions and encoding text for PDF rendering.
///
/// Implementations must encode text the same way they measure it, so a
/// measured line is exactly the line that ends up on the page.
pub trait FontMetrics {
    /// Width of a single character in points at the given font size
    fn char_width(&self, ch: char, font_size: f32) -> f32;

    /// Total width of a string in points at the given font size
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }

    /// Encode text for the PDF Tj operator
    fn encode_text(&self, text: &str) -> Vec<u8>;

    /// Whether `ch` is drawn as itself rather than a substitute
    fn has_glyph(&self, _ch: char) -> bool {
        true
    }
}

/// The base-14 families the layout engine can measure without font files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandardFamily {
    #[default]
    Helvetica,
    Courier,
}

impl StandardFamily {
    /// PostScript name of the face for the given style
    pub fn base_font(self, style: FontStyle) -> &'static str {
        match (self, style) {
            (StandardFamily::Helvetica, FontStyle::Normal) => "Helvetica",
            (StandardFamily::Helvetica, FontStyle::Bold) => "Helvetica-Bold",
            (StandardFamily::Courier, FontStyle::Normal) => "Courier",
            (StandardFamily::Courier, FontStyle::Bold) => "Courier-Bold",
        }
    }
}

// Advance widths (1/1000 em) for U+0020..=U+007E from the Adobe AFM files.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

const COURIER_WIDTH: u16 = 600;

// Used for characters outside the tables (Helvetica digit width)
const FALLBACK_WIDTH: u16 = 556;

/// Drawn in place of characters WinAnsi cannot encode
const SUBSTITUTE: char = '?';

/// Metrics of a standard (non-embedded) PDF font using WinAnsi encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardFontMetrics {
    pub family: StandardFamily,
    pub style: FontStyle,
}

impl StandardFontMetrics {
    pub fn new(family: StandardFamily, style: FontStyle) -> Self {
        Self { family, style }
    }

    /// WinAnsi byte drawn for `ch`: itself, its base letter, or `?`
    fn encode_char(ch: char) -> u8 {
        to_winansi(ch)
            .or_else(|| to_winansi(fold_diacritic(ch)))
            .unwrap_or(SUBSTITUTE as u8)
    }

    fn advance(&self, ch: char) -> f32 {
        if self.family == StandardFamily::Courier {
            return COURIER_WIDTH as f32;
        }
        let table = match self.style {
            FontStyle::Normal => &HELVETICA_WIDTHS,
            FontStyle::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        let base = if self.has_glyph(ch) {
            fold_diacritic(ch)
        } else {
            SUBSTITUTE
        };
        match base as u32 {
            code @ 0x20..=0x7E => table[(code - 0x20) as usize] as f32,
            _ => FALLBACK_WIDTH as f32,
        }
    }
}

impl FontMetrics for StandardFontMetrics {
    fn char_width(&self, ch: char, font_size: f32) -> f32 {
        self.advance(ch) / 1000.0 * font_size
    }

    fn encode_text(&self, text: &str) -> Vec<u8> {
        text.chars().map(Self::encode_char).collect()
    }

    fn has_glyph(&self, ch: char) -> bool {
        to_winansi(ch).is_some() || to_winansi(fold_diacritic(ch)).is_some()
    }
}

/// Map a character to its unaccented base letter.
///
/// Covers the Latvian alphabet and the Latin-1 letters; anything else is
/// returned unchanged.
pub fn fold_diacritic(ch: char) -> char {
    match ch {
        'ā' | 'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Ā' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'č' | 'ç' => 'c',
        'Č' | 'Ç' => 'C',
        'ē' | 'è' | 'é' | 'ê' | 'ë' => 'e',
        'Ē' | 'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ģ' => 'g',
        'Ģ' => 'G',
        'ī' | 'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ī' | 'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ķ' => 'k',
        'Ķ' => 'K',
        'ļ' => 'l',
        'Ļ' => 'L',
        'ņ' | 'ñ' => 'n',
        'Ņ' | 'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'š' => 's',
        'Š' => 'S',
        'ū' | 'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ū' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'ž' => 'z',
        'Ž' => 'Z',
        other => other,
    }
}

/// WinAnsiEncoding byte for a character, if the encoding has one
pub fn to_winansi(ch: char) -> Option<u8> {
    match ch as u32 {
        0x0020..=0x007E => Some(ch as u8),
        0x00A0..=0x00FF => Some(ch as u8),
        0x20AC => Some(0x80),
        0x2026 => Some(0x85),
        0x0160 => Some(0x8A),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x0161 => Some(0x9A),
        0x017E => Some(0x9E),
        _ => None,
    }
}

/// TrueType font metrics using ttf-parser for accurate glyph measurement and encoding.
///
/// This struct owns the font data. The PDF writer embeds the same bytes as a
/// composite font, so the glyph IDs produced by `encode_text` are the CIDs.
#[cfg(feature = "ttf-parser")]
#[derive(Clone)]
pub struct TtfFontMetrics {
    font_data: Vec<u8>,
    units_per_em: f32,
    postscript_name: String,
}

#[cfg(feature = "ttf-parser")]
impl TtfFontMetrics {
    /// Create new font metrics from raw TTF font data.
    ///
    /// Validates the font by parsing it and extracting units_per_em.
    pub fn new(font_data: Vec<u8>) -> crate::Result<Self> {
        let face = ttf_parser::Face::parse(&font_data, 0).map_err(|e| {
            crate::error::ActError::TextError(format!("Failed to parse font: {e}"))
        })?;
        let units_per_em = face.units_per_em() as f32;
        let postscript_name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .unwrap_or_else(|| "EmbeddedFont".to_string());
        Ok(Self {
            font_data,
            units_per_em,
            postscript_name: postscript_name.replace(' ', ""),
        })
    }

    /// Raw font program, embedded as FontFile2
    pub fn font_data(&self) -> &[u8] {
        &self.font_data
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    pub fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    pub(crate) fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.font_data, 0).ok()
    }

    /// Glyph ID and advance (1/1000 em) for a character
    pub fn glyph(&self, ch: char) -> Option<(u16, f32)> {
        let face = self.face()?;
        let gid = face.glyph_index(ch)?;
        let advance = face.glyph_hor_advance(gid)? as f32;
        Some((gid.0, advance / self.units_per_em * 1000.0))
    }
}

#[cfg(feature = "ttf-parser")]
impl FontMetrics for TtfFontMetrics {
    fn char_width(&self, ch: char, font_size: f32) -> f32 {
        self.glyph(ch)
            .map(|(_, advance)| advance / 1000.0 * font_size)
            .unwrap_or(font_size * DEFAULT_CHAR_WIDTH_RATIO)
    }

    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let Some(face) = self.face() else {
            return text.chars().count() as f32 * font_size * DEFAULT_CHAR_WIDTH_RATIO;
        };
        text.chars()
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|advance| advance as f32 / self.units_per_em * font_size)
                    .unwrap_or(font_size * DEFAULT_CHAR_WIDTH_RATIO)
            })
            .sum()
    }

    fn encode_text(&self, text: &str) -> Vec<u8> {
        let face = self.face();
        let mut bytes = Vec::with_capacity(text.len() * 2);
        for ch in text.chars() {
            let glyph_id = face
                .as_ref()
                .and_then(|f| f.glyph_index(ch))
                .map(|g| g.0)
                .unwrap_or(0);
            bytes.extend_from_slice(&glyph_id.to_be_bytes());
        }
        bytes
    }

    fn has_glyph(&self, ch: char) -> bool {
        self.glyph(ch).is_some()
    }
}

#[cfg(feature = "ttf-parser")]
impl std::fmt::Debug for TtfFontMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfFontMetrics")
            .field("postscript_name", &self.postscript_name)
            .field("units_per_em", &self.units_per_em)
            .field("font_data_len", &self.font_data.len())
            .finish()
    }
}

/// One face of a [`FontSet`]
#[derive(Debug, Clone)]
pub enum FontFace {
    Standard(StandardFontMetrics),
    #[cfg(feature = "ttf-parser")]
    Embedded(TtfFontMetrics),
}

impl FontFace {
    pub fn metrics(&self) -> &dyn FontMetrics {
        match self {
            FontFace::Standard(m) => m,
            #[cfg(feature = "ttf-parser")]
            FontFace::Embedded(m) => m,
        }
    }
}

/// Regular and bold faces used by one render
#[derive(Debug, Clone)]
pub struct FontSet {
    regular: FontFace,
    bold: FontFace,
}

impl FontSet {
    /// A standard PDF font family; nothing is embedded
    pub fn standard(family: StandardFamily) -> Self {
        Self {
            regular: FontFace::Standard(StandardFontMetrics::new(family, FontStyle::Normal)),
            bold: FontFace::Standard(StandardFontMetrics::new(family, FontStyle::Bold)),
        }
    }

    /// Embedded TrueType faces (full Unicode coverage)
    #[cfg(feature = "ttf-parser")]
    pub fn embedded(regular: Vec<u8>, bold: Vec<u8>) -> crate::Result<Self> {
        Ok(Self {
            regular: FontFace::Embedded(TtfFontMetrics::new(regular)?),
            bold: FontFace::Embedded(TtfFontMetrics::new(bold)?),
        })
    }

    pub fn face(&self, style: FontStyle) -> &FontFace {
        match style {
            FontStyle::Normal => &self.regular,
            FontStyle::Bold => &self.bold,
        }
    }

    pub fn metrics(&self, style: FontStyle) -> &dyn FontMetrics {
        self.face(style).metrics()
    }

    /// Characters of `runs` the chosen face draws as a substitute
    pub fn missing_glyphs<'t>(
        &self,
        runs: impl IntoIterator<Item = (&'t str, FontStyle)>,
    ) -> BTreeSet<char> {
        runs.into_iter()
            .flat_map(|(text, style)| {
                let metrics = self.metrics(style);
                text.chars().filter(move |&ch| !metrics.has_glyph(ch))
            })
            .collect()
    }

    /// Resource name used in content streams
    pub fn resource_name(style: FontStyle) -> &'static str {
        match style {
            FontStyle::Normal => "F1",
            FontStyle::Bold => "F1-Bold",
        }
    }
}

impl Default for FontSet {
    fn default() -> Self {
        Self::standard(StandardFamily::Helvetica)
    }
}
