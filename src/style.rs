//! Colours, alignment and palettes

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values should be 0.0-1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Create a color from 8-bit channels
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Font weight used for a run of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
}

/// Named colours used by the composer
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    /// Headings, rules, table headers and the signature banner
    pub primary: Color,
    /// Sub-headings and act number
    pub secondary: Color,
    /// Body text
    pub text: Color,
    /// Alternate table stripe
    pub light_gray: Color,
    /// Defect descriptions
    pub danger: Color,
    /// Table outlines
    pub border: Color,
    /// Footer text
    pub muted: Color,
}

impl Palette {
    /// Full corporate palette
    pub fn corporate() -> Self {
        Self {
            primary: Color::rgb8(0, 51, 102),
            secondary: Color::rgb8(70, 130, 180),
            text: Color::rgb8(33, 37, 41),
            light_gray: Color::rgb8(248, 249, 250),
            danger: Color::rgb8(220, 53, 69),
            border: Color::rgb8(33, 37, 41),
            muted: Color::rgb8(100, 100, 100),
        }
    }

    /// Reduced palette with light grey outlines
    pub fn compact() -> Self {
        let primary = Color::rgb8(0, 51, 102);
        Self {
            primary,
            secondary: Color::rgb8(70, 130, 180),
            text: Color::rgb8(33, 37, 41),
            light_gray: Color::rgb8(248, 249, 250),
            danger: Color::rgb8(220, 53, 69),
            border: Color::rgb8(200, 200, 200),
            muted: Color::rgb8(128, 128, 128),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::corporate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb8_conversion() {
        let c = Color::rgb8(255, 0, 51);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_rgb_clamps() {
        let c = Color::rgb(1.5, -0.2, 0.5);
        assert_eq!(c, Color::rgb(1.0, 0.0, 0.5));
    }

    #[test]
    fn test_palettes_differ_in_border() {
        assert_ne!(Palette::corporate().border, Palette::compact().border);
        assert_eq!(Palette::corporate().primary, Palette::compact().primary);
    }
}
