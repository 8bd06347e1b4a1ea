//! Constants for page geometry and common layout values

/// Points per millimetre
pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Convert millimetres to points
pub const fn mm(value: f32) -> f32 {
    value * POINTS_PER_MM
}

/// Standard A4 page width in points
pub const A4_WIDTH: f32 = 595.28;

/// Standard A4 page height in points
pub const A4_HEIGHT: f32 = 841.89;

/// Default page margin in points
pub const DEFAULT_MARGIN: f32 = mm(20.0);

/// Height of the running header band on continuation pages
pub const HEADER_HEIGHT: f32 = mm(10.0);

/// Space kept free for the footer at the bottom of every page
pub const FOOTER_RESERVE: f32 = mm(20.0);

/// Baseline of the running header, measured from the top edge
pub const HEADER_BASELINE: f32 = mm(15.0);

/// Distance of the footer baseline from the bottom edge
pub const FOOTER_OFFSET: f32 = mm(15.0);

/// Default character width ratio for text estimation
/// (average character width as a fraction of font size)
pub const DEFAULT_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Default body font size in points
pub const DEFAULT_FONT_SIZE: f32 = 11.0;

/// Allowed measurement slack when comparing widths
pub const WIDTH_TOLERANCE: f32 = 0.01;

/// Marker appended to truncated table cells
pub const ELLIPSIS: &str = "...";

/// Blank space left under a table
pub const TABLE_TRAILING_SPACE: f32 = mm(5.0);

/// Logo bounding box on the title page
pub const LOGO_MAX_WIDTH: f32 = mm(50.0);
pub const LOGO_MAX_HEIGHT: f32 = mm(30.0);

/// Scale of the logo inside the running header
pub const HEADER_LOGO_SCALE: f32 = 0.7;

/// Default border width in points
pub const DEFAULT_BORDER_WIDTH: f32 = 0.5;
