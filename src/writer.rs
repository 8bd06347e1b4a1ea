//! Serialization of page canvases into a PDF document

use crate::Result;
use crate::canvas::{LOGO_RESOURCE, PageCanvas};
use crate::font::{FontFace, FontSet};
use crate::logo::Logo;
use crate::style::FontStyle;
use chrono::NaiveDateTime;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::collections::BTreeSet;
use tracing::{debug, instrument, trace};

const PRODUCER: &str = concat!("handover-act ", env!("CARGO_PKG_VERSION"));

/// Document-level values written to the info dictionary and page tree
#[derive(Debug, Clone)]
pub struct DocumentInfo<'a> {
    pub title: &'a str,
    pub created: NaiveDateTime,
    pub page_width: f32,
    pub page_height: f32,
}

/// Build the PDF for a set of finished pages and return its bytes
#[instrument(skip_all, fields(pages = pages.len()))]
pub fn write_pdf(
    pages: &[PageCanvas],
    fonts: &FontSet,
    logo: Option<&Logo>,
    info: &DocumentInfo<'_>,
) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = add_font(&mut doc, fonts, FontStyle::Normal, pages);
    let bold_id = add_font(&mut doc, fonts, FontStyle::Bold, pages);

    let mut resources = dictionary! {
        "Font" => dictionary! {
            FontSet::resource_name(FontStyle::Normal) => regular_id,
            FontSet::resource_name(FontStyle::Bold) => bold_id,
        },
    };

    let uses_logo = pages.iter().any(|page| !page.images().is_empty());
    if let (Some(logo), true) = (logo, uses_logo) {
        let image_id = add_image(&mut doc, logo);
        resources.set("XObject", dictionary! { LOGO_RESOURCE => image_id });
    }
    let resources_id = doc.add_object(resources);

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                info.page_width.into(),
                info.page_height.into(),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => text_string(info.title),
        "Producer" => text_string(PRODUCER),
        "CreationDate" => Object::string_literal(
            info.created.format("D:%Y%m%d%H%M%S").to_string()
        ),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    debug!("Wrote {} pages, {} bytes", pages.len(), bytes.len());
    Ok(bytes)
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn add_image(doc: &mut Document, logo: &Logo) -> ObjectId {
    trace!(
        "Embedding logo {}x{}",
        logo.pixel_width, logo.pixel_height
    );
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => logo.pixel_width as i64,
        "Height" => logo.pixel_height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    doc.add_object(Stream::new(dict, logo.pixels.clone()))
}

/// Characters drawn in the given style across all pages, in a stable order
fn used_chars(pages: &[PageCanvas], style: FontStyle) -> BTreeSet<char> {
    pages
        .iter()
        .flat_map(|page| page.texts())
        .filter(|t| t.style == style)
        .flat_map(|t| t.text.chars())
        .collect()
}

fn add_font(doc: &mut Document, fonts: &FontSet, style: FontStyle, pages: &[PageCanvas]) -> ObjectId {
    match fonts.face(style) {
        FontFace::Standard(metrics) => doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => metrics.family.base_font(style),
            "Encoding" => "WinAnsiEncoding",
        }),
        #[cfg(feature = "ttf-parser")]
        FontFace::Embedded(metrics) => {
            embed_truetype(doc, metrics, &used_chars(pages, style))
        }
    }
}

/// Embed a TrueType face as a Type0 font with Identity-H encoding.
///
/// Content streams carry glyph IDs, so the CID-to-GID map is the identity
/// and the ToUnicode CMap only needs the characters actually drawn.
#[cfg(feature = "ttf-parser")]
fn embed_truetype(
    doc: &mut Document,
    metrics: &crate::font::TtfFontMetrics,
    used: &BTreeSet<char>,
) -> ObjectId {
    use std::collections::BTreeMap;

    let ps_name = metrics.postscript_name().to_string();
    let data = metrics.font_data();

    let mut glyphs: BTreeMap<u16, (char, f32)> = BTreeMap::new();
    for &ch in used {
        if let Some((gid, advance)) = metrics.glyph(ch) {
            glyphs.entry(gid).or_insert((ch, advance));
        }
    }

    let (bbox, ascent, descent, cap_height) = match metrics.face() {
        Some(face) => {
            let units = metrics.units_per_em();
            let scale = |v: i16| (v as f32 / units * 1000.0).round() as i64;
            let bb = face.global_bounding_box();
            (
                vec![
                    scale(bb.x_min).into(),
                    scale(bb.y_min).into(),
                    scale(bb.x_max).into(),
                    scale(bb.y_max).into(),
                ],
                scale(face.ascender()),
                scale(face.descender()),
                face.capital_height().map(scale).unwrap_or(700),
            )
        }
        None => (
            vec![0.into(), (-200).into(), 1000.into(), 900.into()],
            800,
            -200,
            700,
        ),
    };

    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => data.len() as i64 },
        data.to_vec(),
    ));

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => ps_name.as_str(),
        "Flags" => 32,
        "FontBBox" => bbox,
        "ItalicAngle" => 0,
        "Ascent" => ascent,
        "Descent" => descent,
        "CapHeight" => cap_height,
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    let mut widths: Vec<Object> = Vec::with_capacity(glyphs.len() * 2);
    for (&gid, &(_, advance)) in &glyphs {
        widths.push((gid as i64).into());
        widths.push(vec![Object::Real(advance.round())].into());
    }

    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => ps_name.as_str(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let cmap = to_unicode_cmap(glyphs.iter().map(|(&gid, &(ch, _))| (gid, ch)));
    let to_unicode_id = doc.add_object(Stream::new(Dictionary::new(), cmap.into_bytes()));

    trace!("Embedded {} with {} glyphs", ps_name, glyphs.len());
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => ps_name.as_str(),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![cid_font_id.into()],
        "ToUnicode" => to_unicode_id,
    })
}

/// ToUnicode CMap mapping 2-byte glyph codes to their characters
#[cfg(feature = "ttf-parser")]
fn to_unicode_cmap(pairs: impl Iterator<Item = (u16, char)>) -> String {
    let pairs: Vec<(u16, char)> = pairs.collect();
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    // At most 100 entries per bfchar block
    for chunk in pairs.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for &(gid, ch) in chunk {
            let mut units = [0u16; 2];
            let utf16: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            cmap.push_str(&format!("<{gid:04X}> <{utf16}>\n"));
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}
