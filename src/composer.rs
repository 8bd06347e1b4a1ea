//! Sequences the content blocks of an act onto pages

use crate::Result;
use crate::canvas::PageCanvas;
use crate::constants::{A4_HEIGHT, A4_WIDTH, DEFAULT_MARGIN, mm};
use crate::font::{FontSet, StandardFamily};
use crate::logo::load_logo;
use crate::model::{DocumentRecord, Item, Party};
use crate::pagination::{Paginator, RenderState};
use crate::style::{Alignment, Color, FontStyle, Palette};
use crate::table::{Table, TableStyle};
use crate::text::{TextOptions, shape_lines};
use crate::writer::{DocumentInfo, write_pdf};
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Footer and signature timestamp format (`16.10.2026. 14:03:05`)
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y. %H:%M:%S";

/// Label of the running header on continuation pages
pub const RUNNING_HEADER_LABEL: &str = "Pieņemšanas-nodošanas akts";

/// Legal text inside the electronic signature banner
pub const ELECTRONIC_SIGNATURE_NOTICE: &str =
    "ŠIS DOKUMENTS IR PARAKSTĪTS AR DROŠU ELEKTRONISKO PARAKSTU UN SATUR LAIKA ZĪMOGU";

/// The fixed closing clauses of every act
pub const CLOSING_CLAUSES: [&str; 5] = [
    "5.1. Puses apliecina, ka mantas stāvoklis ir pārbaudīts un atbilst šajā aktā norādītajam aprakstam.",
    "5.2. Pretenzijas pret nodoto mantu uz akta parakstīšanas brīdi pusēm nav.",
    "5.3. No šī akta parakstīšanas brīža visa atbildība par nodoto mantu pāriet no nododēja uz pieņēmēju.",
    "5.4. Akts sastādīts 2 eksemplāros, pa vienam katrai pusei.",
    "5.5. Akts stājas spēkā ar abu pušu parakstīšanas brīdi.",
];

const PARTY_HEADERS: [&str; 2] = ["NODODĒJS", "PIEŅĒMĒJS"];

const ITEM_HEADERS: [&str; 6] = [
    "Nr.",
    "Nosaukums",
    "Ražotājs/Modelis",
    "Sērijas Nr.",
    "Daudzums",
    "Stāvoklis",
];

/// Named rendering presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum RenderProfile {
    /// Corporate palette, roomy tables, Helvetica
    #[default]
    Advanced,
    /// Compact palette, tight tables, Courier
    Fast,
    /// Compact palette, tight tables, Helvetica
    Optimized,
}

/// Everything that varies between renders apart from the record itself
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub palette: Palette,
    /// Padding of the party summary table; the items table uses 1 mm less
    pub cell_padding: f32,
    pub fonts: FontSet,
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    /// Fixed generation time; the local clock is read when unset
    pub generated_at: Option<NaiveDateTime>,
}

impl RenderConfig {
    pub fn from_profile(profile: RenderProfile) -> Self {
        let (palette, cell_padding, family) = match profile {
            RenderProfile::Advanced => (Palette::corporate(), mm(3.0), StandardFamily::Helvetica),
            RenderProfile::Fast => (Palette::compact(), mm(2.0), StandardFamily::Courier),
            RenderProfile::Optimized => (Palette::compact(), mm(2.0), StandardFamily::Helvetica),
        };
        Self {
            palette,
            cell_padding,
            fonts: FontSet::standard(family),
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin: DEFAULT_MARGIN,
            generated_at: None,
        }
    }

    pub fn with_fonts(mut self, fonts: FontSet) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_generated_at(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = Some(at);
        self
    }

    fn item_cell_padding(&self) -> f32 {
        (self.cell_padding - mm(1.0)).max(mm(1.0))
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from_profile(RenderProfile::default())
    }
}

/// Result of one render: the laid-out pages and the serialized PDF
#[derive(Debug, Clone)]
pub struct RenderedAct {
    pages: Vec<PageCanvas>,
    bytes: Vec<u8>,
    generated_at: NaiveDateTime,
    missing_glyphs: BTreeSet<char>,
}

impl RenderedAct {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[PageCanvas] {
        &self.pages
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn generated_at(&self) -> NaiveDateTime {
        self.generated_at
    }

    /// Characters the fonts could not draw; they appear as `?`
    pub fn missing_glyphs(&self) -> &BTreeSet<char> {
        &self.missing_glyphs
    }

    /// Whether any page shows text containing `needle`
    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages.iter().any(|page| page.contains_text(needle))
    }

    /// Every placed text run, page by page
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|page| page.texts())
            .map(|t| t.text.as_str())
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), &self.bytes)?;
        info!("Saved act to {}", path.as_ref().display());
        Ok(())
    }
}

/// Lays out a [`DocumentRecord`] and serializes it
#[derive(Debug, Clone, Default)]
pub struct Composer {
    config: RenderConfig,
}

impl Composer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn from_profile(profile: RenderProfile) -> Self {
        Self::new(RenderConfig::from_profile(profile))
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render the whole act: title page, body, footers, PDF bytes.
    ///
    /// The record is rendered as it is; callers that need a valid act run
    /// [`DocumentRecord::validate`] first. Any error aborts the render.
    #[instrument(skip_all, fields(act = %record.act_number, items = record.items.len()))]
    pub fn render(&self, record: &DocumentRecord) -> Result<RenderedAct> {
        let config = &self.config;
        let generated_at = config
            .generated_at
            .unwrap_or_else(|| Local::now().naive_local());
        let stamp = generated_at.format(TIMESTAMP_FORMAT).to_string();
        let logo = load_logo(record.company_logo.as_deref());

        let state = RenderState::new(
            config.page_width,
            config.page_height,
            config.margin,
            config.palette.clone(),
        );
        let mut pages = Paginator::new(&config.fonts, state)
            .with_running_header(RUNNING_HEADER_LABEL)
            .with_logo(logo.as_ref());

        self.title_page(&mut pages, record)?;
        pages.new_page();
        self.body(&mut pages, record, &stamp)?;

        let pages = pages.finish(&stamp);
        let missing_glyphs = config.fonts.missing_glyphs(
            pages
                .iter()
                .flat_map(|page| page.texts())
                .map(|t| (t.text.as_str(), t.style)),
        );
        if !missing_glyphs.is_empty() {
            warn!(
                "Font has no glyphs for {:?}; drawn as '?'",
                missing_glyphs.iter().collect::<String>()
            );
        }
        let info = DocumentInfo {
            title: &record.title,
            created: generated_at,
            page_width: config.page_width,
            page_height: config.page_height,
        };
        let bytes = write_pdf(&pages, &config.fonts, logo.as_ref(), &info)?;
        debug!("Rendered {} pages", pages.len());

        Ok(RenderedAct {
            pages,
            bytes,
            generated_at,
            missing_glyphs,
        })
    }

    fn title_page(&self, p: &mut Paginator<'_>, record: &DocumentRecord) -> Result<()> {
        let palette = p.palette().clone();
        let margin = self.config.margin;
        let page_height = self.config.page_height;

        if let Some(height) = p.place_logo(margin, p.cursor()) {
            p.advance(height + mm(10.0));
        }
        p.rule(palette.primary, mm(3.0));

        p.set_cursor(page_height / 3.0);
        p.add_text(
            &record.title.to_uppercase(),
            &TextOptions::new(28.0).bold().centered().with_color(palette.primary),
        );
        p.advance(mm(5.0));

        if !record.act_number.is_empty() {
            p.add_text(
                &format!("Nr. {}", record.act_number),
                &TextOptions::new(18.0).bold().centered().with_color(palette.secondary),
            );
        }
        p.advance(mm(10.0));

        p.add_text(
            &record.date_and_location(),
            &TextOptions::new(14.0).centered().with_color(palette.text),
        );
        p.advance(mm(20.0));

        let registration = |party: &Party| {
            if party.registration_number.is_empty() {
                String::new()
            } else {
                format!("Reģ. Nr.: {}", party.registration_number)
            }
        };
        let summary = Table::new(PARTY_HEADERS)
            .with_style(TableStyle::from_palette(&palette))
            .with_font_size(12.0)
            .with_cell_padding(self.config.cell_padding)
            .add_row([
                record.handover_party.name.as_str(),
                record.receiving_party.name.as_str(),
            ])
            .add_row([
                registration(&record.handover_party),
                registration(&record.receiving_party),
            ]);
        p.add_table(&summary)?;
        p.advance(mm(10.0));

        if !record.contract_reference.is_empty() {
            p.add_text(
                "PAMATOJUMS:",
                &TextOptions::new(14.0).bold().with_color(palette.primary),
            );
            p.advance(mm(3.0));
            p.add_text(
                &record.contract_reference,
                &TextOptions::new(12.0).with_max_width(p.state().content_width() - mm(20.0)),
            );
        }

        let closing = (page_height - mm(60.0)).max(p.cursor() + mm(5.0));
        p.set_cursor(closing);
        p.rule(palette.secondary, mm(1.0));
        Ok(())
    }

    fn body(&self, p: &mut Paginator<'_>, record: &DocumentRecord, stamp: &str) -> Result<()> {
        let palette = p.palette().clone();

        p.add_text(
            &record.title.to_uppercase(),
            &TextOptions::new(20.0).bold().centered().with_color(palette.primary),
        );
        if !record.act_number.is_empty() {
            p.add_text(
                &format!("Nr. {}", record.act_number),
                &TextOptions::new(14.0).bold().centered().with_color(palette.secondary),
            );
        }
        p.add_text(&record.date_and_location(), &TextOptions::new(12.0).centered());
        p.advance(mm(10.0));
        p.rule(palette.primary, mm(1.0));
        p.advance(mm(15.0));

        // 1. Parties
        section_heading(p, "1. LĪGUMSLĒDZĒJAS PUSES");
        p.advance(mm(5.0));
        party_details(p, "1.1. NODODĒJS:", &record.handover_party);
        p.advance(mm(8.0));
        party_details(p, "1.2. PIEŅĒMĒJS:", &record.receiving_party);
        p.advance(mm(15.0));

        // 2. Contract reference
        if !record.contract_reference.is_empty() {
            section_heading(p, "2. PAMATOJUMS");
            p.advance(mm(5.0));
            p.add_text(&record.contract_reference, &TextOptions::default());
            p.advance(mm(15.0));
        }

        // 3. Items
        section_heading(p, "3. NODODAMĀS/PIEŅEMAMĀS LIETAS");
        p.advance(mm(10.0));
        if !record.items.is_empty() {
            let mut items = Table::new(ITEM_HEADERS)
                .with_style(TableStyle::from_palette(&palette))
                .with_font_size(9.0)
                .with_cell_padding(self.config.item_cell_padding());
            for (i, item) in record.items.iter().enumerate() {
                items = items.add_row(item_row(i, item));
            }
            p.add_table(&items)?;
            p.advance(mm(10.0));

            for (i, item) in record.items.iter().enumerate() {
                item_details(p, i, item);
            }
        }

        // 4. Additional clauses
        let clauses = [
            ("4.1. Garantijas noteikumi:", &record.warranty),
            ("4.2. Piederīgie dokumenti:", &record.documents),
            ("4.3. Īpašie nosacījumi:", &record.special_conditions),
            ("4.4. Atbildības sadalījums:", &record.responsibility),
        ];
        if clauses.iter().any(|(_, text)| !text.is_empty()) {
            p.ensure_space(mm(40.0));
            section_heading(p, "4. PAPILDU NOTEIKUMI UN INFORMĀCIJA");
            p.advance(mm(5.0));
            for (heading, text) in clauses {
                if text.is_empty() {
                    continue;
                }
                p.add_text(heading, &TextOptions::new(12.0).bold());
                p.add_text(text, &TextOptions::default());
                p.advance(mm(5.0));
            }
        }

        // 5. Closing clauses
        p.ensure_space(mm(60.0));
        p.advance(mm(10.0));
        p.rule(palette.primary, mm(1.0));
        p.advance(mm(10.0));
        section_heading(p, "5. NOSLĒGUMA NOTEIKUMI");
        p.advance(mm(5.0));
        for clause in CLOSING_CLAUSES {
            p.add_text(clause, &TextOptions::default());
            p.advance(mm(2.0));
        }
        p.advance(mm(15.0));

        // Signatures
        p.ensure_space(mm(100.0));
        p.rule(palette.primary, mm(1.0));
        p.advance(mm(15.0));
        if record.use_electronic_signature {
            electronic_signature(p, stamp);
        } else {
            physical_signatures(p, record);
        }

        p.advance(mm(10.0));
        p.add_text(
            &format!("Parakstīšanas datums: {}", record.date),
            &TextOptions::new(11.0).centered().with_color(palette.secondary),
        );
        Ok(())
    }
}

fn section_heading(p: &mut Paginator<'_>, text: &str) {
    let color = p.palette().primary;
    p.add_text(text, &TextOptions::new(16.0).bold().with_color(color));
}

fn party_details(p: &mut Paginator<'_>, heading: &str, party: &Party) {
    let color = p.palette().secondary;
    p.add_text(heading, &TextOptions::new(12.0).bold().with_color(color));

    let body = TextOptions::default();
    if !party.name.is_empty() {
        p.add_text(&format!("Nosaukums: {}", party.name), &body);
    }
    if !party.registration_number.is_empty() {
        p.add_text(
            &format!("Reģistrācijas numurs: {}", party.registration_number),
            &body,
        );
    }
    if !party.address.is_empty() {
        p.add_text(&format!("Juridiskā adrese: {}", party.address), &body);
    }
    let rep = &party.representative;
    let who: Vec<&str> = [rep.name.as_str(), rep.position.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !who.is_empty() {
        p.add_text(&format!("Pārstāvis: {}", who.join(", ")), &body);
    }
}

fn item_row(index: usize, item: &Item) -> [String; 6] {
    [
        (index + 1).to_string(),
        item.name.clone(),
        item.make_and_model(),
        item.serial_number.clone(),
        format!("{} gab.", item.quantity),
        item.condition.clone(),
    ]
}

fn item_details(p: &mut Paginator<'_>, index: usize, item: &Item) {
    let palette = p.palette().clone();
    p.ensure_space(mm(30.0));
    p.add_text(
        &format!("3.{}. {}", index + 1, item.name),
        &TextOptions::new(12.0).bold().with_color(palette.primary),
    );
    if !item.components.is_empty() {
        p.add_text(
            &format!("Komplektācija: {}", item.components),
            &TextOptions::new(10.0),
        );
    }
    if !item.defects.is_empty() {
        p.add_text(
            &format!("Defekti un bojājumi: {}", item.defects),
            &TextOptions::new(10.0).with_color(palette.danger),
        );
    }
    if !item.notes.is_empty() {
        p.add_text(&format!("Piezīmes: {}", item.notes), &TextOptions::new(10.0));
    }
    p.advance(mm(5.0));
}

fn electronic_signature(p: &mut Paginator<'_>, stamp: &str) {
    let palette = p.palette().clone();
    let fonts = p.fonts();
    let margin = p.state().margin;
    let width = p.state().content_width() - mm(20.0);
    let height = mm(30.0);
    let x = margin + mm(10.0);
    let top = p.cursor();

    p.rounded_rect(x, top, width, height, mm(3.0), palette.primary);

    let lines = shape_lines(
        ELECTRONIC_SIGNATURE_NOTICE,
        x + mm(5.0),
        width - mm(10.0),
        11.0,
        Alignment::Center,
        fonts.metrics(FontStyle::Bold),
    );
    let mut baseline = top + mm(12.0);
    for line in lines {
        p.text_at(&line.text, line.x, baseline, 11.0, FontStyle::Bold, Color::white());
        baseline += mm(6.0);
    }

    p.advance(height + mm(15.0));
    p.add_text(
        &format!("Elektroniskā paraksta laika zīmogs: {stamp}"),
        &TextOptions::new(10.0).centered().with_color(palette.secondary),
    );
}

fn physical_signatures(p: &mut Paginator<'_>, record: &DocumentRecord) {
    let palette = p.palette().clone();
    let margin = p.state().margin;
    let page_width = p.state().page_width;
    let column = p.state().content_width() / 2.0;

    p.add_text(
        "PARAKSTI:",
        &TextOptions::new(14.0).bold().with_color(palette.primary),
    );
    p.advance(mm(15.0));

    let line_y = p.cursor() + mm(20.0);
    let left = margin + mm(20.0);
    let right = page_width / 2.0 + mm(20.0);
    p.line(left, line_y, margin + column - mm(20.0), line_y, palette.text, mm(0.5));
    p.line(right, line_y, page_width - margin - mm(20.0), line_y, palette.text, mm(0.5));

    let name_y = line_y + mm(10.0);
    for (x, party) in [(left, &record.handover_party), (right, &record.receiving_party)] {
        let rep = &party.representative;
        if !rep.name.is_empty() {
            p.text_at(&rep.name, x, name_y, 10.0, FontStyle::Normal, palette.text);
        }
        if !rep.position.is_empty() {
            p.text_at(&rep.position, x, name_y + mm(5.0), 10.0, FontStyle::Normal, palette.text);
        }
    }
    p.set_cursor(name_y + mm(20.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(14, 3, 5)
            .unwrap()
    }

    fn record() -> DocumentRecord {
        let mut record = DocumentRecord::default();
        record.date = "2025-05-20".into();
        record.act_number = "AKT-2025-0520-140305-007".into();
        record.handover_party = Party {
            name: "SIA Alfa".into(),
            registration_number: "40003000001".into(),
            address: "Brīvības iela 1, Rīga".into(),
            representative: crate::model::Representative {
                name: "Jānis Bērziņš".into(),
                position: "valdes loceklis".into(),
            },
        };
        record.items[0].name = "Portatīvais dators".into();
        record
    }

    fn composer(profile: RenderProfile) -> Composer {
        Composer::new(RenderConfig::from_profile(profile).with_generated_at(fixed_time()))
    }

    #[test]
    fn test_unencodable_name_is_reported() {
        let act = composer(RenderProfile::Advanced).render(&record()).unwrap();
        assert!(act.missing_glyphs().is_empty());

        let mut record = record();
        record.receiving_party.name = "Иван Петров".into();
        let act = composer(RenderProfile::Advanced).render(&record).unwrap();
        assert!(act.contains_text("Иван Петров"));
        assert_eq!(act.missing_glyphs().iter().collect::<String>(), "ИПавенорт");
    }

    #[test]
    fn test_profiles_map_to_config() {
        let advanced = RenderConfig::from_profile(RenderProfile::Advanced);
        let fast = RenderConfig::from_profile(RenderProfile::Fast);
        assert_eq!(advanced.palette, Palette::corporate());
        assert_eq!(fast.palette, Palette::compact());
        assert!(advanced.cell_padding > fast.cell_padding);
        assert!((advanced.item_cell_padding() - mm(2.0)).abs() < 1e-4);
    }

    #[test]
    fn test_render_sections() {
        let act = composer(RenderProfile::Advanced).render(&record()).unwrap();
        assert!(act.page_count() >= 2);
        for needle in [
            "PIEŅEMŠANAS-NODOŠANAS AKTS",
            "Nr. AKT-2025-0520-140305-007",
            "1. LĪGUMSLĒDZĒJAS PUSES",
            "Nosaukums: SIA Alfa",
            "Pārstāvis: Jānis Bērziņš, valdes loceklis",
            "3. NODODAMĀS/PIEŅEMAMĀS LIETAS",
            "3.1. Portatīvais dators",
            "1 gab.",
            "5. NOSLĒGUMA NOTEIKUMI",
            CLOSING_CLAUSES[4],
            "Parakstīšanas datums: 2025-05-20",
            "Ģenerēts: 20.05.2025. 14:03:05",
        ] {
            assert!(act.contains_text(needle), "missing {needle:?}");
        }
        assert!(!act.contains_text("4. PAPILDU NOTEIKUMI"));
        assert!(!act.contains_text("2. PAMATOJUMS"));
    }

    #[test]
    fn test_title_page_has_no_running_header() {
        let act = composer(RenderProfile::Advanced).render(&record()).unwrap();
        assert!(!act.pages()[0].contains_text(RUNNING_HEADER_LABEL));
        assert!(act.pages()[1].contains_text(RUNNING_HEADER_LABEL));
        assert!(act.pages()[0].contains_text("NODODĒJS"));
    }

    #[test]
    fn test_optional_clauses() {
        let mut record = record();
        record.contract_reference = "Līgums Nr. 12/2025".into();
        record.documents = "Garantijas talons".into();
        let act = composer(RenderProfile::Optimized).render(&record).unwrap();
        assert!(act.contains_text("PAMATOJUMS:"));
        assert!(act.contains_text("2. PAMATOJUMS"));
        assert!(act.contains_text("4.2. Piederīgie dokumenti:"));
        assert!(!act.contains_text("4.1. Garantijas noteikumi:"));
    }

    #[test]
    fn test_electronic_signature_timestamp() {
        let mut record = record();
        record.use_electronic_signature = true;
        let act = composer(RenderProfile::Fast).render(&record).unwrap();
        assert!(act.contains_text("Elektroniskā paraksta laika zīmogs: 20.05.2025. 14:03:05"));
        assert!(!act.contains_text("PARAKSTI:"));
    }

    #[test]
    fn test_physical_signature_names() {
        let act = composer(RenderProfile::Advanced).render(&record()).unwrap();
        assert!(act.contains_text("PARAKSTI:"));
        assert!(act.texts().any(|t| t == "valdes loceklis"));
        assert!(!act.texts().any(|t| t.contains("ELEKTRONISKO")));
    }
}
