use chrono::{NaiveDate, NaiveDateTime};
use handover_act::{
    ActError, Composer, DocumentRecord, Item, MemoryStore, Party, PartyRepository, RenderConfig,
    RenderProfile, model::RecordEdit,
};
use pretty_assertions::assert_eq;

fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, 20)
        .unwrap()
        .and_hms_opt(14, 3, 5)
        .unwrap()
}

fn composer(profile: RenderProfile) -> Composer {
    Composer::new(RenderConfig::from_profile(profile).with_generated_at(fixed_time()))
}

fn record() -> DocumentRecord {
    let mut record = DocumentRecord::default();
    record.date = "2025-05-20".into();
    record.location = "Rīga".into();
    record.act_number = "AKT-2025-0520-140305-042".into();
    record.handover_party = Party::new("SIA Alfa");
    record.receiving_party = Party::new("SIA Beta");
    record.items = vec![Item::new("Portatīvais dators")];
    record
}

/// `(page, total)` parsed from every footer
fn footers(act: &handover_act::RenderedAct) -> Vec<(usize, usize)> {
    act.pages()
        .iter()
        .map(|page| {
            let label = page
                .texts()
                .iter()
                .find_map(|t| t.text.strip_prefix("Lapa "))
                .expect("page without footer");
            let (n, total) = label.split_once(" no ").unwrap();
            (n.parse().unwrap(), total.parse().unwrap())
        })
        .collect()
}

#[test]
fn footers_agree_on_page_count() {
    for profile in [RenderProfile::Advanced, RenderProfile::Fast, RenderProfile::Optimized] {
        let act = composer(profile).render(&record()).unwrap();
        assert!(act.page_count() >= 2);
        let footers = footers(&act);
        for (i, (n, total)) in footers.iter().enumerate() {
            assert_eq!(*n, i + 1);
            assert_eq!(*total, act.page_count());
        }
    }
}

#[test]
fn many_items_add_pages() {
    let mut record = record();
    record.items = (1..=40)
        .map(|i| Item {
            defects: format!("Skrāpējums uz vāka {i}"),
            ..Item::new(format!("Monitors {i}"))
        })
        .collect();
    let act = composer(RenderProfile::Advanced).render(&record).unwrap();
    let short = composer(RenderProfile::Advanced).render(&self::record()).unwrap();
    assert!(act.page_count() > short.page_count());
    assert!(act.contains_text("3.40. Monitors 40"));
    let is_item_cell = |text: &str| {
        text.strip_prefix("Monitors ")
            .is_some_and(|n| n.parse::<usize>().is_ok())
    };
    let table_pages: Vec<_> = act
        .pages()
        .iter()
        .filter(|p| p.texts().iter().any(|t| is_item_cell(&t.text)))
        .collect();
    assert!(table_pages.len() >= 2);
    for page in &table_pages {
        assert!(page.texts().iter().any(|t| t.text == "Ražotājs/Modelis"));
    }
    let rows: usize = table_pages
        .iter()
        .map(|p| p.texts().iter().filter(|t| is_item_cell(&t.text)).count())
        .sum();
    assert_eq!(rows, 40);
}

#[test]
fn fixed_timestamp_is_byte_identical() {
    let a = composer(RenderProfile::Advanced).render(&record()).unwrap();
    let b = composer(RenderProfile::Advanced).render(&record()).unwrap();
    assert_eq!(a.bytes(), b.bytes());
    assert!(a.contains_text("Ģenerēts: 20.05.2025. 14:03:05"));
}

#[test]
fn signature_branches_are_exclusive() {
    let physical = composer(RenderProfile::Advanced).render(&record()).unwrap();
    assert!(physical.contains_text("PARAKSTI:"));
    assert!(!physical.contains_text("Elektroniskā paraksta laika zīmogs"));

    let record = record()
        .apply(RecordEdit::ElectronicSignature(true))
        .unwrap();
    let electronic = composer(RenderProfile::Advanced).render(&record).unwrap();
    assert!(electronic.contains_text("Elektroniskā paraksta laika zīmogs: 20.05.2025. 14:03:05"));
    assert!(electronic.contains_text("DROŠU"));
    assert!(!electronic.contains_text("PARAKSTI:"));
}

#[test]
fn single_plain_item_has_one_entry() {
    let act = composer(RenderProfile::Advanced).render(&record()).unwrap();
    let entries: Vec<&str> = act.texts().filter(|t| t.starts_with("3.1.")).collect();
    assert_eq!(entries, vec!["3.1. Portatīvais dators"]);
    assert!(!act.texts().any(|t| t.starts_with("3.2.")));
    assert!(!act.contains_text("Defekti"));
    assert!(!act.contains_text("Piezīmes"));
}

#[test]
fn output_loads_with_lopdf() {
    let act = composer(RenderProfile::Fast).render(&record()).unwrap();
    let doc = lopdf::Document::load_mem(act.bytes()).unwrap();
    assert_eq!(doc.get_pages().len(), act.page_count());
}

#[test]
fn written_file_matches_bytes() {
    let act = composer(RenderProfile::Optimized).render(&record()).unwrap();
    let path = std::env::temp_dir().join(format!("{}-{}", uuid::Uuid::new_v4(), record().attachment_filename()));
    act.write_to(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), act.bytes());
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn empty_party_is_not_saved() {
    let mut repo = PartyRepository::load(MemoryStore::new()).unwrap();
    assert!(repo.save(&Party::default()).unwrap().is_none());
    assert!(repo.parties().is_empty());
}

#[test]
fn record_validation() {
    let mut record = record();
    assert!(record.remove_item(0).is_err());
    assert_eq!(record.items.len(), 1);

    record.items[0].quantity = 0;
    assert!(matches!(record.validate(), Err(ActError::Validation(_))));

    record.items.clear();
    assert!(matches!(record.validate(), Err(ActError::Validation(_))));
}
