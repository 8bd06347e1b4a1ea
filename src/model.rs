//! The act record edited by the caller and read by the composer

use crate::Result;
use crate::error::ActError;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default document title
pub const DEFAULT_TITLE: &str = "Pieņemšanas–nodošanas akts";

/// Person signing on behalf of a party
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Representative {
    pub name: String,
    pub position: String,
}

/// One side of the handover
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Party {
    pub name: String,
    pub registration_number: String,
    pub address: String,
    pub representative: Representative,
}

impl Party {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A party kept for reuse across acts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedParty {
    pub id: String,
    #[serde(flatten)]
    pub party: Party,
    pub created_at: DateTime<Utc>,
}

/// Which side of the act a party stands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    Handover,
    Receiving,
}

/// A thing being handed over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub components: String,
    pub quantity: u32,
    pub condition: String,
    pub defects: String,
    pub notes: String,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Manufacturer and model joined for the items table
    pub fn make_and_model(&self) -> String {
        format!("{} {}", self.manufacturer, self.model)
            .trim()
            .to_string()
    }
}

impl Default for Item {
    fn default() -> Self {
        Self {
            name: String::new(),
            manufacturer: String::new(),
            model: String::new(),
            serial_number: String::new(),
            components: String::new(),
            quantity: 1,
            condition: String::new(),
            defects: String::new(),
            notes: String::new(),
        }
    }
}

/// The full handover/acceptance act
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentRecord {
    pub title: String,
    /// ISO `YYYY-MM-DD`
    pub date: String,
    pub location: String,
    pub act_number: String,
    /// Data URL or bare base64 image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
    pub handover_party: Party,
    pub receiving_party: Party,
    pub contract_reference: String,
    pub warranty: String,
    pub documents: String,
    pub special_conditions: String,
    pub responsibility: String,
    pub use_electronic_signature: bool,
    pub items: Vec<Item>,
}

impl Default for DocumentRecord {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            date: Local::now().date_naive().format("%Y-%m-%d").to_string(),
            location: String::new(),
            act_number: String::new(),
            company_logo: None,
            handover_party: Party::default(),
            receiving_party: Party::default(),
            contract_reference: String::new(),
            warranty: String::new(),
            documents: String::new(),
            special_conditions: String::new(),
            responsibility: String::new(),
            use_electronic_signature: false,
            items: vec![Item::default()],
        }
    }
}

/// Field update on a [`Party`]
#[derive(Debug, Clone, PartialEq)]
pub enum PartyEdit {
    Name(String),
    RegistrationNumber(String),
    Address(String),
    RepresentativeName(String),
    RepresentativePosition(String),
}

impl PartyEdit {
    pub fn apply(self, mut party: Party) -> Party {
        match self {
            PartyEdit::Name(v) => party.name = v,
            PartyEdit::RegistrationNumber(v) => party.registration_number = v,
            PartyEdit::Address(v) => party.address = v,
            PartyEdit::RepresentativeName(v) => party.representative.name = v,
            PartyEdit::RepresentativePosition(v) => party.representative.position = v,
        }
        party
    }
}

/// Field update on an [`Item`]
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEdit {
    Name(String),
    Manufacturer(String),
    Model(String),
    SerialNumber(String),
    Components(String),
    Quantity(u32),
    Condition(String),
    Defects(String),
    Notes(String),
}

impl ItemEdit {
    pub fn apply(self, mut item: Item) -> Result<Item> {
        match self {
            ItemEdit::Name(v) => item.name = v,
            ItemEdit::Manufacturer(v) => item.manufacturer = v,
            ItemEdit::Model(v) => item.model = v,
            ItemEdit::SerialNumber(v) => item.serial_number = v,
            ItemEdit::Components(v) => item.components = v,
            ItemEdit::Quantity(0) => {
                return Err(ActError::Validation(
                    "Item quantity must be at least 1".to_string(),
                ));
            }
            ItemEdit::Quantity(v) => item.quantity = v,
            ItemEdit::Condition(v) => item.condition = v,
            ItemEdit::Defects(v) => item.defects = v,
            ItemEdit::Notes(v) => item.notes = v,
        }
        Ok(item)
    }
}

/// Update on a [`DocumentRecord`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEdit {
    Title(String),
    Date(String),
    Location(String),
    ActNumber(String),
    CompanyLogo(Option<String>),
    ContractReference(String),
    Warranty(String),
    Documents(String),
    SpecialConditions(String),
    Responsibility(String),
    ElectronicSignature(bool),
    Party(PartyRole, PartyEdit),
    SetParty(PartyRole, Party),
    Item(usize, ItemEdit),
    AddItem,
    RemoveItem(usize),
}

impl DocumentRecord {
    /// Apply one edit and return the updated record
    pub fn apply(mut self, edit: RecordEdit) -> Result<Self> {
        match edit {
            RecordEdit::Title(v) => self.title = v,
            RecordEdit::Date(v) => self.date = v,
            RecordEdit::Location(v) => self.location = v,
            RecordEdit::ActNumber(v) => self.act_number = v,
            RecordEdit::CompanyLogo(v) => self.company_logo = v,
            RecordEdit::ContractReference(v) => self.contract_reference = v,
            RecordEdit::Warranty(v) => self.warranty = v,
            RecordEdit::Documents(v) => self.documents = v,
            RecordEdit::SpecialConditions(v) => self.special_conditions = v,
            RecordEdit::Responsibility(v) => self.responsibility = v,
            RecordEdit::ElectronicSignature(v) => self.use_electronic_signature = v,
            RecordEdit::Party(role, edit) => {
                let party = std::mem::take(self.party_mut(role));
                *self.party_mut(role) = edit.apply(party);
            }
            RecordEdit::SetParty(role, party) => self.set_party(role, party),
            RecordEdit::Item(index, edit) => {
                let count = self.items.len();
                let slot = self.items.get_mut(index).ok_or_else(|| {
                    ActError::Validation(format!("No item {index}, the act has {count}"))
                })?;
                *slot = edit.apply(std::mem::take(slot))?;
            }
            RecordEdit::AddItem => self.add_item(),
            RecordEdit::RemoveItem(index) => self.remove_item(index)?,
        }
        Ok(self)
    }

    pub fn party(&self, role: PartyRole) -> &Party {
        match role {
            PartyRole::Handover => &self.handover_party,
            PartyRole::Receiving => &self.receiving_party,
        }
    }

    fn party_mut(&mut self, role: PartyRole) -> &mut Party {
        match role {
            PartyRole::Handover => &mut self.handover_party,
            PartyRole::Receiving => &mut self.receiving_party,
        }
    }

    pub fn set_party(&mut self, role: PartyRole, party: Party) {
        *self.party_mut(role) = party;
    }

    /// Append a blank item with quantity 1
    pub fn add_item(&mut self) {
        self.items.push(Item::default());
    }

    /// Remove the item at `index`; the last remaining item cannot be removed
    pub fn remove_item(&mut self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(ActError::Validation(format!(
                "No item {index}, the act has {}",
                self.items.len()
            )));
        }
        if self.items.len() == 1 {
            return Err(ActError::Validation(
                "An act must keep at least one item".to_string(),
            ));
        }
        self.items.remove(index);
        debug!("Removed item {}, {} left", index, self.items.len());
        Ok(())
    }

    /// Check the invariants a finished act must hold
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(ActError::Validation(
                "An act must list at least one item".to_string(),
            ));
        }
        if let Some(pos) = self.items.iter().position(|item| item.quantity == 0) {
            return Err(ActError::Validation(format!(
                "Item {} has quantity 0",
                pos + 1
            )));
        }
        Ok(())
    }

    /// `date` followed by `, location` when a location is set
    pub fn date_and_location(&self) -> String {
        if self.location.is_empty() {
            self.date.clone()
        } else {
            format!("{}, {}", self.date, self.location)
        }
    }

    /// File name used for downloads and mail attachments
    pub fn attachment_filename(&self) -> String {
        attachment_filename(&self.act_number)
    }
}

/// `Pienemšanas-nodošanas-akts-<number>.pdf`, with a fallback for unnumbered acts
pub fn attachment_filename(act_number: &str) -> String {
    let number = if act_number.trim().is_empty() {
        "bez-numura"
    } else {
        act_number.trim()
    };
    format!("Pienemšanas-nodošanas-akts-{number}.pdf")
}

/// Act number of the form `AKT-YYYY-MMDD-HHMMSS-rrr`
pub fn generate_act_number(now: NaiveDateTime, suffix: u16) -> String {
    format!("AKT-{}-{:03}", now.format("%Y-%m%d-%H%M%S"), suffix % 1000)
}

/// A fresh act number from the local clock and a random suffix
pub fn new_act_number() -> String {
    let suffix = rand::rng().random_range(0..1000);
    generate_act_number(Local::now().naive_local(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_record() {
        let record = DocumentRecord::default();
        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].quantity, 1);
        assert!(!record.use_electronic_signature);
        assert_eq!(record.date.len(), 10);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_remove_last_item_refused() {
        let mut record = DocumentRecord::default();
        assert!(matches!(record.remove_item(0), Err(ActError::Validation(_))));
        record.add_item();
        record.remove_item(0).unwrap();
        assert_eq!(record.items.len(), 1);
        assert!(record.remove_item(5).is_err());
    }

    #[test]
    fn test_typed_edits() {
        let record = DocumentRecord::default()
            .apply(RecordEdit::ActNumber("AKT-1".into()))
            .unwrap()
            .apply(RecordEdit::Party(
                PartyRole::Handover,
                PartyEdit::RepresentativeName("Jānis Bērziņš".into()),
            ))
            .unwrap()
            .apply(RecordEdit::Item(0, ItemEdit::Name("Dators".into())))
            .unwrap()
            .apply(RecordEdit::AddItem)
            .unwrap();

        assert_eq!(record.act_number, "AKT-1");
        assert_eq!(record.handover_party.representative.name, "Jānis Bērziņš");
        assert_eq!(record.receiving_party, Party::default());
        assert_eq!(record.items[0].name, "Dators");
        assert_eq!(record.items.len(), 2);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let record = DocumentRecord::default();
        assert!(record
            .clone()
            .apply(RecordEdit::Item(0, ItemEdit::Quantity(0)))
            .is_err());
        assert!(record.apply(RecordEdit::Item(3, ItemEdit::Quantity(2))).is_err());

        let mut bad = DocumentRecord::default();
        bad.items[0].quantity = 0;
        assert!(bad.validate().is_err());
        bad.items.clear();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_camel_case_json() {
        let json = r#"{
            "title": "Akts",
            "actNumber": "AKT-7",
            "handoverParty": {"name": "SIA Alfa", "registrationNumber": "4000",
                "representative": {"name": "Anna", "position": "valdes locekle"}},
            "useElectronicSignature": true,
            "items": [{"name": "Printeris", "serialNumber": "X1", "quantity": 2}]
        }"#;
        let record: DocumentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.act_number, "AKT-7");
        assert_eq!(record.handover_party.registration_number, "4000");
        assert!(record.use_electronic_signature);
        assert_eq!(record.items[0].serial_number, "X1");
        assert_eq!(record.items[0].quantity, 2);
        assert_eq!(record.company_logo, None);

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["receivingParty"]["registrationNumber"], "");
    }

    #[test]
    fn test_saved_party_flattens() {
        let saved = SavedParty {
            id: "1".into(),
            party: Party::new("SIA Beta"),
            created_at: DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["name"], "SIA Beta");
        assert_eq!(value["createdAt"], "2025-01-02T03:04:05Z");
    }

    #[test]
    fn test_act_number_format() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap();
        assert_eq!(generate_act_number(now, 42), "AKT-2025-0307-090501-042");
        assert!(new_act_number().starts_with("AKT-"));
    }

    #[test]
    fn test_attachment_filename() {
        assert_eq!(
            attachment_filename("AKT-1"),
            "Pienemšanas-nodošanas-akts-AKT-1.pdf"
        );
        assert_eq!(
            attachment_filename(""),
            "Pienemšanas-nodošanas-akts-bez-numura.pdf"
        );
    }

    #[test]
    fn test_date_and_location() {
        let mut record = DocumentRecord::default();
        record.date = "2025-01-01".into();
        assert_eq!(record.date_and_location(), "2025-01-01");
        record.location = "Rīga".into();
        assert_eq!(record.date_and_location(), "2025-01-01, Rīga");
    }
}
