//! Local key-value persistence for saved parties and mail settings

use crate::Result;
use crate::error::ActError;
use crate::model::{DocumentRecord, Party, PartyRole, SavedParty};
use crate::settings::EmailSettings;
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Key holding the JSON array of saved parties
pub const SAVED_PARTIES_KEY: &str = "savedParties";

/// Key holding the mail settings JSON
pub const EMAIL_SETTINGS_KEY: &str = "emailSettings";

/// String values stored under string keys
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process store, mostly for tests and previews
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Opened file store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ActError::Validation(format!("Invalid store key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path(key)?, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Saved parties, loaded once and written back on every change
#[derive(Debug)]
pub struct PartyRepository<S: KeyValueStore> {
    store: S,
    parties: Vec<SavedParty>,
}

impl<S: KeyValueStore> PartyRepository<S> {
    /// Read the saved list; a missing key means an empty list
    pub fn load(store: S) -> Result<Self> {
        let parties = match store.get(SAVED_PARTIES_KEY)? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        Ok(Self { store, parties })
    }

    pub fn parties(&self) -> &[SavedParty] {
        &self.parties
    }

    pub fn get(&self, id: &str) -> Option<&SavedParty> {
        self.parties.iter().find(|p| p.id == id)
    }

    /// Keep a copy of `party` for reuse.
    ///
    /// A party without a name is not saved and `None` is returned.
    #[instrument(skip(self, party), fields(name = %party.name))]
    pub fn save(&mut self, party: &Party) -> Result<Option<SavedParty>> {
        if party.name.trim().is_empty() {
            debug!("Ignoring party without a name");
            return Ok(None);
        }
        let saved = SavedParty {
            id: uuid::Uuid::new_v4().to_string(),
            party: party.clone(),
            created_at: Utc::now(),
        };
        self.parties.push(saved.clone());
        self.persist()?;
        info!("Saved party {}", saved.id);
        Ok(Some(saved))
    }

    /// Remove a saved party; returns whether one was removed
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let before = self.parties.len();
        self.parties.retain(|p| p.id != id);
        if self.parties.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Copy a saved party into one side of `record`
    pub fn apply_to(&self, record: DocumentRecord, id: &str, role: PartyRole) -> Result<DocumentRecord> {
        let saved = self
            .get(id)
            .ok_or_else(|| ActError::Validation(format!("No saved party with id {id}")))?;
        let mut record = record;
        record.set_party(role, saved.party.clone());
        Ok(record)
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.parties)?;
        self.store.set(SAVED_PARTIES_KEY, &json)
    }
}

/// Mail settings stored as one JSON document
#[derive(Debug)]
pub struct SettingsRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SettingsRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stored settings, or the defaults when nothing was saved yet
    pub fn load(&self) -> Result<EmailSettings> {
        match self.store.get(EMAIL_SETTINGS_KEY)? {
            Some(json) => EmailSettings::import_json(&json),
            None => Ok(EmailSettings::default()),
        }
    }

    /// Validate and store the settings
    pub fn save(&mut self, settings: &EmailSettings) -> Result<()> {
        settings.validate()?;
        let json = settings.export_json()?;
        self.store.set(EMAIL_SETTINGS_KEY, &json)?;
        info!("Saved mail settings for {}", settings.smtp_host);
        Ok(())
    }

    /// Forget the stored settings
    pub fn reset(&mut self) -> Result<()> {
        self.store.remove(EMAIL_SETTINGS_KEY)
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
