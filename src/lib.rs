//! Paginated PDF renderer for handover/acceptance acts built on lopdf
//!
//! A [`DocumentRecord`] describes the two parties and the items changing
//! hands. [`Composer`] lays it out on A4 pages (title page, numbered
//! sections, signature block, running header and footers) and serializes
//! the result with lopdf. Around the renderer sit a local store for saved
//! parties and mail settings, a blocking client for the HTTP mail relay and
//! a [`PreviewSlot`] that keeps only the newest finished render.

use tracing::instrument;

pub mod canvas;
pub mod composer;
pub mod constants;
mod drawing;
pub mod error;
pub mod font;
pub mod layout;
pub mod logo;
pub mod mail;
pub mod model;
pub mod pagination;
pub mod preview;
pub mod settings;
pub mod store;
pub mod style;
pub mod table;
pub mod text;
pub mod writer;

pub use composer::{Composer, RenderConfig, RenderProfile, RenderedAct};
pub use error::{ActError, Result};
pub use font::{FontMetrics, FontSet, StandardFamily};
pub use mail::{MailRelay, MailRequest};
pub use model::{DocumentRecord, Item, Party, PartyRole, Representative, SavedParty};
pub use preview::{PreviewSlot, RenderTicket};
pub use settings::{EmailSettings, MailRelayConfig};
pub use store::{FileStore, KeyValueStore, MemoryStore, PartyRepository, SettingsRepository};
pub use style::{Alignment, Color, FontStyle, Palette};
pub use table::{Table, TableStyle};

/// Render `record` with the defaults of `profile`
#[instrument(skip(record))]
pub fn render_act(record: &DocumentRecord, profile: RenderProfile) -> Result<RenderedAct> {
    Composer::from_profile(profile).render(record)
}
