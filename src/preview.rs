//! Latest-render slot for live previews

use crate::Result;
use crate::composer::{Composer, RenderedAct};
use crate::model::DocumentRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Generation number handed out when a render starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderTicket(u64);

impl RenderTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Holds the most recent render that finished.
///
/// Renders may complete in any order; a result is only accepted when no
/// later generation has been published already.
#[derive(Debug, Default)]
pub struct PreviewSlot {
    issued: AtomicU64,
    displayed: Mutex<Option<(u64, Arc<RenderedAct>)>>,
}

impl PreviewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next generation number
    pub fn begin(&self) -> RenderTicket {
        RenderTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Offer a finished render; returns whether it is now displayed
    pub fn publish(&self, ticket: RenderTicket, act: RenderedAct) -> bool {
        let mut displayed = self.displayed.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((current, _)) = displayed.as_ref()
            && *current > ticket.0
        {
            debug!(
                "Discarding stale render {} (showing {})",
                ticket.0, current
            );
            return false;
        }
        *displayed = Some((ticket.0, Arc::new(act)));
        true
    }

    /// The render currently displayed
    pub fn current(&self) -> Option<Arc<RenderedAct>> {
        self.displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, act)| Arc::clone(act))
    }

    /// Generation of the displayed render, 0 when nothing is shown
    pub fn displayed_generation(&self) -> u64 {
        self.displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |(generation, _)| *generation)
    }

    /// Render `record` and publish the result.
    ///
    /// A failed render leaves the previous output in place.
    pub fn render_into(&self, composer: &Composer, record: &DocumentRecord) -> Result<bool> {
        let ticket = self.begin();
        match composer.render(record) {
            Ok(act) => Ok(self.publish(ticket, act)),
            Err(e) => {
                warn!("Preview render {} failed: {}", ticket.0, e);
                Err(e)
            }
        }
    }
}
