//! Single-record selection over the current view.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sniffer_types::{Record, RecordId};

use crate::view::View;

/// Keyboard-style movement through the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Navigation {
    Previous,
    Next,
}

/// Tracks at most one selected record id.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selected: Option<RecordId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<RecordId> {
        self.selected
    }

    /// Selects `id` whether or not it is currently visible.
    pub fn select(&mut self, id: RecordId) {
        self.selected = Some(id);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Drops the selection when its record is not in `view`.
    ///
    /// Returns `true` when the selection was dropped. No neighbour is
    /// selected in its place.
    pub fn reconcile(&mut self, view: &View) -> bool {
        match self.selected {
            Some(id) if !view.contains(id) => {
                tracing::debug!(id, "selection left the view");
                self.selected = None;
                true
            }
            _ => false,
        }
    }

    /// Moves the selection one step through `view`, clamping at both ends.
    ///
    /// With no visible selection the first record is selected. Returns the
    /// newly selected record, or `None` when the view is empty.
    pub fn navigate<'v>(&mut self, direction: Navigation, view: &'v View) -> Option<&'v Arc<Record>> {
        let last = view.len().checked_sub(1)?;
        let index = match self.selected.and_then(|id| view.position(id)) {
            None => 0,
            Some(current) => match direction {
                Navigation::Previous => current.saturating_sub(1),
                Navigation::Next => (current + 1).min(last),
            },
        };

        let record = view.get(index)?;
        self.selected = Some(record.message_id);
        Some(record)
    }
}
