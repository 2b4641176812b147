//! Filter text, its parsed predicate, and the view it selects.

use serde::Serialize;
use sniffer_query::PredicateEngine;
use sniffer_types::{FieldValue, Schema};

use crate::store::RecordStore;
use crate::view::View;

/// Outcome of the last [`FilterController::set_filter_text`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FilterStatus {
    /// No filter text; every record is shown.
    Empty,
    /// The text parsed and type-checked.
    Valid,
    SyntaxError {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
    },
    TypeError {
        message: String,
    },
}

impl FilterStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::SyntaxError { .. } | Self::TypeError { .. })
    }
}

/// How far the cached view has scanned the store.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    generation: u64,
    scanned: usize,
}

/// Holds the filter text and derives the [`View`] from a [`RecordStore`].
///
/// The filter only changes when its text does. Recomputing with unchanged
/// text against an unchanged store generation scans only the records
/// appended since the previous pass.
pub struct FilterController<E: PredicateEngine> {
    engine: E,
    schema: Schema,
    text: String,
    status: FilterStatus,
    predicate: Option<E::Predicate>,
    view: View,
    cursor: Option<Cursor>,
}

impl<E: PredicateEngine> FilterController<E> {
    pub fn new(engine: E, schema: Schema) -> Self {
        Self {
            engine,
            schema,
            text: String::new(),
            status: FilterStatus::Empty,
            predicate: None,
            view: View::default(),
            cursor: None,
        }
    }

    /// Replaces the filter text and re-derives the status.
    ///
    /// Leading and trailing whitespace is ignored. The view is not touched
    /// until the next [`FilterController::recompute`].
    pub fn set_filter_text(&mut self, text: &str) -> &FilterStatus {
        let text = text.trim();
        self.text = text.to_string();
        self.cursor = None;
        self.predicate = None;

        self.status = if text.is_empty() {
            FilterStatus::Empty
        } else {
            match self.engine.parse(text) {
                Err(e) => FilterStatus::SyntaxError {
                    message: e.message,
                    position: e.position,
                },
                Ok(predicate) => match self.engine.check(&predicate, &self.schema) {
                    Err(e) => FilterStatus::TypeError { message: e.message },
                    Ok(()) => {
                        self.predicate = Some(predicate);
                        FilterStatus::Valid
                    }
                },
            }
        };

        tracing::debug!(filter = %self.text, status = ?self.status, "filter updated");
        &self.status
    }

    /// Sets the filter to the engine's equality text for `field == value`.
    pub fn build_quick_filter(&mut self, field: &str, value: &FieldValue<'_>) -> &FilterStatus {
        let text = self.engine.quick_filter(field, value);
        self.set_filter_text(&text)
    }

    /// Re-derives the view from `store`.
    pub fn recompute(&mut self, store: &RecordStore) {
        let resume = self
            .cursor
            .filter(|c| c.generation == store.generation() && c.scanned <= store.len());
        let start = match resume {
            Some(cursor) => cursor.scanned,
            None => {
                self.view.clear();
                0
            }
        };

        let tail = &store.snapshot()[start..];
        let mut excluded = 0usize;
        match (&self.status, &self.predicate) {
            (FilterStatus::Empty, _) => {
                for record in tail {
                    self.view.push(record.clone());
                }
            }
            (FilterStatus::Valid, Some(predicate)) => {
                for record in tail {
                    match self.engine.evaluate(predicate, record) {
                        Ok(true) => self.view.push(record.clone()),
                        Ok(false) => {}
                        Err(e) => {
                            excluded += 1;
                            tracing::trace!(id = record.message_id, error = %e, "record excluded");
                        }
                    }
                }
            }
            _ => self.view.clear(),
        }

        self.cursor = Some(Cursor {
            generation: store.generation(),
            scanned: store.len(),
        });
        tracing::debug!(
            scanned = tail.len(),
            resumed = resume.is_some(),
            excluded,
            visible = self.view.len(),
            "view recomputed"
        );
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> &FilterStatus {
        &self.status
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}
