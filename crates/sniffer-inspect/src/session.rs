//! One inspection session: store, filter, selection and refresh timer.

use std::sync::Arc;
use std::time::Duration;

use sniffer_query::PredicateEngine;
use sniffer_types::{FieldValue, Record, RecordId, Schema};
use tokio::time::Instant;

use crate::error::InspectError;
use crate::filter::{FilterController, FilterStatus};
use crate::scheduler::{UpdateScheduler, DEFAULT_REFRESH_DELAY};
use crate::selection::{Navigation, SelectionController};
use crate::store::RecordStore;
use crate::view::View;

/// What a renderer sees after each refresh cycle.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub view: &'a View,
    pub selected: Option<RecordId>,
    pub status: &'a FilterStatus,
    pub filter_text: &'a str,
    /// Records in the store, visible or not.
    pub total: usize,
    pub cycle: u64,
}

impl<'a> Frame<'a> {
    /// The selected record, when it is visible.
    pub fn selected_record(&self) -> Option<&'a Arc<Record>> {
        self.selected.and_then(|id| self.view.find(id))
    }
}

/// Receives a [`Frame`] at the end of every refresh cycle.
///
/// Implementations must not block: they run on the inspector's own task.
pub trait Render {
    fn render(&mut self, frame: Frame<'_>);
}

impl<F> Render for F
where
    F: FnMut(Frame<'_>),
{
    fn render(&mut self, frame: Frame<'_>) {
        (self)(frame)
    }
}

/// Owns a [`RecordStore`] and everything derived from it.
///
/// Every mutating call arms the refresh timer; the view, the selection
/// reconciliation and the render all happen together in
/// [`Inspector::poll`] once the timer is due.
pub struct Inspector<E: PredicateEngine, R: Render> {
    store: RecordStore,
    filter: FilterController<E>,
    selection: SelectionController,
    scheduler: UpdateScheduler,
    renderer: R,
}

impl<E: PredicateEngine, R: Render> Inspector<E, R> {
    /// Creates a session over the capture record schema with the default
    /// refresh delay.
    pub fn new(engine: E, renderer: R) -> Self {
        Self::with_options(engine, Schema::record(), DEFAULT_REFRESH_DELAY, renderer)
    }

    pub fn with_options(engine: E, schema: Schema, refresh_delay: Duration, renderer: R) -> Self {
        Self {
            store: RecordStore::new(),
            filter: FilterController::new(engine, schema),
            selection: SelectionController::new(),
            scheduler: UpdateScheduler::new(refresh_delay),
            renderer,
        }
    }

    /// Appends a record and schedules a refresh.
    ///
    /// A rejected record leaves the store unchanged and schedules nothing.
    pub fn append(&mut self, record: impl Into<Arc<Record>>) -> Result<usize, InspectError> {
        let len = self.store.append(record)?;
        self.trigger();
        Ok(len)
    }

    pub fn set_filter_text(&mut self, text: &str) -> &FilterStatus {
        self.trigger();
        self.filter.set_filter_text(text)
    }

    /// Replaces the filter with an equality test on `field`.
    pub fn apply_quick_filter(
        &mut self,
        field: &str,
        value: &FieldValue<'_>,
    ) -> Result<&FilterStatus, InspectError> {
        if !self.filter.schema().contains(field) {
            return Err(InspectError::UnknownField(field.to_string()));
        }
        self.trigger();
        Ok(self.filter.build_quick_filter(field, value))
    }

    pub fn select(&mut self, id: RecordId) {
        self.selection.select(id);
        self.trigger();
    }

    /// Moves the selection through the last computed view.
    pub fn navigate(&mut self, direction: Navigation) -> Option<Arc<Record>> {
        let record = self.selection.navigate(direction, self.filter.view()).cloned();
        self.trigger();
        record
    }

    /// Empties the store and the selection. The filter text is kept.
    pub fn clear(&mut self) {
        self.store.clear();
        self.selection.clear();
        self.trigger();
    }

    /// Runs one refresh cycle if the timer is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.scheduler.take_due(now) {
            return false;
        }

        self.filter.recompute(&self.store);
        self.selection.reconcile(self.filter.view());

        let frame = Frame {
            view: self.filter.view(),
            selected: self.selection.selected(),
            status: self.filter.status(),
            filter_text: self.filter.text(),
            total: self.store.len(),
            cycle: self.scheduler.cycles(),
        };
        tracing::debug!(
            cycle = frame.cycle,
            total = frame.total,
            visible = frame.view.len(),
            "refresh"
        );
        self.renderer.render(frame);
        true
    }

    /// When the next refresh is due, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    /// Stops the refresh timer. A pending refresh never runs.
    pub fn dispose(&mut self) {
        self.scheduler.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.scheduler.is_disposed()
    }

    pub fn cycles(&self) -> u64 {
        self.scheduler.cycles()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn view(&self) -> &View {
        self.filter.view()
    }

    pub fn status(&self) -> &FilterStatus {
        self.filter.status()
    }

    pub fn filter_text(&self) -> &str {
        self.filter.text()
    }

    pub fn selected(&self) -> Option<RecordId> {
        self.selection.selected()
    }

    fn trigger(&mut self) {
        self.scheduler.trigger(Instant::now());
    }
}
