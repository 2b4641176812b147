//! Owned, serialisable copy of a rendered inspector frame.

use serde::Serialize;
use sniffer_inspect::{FilterStatus, Frame};
use sniffer_types::display::{format_timestamp, strip_namespace};
use sniffer_types::{Direction, Record, RecordId};

/// Everything a viewer needs to draw the message list and detail pane.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewFrame {
    /// Refresh cycle that produced this frame; `0` before the first one.
    pub cycle: u64,
    pub filter: FilterState,
    pub selected: Option<RecordId>,
    /// Records captured so far.
    pub total: usize,
    /// Records passing the filter.
    pub visible: usize,
    pub rows: Vec<Row>,
    /// The selected record in full.
    pub detail: Option<Record>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterState {
    pub text: String,
    pub status: FilterStatus,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            text: String::new(),
            status: FilterStatus::Empty,
        }
    }
}

/// One line of the message list.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<i64>,
    /// Local wall-clock time, `HH:MM:SS.mmm`.
    pub time: String,
    pub direction: Direction,
    /// `Method (Message)` without package prefixes.
    pub summary: String,
    pub error: bool,
}

impl Row {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.message_id,
            stream_id: record.stream_id,
            time: format_timestamp(&record.time),
            direction: record.direction,
            summary: format!(
                "{} ({})",
                strip_namespace(&record.method),
                strip_namespace(&record.message)
            ),
            error: record.error.is_some(),
        }
    }
}

impl ViewFrame {
    pub fn from_frame(frame: &Frame<'_>) -> Self {
        Self {
            cycle: frame.cycle,
            filter: FilterState {
                text: frame.filter_text.to_string(),
                status: frame.status.clone(),
            },
            selected: frame.selected,
            total: frame.total,
            visible: frame.view.len(),
            rows: frame.view.iter().map(|r| Row::from_record(r)).collect(),
            detail: frame.selected_record().map(|r| Record::clone(r)),
        }
    }
}
