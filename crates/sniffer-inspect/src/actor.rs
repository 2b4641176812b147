//! Runs an [`Inspector`] on its own tokio task.
//!
//! The task owns the session outright. Callers talk to it through a
//! cloneable [`InspectorHandle`]; commands are applied in the order they are
//! received and the refresh timer is a `sleep_until` on the scheduler's
//! deadline, armed only while a refresh is pending.

use std::sync::Arc;

use serde_json::Value;
use sniffer_query::PredicateEngine;
use sniffer_types::{FieldValue, Record, RecordId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::error::InspectError;
use crate::filter::FilterStatus;
use crate::selection::Navigation;
use crate::session::{Inspector, Render};

/// Capacity of the command channel. Senders wait when it is full.
pub const COMMAND_CHANNEL_CAPACITY: usize = 1024;

enum Command {
    Append {
        record: Record,
        reply: oneshot::Sender<Result<usize, InspectError>>,
    },
    SetFilter {
        text: String,
        reply: oneshot::Sender<FilterStatus>,
    },
    QuickFilter {
        field: String,
        value: Value,
        reply: oneshot::Sender<Result<(String, FilterStatus), InspectError>>,
    },
    Select(RecordId),
    Navigate {
        direction: Navigation,
        reply: oneshot::Sender<Option<Arc<Record>>>,
    },
    Clear,
    Shutdown,
}

/// Cloneable sender side of a running inspector.
///
/// Every method fails with [`InspectError::Closed`] once the task is gone.
#[derive(Clone)]
pub struct InspectorHandle {
    tx: mpsc::Sender<Command>,
}

impl InspectorHandle {
    /// Appends a record, returning the new store length.
    pub async fn append(&self, record: Record) -> Result<usize, InspectError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Append { record, reply }).await?;
        rx.await.map_err(|_| InspectError::Closed)?
    }

    pub async fn set_filter(&self, text: impl Into<String>) -> Result<FilterStatus, InspectError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetFilter {
            text: text.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| InspectError::Closed)
    }

    /// Applies a quick filter and returns the generated text with its status.
    pub async fn quick_filter(
        &self,
        field: impl Into<String>,
        value: Value,
    ) -> Result<(String, FilterStatus), InspectError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::QuickFilter {
            field: field.into(),
            value,
            reply,
        })
        .await?;
        rx.await.map_err(|_| InspectError::Closed)?
    }

    pub async fn select(&self, id: RecordId) -> Result<(), InspectError> {
        self.send(Command::Select(id)).await
    }

    pub async fn navigate(&self, direction: Navigation) -> Result<Option<Arc<Record>>, InspectError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Navigate { direction, reply }).await?;
        rx.await.map_err(|_| InspectError::Closed)
    }

    pub async fn clear(&self) -> Result<(), InspectError> {
        self.send(Command::Clear).await
    }

    /// Asks the task to dispose the session and exit.
    pub async fn shutdown(&self) -> Result<(), InspectError> {
        self.send(Command::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, command: Command) -> Result<(), InspectError> {
        self.tx.send(command).await.map_err(|_| InspectError::Closed)
    }
}

/// Moves `inspector` onto a new task and returns its handle.
///
/// The task exits when every handle is dropped or [`InspectorHandle::shutdown`]
/// is called; either way the session is disposed first, so a pending refresh
/// never runs.
pub fn spawn<E, R>(inspector: Inspector<E, R>) -> (InspectorHandle, JoinHandle<()>)
where
    E: PredicateEngine + Send + 'static,
    E::Predicate: Send,
    R: Render + Send + 'static,
{
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let task = tokio::spawn(run(inspector, rx));
    (InspectorHandle { tx }, task)
}

async fn run<E, R>(mut inspector: Inspector<E, R>, mut rx: mpsc::Receiver<Command>)
where
    E: PredicateEngine,
    R: Render,
{
    tracing::info!("inspector started");

    loop {
        let deadline = inspector.next_deadline();
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => apply(&mut inspector, command),
            },
            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                inspector.poll(Instant::now());
            }
        }
    }

    inspector.dispose();
    tracing::info!(
        records = inspector.store().len(),
        cycles = inspector.cycles(),
        "inspector stopped"
    );
}

fn apply<E, R>(inspector: &mut Inspector<E, R>, command: Command)
where
    E: PredicateEngine,
    R: Render,
{
    // A dropped reply receiver means the caller stopped waiting; the
    // command still takes effect.
    match command {
        Command::Append { record, reply } => {
            let _ = reply.send(inspector.append(record));
        }
        Command::SetFilter { text, reply } => {
            let status = inspector.set_filter_text(&text).clone();
            let _ = reply.send(status);
        }
        Command::QuickFilter { field, value, reply } => {
            let result = inspector
                .apply_quick_filter(&field, &FieldValue::from_json(&value))
                .cloned();
            let result = result.map(|status| (inspector.filter_text().to_string(), status));
            let _ = reply.send(result);
        }
        Command::Select(id) => inspector.select(id),
        Command::Navigate { direction, reply } => {
            let _ = reply.send(inspector.navigate(direction));
        }
        Command::Clear => inspector.clear(),
        Command::Shutdown => {}
    }
}
