//! Live inspection of captured gRPC messages.
//!
//! An [`Inspector`] owns the records received so far and derives what a
//! viewer sees from them: the filtered [`View`], the selected record and the
//! status of the filter text. Derivation is deferred. Appends, filter edits
//! and selection changes only arm a refresh timer; when it fires, the view
//! is recomputed, the selection reconciled and a [`Frame`] handed to the
//! [`Render`] callback, exactly once per delay window however many changes
//! arrived in it.
//!
//! # Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`RecordStore`] | append-only, strictly increasing ids |
//! | [`FilterController`] | filter text → status → view |
//! | [`SelectionController`] | one selected id, clamped navigation |
//! | [`UpdateScheduler`] | single pending refresh deadline |
//! | [`actor::spawn`] | runs an inspector on a tokio task |
//!
//! # Usage
//!
//! ```rust,ignore
//! use sniffer_inspect::{actor, Frame, Inspector};
//! use sniffer_query::ExprEngine;
//!
//! let inspector = Inspector::new(ExprEngine, |frame: Frame<'_>| {
//!     println!("{} of {} records visible", frame.view.len(), frame.total);
//! });
//! let (handle, _task) = actor::spawn(inspector);
//! handle.set_filter(r#"direction == "recv""#).await?;
//! handle.append(record).await?;
//! ```

pub mod actor;
mod error;
mod filter;
mod scheduler;
mod selection;
mod session;
mod store;
mod view;

pub use actor::InspectorHandle;
pub use error::InspectError;
pub use filter::{FilterController, FilterStatus};
pub use scheduler::{UpdateScheduler, DEFAULT_REFRESH_DELAY};
pub use selection::{Navigation, SelectionController};
pub use session::{Frame, Inspector, Render};
pub use store::RecordStore;
pub use view::View;

#[cfg(test)]
mod tests;
