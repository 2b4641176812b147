//! Predicate engines for filtering captured records.
//!
//! An engine turns filter text into a predicate in three steps, each with
//! its own error type:
//!
//! | Step | Failure | Meaning |
//! |------|---------|---------|
//! | [`PredicateEngine::parse`] | [`SyntaxError`] | the text is malformed |
//! | [`PredicateEngine::check`] | [`TypeError`] | the text does not fit the schema |
//! | [`PredicateEngine::evaluate`] | [`EvaluationError`] | one record could not be tested |
//!
//! Two engines ship with the crate: [`ExprEngine`], a typed expression
//! language, and [`KeywordEngine`], a forgiving `key: value` / substring
//! matcher. [`Engine`] selects between them at runtime.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sniffer_query::{ExprEngine, PredicateEngine};
//! use sniffer_types::Schema;
//!
//! let engine = ExprEngine;
//! let predicate = engine.parse(r#"direction == "recv""#)?;
//! engine.check(&predicate, &Schema::record())?;
//! let matched = engine.evaluate(&predicate, &record).unwrap_or(false);
//! ```

mod engine;
mod error;
pub mod expr;
mod keyword;

pub use engine::{AnyPredicate, Engine, PredicateEngine, UnknownEngineError};
pub use error::{EvaluationError, SyntaxError, TypeError};
pub use expr::{ExprEngine, ExprPredicate};
pub use keyword::{KeywordEngine, KeywordPredicate};
