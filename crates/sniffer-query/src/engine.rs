//! The predicate engine contract and a runtime-selectable engine.

use sniffer_types::{FieldValue, Record, Schema};

use crate::error::{EvaluationError, SyntaxError, TypeError};
use crate::expr::{ExprEngine, ExprPredicate};
use crate::keyword::{KeywordEngine, KeywordPredicate};

/// Compiles filter text into predicates over [`Record`]s.
///
/// The three steps are kept separate so a caller can tell a malformed
/// filter apart from one that is well-formed but ill-typed, and so a single
/// record failing to evaluate never invalidates the filter as a whole.
pub trait PredicateEngine {
    type Predicate;

    fn parse(&self, text: &str) -> Result<Self::Predicate, SyntaxError>;

    fn check(&self, predicate: &Self::Predicate, schema: &Schema) -> Result<(), TypeError>;

    fn evaluate(
        &self,
        predicate: &Self::Predicate,
        record: &Record,
    ) -> Result<bool, EvaluationError>;

    /// Renders this engine's canonical filter text for `field == value`.
    fn quick_filter(&self, field: &str, value: &FieldValue<'_>) -> String;
}

/// Engine chosen at runtime, e.g. from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Expr(ExprEngine),
    Keyword(KeywordEngine),
}

impl Engine {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Expr(_) => "expr",
            Self::Keyword(_) => "keyword",
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::Expr(ExprEngine)
    }
}

impl std::str::FromStr for Engine {
    type Err = UnknownEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expr" | "expression" => Ok(Self::Expr(ExprEngine)),
            "keyword" | "simple" => Ok(Self::Keyword(KeywordEngine)),
            _ => Err(UnknownEngineError(s.to_string())),
        }
    }
}

/// Error returned when an engine name is not recognised.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown filter engine: {0} (expected \"expr\" or \"keyword\")")]
pub struct UnknownEngineError(pub String);

/// Predicate compiled by an [`Engine`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnyPredicate {
    Expr(ExprPredicate),
    Keyword(KeywordPredicate),
}

impl PredicateEngine for Engine {
    type Predicate = AnyPredicate;

    fn parse(&self, text: &str) -> Result<AnyPredicate, SyntaxError> {
        match self {
            Self::Expr(engine) => engine.parse(text).map(AnyPredicate::Expr),
            Self::Keyword(engine) => engine.parse(text).map(AnyPredicate::Keyword),
        }
    }

    fn check(&self, predicate: &AnyPredicate, schema: &Schema) -> Result<(), TypeError> {
        match (self, predicate) {
            (Self::Expr(engine), AnyPredicate::Expr(p)) => engine.check(p, schema),
            (Self::Keyword(engine), AnyPredicate::Keyword(p)) => engine.check(p, schema),
            _ => Err(TypeError::new(format!(
                "predicate was not compiled by the {} engine",
                self.name()
            ))),
        }
    }

    fn evaluate(&self, predicate: &AnyPredicate, record: &Record) -> Result<bool, EvaluationError> {
        match (self, predicate) {
            (Self::Expr(engine), AnyPredicate::Expr(p)) => engine.evaluate(p, record),
            (Self::Keyword(engine), AnyPredicate::Keyword(p)) => engine.evaluate(p, record),
            _ => Err(EvaluationError::new(format!(
                "predicate was not compiled by the {} engine",
                self.name()
            ))),
        }
    }

    fn quick_filter(&self, field: &str, value: &FieldValue<'_>) -> String {
        match self {
            Self::Expr(engine) => engine.quick_filter(field, value),
            Self::Keyword(engine) => engine.quick_filter(field, value),
        }
    }
}
