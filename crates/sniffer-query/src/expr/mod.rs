//! Typed boolean expression engine.
//!
//! Filters look like `direction == "recv" && method contains "Greeter"` and
//! are checked against the declared [`Schema`] before they are evaluated, so
//! a comparison between a string field and a number is reported up front
//! instead of silently matching nothing.

mod ast;
mod check;
mod eval;
mod lexer;
mod parser;

use sniffer_types::{FieldValue, Record, Schema};

use crate::engine::PredicateEngine;
use crate::error::{EvaluationError, SyntaxError, TypeError};

pub use ast::{CompareOp, Expr, Literal, Path, Segment};

/// The default engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExprEngine;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprPredicate {
    expr: Expr,
}

impl ExprPredicate {
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl PredicateEngine for ExprEngine {
    type Predicate = ExprPredicate;

    fn parse(&self, text: &str) -> Result<ExprPredicate, SyntaxError> {
        parser::parse_expression(text).map(|expr| ExprPredicate { expr })
    }

    fn check(&self, predicate: &ExprPredicate, schema: &Schema) -> Result<(), TypeError> {
        check::check_predicate(&predicate.expr, schema)
    }

    fn evaluate(&self, predicate: &ExprPredicate, record: &Record) -> Result<bool, EvaluationError> {
        eval::evaluate_predicate(&predicate.expr, record)
    }

    fn quick_filter(&self, field: &str, value: &FieldValue<'_>) -> String {
        format!("{field} == {}", render_literal(value))
    }
}

/// Renders a value as an expression literal.
///
/// Numbers and booleans are written bare; everything else becomes a quoted
/// string. Compound JSON is quoted in its serialised form.
pub fn render_literal(value: &FieldValue<'_>) -> String {
    match value {
        FieldValue::Text(s) => quote(s),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Json(json) => match FieldValue::from_json(json) {
            FieldValue::Json(compound) => quote(&compound.to_string()),
            scalar => render_literal(&scalar),
        },
    }
}

/// Quotes `s` as a double-quoted string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
