//! Evaluation of checked expressions against a single record.

use std::cmp::Ordering;

use serde_json::{Number, Value};
use sniffer_types::{FieldValue, Record};

use crate::error::EvaluationError;
use crate::expr::ast::{CompareOp, Expr, Literal, Path, Segment};

pub(crate) fn evaluate_predicate(expr: &Expr, record: &Record) -> Result<bool, EvaluationError> {
    truthy(&value_of(expr, record)?)
}

fn value_of<'a>(expr: &'a Expr, record: &'a Record) -> Result<FieldValue<'a>, EvaluationError> {
    match expr {
        Expr::Literal(Literal::Str(s)) => Ok(FieldValue::Text(s)),
        Expr::Literal(Literal::Number(n)) => Ok(FieldValue::Number(n.clone())),
        Expr::Literal(Literal::Bool(b)) => Ok(FieldValue::Bool(*b)),
        Expr::Field(path) => resolve(path, record),
        Expr::Not(inner) => Ok(FieldValue::Bool(!truthy(&value_of(inner, record)?)?)),
        Expr::And(lhs, rhs) => {
            let result = truthy(&value_of(lhs, record)?)? && truthy(&value_of(rhs, record)?)?;
            Ok(FieldValue::Bool(result))
        }
        Expr::Or(lhs, rhs) => {
            let result = truthy(&value_of(lhs, record)?)? || truthy(&value_of(rhs, record)?)?;
            Ok(FieldValue::Bool(result))
        }
        Expr::Compare { op, lhs, rhs } => {
            let lhs = value_of(lhs, record)?;
            let rhs = value_of(rhs, record)?;
            compare(*op, &lhs, &rhs).map(FieldValue::Bool)
        }
    }
}

fn resolve<'a>(path: &Path, record: &'a Record) -> Result<FieldValue<'a>, EvaluationError> {
    let root = record
        .field(&path.root)
        .ok_or_else(|| EvaluationError::new(format!("field `{}` is absent", path.root)))?;

    if path.segments.is_empty() {
        return Ok(normalize(root));
    }

    let FieldValue::Json(mut current) = root else {
        return Err(EvaluationError::new(format!(
            "field `{}` has no members",
            path.root
        )));
    };
    for segment in &path.segments {
        let next = match segment {
            Segment::Member(name) => current.get(name.as_str()),
            Segment::Index(index) => current.get(*index),
        };
        current = next.ok_or_else(|| EvaluationError::new(format!("`{path}` is absent")))?;
    }
    Ok(FieldValue::from_json(current))
}

fn normalize(value: FieldValue<'_>) -> FieldValue<'_> {
    match value {
        FieldValue::Json(json) => FieldValue::from_json(json),
        other => other,
    }
}

fn truthy(value: &FieldValue<'_>) -> Result<bool, EvaluationError> {
    match value {
        FieldValue::Bool(b) => Ok(*b),
        other => Err(EvaluationError::new(format!(
            "expected a boolean, found {}",
            kind_name(other)
        ))),
    }
}

fn compare(op: CompareOp, lhs: &FieldValue<'_>, rhs: &FieldValue<'_>) -> Result<bool, EvaluationError> {
    match op {
        CompareOp::Eq => Ok(equal(lhs, rhs)),
        CompareOp::Ne => Ok(!equal(lhs, rhs)),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let ordering = order(lhs, rhs).ok_or_else(|| {
                EvaluationError::new(format!(
                    "cannot order {} and {} with `{}`",
                    kind_name(lhs),
                    kind_name(rhs),
                    op.as_str()
                ))
            })?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
        CompareOp::Contains | CompareOp::StartsWith | CompareOp::EndsWith => {
            let (FieldValue::Text(haystack), FieldValue::Text(needle)) = (lhs, rhs) else {
                return Err(EvaluationError::new(format!(
                    "`{}` needs strings, found {} and {}",
                    op.as_str(),
                    kind_name(lhs),
                    kind_name(rhs)
                )));
            };
            Ok(match op {
                CompareOp::Contains => haystack.contains(*needle),
                CompareOp::StartsWith => haystack.starts_with(*needle),
                _ => haystack.ends_with(*needle),
            })
        }
    }
}

fn equal(lhs: &FieldValue<'_>, rhs: &FieldValue<'_>) -> bool {
    match (lhs, rhs) {
        (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
        (FieldValue::Number(a), FieldValue::Number(b)) => compare_numbers(a, b) == Some(Ordering::Equal),
        (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
        (FieldValue::Json(a), FieldValue::Json(b)) => a == b,
        _ => false,
    }
}

fn order(lhs: &FieldValue<'_>, rhs: &FieldValue<'_>) -> Option<Ordering> {
    match (lhs, rhs) {
        (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
        (FieldValue::Number(a), FieldValue::Number(b)) => compare_numbers(a, b),
        _ => None,
    }
}

/// Compares exactly when both sides are integers, falling back to `f64`.
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn kind_name(value: &FieldValue<'_>) -> &'static str {
    match value {
        FieldValue::Text(_) => "string",
        FieldValue::Number(_) => "number",
        FieldValue::Bool(_) => "boolean",
        FieldValue::Json(Value::Null) => "null",
        FieldValue::Json(Value::Array(_)) => "list",
        FieldValue::Json(_) => "map",
    }
}
