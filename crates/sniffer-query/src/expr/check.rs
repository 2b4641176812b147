//! Static type checking of parsed expressions against a [`Schema`].

use sniffer_types::{FieldType, Schema};

use crate::error::TypeError;
use crate::expr::ast::{CompareOp, Expr, Literal};

/// Checks that `expr` is a boolean expression over `schema`.
pub(crate) fn check_predicate(expr: &Expr, schema: &Schema) -> Result<(), TypeError> {
    expect_boolean(infer(expr, schema)?, "filter")
}

fn infer(expr: &Expr, schema: &Schema) -> Result<FieldType, TypeError> {
    match expr {
        Expr::Literal(Literal::Str(_)) => Ok(FieldType::String),
        Expr::Literal(Literal::Number(_)) => Ok(FieldType::Number),
        Expr::Literal(Literal::Bool(_)) => Ok(FieldType::Boolean),
        Expr::Field(path) => {
            let ty = schema
                .get(&path.root)
                .ok_or_else(|| TypeError::new(format!("undeclared field `{}`", path.root)))?;
            if path.segments.is_empty() {
                Ok(ty)
            } else if ty == FieldType::Dynamic {
                Ok(FieldType::Dynamic)
            } else {
                Err(TypeError::new(format!(
                    "field `{}` has type {ty} and cannot be accessed as `{path}`",
                    path.root
                )))
            }
        }
        Expr::Not(inner) => {
            expect_boolean(infer(inner, schema)?, "operand of `!`")?;
            Ok(FieldType::Boolean)
        }
        Expr::And(lhs, rhs) => {
            expect_boolean(infer(lhs, schema)?, "left operand of `&&`")?;
            expect_boolean(infer(rhs, schema)?, "right operand of `&&`")?;
            Ok(FieldType::Boolean)
        }
        Expr::Or(lhs, rhs) => {
            expect_boolean(infer(lhs, schema)?, "left operand of `||`")?;
            expect_boolean(infer(rhs, schema)?, "right operand of `||`")?;
            Ok(FieldType::Boolean)
        }
        Expr::Compare { op, lhs, rhs } => {
            let lhs = infer(lhs, schema)?;
            let rhs = infer(rhs, schema)?;
            check_comparison(*op, lhs, rhs)?;
            Ok(FieldType::Boolean)
        }
    }
}

fn check_comparison(op: CompareOp, lhs: FieldType, rhs: FieldType) -> Result<(), TypeError> {
    let dynamic = lhs == FieldType::Dynamic || rhs == FieldType::Dynamic;

    if op.is_text() {
        for side in [lhs, rhs] {
            if side != FieldType::String && side != FieldType::Dynamic {
                return Err(TypeError::new(format!(
                    "`{}` requires string operands, found {side}",
                    op.as_str()
                )));
            }
        }
        return Ok(());
    }

    if op.is_ordering() && (lhs == FieldType::Boolean || rhs == FieldType::Boolean) {
        return Err(TypeError::new(format!(
            "`{}` cannot order boolean values",
            op.as_str()
        )));
    }

    if !dynamic && lhs != rhs {
        return Err(TypeError::new(format!(
            "cannot compare {lhs} with {rhs} using `{}`",
            op.as_str()
        )));
    }

    Ok(())
}

fn expect_boolean(ty: FieldType, what: &str) -> Result<(), TypeError> {
    match ty {
        FieldType::Boolean | FieldType::Dynamic => Ok(()),
        other => Err(TypeError::new(format!(
            "{what} must be a boolean expression, found {other}"
        ))),
    }
}
