//! Untyped keyword matcher.
//!
//! `key: value` matches records whose `key` field equals `value`, ignoring
//! case and surrounding whitespace. Anything else (including `key: value`
//! for a key the record does not carry) is a case-insensitive substring
//! search over `method` and `message`. The matcher never rejects a filter.

use sniffer_types::{FieldValue, Record, Schema};

use crate::engine::PredicateEngine;
use crate::error::{EvaluationError, SyntaxError, TypeError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeywordEngine;

/// Lower-cased filter text, split at the first `:` when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordPredicate {
    needle: String,
    field: Option<(String, String)>,
}

impl PredicateEngine for KeywordEngine {
    type Predicate = KeywordPredicate;

    fn parse(&self, text: &str) -> Result<KeywordPredicate, SyntaxError> {
        let needle = text.trim().to_lowercase();
        let field = needle.split_once(':').map(|(key, value)| {
            (key.trim().to_string(), value.trim().to_string())
        });
        Ok(KeywordPredicate { needle, field })
    }

    fn check(&self, _predicate: &KeywordPredicate, _schema: &Schema) -> Result<(), TypeError> {
        Ok(())
    }

    fn evaluate(&self, predicate: &KeywordPredicate, record: &Record) -> Result<bool, EvaluationError> {
        if predicate.needle.is_empty() {
            return Ok(true);
        }

        if let Some((key, value)) = &predicate.field {
            if let Some(actual) = record.field(key) {
                return Ok(actual.to_text().trim().to_lowercase() == *value);
            }
        }

        Ok(record.method.to_lowercase().contains(&predicate.needle)
            || record.message.to_lowercase().contains(&predicate.needle))
    }

    fn quick_filter(&self, field: &str, value: &FieldValue<'_>) -> String {
        format!("{field}: {}", value.to_text())
    }
}
