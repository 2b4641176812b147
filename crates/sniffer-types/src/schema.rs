//! Filter schema: the typed variables a filter expression may reference.

use serde::{Deserialize, Serialize};

/// Static type of a schema variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// Checked only at evaluation time.
    Dynamic,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Dynamic => "dynamic",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered mapping from variable name to [`FieldType`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<(String, FieldType)>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// The schema every captured [`Record`](crate::Record) conforms to.
    pub fn record() -> Self {
        Self::new()
            .with_field("message_id", FieldType::Dynamic)
            .with_field("stream_id", FieldType::Dynamic)
            .with_field("direction", FieldType::String)
            .with_field("time", FieldType::String)
            .with_field("method", FieldType::String)
            .with_field("message", FieldType::String)
            .with_field("peer_address", FieldType::String)
            .with_field("content", FieldType::Dynamic)
            .with_field("error", FieldType::String)
    }

    /// Adds or replaces a variable declaration.
    pub fn with_field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = ty,
            None => self.fields.push((name, ty)),
        }
        self
    }

    /// Returns the declared type of `name`, if any.
    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| *ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates declarations in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), *ty))
    }
}
