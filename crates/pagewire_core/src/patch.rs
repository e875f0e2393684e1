//! Patch operations and their JSON wire form.
//!
//! A patch is an ordered batch of operations against one page:
//!
//! ```text
//! [{"op":"set","row":"r1","fields":{"x":1,"y":"a"}},
//!  {"op":"set_field","row":"r1","field":"x","value":2},
//!  {"op":"remove","row":"r0"}]
//! ```
//!
//! A single operation object is accepted as shorthand for a one-element
//! batch. Everything is validated while parsing, so applying a [`Patch`]
//! can never fail half way.

use crate::error::{CoreError, CoreResult};
use crate::value::{Row, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One mutation of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOp {
    /// Create-or-update: merges `fields` into the row, creating it if absent.
    Set {
        /// Row identifier.
        row: String,
        /// Fields to write.
        fields: Row,
    },
    /// Deletes a row. Removing an absent row is a no-op.
    Remove {
        /// Row identifier.
        row: String,
    },
    /// Sets a single field, creating the row if absent.
    SetField {
        /// Row identifier.
        row: String,
        /// Field name.
        field: String,
        /// New value.
        value: Value,
    },
}

impl PatchOp {
    /// Creates a `set` operation.
    pub fn set<I, K, V>(row: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        PatchOp::Set {
            row: row.into(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Creates a `remove` operation.
    pub fn remove(row: impl Into<String>) -> Self {
        PatchOp::Remove { row: row.into() }
    }

    /// Creates a `set_field` operation.
    pub fn set_field(
        row: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        PatchOp::SetField {
            row: row.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns the row this operation targets.
    pub fn row(&self) -> &str {
        match self {
            PatchOp::Set { row, .. } | PatchOp::Remove { row } | PatchOp::SetField { row, .. } => {
                row
            }
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.row().is_empty() {
            return Err(CoreError::malformed("empty row id"));
        }
        match self {
            PatchOp::Set { fields, .. } if fields.keys().any(String::is_empty) => {
                Err(CoreError::malformed("empty field name"))
            }
            PatchOp::SetField { field, .. } if field.is_empty() => {
                Err(CoreError::malformed("empty field name"))
            }
            _ => Ok(()),
        }
    }
}

/// A validated, ordered batch of operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

impl Patch {
    /// Builds a patch from operations, validating each.
    pub fn new(ops: Vec<PatchOp>) -> CoreResult<Self> {
        if ops.is_empty() {
            return Err(CoreError::malformed("patch has no operations"));
        }
        for (i, op) in ops.iter().enumerate() {
            op.validate()
                .map_err(|e| CoreError::malformed(format!("op {i}: {e}")))?;
        }
        Ok(Self { ops })
    }

    /// Parses a patch from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedPatch`] if the bytes are not JSON, are
    /// neither an op object nor an array of op objects, or any op fails
    /// validation.
    pub fn parse(bytes: &[u8]) -> CoreResult<Self> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        let ops = match json {
            serde_json::Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    serde_json::from_value(item)
                        .map_err(|e| CoreError::malformed(format!("op {i}: {e}")))
                })
                .collect::<CoreResult<Vec<PatchOp>>>()?,
            obj @ serde_json::Value::Object(_) => vec![serde_json::from_value(obj)?],
            _ => return Err(CoreError::malformed("expected op object or array of ops")),
        };
        Self::new(ops)
    }

    /// Encodes the patch as a compact JSON array.
    ///
    /// The output never contains a newline, which the log format relies on.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Serializing plain enums and string-keyed maps cannot fail.
        serde_json::to_vec(&self.ops).unwrap_or_default()
    }

    /// Returns the operations in application order.
    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    /// Consumes the patch, returning its operations.
    pub fn into_ops(self) -> Vec<PatchOp> {
        self.ops
    }

    /// Returns the number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Always false; empty patches are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// What a patch did to a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowChange {
    /// Row was created or had fields written.
    Upserted,
    /// Row was deleted.
    Removed,
}

/// The set of rows changed by one applied patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    /// True if the patch created the page.
    pub created_page: bool,
    changes: IndexMap<String, RowChange>,
}

impl Delta {
    pub(crate) fn new(created_page: bool) -> Self {
        Self {
            created_page,
            changes: IndexMap::new(),
        }
    }

    pub(crate) fn record(&mut self, row: &str, change: RowChange) {
        self.changes.insert(row.to_string(), change);
    }

    /// Rows created or updated, in first-touched order.
    pub fn upserted(&self) -> impl Iterator<Item = &str> {
        self.rows_with(RowChange::Upserted)
    }

    /// Rows removed, in first-touched order.
    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.rows_with(RowChange::Removed)
    }

    /// Final change per touched row.
    pub fn changes(&self) -> impl Iterator<Item = (&str, RowChange)> {
        self.changes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// True if no row changed.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn rows_with(&self, change: RowChange) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(move |(_, c)| **c == change)
            .map(|(k, _)| k.as_str())
    }
}

/// Checks that a url can be used as a page name.
///
/// Urls must be non-empty and free of whitespace, since the log format
/// separates tokens with spaces.
pub fn validate_url(url: &str) -> CoreResult<()> {
    if url.is_empty() || url.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidUrl {
            url: url.to_string(),
        });
    }
    Ok(())
}
