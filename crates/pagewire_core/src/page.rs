//! Page documents.

use crate::error::{CoreError, CoreResult};
use crate::patch::{Delta, Patch, PatchOp, RowChange};
use crate::value::{Row, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named document: rows keyed by id, in insertion order.
///
/// Pages are only mutated by applying patches. The marshalled form is a
/// JSON object of `row id -> {field: value}`, rows in insertion order and
/// fields sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Page {
    rows: IndexMap<String, Row>,
}

impl Page {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a row by id.
    pub fn row(&self, id: &str) -> Option<&Row> {
        self.rows.get(id)
    }

    /// Returns a single field of a row.
    pub fn field(&self, row: &str, field: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(field))
    }

    /// Iterates rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &Row)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the page has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Applies every op of a validated patch, recording changes in `delta`.
    pub(crate) fn apply(&mut self, patch: &Patch, delta: &mut Delta) {
        for op in patch.ops() {
            self.apply_op(op, delta);
        }
    }

    fn apply_op(&mut self, op: &PatchOp, delta: &mut Delta) {
        match op {
            PatchOp::Set { row, fields } => {
                let target = self.rows.entry(row.clone()).or_default();
                target.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                delta.record(row, RowChange::Upserted);
            }
            PatchOp::Remove { row } => {
                // shift_remove keeps the remaining rows in insertion order
                if self.rows.shift_remove(row).is_some() {
                    delta.record(row, RowChange::Removed);
                }
            }
            PatchOp::SetField { row, field, value } => {
                self.rows
                    .entry(row.clone())
                    .or_default()
                    .insert(field.clone(), value.clone());
                delta.record(row, RowChange::Upserted);
            }
        }
    }

    /// Serializes the full page.
    pub fn marshal(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Reconstructs a page from [`Page::marshal`] output.
    pub fn unmarshal(bytes: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| CoreError::malformed(format!("page snapshot: {e}")))
    }

    /// Expresses the page as a patch of `set` ops that rebuilds it.
    ///
    /// Returns `None` for an empty page.
    pub fn to_patch(&self) -> Option<Patch> {
        let ops = self
            .rows
            .iter()
            .map(|(id, row)| PatchOp::Set {
                row: id.clone(),
                fields: row.clone(),
            })
            .collect();
        Patch::new(ops).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn apply(page: &mut Page, json: &str) -> Delta {
        let patch = Patch::parse(json.as_bytes()).unwrap();
        let mut delta = Delta::default();
        page.apply(&patch, &mut delta);
        delta
    }

    #[test]
    fn set_merges_fields() {
        let mut page = Page::new();
        apply(&mut page, r#"{"op":"set","row":"r","fields":{"a":1,"b":2}}"#);
        apply(&mut page, r#"{"op":"set","row":"r","fields":{"b":3}}"#);
        assert_eq!(page.field("r", "a"), Some(&Value::from(1)));
        assert_eq!(page.field("r", "b"), Some(&Value::from(3)));
    }

    #[test]
    fn set_field_creates_row() {
        let mut page = Page::new();
        let delta = apply(
            &mut page,
            r#"{"op":"set_field","row":"r","field":"ok","value":true}"#,
        );
        assert_eq!(page.field("r", "ok"), Some(&Value::Bool(true)));
        assert_eq!(delta.upserted().collect::<Vec<_>>(), vec!["r"]);
    }

    #[test]
    fn remove_absent_row_is_noop() {
        let mut page = Page::new();
        let delta = apply(&mut page, r#"{"op":"remove","row":"ghost"}"#);
        assert!(delta.is_empty());
        assert!(page.is_empty());
    }

    #[test]
    fn row_order_is_insertion_order() {
        let mut page = Page::new();
        apply(
            &mut page,
            r#"[{"op":"set","row":"c","fields":{}},
                {"op":"set","row":"a","fields":{}},
                {"op":"set","row":"b","fields":{}},
                {"op":"remove","row":"a"},
                {"op":"set","row":"a","fields":{}}]"#,
        );
        let ids: Vec<_> = page.rows().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn marshal_round_trip_keeps_order() {
        let mut page = Page::new();
        apply(
            &mut page,
            r#"[{"op":"set","row":"z","fields":{"n":null,"s":"x"}},
                {"op":"set","row":"a","fields":{"f":1.25}}]"#,
        );
        let bytes = page.marshal();
        assert!(bytes.starts_with(br#"{"z":"#));
        assert_eq!(Page::unmarshal(&bytes).unwrap(), page);
    }

    #[test]
    fn to_patch_rebuilds_page() {
        let mut page = Page::new();
        apply(
            &mut page,
            r#"[{"op":"set","row":"r1","fields":{"x":1}},{"op":"set","row":"r2","fields":{"y":"b"}}]"#,
        );
        let mut rebuilt = Page::new();
        rebuilt.apply(&page.to_patch().unwrap(), &mut Delta::default());
        assert_eq!(rebuilt, page);
        assert!(Page::new().to_patch().is_none());
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            (-4000i32..4000).prop_map(|n| Value::from(f64::from(n) / 4.0)),
            "[a-z ]{0,8}".prop_map(Value::from),
        ]
    }

    proptest! {
        #[test]
        fn marshal_round_trip(
            rows in prop::collection::vec(
                ("[a-z]{1,4}", prop::collection::btree_map("[a-z]{1,3}", value_strategy(), 0..4)),
                0..12,
            )
        ) {
            let ops: Vec<PatchOp> = rows
                .into_iter()
                .map(|(row, fields)| PatchOp::Set { row, fields })
                .collect();
            let mut page = Page::new();
            if let Ok(patch) = Patch::new(ops) {
                page.apply(&patch, &mut Delta::default());
            }

            let restored = Page::unmarshal(&page.marshal()).unwrap();
            prop_assert_eq!(&restored, &page);
            prop_assert_eq!(restored.marshal(), page.marshal());
        }
    }
}
