//! Field identity, placements, and the persisted record shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque per-field data the engine never interprets.
///
/// Key order is preserved so payloads serialize back unchanged.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Stable identifier for a placed field, unique within one form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for FieldId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// One field placed in the grid.
///
/// Row and column indexes are owned by the [`Grid`](crate::Grid) and are kept
/// contiguous after every completed operation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlacement {
    pub(crate) id: FieldId,
    pub(crate) row_index: usize,
    pub(crate) column_index: usize,
    pub(crate) width: f64,
    pub(crate) payload: Payload,
}

impl FieldPlacement {
    pub(crate) fn new(id: FieldId, width: f64, payload: Payload) -> Self {
        Self {
            id,
            row_index: 0,
            column_index: 0,
            width,
            payload,
        }
    }

    #[must_use]
    pub fn id(&self) -> &FieldId {
        &self.id
    }

    #[must_use]
    pub const fn row_index(&self) -> usize {
        self.row_index
    }

    #[must_use]
    pub const fn column_index(&self) -> usize {
        self.column_index
    }

    /// Width as a percentage of the row.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Persisted form of this placement.
    #[must_use]
    pub fn to_record(&self) -> FieldRecord {
        FieldRecord {
            id: self.id.clone(),
            row_index: Some(self.row_index),
            column_index: Some(self.column_index),
            width: Some(self.width),
            payload: self.payload.clone(),
        }
    }
}

/// Persisted field record: identity, optional layout attributes, and the
/// opaque payload flattened alongside them.
///
/// ```json
/// {"id": "field_1", "rowIndex": 0, "columnIndex": 1, "width": 50.0, "type": "email"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    pub id: FieldId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(flatten)]
    pub payload: Payload,
}

impl FieldRecord {
    /// Record without any layout attributes (pre-grid data).
    #[must_use]
    pub fn unplaced(id: impl Into<FieldId>, payload: Payload) -> Self {
        Self {
            id: id.into(),
            row_index: None,
            column_index: None,
            width: None,
            payload,
        }
    }

    /// Record with explicit layout attributes.
    #[must_use]
    pub fn placed(
        id: impl Into<FieldId>,
        row_index: usize,
        column_index: usize,
        width: f64,
        payload: Payload,
    ) -> Self {
        Self {
            id: id.into(),
            row_index: Some(row_index),
            column_index: Some(column_index),
            width: Some(width),
            payload,
        }
    }

    /// True if none of the layout attributes are present.
    #[must_use]
    pub fn is_unplaced(&self) -> bool {
        self.row_index.is_none() && self.column_index.is_none() && self.width.is_none()
    }
}

/// Width assignment for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWidth {
    pub id: FieldId,
    pub width: f64,
}

impl FieldWidth {
    #[must_use]
    pub fn new(id: impl Into<FieldId>, width: f64) -> Self {
        Self {
            id: id.into(),
            width,
        }
    }
}

/// Deterministic allocator for new field identities.
///
/// Produces `{prefix}{n}` for increasing `n`, skipping ids the caller reports
/// as taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIdAllocator {
    prefix: String,
    next: u64,
}

impl FieldIdAllocator {
    pub const DEFAULT_PREFIX: &'static str = "field_";

    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Peek at the serial the next allocation will try first.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Allocate the next free id.
    pub fn allocate(&mut self, is_taken: impl Fn(&FieldId) -> bool) -> FieldId {
        loop {
            let candidate = FieldId(format!("{}{}", self.prefix, self.next));
            self.next = self.next.wrapping_add(1);
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for FieldIdAllocator {
    fn default() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("payload must be an object, got {other}"),
        }
    }

    #[test]
    fn record_flattens_payload_next_to_layout_keys() {
        let record = FieldRecord::placed(
            "email",
            1,
            0,
            50.0,
            payload(json!({"type": "email", "label": "Email"})),
        );
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": "email",
                "rowIndex": 1,
                "columnIndex": 0,
                "width": 50.0,
                "type": "email",
                "label": "Email"
            })
        );
    }

    #[test]
    fn record_without_layout_keys_is_unplaced() {
        let record: FieldRecord =
            serde_json::from_value(json!({"id": "a", "type": "text"})).expect("deserialize");
        assert!(record.is_unplaced());
        assert_eq!(record.payload.get("type"), Some(&json!("text")));
    }

    #[test]
    fn payload_key_order_survives_round_trip() {
        let raw = r#"{"id":"a","zeta":1,"alpha":{"b":2,"a":1},"rowIndex":0}"#;
        let record: FieldRecord = serde_json::from_str(raw).expect("deserialize");
        let keys: Vec<_> = record.payload.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn allocator_skips_taken_ids() {
        let mut ids = FieldIdAllocator::default();
        let taken = [FieldId::new("field_1"), FieldId::new("field_2")];
        let id = ids.allocate(|candidate| taken.contains(candidate));
        assert_eq!(id.as_str(), "field_3");
        assert_eq!(ids.peek(), 4);
    }
}
