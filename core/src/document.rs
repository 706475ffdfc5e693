//! Consent document model
//!
//! A consent document is an XDM-shaped JSON tree:
//!
//! ```text
//! { "consents": { "<category>": { "val": "<y|n|...>" }, ... },
//!   "metadata": { "time": "<ISO-8601 timestamp>" } }
//! ```
//!
//! Values are opaque; the document only knows about presence, absence,
//! and structural merging.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConsentError;
use crate::traits::ConsentResult;

/// Top-level key wrapping all consent categories
pub const CONSENTS: &str = "consents";
/// Top-level key holding document metadata
pub const METADATA: &str = "metadata";
/// Metadata field carrying the last update time
pub const TIME: &str = "time";
/// Field holding the value of a consent category
pub const VAL: &str = "val";

pub const COLLECT: &str = "collect";
pub const AD_ID: &str = "adID";
pub const PERSONALIZE: &str = "personalize";

/// Immutable consent document.
///
/// Keys are kept sorted, so two structurally equal documents always
/// serialize to the same string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentDocument(Map<String, Value>);

impl ConsentDocument {
    /// Wrap an already structured map. Any map is accepted.
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn empty() -> Self {
        Self(Map::new())
    }

    /// Build from a JSON value; anything but an object is rejected
    pub fn from_value(value: Value) -> ConsentResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ConsentError::InvalidDocument(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse the serialized form written by [`ConsentDocument::to_json`]
    pub fn from_json(json: &str) -> ConsentResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Canonical serialized form: compact JSON with sorted keys
    pub fn to_json(&self) -> ConsentResult<String> {
        serde_json::to_string(&self.0).map_err(|e| ConsentError::SerializationError(e.to_string()))
    }

    /// Backing map, for serialization and field reads
    pub fn raw_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// True when the document carries no consent categories.
    ///
    /// A document without the `consents` wrapper, or with an empty one,
    /// is empty even if it still has metadata.
    pub fn is_empty(&self) -> bool {
        match self.0.get(CONSENTS) {
            None | Some(Value::Null) => true,
            Some(Value::Object(categories)) => categories.is_empty(),
            Some(_) => false,
        }
    }

    /// Look up a value by path, `None` when any segment is missing
    pub fn value_at(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(*first)?;
        for segment in rest {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current)
    }

    /// Look up a string value by path
    pub fn string_at(&self, path: &[&str]) -> Option<&str> {
        self.value_at(path).and_then(Value::as_str)
    }

    /// Value of a consent category, e.g. `consents.collect.val`
    pub fn consent_value(&self, category: &str) -> Option<&str> {
        self.string_at(&[CONSENTS, category, VAL])
    }

    pub fn collect(&self) -> Option<&str> {
        self.consent_value(COLLECT)
    }

    pub fn ad_id(&self) -> Option<&str> {
        self.consent_value(AD_ID)
    }

    pub fn personalize(&self) -> Option<&str> {
        self.consent_value(PERSONALIZE)
    }

    /// Last update time, `metadata.time`
    pub fn timestamp(&self) -> Option<&str> {
        self.string_at(&[METADATA, TIME])
    }

    /// Names of the consent categories present in the document
    pub fn categories(&self) -> Vec<&str> {
        self.0
            .get(CONSENTS)
            .and_then(Value::as_object)
            .map(|c| c.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Deep merge `incoming` on top of this document.
    ///
    /// Every key `incoming` specifies wins, at any depth. Nested objects
    /// present on both sides are merged key by key; everything else in
    /// `self` is kept. Timestamps are not compared.
    pub fn merge(&self, incoming: &ConsentDocument) -> ConsentDocument {
        let mut merged = self.0.clone();
        merge_maps(&mut merged, &incoming.0);
        ConsentDocument(merged)
    }

    /// Copy of this document with `metadata.time` set to `time`
    pub fn with_timestamp(&self, time: &str) -> ConsentDocument {
        let mut map = self.0.clone();
        let metadata = map
            .entry(METADATA.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !metadata.is_object() {
            *metadata = Value::Object(Map::new());
        }
        if let Value::Object(fields) = metadata {
            fields.insert(TIME.to_string(), Value::String(time.to_string()));
        }
        ConsentDocument(map)
    }

    /// Copy of this document without `metadata.time`
    pub fn without_timestamp(&self) -> ConsentDocument {
        let mut map = self.0.clone();
        let drop_metadata = match map.get_mut(METADATA) {
            Some(Value::Object(fields)) => {
                fields.remove(TIME);
                fields.is_empty()
            }
            _ => false,
        };
        if drop_metadata {
            map.remove(METADATA);
        }
        ConsentDocument(map)
    }

    /// Structural equality ignoring `metadata.time`
    pub fn same_consents(&self, other: &ConsentDocument) -> bool {
        self.without_timestamp() == other.without_timestamp()
    }

    /// Document holding a single category value
    pub fn with_consent(category: &str, value: &str) -> ConsentDocument {
        let mut val = Map::new();
        val.insert(VAL.to_string(), Value::String(value.to_string()));
        let mut categories = Map::new();
        categories.insert(category.to_string(), Value::Object(val));
        let mut map = Map::new();
        map.insert(CONSENTS.to_string(), Value::Object(categories));
        ConsentDocument(map)
    }
}

impl From<Map<String, Value>> for ConsentDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}

/// ISO-8601 form used for `metadata.time`
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn merge_maps(base: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        if let (Some(Value::Object(existing)), Value::Object(nested)) = (base.get_mut(key), value) {
            merge_maps(existing, nested);
            continue;
        }
        base.insert(key.clone(), value.clone());
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const T1: &str = "2019-09-23T18:15:45Z";
    const T2: &str = "2020-07-23T18:16:45Z";

    fn doc(value: Value) -> ConsentDocument {
        ConsentDocument::from_value(value).unwrap()
    }

    #[test]
    fn test_field_reads() {
        let d = doc(json!({
            "consents": { "collect": { "val": "y" }, "adID": { "val": "n" } },
            "metadata": { "time": T1 }
        }));

        assert_eq!(d.collect(), Some("y"));
        assert_eq!(d.ad_id(), Some("n"));
        assert_eq!(d.personalize(), None);
        assert_eq!(d.timestamp(), Some(T1));
        assert_eq!(d.categories(), vec!["adID", "collect"]);
        assert_eq!(d.string_at(&["consents", "collect", "val", "deeper"]), None);
    }

    #[test]
    fn test_is_empty() {
        assert!(ConsentDocument::empty().is_empty());
        assert!(doc(json!({ "consents": {} })).is_empty());
        assert!(doc(json!({ "metadata": { "time": T1 } })).is_empty());
        assert!(!ConsentDocument::with_consent(COLLECT, "y").is_empty());
    }

    #[test]
    fn test_merge_overwrites_preserves_and_adds() {
        let current = doc(json!({
            "consents": {
                "collect": { "val": "y" },
                "adID": { "val": "n" },
                "personalize": { "content": { "val": "vi" } }
            },
            "metadata": { "time": T1 }
        }));
        let incoming = doc(json!({
            "consents": {
                "collect": { "val": "n" },
                "personalize": { "content": { "val": "pi" } }
            },
            "metadata": { "time": T2 }
        }));

        let merged = current.merge(&incoming);

        assert_eq!(
            merged,
            doc(json!({
                "consents": {
                    "collect": { "val": "n" },
                    "adID": { "val": "n" },
                    "personalize": { "content": { "val": "pi" } }
                },
                "metadata": { "time": T2 }
            }))
        );
    }

    #[test]
    fn test_merge_older_timestamp_still_wins() {
        let current = ConsentDocument::with_consent(COLLECT, "y").with_timestamp(T2);
        let incoming = ConsentDocument::with_consent(COLLECT, "n").with_timestamp(T1);

        let merged = current.merge(&incoming);

        assert_eq!(merged.collect(), Some("n"));
        assert_eq!(merged.timestamp(), Some(T1));
    }

    #[test]
    fn test_merge_scalar_replaces_subtree() {
        let current = doc(json!({ "consents": { "collect": { "val": "y" } } }));
        let incoming = doc(json!({ "consents": { "collect": "n" } }));

        let merged = current.merge(&incoming);

        assert_eq!(merged.value_at(&["consents", "collect"]), Some(&json!("n")));
    }

    #[test]
    fn test_merge_empty_is_identity() {
        let current = ConsentDocument::with_consent(AD_ID, "y").with_timestamp(T1);
        assert_eq!(current.merge(&ConsentDocument::empty()), current);
        assert_eq!(ConsentDocument::empty().merge(&current), current);
    }

    #[test]
    fn test_canonical_json_is_order_independent() {
        let a = ConsentDocument::from_json(
            r#"{"metadata":{"time":"T"},"consents":{"collect":{"val":"y"},"adID":{"val":"n"}}}"#,
        )
        .unwrap();
        let b = ConsentDocument::from_json(
            r#"{"consents":{"adID":{"val":"n"},"collect":{"val":"y"}},"metadata":{"time":"T"}}"#,
        )
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
        assert_eq!(
            a.to_json().unwrap(),
            r#"{"consents":{"adID":{"val":"n"},"collect":{"val":"y"}},"metadata":{"time":"T"}}"#
        );
    }

    #[test]
    fn test_from_json_rejects_corrupt_input() {
        assert!(matches!(
            ConsentDocument::from_json("{InvalidJSON}[]$62&23Fsd^%"),
            Err(ConsentError::DeserializationError(_))
        ));
        assert!(matches!(
            ConsentDocument::from_json("[1, 2, 3]"),
            Err(ConsentError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_with_timestamp_replaces_non_object_metadata() {
        let d = doc(json!({ "consents": { "collect": { "val": "y" } }, "metadata": "bogus" }));
        assert_eq!(d.with_timestamp(T1).timestamp(), Some(T1));
    }

    #[test]
    fn test_same_consents_ignores_time() {
        let a = ConsentDocument::with_consent(COLLECT, "y").with_timestamp(T1);
        let b = ConsentDocument::with_consent(COLLECT, "y").with_timestamp(T2);
        let c = ConsentDocument::with_consent(COLLECT, "n").with_timestamp(T1);

        assert!(a.same_consents(&b));
        assert!(!a.same_consents(&c));
        assert_eq!(a.without_timestamp(), ConsentDocument::with_consent(COLLECT, "y"));
    }

    #[test]
    fn test_format_timestamp() {
        let time = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_timestamp(time), "2021-03-04T05:06:07.000Z");
    }
}
