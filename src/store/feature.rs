use crate::geometry::encode_hex;
use rusqlite::types::ValueRef;

/// A single feature read from a layer table.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRecord {
    pub fid: i64,
    /// Longitude in EPSG:4326.
    pub x: f64,
    /// Latitude in EPSG:4326.
    pub y: f64,
    /// Non-null attribute values in declared column order.
    pub attributes: Vec<(String, String)>,
}

impl FeatureRecord {
    /// Look up an attribute by column name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Render a stored attribute as text, the only type the wire formats carry.
/// `NULL` yields `None`.
pub(crate) fn value_to_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(v) => Some(v.to_string()),
        ValueRef::Real(v) => Some(v.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Some(encode_hex(bytes)),
    }
}
