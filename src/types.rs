use std::collections::BTreeMap;

/// A user column as declared at layer creation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    /// SQL type name passed through to the store, e.g. `TEXT` or `VARCHAR(64)`.
    pub declared_type: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// Schema of a layer to be created. `name` doubles as the physical table name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerDefinition {
    pub name: String,
    pub title: String,
    pub columns: Vec<ColumnSpec>,
}

/// Catalog row describing a registered layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerMetadata {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub owner_id: Option<i64>,
}

/// Physical description of a user column, as reported by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSchema {
    pub column_name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// A single feature parsed from a Transaction `Insert` block.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertionRequest {
    pub layer_name: String,
    pub x: f64,
    pub y: f64,
    pub attributes: BTreeMap<String, String>,
}
