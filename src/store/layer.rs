use crate::error::{Result, WfsError};
use crate::geometry::{SRID_WGS84, decode, encode_ewkb};
use crate::ogc_sql::{sql_insert_feature, sql_select_features};
use crate::types::ColumnSchema;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::feature::value_to_text;
use super::{FeatureRecord, WfsStore};

#[derive(Debug)]
/// A registered layer together with its user columns.
pub struct WfsLayer<'a> {
    pub(super) store: &'a WfsStore,
    pub layer_name: String,
    /// User columns in physical order, `fid` and `geom` excluded.
    pub property_columns: Vec<ColumnSchema>,
}

// When issuing the SELECT query, these columns always come first.
const FID_INDEX: usize = 0;
const GEOMETRY_INDEX: usize = 1;
const PROPERTY_OFFSET: usize = 2;

impl WfsLayer<'_> {
    /// Read every feature of the layer in `fid` order.
    ///
    /// Example:
    /// ```no_run
    /// use rusqlite_wfs::WfsStore;
    ///
    /// let store = WfsStore::open("wfs.sqlite")?;
    /// let layer = store.open_layer("layer_1")?;
    /// for feature in layer.features()? {
    ///     println!("{} ({}, {}) {:?}", feature.fid, feature.x, feature.y, feature.attributes);
    /// }
    /// # Ok::<(), rusqlite_wfs::WfsError>(())
    /// ```
    pub fn features(&self) -> Result<Vec<FeatureRecord>> {
        let columns = self
            .property_columns
            .iter()
            .map(|column| column.column_name.as_str());
        let sql = sql_select_features(&self.layer_name, columns);

        let mut stmt = self.store.connection().prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                let fid: i64 = row.get(FID_INDEX)?;
                let geometry: Option<String> = row.get(GEOMETRY_INDEX)?;
                let mut attributes = Vec::with_capacity(self.property_columns.len());
                for (idx, column) in self.property_columns.iter().enumerate() {
                    if let Some(value) = value_to_text(row.get_ref(idx + PROPERTY_OFFSET)?) {
                        attributes.push((column.column_name.clone(), value));
                    }
                }
                Ok((fid, geometry, attributes))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(fid, geometry, attributes)| {
                // hex(NULL) is the empty string
                let hex = geometry
                    .filter(|hex| !hex.is_empty())
                    .ok_or(WfsError::NullGeometryValue)?;
                let (x, y) = decode(&hex)?;
                Ok(FeatureRecord {
                    fid,
                    x,
                    y,
                    attributes,
                })
            })
            .collect()
    }

    /// Insert a point feature and return its `fid`.
    ///
    /// Attributes are bound as text; columns not mentioned are left `NULL`.
    ///
    /// Example:
    /// ```no_run
    /// use rusqlite_wfs::WfsStore;
    /// use std::collections::BTreeMap;
    ///
    /// let store = WfsStore::open("wfs.sqlite")?;
    /// let layer = store.open_layer("layer_1")?;
    /// let attributes = BTreeMap::from([("name".to_string(), "Kevin".to_string())]);
    /// let fid = layer.insert(12.123, 42.789, &attributes)?;
    /// # Ok::<(), rusqlite_wfs::WfsError>(())
    /// ```
    pub fn insert(&self, x: f64, y: f64, attributes: &BTreeMap<String, String>) -> Result<i64> {
        let mut columns = Vec::with_capacity(attributes.len());
        let mut values = Vec::with_capacity(attributes.len() + 1);
        values.push(Value::Blob(encode_ewkb(x, y, SRID_WGS84)?));

        for (name, value) in attributes {
            let column = self
                .column(name)
                .ok_or_else(|| WfsError::UnknownColumn {
                    layer_name: self.layer_name.clone(),
                    column: name.clone(),
                })?;
            // `NAME` and `name` both resolve to the same column
            if columns.contains(&column.column_name.as_str()) {
                return Err(WfsError::DuplicateColumn {
                    column: column.column_name.clone(),
                });
            }
            columns.push(column.column_name.as_str());
            values.push(Value::Text(value.clone()));
        }

        let sql = sql_insert_feature(&self.layer_name, columns);
        let conn = self.store.connection();
        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.execute(params_from_iter(values))?;

        let fid = conn.last_insert_rowid();
        debug!(layer = %self.layer_name, fid, "inserted feature");
        Ok(fid)
    }

    // Column names resolve case-insensitively, as SQLite does.
    fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.property_columns
            .iter()
            .find(|column| column.column_name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use crate::Result;
    use crate::error::WfsError;
    use crate::store::WfsStore;
    use crate::types::{ColumnSpec, LayerDefinition};
    use std::collections::BTreeMap;

    fn attributes(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn new_store_with_layer() -> Result<WfsStore> {
        let store = WfsStore::open_in_memory()?;
        store.create_layer(
            &LayerDefinition {
                name: "parks".to_string(),
                title: "Parks".to_string(),
                columns: vec![
                    ColumnSpec::new("park_name", "TEXT"),
                    ColumnSpec::new("size_acres", "TEXT"),
                ],
            },
            None,
        )?;
        Ok(store)
    }

    #[test]
    fn inserts_and_reads_back_features() -> Result<()> {
        let store = new_store_with_layer()?;
        let layer = store.open_layer("parks")?;

        let first = layer.insert(
            -74.21244970386565853,
            40.89557153692449987,
            &attributes(&[("park_name", "f"), ("size_acres", "d")]),
        )?;
        let second = layer.insert(1.5, -2.5, &attributes(&[("size_acres", "12")]))?;
        assert_eq!((first, second), (1, 2));

        let features = layer.features()?;
        assert_eq!(features.len(), 2);

        assert_eq!(features[0].fid, 1);
        assert_eq!(features[0].x, -74.21244970386565853);
        assert_eq!(features[0].y, 40.89557153692449987);
        assert_eq!(
            features[0].attributes,
            vec![
                ("park_name".to_string(), "f".to_string()),
                ("size_acres".to_string(), "d".to_string()),
            ]
        );

        // NULL attributes are omitted
        assert_eq!(
            features[1].attributes,
            vec![("size_acres".to_string(), "12".to_string())]
        );
        Ok(())
    }

    #[test]
    fn rejects_unknown_attribute_columns() -> Result<()> {
        let store = new_store_with_layer()?;
        let layer = store.open_layer("parks")?;

        let err = layer
            .insert(0.0, 0.0, &attributes(&[("colour", "green")]))
            .expect_err("unknown column");
        assert!(matches!(
            err,
            WfsError::UnknownColumn { ref column, .. } if column == "colour"
        ));
        assert!(layer.features()?.is_empty());
        Ok(())
    }

    #[test]
    fn resolves_attribute_names_case_insensitively() -> Result<()> {
        let store = new_store_with_layer()?;
        let layer = store.open_layer("parks")?;
        layer.insert(0.0, 0.0, &attributes(&[("PARK_NAME", "Central")]))?;

        let features = layer.features()?;
        assert_eq!(features[0].property("park_name"), Some("Central"));
        Ok(())
    }

    #[test]
    fn rejects_attributes_resolving_to_the_same_column() -> Result<()> {
        let store = new_store_with_layer()?;
        let layer = store.open_layer("parks")?;

        let err = layer
            .insert(
                0.0,
                0.0,
                &attributes(&[("PARK_NAME", "a"), ("park_name", "b")]),
            )
            .expect_err("two values for one column");
        assert!(matches!(
            err,
            WfsError::DuplicateColumn { ref column } if column == "park_name"
        ));
        assert!(layer.features()?.is_empty());
        Ok(())
    }

    #[test]
    fn null_geometry_is_a_decode_error() -> Result<()> {
        let store = new_store_with_layer()?;
        store
            .connection()
            .execute(r#"INSERT INTO "parks" (park_name) VALUES ('nowhere')"#, [])?;

        let layer = store.open_layer("parks")?;
        let err = layer.features().expect_err("null geometry");
        assert!(matches!(err, WfsError::NullGeometryValue));
        Ok(())
    }
}
