use crate::error::{Result, WfsError};
use crate::ogc_sql::{
    SQL_CREATE_CATALOG, SQL_DELETE_CATALOG, SQL_INSERT_CATALOG, SQL_LAYER_EXISTS,
    SQL_LIST_LAYERS, SQL_SELECT_METADATA, SQL_SELECT_METADATA_BY_OWNER, SQL_TABLE_COLUMNS,
    SqlDialect, build_create, build_drop, validate_identifier,
};
use crate::sql_functions::register_spatial_functions;
use crate::types::{ColumnSchema, InsertionRequest, LayerDefinition, LayerMetadata};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use tracing::{debug, info};

use super::layer::WfsLayer;

#[derive(Debug)]
/// Connection wrapper holding the layer catalog and the layer tables.
pub struct WfsStore {
    conn: rusqlite::Connection,
}

impl WfsStore {
    /// Create a new store file. Fails if the file already exists.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(WfsError::Message(format!(
                "store file already exists: {}",
                path.display()
            )));
        }
        Self::init(rusqlite::Connection::open(path)?)
    }

    /// Open a store file, creating it if it does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::init(rusqlite::Connection::open(path)?)
    }

    /// Create a transient in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(rusqlite::Connection::open_in_memory()?)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self> {
        conn.execute_batch(SQL_CREATE_CATALOG)?;
        register_spatial_functions(&conn)?;
        Ok(Self { conn })
    }

    /// Create the layer table and register it in the catalog.
    ///
    /// Both happen in one transaction: on failure neither the table nor the
    /// catalog row exists afterwards.
    ///
    /// Example:
    /// ```no_run
    /// use rusqlite_wfs::{ColumnSpec, LayerDefinition, WfsStore};
    ///
    /// let store = WfsStore::open("wfs.sqlite")?;
    /// let def = LayerDefinition {
    ///     name: "user_location".to_string(),
    ///     title: "User Location".to_string(),
    ///     columns: vec![ColumnSpec::new("name", "TEXT"), ColumnSpec::new("address", "TEXT")],
    /// };
    /// store.create_layer(&def, Some(7))?;
    /// # Ok::<(), rusqlite_wfs::WfsError>(())
    /// ```
    pub fn create_layer(&self, def: &LayerDefinition, owner_id: Option<i64>) -> Result<String> {
        let create_sql = build_create(def, SqlDialect::Sqlite)?;

        let tx = self.conn.unchecked_transaction()?;
        if self.layer_exists(&def.name)? {
            return Err(WfsError::LayerAlreadyExists {
                layer_name: def.name.clone(),
            });
        }
        tx.execute_batch(&create_sql)?;
        tx.execute(
            SQL_INSERT_CATALOG,
            rusqlite::params![def.name, def.title, owner_id],
        )?;
        tx.commit()?;

        info!(
            layer = %def.name,
            owner_id = ?owner_id,
            columns = def.columns.len(),
            "created layer"
        );
        Ok(def.name.clone())
    }

    /// Drop the layer table and remove its catalog row, in one transaction.
    pub fn delete_layer(&self, layer_name: &str) -> Result<()> {
        let drop_sql = build_drop(layer_name, SqlDialect::Sqlite)?;

        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(SQL_DELETE_CATALOG, [layer_name])?;
        if removed == 0 {
            return Err(WfsError::LayerNotFound {
                layer_name: layer_name.to_string(),
            });
        }
        tx.execute_batch(&drop_sql)?;
        tx.commit()?;

        info!(layer = %layer_name, "deleted layer");
        Ok(())
    }

    /// List the names of the layers in creation order.
    pub fn list_layer_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(SQL_LIST_LAYERS)?;
        let layers = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(layers)
    }

    /// Catalog entries of every layer, in creation order.
    pub fn get_metadata(&self) -> Result<Vec<LayerMetadata>> {
        let mut stmt = self.conn.prepare(SQL_SELECT_METADATA)?;
        let entries = stmt
            .query_map([], metadata_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Catalog entries of the layers created by `owner_id`.
    pub fn get_metadata_by_owner(&self, owner_id: i64) -> Result<Vec<LayerMetadata>> {
        let mut stmt = self.conn.prepare(SQL_SELECT_METADATA_BY_OWNER)?;
        let entries = stmt
            .query_map([owner_id], metadata_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Physical description of the user columns of a layer.
    pub fn get_schema(&self, layer_name: &str) -> Result<Vec<ColumnSchema>> {
        validate_identifier("layer", layer_name)?;
        if !self.layer_exists(layer_name)? {
            return Err(WfsError::LayerNotFound {
                layer_name: layer_name.to_string(),
            });
        }

        let mut stmt = self.conn.prepare(SQL_TABLE_COLUMNS)?;
        let columns = stmt
            .query_map([layer_name], |row| {
                let not_null: i64 = row.get(2)?;
                Ok(ColumnSchema {
                    column_name: row.get(0)?,
                    data_type: row.get(1)?,
                    nullable: not_null == 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// Load a layer handle by name.
    pub fn open_layer<'a>(&'a self, layer_name: &str) -> Result<WfsLayer<'a>> {
        let property_columns = self.get_schema(layer_name)?;
        Ok(WfsLayer {
            store: self,
            layer_name: layer_name.to_string(),
            property_columns,
        })
    }

    /// Insert every request in one transaction and return the new `fid`s in
    /// request order.
    pub fn insert_features(&self, requests: &[InsertionRequest]) -> Result<Vec<i64>> {
        let tx = self.conn.unchecked_transaction()?;

        let mut layers: HashMap<&str, WfsLayer<'_>> = HashMap::new();
        let mut fids = Vec::with_capacity(requests.len());
        for request in requests {
            let layer_name = request.layer_name.as_str();
            let layer = match layers.entry(layer_name) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(self.open_layer(layer_name)?),
            };
            fids.push(layer.insert(request.x, request.y, &request.attributes)?);
        }
        tx.commit()?;

        debug!(inserted = fids.len(), "committed insert transaction");
        Ok(fids)
    }

    pub(crate) fn connection(&self) -> &rusqlite::Connection {
        &self.conn
    }

    fn layer_exists(&self, layer_name: &str) -> Result<bool> {
        let exists: bool = self
            .conn
            .query_row(SQL_LAYER_EXISTS, [layer_name], |row| row.get(0))?;
        Ok(exists)
    }
}

fn metadata_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LayerMetadata> {
    Ok(LayerMetadata {
        id: row.get(0)?,
        name: row.get(1)?,
        title: row.get(2)?,
        owner_id: row.get(3)?,
    })
}
