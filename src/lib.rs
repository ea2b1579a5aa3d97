//! Minimal OGC Web Feature Service core built on top of rusqlite.
//!
//! ## Overview
//!
//! - `WfsStore` holds the layer catalog and the layer tables in one SQLite file.
//! - `WfsLayer` represents a single layer in the store.
//! - `FeatureRecord` represents a single point feature read from a layer.
//! - `WfsService` answers WFS operations (`WfsRequest`) against a store.
//!
//! `WfsStore` is the entry point and supports several open modes:
//!
//! - `WfsStore::new(path)`: create a new store file; fails if it exists.
//! - `WfsStore::open(path)`: open a new or existing file for read/write.
//! - `WfsStore::open_in_memory()`: create a transient in-memory store.
//!
//! Layers are declared with a `LayerDefinition` and created with
//! `WfsStore::create_layer`. Each layer table carries an integer `fid` and a
//! point `geom` (EWKB, EPSG:4326) followed by the declared columns.
//!
//! ## Short usage
//!
//! ```
//! use rusqlite_wfs::{ColumnSpec, LayerDefinition, WfsStore, get_feature};
//! use std::collections::BTreeMap;
//!
//! let store = WfsStore::open_in_memory()?;
//! store.create_layer(
//!     &LayerDefinition {
//!         name: "shops".to_string(),
//!         title: "Shops".to_string(),
//!         columns: vec![ColumnSpec::new("name", "TEXT")],
//!     },
//!     None,
//! )?;
//!
//! let layer = store.open_layer("shops")?;
//! let attributes = BTreeMap::from([("name".to_string(), "Corner".to_string())]);
//! let fid = layer.insert(12.123, 42.789, &attributes)?;
//! assert_eq!(fid, 1);
//!
//! let features = layer.features()?;
//! let gml = get_feature("shops", &features)?;
//! assert!(gml.contains("<gml:pos>42.789000 12.123000</gml:pos>"));
//! # Ok::<(), rusqlite_wfs::WfsError>(())
//! ```
//!
//! ## Serving requests
//!
//! HTTP stays outside this crate. Decode the query parameters into a
//! `WfsRequest` and let `WfsService` build the response document:
//!
//! ```no_run
//! use rusqlite_wfs::{WfsConfig, WfsRequest, WfsResponse, WfsService};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = WfsService::open(WfsConfig::from_env())?;
//!
//!     let params = [("service", "WFS"), ("request", "GetCapabilities")];
//!     let response = match WfsRequest::from_params("GET", params, None)
//!         .and_then(|request| service.handle(&request, None))
//!     {
//!         Ok(response) => response,
//!         Err(err) => WfsResponse::from_error(&err)?,
//!     };
//!     println!("{}\n\n{}", response.content_type, response.body);
//!     Ok(())
//! }
//! ```
//!
//! ## Transactions
//!
//! `parse_transaction` decodes a WFS Transaction document into
//! `InsertionRequest`s. `WfsStore::insert_features` writes them in a single
//! transaction, and `transaction_response` reports the new ids:
//!
//! ```no_run
//! use rusqlite_wfs::{WfsStore, parse_transaction, transaction_response};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = WfsStore::open("wfs.sqlite")?;
//!     let xml = std::fs::read_to_string("insert.xml")?;
//!     let fids = store.insert_features(&parse_transaction(&xml)?)?;
//!     println!("{}", transaction_response(&fids));
//!     Ok(())
//! }
//! ```
mod config;
mod error;
mod geometry;
mod ogc_sql;
mod protocol;
mod request;
mod sql_functions;
mod store;
mod types;

pub use config::{DEFAULT_BASE_URL, DEFAULT_STORE_PATH, WfsConfig};
pub use error::{ErrorKind, Result, WfsError};
pub use geometry::{
    SRID_WGS84, decode, encode_ewkb, encode_geojson, encode_gml_pos, encode_store_format,
};
pub use ogc_sql::{SqlDialect, build_create, build_drop, validate_definition};
pub use protocol::{
    LAYER_NAMESPACE, capabilities, describe_feature_type, feature_type, feature_type_element,
    get_feature, get_feature_geojson, parse_coordinates, parse_transaction, transaction_response,
};
pub use request::{
    CONTENT_TYPE_JSON, CONTENT_TYPE_XML, OutputFormat, WfsRequest, WfsResponse, WfsService,
};
pub use sql_functions::register_spatial_functions;
pub use store::{FeatureRecord, WfsLayer, WfsStore};
pub use types::{ColumnSchema, ColumnSpec, InsertionRequest, LayerDefinition, LayerMetadata};
