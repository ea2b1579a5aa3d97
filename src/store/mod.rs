//! Layer catalog and feature storage backed by rusqlite.
//!
//! `WfsStore` owns the connection and the `wfs_layer_metadata` catalog,
//! `WfsLayer` reads and writes the features of one layer, and
//! `FeatureRecord` is a single decoded row.

mod feature;
mod layer;
mod store;

pub use feature::FeatureRecord;
pub use layer::WfsLayer;
pub use store::WfsStore;
