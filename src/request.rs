//! Operation dispatch.
//!
//! HTTP routing stays outside this crate: the caller extracts the method,
//! the query parameters and the body, and hands them to
//! [`WfsRequest::from_params`]. [`WfsService::handle`] then runs the
//! operation against the store and returns the document to send back.

use crate::config::WfsConfig;
use crate::error::{Result, WfsError};
use crate::protocol::{
    capabilities, describe_feature_type, get_feature, get_feature_geojson, parse_transaction,
    transaction_response,
};
use crate::store::WfsStore;
use serde::Serialize;
use tracing::{debug, info};

pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Encoding of a GetFeature response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// GML 3.2 `wfs:FeatureCollection`, the default.
    Gml,
    GeoJson,
}

/// A decoded WFS operation.
#[derive(Clone, Debug, PartialEq)]
pub enum WfsRequest {
    GetCapabilities,
    DescribeFeatureType {
        type_name: String,
    },
    GetFeature {
        type_name: String,
        output_format: OutputFormat,
    },
    /// Transaction/Insert document sent as a POST body.
    Transaction {
        body: String,
    },
}

impl WfsRequest {
    /// Decode an operation from its HTTP method, query parameters and body.
    ///
    /// Parameter names are matched case-insensitively, the first non-empty
    /// value wins.
    ///
    /// Example:
    /// ```
    /// use rusqlite_wfs::{OutputFormat, WfsRequest};
    ///
    /// let request = WfsRequest::from_params(
    ///     "GET",
    ///     [("SERVICE", "WFS"), ("REQUEST", "GetFeature"), ("typeNames", "layer_1"), ("outputFormat", "json")],
    ///     None,
    /// )?;
    /// assert_eq!(
    ///     request,
    ///     WfsRequest::GetFeature { type_name: "layer_1".to_string(), output_format: OutputFormat::GeoJson }
    /// );
    /// # Ok::<(), rusqlite_wfs::WfsError>(())
    /// ```
    pub fn from_params<'a, I>(method: &str, params: I, body: Option<&str>) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let params: Vec<(&str, &str)> = params.into_iter().collect();
        let param = |names: &[&str]| {
            params
                .iter()
                .find(|(key, value)| {
                    !value.is_empty() && names.iter().any(|name| key.eq_ignore_ascii_case(name))
                })
                .map(|(_, value)| *value)
        };

        let service = param(&["service"]);
        let is_post = method.eq_ignore_ascii_case("POST");
        if !is_post && !method.eq_ignore_ascii_case("GET") {
            return Err(WfsError::InvalidRequest(format!(
                "method not allowed: {method}"
            )));
        }
        if service != Some("WFS") {
            return Err(WfsError::InvalidRequest("service must be WFS".to_string()));
        }

        if is_post {
            let body = body
                .filter(|body| !body.trim().is_empty())
                .ok_or_else(|| WfsError::InvalidRequest("transaction body is empty".to_string()))?;
            return Ok(Self::Transaction {
                body: body.to_string(),
            });
        }

        if let Some(version) = param(&["version"]) {
            debug!(version, "requested protocol version");
        }

        let type_name = || {
            param(&["typeName", "typeNames"])
                .map(str::to_string)
                .ok_or_else(|| WfsError::InvalidRequest("missing typeName".to_string()))
        };

        match param(&["request"]) {
            Some("GetCapabilities") => Ok(Self::GetCapabilities),
            Some("DescribeFeatureType") => Ok(Self::DescribeFeatureType {
                type_name: type_name()?,
            }),
            Some("GetFeature") => {
                let output_format = match param(&["outputFormat"]) {
                    None => OutputFormat::Gml,
                    Some("application/json" | "json") => OutputFormat::GeoJson,
                    Some(other) => {
                        return Err(WfsError::InvalidRequest(format!(
                            "unsupported outputFormat: {other}"
                        )));
                    }
                };
                Ok(Self::GetFeature {
                    type_name: type_name()?,
                    output_format,
                })
            }
            Some(other) => Err(WfsError::InvalidRequest(format!(
                "unsupported request: {other}"
            ))),
            None => Err(WfsError::InvalidRequest("missing request".to_string())),
        }
    }

    fn operation(&self) -> &'static str {
        match self {
            Self::GetCapabilities => "GetCapabilities",
            Self::DescribeFeatureType { .. } => "DescribeFeatureType",
            Self::GetFeature { .. } => "GetFeature",
            Self::Transaction { .. } => "Transaction",
        }
    }
}

/// A document ready to be written to the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WfsResponse {
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl WfsResponse {
    fn xml(body: String) -> Self {
        Self {
            content_type: CONTENT_TYPE_XML,
            body,
        }
    }

    /// JSON body `{"error": "..."}` reporting a failed operation.
    pub fn from_error(err: &WfsError) -> Result<Self> {
        let message = err.to_string();
        Ok(Self {
            content_type: CONTENT_TYPE_JSON,
            body: serde_json::to_string(&ErrorBody { error: &message })?,
        })
    }
}

/// Runs decoded operations against a store.
#[derive(Debug)]
pub struct WfsService {
    store: WfsStore,
    config: WfsConfig,
}

impl WfsService {
    pub fn new(store: WfsStore, config: WfsConfig) -> Self {
        Self { store, config }
    }

    /// Open the store named by `config.store_path`.
    pub fn open(config: WfsConfig) -> Result<Self> {
        let store = WfsStore::open(&config.store_path)?;
        Ok(Self::new(store, config))
    }

    pub fn store(&self) -> &WfsStore {
        &self.store
    }

    pub fn config(&self) -> &WfsConfig {
        &self.config
    }

    /// Execute `request` on behalf of `owner_id`.
    ///
    /// When an owner is given, Capabilities lists only the layers that owner
    /// created; the other operations are not filtered.
    pub fn handle(&self, request: &WfsRequest, owner_id: Option<i64>) -> Result<WfsResponse> {
        let response = match request {
            WfsRequest::GetCapabilities => {
                let layers = match owner_id {
                    Some(owner_id) => self.store.get_metadata_by_owner(owner_id)?,
                    None => self.store.get_metadata()?,
                };
                WfsResponse::xml(capabilities(&self.config.base_url, &layers)?)
            }
            WfsRequest::DescribeFeatureType { type_name } => {
                let columns = self.store.get_schema(type_name)?;
                WfsResponse::xml(describe_feature_type(type_name, &columns)?)
            }
            WfsRequest::GetFeature {
                type_name,
                output_format,
            } => {
                let features = self.store.open_layer(type_name)?.features()?;
                match output_format {
                    OutputFormat::Gml => WfsResponse::xml(get_feature(type_name, &features)?),
                    OutputFormat::GeoJson => WfsResponse {
                        content_type: CONTENT_TYPE_JSON,
                        body: get_feature_geojson(&features)?,
                    },
                }
            }
            WfsRequest::Transaction { body } => {
                let requests = parse_transaction(body)?;
                let fids = self.store.insert_features(&requests)?;
                WfsResponse::xml(transaction_response(&fids))
            }
        };

        info!(
            operation = request.operation(),
            owner_id = ?owner_id,
            bytes = response.body.len(),
            "handled request"
        );
        Ok(response)
    }
}
