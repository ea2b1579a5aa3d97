use std::error::Error;
use std::fmt;

/// Coarse classification of [`WfsError`], used by callers that map errors to
/// protocol status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed inbound XML or coordinates.
    Parse,
    /// Malformed stored geometry.
    Decode,
    /// Unsafe identifier or declared type.
    Validation,
    /// DDL/DML failure.
    Store,
    /// Reference to an unknown layer or column.
    NotFound,
    /// Invalid operation or parameters.
    Request,
}

/// Crate error type for WFS operations.
#[derive(Debug)]
pub enum WfsError {
    /// Wraps errors returned by `rusqlite`.
    Sql(rusqlite::Error),
    /// Wraps errors returned by the `wkb` crate.
    Wkb(wkb::error::WkbError),
    /// Wraps errors returned by `quick-xml` while reading or writing documents.
    Xml(quick_xml::Error),
    /// Wraps errors returned by `serde_json`.
    Json(serde_json::Error),
    /// The Transaction document is well-formed XML but not a valid insert request.
    MalformedTransaction(String),
    /// A coordinate pair could not be parsed as two comma-separated numbers.
    InvalidCoordinates(String),
    /// An inserted feature carries no geometry.
    MissingGeometry { layer: String },
    /// Stored geometry is not valid hexadecimal.
    InvalidHex(String),
    /// EWKB blob is too short for its header.
    InvalidEwkbLength { len: usize, minimum: usize },
    /// Geometry type other than a single point.
    UnsupportedGeometryType(String),
    /// Geometry carries Z and/or M ordinates.
    UnsupportedDimension,
    /// A point geometry with no coordinate.
    EmptyPoint,
    /// A point coordinate is NaN or infinite.
    NonFiniteCoordinate { x: f64, y: f64 },
    /// A feature row has a `NULL` geometry value.
    NullGeometryValue,
    /// A layer or column name is not a safe SQL identifier.
    InvalidIdentifier { kind: &'static str, name: String },
    /// A declared column type is not a safe SQL type name.
    InvalidColumnType { column: String, declared_type: String },
    /// User column collides with a synthetic column (`fid`, `geom`).
    ReservedColumnName { column: String },
    /// The same column is declared twice.
    DuplicateColumn { column: String },
    /// A layer with the same name already exists.
    LayerAlreadyExists { layer_name: String },
    /// No layer with this name is registered in the catalog.
    LayerNotFound { layer_name: String },
    /// An attribute references a column the layer does not have.
    UnknownColumn { layer_name: String, column: String },
    /// The request parameters do not describe a supported WFS operation.
    InvalidRequest(String),
    Message(String),
}

impl WfsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Xml(_)
            | Self::MalformedTransaction(_)
            | Self::InvalidCoordinates(_)
            | Self::MissingGeometry { .. } => ErrorKind::Parse,
            Self::Wkb(_)
            | Self::InvalidHex(_)
            | Self::InvalidEwkbLength { .. }
            | Self::UnsupportedGeometryType(_)
            | Self::UnsupportedDimension
            | Self::EmptyPoint
            | Self::NonFiniteCoordinate { .. }
            | Self::NullGeometryValue => ErrorKind::Decode,
            Self::InvalidIdentifier { .. }
            | Self::InvalidColumnType { .. }
            | Self::ReservedColumnName { .. }
            | Self::DuplicateColumn { .. } => ErrorKind::Validation,
            Self::Sql(_) | Self::Json(_) | Self::LayerAlreadyExists { .. } | Self::Message(_) => {
                ErrorKind::Store
            }
            Self::LayerNotFound { .. } | Self::UnknownColumn { .. } => ErrorKind::NotFound,
            Self::InvalidRequest(_) => ErrorKind::Request,
        }
    }
}

impl fmt::Display for WfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(err) => write!(f, "{err}"),
            Self::Wkb(err) => write!(f, "{err}"),
            Self::Xml(err) => write!(f, "xml error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::MalformedTransaction(reason) => write!(f, "malformed transaction: {reason}"),
            Self::InvalidCoordinates(text) => write!(f, "invalid coordinates: {text:?}"),
            Self::MissingGeometry { layer } => {
                write!(f, "insert into layer '{layer}' has no geometry")
            }
            Self::InvalidHex(reason) => write!(f, "invalid hex geometry: {reason}"),
            Self::InvalidEwkbLength { len, minimum } => write!(
                f,
                "invalid ewkb length: got {len} bytes, expected at least {minimum}"
            ),
            Self::UnsupportedGeometryType(ty) => write!(f, "unsupported geometry type: {ty}"),
            Self::UnsupportedDimension => write!(f, "only 2D geometries are supported"),
            Self::EmptyPoint => write!(f, "point geometry is empty"),
            Self::NonFiniteCoordinate { x, y } => {
                write!(f, "point coordinate is not finite: ({x}, {y})")
            }
            Self::NullGeometryValue => write!(f, "feature has null geometry value"),
            Self::InvalidIdentifier { kind, name } => write!(f, "invalid {kind} name: {name:?}"),
            Self::InvalidColumnType {
                column,
                declared_type,
            } => write!(
                f,
                "invalid column type for column '{column}': {declared_type:?}"
            ),
            Self::ReservedColumnName { column } => {
                write!(f, "column name is reserved: {column}")
            }
            Self::DuplicateColumn { column } => write!(f, "duplicate column: {column}"),
            Self::LayerAlreadyExists { layer_name } => {
                write!(f, "layer already exists: {layer_name}")
            }
            Self::LayerNotFound { layer_name } => write!(f, "no such layer: {layer_name}"),
            Self::UnknownColumn { layer_name, column } => {
                write!(f, "layer '{layer_name}' has no column '{column}'")
            }
            Self::InvalidRequest(reason) => write!(f, "invalid request: {reason}"),
            Self::Message(message) => write!(f, "{message}"),
        }
    }
}

impl Error for WfsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sql(err) => Some(err),
            Self::Wkb(err) => Some(err),
            Self::Xml(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for WfsError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sql(err)
    }
}

impl From<wkb::error::WkbError> for WfsError {
    fn from(err: wkb::error::WkbError) -> Self {
        Self::Wkb(err)
    }
}

impl From<quick_xml::Error> for WfsError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err)
    }
}

impl From<hex::FromHexError> for WfsError {
    fn from(err: hex::FromHexError) -> Self {
        Self::InvalidHex(err.to_string())
    }
}

impl From<serde_json::Error> for WfsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, WfsError>;

#[cfg(test)]
mod tests {
    use super::{ErrorKind, WfsError};

    #[test]
    fn kinds_follow_error_families() {
        assert_eq!(
            WfsError::InvalidCoordinates("1".to_string()).kind(),
            ErrorKind::Parse
        );
        assert_eq!(WfsError::EmptyPoint.kind(), ErrorKind::Decode);
        assert_eq!(
            WfsError::InvalidIdentifier {
                kind: "layer",
                name: "a b".to_string(),
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            WfsError::LayerNotFound {
                layer_name: "x".to_string(),
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            WfsError::Sql(rusqlite::Error::QueryReturnedNoRows).kind(),
            ErrorKind::Store
        );
    }
}
