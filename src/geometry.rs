//! Point geometry codec.
//!
//! Stored geometry is extended well-known binary (EWKB): plain WKB whose
//! geometry type word may carry an SRID flag followed by a 4-byte SRID. The
//! store hands it to us hex-encoded.

use crate::error::{Result, WfsError};
use geo_traits::{CoordTrait, GeometryTrait, PointTrait};
use std::borrow::Cow;
use wkb::reader::{Dimension, GeometryType, Wkb};

/// EPSG code of WGS84 longitude/latitude, the only CRS layers are stored in.
pub const SRID_WGS84: u32 = 4326;

// cf. https://github.com/postgis/postgis/blob/master/doc/ZMSgeoms.txt
const EWKB_Z_FLAG: u32 = 0x8000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;
const EWKB_SRID_FLAG: u32 = 0x2000_0000;

// byte order (1) + geometry type (4)
const WKB_HEADER_LEN: usize = 5;
const SRID_LEN: usize = 4;

/// Decode a hex-encoded (E)WKB point into `(x, y)`.
pub fn decode(hex: &str) -> Result<(f64, f64)> {
    decode_ewkb(&decode_hex(hex)?)
}

/// Decode a raw (E)WKB point blob into `(x, y)`.
pub(crate) fn decode_ewkb(bytes: &[u8]) -> Result<(f64, f64)> {
    let wkb = ewkb_to_wkb(bytes)?;
    point_from_wkb(&wkb)
}

/// Encode a point as little-endian EWKB carrying `srid`.
pub fn encode_ewkb(x: f64, y: f64, srid: u32) -> Result<Vec<u8>> {
    let point = geo_types::Point::new(x, y);
    let mut wkb = Vec::with_capacity(WKB_HEADER_LEN + 16);
    wkb::writer::write_geometry(&mut wkb, &point, &Default::default())?;
    wkb_to_ewkb(&wkb, srid)
}

/// Encode a point the way the store reports it: uppercase hex EWKB in EPSG:4326.
pub fn encode_store_format(x: f64, y: f64) -> Result<String> {
    Ok(encode_hex(&encode_ewkb(x, y, SRID_WGS84)?))
}

/// GML `pos` text. Axis order is latitude first, so Y comes before X.
pub fn encode_gml_pos(x: f64, y: f64) -> String {
    format!("{y:.6} {x:.6}")
}

/// GeoJSON coordinate array, X before Y, no rounding.
pub fn encode_geojson(x: f64, y: f64) -> [f64; 2] {
    [x, y]
}

/// Extract the coordinate of a point geometry.
pub(crate) fn point_coord<G: GeometryTrait<T = f64>>(geom: &G) -> Result<(f64, f64)> {
    use geo_traits::GeometryType as GeoType;

    match geom.as_type() {
        GeoType::Point(point) => {
            let coord = point.coord().ok_or(WfsError::EmptyPoint)?;
            let (x, y) = (coord.x(), coord.y());
            if x.is_nan() && y.is_nan() {
                return Err(WfsError::EmptyPoint);
            }
            if !x.is_finite() || !y.is_finite() {
                return Err(WfsError::NonFiniteCoordinate { x, y });
            }
            Ok((x, y))
        }
        GeoType::LineString(_) => Err(unsupported("LINESTRING")),
        GeoType::Polygon(_) => Err(unsupported("POLYGON")),
        GeoType::MultiPoint(_) => Err(unsupported("MULTIPOINT")),
        GeoType::MultiLineString(_) => Err(unsupported("MULTILINESTRING")),
        GeoType::MultiPolygon(_) => Err(unsupported("MULTIPOLYGON")),
        GeoType::GeometryCollection(_) => Err(unsupported("GEOMETRYCOLLECTION")),
        _ => Err(unsupported("GEOMETRY")),
    }
}

fn unsupported(name: &str) -> WfsError {
    WfsError::UnsupportedGeometryType(name.to_string())
}

fn point_from_wkb(buf: &[u8]) -> Result<(f64, f64)> {
    let wkb = Wkb::try_new(buf)?;
    if wkb.geometry_type() != GeometryType::Point {
        return Err(WfsError::UnsupportedGeometryType(format!(
            "{:?}",
            wkb.geometry_type()
        )));
    }
    if wkb.dimension() != Dimension::Xy {
        return Err(WfsError::UnsupportedDimension);
    }
    point_coord(&wkb)
}

fn read_type_word(b: &[u8]) -> Result<(bool, u32)> {
    if b.len() < WKB_HEADER_LEN {
        return Err(WfsError::InvalidEwkbLength {
            len: b.len(),
            minimum: WKB_HEADER_LEN,
        });
    }
    let word = [b[1], b[2], b[3], b[4]];
    let little_endian = b[0] == 1;
    let type_word = if little_endian {
        u32::from_le_bytes(word)
    } else {
        u32::from_be_bytes(word)
    };
    Ok((little_endian, type_word))
}

fn write_type_word(out: &mut Vec<u8>, little_endian: bool, value: u32) {
    if little_endian {
        out.extend_from_slice(&value.to_le_bytes());
    } else {
        out.extend_from_slice(&value.to_be_bytes());
    }
}

/// Strip the SRID from an EWKB blob so that the rest is plain WKB.
/// Blobs without the SRID flag are returned as-is.
pub(crate) fn ewkb_to_wkb(b: &[u8]) -> Result<Cow<'_, [u8]>> {
    let (little_endian, type_word) = read_type_word(b)?;
    if type_word & (EWKB_Z_FLAG | EWKB_M_FLAG) != 0 {
        return Err(WfsError::UnsupportedDimension);
    }
    if type_word & EWKB_SRID_FLAG == 0 {
        return Ok(Cow::Borrowed(b));
    }

    let minimum = WKB_HEADER_LEN + SRID_LEN;
    if b.len() < minimum {
        return Err(WfsError::InvalidEwkbLength {
            len: b.len(),
            minimum,
        });
    }

    let mut wkb = Vec::with_capacity(b.len() - SRID_LEN);
    wkb.push(b[0]);
    write_type_word(&mut wkb, little_endian, type_word & !EWKB_SRID_FLAG);
    wkb.extend_from_slice(&b[minimum..]);
    Ok(Cow::Owned(wkb))
}

/// Splice an SRID into a plain WKB blob.
pub(crate) fn wkb_to_ewkb(wkb: &[u8], srid: u32) -> Result<Vec<u8>> {
    let (little_endian, type_word) = read_type_word(wkb)?;

    let mut ewkb = Vec::with_capacity(wkb.len() + SRID_LEN);
    ewkb.push(wkb[0]);
    write_type_word(&mut ewkb, little_endian, type_word | EWKB_SRID_FLAG);
    write_type_word(&mut ewkb, little_endian, srid);
    ewkb.extend_from_slice(&wkb[WKB_HEADER_LEN..]);
    Ok(ewkb)
}

pub(crate) fn decode_hex(text: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(text.trim())?)
}

pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}
