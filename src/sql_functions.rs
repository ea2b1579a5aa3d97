use crate::error::{Result, WfsError};
use crate::geometry::{decode_ewkb, encode_ewkb, point_coord};
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, Error};
use std::str::FromStr;
use wkt::Wkt;

/// Register the spatial SQL helper functions in the provided connection.
///
/// - `ST_GeomFromText(wkt, srid)`: point WKT to an EWKB blob.
/// - `ST_X(geom)`, `ST_Y(geom)`: coordinate of an EWKB point.
///
/// Example:
/// ```no_run
/// use rusqlite::Connection;
/// use rusqlite_wfs::register_spatial_functions;
///
/// let conn = Connection::open_in_memory()?;
/// register_spatial_functions(&conn)?;
/// let x: f64 = conn.query_row(
///     "SELECT ST_X(ST_GeomFromText('POINT(12.123 42.789)', 4326))",
///     [],
///     |row| row.get(0),
/// )?;
/// assert_eq!(x, 12.123);
/// # Ok::<(), rusqlite_wfs::WfsError>(())
/// ```
pub fn register_spatial_functions(conn: &Connection) -> Result<()> {
    register_st_geomfromtext(conn)?;
    register_st_x(conn)?;
    register_st_y(conn)?;
    Ok(())
}

pub(crate) fn register_st_geomfromtext(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "ST_GeomFromText",
        2,
        FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            let Some(text) = text else {
                return Ok(None);
            };
            let srid: u32 = ctx.get(1)?;

            let wkt = Wkt::<f64>::from_str(&text)
                .map_err(|err| user_error(WfsError::Message(format!("invalid wkt: {err}"))))?;
            let (x, y) = point_coord(&wkt).map_err(user_error)?;
            let ewkb = encode_ewkb(x, y, srid).map_err(user_error)?;
            Ok(Some(ewkb))
        },
    )?;
    Ok(())
}

pub(crate) fn register_st_x(conn: &Connection) -> Result<()> {
    register_coordinate_component(conn, "ST_X", |(x, _)| x)
}

pub(crate) fn register_st_y(conn: &Connection) -> Result<()> {
    register_coordinate_component(conn, "ST_Y", |(_, y)| y)
}

fn register_coordinate_component<F>(conn: &Connection, name: &str, f: F) -> Result<()>
where
    F: Fn((f64, f64)) -> f64 + Copy + Send + Sync + 'static,
{
    conn.create_scalar_function(name, 1, FunctionFlags::SQLITE_DETERMINISTIC, move |ctx| {
        let point = match point_from_ctx(ctx)? {
            Some(point) => point,
            None => return Ok(None),
        };
        Ok(Some(f(point)))
    })?;
    Ok(())
}

fn point_from_ctx(ctx: &Context<'_>) -> std::result::Result<Option<(f64, f64)>, Error> {
    match ctx.get_raw(0) {
        ValueRef::Null => Ok(None),
        ValueRef::Blob(blob) => decode_ewkb(blob).map(Some).map_err(user_error),
        _ => Err(Error::InvalidFunctionParameterType(0, Type::Blob)),
    }
}

fn user_error(err: WfsError) -> Error {
    Error::UserFunctionError(Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::register_spatial_functions;
    use crate::Result;
    use crate::geometry::{SRID_WGS84, decode_ewkb, encode_ewkb};
    use rusqlite::Connection;

    #[test]
    fn geom_from_text_builds_ewkb() -> Result<()> {
        let conn = Connection::open_in_memory()?;
        register_spatial_functions(&conn)?;

        let blob: Vec<u8> = conn.query_row(
            "SELECT ST_GeomFromText('POINT(12.123 42.789)', 4326)",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(blob, encode_ewkb(12.123, 42.789, SRID_WGS84)?);
        assert_eq!(decode_ewkb(&blob)?, (12.123, 42.789));
        Ok(())
    }

    #[test]
    fn coordinate_accessors_read_points() -> Result<()> {
        let conn = Connection::open_in_memory()?;
        register_spatial_functions(&conn)?;

        let (x, y): (f64, f64) = conn.query_row(
            "SELECT ST_X(g), ST_Y(g) FROM (SELECT ST_GeomFromText('POINT(-74.5 40.25)', 4326) AS g)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        assert_eq!((x, y), (-74.5, 40.25));

        let null: Option<f64> = conn.query_row("SELECT ST_X(NULL)", [], |row| row.get(0))?;
        assert_eq!(null, None);
        Ok(())
    }

    #[test]
    fn geom_from_text_rejects_non_points() -> Result<()> {
        let conn = Connection::open_in_memory()?;
        register_spatial_functions(&conn)?;

        let result: rusqlite::Result<Vec<u8>> = conn.query_row(
            "SELECT ST_GeomFromText('LINESTRING(0 0, 1 1)', 4326)",
            [],
            |row| row.get(0),
        );
        assert!(result.is_err());
        Ok(())
    }
}
