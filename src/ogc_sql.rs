use crate::error::{Result, WfsError};
use crate::types::{ColumnSpec, LayerDefinition};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Name of the table that registers layers.
pub(crate) const CATALOG_TABLE: &str = "wfs_layer_metadata";

/// Synthetic columns every layer table carries ahead of the user columns.
pub(crate) const FID_COLUMN: &str = "fid";
pub(crate) const GEOMETRY_COLUMN: &str = "geom";

// PostgreSQL truncates identifiers longer than this.
const MAX_IDENTIFIER_LEN: usize = 63;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));
static DECLARED_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*( [A-Za-z][A-Za-z0-9_]*)*( ?\(\d+( ?, ?\d+)?\))?$")
        .expect("valid declared type regex")
});

/// Target SQL dialect of the synthesized DDL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlDialect {
    /// PostgreSQL with PostGIS, the reference layout of a layer table.
    PostGis,
    /// SQLite, as executed by [`crate::WfsStore`]. Geometry is an EWKB blob.
    Sqlite,
}

pub(crate) const SQL_CREATE_CATALOG: &str = "
CREATE TABLE IF NOT EXISTS wfs_layer_metadata (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  layer_name TEXT NOT NULL UNIQUE COLLATE NOCASE,
  layer_title TEXT NOT NULL DEFAULT '',
  owner_id INTEGER
);
";

pub(crate) const SQL_INSERT_CATALOG: &str = "
INSERT INTO wfs_layer_metadata
  (layer_name, layer_title, owner_id)
VALUES
  (?1, ?2, ?3)
";

pub(crate) const SQL_DELETE_CATALOG: &str =
    "DELETE FROM wfs_layer_metadata WHERE layer_name = ?1 COLLATE NOCASE";

pub(crate) const SQL_LAYER_EXISTS: &str =
    "SELECT EXISTS(SELECT 1 FROM wfs_layer_metadata WHERE layer_name = ?1 COLLATE NOCASE)";

pub(crate) const SQL_LIST_LAYERS: &str = "SELECT layer_name FROM wfs_layer_metadata ORDER BY id";

pub(crate) const SQL_SELECT_METADATA: &str =
    "SELECT id, layer_name, layer_title, owner_id FROM wfs_layer_metadata ORDER BY id";

pub(crate) const SQL_SELECT_METADATA_BY_OWNER: &str = "
SELECT id, layer_name, layer_title, owner_id
FROM wfs_layer_metadata
WHERE owner_id = ?1
ORDER BY id
";

pub(crate) const SQL_TABLE_COLUMNS: &str = "
SELECT name, type, \"notnull\"
FROM pragma_table_info(?1)
WHERE name != 'fid' AND name != 'geom'
ORDER BY cid
";

/// Check that `name` can be interpolated into SQL as a bare identifier.
pub fn validate_identifier(kind: &'static str, name: &str) -> Result<()> {
    if name.len() > MAX_IDENTIFIER_LEN || !IDENTIFIER_RE.is_match(name) {
        return Err(WfsError::InvalidIdentifier {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Check that a declared column type is a plain SQL type name such as
/// `TEXT`, `VARCHAR(255)` or `DOUBLE PRECISION`.
pub fn validate_declared_type(spec: &ColumnSpec) -> Result<()> {
    if !DECLARED_TYPE_RE.is_match(&spec.declared_type) {
        return Err(WfsError::InvalidColumnType {
            column: spec.name.clone(),
            declared_type: spec.declared_type.clone(),
        });
    }
    Ok(())
}

/// Validate every identifier and type a layer definition would put into DDL.
pub fn validate_definition(def: &LayerDefinition) -> Result<()> {
    validate_identifier("layer", &def.name)?;
    let lowered = def.name.to_ascii_lowercase();
    if lowered == CATALOG_TABLE || lowered.starts_with("sqlite_") {
        return Err(WfsError::InvalidIdentifier {
            kind: "layer",
            name: def.name.clone(),
        });
    }

    let mut seen = HashSet::with_capacity(def.columns.len());
    for spec in &def.columns {
        validate_identifier("column", &spec.name)?;
        validate_declared_type(spec)?;

        let lowered = spec.name.to_ascii_lowercase();
        if lowered == FID_COLUMN || lowered == GEOMETRY_COLUMN {
            return Err(WfsError::ReservedColumnName {
                column: spec.name.clone(),
            });
        }
        // Both target stores fold identifiers case-insensitively.
        if !seen.insert(lowered) {
            return Err(WfsError::DuplicateColumn {
                column: spec.name.clone(),
            });
        }
    }
    Ok(())
}

/// Build the `CREATE TABLE` statement for a layer: `fid`, `geom`, then the
/// user columns in declaration order.
pub fn build_create(def: &LayerDefinition, dialect: SqlDialect) -> Result<String> {
    validate_definition(def)?;

    let mut column_defs = Vec::with_capacity(def.columns.len() + 2);
    match dialect {
        SqlDialect::PostGis => {
            column_defs.push("fid SERIAL PRIMARY KEY".to_string());
            column_defs.push("geom GEOMETRY(Point, 4326)".to_string());
            for spec in &def.columns {
                column_defs.push(format!("{} {}", spec.name, spec.declared_type));
            }
        }
        SqlDialect::Sqlite => {
            column_defs.push("fid INTEGER PRIMARY KEY AUTOINCREMENT".to_string());
            column_defs.push("geom POINT".to_string());
            for spec in &def.columns {
                column_defs.push(format!(r#""{}" {}"#, spec.name, spec.declared_type));
            }
        }
    }

    Ok(format!(
        "CREATE TABLE {} ({});",
        quote_table(&def.name, dialect),
        column_defs.join(", ")
    ))
}

pub fn build_drop(layer_name: &str, dialect: SqlDialect) -> Result<String> {
    validate_identifier("layer", layer_name)?;
    Ok(format!("DROP TABLE {};", quote_table(layer_name, dialect)))
}

fn quote_table(layer_name: &str, dialect: SqlDialect) -> String {
    match dialect {
        SqlDialect::PostGis => layer_name.to_string(),
        SqlDialect::Sqlite => format!(r#""{layer_name}""#),
    }
}

pub(crate) fn sql_select_features<'a, I>(layer_name: &'a str, property_columns: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut columns = vec![FID_COLUMN.to_string(), format!("hex({GEOMETRY_COLUMN})")];
    columns.extend(property_columns.into_iter().map(|name| format!(r#""{name}""#)));

    format!(
        r#"SELECT {} FROM "{layer_name}" ORDER BY {FID_COLUMN}"#,
        columns.join(", ")
    )
}

pub(crate) fn sql_insert_feature<'a, I>(layer_name: &'a str, property_columns: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut columns = vec![GEOMETRY_COLUMN.to_string()];
    columns.extend(property_columns.into_iter().map(|name| format!(r#""{name}""#)));

    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<String>>()
        .join(", ");

    format!(
        r#"INSERT INTO "{layer_name}" ({}) VALUES ({placeholders})"#,
        columns.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    fn user_location() -> LayerDefinition {
        LayerDefinition {
            name: "user_location".to_string(),
            title: "User Location".to_string(),
            columns: vec![
                ColumnSpec::new("name", "TEXT"),
                ColumnSpec::new("address", "TEXT"),
            ],
        }
    }

    #[test]
    fn builds_postgis_create_statement() -> Result<()> {
        assert_eq!(
            build_create(&user_location(), SqlDialect::PostGis)?,
            "CREATE TABLE user_location (fid SERIAL PRIMARY KEY, geom GEOMETRY(Point, 4326), name TEXT, address TEXT);"
        );
        Ok(())
    }

    #[test]
    fn builds_sqlite_create_statement() -> Result<()> {
        assert_eq!(
            build_create(&user_location(), SqlDialect::Sqlite)?,
            r#"CREATE TABLE "user_location" (fid INTEGER PRIMARY KEY AUTOINCREMENT, geom POINT, "name" TEXT, "address" TEXT);"#
        );
        Ok(())
    }

    #[test]
    fn builds_create_without_user_columns() -> Result<()> {
        let def = LayerDefinition {
            name: "bare".to_string(),
            title: String::new(),
            columns: vec![],
        };
        assert_eq!(
            build_create(&def, SqlDialect::PostGis)?,
            "CREATE TABLE bare (fid SERIAL PRIMARY KEY, geom GEOMETRY(Point, 4326));"
        );
        Ok(())
    }

    #[test]
    fn builds_drop_statement() -> Result<()> {
        assert_eq!(
            build_drop("user_location", SqlDialect::PostGis)?,
            "DROP TABLE user_location;"
        );
        assert_eq!(
            build_drop("user_location", SqlDialect::Sqlite)?,
            r#"DROP TABLE "user_location";"#
        );
        Ok(())
    }

    #[test]
    fn rejects_unsafe_layer_names() {
        for name in [
            "",
            "1layer",
            "user location",
            "x; DROP TABLE wfs_layer_metadata; --",
            "quo\"te",
            "wfs_layer_metadata",
            "sqlite_master",
        ] {
            let mut def = user_location();
            def.name = name.to_string();
            let err = build_create(&def, SqlDialect::PostGis).expect_err("unsafe name");
            assert!(
                matches!(err, WfsError::InvalidIdentifier { kind: "layer", .. }),
                "{name:?}: {err:?}"
            );
        }

        let long = "a".repeat(64);
        assert!(build_drop(&long, SqlDialect::PostGis).is_err());
        assert!(build_drop(&"a".repeat(63), SqlDialect::PostGis).is_ok());
    }

    #[test]
    fn rejects_unsafe_column_types() {
        for declared_type in ["", "TEXT); DROP TABLE x", "TEXT--", "VARCHAR(abc)", "INT'"] {
            let mut def = user_location();
            def.columns[1].declared_type = declared_type.to_string();
            let err = build_create(&def, SqlDialect::Sqlite).expect_err("unsafe type");
            assert!(
                matches!(err, WfsError::InvalidColumnType { .. }),
                "{declared_type:?}: {err:?}"
            );
        }
    }

    #[test]
    fn accepts_parameterized_types() -> Result<()> {
        for declared_type in ["VARCHAR(255)", "NUMERIC(10, 2)", "DOUBLE PRECISION", "integer"] {
            let mut def = user_location();
            def.columns[0].declared_type = declared_type.to_string();
            validate_definition(&def)?;
        }
        Ok(())
    }

    #[test]
    fn rejects_reserved_and_duplicate_columns() {
        let mut def = user_location();
        def.columns.push(ColumnSpec::new("GEOM", "TEXT"));
        assert!(matches!(
            validate_definition(&def),
            Err(WfsError::ReservedColumnName { .. })
        ));

        let mut def = user_location();
        def.columns.push(ColumnSpec::new("Name", "TEXT"));
        assert!(matches!(
            validate_definition(&def),
            Err(WfsError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn builds_feature_statements() {
        assert_eq!(
            sql_select_features("layer_1", ["name", "address"]),
            r#"SELECT fid, hex(geom), "name", "address" FROM "layer_1" ORDER BY fid"#
        );
        assert_eq!(
            sql_insert_feature("layer_1", ["name"]),
            r#"INSERT INTO "layer_1" (geom, "name") VALUES (?1, ?2)"#
        );
        assert_eq!(
            sql_insert_feature("layer_1", std::iter::empty()),
            r#"INSERT INTO "layer_1" (geom) VALUES (?1)"#
        );
    }
}
