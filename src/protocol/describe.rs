use crate::error::Result;
use crate::ogc_sql::GEOMETRY_COLUMN;
use crate::types::ColumnSchema;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use super::{indented_writer, into_string, write_open_close};

const SCHEMA_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xsd:schema
    targetNamespace="http://example.com/gowfs"
    xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:gml="http://www.opengis.net/gml/3.2"
    xmlns:gowfs="http://example.com/gowfs"
    elementFormDefault="qualified">
"#;

// Attributes travel as text regardless of their SQL type.
const ATTRIBUTE_XSD_TYPE: &str = "xsd:string";
const GEOMETRY_XSD_TYPE: &str = "gml:PointPropertyType";

/// Build the DescribeFeatureType XML schema of a layer.
///
/// The feature type extends `gml:AbstractFeatureType` with the `geom`
/// element followed by one string element per column, in column order.
pub fn describe_feature_type(layer_name: &str, columns: &[ColumnSchema]) -> Result<String> {
    let complex_type = complex_type(layer_name, columns)?;
    Ok(format!("{SCHEMA_HEAD}    {complex_type}\n</xsd:schema>\n"))
}

/// Top-level element declaration binding `layer_name` to its feature type.
pub fn feature_type_element(layer_name: &str) -> Result<String> {
    let type_name = format!("gowfs:{layer_name}Type");
    let mut writer = indented_writer(0);
    write_open_close(
        &mut writer,
        BytesStart::new("xsd:element").with_attributes([
            ("name", layer_name),
            ("type", type_name.as_str()),
            ("substitutionGroup", "gml:AbstractFeature"),
        ]),
    )?;
    into_string(writer)
}

fn complex_type(layer_name: &str, columns: &[ColumnSchema]) -> Result<String> {
    let type_name = format!("{layer_name}Type");

    let mut writer = indented_writer(2);
    writer.write_event(Event::Start(
        BytesStart::new("xsd:complexType").with_attributes([("name", type_name.as_str())]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("xsd:complexContent")))?;
    writer.write_event(Event::Start(
        BytesStart::new("xsd:extension").with_attributes([("base", "gml:AbstractFeatureType")]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("xsd:sequence")))?;

    write_open_close(&mut writer, element_decl(GEOMETRY_COLUMN, GEOMETRY_XSD_TYPE))?;
    for column in columns {
        write_open_close(
            &mut writer,
            element_decl(&column.column_name, ATTRIBUTE_XSD_TYPE),
        )?;
    }

    writer.write_event(Event::End(BytesEnd::new("xsd:sequence")))?;
    writer.write_event(Event::End(BytesEnd::new("xsd:extension")))?;
    writer.write_event(Event::End(BytesEnd::new("xsd:complexContent")))?;
    writer.write_event(Event::End(BytesEnd::new("xsd:complexType")))?;
    into_string(writer)
}

fn element_decl<'a>(name: &'a str, xsd_type: &'a str) -> BytesStart<'a> {
    BytesStart::new("xsd:element").with_attributes([
        ("name", name),
        ("type", xsd_type),
        ("minOccurs", "0"),
        ("maxOccurs", "1"),
        ("nillable", "true"),
    ])
}
