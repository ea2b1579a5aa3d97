use crate::error::Result;
use crate::geometry::{encode_geojson, encode_gml_pos};
use crate::store::FeatureRecord;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{GML_SRS_NAME, LAYER_NAMESPACE, indented_writer, into_string, write_text_element};

const WFS_NAMESPACE: &str = "http://www.opengis.net/wfs/2.0";
const GML_NAMESPACE: &str = "http://www.opengis.net/gml/3.2";

/// Build the GetFeature `wfs:FeatureCollection` of a layer in GML 3.2.
///
/// Each feature becomes a `gowfs:<layer>` member with `gml:id="fid.<fid>"`,
/// its point geometry and one element per attribute.
pub fn get_feature(layer_name: &str, features: &[FeatureRecord]) -> Result<String> {
    let feature_tag = format!("gowfs:{layer_name}");
    let count = features.len().to_string();

    let mut writer = indented_writer(2);
    writer.write_event(Event::Start(
        BytesStart::new("wfs:FeatureCollection").with_attributes([
            ("xmlns:wfs", WFS_NAMESPACE),
            ("xmlns:gml", GML_NAMESPACE),
            ("xmlns:gowfs", LAYER_NAMESPACE),
            ("numberMatched", count.as_str()),
            ("numberReturned", count.as_str()),
        ]),
    ))?;
    if features.is_empty() {
        writer.write_event(Event::Text(BytesText::new("")))?;
    }

    for feature in features {
        let gml_id = format!("fid.{}", feature.fid);
        writer.write_event(Event::Start(BytesStart::new("wfs:member")))?;
        writer.write_event(Event::Start(
            BytesStart::new(feature_tag.as_str()).with_attributes([("gml:id", gml_id.as_str())]),
        ))?;

        writer.write_event(Event::Start(BytesStart::new("gowfs:geom")))?;
        writer.write_event(Event::Start(
            BytesStart::new("gml:Point").with_attributes([("srsName", GML_SRS_NAME)]),
        ))?;
        write_text_element(&mut writer, "gml:pos", &encode_gml_pos(feature.x, feature.y))?;
        writer.write_event(Event::End(BytesEnd::new("gml:Point")))?;
        writer.write_event(Event::End(BytesEnd::new("gowfs:geom")))?;

        for (column, value) in &feature.attributes {
            write_text_element(&mut writer, &format!("gowfs:{column}"), value)?;
        }

        writer.write_event(Event::End(BytesEnd::new(feature_tag.as_str())))?;
        writer.write_event(Event::End(BytesEnd::new("wfs:member")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("wfs:FeatureCollection")))?;
    into_string(writer)
}

#[derive(Serialize)]
struct GeoJsonFeatureCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<GeoJsonFeature<'a>>,
}

#[derive(Serialize)]
struct GeoJsonFeature<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: String,
    geometry: GeoJsonGeometry,
    properties: BTreeMap<&'a str, &'a str>,
}

#[derive(Serialize)]
struct GeoJsonGeometry {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [f64; 2],
}

/// Build the GetFeature response as a pretty-printed GeoJSON FeatureCollection.
///
/// Feature ids are the `fid` rendered as a string, and properties are keyed
/// in alphabetical order.
pub fn get_feature_geojson(features: &[FeatureRecord]) -> Result<String> {
    let collection = GeoJsonFeatureCollection {
        kind: "FeatureCollection",
        features: features
            .iter()
            .map(|feature| GeoJsonFeature {
                kind: "Feature",
                id: feature.fid.to_string(),
                geometry: GeoJsonGeometry {
                    kind: "Point",
                    coordinates: encode_geojson(feature.x, feature.y),
                },
                properties: feature
                    .attributes
                    .iter()
                    .map(|(column, value)| (column.as_str(), value.as_str()))
                    .collect(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&collection)?)
}
