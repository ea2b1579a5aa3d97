use crate::error::Result;
use crate::types::LayerMetadata;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use super::{DEFAULT_CRS_URI, indented_writer, into_string, write_text_element};

/// Build the WFS 2.0.0 Capabilities document.
///
/// `base_url` is advertised as the endpoint of every operation; `layers` are
/// listed in the given order.
pub fn capabilities(base_url: &str, layers: &[LayerMetadata]) -> Result<String> {
    let mut feature_types = String::new();
    for layer in layers {
        feature_types.push('\n');
        feature_types.push_str(&feature_type(&layer.name, &layer.title)?);
    }

    let href = escape(base_url);
    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:WFS_Capabilities
    version="2.0.0"
    xmlns:wfs="http://www.opengis.net/wfs/2.0"
    xmlns:fes="http://www.opengis.net/fes/2.0"
    xmlns:gml="http://www.opengis.net/gml/3.2"
    xmlns:ows="http://www.opengis.net/ows/1.1"
    xmlns:xlink="http://www.w3.org/1999/xlink"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xsi:schemaLocation="
        http://www.opengis.net/wfs/2.0 http://schemas.opengis.net/wfs/2.0/wfs.xsd
        http://www.opengis.net/ows/1.1 http://schemas.opengis.net/ows/1.1.0/owsAll.xsd">

  <ows:ServiceIdentification>
    <ows:Title>Minimal Mock WFS (2.0.0)</ows:Title>
    <ows:ServiceType>WFS</ows:ServiceType>
    <ows:ServiceTypeVersion>2.0.0</ows:ServiceTypeVersion>
  </ows:ServiceIdentification>

  <ows:OperationsMetadata>
    <ows:Operation name="GetCapabilities">
      <ows:DCP><ows:HTTP>
        <ows:Get xlink:href="{href}"/>
      </ows:HTTP></ows:DCP>
    </ows:Operation>
    <ows:Operation name="DescribeFeatureType">
      <ows:DCP><ows:HTTP>
        <ows:Get xlink:href="{href}"/>
      </ows:HTTP></ows:DCP>
    </ows:Operation>
    <ows:Operation name="GetFeature">
      <ows:DCP><ows:HTTP>
        <ows:Get xlink:href="{href}"/>
      </ows:HTTP></ows:DCP>
    </ows:Operation>
    
    <ows:Operation name="Transaction">
      <ows:DCP>
        <ows:HTTP>
          <ows:Post xlink:href="{href}"/>
        </ows:HTTP>
      </ows:DCP>
    </ows:Operation>
  </ows:OperationsMetadata>

  <wfs:FeatureTypeList>
    {feature_types}
  </wfs:FeatureTypeList>

</wfs:WFS_Capabilities>
"#
    ))
}

/// One `wfs:FeatureType` entry of the Capabilities feature type list.
pub fn feature_type(name: &str, title: &str) -> Result<String> {
    let mut writer = indented_writer(1);
    writer.write_event(Event::Start(BytesStart::new("wfs:FeatureType")))?;
    write_text_element(&mut writer, "wfs:Name", name)?;
    write_text_element(&mut writer, "wfs:Title", title)?;
    write_text_element(&mut writer, "wfs:DefaultCRS", DEFAULT_CRS_URI)?;
    writer.write_event(Event::End(BytesEnd::new("wfs:FeatureType")))?;
    into_string(writer)
}
