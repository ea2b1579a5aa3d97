//! WFS wire documents.
//!
//! `insert` decodes inbound Transaction/Insert XML. The other modules build
//! the outbound documents; their literal layout is part of the protocol
//! contract with existing clients, so builders emit exact whitespace.

mod capabilities;
mod describe;
mod feature_collection;
mod insert;
mod transaction;

pub use capabilities::{capabilities, feature_type};
pub use describe::{describe_feature_type, feature_type_element};
pub use feature_collection::{get_feature, get_feature_geojson};
pub use insert::{parse_coordinates, parse_transaction};
pub use transaction::transaction_response;

use crate::error::{Result, WfsError};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Namespace of the layer elements (`gowfs:` prefix).
pub const LAYER_NAMESPACE: &str = "http://example.com/gowfs";

pub(crate) const DEFAULT_CRS_URI: &str = "https://www.opengis.net/def/crs/EPSG/0/4326";
pub(crate) const GML_SRS_NAME: &str = "http://www.opengis.net/def/crs/EPSG/0/4326";

fn indented_writer(indent_size: usize) -> Writer<Vec<u8>> {
    Writer::new_with_indent(Vec::new(), b' ', indent_size)
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|err| WfsError::Message(format!("generated document is not utf-8: {err}")))
}

/// `<tag>text</tag>` on one line.
fn write_text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// `<tag attrs></tag>`: an empty element spelled out with an end tag.
fn write_open_close(writer: &mut Writer<Vec<u8>>, start: BytesStart<'_>) -> Result<()> {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    // an empty text keeps the end tag on the same line
    writer.write_event(Event::Text(BytesText::new("")))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}
