use crate::error::{Result, WfsError};
use crate::types::InsertionRequest;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;
use tracing::debug;

// Element names are matched on their local part; prefixes and namespaces are ignored.
const TRANSACTION_TAG: &str = "Transaction";
const INSERT_TAG: &str = "Insert";
const GEOMETRY_TAG: &str = "geom";
const POINT_TAG: &str = "Point";
const COORDINATES_TAG: &str = "coordinates";

/// Decode the `Insert` blocks of a WFS Transaction document.
///
/// Each `Insert` wraps exactly one feature element. Its tag is the layer name
/// and its children are the attribute columns, plus a `geom` holding a GML
/// point. Children of `Transaction` other than `Insert` are skipped.
///
/// Example:
/// ```
/// use rusqlite_wfs::parse_transaction;
///
/// let xml = r#"<Transaction xmlns:gml="http://www.opengis.net/gml">
///   <Insert>
///     <parks><name>Central</name>
///       <geom><gml:Point><gml:coordinates>-73.96,40.78</gml:coordinates></gml:Point></geom>
///     </parks>
///   </Insert>
/// </Transaction>"#;
/// let requests = parse_transaction(xml)?;
/// assert_eq!(requests[0].layer_name, "parks");
/// assert_eq!((requests[0].x, requests[0].y), (-73.96, 40.78));
/// # Ok::<(), rusqlite_wfs::WfsError>(())
/// ```
pub fn parse_transaction(xml: &str) -> Result<Vec<InsertionRequest>> {
    let mut scanner = Scanner::new(xml);

    let root = loop {
        match scanner.next()? {
            Node::Open(name) => break name,
            Node::Empty(name) if name == TRANSACTION_TAG => return Ok(Vec::new()),
            Node::Empty(name) => break name,
            Node::Text(_) | Node::Close => {}
            Node::Eof => return Err(malformed("document has no root element")),
        }
    };
    if root != TRANSACTION_TAG {
        return Err(malformed(format!(
            "root element is <{root}>, expected <{TRANSACTION_TAG}>"
        )));
    }

    let mut requests = Vec::new();
    loop {
        match scanner.next()? {
            Node::Open(name) if name == INSERT_TAG => requests.push(parse_insert(&mut scanner)?),
            Node::Open(_) => scanner.skip_element()?,
            Node::Empty(name) if name == INSERT_TAG => {
                return Err(malformed("Insert contains no feature"));
            }
            Node::Empty(_) | Node::Text(_) => {}
            Node::Close => break,
            Node::Eof => return Err(unexpected_eof()),
        }
    }

    debug!(inserts = requests.len(), "decoded transaction");
    Ok(requests)
}

/// Parse a GML `coordinates` text of the form `X,Y`.
pub fn parse_coordinates(text: &str) -> Result<(f64, f64)> {
    let invalid = || WfsError::InvalidCoordinates(text.to_string());

    let mut tokens = text.trim().split(',');
    let (Some(x), Some(y), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(invalid());
    };
    let x = x.trim().parse::<f64>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f64>().map_err(|_| invalid())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid());
    }
    Ok((x, y))
}

fn parse_insert(scanner: &mut Scanner<'_>) -> Result<InsertionRequest> {
    let mut request = None;
    loop {
        match scanner.next()? {
            Node::Open(layer_name) => {
                if request.is_some() {
                    return Err(malformed("Insert wraps more than one feature"));
                }
                request = Some(parse_feature(scanner, layer_name)?);
            }
            Node::Empty(layer_name) => return Err(WfsError::MissingGeometry { layer: layer_name }),
            Node::Text(_) => {}
            Node::Close => break,
            Node::Eof => return Err(unexpected_eof()),
        }
    }
    request.ok_or_else(|| malformed("Insert contains no feature"))
}

fn parse_feature(scanner: &mut Scanner<'_>, layer_name: String) -> Result<InsertionRequest> {
    let mut point = None;
    let mut has_geometry = false;
    let mut attributes = BTreeMap::new();
    loop {
        match scanner.next()? {
            Node::Open(tag) | Node::Empty(tag) if tag == GEOMETRY_TAG && has_geometry => {
                return Err(malformed(format!(
                    "feature of layer '{layer_name}' has more than one <{GEOMETRY_TAG}>"
                )));
            }
            Node::Open(tag) if tag == GEOMETRY_TAG => {
                has_geometry = true;
                point = parse_geometry(scanner)?;
            }
            Node::Open(tag) => {
                let text = scanner.element_text()?;
                // a repeated tag overwrites the earlier value
                attributes.insert(tag, text.trim().to_string());
            }
            Node::Empty(tag) if tag == GEOMETRY_TAG => has_geometry = true,
            Node::Empty(tag) => {
                attributes.insert(tag, String::new());
            }
            Node::Text(_) => {}
            Node::Close => break,
            Node::Eof => return Err(unexpected_eof()),
        }
    }

    let (x, y) = point.ok_or_else(|| WfsError::MissingGeometry {
        layer: layer_name.clone(),
    })?;
    Ok(InsertionRequest {
        layer_name,
        x,
        y,
        attributes,
    })
}

fn parse_geometry(scanner: &mut Scanner<'_>) -> Result<Option<(f64, f64)>> {
    let mut point = None;
    loop {
        match scanner.next()? {
            Node::Open(tag) if tag == POINT_TAG => point = parse_point(scanner)?,
            Node::Open(_) => scanner.skip_element()?,
            Node::Empty(_) | Node::Text(_) => {}
            Node::Close => return Ok(point),
            Node::Eof => return Err(unexpected_eof()),
        }
    }
}

fn parse_point(scanner: &mut Scanner<'_>) -> Result<Option<(f64, f64)>> {
    let mut point = None;
    loop {
        match scanner.next()? {
            Node::Open(tag) if tag == COORDINATES_TAG => {
                point = Some(parse_coordinates(&scanner.element_text()?)?);
            }
            Node::Open(_) => scanner.skip_element()?,
            Node::Empty(_) | Node::Text(_) => {}
            Node::Close => return Ok(point),
            Node::Eof => return Err(unexpected_eof()),
        }
    }
}

fn malformed(reason: impl Into<String>) -> WfsError {
    WfsError::MalformedTransaction(reason.into())
}

fn unexpected_eof() -> WfsError {
    malformed("unexpected end of document")
}

/// Owned view of the events the decoder cares about.
enum Node {
    Open(String),
    Empty(String),
    Text(String),
    Close,
    Eof,
}

struct Scanner<'a> {
    reader: Reader<&'a [u8]>,
    buf: Vec<u8>,
}

impl<'a> Scanner<'a> {
    fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    fn next(&mut self) -> Result<Node> {
        loop {
            self.buf.clear();
            let node = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => Node::Open(local_name(e.local_name().as_ref())),
                Event::Empty(e) => Node::Empty(local_name(e.local_name().as_ref())),
                Event::End(_) => Node::Close,
                Event::Text(e) => Node::Text(e.unescape()?.into_owned()),
                Event::CData(e) => Node::Text(String::from_utf8_lossy(&e.into_inner()).into_owned()),
                Event::Eof => Node::Eof,
                // declarations, comments, processing instructions, doctype
                _ => continue,
            };
            return Ok(node);
        }
    }

    /// Concatenated descendant text of the element just opened; consumes its end tag.
    fn element_text(&mut self) -> Result<String> {
        let mut text = String::new();
        let mut depth = 0_usize;
        loop {
            match self.next()? {
                Node::Open(_) => depth += 1,
                Node::Text(chunk) => text.push_str(&chunk),
                Node::Empty(_) => {}
                Node::Close if depth == 0 => return Ok(text),
                Node::Close => depth -= 1,
                Node::Eof => return Err(unexpected_eof()),
            }
        }
    }

    fn skip_element(&mut self) -> Result<()> {
        self.element_text().map(|_| ())
    }
}

fn local_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    const INSERTION_XML: &str = r#"<Transaction xmlns="http://www.opengis.net/wfs" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:gml="http://www.opengis.net/gml" xsi:schemaLocation="http://example.com/gowfs http://localhost:8000/ows?SERVICE=WFS&amp;REQUEST=DescribeFeatureType&amp;VERSION=1.0.0&amp;TYPENAME=parks_ny" version="1.0.0" service="WFS">
   <Insert xmlns="http://www.opengis.net/wfs">
       <parks_ny xmlns="http://example.com/gowfs">
           <park_name xmlns="http://example.com/gowfs">f</park_name>
           <size_acres xmlns="http://example.com/gowfs">d</size_acres>
           <geom xmlns="http://example.com/gowfs">
               <gml:Point>
                   <gml:coordinates ts=" " cs=",">-74.21244970386565853,40.89557153692449987</gml:coordinates>
               </gml:Point>
           </geom>
       </parks_ny>
   </Insert>
   <Insert xmlns="http://www.opengis.net/wfs">
       <parks_mo xmlns="http://example.com/gowfs">
           <park_mo xmlns="http://example.com/gowfs">12</park_mo>
           <size_mo xmlns="http://example.com/gowfs">12</size_mo>
           <geom xmlns="http://example.com/gowfs">
               <gml:Point>
                   <gml:coordinates ts=" " cs=",">-74.24520207755853107,40.83474570006630699</gml:coordinates>
               </gml:Point>
           </geom>
       </parks_mo>
   </Insert>
</Transaction>"#;

    fn attributes(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn decodes_two_inserts() -> Result<()> {
        let requests = parse_transaction(INSERTION_XML)?;
        assert_eq!(
            requests,
            vec![
                InsertionRequest {
                    layer_name: "parks_ny".to_string(),
                    x: -74.21244970386565853,
                    y: 40.89557153692449987,
                    attributes: attributes(&[("park_name", "f"), ("size_acres", "d")]),
                },
                InsertionRequest {
                    layer_name: "parks_mo".to_string(),
                    x: -74.24520207755853107,
                    y: 40.83474570006630699,
                    attributes: attributes(&[("park_mo", "12"), ("size_mo", "12")]),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn skips_non_insert_children() -> Result<()> {
        let xml = r#"<wfs:Transaction xmlns:wfs="http://www.opengis.net/wfs">
            <wfs:Delete typeName="parks"><Filter><FeatureId fid="fid.1"/></Filter></wfs:Delete>
            <wfs:Insert><parks><geom><Point><coordinates>1,2</coordinates></Point></geom></parks></wfs:Insert>
            <wfs:Native vendorId="x" safeToIgnore="true"/>
        </wfs:Transaction>"#;
        let requests = parse_transaction(xml)?;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].layer_name, "parks");
        assert_eq!((requests[0].x, requests[0].y), (1.0, 2.0));
        assert!(requests[0].attributes.is_empty());
        Ok(())
    }

    #[test]
    fn last_repeated_tag_wins() -> Result<()> {
        let xml = r#"<Transaction><Insert><parks>
            <name>first</name>
            <geom><Point><coordinates>0,0</coordinates></Point></geom>
            <name>  second  </name>
        </parks></Insert></Transaction>"#;
        let requests = parse_transaction(xml)?;
        assert_eq!(requests[0].attributes, attributes(&[("name", "second")]));
        Ok(())
    }

    #[test]
    fn unescapes_attribute_text() -> Result<()> {
        let xml = r#"<Transaction><Insert><parks>
            <name>Fish &amp; Chips</name>
            <note><![CDATA[<raw>]]></note>
            <geom><Point><coordinates>0,0</coordinates></Point></geom>
        </parks></Insert></Transaction>"#;
        let requests = parse_transaction(xml)?;
        assert_eq!(
            requests[0].attributes,
            attributes(&[("name", "Fish & Chips"), ("note", "<raw>")])
        );
        Ok(())
    }

    #[test]
    fn empty_transaction_has_no_requests() -> Result<()> {
        assert!(parse_transaction("<Transaction/>")?.is_empty());
        assert!(parse_transaction("<Transaction></Transaction>")?.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_missing_geometry() {
        let xml = "<Transaction><Insert><parks><name>a</name></parks></Insert></Transaction>";
        assert!(matches!(
            parse_transaction(xml),
            Err(WfsError::MissingGeometry { ref layer }) if layer == "parks"
        ));

        let xml = "<Transaction><Insert><parks><geom><Point/></geom></parks></Insert></Transaction>";
        assert!(matches!(
            parse_transaction(xml),
            Err(WfsError::MissingGeometry { .. })
        ));
    }

    #[test]
    fn rejects_repeated_geometry() {
        for second in [
            "<geom/>",
            "<geom></geom>",
            "<geom><Point><coordinates>1,1</coordinates></Point></geom>",
        ] {
            let xml = format!(
                "<Transaction><Insert><parks>\
                    <geom><Point><coordinates>3,4</coordinates></Point></geom>{second}\
                 </parks></Insert></Transaction>"
            );
            assert!(
                matches!(parse_transaction(&xml), Err(WfsError::MalformedTransaction(_))),
                "{second}"
            );
        }
    }

    #[test]
    fn rejects_insert_with_zero_or_many_features() {
        for xml in [
            "<Transaction><Insert></Insert></Transaction>",
            "<Transaction><Insert/></Transaction>",
            "<Transaction><Insert>\
                <a><geom><Point><coordinates>0,0</coordinates></Point></geom></a>\
                <b><geom><Point><coordinates>0,0</coordinates></Point></geom></b>\
             </Insert></Transaction>",
        ] {
            assert!(
                matches!(parse_transaction(xml), Err(WfsError::MalformedTransaction(_))),
                "{xml}"
            );
        }
    }

    #[test]
    fn rejects_bad_coordinates() {
        for coordinates in ["1", "1,2,3", "a,2", "1,", "1 2", "NaN,1", "1,inf"] {
            let xml = format!(
                "<Transaction><Insert><p><geom><Point><coordinates>{coordinates}</coordinates></Point></geom></p></Insert></Transaction>"
            );
            assert!(
                matches!(parse_transaction(&xml), Err(WfsError::InvalidCoordinates(_))),
                "{coordinates}"
            );
        }
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(matches!(
            parse_transaction("<GetFeature/>"),
            Err(WfsError::MalformedTransaction(_))
        ));
        assert!(parse_transaction("").is_err());
        assert!(parse_transaction("<Transaction><Insert>").is_err());
        assert!(matches!(
            parse_transaction("<Transaction><Insert></Transaction>"),
            Err(WfsError::Xml(_))
        ));
    }

    #[test]
    fn parses_coordinate_pairs() -> Result<()> {
        assert_eq!(parse_coordinates("1.5,-2")?, (1.5, -2.0));
        assert_eq!(parse_coordinates(" 3 , 4 ")?, (3.0, 4.0));
        assert!(parse_coordinates("").is_err());
        Ok(())
    }
}
