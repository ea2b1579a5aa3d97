/// Build the WFS 1.0.0 `WFS_TransactionResponse` for a successful insert.
///
/// Inserted ids are reported as `fid.<id>` in the given order.
pub fn transaction_response(fids: &[i64]) -> String {
    let mut insert_results = String::new();
    for fid in fids {
        insert_results.push_str(&format!(
            "\n    <wfs:Feature>\n      <ogc:FeatureId fid=\"fid.{fid}\"/>\n    </wfs:Feature>\n    "
        ));
    }

    format!(
        r#"<wfs:WFS_TransactionResponse
    version="1.0.0"
    xmlns:wfs="http://www.opengis.net/wfs"
    xmlns:ogc="http://www.opengis.net/ogc"
    xmlns:gml="http://www.opengis.net/gml">

  <wfs:TransactionResult>
    <wfs:Status>
      <wfs:SUCCESS/>
    </wfs:Status>
  </wfs:TransactionResult>

  <wfs:TransactionSummary>
    <wfs:totalInserted>{inserted}</wfs:totalInserted>
    <wfs:totalUpdated>0</wfs:totalUpdated>
    <wfs:totalDeleted>0</wfs:totalDeleted>
  </wfs:TransactionSummary>

  <wfs:InsertResults>
    {insert_results}
  </wfs:InsertResults>

</wfs:WFS_TransactionResponse>"#,
        inserted = fids.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::transaction_response;

    #[test]
    fn reports_inserted_ids_in_order() {
        let expected = "<wfs:WFS_TransactionResponse
    version=\"1.0.0\"
    xmlns:wfs=\"http://www.opengis.net/wfs\"
    xmlns:ogc=\"http://www.opengis.net/ogc\"
    xmlns:gml=\"http://www.opengis.net/gml\">

  <wfs:TransactionResult>
    <wfs:Status>
      <wfs:SUCCESS/>
    </wfs:Status>
  </wfs:TransactionResult>

  <wfs:TransactionSummary>
    <wfs:totalInserted>3</wfs:totalInserted>
    <wfs:totalUpdated>0</wfs:totalUpdated>
    <wfs:totalDeleted>0</wfs:totalDeleted>
  </wfs:TransactionSummary>

  <wfs:InsertResults>
\x20\x20\x20\x20
    <wfs:Feature>
      <ogc:FeatureId fid=\"fid.32\"/>
    </wfs:Feature>
\x20\x20\x20\x20
    <wfs:Feature>
      <ogc:FeatureId fid=\"fid.1\"/>
    </wfs:Feature>
\x20\x20\x20\x20
    <wfs:Feature>
      <ogc:FeatureId fid=\"fid.4\"/>
    </wfs:Feature>
\x20\x20\x20\x20
  </wfs:InsertResults>

</wfs:WFS_TransactionResponse>";
        assert_eq!(transaction_response(&[32, 1, 4]), expected);
    }

    #[test]
    fn empty_insert_reports_zero() {
        let xml = transaction_response(&[]);
        assert!(xml.contains("<wfs:totalInserted>0</wfs:totalInserted>"));
        assert!(!xml.contains("<wfs:Feature>"));
    }
}
