//! Feed parsing for the hub APIs.
//!
//! Both the OpenSearch results page and the per-product OData lookup return
//! Atom XML. Tags are matched by local name so the namespace prefixes the two
//! hubs use (`d:`, `m:`, `gml:`) don't matter.

use roxmltree::{Document, Node};

use crate::{Result, SdmError};

/// One parsed `<entry>` from a hub feed.
///
/// Search result entries only carry id, title, and summary; the remaining
/// fields are present on per-product metadata entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Content of `<gml:coordinates>`: space-separated `lat,lon` pairs.
    pub coordinates: Option<String>,
    pub content_length: Option<u64>,
    /// Hub-reported availability. EUMETSAT feeds omit the property entirely.
    pub online: Option<bool>,
}

/// Parses a page of OpenSearch results into entries.
pub fn parse_search_page(xml: &str) -> Result<Vec<FeedEntry>> {
    let doc = Document::parse(xml)?;
    doc.descendants()
        .filter(|n| n.has_tag_name("entry"))
        .map(parse_entry)
        .collect()
}

/// Parses a per-product OData lookup, which carries exactly one entry.
pub fn parse_product_entry(xml: &str) -> Result<FeedEntry> {
    let doc = Document::parse(xml)?;
    let entry = doc
        .descendants()
        .find(|n| n.has_tag_name("entry"))
        .ok_or_else(|| SdmError::MalformedEntry("feed contains no entry".to_string()))?;
    parse_entry(entry)
}

fn parse_entry(entry: Node) -> Result<FeedEntry> {
    let id = child_text(entry, "id")
        .ok_or_else(|| SdmError::MalformedEntry("entry without id".to_string()))?;
    let title = child_text(entry, "title")
        .ok_or_else(|| SdmError::MalformedEntry("entry without title".to_string()))?;
    let summary = child_text(entry, "summary").unwrap_or_default();

    let coordinates = entry
        .descendants()
        .find(|n| n.tag_name().name() == "coordinates")
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string());

    let content_length = descendant_text(entry, "ContentLength").and_then(|t| t.parse().ok());

    let online = descendant_text(entry, "Online").map(|t| t.eq_ignore_ascii_case("true"));

    Ok(FeedEntry {
        id,
        title,
        summary,
        coordinates,
        content_length,
        online,
    })
}

fn child_text(entry: Node, name: &str) -> Option<String> {
    entry
        .children()
        .find(|n| n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
}

fn descendant_text(entry: Node, name: &str) -> Option<String> {
    entry
        .descendants()
        .find(|n| n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
}

/// Builds a WKT polygon from a GML coordinate list.
///
/// GML gives `lat,lon` pairs separated by spaces; WKT wants `lon lat` points
/// separated by commas, so each pair is reversed while assembling the ring.
pub fn polygon_wkt_from_coordinates(coordinates: &str) -> String {
    let ring: Vec<String> = coordinates
        .split_whitespace()
        .map(|pair| pair.rsplit(',').collect::<Vec<_>>().join(" "))
        .collect();
    format!("Polygon(({}))", ring.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">
  <title>Results for: platformname:Sentinel-1</title>
  <opensearch:totalResults>3</opensearch:totalResults>
  <entry>
    <title>S1A_IW_GRDH_1</title>
    <id>11111111-aaaa-bbbb-cccc-000000000001</id>
    <summary>Date: 2023-01-02, Size: 1.62 GB</summary>
  </entry>
  <entry>
    <title>S1A_IW_GRDH_2</title>
    <id>11111111-aaaa-bbbb-cccc-000000000002</id>
    <summary>Date: 2023-01-05, Size: 1.59 GB</summary>
  </entry>
  <entry>
    <title>S1A_IW_GRDH_3</title>
    <id>11111111-aaaa-bbbb-cccc-000000000003</id>
    <summary>Date: 2023-01-09, Size: 1.64 GB</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_search_page() {
        let entries = parse_search_page(SEARCH_PAGE).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "S1A_IW_GRDH_1");
        assert_eq!(entries[0].id, "11111111-aaaa-bbbb-cccc-000000000001");
        assert_eq!(entries[2].summary, "Date: 2023-01-09, Size: 1.64 GB");
        assert_eq!(entries[0].content_length, None);
        assert_eq!(entries[0].online, None);
    }

    #[test]
    fn test_parse_empty_page() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>none</title></feed>"#;
        assert!(parse_search_page(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_product_entry() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"
                            xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
                            xmlns:gml="http://www.opengis.net/gml">
          <id>33333333-eeee</id>
          <title>S3A_OL_2_WFR</title>
          <summary>Date: 2023-01-02</summary>
          <d:ContentGeometry>
            <gml:Polygon>
              <gml:outerBoundaryIs><gml:LinearRing>
                <gml:coordinates>59.0,30.0 60.0,30.0 60.0,31.0 59.0,30.0</gml:coordinates>
              </gml:LinearRing></gml:outerBoundaryIs>
            </gml:Polygon>
          </d:ContentGeometry>
          <d:ContentLength>1024</d:ContentLength>
          <d:Online>false</d:Online>
        </entry>"#;
        let entry = parse_product_entry(xml).unwrap();
        assert_eq!(entry.id, "33333333-eeee");
        assert_eq!(entry.content_length, Some(1024));
        assert_eq!(entry.online, Some(false));
        assert_eq!(
            entry.coordinates.as_deref(),
            Some("59.0,30.0 60.0,30.0 60.0,31.0 59.0,30.0")
        );
    }

    #[test]
    fn test_missing_online_property_is_none() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
          <id>44444444-ffff</id>
          <title>S3A_OL_2_WFR</title>
        </entry>"#;
        let entry = parse_product_entry(xml).unwrap();
        assert_eq!(entry.online, None);
    }

    #[test]
    fn test_entry_without_id_is_malformed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
          <entry><title>no id</title></entry>
        </feed>"#;
        assert!(matches!(
            parse_search_page(xml),
            Err(SdmError::MalformedEntry(_))
        ));
    }

    #[test]
    fn test_polygon_wkt_reverses_pairs() {
        let wkt = polygon_wkt_from_coordinates("59.0,30.0 60.0,30.0 60.0,31.0 59.0,30.0");
        assert_eq!(
            wkt,
            "Polygon((30.0 59.0,30.0 60.0,31.0 60.0,30.0 59.0))"
        );
    }
}
