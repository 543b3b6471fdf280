//! OpenSearch query generation.
//!
//! Pure assembly of the hub query string from the declarative search spec.
//! Each requested mission contributes one clause; multiple clauses are
//! parenthesized and OR-joined in mission order. The hub grammar treats a
//! bare space between terms as a conjunction, which the cloud cover term
//! relies on.

use crate::config::{SearchSpec, Sentinel1Params, Sentinel2Params, Sentinel3Params};

/// Which missions to include in the generated query.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissionSelection {
    pub s1: bool,
    pub s2: bool,
    pub s3: bool,
}

impl MissionSelection {
    pub fn all() -> Self {
        Self {
            s1: true,
            s2: true,
            s3: true,
        }
    }

    /// Selects every mission the spec carries a parameter block for.
    pub fn from_spec(spec: &SearchSpec) -> Self {
        Self {
            s1: spec.sentinel1.is_some(),
            s2: spec.sentinel2.is_some(),
            s3: spec.sentinel3.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.s1 || self.s2 || self.s3)
    }
}

/// Builds the full query for the selected missions.
///
/// A selected mission without a parameter block contributes nothing.
/// Returns `None` when no clause could be built.
pub fn build_query(spec: &SearchSpec, roi: &str, selection: MissionSelection) -> Option<String> {
    let (start, end) = spec.date_range();

    let mut clauses: Vec<String> = Vec::new();

    if selection.s1 {
        if let Some(params) = &spec.sentinel1 {
            clauses.push(sentinel1_clause(params, roi, &start, &end));
        }
    }
    if selection.s2 {
        if let Some(params) = &spec.sentinel2 {
            clauses.push(sentinel2_clause(params, roi, &start, &end));
        }
    }
    if selection.s3 {
        if let Some(params) = &spec.sentinel3 {
            clauses.push(sentinel3_clause(params, roi, &start, &end));
        }
    }

    match clauses.len() {
        0 => None,
        1 => Some(clauses.remove(0)),
        _ => {
            let wrapped: Vec<String> = clauses.iter().map(|c| format!("({c})")).collect();
            Some(wrapped.join(" OR "))
        }
    }
}

fn beginposition(start: &str, end: &str) -> String {
    format!("beginposition:[{start}T00:00:00.000Z TO {end}T23:59:59.999Z]")
}

fn footprint(roi: &str) -> String {
    format!("footprint:\"Intersects({roi})\"")
}

fn sentinel1_clause(params: &Sentinel1Params, roi: &str, start: &str, end: &str) -> String {
    format!(
        "platformname:Sentinel-1 AND {} AND {} AND {} AND {}",
        params.sensor_mode,
        params.product_type,
        beginposition(start, end),
        footprint(roi)
    )
}

fn sentinel2_clause(params: &Sentinel2Params, roi: &str, start: &str, end: &str) -> String {
    let mut query = format!(
        "platformname:Sentinel-2 AND producttype:{} AND {}",
        params.product_type,
        beginposition(start, end)
    );

    if let Some(max) = params.max_cloud_cover {
        // implicit conjunction
        query.push_str(&format!(" cloudcoverpercentage:[0 TO {max}]"));
    }

    // An explicit tile list replaces the spatial filter.
    match params.tiles.as_deref() {
        Some([tile]) => query.push_str(&format!(" AND filename:*{tile}*")),
        Some(tiles) if !tiles.is_empty() => {
            let terms: Vec<String> = tiles.iter().map(|t| format!("filename:*{t}*")).collect();
            query.push_str(&format!(" AND ({})", terms.join(" OR ")));
        }
        _ => query.push_str(&format!(" AND {}", footprint(roi))),
    }

    query
}

fn sentinel3_clause(params: &Sentinel3Params, roi: &str, start: &str, end: &str) -> String {
    let instruments = match params.instruments.as_slice() {
        [instrument] => format!("instrumentshortname:{instrument}"),
        many => {
            let terms: Vec<String> = many
                .iter()
                .map(|i| format!("instrumentshortname:{i}"))
                .collect();
            format!("({})", terms.join(" OR "))
        }
    };

    format!(
        "platformname:Sentinel-3 AND {} AND {} AND productlevel:{} AND {}",
        beginposition(start, end),
        instruments,
        params.product_level,
        footprint(roi)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoiSpec;

    const ROI: &str = "Polygon((...))";

    fn spec() -> SearchSpec {
        SearchSpec {
            start_date: "2023-01-01".to_string(),
            end_date: "2023-01-31".to_string(),
            roi: RoiSpec::default(),
            sentinel1: Some(Sentinel1Params {
                sensor_mode: "IW".to_string(),
                product_type: "GRD".to_string(),
            }),
            sentinel2: Some(Sentinel2Params {
                product_type: "S2MSI2A".to_string(),
                max_cloud_cover: None,
                tiles: None,
            }),
            sentinel3: Some(Sentinel3Params {
                instruments: vec!["OLCI".to_string()],
                product_level: "L2".to_string(),
            }),
        }
    }

    #[test]
    fn test_no_missions_selected_yields_none() {
        assert_eq!(build_query(&spec(), ROI, MissionSelection::default()), None);
    }

    #[test]
    fn test_selected_mission_without_params_yields_none() {
        let mut spec = spec();
        spec.sentinel1 = None;
        let selection = MissionSelection {
            s1: true,
            s2: false,
            s3: false,
        };
        assert_eq!(build_query(&spec, ROI, selection), None);
    }

    #[test]
    fn test_single_mission_clause_is_unparenthesized() {
        let selection = MissionSelection {
            s1: true,
            s2: false,
            s3: false,
        };
        let query = build_query(&spec(), ROI, selection).unwrap();
        assert_eq!(
            query,
            "platformname:Sentinel-1 AND IW AND GRD AND \
             beginposition:[2023-01-01T00:00:00.000Z TO 2023-01-31T23:59:59.999Z] AND \
             footprint:\"Intersects(Polygon((...)))\""
        );
    }

    #[test]
    fn test_two_missions_are_parenthesized_and_or_joined() {
        let selection = MissionSelection {
            s1: true,
            s2: false,
            s3: true,
        };
        let query = build_query(&spec(), ROI, selection).unwrap();
        assert!(query.starts_with("(platformname:Sentinel-1"));
        assert!(query.contains(") OR (platformname:Sentinel-3"));
        assert!(query.ends_with(')'));
    }

    #[test]
    fn test_three_missions_keep_mission_order() {
        let query = build_query(&spec(), ROI, MissionSelection::all()).unwrap();
        let s1 = query.find("Sentinel-1").unwrap();
        let s2 = query.find("Sentinel-2").unwrap();
        let s3 = query.find("Sentinel-3").unwrap();
        assert!(s1 < s2 && s2 < s3);
        assert_eq!(query.matches(" OR (platformname:").count(), 2);
    }

    #[test]
    fn test_sentinel2_without_tiles_uses_footprint() {
        let selection = MissionSelection {
            s1: false,
            s2: true,
            s3: false,
        };
        let query = build_query(&spec(), ROI, selection).unwrap();
        assert!(query.contains("footprint:\"Intersects(Polygon((...)))\""));
        assert!(!query.contains("filename:"));
    }

    #[test]
    fn test_sentinel2_single_tile_suppresses_footprint() {
        let mut spec = spec();
        spec.sentinel2.as_mut().unwrap().tiles = Some(vec!["35VLG".to_string()]);
        let selection = MissionSelection {
            s1: false,
            s2: true,
            s3: false,
        };
        let query = build_query(&spec, ROI, selection).unwrap();
        assert!(query.ends_with("AND filename:*35VLG*"));
        assert!(!query.contains("footprint:"));
    }

    #[test]
    fn test_sentinel2_tile_list_is_or_grouped() {
        let mut spec = spec();
        spec.sentinel2.as_mut().unwrap().tiles =
            Some(vec!["35VLG".to_string(), "35VMG".to_string()]);
        let selection = MissionSelection {
            s1: false,
            s2: true,
            s3: false,
        };
        let query = build_query(&spec, ROI, selection).unwrap();
        assert!(query.ends_with("AND (filename:*35VLG* OR filename:*35VMG*)"));
        assert!(!query.contains("footprint:"));
    }

    #[test]
    fn test_sentinel2_empty_tile_list_falls_back_to_footprint() {
        let mut spec = spec();
        spec.sentinel2.as_mut().unwrap().tiles = Some(vec![]);
        let selection = MissionSelection {
            s1: false,
            s2: true,
            s3: false,
        };
        let query = build_query(&spec, ROI, selection).unwrap();
        assert!(query.contains("footprint:"));
        assert!(!query.contains("filename:"));
    }

    #[test]
    fn test_sentinel2_cloud_cover_term() {
        let mut spec = spec();
        spec.sentinel2.as_mut().unwrap().max_cloud_cover = Some(30);
        let selection = MissionSelection {
            s1: false,
            s2: true,
            s3: false,
        };
        let query = build_query(&spec, ROI, selection).unwrap();
        assert!(query.contains("] cloudcoverpercentage:[0 TO 30] AND "));
    }

    #[test]
    fn test_sentinel3_single_instrument_term() {
        let selection = MissionSelection {
            s1: false,
            s2: false,
            s3: true,
        };
        let query = build_query(&spec(), ROI, selection).unwrap();
        assert!(query.contains("AND instrumentshortname:OLCI AND productlevel:L2"));
    }

    #[test]
    fn test_sentinel3_instrument_or_group() {
        let mut spec = spec();
        spec.sentinel3.as_mut().unwrap().instruments =
            vec!["OLCI".to_string(), "SLSTR".to_string()];
        let selection = MissionSelection {
            s1: false,
            s2: false,
            s3: true,
        };
        let query = build_query(&spec, ROI, selection).unwrap();
        assert!(query.contains("AND (instrumentshortname:OLCI OR instrumentshortname:SLSTR) AND"));
    }

    #[test]
    fn test_selection_from_spec() {
        let mut spec = spec();
        spec.sentinel2 = None;
        let selection = MissionSelection::from_spec(&spec);
        assert!(selection.s1 && !selection.s2 && selection.s3);
    }
}
