use std::fmt;

/// The data hub a product was found on. EUMETSAT mirrors Sentinel-3 ocean
/// products that never show up on the Copernicus hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hub {
    Copernicus,
    Eumetsat,
}

impl Hub {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hub::Copernicus => "copernicus",
            Hub::Eumetsat => "eumetsat",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "copernicus" => Some(Hub::Copernicus),
            "eumetsat" => Some(Hub::Eumetsat),
            _ => None,
        }
    }

    /// Root OpenSearch URL of the hub.
    pub fn search_url(&self) -> &'static str {
        match self {
            Hub::Copernicus => "https://scihub.copernicus.eu/dhus/search",
            Hub::Eumetsat => "https://coda.eumetsat.int/search",
        }
    }

    fn odata_url(&self) -> &'static str {
        match self {
            Hub::Copernicus => "https://scihub.copernicus.eu/dhus/odata/v1/",
            Hub::Eumetsat => "https://coda.eumetsat.int/odata/v1/",
        }
    }

    /// OData URL returning the metadata entry for a product.
    pub fn product_url(&self, id: &str) -> String {
        format!("{}Products('{}')/", self.odata_url(), id)
    }

    /// URL streaming the product archive itself.
    pub fn product_download_url(&self, id: &str) -> String {
        format!("{}$value", self.product_url(id))
    }
}

impl fmt::Display for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_url() {
        let url = Hub::Copernicus.product_url("abc-123");
        assert_eq!(
            url,
            "https://scihub.copernicus.eu/dhus/odata/v1/Products('abc-123')/"
        );
    }

    #[test]
    fn test_download_url_appends_value() {
        let url = Hub::Eumetsat.product_download_url("abc-123");
        assert_eq!(
            url,
            "https://coda.eumetsat.int/odata/v1/Products('abc-123')/$value"
        );
    }

    #[test]
    fn test_roundtrip_str() {
        for hub in [Hub::Copernicus, Hub::Eumetsat] {
            assert_eq!(Hub::from_str(hub.as_str()), Some(hub));
        }
        assert_eq!(Hub::from_str("scihub"), None);
    }
}
