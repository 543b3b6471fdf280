use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use toml;

use crate::{Result, SdmError};

/// The `sdm-config.toml` file, validated once at load time.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    pub search: SearchSpec,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SearchSpec {
    pub start_date: String,
    /// End of the date range, or "today".
    pub end_date: String,
    pub roi: RoiSpec,
    pub sentinel1: Option<Sentinel1Params>,
    pub sentinel2: Option<Sentinel2Params>,
    pub sentinel3: Option<Sentinel3Params>,
}

/// Declarative ROI source. The first field present wins; a spec with none
/// set cannot be resolved.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct RoiSpec {
    pub wkt: Option<String>,
    pub file: Option<PathBuf>,
    pub geopackage: Option<GeopackageRoi>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GeopackageRoi {
    pub path: PathBuf,
    pub layer: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Sentinel1Params {
    pub sensor_mode: String,
    pub product_type: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Sentinel2Params {
    pub product_type: String,
    pub max_cloud_cover: Option<u8>,
    /// Explicit tile list. When set, the spatial filter is skipped.
    pub tiles: Option<Vec<String>>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Sentinel3Params {
    pub instruments: Vec<String>,
    pub product_level: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct AuthConfig {
    pub copernicus: Option<HubAuth>,
    pub eumetsat: Option<HubAuth>,
}

/// Credential sources for one hub, tried in field order.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct HubAuth {
    /// Environment variable holding `user:password`.
    pub env: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// File holding `user:password` on its first line.
    pub file: Option<PathBuf>,
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SdmError::ConfigurationMissing)
            }
            Err(e) => return Err(e.into()),
        };
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn write_template<P: AsRef<Path>>(path: P) -> Result<()> {
        fs::write(path, template().to_string())?;
        Ok(())
    }
}

impl SearchSpec {
    /// Resolves the configured date range. The "today" sentinel is resolved
    /// against the calendar date at call time, so a cached query string built
    /// from it can go stale.
    pub fn date_range(&self) -> (String, String) {
        let end = if self.end_date == "today" {
            Utc::now().date_naive().format("%Y-%m-%d").to_string()
        } else {
            self.end_date.clone()
        };
        (self.start_date.clone(), end)
    }
}

fn template() -> toml::Table {
    toml::toml! {
        [search]
        start_date = "2023-01-01"
        end_date = "today"

        [search.roi]
        wkt = "Polygon ((30.440 59.993, 30.023 59.993, 30.023 59.825, 30.440 59.825, 30.440 59.993))"
        // file = "roi.wkt"
        // geopackage = { path = "Data/roi.gpkg", layer = "roi" }

        [search.sentinel1]
        sensor_mode = "IW"
        product_type = "GRD"

        [search.sentinel2]
        product_type = "S2MSI2A"
        max_cloud_cover = 30
        // tiles = ["35VLG", "35VMG"]

        [search.sentinel3]
        instruments = ["OLCI"]
        product_level = "L2"

        [auth.copernicus]
        env = "SDM_COPERNICUS_AUTH"
        user = "<your-copernicus-username>"
        password = "<your-copernicus-password>"
        file = "<file-with-copernicus-authentication>"

        [auth.eumetsat]
        env = "SDM_EUMETSAT_AUTH"
        user = "<your-eumetsat-username>"
        password = "<your-eumetsat-password>"
        file = "<file-with-eumetsat-authentication>"
    }
}
