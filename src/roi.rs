//! Region-of-interest resolution.
//!
//! The ROI constrains the spatial part of a search query. It can be declared
//! three ways: an inline WKT string, a text file holding WKT, or the first
//! feature of a named layer inside a GeoPackage. The first source present in
//! the configuration wins.

use std::fs;
use std::str::FromStr;

use geozero::wkb::GpkgWkb;
use geozero::ToWkt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;

use crate::config::{GeopackageRoi, RoiSpec};
use crate::{Result, SdmError};

/// Resolves the ROI spec to a WKT string usable inside a `footprint:` clause.
///
/// Fails with [`SdmError::ConfigurationMissing`] when no source is declared.
pub async fn resolve(spec: &RoiSpec) -> Result<String> {
    if let Some(wkt) = &spec.wkt {
        return Ok(wkt.clone());
    }

    if let Some(path) = &spec.file {
        let content = fs::read_to_string(path)?;
        return Ok(content.trim().to_string());
    }

    if let Some(gpkg) = &spec.geopackage {
        return read_geopackage_layer(gpkg).await;
    }

    Err(SdmError::ConfigurationMissing)
}

/// Reads the geometry of the first feature in the named GeoPackage layer.
///
/// A GeoPackage is a SQLite file; the layer's geometry column is registered
/// in `gpkg_geometry_columns` and the geometry itself is stored as
/// GeoPackage-flavoured WKB.
async fn read_geopackage_layer(gpkg: &GeopackageRoi) -> Result<String> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", gpkg.path.display()))?
        .read_only(true);
    let pool = SqlitePool::connect_with(options).await?;

    let column: String =
        sqlx::query("SELECT column_name FROM gpkg_geometry_columns WHERE table_name = ?")
            .bind(&gpkg.layer)
            .fetch_one(&pool)
            .await?
            .get("column_name");

    // Layer and column names come from the gpkg registry, not user input.
    let row = sqlx::query(&format!(
        "SELECT \"{}\" AS geom FROM \"{}\" LIMIT 1",
        column, gpkg.layer
    ))
    .fetch_one(&pool)
    .await?;
    let blob: Vec<u8> = row.get("geom");

    GpkgWkb(blob)
        .to_wkt()
        .map_err(|e| SdmError::Geometry(e.to_string()))
}
