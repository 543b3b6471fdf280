//! Per-product metadata enrichment.
//!
//! Products enter the store with status `found` and no footprint or size.
//! This pass looks each one up on the hub's OData endpoint, derives the
//! footprint WKT and file size, and upserts the result. Requests run
//! sequentially, one product at a time, with a progress tick after each.
//! The first failed request aborts the remaining batch.

use crate::client::MetadataFetcher;
use crate::feed::{polygon_wkt_from_coordinates, FeedEntry};
use crate::hub::Hub;
use crate::store::{MetadataStore, ProductRecord, ProductStatus};
use crate::{Result, SdmError};

/// Receives a tick after each enriched product. The default implementation
/// is silent, for library use.
pub trait ProgressReporter {
    fn tick(&self, done: usize, total: usize) {
        let _ = (done, total);
    }
}

/// Ignores all progress ticks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Fetches and stores metadata for every listed product id. Requests run
/// one at a time; the first failure aborts the remaining batch. Returns the
/// number of products enriched.
pub async fn enrich_products<F: MetadataFetcher, R: ProgressReporter>(
    fetcher: &F,
    store: &MetadataStore,
    ids: &[String],
    source: Hub,
    reporter: &R,
) -> Result<usize> {
    for (done, id) in ids.iter().enumerate() {
        let entry = fetcher.fetch_product_metadata(id).await?;
        let record = record_from_entry(&entry, id, source)?;
        store.enrich(&record).await?;
        reporter.tick(done + 1, ids.len());
    }
    Ok(ids.len())
}

/// Enriches a single product and returns its fresh record.
pub async fn enrich_product<F: MetadataFetcher>(
    fetcher: &F,
    store: &MetadataStore,
    id: &str,
    source: Hub,
) -> Result<ProductRecord> {
    let entry = fetcher.fetch_product_metadata(id).await?;
    let record = record_from_entry(&entry, id, source)?;
    store.enrich(&record).await?;
    // the store keeps first-seen title/summary, so read back
    Ok(store.get(id).await?.unwrap_or(record))
}

fn record_from_entry(entry: &FeedEntry, id: &str, source: Hub) -> Result<ProductRecord> {
    let coordinates = entry
        .coordinates
        .as_deref()
        .ok_or_else(|| SdmError::MalformedEntry(format!("product {id} has no geometry")))?;
    let file_size = entry
        .content_length
        .ok_or_else(|| SdmError::MalformedEntry(format!("product {id} has no content length")))?;

    // A missing online flag means online: EUMETSAT keeps no offline products
    // and its feeds lack the property entirely.
    let status = match entry.online {
        Some(false) => ProductStatus::Offline,
        _ => ProductStatus::Online,
    };

    Ok(ProductRecord {
        product_id: id.to_string(),
        title: entry.title.clone(),
        summary: entry.summary.clone(),
        footprint: Some(polygon_wkt_from_coordinates(coordinates)),
        file_size: Some(file_size as i64),
        source,
        status,
    })
}
