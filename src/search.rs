//! Search execution and reconciliation against the metadata store.

use crate::client::PageFetcher;
use crate::hub::Hub;
use crate::store::{MetadataStore, ProductRecord};
use crate::Result;

/// Entries per search results page.
pub const PAGE_SIZE: usize = 100;

/// Executes one page of the query and reconciles the entries against the
/// store: unseen products are inserted with status `found`, already-known
/// products are left untouched (first write wins for title and summary).
///
/// Returns `(new_count, total_count)`. An empty page yields `(0, 0)`, which
/// is the "no matches at all" signal; `(0, n)` with `n > 0` means all `n`
/// hits were already known.
pub async fn reconcile<F: PageFetcher>(
    query: &str,
    fetcher: &F,
    store: &MetadataStore,
    source: Hub,
) -> Result<(usize, usize)> {
    let entries = fetcher.fetch_page(query, 0).await?;

    let mut new_records = Vec::new();
    let mut old_count = 0;

    for entry in &entries {
        if store.exists(&entry.id).await? {
            old_count += 1;
            continue;
        }
        new_records.push(ProductRecord::found(
            &entry.id,
            &entry.title,
            &entry.summary,
            source,
        ));
    }

    // One transaction for the page: a store error commits none of it.
    store.insert_all(&new_records).await?;

    let new_count = new_records.len();
    tracing::info!(new_count, total = new_count + old_count, "search reconciled");
    Ok((new_count, new_count + old_count))
}
