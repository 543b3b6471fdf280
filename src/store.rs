//! SQLite-backed product metadata store.
//!
//! One table keyed by product id. Search reconciliation inserts rows with
//! status `found` and empty footprint/size; the enrichment pass fills those
//! in later. Rows are never deleted except by an explicit purge.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::hub::Hub;
use crate::{Result, SdmError};

/// Hub-reported availability of a product, not its local download state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    /// Seen in a search result, metadata not yet fetched.
    Found,
    Online,
    Offline,
    Requested,
    Downloaded,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Found => "found",
            ProductStatus::Online => "online",
            ProductStatus::Offline => "offline",
            ProductStatus::Requested => "requested",
            ProductStatus::Downloaded => "downloaded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "found" => Some(ProductStatus::Found),
            "online" => Some(ProductStatus::Online),
            "offline" => Some(ProductStatus::Offline),
            "requested" => Some(ProductStatus::Requested),
            "downloaded" => Some(ProductStatus::Downloaded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub product_id: String,
    pub title: String,
    pub summary: String,
    pub footprint: Option<String>,
    pub file_size: Option<i64>,
    pub source: Hub,
    pub status: ProductStatus,
}

impl ProductRecord {
    /// A record as first sighted by the search reconciler.
    pub fn found(id: &str, title: &str, summary: &str, source: Hub) -> Self {
        Self {
            product_id: id.to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
            footprint: None,
            file_size: None,
            source,
            status: ProductStatus::Found,
        }
    }
}

pub struct MetadataStore {
    pool: SqlitePool,
}

impl MetadataStore {
    /// Opens (and if necessary creates) the store at the given path.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", path.as_ref().display()))?
                .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// An in-memory store, used by tests. Pinned to a single connection so
    /// every query sees the same database.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS products (
                product_id TEXT PRIMARY KEY,
                title TEXT UNIQUE,
                summary TEXT,
                footprint_wkt TEXT,
                file_size INTEGER,
                source TEXT NOT NULL,
                status TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM products WHERE product_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn insert(&self, record: &ProductRecord) -> Result<()> {
        self.insert_all(std::slice::from_ref(record)).await
    }

    /// Inserts every record inside one transaction: either the whole batch
    /// lands or none of it does.
    pub async fn insert_all(&self, records: &[ProductRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                "INSERT INTO products (product_id, title, summary, footprint_wkt, file_size, source, status)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&record.product_id)
            .bind(&record.title)
            .bind(&record.summary)
            .bind(&record.footprint)
            .bind(record.file_size)
            .bind(record.source.as_str())
            .bind(record.status.as_str())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<ProductRecord>> {
        let row = sqlx::query("SELECT * FROM products WHERE product_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(record_from_row).transpose()
    }

    pub async fn find_by_title(&self, title: &str) -> Result<Option<ProductRecord>> {
        let row = sqlx::query("SELECT * FROM products WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        row.map(record_from_row).transpose()
    }

    /// Inserts the record, or updates footprint, size, and status of an
    /// existing row. Title and summary are immutable once written.
    pub async fn enrich(&self, record: &ProductRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (product_id, title, summary, footprint_wkt, file_size, source, status)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(product_id) DO UPDATE SET
                footprint_wkt = excluded.footprint_wkt,
                file_size = excluded.file_size,
                status = excluded.status",
        )
        .bind(&record.product_id)
        .bind(&record.title)
        .bind(&record.summary)
        .bind(&record.footprint)
        .bind(record.file_size)
        .bind(record.source.as_str())
        .bind(record.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_by_status(
        &self,
        status: ProductStatus,
        source: Hub,
    ) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query("SELECT * FROM products WHERE status = ? AND source = ?")
            .bind(status.as_str())
            .bind(source.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(record_from_row).collect()
    }

    /// Deletes every record. Returns the number of rows removed.
    pub async fn purge(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM products")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn record_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ProductRecord> {
    let source: String = row.get("source");
    let status: String = row.get("status");
    Ok(ProductRecord {
        product_id: row.get("product_id"),
        title: row.get("title"),
        summary: row.get("summary"),
        footprint: row.get("footprint_wkt"),
        file_size: row.get("file_size"),
        source: Hub::from_str(&source)
            .ok_or_else(|| SdmError::MalformedEntry(format!("unknown source '{source}'")))?,
        status: ProductStatus::from_str(&status)
            .ok_or_else(|| SdmError::MalformedEntry(format!("unknown status '{status}'")))?,
    })
}
