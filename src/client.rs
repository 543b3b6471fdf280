//! HTTP transport against the hub APIs.

use reqwest::{Client, RequestBuilder, Response};
use url::Url;

use crate::auth::Credentials;
use crate::feed::{self, FeedEntry};
use crate::hub::Hub;
use crate::search::PAGE_SIZE;
use crate::{Result, SdmError};

/// Capability yielding parsed result entries for a query and paging offset.
/// Abstracts the HTTP and feed-parsing boundary so reconciliation can be
/// tested against canned pages.
pub trait PageFetcher {
    async fn fetch_page(&self, query: &str, offset: usize) -> Result<Vec<FeedEntry>>;
}

/// Capability yielding the parsed metadata entry for a single product, the
/// per-product counterpart of [`PageFetcher`].
pub trait MetadataFetcher {
    async fn fetch_product_metadata(&self, id: &str) -> Result<FeedEntry>;
}

/// Authenticated client for one hub.
pub struct HubClient {
    http: Client,
    hub: Hub,
    credentials: Credentials,
}

impl HubClient {
    pub fn new(hub: Hub, credentials: Credentials) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            hub,
            credentials,
        })
    }

    fn authenticated(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.credentials.user, Some(&self.credentials.password))
    }

    /// Sends the request and maps a non-success status to
    /// [`SdmError::RequestFailed`].
    async fn send_checked(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.authenticated(builder).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SdmError::RequestFailed {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unknown reason")
                    .to_string(),
            });
        }
        Ok(response)
    }

    /// Opens a streaming response for the product archive itself.
    pub async fn open_product_stream(&self, id: &str) -> Result<Response> {
        let url = self.hub.product_download_url(id);
        tracing::debug!(%url, "starting product download");
        self.send_checked(self.http.get(url)).await
    }
}

impl MetadataFetcher for HubClient {
    /// Per-product OData metadata lookup.
    async fn fetch_product_metadata(&self, id: &str) -> Result<FeedEntry> {
        let url = self.hub.product_url(id);
        tracing::debug!(%url, "fetching product metadata");
        let response = self.send_checked(self.http.get(url)).await?;
        let body = response.text().await?;
        feed::parse_product_entry(&body)
    }
}

impl PageFetcher for HubClient {
    async fn fetch_page(&self, query: &str, offset: usize) -> Result<Vec<FeedEntry>> {
        let url = Url::parse_with_params(
            self.hub.search_url(),
            &[
                ("q", query),
                ("rows", &PAGE_SIZE.to_string()),
                ("start", &offset.to_string()),
            ],
        )?;
        tracing::debug!(%url, "executing search request");
        let response = self.send_checked(self.http.get(url)).await?;
        let body = response.text().await?;
        feed::parse_search_page(&body)
    }
}
