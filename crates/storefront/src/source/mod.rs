//! Read-only product sources.
//!
//! # Architecture
//!
//! - The source is a static `products.json` document shaped as
//!   `{ "components": [Product] }`
//! - Several candidate locations (URLs or local paths) are tried in order;
//!   the first success wins. This is path resolution, not a retry policy:
//!   each location gets exactly one attempt
//! - Nothing is ever written back to the source

mod location;

pub use location::{SourceLocation, candidate_urls};

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use vexaparts_core::{Product, ProductCatalogue};

/// Errors that can occur when fetching the product source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error fetching {location}: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    /// Source answered with a non-success status.
    #[error("HTTP {status} @ {location}")]
    Status { location: String, status: u16 },

    /// Reading a local source file failed.
    #[error("I/O error reading {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Response body is not a product catalogue.
    #[error("Malformed product source at {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// No candidate locations are configured.
    #[error("No product source locations configured")]
    NoLocations,

    /// Every candidate location failed.
    #[error("All {tried} product source locations failed, last error: {last}")]
    Exhausted { tried: usize, last: Box<FetchError> },
}

/// A place the product list can be fetched from.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch the full product list.
    async fn fetch(&self) -> Result<Vec<Product>, FetchError>;
}

/// Static `products.json` source with ordered location fallback.
#[derive(Debug, Clone)]
pub struct StaticSource {
    client: reqwest::Client,
    locations: Vec<SourceLocation>,
}

impl StaticSource {
    /// Create a source over the given candidate locations.
    #[must_use]
    pub fn new(locations: Vec<SourceLocation>) -> Self {
        Self {
            client: reqwest::Client::new(),
            locations,
        }
    }

    /// Candidate locations in the order they are tried.
    #[must_use]
    pub fn locations(&self) -> &[SourceLocation] {
        &self.locations
    }

    async fn fetch_location(&self, location: &SourceLocation) -> Result<Vec<Product>, FetchError> {
        let body = match location {
            SourceLocation::Url(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .header(CACHE_CONTROL, "no-cache")
                    .send()
                    .await
                    .map_err(|source| FetchError::Http {
                        location: location.to_string(),
                        source,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        location: location.to_string(),
                        status: status.as_u16(),
                    });
                }

                response.text().await.map_err(|source| FetchError::Http {
                    location: location.to_string(),
                    source,
                })?
            }
            SourceLocation::Path(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| FetchError::Io {
                        location: location.to_string(),
                        source,
                    })?
            }
        };

        let catalogue: ProductCatalogue =
            serde_json::from_str(&body).map_err(|source| FetchError::Parse {
                location: location.to_string(),
                source,
            })?;
        Ok(catalogue.components)
    }
}

#[async_trait]
impl ProductSource for StaticSource {
    #[instrument(skip(self), fields(locations = self.locations.len()))]
    async fn fetch(&self) -> Result<Vec<Product>, FetchError> {
        let mut last_error = None;

        for location in &self.locations {
            match self.fetch_location(location).await {
                Ok(products) => {
                    debug!(%location, count = products.len(), "Products fetched");
                    return Ok(products);
                }
                Err(e) => {
                    warn!(%location, error = %e, "Product source location failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => Err(FetchError::Exhausted {
                tried: self.locations.len(),
                last: Box::new(last),
            }),
            None => Err(FetchError::NoLocations),
        }
    }
}
