//! Integration tests for the Vexaparts storefront.
//!
//! Each test runs a [`ProductCacheManager`] over a directory-backed store
//! against a mock HTTP product source.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vexaparts-integration-tests
//! ```

use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;
use vexaparts_storefront::ProductCacheManager;
use vexaparts_storefront::cache::ManualClock;
use vexaparts_storefront::notify::CollectingNotifier;
use vexaparts_storefront::source::{SourceLocation, StaticSource};
use vexaparts_storefront::storage::{FileStore, KeyValueStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Epoch milliseconds the test clock starts at.
pub const START: i64 = 1_760_000_000_000;

/// Path the mock source serves the catalogue on.
pub const SOURCE_PATH: &str = "/products.json";

/// A catalogue document with `count` products numbered from 1.
#[must_use]
pub fn catalogue(count: i64) -> Value {
    let components = (1..=count)
        .map(|id| {
            json!({
                "id": id,
                "name": format!("Component {id}"),
                "category": "cpu",
                "price": 100.0 + f64::from(u32::try_from(id).unwrap_or(0)),
                "image": format!("img/{id}.png"),
                "amount": 5,
                "specifications": {"socket": "AM5"}
            })
        })
        .collect::<Vec<_>>();
    json!({ "components": components })
}

/// Everything a cache protocol test needs.
pub struct Harness {
    pub server: MockServer,
    pub dir: TempDir,
    pub store: Arc<FileStore>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<CollectingNotifier>,
}

impl Harness {
    /// Start a mock server and an empty store directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub async fn start() -> Self {
        #[allow(clippy::expect_used)]
        let dir = tempfile::tempdir().expect("temporary store directory");
        let store = Arc::new(FileStore::new(dir.path()));
        Self {
            server: MockServer::start().await,
            dir,
            store,
            clock: Arc::new(ManualClock::new(START)),
            notifier: Arc::new(CollectingNotifier::new()),
        }
    }

    /// Serve `body` at [`SOURCE_PATH`], expecting exactly `times` requests.
    pub async fn serve(&self, body: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path(SOURCE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Answer every source request with a server error.
    pub async fn fail(&self) {
        Mock::given(method("GET"))
            .and(path(SOURCE_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.server)
            .await;
    }

    /// A fresh manager over the shared store, as a new page load would see.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid URL.
    #[must_use]
    pub fn manager(&self) -> ProductCacheManager {
        #[allow(clippy::expect_used)]
        let url = format!("{}{SOURCE_PATH}", self.server.uri())
            .parse()
            .expect("mock server url");
        let source = StaticSource::new(vec![SourceLocation::Url(url)]);
        let store: Arc<dyn KeyValueStore> = self.store.clone();
        ProductCacheManager::builder(store, Arc::new(source))
            .notifier(self.notifier.clone())
            .clock(self.clock.clone())
            .build()
    }
}
