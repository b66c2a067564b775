//! Admin product workspace.
//!
//! Edits are made to a working copy and only reach other sessions once
//! [`AdminWorkspace::save`] commits them through the cache manager.

use tracing::{info, instrument, warn};
use vexaparts_core::{
    Category, CategoryPriority, NoticeKind, Product, ProductDraft, ProductId, ValidationError,
};

use crate::cache::{CacheError, ProductCacheManager};
use crate::storage::StorageError;

const PENDING_SUFFIX: &str = "klik \"Wijzigingen Opslaan\" om door te voeren naar alle pagina's";

/// Category shown in the admin product list.
#[must_use]
pub fn category_of(product: &Product) -> Category {
    Category::infer(product, CategoryPriority::Admin)
}

/// Working copy of the product list for the admin panel.
pub struct AdminWorkspace {
    manager: ProductCacheManager,
    products: Vec<Product>,
    has_changes: bool,
}

impl AdminWorkspace {
    /// Open the workspace from the saved admin copy, or else from a normal
    /// cache load.
    #[instrument(skip(manager))]
    pub async fn open(manager: ProductCacheManager) -> Self {
        let products = match manager.admin_working_copy().await {
            Some(products) => products,
            None => manager.load().await,
        };
        info!(count = products.len(), "Admin workspace opened");

        Self {
            manager,
            products,
            has_changes: false,
        }
    }

    /// The working copy.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Whether the working copy has unsaved edits.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.has_changes
    }

    /// Position of a product in the working copy.
    #[must_use]
    pub fn index_of(&self, id: ProductId) -> Option<usize> {
        self.products.iter().position(|p| p.id == id)
    }

    /// Append a new product built from `draft`.
    ///
    /// The id is the current epoch time in milliseconds, bumped past any id
    /// already in use.
    ///
    /// # Errors
    ///
    /// Returns the draft's validation failure; the working copy is unchanged.
    pub fn add(&mut self, draft: ProductDraft) -> Result<&Product, ValidationError> {
        let mut id = self.manager.clock().now_millis();
        while self.products.iter().any(|p| p.id.as_i64() == id) {
            id += 1;
        }

        let product = draft
            .into_new_product(ProductId::new(id))
            .inspect_err(|e| self.reject(e))?;
        self.products.push(product);
        self.mark_changed(&format!("Product toegevoegd - {PENDING_SUFFIX}"));
        self.products.last().ok_or(ValidationError::NotFound(0))
    }

    /// Replace the editable fields of the product at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFound`] for a bad index, or the draft's
    /// validation failure.
    pub fn edit(&mut self, index: usize, draft: ProductDraft) -> Result<&Product, ValidationError> {
        let Some(previous) = self.products.get(index) else {
            let e = ValidationError::NotFound(index);
            self.reject(&e);
            return Err(e);
        };
        let updated = draft.apply_to(previous).inspect_err(|e| self.reject(e))?;

        let slot = self
            .products
            .get_mut(index)
            .ok_or(ValidationError::NotFound(index))?;
        *slot = updated;
        self.mark_changed(&format!("Product bijgewerkt - {PENDING_SUFFIX}"));
        self.products.get(index).ok_or(ValidationError::NotFound(index))
    }

    /// Remove the product at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFound`] for a bad index.
    pub fn delete(&mut self, index: usize) -> Result<Product, ValidationError> {
        if index >= self.products.len() {
            let e = ValidationError::NotFound(index);
            self.reject(&e);
            return Err(e);
        }
        let removed = self.products.remove(index);
        self.mark_changed(&format!("Product verwijderd - {PENDING_SUFFIX}"));
        Ok(removed)
    }

    /// Commit the working copy as the authoritative product list.
    ///
    /// # Errors
    ///
    /// Returns the commit failure; unsaved edits are kept.
    pub async fn save(&mut self) -> Result<(), CacheError> {
        match self.manager.commit_admin_edits(self.products.clone()).await {
            Ok(()) => {
                self.has_changes = false;
                self.notify(
                    "Wijzigingen succesvol opgeslagen en doorgevoerd naar alle pagina's",
                    NoticeKind::Success,
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Saving admin edits failed");
                self.notify("Fout bij het opslaan van wijzigingen", NoticeKind::Error);
                Err(e)
            }
        }
    }

    /// Discard all edits and reload from the product source.
    pub async fn reset(&mut self) -> &[Product] {
        self.products = self.manager.reset_to_source().await;
        self.has_changes = false;
        self.notify(
            "Producten succesvol gereset naar originele staat!",
            NoticeKind::Success,
        );
        &self.products
    }

    /// Remove all storefront data, then load products afresh.
    ///
    /// # Errors
    ///
    /// Returns the storage failure; the working copy is left as it was.
    pub async fn clear_storage(&mut self) -> Result<(), StorageError> {
        if let Err(e) = self.manager.clear_all().await {
            self.notify("Fout bij legen van opslag", NoticeKind::Error);
            return Err(e);
        }
        self.notify("Opslag geleegd", NoticeKind::Success);
        self.products = self.manager.load().await;
        self.has_changes = false;
        Ok(())
    }

    fn mark_changed(&mut self, message: &str) {
        self.has_changes = true;
        self.notify(message, NoticeKind::Success);
    }

    fn reject(&self, error: &ValidationError) {
        let message = match error {
            ValidationError::NonPositivePrice => "Prijs moet groter zijn dan 0",
            ValidationError::NotFound(_) => "Product niet gevonden",
            _ => "Vul alle verplichte velden in",
        };
        self.notify(message, NoticeKind::Error);
    }

    fn notify(&self, message: &str, kind: NoticeKind) {
        self.manager.notifier().notify(message, kind);
    }
}
