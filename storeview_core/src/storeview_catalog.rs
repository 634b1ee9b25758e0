//! Product descriptors joined with their planogram positions.

use crate::geometry::Position;
use crate::storeview_planogram::PlanogramIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use storeview_env::{CatalogRecord, RecordStore, StoreError};
use tracing::debug;

/// Catalog fields plus the plates the product occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductExtended {
    pub barcode_type: String,
    pub barcode: String,
    pub name: String,
    pub thumbnail: String,
    pub price: f64,
    pub weight: f64,

    /// Plates holding this product; empty for products that are not shelved
    pub positions: Vec<Position>,
}

impl ProductExtended {
    fn from_catalog(record: CatalogRecord, positions: Vec<Position>) -> Self {
        Self {
            barcode_type: record.product_id.barcode_type,
            barcode: record.product_id.barcode,
            name: record.name,
            thumbnail: record.thumbnail,
            price: record.price,
            weight: record.weight,
            positions,
        }
    }
}

impl fmt::Display for ProductExtended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product(barcode_type={}, barcode={}, name={}, thumbnail={}, price={:.2}, weight={:.2}, positions=[",
            self.barcode_type, self.barcode, self.name, self.thumbnail, self.price, self.weight
        )?;
        for (i, position) in self.positions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{position}")?;
        }
        write!(f, "])")
    }
}

/// Memoizes [`ProductExtended`] lookups for the life of the cache.
///
/// Entries are added on first resolution and never evicted or refreshed, so
/// later catalog changes are not observed.
#[derive(Debug, Default)]
pub struct ProductPositionCache {
    products: HashMap<String, Arc<ProductExtended>>,
}

impl ProductPositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a product identifier to its descriptor.
    ///
    /// The first call queries the catalog and the planogram; later calls
    /// return the same shared instance.
    ///
    /// # Errors
    /// `NotFound` if the catalog has no record. A cataloged product with no
    /// planogram positions is not an error.
    pub fn resolve<S: RecordStore>(
        &mut self,
        product_id: &str,
        catalog: &S,
        planogram: &PlanogramIndex,
    ) -> Result<Arc<ProductExtended>, CatalogError> {
        if let Some(product) = self.products.get(product_id) {
            return Ok(Arc::clone(product));
        }

        let record = catalog
            .catalog_record(product_id)?
            .ok_or_else(|| CatalogError::NotFound(product_id.to_string()))?;

        let positions = planogram
            .positions_of(&record.product_id.barcode)
            .map(<[Position]>::to_vec)
            .unwrap_or_default();
        debug!(
            "Resolved product {} ({}) on {} plates",
            product_id,
            record.name,
            positions.len()
        );

        let product = Arc::new(ProductExtended::from_catalog(record, positions));
        self.products
            .insert(product_id.to_string(), Arc::clone(&product));
        Ok(product)
    }

    /// A previously resolved product, without touching the catalog.
    pub fn cached(&self, product_id: &str) -> Option<Arc<ProductExtended>> {
        self.products.get(product_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Errors that can occur while resolving products.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Product not found in catalog: {0}")]
    NotFound(String),

    #[error("Catalog query failed: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storeview_planogram::StoreDimensions;
    use storeview_env::{CatalogProductId, LayoutRecord, MemoryStore, Placement, PlateId, ProductRef};

    fn catalog_record(id: &str, name: &str, price: f64) -> CatalogRecord {
        CatalogRecord {
            product_id: CatalogProductId {
                id: id.to_string(),
                barcode_type: "EAN13".to_string(),
                barcode: id.to_string(),
            },
            name: name.to_string(),
            thumbnail: format!("{id}.png"),
            price,
            weight: 355.0,
        }
    }

    fn planogram() -> PlanogramIndex {
        let records = vec![LayoutRecord {
            planogram_product_id: ProductRef {
                id: "0001".to_string(),
            },
            plate_ids: vec![PlateId::new(1, 1, 1), PlateId::new(1, 1, 2)],
            global_coordinates: Placement::default(),
        }];
        PlanogramIndex::build(&records, StoreDimensions::default()).unwrap()
    }

    #[test]
    fn test_resolve_joins_positions() {
        let mut store = MemoryStore::default();
        store.upsert_product(catalog_record("0001", "Cola", 1.25));

        let mut cache = ProductPositionCache::new();
        let product = cache.resolve("0001", &store, &planogram()).unwrap();

        assert_eq!(product.name, "Cola");
        assert_eq!(product.weight, 355.0);
        assert_eq!(
            product.positions,
            vec![Position::new(1, 1, 1), Position::new(1, 1, 2)]
        );
    }

    #[test]
    fn test_resolve_is_memoized() {
        let mut store = MemoryStore::default();
        store.upsert_product(catalog_record("0001", "Cola", 1.25));
        let planogram = planogram();

        let mut cache = ProductPositionCache::new();
        let first = cache.resolve("0001", &store, &planogram).unwrap();

        store.upsert_product(catalog_record("0001", "Renamed", 9.99));
        let second = cache.resolve("0001", &store, &planogram).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.name, "Cola");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unshelved_product_has_no_positions() {
        let mut store = MemoryStore::default();
        store.upsert_product(catalog_record("0002", "Gum", 0.5));

        let mut cache = ProductPositionCache::new();
        let product = cache.resolve("0002", &store, &planogram()).unwrap();
        assert!(product.positions.is_empty());
    }

    #[test]
    fn test_unknown_product_is_not_cached() {
        let store = MemoryStore::default();
        let mut cache = ProductPositionCache::new();

        let result = cache.resolve("9999", &store, &planogram());
        assert!(matches!(result, Err(CatalogError::NotFound(id)) if id == "9999"));
        assert!(cache.is_empty());
        assert!(cache.cached("9999").is_none());
    }

    #[test]
    fn test_display_lists_positions() {
        let product = ProductExtended {
            barcode_type: "UPC".to_string(),
            barcode: "1".to_string(),
            name: "Tea".to_string(),
            thumbnail: String::new(),
            price: 2.0,
            weight: 50.0,
            positions: vec![Position::new(1, 2, 3)],
        };
        assert_eq!(
            product.to_string(),
            "Product(barcode_type=UPC, barcode=1, name=Tea, thumbnail=, price=2.00, weight=50.00, positions=[Position(gondola=1, shelf=2, plate=3)])"
        );
    }
}
