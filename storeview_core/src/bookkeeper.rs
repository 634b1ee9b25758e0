//! BookKeeper - Owns the built StoreView engines for one store.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          BookKeeper                           │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │ RecordStore (layout, topology, catalog, sensor records) │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │        │ build()            │ build()           │ per query   │
//! │  ┌─────▼─────┐      ┌───────▼──────┐     ┌──────▼─────────┐   │
//! │  │ PLANOGRAM │      │   TOPOLOGY   │     │     EVENTS     │   │
//! │  │   Index   │      │   Resolver   │     │   Aggregator   │   │
//! │  └─────┬─────┘      └──────────────┘     └────────────────┘   │
//! │  ┌─────▼──────────────┐                                        │
//! │  │ ProductPosition    │                                        │
//! │  │ Cache              │                                        │
//! │  └────────────────────┘                                        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is built eagerly by [`BookKeeper::build`]; there is no lazy
//! first-access initialization. [`BookKeeper::rebuild`] is the only way to
//! pick up changed layout or topology records.
//!
//! # Usage
//!
//! ```ignore
//! use storeview_core::{BookKeeper, BookKeeperConfig, Position};
//! use storeview_env::{EventWindow, MemoryStore};
//!
//! let store = MemoryStore::load("store.json")?;
//! let mut keeper = BookKeeper::build(store, BookKeeperConfig::default())?;
//!
//! let product = keeper.product_at_plate(Position::new(1, 2, 3))?;
//! let targets = keeper.targets_for_event(&EventWindow::new(10.0, 12.0))?;
//! ```

use crate::geometry::{Coordinates, Position};
use crate::storeview_catalog::{CatalogError, ProductExtended, ProductPositionCache};
use crate::storeview_events::{EventError, EventWindowAggregator, Frame, Target};
use crate::storeview_planogram::{PlanogramError, PlanogramIndex, StoreDimensions};
use crate::storeview_topology::{CoordinateResolver, TopologyError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use storeview_env::{
    CameraId, EventWindow, FrameDecoder, ImageCrateDecoder, RecordStore, StoreError,
};
use tracing::info;

/// Configuration for a BookKeeper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookKeeperConfig {
    /// Extent of the dense plate array (default: 5 gondolas × 6 shelves × 12 plates)
    pub dimensions: StoreDimensions,
}

impl BookKeeperConfig {
    /// Reads a JSON config; absent fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Indexed view of one store's layout and sensor records.
pub struct BookKeeper<S: RecordStore, D: FrameDecoder = ImageCrateDecoder> {
    store: S,
    decoder: D,
    config: BookKeeperConfig,
    planogram: PlanogramIndex,
    topology: CoordinateResolver,
    products: ProductPositionCache,
}

impl<S: RecordStore> BookKeeper<S, ImageCrateDecoder> {
    /// Build with the `image`-crate frame decoder.
    pub fn build(store: S, config: BookKeeperConfig) -> Result<Self, BookKeeperError> {
        Self::build_with_decoder(store, ImageCrateDecoder::new(), config)
    }
}

impl<S: RecordStore, D: FrameDecoder> BookKeeper<S, D> {
    /// Query the layout and topology collections and build every index.
    ///
    /// All-or-nothing: any malformed layout record fails the whole build.
    pub fn build_with_decoder(
        store: S,
        decoder: D,
        config: BookKeeperConfig,
    ) -> Result<Self, BookKeeperError> {
        let (planogram, topology) = Self::build_indices(&store, &config)?;
        info!("BookKeeper ready ({:?})", config.dimensions);

        Ok(Self {
            store,
            decoder,
            config,
            planogram,
            topology,
            products: ProductPositionCache::new(),
        })
    }

    fn build_indices(
        store: &S,
        config: &BookKeeperConfig,
    ) -> Result<(PlanogramIndex, CoordinateResolver), BookKeeperError> {
        let layout = store.layout_records()?;
        let planogram = PlanogramIndex::build(&layout, config.dimensions)?;
        let topology = CoordinateResolver::from_store(store)?;
        Ok((planogram, topology))
    }

    /// Discard every index and the product cache, then build again from the store.
    ///
    /// On failure the previous state is kept.
    pub fn rebuild(&mut self) -> Result<(), BookKeeperError> {
        let (planogram, topology) = Self::build_indices(&self.store, &self.config)?;
        self.planogram = planogram;
        self.topology = topology;
        self.products = ProductPositionCache::new();
        Ok(())
    }

    pub fn config(&self) -> &BookKeeperConfig {
        &self.config
    }

    pub fn planogram(&self) -> &PlanogramIndex {
        &self.planogram
    }

    pub fn topology(&self) -> &CoordinateResolver {
        &self.topology
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable store access. Built indices and cached products are not refreshed.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ========================================================================
    // PLANOGRAM
    // ========================================================================

    pub fn products_on_aisle(&self, gondola: u32, shelf: u32) -> Result<Vec<&str>, PlanogramError> {
        self.planogram.products_on_aisle(gondola, shelf)
    }

    pub fn product_at_plate(&self, position: Position) -> Result<Option<&str>, PlanogramError> {
        self.planogram.product_at_plate(position)
    }

    pub fn positions_of(&self, product_id: &str) -> Result<&[Position], PlanogramError> {
        self.planogram.positions_of(product_id)
    }

    pub fn representative_position(&self, product_id: &str) -> Option<Position> {
        self.planogram.representative_position(product_id)
    }

    pub fn coordinates_of(&self, product_id: &str) -> Result<Coordinates, PlanogramError> {
        self.planogram.coordinates_of(product_id)
    }

    // ========================================================================
    // TOPOLOGY
    // ========================================================================

    /// Absolute coordinates of a plate composed from topology metadata.
    pub fn plate_coordinates(&self, position: Position) -> Result<Coordinates, TopologyError> {
        self.topology.resolve(position)
    }

    /// Metadata-composed coordinates for every plate holding a product.
    pub fn product_plate_coordinates(
        &self,
        product_id: &str,
    ) -> Result<Vec<(Position, Coordinates)>, BookKeeperError> {
        let positions = self.planogram.positions_of(product_id)?;

        let mut resolved = Vec::with_capacity(positions.len());
        for &position in positions {
            resolved.push((position, self.topology.resolve(position)?));
        }
        Ok(resolved)
    }

    // ========================================================================
    // CATALOG
    // ========================================================================

    /// Full descriptor of a product, memoized for the life of this BookKeeper.
    pub fn product(&mut self, product_id: &str) -> Result<Arc<ProductExtended>, CatalogError> {
        self.products
            .resolve(product_id, &self.store, &self.planogram)
    }

    pub fn product_cache(&self) -> &ProductPositionCache {
        &self.products
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    pub fn events(&self) -> EventWindowAggregator<'_, S, D> {
        EventWindowAggregator::new(&self.store, &self.decoder)
    }

    pub fn frames_for_event(
        &self,
        window: &EventWindow,
    ) -> Result<BTreeMap<CameraId, Frame>, EventError> {
        self.events().frames_for_event(window)
    }

    pub fn targets_for_event(&self, window: &EventWindow) -> Result<HashMap<String, Target>, EventError> {
        self.events().targets_for_event(window)
    }

    pub fn frame_at(&self, timestamp: f64, camera_id: CameraId) -> Result<Option<Frame>, EventError> {
        self.events().frame_at(timestamp, camera_id)
    }

    pub fn frames_at(&self, timestamp: f64) -> Result<BTreeMap<CameraId, Frame>, EventError> {
        self.events().frames_at(timestamp)
    }
}

/// Any failure surfaced by the BookKeeper facade.
#[derive(Debug, thiserror::Error)]
pub enum BookKeeperError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Planogram(#[from] PlanogramError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Event(#[from] EventError),
}
