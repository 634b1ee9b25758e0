//! The "PLANOGRAM" Engine - Dense Plate Index + Reverse Product Index
//!
//! Built once from an unordered stream of layout records:
//! - A dense `[gondola][shelf][plate]` array holding at most one product per plate
//! - A reverse index: product → ordered plate positions + absolute coordinates
//!
//! Invariant: a plate holds product `P` if and only if `P`'s position list
//! contains that plate. When a later record assigns an occupied plate to a
//! different product, the displaced product loses that position.

use crate::geometry::{Coordinates, Position};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use storeview_env::LayoutRecord;
use tracing::{debug, info, warn};

// ============================================================================
// DIMENSIONS
// ============================================================================

/// Extent of the dense plate array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreDimensions {
    pub gondolas: u32,
    pub shelves: u32,
    pub plates: u32,
}

impl Default for StoreDimensions {
    fn default() -> Self {
        Self {
            gondolas: 5,
            shelves: 6,
            plates: 12,
        }
    }
}

impl StoreDimensions {
    pub const fn new(gondolas: u32, shelves: u32, plates: u32) -> Self {
        Self {
            gondolas,
            shelves,
            plates,
        }
    }

    /// Total number of plate cells.
    pub fn total_plates(&self) -> usize {
        self.gondolas as usize * self.shelves as usize * self.plates as usize
    }

    /// Flat 0-based cell index for a 1-based position.
    pub fn cell_index(&self, position: Position) -> Result<usize, PlanogramError> {
        let Position { gondola, shelf, plate } = position;
        if gondola == 0 || shelf == 0 || plate == 0 {
            return Err(PlanogramError::InvalidPosition(position));
        }
        if gondola > self.gondolas || shelf > self.shelves || plate > self.plates {
            return Err(PlanogramError::OutOfBounds {
                position,
                dimensions: *self,
            });
        }

        let g = (gondola - 1) as usize;
        let s = (shelf - 1) as usize;
        let p = (plate - 1) as usize;
        Ok((g * self.shelves as usize + s) * self.plates as usize + p)
    }
}

// ============================================================================
// REVERSE INDEX ENTRIES
// ============================================================================

/// One occurrence of a product on a plate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductPlacement {
    pub position: Position,

    /// Global coordinates carried by the layout record for this occurrence
    pub coordinates: Coordinates,
}

/// Per-product reverse index entry.
#[derive(Debug, Clone, Default)]
struct ProductSlots {
    /// Positions in record processing order
    positions: Vec<Position>,

    /// Coordinates parallel to `positions`
    coordinates: Vec<Coordinates>,

    /// Coordinates of the most recently processed record (last write wins)
    representative: Coordinates,
}

impl ProductSlots {
    fn push(&mut self, position: Position, coordinates: Coordinates) {
        self.positions.push(position);
        self.coordinates.push(coordinates);
        self.representative = coordinates;
    }

    /// Remove every occurrence of `position`.
    ///
    /// The representative falls back to the latest remaining occurrence.
    fn evict(&mut self, position: Position) {
        let mut i = 0;
        while i < self.positions.len() {
            if self.positions[i] == position {
                self.positions.remove(i);
                self.coordinates.remove(i);
            } else {
                i += 1;
            }
        }
        if let Some(&latest) = self.coordinates.last() {
            self.representative = latest;
        }
    }

    fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Middle element of a position list: index `floor(len / 2)`.
///
/// Returns `None` for an empty list.
pub fn middle_position(positions: &[Position]) -> Option<Position> {
    positions.get(positions.len() / 2).copied()
}

// ============================================================================
// PLANOGRAM INDEX
// ============================================================================

/// The product layout of one store.
///
/// Read-only once built; rebuilding means constructing a new index.
#[derive(Debug, Clone)]
pub struct PlanogramIndex {
    dimensions: StoreDimensions,

    /// Dense plate array, flattened via [`StoreDimensions::cell_index`]
    cells: Vec<Option<String>>,

    /// Product identifier → reverse index entry
    products: HashMap<String, ProductSlots>,
}

impl PlanogramIndex {
    /// Create an index with every plate empty.
    pub fn empty(dimensions: StoreDimensions) -> Self {
        Self {
            dimensions,
            cells: vec![None; dimensions.total_plates()],
            products: HashMap::new(),
        }
    }

    /// Build the index from layout records in any order.
    ///
    /// Records with an empty product identifier are unassigned plates and are
    /// skipped: they never clear a cell.
    ///
    /// # Errors
    /// Any plate id that is zero or outside `dimensions` aborts the whole
    /// build; a partial index is never returned.
    pub fn build<'a, I>(records: I, dimensions: StoreDimensions) -> Result<Self, PlanogramError>
    where
        I: IntoIterator<Item = &'a LayoutRecord>,
    {
        let mut index = Self::empty(dimensions);
        let mut record_count = 0usize;

        for record in records {
            record_count += 1;
            let product_id = record.product_id();
            if product_id.is_empty() {
                debug!("Skipping unassigned layout record ({} plates)", record.plate_ids.len());
                continue;
            }

            let coordinates = Coordinates::from(record.global_coordinates.translation());
            for plate_id in &record.plate_ids {
                index.assign(Position::from(plate_id), product_id, coordinates)?;
            }
        }

        let stats = index.stats();
        info!(
            "Planogram built from {} records: {}/{} plates occupied by {} products",
            record_count, stats.occupied_plates, stats.total_plates, stats.distinct_products
        );
        Ok(index)
    }

    /// Write `product_id` into the plate at `position`.
    fn assign(
        &mut self,
        position: Position,
        product_id: &str,
        coordinates: Coordinates,
    ) -> Result<(), PlanogramError> {
        let cell_idx = self.dimensions.cell_index(position)?;

        if let Some(previous) = self.cells[cell_idx].replace(product_id.to_string()) {
            if previous != product_id {
                warn!("{position} reassigned from product {previous} to {product_id}");
                if let Some(slots) = self.products.get_mut(&previous) {
                    slots.evict(position);
                    if slots.is_empty() {
                        debug!("Product {previous} has no plates left; dropping it");
                        self.products.remove(&previous);
                    }
                }
            }
        }

        self.products
            .entry(product_id.to_string())
            .or_default()
            .push(position, coordinates);
        Ok(())
    }

    pub fn dimensions(&self) -> StoreDimensions {
        self.dimensions
    }

    // ========================================================================
    // POSITION QUERIES
    // ========================================================================

    /// Distinct products on every plate of one shelf, in plate order.
    ///
    /// Empty plates are dropped and a product spanning several plates appears once.
    pub fn products_on_aisle(&self, gondola: u32, shelf: u32) -> Result<Vec<&str>, PlanogramError> {
        let first = self.dimensions.cell_index(Position::new(gondola, shelf, 1))?;
        let row = &self.cells[first..first + self.dimensions.plates as usize];

        let mut seen = HashSet::new();
        Ok(row
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|product| seen.insert(*product))
            .collect())
    }

    /// The product on one plate, `None` when the plate is empty.
    pub fn product_at_plate(&self, position: Position) -> Result<Option<&str>, PlanogramError> {
        let cell_idx = self.dimensions.cell_index(position)?;
        Ok(self.cells[cell_idx].as_deref())
    }

    // ========================================================================
    // PRODUCT QUERIES
    // ========================================================================

    /// Every recorded position of a product, in record processing order.
    pub fn positions_of(&self, product_id: &str) -> Result<&[Position], PlanogramError> {
        self.slots(product_id).map(|slots| slots.positions.as_slice())
    }

    /// A single best-guess position: the middle of the position list.
    ///
    /// `None` for unknown products and for products left with no positions.
    pub fn representative_position(&self, product_id: &str) -> Option<Position> {
        self.products
            .get(product_id)
            .and_then(|slots| middle_position(&slots.positions))
    }

    /// The representative absolute coordinates of a product.
    ///
    /// These come from the most recently processed layout record for the
    /// product; use [`PlanogramIndex::placements_of`] for every occurrence.
    pub fn coordinates_of(&self, product_id: &str) -> Result<Coordinates, PlanogramError> {
        self.slots(product_id).map(|slots| slots.representative)
    }

    /// Every occurrence of a product with its own coordinates.
    pub fn placements_of(&self, product_id: &str) -> Result<Vec<ProductPlacement>, PlanogramError> {
        let slots = self.slots(product_id)?;
        Ok(slots
            .positions
            .iter()
            .zip(&slots.coordinates)
            .map(|(&position, &coordinates)| ProductPlacement {
                position,
                coordinates,
            })
            .collect())
    }

    pub fn contains_product(&self, product_id: &str) -> bool {
        self.products.contains_key(product_id)
    }

    /// All product identifiers seen during the build (unordered).
    pub fn product_ids(&self) -> impl Iterator<Item = &str> {
        self.products.keys().map(String::as_str)
    }

    fn slots(&self, product_id: &str) -> Result<&ProductSlots, PlanogramError> {
        self.products
            .get(product_id)
            .ok_or_else(|| PlanogramError::ProductNotFound(product_id.to_string()))
    }

    /// Occupancy statistics.
    pub fn stats(&self) -> PlanogramStats {
        PlanogramStats {
            total_plates: self.cells.len(),
            occupied_plates: self.cells.iter().filter(|cell| cell.is_some()).count(),
            distinct_products: self.products.len(),
        }
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Statistics about the planogram index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanogramStats {
    pub total_plates: usize,
    pub occupied_plates: usize,
    pub distinct_products: usize,
}

// ============================================================================
// ERRORS
// ============================================================================

/// Errors that can occur while building or querying the planogram.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanogramError {
    #[error("Invalid position {0}: ids are 1-based")]
    InvalidPosition(Position),

    #[error("{position} is outside the store ({dimensions:?})")]
    OutOfBounds {
        position: Position,
        dimensions: StoreDimensions,
    },

    #[error("Product not found in planogram: {0}")]
    ProductNotFound(String),
}

// ============================================================================
// TESTS
// ============================================================================
