//! The "TOPOLOGY" Engine - Hierarchical Coordinate Composition
//!
//! Resolves a plate path to an absolute store position by walking the
//! store → gondola → shelf → plate nesting:
//!
//! ```text
//! origin (0,0,0)
//!   + gondola translation   (relative to store)
//!   + shelf translation     (relative to gondola)
//!   + plate translation     (relative to shelf)
//!   = absolute plate coordinates
//! ```
//!
//! Known limitation: only translations are composed. Gondolas whose physical
//! orientation is rotated relative to the store frame resolve as if unrotated.

use crate::geometry::{Coordinates, Position};
use std::collections::HashMap;
use storeview_env::{GondolaRecord, PlateRecord, RecordStore, ShelfRecord, StoreError, Translation};
use tracing::{info, warn};

/// Separator joining id components into metadata keys ("2_3_7").
pub const KEY_SEPARATOR: &str = "_";

/// Metadata key for a gondola: `"g"`.
pub fn gondola_key(gondola: u32) -> String {
    gondola.to_string()
}

/// Metadata key for a shelf: `"g_s"`.
pub fn shelf_key(gondola: u32, shelf: u32) -> String {
    format!("{gondola}{KEY_SEPARATOR}{shelf}")
}

/// Metadata key for a plate: `"g_s_p"`.
pub fn plate_key(gondola: u32, shelf: u32, plate: u32) -> String {
    format!("{gondola}{KEY_SEPARATOR}{shelf}{KEY_SEPARATOR}{plate}")
}

/// Composes nested topology translations into absolute coordinates.
///
/// Built once from the three topology collections; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct CoordinateResolver {
    /// Gondola key → translation relative to the store origin
    gondolas: HashMap<String, Translation>,

    /// Shelf key → translation relative to its gondola
    shelves: HashMap<String, Translation>,

    /// Plate key → translation relative to its shelf
    plates: HashMap<String, Translation>,
}

impl CoordinateResolver {
    /// Create an empty resolver. Every resolution fails until metadata is inserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the three metadata tables from topology records.
    ///
    /// A repeated key replaces the earlier entry (logged at warn).
    pub fn from_records(
        gondolas: &[GondolaRecord],
        shelves: &[ShelfRecord],
        plates: &[PlateRecord],
    ) -> Self {
        let mut resolver = Self::new();

        for record in gondolas {
            resolver.insert_gondola(record.id.id, record.coordinates.translation());
        }
        for record in shelves {
            resolver.insert_shelf(
                record.id.gondola_id.id,
                record.id.shelf_index,
                record.coordinates.translation(),
            );
        }
        for record in plates {
            resolver.insert_plate(
                record.id.gondola(),
                record.id.shelf(),
                record.id.plate(),
                record.coordinates.translation(),
            );
        }

        info!(
            "Topology tables built: {} gondolas, {} shelves, {} plates",
            resolver.gondolas.len(),
            resolver.shelves.len(),
            resolver.plates.len()
        );
        resolver
    }

    /// Query the three topology collections and build the tables.
    pub fn from_store<S: RecordStore>(store: &S) -> Result<Self, StoreError> {
        let gondolas = store.gondola_records()?;
        let shelves = store.shelf_records()?;
        let plates = store.plate_records()?;
        Ok(Self::from_records(&gondolas, &shelves, &plates))
    }

    pub fn insert_gondola(&mut self, gondola: u32, translation: Translation) {
        Self::insert(&mut self.gondolas, gondola_key(gondola), translation);
    }

    pub fn insert_shelf(&mut self, gondola: u32, shelf: u32, translation: Translation) {
        Self::insert(&mut self.shelves, shelf_key(gondola, shelf), translation);
    }

    pub fn insert_plate(&mut self, gondola: u32, shelf: u32, plate: u32, translation: Translation) {
        Self::insert(&mut self.plates, plate_key(gondola, shelf, plate), translation);
    }

    fn insert(table: &mut HashMap<String, Translation>, key: String, translation: Translation) {
        if table.insert(key.clone(), translation).is_some() {
            warn!("Duplicate topology key {key}; keeping the later record");
        }
    }

    /// Resolve a plate path to absolute store coordinates.
    ///
    /// Starts at the origin and translates by the gondola, shelf and plate
    /// offsets, strictly in that order.
    ///
    /// # Errors
    /// A missing level means the topology metadata is inconsistent with the
    /// path; it is reported, never defaulted to zero.
    pub fn resolve(&self, position: Position) -> Result<Coordinates, TopologyError> {
        let Position { gondola, shelf, plate } = position;

        let gondola_key = gondola_key(gondola);
        let gondola_translation = self
            .gondolas
            .get(&gondola_key)
            .ok_or(TopologyError::MissingGondola(gondola_key))?;

        let shelf_key = shelf_key(gondola, shelf);
        let shelf_translation = self
            .shelves
            .get(&shelf_key)
            .ok_or(TopologyError::MissingShelf(shelf_key))?;

        let plate_key = plate_key(gondola, shelf, plate);
        let plate_translation = self
            .plates
            .get(&plate_key)
            .ok_or(TopologyError::MissingPlate(plate_key))?;

        let mut absolute = Coordinates::origin();
        absolute.translate(gondola_translation);
        absolute.translate(shelf_translation);
        absolute.translate(plate_translation);
        Ok(absolute)
    }

    /// Number of (gondola, shelf, plate) metadata entries.
    pub fn table_sizes(&self) -> (usize, usize, usize) {
        (self.gondolas.len(), self.shelves.len(), self.plates.len())
    }
}

/// Inconsistent topology: a path level has no metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("Inconsistent topology: no gondola metadata for key {0}")]
    MissingGondola(String),

    #[error("Inconsistent topology: no shelf metadata for key {0}")]
    MissingShelf(String),

    #[error("Inconsistent topology: no plate metadata for key {0}")]
    MissingPlate(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use storeview_env::{GondolaId, Placement, PlateId, ShelfId};

    fn sample_resolver() -> CoordinateResolver {
        let gondolas = vec![GondolaRecord {
            id: GondolaId { id: 1 },
            coordinates: Placement::from_translation(10.0, 0.0, 0.0),
        }];
        let shelves = vec![ShelfRecord {
            id: ShelfId {
                gondola_id: GondolaId { id: 1 },
                shelf_index: 2,
            },
            coordinates: Placement::from_translation(0.0, 0.0, 1.5),
        }];
        let plates = vec![PlateRecord {
            id: PlateId::new(1, 2, 3),
            coordinates: Placement::from_translation(0.3, 0.1, 0.0),
        }];
        CoordinateResolver::from_records(&gondolas, &shelves, &plates)
    }

    #[test]
    fn test_keys() {
        assert_eq!(gondola_key(4), "4");
        assert_eq!(shelf_key(4, 2), "4_2");
        assert_eq!(plate_key(4, 2, 11), "4_2_11");
    }

    #[test]
    fn test_resolve_composes_all_levels() {
        let resolver = sample_resolver();
        let point = resolver.resolve(Position::new(1, 2, 3)).unwrap();

        assert_relative_eq!(point.x(), 10.3);
        assert_relative_eq!(point.y(), 0.1);
        assert_relative_eq!(point.z(), 1.5);
    }

    #[test]
    fn test_missing_levels_are_reported() {
        let resolver = sample_resolver();

        assert_eq!(
            resolver.resolve(Position::new(2, 2, 3)),
            Err(TopologyError::MissingGondola("2".to_string()))
        );
        assert_eq!(
            resolver.resolve(Position::new(1, 1, 3)),
            Err(TopologyError::MissingShelf("1_1".to_string()))
        );
        assert_eq!(
            resolver.resolve(Position::new(1, 2, 4)),
            Err(TopologyError::MissingPlate("1_2_4".to_string()))
        );
    }

    #[test]
    fn test_empty_resolver_never_defaults() {
        let resolver = CoordinateResolver::new();
        assert!(resolver.resolve(Position::new(1, 1, 1)).is_err());
    }

    #[test]
    fn test_duplicate_key_keeps_later_record() {
        let mut resolver = sample_resolver();
        resolver.insert_plate(1, 2, 3, Translation::new(0.0, 0.0, 0.0));

        let point = resolver.resolve(Position::new(1, 2, 3)).unwrap();
        assert_relative_eq!(point.x(), 10.0);
        assert_eq!(resolver.table_sizes(), (1, 1, 1));
    }

    proptest! {
        #[test]
        fn prop_composition_is_grouping_independent(
            g in prop::array::uniform3(-50.0f64..50.0),
            s in prop::array::uniform3(-50.0f64..50.0),
            p in prop::array::uniform3(-50.0f64..50.0),
        ) {
            let mut resolver = CoordinateResolver::new();
            resolver.insert_gondola(1, Translation::new(g[0], g[1], g[2]));
            resolver.insert_shelf(1, 1, Translation::new(s[0], s[1], s[2]));
            resolver.insert_plate(1, 1, 1, Translation::new(p[0], p[1], p[2]));

            let resolved = resolver.resolve(Position::new(1, 1, 1)).unwrap();

            // (gondola + shelf) + plate
            let mut left = Coordinates::new(g[0] + s[0], g[1] + s[1], g[2] + s[2]);
            left.translate_by(p[0], p[1], p[2]);

            // gondola + (shelf + plate)
            let mut right = Coordinates::new(g[0], g[1], g[2]);
            right.translate_by(s[0] + p[0], s[1] + p[1], s[2] + p[2]);

            prop_assert!((resolved.0 - left.0).norm() < 1e-9);
            prop_assert!((resolved.0 - right.0).norm() < 1e-9);
        }
    }
}
