//! Typed record shapes for the documents StoreView reads.
//!
//! Field names follow the stored documents, so a dump exported from the
//! document store deserializes directly. Anything missing a required nested
//! field fails at deserialization, before it can reach an index build.

use serde::{Deserialize, Serialize};

/// Camera identifier as stored on frame records.
pub type CameraId = u32;

// ============================================================================
// ID CHAINS
// ============================================================================

/// `{"id": 3}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GondolaId {
    pub id: u32,
}

/// `{"gondola_id": {...}, "shelf_index": 2}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShelfId {
    pub gondola_id: GondolaId,
    pub shelf_index: u32,
}

/// `{"shelf_id": {...}, "plate_index": 7}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlateId {
    pub shelf_id: ShelfId,
    pub plate_index: u32,
}

impl PlateId {
    /// Builds the full chain from 1-based ids.
    pub fn new(gondola: u32, shelf: u32, plate: u32) -> Self {
        Self {
            shelf_id: ShelfId {
                gondola_id: GondolaId { id: gondola },
                shelf_index: shelf,
            },
            plate_index: plate,
        }
    }

    pub fn gondola(&self) -> u32 {
        self.shelf_id.gondola_id.id
    }

    pub fn shelf(&self) -> u32 {
        self.shelf_id.shelf_index
    }

    pub fn plate(&self) -> u32 {
        self.plate_index
    }
}

// ============================================================================
// TRANSFORMS
// ============================================================================

/// A raw translation triple.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Translation {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Translation,
}

/// `{"transform": {"translation": {"x": .., "y": .., "z": ..}}}`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub transform: Transform,
}

impl Placement {
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            transform: Transform {
                translation: Translation::new(x, y, z),
            },
        }
    }

    #[inline]
    pub fn translation(&self) -> Translation {
        self.transform.translation
    }
}

// ============================================================================
// PLANOGRAM / TOPOLOGY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Empty string means the plates are unassigned.
    pub id: String,
}

/// One planogram document: a product assigned to one or more plates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub planogram_product_id: ProductRef,
    pub plate_ids: Vec<PlateId>,
    pub global_coordinates: Placement,
}

impl LayoutRecord {
    pub fn product_id(&self) -> &str {
        &self.planogram_product_id.id
    }
}

/// Gondola metadata; its translation is relative to the store origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GondolaRecord {
    pub id: GondolaId,
    pub coordinates: Placement,
}

/// Shelf metadata; its translation is relative to its gondola.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfRecord {
    pub id: ShelfId,
    pub coordinates: Placement,
}

/// Plate metadata; its translation is relative to its shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateRecord {
    pub id: PlateId,
    pub coordinates: Placement,
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProductId {
    pub id: String,
    pub barcode_type: String,
    pub barcode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub product_id: CatalogProductId,
    pub name: String,
    #[serde(default)]
    pub thumbnail: String,
    pub price: f64,
    #[serde(default)]
    pub weight: f64,
}

// ============================================================================
// SENSOR RECORDS
// ============================================================================

/// A single encoded camera frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub camera_id: CameraId,

    /// Capture time in seconds
    #[serde(alias = "date_time")]
    pub timestamp: f64,

    /// Encoded image bytes
    pub frame: Vec<u8>,
}

/// Raw tracker state for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetState {
    #[serde(rename = "TARGETSTATE_VALID_ENTRANCE")]
    ValidEntrance,

    #[serde(other, rename = "TARGETSTATE_UNKNOWN")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetId {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Head {
    pub point: Translation,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetObservation {
    pub target_id: TargetId,
    pub head: Head,
    pub target_state: TargetState,
}

impl TargetObservation {
    pub fn is_valid_entrance(&self) -> bool {
        self.target_state == TargetState::ValidEntrance
    }
}

/// One tracker output: every target observed at `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDocument {
    #[serde(alias = "date_time")]
    pub timestamp: f64,
    pub targets: Vec<TargetObservation>,
}

// ============================================================================
// EVENT WINDOW
// ============================================================================

/// Half-open time interval `[begin, end)` in record timestamp units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventWindow {
    pub begin: f64,
    pub end: f64,
}

impl EventWindow {
    pub fn new(begin: f64, end: f64) -> Self {
        Self { begin, end }
    }

    /// `begin <= t < end`
    #[inline]
    pub fn contains(&self, timestamp: f64) -> bool {
        self.begin <= timestamp && timestamp < self.end
    }

    /// True when no timestamp can fall inside the window.
    pub fn is_empty(&self) -> bool {
        !(self.begin < self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_half_open() {
        let window = EventWindow::new(10.0, 12.0);
        assert!(window.contains(10.0));
        assert!(window.contains(11.999));
        assert!(!window.contains(12.0));
        assert!(!window.contains(9.999));
    }

    #[test]
    fn test_degenerate_window_is_empty() {
        let window = EventWindow::new(5.0, 5.0);
        assert!(window.is_empty());
        assert!(!window.contains(5.0));
        assert!(EventWindow::new(6.0, 5.0).is_empty());
    }

    #[test]
    fn test_layout_record_from_document() {
        let json = r#"{
            "planogram_product_id": {"id": "0001"},
            "plate_ids": [
                {"shelf_id": {"gondola_id": {"id": 2}, "shelf_index": 3}, "plate_index": 4}
            ],
            "global_coordinates": {"transform": {"translation": {"x": 1.0, "y": 2.0, "z": 3.0}}}
        }"#;

        let record: LayoutRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.product_id(), "0001");
        assert_eq!(record.plate_ids[0], PlateId::new(2, 3, 4));
        assert_eq!(record.global_coordinates.translation().z, 3.0);
    }

    #[test]
    fn test_layout_record_missing_chain_is_rejected() {
        let json = r#"{
            "planogram_product_id": {"id": "0001"},
            "plate_ids": [{"shelf_id": {"shelf_index": 3}, "plate_index": 4}],
            "global_coordinates": {"transform": {"translation": {"x": 0, "y": 0, "z": 0}}}
        }"#;

        assert!(serde_json::from_str::<LayoutRecord>(json).is_err());
    }

    #[test]
    fn test_target_state_parsing() {
        let valid: TargetState = serde_json::from_str("\"TARGETSTATE_VALID_ENTRANCE\"").unwrap();
        let other: TargetState = serde_json::from_str("\"TARGETSTATE_INVALID_ENTRANCE\"").unwrap();
        assert_eq!(valid, TargetState::ValidEntrance);
        assert_eq!(other, TargetState::Other);
    }

    #[test]
    fn test_frame_record_accepts_date_time() {
        let json = r#"{"camera_id": 4, "date_time": 12.5, "frame": [1, 2, 3]}"#;
        let record: FrameRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.camera_id, 4);
        assert_eq!(record.timestamp, 12.5);
        assert_eq!(record.frame, vec![1, 2, 3]);
    }
}
