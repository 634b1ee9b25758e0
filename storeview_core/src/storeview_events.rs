//! The "EVENTS" Engine - Event-Windowed Sensor Aggregation
//!
//! Collapses the raw sensor records of a half-open window `[begin, end)`
//! into one snapshot per entity:
//! - **Frames**: one representative frame per camera, decoded to an image
//! - **Targets**: one record per target identity, last write wins
//!
//! Records outside the window are discarded even if the store returns them.
//! An empty window yields empty mappings, never an error.

use crate::geometry::Coordinates;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use storeview_env::{
    CameraId, DynamicImage, EventWindow, FrameDecoder, FrameRecord, RecordStore, StoreError,
    TargetDocument, TargetObservation,
};
use tracing::{debug, info};

// ============================================================================
// SNAPSHOT TYPES
// ============================================================================

/// A decoded camera frame.
///
/// Produced per query and never cached.
#[derive(Debug, Clone)]
pub struct Frame {
    pub camera_id: CameraId,
    pub timestamp: f64,
    pub image: DynamicImage,
}

/// A tracked customer as of the end of a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Identity of the target
    pub id: String,

    /// Global head position
    pub head: Coordinates,

    /// Confidence that the target exists [0.0 - 1.0]
    pub score: f64,

    /// Whether the tracker confirmed this target as a valid store entrance
    pub valid_entrance: bool,
}

impl Target {
    pub fn from_observation(observation: &TargetObservation) -> Self {
        Self {
            id: observation.target_id.id.clone(),
            head: Coordinates::from(observation.head.point),
            score: observation.head.score,
            valid_entrance: observation.is_valid_entrance(),
        }
    }

    /// Replace every field with the observation's values.
    ///
    /// This is an overwrite, not a merge: nothing from the previous state survives.
    pub fn update(&mut self, observation: &TargetObservation) {
        *self = Self::from_observation(observation);
    }
}

// ============================================================================
// PURE AGGREGATION
// ============================================================================

/// Pick one frame record per camera.
///
/// Records are compared in iteration order; a record replaces the current
/// pick for its camera when its timestamp is not earlier than the pick's.
/// The result is the latest frame per camera, with ties going to the record
/// seen last.
pub fn select_representative_frames<I>(
    records: I,
    window: &EventWindow,
) -> BTreeMap<CameraId, FrameRecord>
where
    I: IntoIterator<Item = FrameRecord>,
{
    let mut selected = BTreeMap::new();

    for record in records {
        if !window.contains(record.timestamp) {
            debug!(
                "Dropping frame from camera {} at {} outside window",
                record.camera_id, record.timestamp
            );
            continue;
        }

        match selected.entry(record.camera_id) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if slot.get().timestamp <= record.timestamp {
                    slot.insert(record);
                }
            }
        }
    }

    selected
}

/// Fold tracker documents into one [`Target`] per identity.
///
/// Documents are processed in ascending timestamp order (stable for equal
/// timestamps), observations in document order. A later observation of the
/// same identity overwrites the earlier one.
pub fn aggregate_targets(documents: &[TargetDocument], window: &EventWindow) -> HashMap<String, Target> {
    let mut ordered: Vec<&TargetDocument> = documents
        .iter()
        .filter(|doc| window.contains(doc.timestamp))
        .collect();
    ordered.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut targets: HashMap<String, Target> = HashMap::new();
    for document in ordered {
        for observation in &document.targets {
            match targets.get_mut(&observation.target_id.id) {
                Some(target) => target.update(observation),
                None => {
                    targets.insert(
                        observation.target_id.id.clone(),
                        Target::from_observation(observation),
                    );
                }
            }
        }
    }

    targets
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Runs windowed sensor queries against a record store.
pub struct EventWindowAggregator<'a, S: RecordStore, D: FrameDecoder> {
    store: &'a S,
    decoder: &'a D,
}

impl<'a, S: RecordStore, D: FrameDecoder> EventWindowAggregator<'a, S, D> {
    pub fn new(store: &'a S, decoder: &'a D) -> Self {
        Self { store, decoder }
    }

    /// The latest frame of every camera that captured inside `window`.
    ///
    /// Cameras without frames in the window are absent from the result.
    pub fn frames_for_event(
        &self,
        window: &EventWindow,
    ) -> Result<BTreeMap<CameraId, Frame>, EventError> {
        if window.is_empty() {
            return Ok(BTreeMap::new());
        }

        let records = self.store.frames_in_window(window)?;
        let selected = select_representative_frames(records, window);

        let mut frames = BTreeMap::new();
        for (camera_id, record) in selected {
            frames.insert(camera_id, self.decode(record)?);
        }

        info!("Capture {} camera frames in this event", frames.len());
        Ok(frames)
    }

    /// The final state of every target observed inside `window`.
    pub fn targets_for_event(&self, window: &EventWindow) -> Result<HashMap<String, Target>, EventError> {
        if window.is_empty() {
            return Ok(HashMap::new());
        }

        let documents = self.store.target_documents_in_window(window)?;
        let targets = aggregate_targets(&documents, window);

        info!("Capture {} targets in this event", targets.len());
        Ok(targets)
    }

    /// The frame captured by `camera_id` at exactly `timestamp`.
    ///
    /// `None` when no such frame exists. If several match, the first in
    /// store order is used.
    pub fn frame_at(&self, timestamp: f64, camera_id: CameraId) -> Result<Option<Frame>, EventError> {
        self.store
            .frames_at(timestamp, Some(camera_id))?
            .into_iter()
            .next()
            .map(|record| self.decode(record))
            .transpose()
    }

    /// Every camera's frame at exactly `timestamp`; empty when there are none.
    pub fn frames_at(&self, timestamp: f64) -> Result<BTreeMap<CameraId, Frame>, EventError> {
        let mut frames = BTreeMap::new();
        for record in self.store.frames_at(timestamp, None)? {
            if frames.contains_key(&record.camera_id) {
                continue;
            }
            frames.insert(record.camera_id, self.decode(record)?);
        }
        Ok(frames)
    }

    fn decode(&self, record: FrameRecord) -> Result<Frame, EventError> {
        let image = self
            .decoder
            .decode(&record.frame)
            .map_err(|source| EventError::Decode {
                camera_id: record.camera_id,
                source,
            })?;

        Ok(Frame {
            camera_id: record.camera_id,
            timestamp: record.timestamp,
            image,
        })
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Errors that can occur during windowed sensor queries.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Sensor query failed: {0}")]
    Store(#[from] StoreError),

    #[error("Frame from camera {camera_id} could not be decoded: {source}")]
    Decode {
        camera_id: CameraId,
        #[source]
        source: StoreError,
    },
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use storeview_env::{Head, MemoryStore, TargetId, TargetState, Translation};

    /// Decoder producing a 1x1 image whose red channel is the first payload byte.
    struct TagDecoder;

    impl FrameDecoder for TagDecoder {
        fn decode(&self, payload: &[u8]) -> Result<DynamicImage, StoreError> {
            let tag = payload
                .first()
                .copied()
                .ok_or_else(|| StoreError::query("empty payload"))?;
            Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([tag, 0, 0]))))
        }
    }

    fn frame(camera_id: CameraId, timestamp: f64, tag: u8) -> FrameRecord {
        FrameRecord {
            camera_id,
            timestamp,
            frame: vec![tag],
        }
    }

    fn observation(id: &str, score: f64, valid: bool) -> TargetObservation {
        TargetObservation {
            target_id: TargetId { id: id.to_string() },
            head: Head {
                point: Translation::new(score, 0.0, 1.7),
                score,
            },
            target_state: if valid {
                TargetState::ValidEntrance
            } else {
                TargetState::Other
            },
        }
    }

    fn tag_of(frame: &Frame) -> u8 {
        frame.image.to_rgb8().get_pixel(0, 0)[0]
    }

    #[test]
    fn test_latest_frame_per_camera_wins() {
        let window = EventWindow::new(0.0, 100.0);
        let records = vec![frame(7, 12.0, 2), frame(7, 10.0, 1), frame(8, 11.0, 3)];

        let selected = select_representative_frames(records, &window);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[&7].timestamp, 12.0);
        assert_eq!(selected[&8].timestamp, 11.0);
    }

    #[test]
    fn test_equal_timestamps_keep_last_seen() {
        let window = EventWindow::new(0.0, 100.0);
        let records = vec![frame(1, 5.0, 1), frame(1, 5.0, 2)];

        let selected = select_representative_frames(records, &window);
        assert_eq!(selected[&1].frame, vec![2]);
    }

    #[test]
    fn test_frame_selection_discards_out_of_window() {
        let window = EventWindow::new(10.0, 12.0);
        let records = vec![frame(1, 12.0, 9), frame(1, 11.0, 1)];

        let selected = select_representative_frames(records, &window);
        assert_eq!(selected[&1].timestamp, 11.0);
    }

    #[test]
    fn test_frames_for_event_decodes_representatives() {
        let mut store = MemoryStore::default();
        store.push_frame(frame(3, 10.0, 10));
        store.push_frame(frame(3, 12.0, 12));
        store.push_frame(frame(4, 20.0, 20));

        let decoder = TagDecoder;
        let aggregator = EventWindowAggregator::new(&store, &decoder);
        let frames = aggregator.frames_for_event(&EventWindow::new(10.0, 13.0)).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[&3].timestamp, 12.0);
        assert_eq!(tag_of(&frames[&3]), 12);
        assert!(!frames.contains_key(&4));
    }

    #[test]
    fn test_decode_failure_names_camera() {
        let mut store = MemoryStore::default();
        store.push_frame(FrameRecord {
            camera_id: 9,
            timestamp: 1.0,
            frame: vec![],
        });

        let decoder = TagDecoder;
        let aggregator = EventWindowAggregator::new(&store, &decoder);
        let err = aggregator.frames_for_event(&EventWindow::new(0.0, 2.0)).unwrap_err();
        assert!(matches!(err, EventError::Decode { camera_id: 9, .. }));
    }

    #[test]
    fn test_target_last_write_wins() {
        let documents = vec![
            TargetDocument {
                timestamp: 2.0,
                targets: vec![observation("A", 0.9, true)],
            },
            TargetDocument {
                timestamp: 1.0,
                targets: vec![observation("A", 0.5, false), observation("B", 0.3, false)],
            },
        ];

        let targets = aggregate_targets(&documents, &EventWindow::new(0.0, 10.0));
        assert_eq!(targets.len(), 2);

        let a = &targets["A"];
        assert_eq!(a.score, 0.9);
        assert!(a.valid_entrance);
        assert_eq!(a.head, Coordinates::new(0.9, 0.0, 1.7));
        assert!(!targets["B"].valid_entrance);
    }

    #[test]
    fn test_update_replaces_validity() {
        let mut target = Target::from_observation(&observation("A", 0.9, true));
        target.update(&observation("A", 0.4, false));

        assert_eq!(target.score, 0.4);
        assert!(!target.valid_entrance);
    }

    #[test]
    fn test_targets_for_event_through_store() {
        let mut store = MemoryStore::default();
        store.push_target_document(TargetDocument {
            timestamp: 5.0,
            targets: vec![observation("A", 0.8, true)],
        });
        store.push_target_document(TargetDocument {
            timestamp: 1.0,
            targets: vec![observation("A", 0.2, false)],
        });
        store.push_target_document(TargetDocument {
            timestamp: 6.0,
            targets: vec![observation("C", 0.7, false)],
        });

        let decoder = TagDecoder;
        let aggregator = EventWindowAggregator::new(&store, &decoder);
        let targets = aggregator.targets_for_event(&EventWindow::new(0.0, 6.0)).unwrap();

        assert_eq!(targets.len(), 1);
        assert_eq!(targets["A"].score, 0.8);
    }

    #[test]
    fn test_empty_window_yields_nothing() {
        let mut store = MemoryStore::default();
        store.push_frame(frame(1, 4.0, 1));
        store.push_target_document(TargetDocument {
            timestamp: 4.0,
            targets: vec![observation("A", 0.5, true)],
        });

        let decoder = TagDecoder;
        let aggregator = EventWindowAggregator::new(&store, &decoder);
        let window = EventWindow::new(4.0, 4.0);

        assert!(aggregator.frames_for_event(&window).unwrap().is_empty());
        assert!(aggregator.targets_for_event(&window).unwrap().is_empty());
    }

    #[test]
    fn test_frame_at_exact_timestamp() {
        let mut store = MemoryStore::default();
        store.push_frame(frame(1, 4.0, 41));
        store.push_frame(frame(2, 4.0, 42));
        store.push_frame(frame(1, 5.0, 51));

        let decoder = TagDecoder;
        let aggregator = EventWindowAggregator::new(&store, &decoder);

        let found = aggregator.frame_at(4.0, 2).unwrap().unwrap();
        assert_eq!(tag_of(&found), 42);
        assert!(aggregator.frame_at(4.5, 1).unwrap().is_none());
        assert!(aggregator.frame_at(4.0, 3).unwrap().is_none());

        let all = aggregator.frames_at(4.0).unwrap();
        assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert!(aggregator.frames_at(7.0).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_exact_frames_use_store_order() {
        let mut store = MemoryStore::default();
        store.push_frame(frame(1, 4.0, 10));
        store.push_frame(frame(2, 4.0, 20));
        store.push_frame(frame(1, 4.0, 11));
        store.push_frame(frame(2, 4.0, 21));

        let decoder = TagDecoder;
        let aggregator = EventWindowAggregator::new(&store, &decoder);

        let found = aggregator.frame_at(4.0, 1).unwrap().unwrap();
        assert_eq!(tag_of(&found), 10);

        let all = aggregator.frames_at(4.0).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(tag_of(&all[&1]), 10);
        assert_eq!(tag_of(&all[&2]), 20);
    }
}
