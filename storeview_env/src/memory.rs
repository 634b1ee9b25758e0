//! In-memory record store backed by a JSON snapshot.

use crate::error::StoreError;
use crate::store::RecordStore;
use crate::types::{
    CameraId, CatalogRecord, EventWindow, FrameRecord, GondolaRecord, LayoutRecord, PlateRecord,
    ShelfRecord, TargetDocument,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::debug;

/// Every collection of a store dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub planogram: Vec<LayoutRecord>,
    pub gondolas: Vec<GondolaRecord>,
    pub shelves: Vec<ShelfRecord>,
    pub plates: Vec<PlateRecord>,
    pub products: Vec<CatalogRecord>,
    pub frames: Vec<FrameRecord>,
    pub targets: Vec<TargetDocument>,
}

impl StoreSnapshot {
    /// Reads a snapshot from a JSON file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file = File::open(path.as_ref())?;
        let snapshot: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(snapshot)
    }

    /// Writes the snapshot as pretty JSON.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path.as_ref())?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// A [`RecordStore`] answering every query from a [`StoreSnapshot`].
///
/// Collections keep their dump order, which stands in for a database's
/// unspecified cursor order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: StoreSnapshot,
}

impl MemoryStore {
    pub fn new(snapshot: StoreSnapshot) -> Self {
        Self { snapshot }
    }

    /// Loads a dump written by [`StoreSnapshot::write_to_file`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let snapshot = StoreSnapshot::read_from_file(path)?;
        debug!(
            "Loaded store dump {}: {} layout records, {} products, {} frames, {} target documents",
            path.display(),
            snapshot.planogram.len(),
            snapshot.products.len(),
            snapshot.frames.len(),
            snapshot.targets.len(),
        );
        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }

    /// Inserts a catalog record, replacing any record with the same product id.
    pub fn upsert_product(&mut self, record: CatalogRecord) {
        match self
            .snapshot
            .products
            .iter_mut()
            .find(|existing| existing.product_id.id == record.product_id.id)
        {
            Some(existing) => *existing = record,
            None => self.snapshot.products.push(record),
        }
    }

    pub fn push_frame(&mut self, record: FrameRecord) {
        self.snapshot.frames.push(record);
    }

    pub fn push_target_document(&mut self, document: TargetDocument) {
        self.snapshot.targets.push(document);
    }
}

impl RecordStore for MemoryStore {
    fn layout_records(&self) -> Result<Vec<LayoutRecord>, StoreError> {
        Ok(self.snapshot.planogram.clone())
    }

    fn gondola_records(&self) -> Result<Vec<GondolaRecord>, StoreError> {
        Ok(self.snapshot.gondolas.clone())
    }

    fn shelf_records(&self) -> Result<Vec<ShelfRecord>, StoreError> {
        Ok(self.snapshot.shelves.clone())
    }

    fn plate_records(&self) -> Result<Vec<PlateRecord>, StoreError> {
        Ok(self.snapshot.plates.clone())
    }

    fn frames_in_window(&self, window: &EventWindow) -> Result<Vec<FrameRecord>, StoreError> {
        Ok(self
            .snapshot
            .frames
            .iter()
            .filter(|frame| window.contains(frame.timestamp))
            .cloned()
            .collect())
    }

    fn frames_at(
        &self,
        timestamp: f64,
        camera_id: Option<CameraId>,
    ) -> Result<Vec<FrameRecord>, StoreError> {
        Ok(self
            .snapshot
            .frames
            .iter()
            .filter(|frame| frame.timestamp == timestamp)
            .filter(|frame| camera_id.map_or(true, |id| frame.camera_id == id))
            .cloned()
            .collect())
    }

    fn target_documents_in_window(
        &self,
        window: &EventWindow,
    ) -> Result<Vec<TargetDocument>, StoreError> {
        let mut documents: Vec<TargetDocument> = self
            .snapshot
            .targets
            .iter()
            .filter(|doc| window.contains(doc.timestamp))
            .cloned()
            .collect();
        documents.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Ok(documents)
    }

    fn catalog_record(&self, product_id: &str) -> Result<Option<CatalogRecord>, StoreError> {
        Ok(self
            .snapshot
            .products
            .iter()
            .find(|record| record.product_id.id == product_id)
            .cloned())
    }
}
