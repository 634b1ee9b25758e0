//! Record store abstraction for StoreView engines.

use crate::error::StoreError;
use crate::types::{
    CameraId, CatalogRecord, EventWindow, FrameRecord, GondolaRecord, LayoutRecord, PlateRecord,
    ShelfRecord, TargetDocument,
};

/// Abstraction over the document store holding layout, topology, catalog and
/// sensor records.
///
/// # Implementations
///
/// - **Dump**: `MemoryStore` - a JSON snapshot loaded into memory
/// - **Production**: any document database exposing the same collections
///
/// All calls are synchronous. Timeouts, retries and cancellation belong to the
/// implementation, never to the engines calling it.
///
/// # Windowed Queries
///
/// ```text
///   begin                                  end
///     [=====================================)
///     ^ included                            ^ excluded
/// ```
pub trait RecordStore {
    /// Every planogram document, in backing order.
    fn layout_records(&self) -> Result<Vec<LayoutRecord>, StoreError>;

    /// Gondola topology metadata.
    fn gondola_records(&self) -> Result<Vec<GondolaRecord>, StoreError>;

    /// Shelf topology metadata.
    fn shelf_records(&self) -> Result<Vec<ShelfRecord>, StoreError>;

    /// Plate topology metadata.
    fn plate_records(&self) -> Result<Vec<PlateRecord>, StoreError>;

    /// Frames captured inside `window`, in unspecified order.
    fn frames_in_window(&self, window: &EventWindow) -> Result<Vec<FrameRecord>, StoreError>;

    /// Frames captured at exactly `timestamp`, optionally restricted to one camera.
    fn frames_at(
        &self,
        timestamp: f64,
        camera_id: Option<CameraId>,
    ) -> Result<Vec<FrameRecord>, StoreError>;

    /// Tracker documents inside `window`, sorted ascending by timestamp.
    fn target_documents_in_window(
        &self,
        window: &EventWindow,
    ) -> Result<Vec<TargetDocument>, StoreError>;

    /// Catalog entry for a product identifier.
    ///
    /// # Returns
    /// * `Ok(None)` - The catalog has no such product
    fn catalog_record(&self, product_id: &str) -> Result<Option<CatalogRecord>, StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn layout_records(&self) -> Result<Vec<LayoutRecord>, StoreError> {
        (**self).layout_records()
    }

    fn gondola_records(&self) -> Result<Vec<GondolaRecord>, StoreError> {
        (**self).gondola_records()
    }

    fn shelf_records(&self) -> Result<Vec<ShelfRecord>, StoreError> {
        (**self).shelf_records()
    }

    fn plate_records(&self) -> Result<Vec<PlateRecord>, StoreError> {
        (**self).plate_records()
    }

    fn frames_in_window(&self, window: &EventWindow) -> Result<Vec<FrameRecord>, StoreError> {
        (**self).frames_in_window(window)
    }

    fn frames_at(
        &self,
        timestamp: f64,
        camera_id: Option<CameraId>,
    ) -> Result<Vec<FrameRecord>, StoreError> {
        (**self).frames_at(timestamp, camera_id)
    }

    fn target_documents_in_window(
        &self,
        window: &EventWindow,
    ) -> Result<Vec<TargetDocument>, StoreError> {
        (**self).target_documents_in_window(window)
    }

    fn catalog_record(&self, product_id: &str) -> Result<Option<CatalogRecord>, StoreError> {
        (**self).catalog_record(product_id)
    }
}
