//! StoreView Environment Abstraction Layer
//!
//! This crate holds everything the StoreView engines treat as external:
//! - The shapes of the stored documents (layout, topology, catalog, sensors)
//! - The record store they are queried from (`RecordStore`)
//! - The frame payload decoder (`FrameDecoder`)
//!
//! Records are validated here, at the boundary, by deserializing into typed
//! structs. The engines in `storeview_core` only ever see these types.
//!
//! # Example
//!
//! ```ignore
//! use storeview_env::{EventWindow, MemoryStore, RecordStore};
//!
//! let store = MemoryStore::load("store.json")?;
//! let frames = store.frames_in_window(&EventWindow::new(10.0, 12.0))?;
//! ```

mod decoder;
mod error;
mod memory;
mod store;
mod types;

pub use decoder::{encode_png, FrameDecoder, ImageCrateDecoder};
pub use error::StoreError;
pub use memory::{MemoryStore, StoreSnapshot};
pub use store::RecordStore;
pub use types::{
    CameraId, CatalogProductId, CatalogRecord, EventWindow, FrameRecord, GondolaId, GondolaRecord,
    Head, LayoutRecord, Placement, PlateId, PlateRecord, ProductRef, ShelfId, ShelfRecord,
    TargetDocument, TargetId, TargetObservation, TargetState, Transform, Translation,
};

pub use image::{DynamicImage, Rgb, RgbImage};
