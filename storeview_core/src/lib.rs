//! StoreView Core - Planogram Indexing and Event-Windowed Sensor Aggregation
//!
//! This library answers spatial and temporal questions about a retail store:
//! 1. **Where things are**: a dense gondola/shelf/plate index of products and its reverse
//! 2. **Where plates are**: absolute coordinates composed from nested topology metadata
//! 3. **What happened**: one frame per camera and one state per target for a time window

pub mod bookkeeper;
pub mod geometry;
pub mod storeview_catalog;
pub mod storeview_events;
pub mod storeview_planogram;
pub mod storeview_topology;

// Re-export key types for convenience
pub use bookkeeper::{BookKeeper, BookKeeperConfig, BookKeeperError};
pub use geometry::{Coordinates, Position};
pub use storeview_catalog::{CatalogError, ProductExtended, ProductPositionCache};
pub use storeview_events::{EventError, EventWindowAggregator, Frame, Target};
pub use storeview_planogram::{
    PlanogramError, PlanogramIndex, PlanogramStats, ProductPlacement, StoreDimensions,
};
pub use storeview_topology::{CoordinateResolver, TopologyError};

pub use storeview_env::EventWindow;
