//! StoreView command-line harness
//!
//! Support code for the `storeview` binary:
//! - [`synthetic`]: seeded generation of complete store dumps
//! - [`report`]: serializable query results and frame export

pub mod report;
pub mod synthetic;

pub use report::{save_frame, sorted_targets, FrameReport, LocateReport, SummaryReport};
pub use synthetic::{generate, SyntheticConfig};
