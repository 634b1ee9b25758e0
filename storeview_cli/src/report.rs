//! Serializable query results for `--json` output.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use storeview_core::{
    Coordinates, Frame, PlanogramStats, Position, ProductPlacement, StoreDimensions, Target,
};

/// Overview of a built BookKeeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub dimensions: StoreDimensions,
    pub planogram: PlanogramStats,
    pub topology_gondolas: usize,
    pub topology_shelves: usize,
    pub topology_plates: usize,
}

/// Where a product sits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocateReport {
    pub product_id: String,
    pub positions: Vec<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative: Option<Position>,
    pub coordinates: Coordinates,
    pub placements: Vec<ProductPlacement>,
}

/// A decoded frame, without its pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    pub camera_id: u32,
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<PathBuf>,
}

impl FrameReport {
    pub fn new(frame: &Frame, saved_to: Option<PathBuf>) -> Self {
        Self {
            camera_id: frame.camera_id,
            timestamp: frame.timestamp,
            width: frame.image.width(),
            height: frame.image.height(),
            saved_to,
        }
    }
}

/// Writes a frame as `camera_<id>_<timestamp>.png` under `dir`.
pub fn save_frame(frame: &Frame, dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let path = dir.join(format!("camera_{}_{:.3}.png", frame.camera_id, frame.timestamp));
    frame
        .image
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Targets ordered by identity, for stable output.
pub fn sorted_targets(targets: HashMap<String, Target>) -> Vec<Target> {
    let mut targets: Vec<Target> = targets.into_values().collect();
    targets.sort_by(|a, b| a.id.cmp(&b.id));
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use storeview_env::{DynamicImage, Rgb, RgbImage};

    fn target(id: &str) -> Target {
        Target {
            id: id.to_string(),
            head: Coordinates::origin(),
            score: 0.5,
            valid_entrance: false,
        }
    }

    #[test]
    fn test_sorted_targets() {
        let map: HashMap<String, Target> = ["c", "a", "b"]
            .iter()
            .map(|id| (id.to_string(), target(id)))
            .collect();

        let ids: Vec<String> = sorted_targets(map).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_save_frame_writes_png() {
        let frame = Frame {
            camera_id: 3,
            timestamp: 1.5,
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = save_frame(&frame, &dir.path().join("frames")).unwrap();
        assert!(path.ends_with("camera_3_1.500.png"));
        assert!(path.exists());

        let report = FrameReport::new(&frame, Some(path));
        assert_eq!((report.width, report.height), (4, 4));
    }
}
