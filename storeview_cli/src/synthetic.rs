//! Seeded synthetic store generator.
//!
//! Produces a complete, self-consistent [`StoreSnapshot`]:
//! - Topology metadata for every gondola, shelf and plate
//! - A planogram where products span runs of adjacent plates
//! - A catalog entry for every shelved product plus a few unshelved ones
//! - Camera frames (tiny PNGs) and random-walking customer targets
//!
//! The same seed always yields the same snapshot.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use storeview_core::StoreDimensions;
use storeview_env::{
    encode_png, CatalogProductId, CatalogRecord, DynamicImage, FrameRecord, GondolaId,
    GondolaRecord, Head, LayoutRecord, Placement, PlateId, PlateRecord, ProductRef, ShelfId,
    ShelfRecord, StoreError, StoreSnapshot, TargetDocument, TargetId, TargetObservation,
    TargetState, Translation,
};

/// Gondola spacing along x, in meters
const GONDOLA_PITCH: f64 = 3.0;

/// Shelf spacing along z, in meters
const SHELF_PITCH: f64 = 0.4;

/// Plate width along x, in meters
const PLATE_PITCH: f64 = 0.1;

/// Parameters for a synthetic store.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Master seed
    pub seed: u64,

    /// Plate array extent
    pub dimensions: StoreDimensions,

    /// Number of cameras (ids start at 1)
    pub cameras: u32,

    /// Number of tracked customers
    pub targets: usize,

    /// Recording length in seconds, starting at t=0
    pub duration_secs: f64,

    /// Seconds between frames of one camera
    pub frame_interval: f64,

    /// Seconds between tracker documents
    pub tracker_interval: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            dimensions: StoreDimensions::default(),
            cameras: 4,
            targets: 3,
            duration_secs: 10.0,
            frame_interval: 1.0,
            tracker_interval: 0.5,
        }
    }
}

/// Generate a store snapshot from `config`.
pub fn generate(config: &SyntheticConfig) -> Result<StoreSnapshot, StoreError> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut snapshot = StoreSnapshot::default();

    generate_topology(config.dimensions, &mut snapshot);
    generate_planogram(config.dimensions, &mut rng, &mut snapshot);
    generate_frames(config, &mut rng, &mut snapshot)?;
    generate_targets(config, &mut rng, &mut snapshot);

    Ok(snapshot)
}

fn gondola_offset(gondola: u32) -> Translation {
    Translation::new(gondola as f64 * GONDOLA_PITCH, 0.0, 0.0)
}

fn shelf_offset(shelf: u32) -> Translation {
    Translation::new(0.0, 0.0, shelf as f64 * SHELF_PITCH)
}

fn plate_offset(plate: u32) -> Translation {
    Translation::new(plate as f64 * PLATE_PITCH, 0.0, 0.0)
}

fn generate_topology(dims: StoreDimensions, snapshot: &mut StoreSnapshot) {
    for g in 1..=dims.gondolas {
        let t = gondola_offset(g);
        snapshot.gondolas.push(GondolaRecord {
            id: GondolaId { id: g },
            coordinates: Placement::from_translation(t.x, t.y, t.z),
        });

        for s in 1..=dims.shelves {
            let t = shelf_offset(s);
            snapshot.shelves.push(ShelfRecord {
                id: ShelfId {
                    gondola_id: GondolaId { id: g },
                    shelf_index: s,
                },
                coordinates: Placement::from_translation(t.x, t.y, t.z),
            });

            for p in 1..=dims.plates {
                let t = plate_offset(p);
                snapshot.plates.push(PlateRecord {
                    id: PlateId::new(g, s, p),
                    coordinates: Placement::from_translation(t.x, t.y, t.z),
                });
            }
        }
    }
}

fn product_barcode(n: u32) -> String {
    format!("{:013}", 4_006_381_000_000u64 + n as u64)
}

fn generate_planogram(dims: StoreDimensions, rng: &mut ChaCha8Rng, snapshot: &mut StoreSnapshot) {
    let mut next_product = 1u32;

    for g in 1..=dims.gondolas {
        for s in 1..=dims.shelves {
            let mut p = 1;
            while p <= dims.plates {
                let run = rng.gen_range(1..=3).min(dims.plates - p + 1);
                let plates: Vec<PlateId> = (p..p + run).map(|plate| PlateId::new(g, s, plate)).collect();

                let product_id = if rng.gen_bool(0.15) {
                    String::new()
                } else {
                    let barcode = product_barcode(next_product);
                    snapshot.products.push(catalog_record(next_product, &barcode, rng));
                    next_product += 1;
                    barcode
                };

                let (go, so, po) = (gondola_offset(g), shelf_offset(s), plate_offset(p));
                snapshot.planogram.push(LayoutRecord {
                    planogram_product_id: ProductRef { id: product_id },
                    plate_ids: plates,
                    global_coordinates: Placement::from_translation(
                        go.x + so.x + po.x,
                        go.y + so.y + po.y,
                        go.z + so.z + po.z,
                    ),
                });
                p += run;
            }
        }
    }

    // A few cataloged products that are not on any shelf
    for _ in 0..3 {
        let barcode = product_barcode(next_product);
        snapshot.products.push(catalog_record(next_product, &barcode, rng));
        next_product += 1;
    }
}

fn catalog_record(n: u32, barcode: &str, rng: &mut ChaCha8Rng) -> CatalogRecord {
    CatalogRecord {
        product_id: CatalogProductId {
            id: barcode.to_string(),
            barcode_type: "EAN13".to_string(),
            barcode: barcode.to_string(),
        },
        name: format!("Product {n}"),
        thumbnail: format!("thumbnails/{barcode}.png"),
        price: (rng.gen_range(0.5..25.0f64) * 100.0).round() / 100.0,
        weight: rng.gen_range(50.0..2000.0f64).round(),
    }
}

fn generate_frames(
    config: &SyntheticConfig,
    rng: &mut ChaCha8Rng,
    snapshot: &mut StoreSnapshot,
) -> Result<(), StoreError> {
    let ticks = (config.duration_secs / config.frame_interval).floor() as u64;

    for tick in 0..ticks {
        let timestamp = tick as f64 * config.frame_interval;
        for camera_id in 1..=config.cameras {
            let shade: [u8; 3] = rng.gen();
            let image = DynamicImage::ImageRgb8(storeview_env::RgbImage::from_pixel(
                8,
                6,
                storeview_env::Rgb(shade),
            ));
            snapshot.frames.push(FrameRecord {
                camera_id,
                timestamp,
                frame: encode_png(&image)?,
            });
        }
    }

    Ok(())
}

fn generate_targets(config: &SyntheticConfig, rng: &mut ChaCha8Rng, snapshot: &mut StoreSnapshot) {
    let width = config.dimensions.gondolas as f64 * GONDOLA_PITCH;
    let mut heads: Vec<Translation> = (0..config.targets)
        .map(|_| Translation::new(rng.gen_range(0.0..width.max(1.0)), rng.gen_range(0.0..5.0), 1.7))
        .collect();

    let ticks = (config.duration_secs / config.tracker_interval).floor() as u64;
    for tick in 0..ticks {
        let timestamp = tick as f64 * config.tracker_interval;
        let mut observations = Vec::with_capacity(heads.len());

        for (i, head) in heads.iter_mut().enumerate() {
            head.x += rng.gen_range(-0.3..0.3);
            head.y += rng.gen_range(-0.3..0.3);

            // Targets are confirmed as entrances after their first second
            let state = if timestamp >= 1.0 {
                TargetState::ValidEntrance
            } else {
                TargetState::Other
            };

            observations.push(TargetObservation {
                target_id: TargetId {
                    id: format!("target-{}", i + 1),
                },
                head: Head {
                    point: *head,
                    score: rng.gen_range(0.6..1.0),
                },
                target_state: state,
            });
        }

        snapshot.targets.push(TargetDocument {
            timestamp,
            targets: observations,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storeview_core::{BookKeeper, BookKeeperConfig, EventWindow, Position};
    use storeview_env::MemoryStore;

    fn small_config(seed: u64) -> SyntheticConfig {
        SyntheticConfig {
            seed,
            dimensions: StoreDimensions::new(2, 2, 6),
            cameras: 2,
            targets: 2,
            duration_secs: 3.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_same_seed_same_snapshot() {
        let a = serde_json::to_string(&generate(&small_config(7)).unwrap()).unwrap();
        let b = serde_json::to_string(&generate(&small_config(7)).unwrap()).unwrap();
        let c = serde_json::to_string(&generate(&small_config(8)).unwrap()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_snapshot_builds_and_resolves() {
        let config = small_config(42);
        let snapshot = generate(&config).unwrap();
        assert_eq!(snapshot.plates.len(), 24);
        assert_eq!(snapshot.frames.len(), 6);

        let keeper = BookKeeper::build(
            MemoryStore::new(snapshot),
            BookKeeperConfig {
                dimensions: config.dimensions,
            },
        )
        .unwrap();

        for product in keeper.planogram().product_ids() {
            assert!(keeper.product_plate_coordinates(product).is_ok());
        }
        assert!(keeper.plate_coordinates(Position::new(2, 2, 6)).is_ok());

        let frames = keeper.frames_for_event(&EventWindow::new(0.0, 3.0)).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames.values().all(|f| f.timestamp == 2.0));

        let targets = keeper.targets_for_event(&EventWindow::new(0.0, 3.0)).unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets.values().all(|t| t.valid_entrance));
    }
}
