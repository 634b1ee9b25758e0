//! StoreView CLI
//!
//! Build the BookKeeper over a store dump once, then answer one query.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use storeview_cli::{
    generate, save_frame, sorted_targets, FrameReport, LocateReport, SummaryReport,
    SyntheticConfig,
};
use storeview_core::{BookKeeper, BookKeeperConfig, EventWindow, Frame, Position};
use storeview_env::MemoryStore;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// StoreView planogram and sensor queries
#[derive(Parser, Debug)]
#[command(name = "storeview")]
#[command(about = "Query a store's planogram, topology and sensor records", long_about = None)]
struct Args {
    /// Store dump (JSON)
    #[arg(long, global = true, default_value = "store.json")]
    store: PathBuf,

    /// BookKeeper config (JSON); absent fields use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a seeded synthetic store dump
    Generate {
        /// Master seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,

        /// Number of cameras
        #[arg(long, default_value = "4")]
        cameras: u32,

        /// Number of tracked customers
        #[arg(long, default_value = "3")]
        targets: usize,

        /// Recording length in seconds
        #[arg(short, long, default_value = "10")]
        duration: f64,
    },

    #[command(flatten)]
    Query(QueryCommand),
}

/// Commands answered by a built BookKeeper.
#[derive(Subcommand, Debug)]
enum QueryCommand {
    /// Index sizes and store dimensions
    Summary,

    /// Product placed on one plate
    Plate { gondola: u32, shelf: u32, plate: u32 },

    /// Distinct products on one shelf
    Aisle { gondola: u32, shelf: u32 },

    /// Positions and coordinates of a product
    Locate { product: String },

    /// Catalog descriptor of a product
    Product { product: String },

    /// Plate coordinates composed from topology metadata
    Coords { gondola: u32, shelf: u32, plate: u32 },

    /// Latest frame per camera in [begin, end)
    Frames {
        begin: f64,
        end: f64,

        /// Write each frame as PNG into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Frames captured at exactly one timestamp
    Frame {
        timestamp: f64,

        /// Restrict to one camera
        #[arg(long)]
        camera: Option<u32>,

        /// Write each frame as PNG into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Latest state per target in [begin, end)
    Targets { begin: f64, end: f64 },
}

fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides the default level
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BookKeeperConfig> {
    match path {
        Some(path) => BookKeeperConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display())),
        None => Ok(BookKeeperConfig::default()),
    }
}

fn open(args: &Args) -> anyhow::Result<BookKeeper<MemoryStore>> {
    let config = load_config(args.config.as_deref())?;
    let store = MemoryStore::load(&args.store)
        .with_context(|| format!("loading store {}", args.store.display()))?;
    Ok(BookKeeper::build(store, config)?)
}

/// Print `value` as pretty JSON, or run `human` for plain output.
fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}

fn frame_reports<'a>(
    frames: impl IntoIterator<Item = &'a Frame>,
    out_dir: Option<&Path>,
) -> anyhow::Result<Vec<FrameReport>> {
    let mut reports = Vec::new();
    for frame in frames {
        let saved_to = match out_dir {
            Some(dir) => Some(save_frame(frame, dir)?),
            None => None,
        };
        reports.push(FrameReport::new(frame, saved_to));
    }
    Ok(reports)
}

fn print_frames(reports: &[FrameReport]) {
    if reports.is_empty() {
        println!("no frames");
    }
    for report in reports {
        print!(
            "camera {} t={:.3} {}x{}",
            report.camera_id, report.timestamp, report.width, report.height
        );
        match &report.saved_to {
            Some(path) => println!(" -> {}", path.display()),
            None => println!(),
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    match &args.command {
        Command::Generate {
            seed,
            out,
            cameras,
            targets,
            duration,
        } => {
            let config = SyntheticConfig {
                seed: *seed,
                dimensions: load_config(args.config.as_deref())?.dimensions,
                cameras: *cameras,
                targets: *targets,
                duration_secs: *duration,
                ..Default::default()
            };
            generate_store(&config, out)
        }
        Command::Query(command) => query(args, command),
    }
}

fn generate_store(config: &SyntheticConfig, out: &Path) -> anyhow::Result<()> {
    let snapshot = generate(config)?;
    snapshot
        .write_to_file(out)
        .with_context(|| format!("writing {}", out.display()))?;

    info!(
        "Generated store (seed={}, {} layout records, {} frames) at {}",
        config.seed,
        snapshot.planogram.len(),
        snapshot.frames.len(),
        out.display()
    );
    Ok(())
}

fn query(args: &Args, command: &QueryCommand) -> anyhow::Result<()> {
    let json = args.json;
    let mut keeper = open(args)?;
    debug!("Store {} indexed", args.store.display());

    match command {
        QueryCommand::Summary => {
            let (gondolas, shelves, plates) = keeper.topology().table_sizes();
            let report = SummaryReport {
                dimensions: keeper.planogram().dimensions(),
                planogram: keeper.planogram().stats(),
                topology_gondolas: gondolas,
                topology_shelves: shelves,
                topology_plates: plates,
            };
            emit(json, &report, || {
                let d = report.dimensions;
                println!(
                    "dimensions: {} gondolas x {} shelves x {} plates",
                    d.gondolas, d.shelves, d.plates
                );
                println!(
                    "planogram:  {}/{} plates occupied, {} distinct products",
                    report.planogram.occupied_plates,
                    report.planogram.total_plates,
                    report.planogram.distinct_products
                );
                println!(
                    "topology:   {} gondolas, {} shelves, {} plates",
                    gondolas, shelves, plates
                );
            })?;
        }

        QueryCommand::Plate {
            gondola,
            shelf,
            plate,
        } => {
            let position = Position::new(*gondola, *shelf, *plate);
            let product = keeper.product_at_plate(position)?;
            let value = serde_json::json!({ "position": position, "product_id": product });
            emit(json, &value, || match product {
                Some(id) => println!("{position}: {id}"),
                None => println!("{position}: empty"),
            })?;
        }

        QueryCommand::Aisle { gondola, shelf } => {
            let products = keeper.products_on_aisle(*gondola, *shelf)?;
            emit(json, &products, || {
                for id in &products {
                    println!("{id}");
                }
            })?;
        }

        QueryCommand::Locate { product } => {
            let report = LocateReport {
                product_id: product.clone(),
                positions: keeper.positions_of(product)?.to_vec(),
                representative: keeper.representative_position(product),
                coordinates: keeper.coordinates_of(product)?,
                placements: keeper.planogram().placements_of(product)?,
            };
            emit(json, &report, || {
                if let Some(position) = report.representative {
                    println!("representative: {position}");
                }
                println!("coordinates:    {}", report.coordinates);
                for placement in &report.placements {
                    println!("  {} at {}", placement.position, placement.coordinates);
                }
            })?;
        }

        QueryCommand::Product { product } => {
            let descriptor = keeper.product(product)?;
            emit(json, &*descriptor, || println!("{descriptor}"))?;
        }

        QueryCommand::Coords {
            gondola,
            shelf,
            plate,
        } => {
            let position = Position::new(*gondola, *shelf, *plate);
            let coordinates = keeper.plate_coordinates(position)?;
            emit(json, &coordinates, || println!("{position}: {coordinates}"))?;
        }

        QueryCommand::Frames {
            begin,
            end,
            out_dir,
        } => {
            let frames = keeper.frames_for_event(&EventWindow::new(*begin, *end))?;
            let reports = frame_reports(frames.values(), out_dir.as_deref())?;
            emit(json, &reports, || print_frames(&reports))?;
        }

        QueryCommand::Frame {
            timestamp,
            camera,
            out_dir,
        } => {
            let frames: Vec<Frame> = match camera {
                Some(camera_id) => keeper.frame_at(*timestamp, *camera_id)?.into_iter().collect(),
                None => keeper.frames_at(*timestamp)?.into_values().collect(),
            };
            let reports = frame_reports(&frames, out_dir.as_deref())?;
            emit(json, &reports, || print_frames(&reports))?;
        }

        QueryCommand::Targets { begin, end } => {
            let targets = sorted_targets(keeper.targets_for_event(&EventWindow::new(*begin, *end))?);
            emit(json, &targets, || {
                for target in &targets {
                    println!(
                        "{} head={} score={:.2} valid_entrance={}",
                        target.id, target.head, target.score, target.valid_entrance
                    );
                }
            })?;
        }

    }

    Ok(())
}
