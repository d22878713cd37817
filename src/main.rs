//! gridlight command line
//!
//! Usage:
//!   gridlight rooms map.ron
//!   gridlight light map.ron --x 10.5 --y 4.5 --radius 8 [--json]
//!   gridlight run scenario.ron
//!   gridlight generate out.ron --size 128 --seed 7 --density 0.2
//!   gridlight pack in.ron out.ron

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{Level, LevelFilter, Log, Metadata, Record};

use gridlight::config::{load_config, Config};
use gridlight::math::Vec2;
use gridlight::world::{generate_map, load_map, load_scenario, run_scenario, save_map, World};
use gridlight::VERSION;

#[derive(Parser)]
#[command(name = "gridlight", version = VERSION)]
#[command(about = "Rooms and shadow casting on tile maps")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (RON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rooms of a map
    Rooms {
        map: PathBuf,
    },
    /// Build one light and print its visibility fan
    Light {
        map: PathBuf,
        #[arg(long)]
        x: f32,
        #[arg(long)]
        y: f32,
        #[arg(long, default_value_t = 8.0)]
        radius: f32,
        /// Print the fan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a scenario file and print its report as JSON
    Run {
        scenario: PathBuf,
    },
    /// Write a random map
    Generate {
        out: PathBuf,
        #[arg(long, default_value_t = 128)]
        size: u32,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 0.2)]
        density: f32,
    },
    /// Re-save a map compressed
    Pack {
        input: PathBuf,
        output: PathBuf,
    },
}

/// Plain stderr logger
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => eprintln!("[{}] {}", record.level(), record.args()),
            _ => eprintln!("[{}] {}: {}", record.level(), record.target(), record.args()),
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let logger = Box::new(StderrLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_config = match &cli.config {
        Some(path) => Some(
            load_config(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        ),
        None => None,
    };
    let config = file_config.unwrap_or_default();

    match cli.command {
        Commands::Rooms { map } => print_rooms(&map, &config),
        Commands::Light { map, x, y, radius, json } => print_light(&map, &config, Vec2::new(x, y), radius, json),
        Commands::Run { scenario } => run(&scenario, file_config),
        Commands::Generate { out, size, seed, density } => generate(&out, size, seed, density),
        Commands::Pack { input, output } => pack(&input, &output),
    }
}

fn open_world(path: &Path, config: &Config) -> Result<World> {
    let map = load_map(path)
        .with_context(|| format!("Failed to load map {}", path.display()))?;
    Ok(World::new(map, config))
}

fn print_rooms(path: &Path, config: &Config) -> Result<()> {
    let world = open_world(path, config)?;
    let rooms = world.rooms();
    println!("{} rooms, {} free tiles", rooms.room_count(), world.map().free_count());

    let mut sizes: Vec<(u32, u32)> = rooms.rooms().collect();
    sizes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (id, count) in sizes {
        println!("  room {:>5}: {} tiles", id, count);
    }
    Ok(())
}

fn print_light(path: &Path, config: &Config, origin: Vec2, radius: f32, json: bool) -> Result<()> {
    if radius <= 0.0 {
        anyhow::bail!("radius must be positive, got {}", radius);
    }
    let world = open_world(path, config)?;
    let light = world.light(origin, radius);

    if json {
        let points: Vec<[f32; 2]> = light.fan().iter().map(|p| [p.x, p.y]).collect();
        let out = serde_json::json!({
            "origin": [origin.x, origin.y],
            "radius": radius,
            "valid": light.is_valid(),
            "fan": points,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("light at ({}, {}) radius {}: {} hit points", origin.x, origin.y, radius, light.rays().len());
    for ray in light.rays() {
        println!("  ({:.3}, {:.3})  angle {:.4}  dist {:.3}", ray.point.x, ray.point.y, ray.angle, ray.distance);
    }
    if !light.is_valid() {
        log::warn!("light has fewer than 3 hit points and draws nothing");
    }
    Ok(())
}

/// `config` from `--config` applies when the scenario has none of its own
fn run(path: &Path, config: Option<Config>) -> Result<()> {
    let mut scenario = load_scenario(path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    if let Some(config) = config {
        scenario = scenario.with_default_config(config);
    }
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let report = run_scenario(&scenario, base_dir)
        .context("Scenario failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn generate(out: &Path, size: u32, seed: u64, density: f32) -> Result<()> {
    if size == 0 || size > gridlight::world::MAX_MAP_SIZE {
        anyhow::bail!("size must be between 1 and {}", gridlight::world::MAX_MAP_SIZE);
    }
    let map = generate_map(size, seed, density);
    save_map(&map, out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!("Wrote {}x{} map to {}", size, size, out.display());
    Ok(())
}

fn pack(input: &Path, output: &Path) -> Result<()> {
    let map = load_map(input)
        .with_context(|| format!("Failed to load map {}", input.display()))?;
    save_map(&map, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    let before = std::fs::metadata(input).map(|m| m.len()).unwrap_or(0);
    let after = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    println!("Packed {} -> {} ({} -> {} bytes)", input.display(), output.display(), before, after);
    Ok(())
}
