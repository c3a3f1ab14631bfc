//! Headless MPM run: fill the demo block, step frames, log stats.
//!
//! Run with: cargo run --release --example headless -p mpm2d
//! Custom config: cargo run --release --example headless -p mpm2d -- config.json [frames]
//! Write the default config: cargo run --example headless -p mpm2d -- --dump config.json

use std::path::Path;
use std::time::Instant;

use log::{error, info};
use mpm2d::{Mpm2D, SolverConfig, Vec2};

const DEFAULT_FRAMES: u32 = 120;
const SEED: u64 = 42;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("--dump") {
        let path = args.get(1).map(String::as_str).unwrap_or("mpm2d.json");
        match SolverConfig::default().save_json(Path::new(path)) {
            Ok(()) => info!("wrote default config to {}", path),
            Err(e) => error!("failed to write {}: {}", path, e),
        }
        return;
    }

    let config = match args.first() {
        Some(path) => match SolverConfig::load_json(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                error!("failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SolverConfig::mpm88(Vec2::new(78.0, 168.0), 16384),
    };
    let frames = args
        .get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut sim = match Mpm2D::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            error!("invalid config: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = sim.fill_centered_square(SEED) {
        error!("particle init failed: {}", e);
        std::process::exit(1);
    }

    let start = Instant::now();
    for frame in 0..frames {
        sim.update();

        // Slowly tilt gravity like a rotating device
        if frame % 30 == 29 {
            let angle = frame as f32 * 0.01;
            sim.set_gravity(Vec2::new(angle.sin(), -angle.cos()));
        }

        if frame % 20 == 0 {
            let mean_y = sim.particles().positions.iter().map(|p| p.y).sum::<f32>()
                / sim.particles().len().max(1) as f32;
            info!(
                "frame {:4}: kinetic energy {:10.3}, mean height {:7.3}",
                sim.frame(),
                sim.kinetic_energy(),
                mean_y
            );
        }
    }

    let elapsed = start.elapsed();
    info!(
        "{} frames in {:.2?} ({:.2} ms/frame)",
        frames,
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / frames.max(1) as f64
    );
}
