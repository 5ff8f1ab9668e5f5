// src/main.rs

use anyhow::Result;
use serde::Serialize;
use squat_counter::replay::{self, FrameInput};
use squat_counter::{Config, SessionSummary, SessionTracker};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct SessionOutput<'a> {
    session: &'a str,
    summary: &'a SessionSummary,
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config_found = Path::new(&config_path).exists();
    let config = if config_found {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🏋️ Squat counter starting");
    if config_found {
        info!("✓ Configuration loaded from {}", config_path);
    } else {
        warn!("Config {} not found, using defaults", config_path);
    }
    info!(
        "Thresholds: down={:.1}° up={:.1}° debounce={} frames min_conf={:.2} alpha={:.2}",
        config.counter.th_down,
        config.counter.th_up,
        config.counter.min_frames_between,
        config.counter.min_conf,
        config.counter.alpha
    );

    let mut tracker = SessionTracker::from_config(&config)?;

    let files = replay::find_session_files(&config.replay.input_dir, &config.replay.extension);
    if files.is_empty() {
        if !config.replay.use_demo_when_empty {
            error!("No session files found in {}", config.replay.input_dir);
            return Ok(());
        }
        info!("No session files found, replaying built-in demo");
        return report_session(&mut tracker, "demo", &replay::demo_sequence());
    }

    for (idx, path) in files.iter().enumerate() {
        info!("Session {}/{}: {}", idx + 1, files.len(), path.display());
        let frames = match replay::read_session(path) {
            Ok(frames) => frames,
            Err(e) => {
                error!("Failed to read session: {:#}", e);
                continue;
            }
        };
        report_session(&mut tracker, &path.display().to_string(), &frames)?;
    }

    Ok(())
}

fn report_session(tracker: &mut SessionTracker, name: &str, frames: &[FrameInput]) -> Result<()> {
    let summary = replay::run_session(tracker, frames);

    info!("✓ {} finished", name);
    info!("  Reps: {}", summary.totals.squat_reps);
    info!(
        "  Frames: {} ({} low confidence)",
        summary.frames, summary.low_confidence_frames
    );
    if summary.too_fast > 0 {
        warn!("  ⚠️  Too fast: {}", summary.too_fast);
    }

    let output = SessionOutput {
        session: name,
        summary: &summary,
    };
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}
