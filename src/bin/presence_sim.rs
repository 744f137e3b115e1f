//! Runs the demo two-person scene through the full pipeline and logs tracks.
//!
//! Usage: `presence-sim [CONFIG.toml] [FRAMES]`
//!
//! Without a config argument the demo scenario `demos/presence_radar.toml` is
//! used when it can be found. The default radar puts the demo people inside
//! the CFAR border, so nothing would be detected.
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use presence_radar_core::config::ConfigLoader;
use presence_radar_core::hal::{SceneSimulator, SimulatorConfig};
use presence_radar_core::processing::FramePipeline;
use presence_radar_core::service::RadarService;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

const DEFAULT_FRAMES: u64 = 50;
const BROADCAST_CAPACITY: usize = 16;
const DEMO_SCENARIO: &str = "demos/presence_radar.toml";

/// Demo scenario relative to the working directory, then to the crate root
fn demo_scenario_path() -> Option<PathBuf> {
    [
        PathBuf::from(DEMO_SCENARIO),
        Path::new(env!("CARGO_MANIFEST_DIR")).join(DEMO_SCENARIO),
    ]
    .into_iter()
    .find(|path| path.is_file())
}

fn loader_for(path: PathBuf) -> Result<ConfigLoader, Box<dyn std::error::Error>> {
    let loader = ConfigLoader::with_paths(vec![path.clone()]);
    loader.validate_config_file(&path)?;
    Ok(loader)
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_span_events(FmtSpan::NONE)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("info");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut loader = match args.first() {
        Some(path) => loader_for(PathBuf::from(path))?,
        None => match demo_scenario_path() {
            Some(path) => {
                info!(path = %path.display(), "No config given; using the demo scenario");
                loader_for(path)?
            }
            None => {
                warn!(
                    "No config given and {DEMO_SCENARIO} not found; the default radar cannot \
                     resolve the demo targets. Pass {DEMO_SCENARIO} as the first argument."
                );
                ConfigLoader::new()
            }
        },
    };
    let frames: u64 = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(DEFAULT_FRAMES);

    let config = loader.load_system_config()?;
    let summary = config.get_summary()?;
    info!(?summary, "Configuration loaded");

    let radar = config.radar_config()?;
    let pipeline = FramePipeline::new(config)?;
    let simulator = SceneSimulator::demo_scene(
        radar,
        SimulatorConfig {
            realtime: true,
            ..SimulatorConfig::default()
        },
    )?;

    let service = RadarService::spawn(simulator, pipeline, BROADCAST_CAPACITY);
    let mut updates = service.subscribe();

    let mut seen = 0;
    while seen < frames {
        let state = match tokio::time::timeout(Duration::from_secs(2), updates.recv()).await {
            Ok(Ok(state)) => state,
            Ok(Err(RecvError::Lagged(skipped))) => {
                warn!(skipped, "Display fell behind");
                continue;
            }
            Ok(Err(RecvError::Closed)) => break,
            Err(_) if service.is_running() => continue,
            Err(_) => break,
        };
        seen += 1;

        info!(
            frame = state.frame_index,
            detections = state.detections,
            targets = state.targets.len(),
            "Frame"
        );
        for track in &state.tracks {
            info!(
                track_id = track.track_id,
                x = track.x,
                vx = track.vx,
                age = track.age_frames,
                "Track"
            );
        }
    }

    let statistics = service.stop().await?;
    info!(statistics = %serde_json::to_string(&statistics)?, "Session finished");
    Ok(())
}
