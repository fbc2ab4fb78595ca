pub mod camera;
pub mod diagnostics;
pub mod preview;
pub mod recorder;
pub mod settings;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

pub use camera::error::{AcquisitionError, CaptureError, Result};
pub use camera::types::{Dimensions, EncodedFrame, ImageFormat};
pub use recorder::controller::CaptureController;
pub use settings::types::CaptureConfig;

/// Install the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise debug builds log at `debug` and
/// release builds at `info`.
pub fn init_logging() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Record one time-lapse run and report the captured frames.
///
/// The first argument, if given, is a JSON config path. Set
/// `DUMMY_CAMERA=1` to capture from the simulated camera.
pub async fn record_once(config_path: Option<PathBuf>) -> std::result::Result<(), String> {
    let config = match config_path {
        Some(path) => settings::store::load_config(&path).map_err(|e| e.to_string())?,
        None => CaptureConfig::default(),
    };

    let capability = camera::resolve::resolve_capability();
    let controller = CaptureController::new(config, capability).map_err(|e| e.to_string())?;

    let preview = controller.start_video().await.map_err(|e| e.to_string())?;
    tracing::info!(
        "previewing '{}' at {}",
        preview.source_label().unwrap_or_default(),
        preview.dimensions()
    );

    let result = controller.record_video().await;
    controller.stop_video();
    let frames = result.map_err(|e| e.to_string())?;

    for (i, frame) in frames.iter().enumerate() {
        tracing::info!(
            "frame {}: {} {} ({} bytes)",
            i + 1,
            frame.format,
            frame.dimensions,
            frame.len()
        );
    }
    if let Some(stats) = controller.last_run() {
        let json = serde_json::to_string(&stats).map_err(|e| e.to_string())?;
        tracing::info!("run stats: {json}");
    }
    Ok(())
}

/// Binary entry point: single-threaded runtime, one capture run.
pub fn run() {
    init_logging();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to build runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(record_once(config_path)) {
        tracing::error!("capture failed: {e}");
        std::process::exit(1);
    }
}
