mod app;
mod components;
mod dialogs;
mod theme;
mod utils;

use std::path::Path;

use anyhow::Context;
use fraktum_app_core::{runtime, DesktopHost, HostOptions};
use fraktum_config::{LOG_FILE_PREFIX, PRODUCT_NAME};
use fraktum_infra::{signal_running_instance, Acquired, InstanceGuard};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub use dialogs::{RfdDialogs, RfdInstallPrompt};

/// Logs to stderr and to a daily rolling file under `logs_dir`.
///
/// The returned guard flushes the file writer when dropped; keep it for the life of the process.
pub fn setup_logging(logs_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match std::fs::create_dir_all(logs_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();
    guard
}

/// Starts the desktop launcher for the profile `options` selects.
///
/// A second launch for the same profile asks the running window to come forward and
/// returns without opening a window of its own.
pub fn run(options: HostOptions) -> anyhow::Result<()> {
    let paths = options.profile_paths()?;
    paths
        .ensure_root()
        .with_context(|| format!("Failed to create {}", paths.root().display()))?;
    let _log_guard = setup_logging(&paths.logs_dir());

    let rt = runtime()?;
    let acquired = rt
        .block_on(InstanceGuard::acquire(&paths.lock_file(), &paths.port_file()))
        .context("Failed to take the single-instance lock")?;
    let (instance, focus) = match acquired {
        Acquired::Primary(guard, focus) => (guard, focus),
        Acquired::AlreadyRunning => {
            info!("Launcher already running for {}", paths.root().display());
            if let Err(e) = signal_running_instance(&paths.port_file()) {
                warn!("Could not reach the running launcher: {e}");
            }
            return Ok(());
        }
    };

    let host: DesktopHost<RfdDialogs> =
        DesktopHost::build(paths, RfdDialogs, std::sync::Arc::new(RfdInstallPrompt))?;
    host.startup();

    let native = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([720.0, 520.0])
            .with_min_inner_size([600.0, 440.0])
            .with_title(PRODUCT_NAME),
        ..Default::default()
    };

    let bridge = host.bridge().clone();
    let result = eframe::run_native(
        PRODUCT_NAME,
        native,
        Box::new(move |cc| {
            theme::setup(&cc.egui_ctx);
            Ok(Box::new(app::LauncherApp::new(cc.egui_ctx.clone(), bridge, focus)))
        }),
    );

    host.shutdown();
    drop(instance);
    result.map_err(|e| anyhow::anyhow!("UI failed: {e}"))
}
