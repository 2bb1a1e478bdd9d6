use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use fraktum_app_core::{
    BuildDownloaded, DownloadBuildRequest, GameLaunched, LauncherPort, PresetDialogs, Reply,
    SaveExported, SaveStored,
};
use fraktum_core::{ExecutableInfo, LaunchRequest, StatusPayload, StatusPhase, UpdateEvent};
use fraktum_infra::{DownloadEvent, ReleaseFeed};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{into_result, CliBridge};

pub async fn cmd_exe_show<L: LauncherPort, F: ReleaseFeed>(
    bridge: &CliBridge<L, F>,
) -> Result<Option<ExecutableInfo>> {
    let exe = bridge.get_executable().await;
    match &exe {
        Some(exe) => println!(":: Executable: {} ({})", exe.name, exe.path),
        None => println!(":: No executable configured"),
    }
    Ok(exe)
}

pub async fn cmd_exe_set<L: LauncherPort, F: ReleaseFeed>(
    bridge: &CliBridge<L, F>,
    dialogs: &PresetDialogs,
    path: PathBuf,
) -> Result<ExecutableInfo> {
    let path = absolute(path)?;
    dialogs.set_executable(Some(path.clone()));
    let exe = bridge
        .select_executable()
        .await
        .with_context(|| format!("Failed to remember {}", path.display()))?;
    println!(":: Executable set to {}", exe.path);
    Ok(exe)
}

pub async fn cmd_run<L: LauncherPort, F: ReleaseFeed>(
    bridge: &CliBridge<L, F>,
    game_id: String,
    args: &str,
) -> Result<GameLaunched> {
    let args = shlex::split(args).context("Arguments have unbalanced quotes")?;
    let launched = into_result(bridge.run_game(LaunchRequest::new(game_id, args)).await)?;
    println!(":: Started {}", launched.game_id);
    Ok(launched)
}

pub async fn cmd_save_upload<L: LauncherPort, F: ReleaseFeed>(
    bridge: &CliBridge<L, F>,
    dialogs: &PresetDialogs,
    slot: &str,
    file: PathBuf,
) -> Result<SaveStored> {
    dialogs.set_save_source(Some(absolute(file)?));
    let stored = into_result(bridge.save_import(slot).await)?;
    println!(":: Stored {} as {}", stored.name, stored.file);
    Ok(stored)
}

pub async fn cmd_save_download<L: LauncherPort, F: ReleaseFeed>(
    bridge: &CliBridge<L, F>,
    dialogs: &PresetDialogs,
    slot: &str,
    dest: PathBuf,
) -> Result<SaveExported> {
    dialogs.set_save_destination(Some(absolute(dest)?));
    let exported = into_result(bridge.save_download(slot).await)?;
    println!(":: Exported slot {slot} to {}", exported.file_path);
    Ok(exported)
}

/// Runs one update cycle to completion. Returns `None` for development builds.
pub async fn cmd_update_check<L: LauncherPort, F: ReleaseFeed>(
    bridge: &CliBridge<L, F>,
) -> Result<Option<StatusPayload>> {
    let mut events = bridge
        .take_events()
        .context("Update events are already being consumed")?;

    match bridge.update_check() {
        Reply::Ok(_) => {}
        Reply::Err(failure) if failure.dev => {
            println!(":: {failure}");
            return Ok(None);
        }
        Reply::Err(failure) => bail!("{failure}"),
    }

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Checking for updates...");

    while let Some(event) = events.recv().await {
        match event {
            UpdateEvent::Progress(progress) => pb.set_position(u64::from(progress.percent)),
            UpdateEvent::Status(status) => match status.phase {
                StatusPhase::Checking => {}
                StatusPhase::Available => {
                    let version = status.version.as_deref().unwrap_or("?");
                    pb.set_message(format!("Downloading {version}"));
                }
                StatusPhase::NoUpdate => {
                    pb.finish_and_clear();
                    println!(":: Up to date");
                    return Ok(Some(status));
                }
                StatusPhase::Downloaded => {
                    pb.finish_and_clear();
                    let version = status.version.as_deref().unwrap_or("?");
                    println!(":: Update {version} downloaded; it will be installed on exit");
                    return Ok(Some(status));
                }
                StatusPhase::Error => {
                    pb.abandon();
                    let error = status.error.as_deref().unwrap_or("unknown error");
                    bail!("Update failed: {error}");
                }
            },
        }
    }
    bail!("Updater stopped before the check finished")
}

pub async fn cmd_build_download<L: LauncherPort, F: ReleaseFeed>(
    bridge: &CliBridge<L, F>,
    request: DownloadBuildRequest,
) -> Result<BuildDownloaded> {
    println!(":: Downloading {} from {}", request.game_id, request.url);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} {bytes_per_sec} {msg}",
        )
        .context("Invalid progress template")?
        .progress_chars("=>-"),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    let progress = {
        let pb = pb.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    DownloadEvent::Started { total_bytes } => {
                        pb.set_length(total_bytes.unwrap_or(0));
                        pb.set_position(0);
                    }
                    DownloadEvent::Progress { bytes_delta } => pb.inc(bytes_delta),
                    DownloadEvent::Completed { .. } => {}
                }
            }
        })
    };

    let reply = bridge
        .download_game_build_with_progress(request, Some(tx))
        .await;
    let _ = progress.await;

    match into_result(reply) {
        Ok(build) => {
            pb.finish_and_clear();
            println!(":: Saved {}", build.zip);
            Ok(build)
        }
        Err(e) => {
            pb.abandon();
            Err(e)
        }
    }
}

/// Sends a raw `{ "op": ..., "payload": ... }` request and prints the reply.
pub async fn cmd_invoke<L: LauncherPort, F: ReleaseFeed>(
    bridge: &CliBridge<L, F>,
    request: &str,
) -> Result<serde_json::Value> {
    let reply = bridge.invoke(request).await;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(reply)
}

pub fn cmd_info<L: LauncherPort, F: ReleaseFeed>(bridge: &CliBridge<L, F>) {
    println!(":: Version:  {}", bridge.app_version());
    println!(":: Platform: {}", bridge.platform());
    println!(":: Profile:  {}", bridge.profile_root().display());
    println!(
        ":: Updates:  {}",
        if bridge.updates_enabled() {
            "enabled"
        } else {
            "development build"
        }
    );
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    std::path::absolute(&path).with_context(|| format!("Invalid path {}", path.display()))
}
