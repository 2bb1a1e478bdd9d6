pub mod commands;

use std::sync::Arc;

use fraktum_app_core::{
    CapabilityBridge, DeferInstall, DesktopHost, HostOptions, PresetDialogs, Reply,
};

/// The bridge as the command line drives it: file choices come from arguments.
pub type CliBridge<L, F> = CapabilityBridge<L, PresetDialogs, F>;

/// Builds the production host for `options`. Downloaded updates are applied on exit.
///
/// The returned dialogs are shared with the host's bridge; commands preset them with the
/// paths given on the command line.
pub fn build_host(
    options: &HostOptions,
) -> anyhow::Result<(DesktopHost<PresetDialogs>, PresetDialogs)> {
    let paths = options.profile_paths()?;
    let dialogs = PresetDialogs::new();
    let host = DesktopHost::build(paths, dialogs.clone(), Arc::new(DeferInstall))?;
    Ok((host, dialogs))
}

/// Turns a refused bridge reply into an error carrying its reason.
pub fn into_result<T>(reply: Reply<T>) -> anyhow::Result<T> {
    match reply {
        Reply::Ok(value) => Ok(value),
        Reply::Err(failure) => Err(anyhow::anyhow!("{failure}")),
    }
}
