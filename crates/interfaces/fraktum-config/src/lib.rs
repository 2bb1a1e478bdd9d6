//! Central configuration constants for paths, limits and defaults.

/// `directories::ProjectDirs` identity.
pub const APP_QUALIFIER: &str = "com";
pub const APP_ORGANIZATION: &str = "fraktum";
pub const APP_NAME: &str = "launcher";

/// Human readable product name used for window titles and dialogs.
pub const PRODUCT_NAME: &str = "Fraktum Launcher";

pub const CONFIG_FILE: &str = "config.json";
pub const SAVES_DIR: &str = "saves";
pub const SAVE_EXTENSION: &str = "zip";
pub const GAMES_DIR: &str = "games";
pub const LOGS_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "launcher.log";
pub const LOCK_FILE: &str = "launcher.lock";
pub const PORT_FILE: &str = "launcher.port";

/// Version directory used for game builds downloaded without an explicit version.
pub const LATEST_BUILD_DIR: &str = "latest";
/// File name used when a build URL has no usable last path segment.
pub const DEFAULT_BUILD_FILE: &str = "build.zip";

pub const DEFAULT_UPDATE_URL: &str = "https://github.com/fraktum/launcher/releases/latest/download";

/// Overrides the release feed. An empty value disables the updater.
pub const UPDATE_URL_ENV: &str = "FRAKTUM_UPDATE_URL";
/// Overrides the base directory profiles are resolved against.
pub const DATA_DIR_ENV: &str = "FRAKTUM_DATA_DIR";

/// Longest accepted slot, profile, game or version path segment.
pub const MAX_SEGMENT_LEN: usize = 64;
/// Longest accepted opaque game identifier for launches.
pub const MAX_GAME_ID_LEN: usize = 128;
/// Most arguments forwarded to a launched game.
pub const MAX_LAUNCH_ARGS: usize = 256;
/// Largest accepted save blob (bytes). 256 MiB.
pub const MAX_SAVE_BYTES: usize = 256 * 1024 * 1024;

/// Attempts made for a game build download before giving up on transport errors.
pub const DOWNLOAD_ATTEMPTS: u32 = 3;
pub const DOWNLOAD_RETRY_DELAY_MS: u64 = 500;

/// How long a second instance waits to hand its focus request to the first.
pub const FOCUS_SIGNAL_TIMEOUT_MS: u64 = 500;

/// Release feed URL, or `None` when the updater is switched off via the environment.
pub fn update_feed_url() -> Option<String> {
    match std::env::var(UPDATE_URL_ENV) {
        Ok(url) if url.trim().is_empty() => None,
        Ok(url) => Some(url),
        Err(_) => Some(DEFAULT_UPDATE_URL.to_owned()),
    }
}

pub fn build_version_string() -> &'static str {
    option_env!("FRAKTUM_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}
