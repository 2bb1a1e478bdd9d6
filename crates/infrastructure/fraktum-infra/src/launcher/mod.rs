use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use fraktum_core::ErrorKind;
use thiserror::Error;
use tracing::info;

pub mod platform;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("refusing to open non-http url: {0}")]
    UnsupportedUrl(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LaunchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LaunchError::Spawn { .. } | LaunchError::Io(_) => ErrorKind::SpawnFailed,
            LaunchError::UnsupportedUrl(_) => ErrorKind::ValidationFailure,
        }
    }
}

/// What is known about a launched game once the launcher has let go of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchReceipt {
    pub pid: u32,
}

/// Starts the configured game executable as an independent process.
///
/// The launcher does not monitor the child: no exit codes, no restarts. The child keeps
/// running after the launcher exits.
pub struct Launcher {
    exe_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedLaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl Launcher {
    pub fn new(exe_path: impl Into<PathBuf>) -> Self {
        Self {
            exe_path: exe_path.into(),
        }
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe_path
    }

    pub(crate) fn resolve_command(&self, args: &[String]) -> ResolvedLaunchCommand {
        let working_dir = self
            .exe_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        ResolvedLaunchCommand {
            program: self.exe_path.clone(),
            args: args.to_vec(),
            working_dir,
        }
    }

    /// Spawns the executable detached with null stdio and drops the child handle.
    pub fn launch_detached(&self, args: &[String]) -> Result<LaunchReceipt, LaunchError> {
        let cmd = self.resolve_command(args);

        info!(
            "Launching program: {:?}, args: {:?}, cwd: {:?}",
            cmd.program, cmd.args, cmd.working_dir
        );

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .current_dir(&cmd.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        platform::detach(&mut command);

        let child = command.spawn().map_err(|source| LaunchError::Spawn {
            program: cmd.program.display().to_string(),
            source,
        })?;
        let receipt = LaunchReceipt { pid: child.id() };
        drop(child);

        info!("Launched pid {}", receipt.pid);
        Ok(receipt)
    }
}

/// True for absolute `http://` or `https://` URLs (scheme compared case-insensitively).
pub fn is_web_url(url: &str) -> bool {
    let url = url.trim_start().as_bytes();
    let has_scheme =
        |scheme: &[u8]| url.len() >= scheme.len() && url[..scheme.len()].eq_ignore_ascii_case(scheme);
    has_scheme(b"https://") || has_scheme(b"http://")
}

/// Opens a web URL in the system browser.
pub fn open_url(url: &str) -> Result<(), LaunchError> {
    if !is_web_url(url) {
        return Err(LaunchError::UnsupportedUrl(url.to_owned()));
    }

    #[cfg(target_os = "windows")]
    {
        Command::new("cmd")
            .args(["/C", "start", "", url])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }

    #[cfg(target_os = "macos")]
    {
        Command::new("open")
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Command::new("xdg-open")
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_dir_is_the_executable_directory() {
        let launcher = Launcher::new("/opt/games/novel/Novel");
        let cmd = launcher.resolve_command(&["--fullscreen".to_string()]);

        assert_eq!(cmd.program, PathBuf::from("/opt/games/novel/Novel"));
        assert_eq!(cmd.args, vec!["--fullscreen".to_string()]);
        assert_eq!(cmd.working_dir, PathBuf::from("/opt/games/novel"));
    }

    #[test]
    fn bare_program_name_runs_from_current_dir() {
        let cmd = Launcher::new("game").resolve_command(&[]);
        assert_eq!(cmd.working_dir, PathBuf::from("."));
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::new(dir.path().join("does-not-exist"));

        let err = launcher.launch_detached(&[]).unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
        assert_eq!(err.kind(), ErrorKind::SpawnFailed);
    }

    #[test]
    fn only_http_urls_are_web_urls() {
        assert!(is_web_url("https://fraktum.example/news"));
        assert!(is_web_url("HTTP://example.com"));
        assert!(!is_web_url("file:///etc/passwd"));
        assert!(!is_web_url("javascript:alert(1)"));
        assert!(!is_web_url("http:/broken"));
        assert!(is_web_url("http://é.example/"));
        assert!(is_web_url("https://ü"));
        assert!(!is_web_url("ftp://é"));
        assert!(!is_web_url("é"));
        assert!(matches!(
            open_url("steam://run/1"),
            Err(LaunchError::UnsupportedUrl(_))
        ));
    }
}
