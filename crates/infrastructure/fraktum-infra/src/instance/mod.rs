//! One launcher process per profile.
//!
//! The first process takes an exclusive lock on `launcher.lock` and listens on a loopback
//! port published in `launcher.port` together with a random token. A later process that
//! fails to take the lock connects to that port, sends `focus <token>` and exits.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fraktum_config::FOCUS_SIGNAL_TIMEOUT_MS;
use fs2::FileExt;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const FOCUS_COMMAND: &str = "focus";

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("port file is malformed: {0}")]
    MalformedPortFile(String),
}

/// Outcome of trying to become the running instance for a profile.
pub enum Acquired {
    Primary(InstanceGuard, FocusRequests),
    AlreadyRunning,
}

/// Holds the profile lock for as long as it lives.
pub struct InstanceGuard {
    _lock: File,
    port_file: PathBuf,
    accept_task: tokio::task::JoinHandle<()>,
}

impl InstanceGuard {
    /// Must be called from within a tokio runtime.
    pub async fn acquire(lock_file: &Path, port_file: &Path) -> Result<Acquired, InstanceError> {
        if let Some(parent) = lock_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(lock_file)?;
        if lock.try_lock_exclusive().is_err() {
            info!("Another instance holds {}", lock_file.display());
            return Ok(Acquired::AlreadyRunning);
        }

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        let token = uuid::Uuid::new_v4().simple().to_string();
        write_port_file(port_file, port, &token)?;
        debug!("Instance listener on 127.0.0.1:{port}");

        let (tx, rx) = mpsc::unbounded_channel();
        let accept_task = tokio::spawn(accept_focus_requests(listener, token, tx));

        Ok(Acquired::Primary(
            InstanceGuard {
                _lock: lock,
                port_file: port_file.to_path_buf(),
                accept_task,
            },
            FocusRequests { rx },
        ))
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        self.accept_task.abort();
        let _ = std::fs::remove_file(&self.port_file);
    }
}

/// Focus requests forwarded from later launcher processes.
pub struct FocusRequests {
    rx: mpsc::UnboundedReceiver<()>,
}

impl FocusRequests {
    pub async fn next(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<()> {
        self.rx.try_recv().ok()
    }
}

async fn accept_focus_requests(
    listener: TcpListener,
    token: String,
    tx: mpsc::UnboundedSender<()>,
) {
    let expected = format!("{FOCUS_COMMAND} {token}");
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Instance listener failed: {e}");
                return;
            }
        };

        let mut line = String::new();
        let mut reader = BufReader::new(stream);
        let read = tokio::time::timeout(
            Duration::from_millis(FOCUS_SIGNAL_TIMEOUT_MS),
            reader.read_line(&mut line),
        )
        .await;

        match read {
            Ok(Ok(_)) if line.trim_end() == expected => {
                info!("Focus requested by a second instance");
                if tx.send(()).is_err() {
                    return;
                }
            }
            _ => debug!("Ignoring unexpected instance connection from {peer}"),
        }
    }
}

fn write_port_file(path: &Path, port: u16, token: &str) -> Result<(), InstanceError> {
    let tmp = path.with_extension("port.tmp");
    let mut file = File::create(&tmp)?;
    writeln!(file, "{port} {token}")?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn read_port_file(path: &Path) -> Result<(u16, String), InstanceError> {
    let content = std::fs::read_to_string(path)?;
    let mut parts = content.split_whitespace();
    let port = parts
        .next()
        .and_then(|p| p.parse::<u16>().ok())
        .ok_or_else(|| InstanceError::MalformedPortFile(content.clone()))?;
    let token = parts
        .next()
        .ok_or_else(|| InstanceError::MalformedPortFile(content.clone()))?;
    Ok((port, token.to_owned()))
}

/// Asks the running instance to bring its window to the front.
pub fn signal_running_instance(port_file: &Path) -> Result<(), InstanceError> {
    let (port, token) = read_port_file(port_file)?;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let timeout = Duration::from_millis(FOCUS_SIGNAL_TIMEOUT_MS);

    let mut stream = TcpStream::connect_timeout(&addr, timeout)?;
    stream.set_write_timeout(Some(timeout))?;
    writeln!(stream, "{FOCUS_COMMAND} {token}")?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher.port");
        write_port_file(&path, 40123, "abc").unwrap();
        assert_eq!(read_port_file(&path).unwrap(), (40123, "abc".to_string()));
    }

    #[test]
    fn malformed_port_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher.port");
        std::fs::write(&path, "not-a-port").unwrap();
        assert!(matches!(
            read_port_file(&path),
            Err(InstanceError::MalformedPortFile(_))
        ));
    }
}
