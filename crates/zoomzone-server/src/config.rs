//! Where the daemon listens and how it treats connections.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub socket_path: PathBuf,

    /// Per-request read/write deadline. A booking waits on the calendar
    /// twice and on Zoom once, so this stays well above the client's.
    pub connection_timeout: Duration,

    pub max_connections: usize,

    /// Replace a leftover socket file nobody is listening on.
    pub cleanup_stale_socket: bool,
}

impl ServerConfig {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            connection_timeout: Duration::from_secs(60),
            max_connections: 32,
            cleanup_stale_socket: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(default_socket_path())
    }
}

/// `$XDG_RUNTIME_DIR/zoomzone.sock`, or `/tmp/zoomzone-$UID.sock` when no
/// runtime directory is set.
pub fn default_socket_path() -> PathBuf {
    if let Some(runtime_dir) = std::env::var_os("XDG_RUNTIME_DIR")
        && !runtime_dir.is_empty()
    {
        return PathBuf::from(runtime_dir).join("zoomzone.sock");
    }
    PathBuf::from(format!("/tmp/zoomzone-{}.sock", current_uid()))
}

#[cfg(unix)]
fn current_uid() -> u32 {
    // SAFETY: getuid has no preconditions and cannot fail.
    unsafe { libc::getuid() }
}

#[cfg(not(unix))]
fn current_uid() -> u32 {
    0
}
