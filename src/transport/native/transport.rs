//! Native messaging host transport implementation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::SinkExt;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::bytes::Bytes;
use tokio_util::codec::{FramedWrite, LengthDelimitedCodec};

use crate::error::{MediaKeysError, Result};
use crate::transport::Transport;
use crate::types::options::DEFAULT_MAX_FRAME_SIZE;

use super::config::{HOST_CONFIG_DIR, HOST_EXECUTABLE};

/// Transport that owns a native messaging host process
pub struct NativeHostTransport {
    pub(super) host_path: PathBuf,
    pub(super) origin: Option<String>,
    pub(super) process: Option<Child>,
    pub(super) writer: Option<FramedWrite<ChildStdin, LengthDelimitedCodec>>,
    pub(super) stdout: Option<ChildStdout>,
    pub(super) ready: Arc<AtomicBool>,
    pub(super) max_frame_size: usize,
    pub(super) reader_task: Option<JoinHandle<()>>,
    pub(super) stderr_task: Option<JoinHandle<()>>,
}

impl NativeHostTransport {
    /// Create a new host transport
    ///
    /// # Arguments
    /// * `host_path` - Optional path to the host executable (searched if None)
    /// * `max_frame_size` - Largest accepted frame in bytes
    ///
    /// # Errors
    /// Returns error if the host cannot be found
    pub fn new(host_path: Option<PathBuf>, max_frame_size: usize) -> Result<Self> {
        let host_path = match host_path {
            Some(path) => path,
            None => Self::find_host()?,
        };

        Ok(Self {
            host_path,
            origin: None,
            process: None,
            writer: None,
            stdout: None,
            ready: Arc::new(AtomicBool::new(false)),
            max_frame_size,
            reader_task: None,
            stderr_task: None,
        })
    }

    /// Create a transport for a known host path with default limits
    #[must_use]
    pub fn with_host(host_path: impl Into<PathBuf>) -> Self {
        Self {
            host_path: host_path.into(),
            origin: None,
            process: None,
            writer: None,
            stdout: None,
            ready: Arc::new(AtomicBool::new(false)),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            reader_task: None,
            stderr_task: None,
        }
    }

    /// Pass `origin` to the host as its first argument
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Path of the host executable
    #[must_use]
    pub fn host_path(&self) -> &Path {
        &self.host_path
    }

    /// Find the native messaging host binary
    ///
    /// # Errors
    /// Returns error if the host cannot be found in PATH or the config dir
    pub fn find_host() -> Result<PathBuf> {
        if let Ok(path) = which::which(HOST_EXECUTABLE) {
            return Ok(path);
        }

        let home = dirs::home_dir();
        let config_home = dirs::config_dir();

        search_paths(home.as_deref(), config_home.as_deref())
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(|| {
                MediaKeysError::host_not_found(format!(
                    "{HOST_EXECUTABLE} is not on PATH or in the usual install locations"
                ))
            })
    }
}

/// Install locations searched after `PATH`
///
/// Locations under an unknown home or config directory are skipped.
fn search_paths(home: Option<&Path>, config_home: Option<&Path>) -> Vec<PathBuf> {
    let config_home = config_home
        .map(Path::to_path_buf)
        .or_else(|| home.map(|home| home.join(".config")));

    let mut locations = Vec::new();
    if let Some(config_home) = config_home {
        locations.push(config_home.join(HOST_CONFIG_DIR).join(HOST_EXECUTABLE));
    }
    if let Some(home) = home {
        locations.push(home.join(".local/bin").join(HOST_EXECUTABLE));
    }
    locations.push(PathBuf::from("/usr/local/bin").join(HOST_EXECUTABLE));
    locations
}

impl Transport for NativeHostTransport {
    async fn connect(&mut self) -> Result<()> {
        self.connect_impl().await
    }

    async fn write(&mut self, data: &str) -> Result<()> {
        if !self.is_ready() {
            return Err(MediaKeysError::transport("Transport is not ready for writing"));
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| MediaKeysError::transport("stdin not available"))?;

        writer
            .send(Bytes::copy_from_slice(data.as_bytes()))
            .await
            .map_err(|e| MediaKeysError::transport(format!("Failed to write frame: {e}")))
    }

    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<serde_json::Value>> {
        self.read_messages_impl()
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        self.close_impl().await
    }
}

impl Drop for NativeHostTransport {
    fn drop(&mut self) {
        self.drop_impl();
    }
}
