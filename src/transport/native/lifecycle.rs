//! Lifecycle management for the native host transport (connect, close)

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::io::AsyncBufReadExt;
use tokio_util::codec::FramedWrite;

use crate::error::{MediaKeysError, Result};

use super::command::CommandBuilder;
use super::config::{CLOSE_TIMEOUT_SECS, frame_codec};
use super::transport::NativeHostTransport;

impl NativeHostTransport {
    /// Spawn the host process and set up the framed stdio pipes
    ///
    /// # Errors
    /// Returns error if the process cannot be spawned or its stdio handles
    /// are missing
    pub(super) async fn connect_impl(&mut self) -> Result<()> {
        if self.process.is_some() {
            return Ok(());
        }

        let mut cmd = CommandBuilder::new(&self.host_path, self.origin.as_deref()).build();

        let mut child = cmd.spawn().map_err(|e| {
            MediaKeysError::connection(format!(
                "Failed to start native host {}: {e}",
                self.host_path.display()
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaKeysError::connection("Failed to get stdin handle"))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaKeysError::connection("Failed to get stdout handle"))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaKeysError::connection("Failed to get stderr handle"))?;

        // Drain stderr so the host never blocks on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut lines = tokio::io::BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                log::debug!("[native host] {line}");
            }
        });

        self.writer = Some(FramedWrite::new(stdin, frame_codec(self.max_frame_size)));
        self.stdout = Some(stdout);
        self.process = Some(child);
        self.stderr_task = Some(stderr_task);
        self.ready.store(true, Ordering::SeqCst);

        log::info!("Started native host {}", self.host_path.display());
        Ok(())
    }

    /// Close the transport and clean up resources
    ///
    /// # Errors
    /// Returns error if waiting on the host process fails
    pub(super) async fn close_impl(&mut self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);

        // Closing stdin tells the host to exit
        if let Some(mut writer) = self.writer.take() {
            use futures::SinkExt;
            let _ = SinkExt::<tokio_util::bytes::Bytes>::close(&mut writer).await;
        }

        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }

        self.stdout = None;

        if let Some(mut child) = self.process.take() {
            let timeout_duration = Duration::from_secs(CLOSE_TIMEOUT_SECS);

            match tokio::time::timeout(timeout_duration, child.wait()).await {
                Ok(Ok(status)) => {
                    log::debug!("Native host exited with {status}");
                }
                Ok(Err(e)) => {
                    return Err(MediaKeysError::Io(e));
                }
                Err(_) => {
                    log::warn!("Native host did not exit in {CLOSE_TIMEOUT_SECS}s, killing it");
                    let _ = child.kill().await;
                    let _ = child.wait().await;
                }
            }
        }

        Ok(())
    }

    /// Handle Drop cleanup
    pub(super) fn drop_impl(&mut self) {
        self.writer = None;

        if let Some(task) = self.reader_task.take() {
            task.abort();
        }

        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }

        if let Some(mut child) = self.process.take() {
            let _ = child.start_kill();
        }
    }
}
