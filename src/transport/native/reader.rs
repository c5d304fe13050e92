//! Frame reading logic for the native host transport

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;

use crate::error::{MediaKeysError, Result};

use super::config::frame_codec;
use super::transport::NativeHostTransport;

impl NativeHostTransport {
    /// Read messages from the host's stdout
    ///
    /// Spawns a background task that decodes frames as JSON. A frame that is
    /// not valid JSON is reported on the channel and reading continues; an I/O
    /// error or oversized frame ends the stream.
    pub(super) fn read_messages_impl(
        &mut self,
    ) -> mpsc::UnboundedReceiver<Result<serde_json::Value>> {
        let (tx, rx) = mpsc::unbounded_channel();

        let stdout = self.stdout.take();
        let codec = frame_codec(self.max_frame_size);

        let task = tokio::spawn(async move {
            let Some(stdout) = stdout else {
                let _ = tx.send(Err(MediaKeysError::connection(
                    "Not connected - stdout not available",
                )));
                return;
            };

            let mut frames = FramedRead::new(stdout, codec);

            while let Some(frame) = frames.next().await {
                let message = match frame {
                    Ok(bytes) => serde_json::from_slice::<serde_json::Value>(&bytes)
                        .map_err(MediaKeysError::from),
                    Err(e) => {
                        let _ = tx.send(Err(MediaKeysError::Io(e)));
                        break;
                    }
                };

                if tx.send(message).is_err() {
                    // Receiver dropped, stop reading
                    break;
                }
            }

            log::debug!("Native host output closed");
        });

        self.reader_task = Some(task);

        rx
    }
}
