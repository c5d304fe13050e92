//! The engine's run loop

use tokio::time::Instant;

use crate::transport::Transport;

use super::{Engine, EventOutcome, InboundEvent};

impl<T: Transport> Engine<T> {
    /// Run until shutdown
    ///
    /// Applies startup options, then handles events, press-end deadlines and
    /// notification expiries one at a time. Ends on [`InboundEvent::Shutdown`]
    /// or when every handle is dropped, closing the bridge either way.
    pub async fn run(mut self) {
        self.start().await;
        log::info!("Media key engine started");

        loop {
            let deadline = self.detector.deadline();

            tokio::select! {
                biased;

                event = self.events.recv() => {
                    let Some(event) = event else {
                        log::debug!("All engine handles dropped");
                        break;
                    };

                    let shutdown = matches!(event, InboundEvent::Shutdown);
                    if let EventOutcome::Unhandled(reason) = self.handle(event).await {
                        log::debug!("Event dropped: {reason}");
                    }
                    if shutdown {
                        break;
                    }
                }

                () = wait_for(deadline) => {
                    self.press_deadline(Instant::now()).await;
                }

                key = self.debouncer.expire_next() => {
                    log::debug!("Notification {key} expired");
                }
            }
        }

        self.stop().await;
        log::info!("Media key engine stopped");
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
