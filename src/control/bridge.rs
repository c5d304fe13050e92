//! Reference-counted bridge to the external control peer

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::InboundEvent;
use crate::error::{MediaKeysError, Result};
use crate::transport::Transport;
use crate::types::identifiers::AgentId;
use crate::types::state::PlaybackState;

use super::protocol::{BridgeMessage, ProtocolHandler};

/// Creates a fresh, unconnected transport for each connection
pub type TransportFactory<T> = Arc<dyn Fn() -> Result<T> + Send + Sync>;

/// Bridge to the control peer
///
/// The connection is opened when the reference count leaves zero and closed
/// when it returns there, or earlier if the peer goes away. Peer commands are
/// forwarded into the engine's event channel as [`InboundEvent::PeerCommand`];
/// the end of the peer's stream arrives as [`InboundEvent::PeerDisconnected`].
///
/// Only a weak sender is kept, so the bridge never keeps the engine's event
/// channel open on its own.
pub struct ExternalControlBridge<T: Transport> {
    connector: TransportFactory<T>,
    events: mpsc::WeakUnboundedSender<InboundEvent>,
    protocol: ProtocolHandler,
    ref_count: usize,
    generation: u64,
    transport: Option<T>,
    forwarder: Option<JoinHandle<()>>,
}

impl<T: Transport> ExternalControlBridge<T> {
    /// Create a closed bridge forwarding into `events`
    pub fn new(connector: TransportFactory<T>, events: &mpsc::UnboundedSender<InboundEvent>) -> Self {
        Self {
            connector,
            events: events.downgrade(),
            protocol: ProtocolHandler::new(),
            ref_count: 0,
            generation: 0,
            transport: None,
            forwarder: None,
        }
    }

    /// Current reference count
    #[must_use]
    pub const fn ref_count(&self) -> usize {
        self.ref_count
    }

    /// Whether the peer connection is open
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Generation of the current or most recent connection
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Take a reference, opening the connection on the first one
    ///
    /// # Errors
    /// `BridgeUnavailable` if the connection cannot be opened; the reference
    /// is not taken in that case
    pub async fn acquire(&mut self) -> Result<()> {
        self.ref_count += 1;
        if self.ref_count > 1 {
            return Ok(());
        }

        match self.open().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.ref_count -= 1;
                log::warn!("Failed to open control bridge: {e}");
                Err(MediaKeysError::bridge_unavailable(e.to_string()))
            }
        }
    }

    async fn open(&mut self) -> Result<()> {
        log::info!("Starting native messaging host");
        let mut transport = (self.connector)()?;
        transport.connect().await?;

        self.generation += 1;
        let generation = self.generation;
        let mut peer_rx = transport.read_messages();
        let events = self.events.clone();
        let protocol = self.protocol;

        let forwarder = tokio::spawn(async move {
            while let Some(message) = peer_rx.recv().await {
                let command = match message.and_then(|value| protocol.parse_peer_message(value)) {
                    Ok(command) => command,
                    Err(e) => {
                        log::warn!("Cannot handle native message: {e}");
                        continue;
                    }
                };

                let Some(events) = events.upgrade() else {
                    return;
                };
                if events.send(InboundEvent::PeerCommand(command)).is_err() {
                    return;
                }
            }

            log::debug!("Control peer stream {generation} ended");
            if let Some(events) = events.upgrade() {
                let _ = events.send(InboundEvent::PeerDisconnected { generation });
            }
        });

        self.transport = Some(transport);
        self.forwarder = Some(forwarder);
        Ok(())
    }

    /// Drop a reference, closing the connection on the last one
    ///
    /// The peer receives `quit` before the connection closes.
    ///
    /// # Errors
    /// Returns error if closing the transport fails; the bridge is closed
    /// regardless
    pub async fn release(&mut self) -> Result<()> {
        match self.ref_count {
            0 => {
                log::warn!("Control bridge released more often than acquired");
                Ok(())
            }
            1 => {
                self.ref_count = 0;
                self.close().await
            }
            _ => {
                self.ref_count -= 1;
                Ok(())
            }
        }
    }

    /// Release every reference
    ///
    /// # Errors
    /// Returns error if closing the transport fails
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.ref_count == 0 {
            return Ok(());
        }
        self.ref_count = 1;
        self.release().await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }

        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };

        if let Err(e) = Self::send(self.protocol, &mut transport, &BridgeMessage::Quit).await {
            log::warn!("Failed to send quit to control peer: {e}");
        }

        log::info!("Closing native messaging host");
        transport.close().await
    }

    /// Drop the connection after the peer went away
    ///
    /// Reports for an older connection are ignored. References stay taken, so
    /// the holders release as usual; the connection is reopened only after
    /// the count returns to zero and a new reference is taken. Returns whether
    /// the connection was dropped.
    pub async fn peer_lost(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.transport.is_none() {
            return false;
        }

        log::warn!("Control peer disconnected");
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                log::warn!("Failed to close control peer: {e}");
            }
        }
        true
    }

    /// Mirror the selected agent's state to the peer
    ///
    /// `None` means no agent is available. Returns whether a message was
    /// sent, which is false while the bridge is closed.
    ///
    /// # Errors
    /// Returns error if the write fails
    pub async fn mirror(&mut self, selection: Option<(&AgentId, &PlaybackState)>) -> Result<bool> {
        let message = match selection {
            Some((agent, state)) => self.protocol.create_update_state(agent, state),
            None => BridgeMessage::RemovePlayer,
        };
        self.send_if_connected(&message).await
    }

    /// Tell the peer a player appeared
    ///
    /// # Errors
    /// Returns error if the write fails
    pub async fn player_added(&mut self) -> Result<bool> {
        self.send_if_connected(&BridgeMessage::AddPlayer).await
    }

    async fn send_if_connected(&mut self, message: &BridgeMessage) -> Result<bool> {
        let Some(mut transport) = self.transport.take() else {
            return Ok(false);
        };
        let sent = Self::send(self.protocol, &mut transport, message).await;
        self.transport = Some(transport);
        sent.map(|()| true)
    }

    async fn send(
        protocol: ProtocolHandler,
        transport: &mut T,
        message: &BridgeMessage,
    ) -> Result<()> {
        let json = protocol.serialize_message(message)?;
        transport.write(&json).await
    }
}

impl<T: Transport> Drop for ExternalControlBridge<T> {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        // The transport's own Drop kills the peer process
    }
}
