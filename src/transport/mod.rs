//! Transport layer for the external control peer
//!
//! This module provides the transport abstraction and the native messaging
//! host implementation used by the MPRIS bridge.

pub mod native;

use tokio::sync::mpsc;

use crate::error::Result;

/// Transport trait for communicating with the control peer
///
/// This trait defines the interface for sending and receiving JSON messages
/// to/from the peer process.
pub trait Transport: Send + Sync {
    /// Connect to the transport
    ///
    /// # Errors
    /// Returns error if connection fails
    fn connect(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Write one message to the transport
    ///
    /// # Arguments
    /// * `data` - JSON text of a single message
    ///
    /// # Errors
    /// Returns error if write fails or transport is not ready
    fn write(&mut self, data: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Read messages from the transport
    ///
    /// Returns a receiver that yields JSON values sent by the peer. A
    /// background task reads the messages, so writes can proceed
    /// concurrently. The receiver closes when the transport ends or fails.
    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<serde_json::Value>>;

    /// Check if transport is ready for communication
    fn is_ready(&self) -> bool;

    /// Close the transport and clean up resources
    ///
    /// # Errors
    /// Returns error if cleanup fails
    fn close(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub use native::NativeHostTransport;
