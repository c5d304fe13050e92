//! Native messaging host transport
//!
//! This module spawns the native messaging host (the MPRIS bridge process) and
//! exchanges length-prefixed JSON frames with it over stdin/stdout.

mod command;
mod config;
mod lifecycle;
mod reader;
mod transport;

// Re-export public types
pub use config::{HOST_CONFIG_DIR, HOST_EXECUTABLE, HOST_NAME, frame_codec};
pub use transport::NativeHostTransport;
