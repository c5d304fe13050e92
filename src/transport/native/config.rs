//! Configuration constants for the native messaging transport

use tokio_util::codec::LengthDelimitedCodec;

/// Registered native messaging host name
pub const HOST_NAME: &str = "org.mpris.kodegen_media_keys_host";

/// File name of the host executable
pub const HOST_EXECUTABLE: &str = "kodegen-media-keys-mpris";

/// Directory under the XDG config home searched for the host
pub const HOST_CONFIG_DIR: &str = "kodegen-media-keys";

/// Grace period for the host to exit after stdin closes
pub const CLOSE_TIMEOUT_SECS: u64 = 5;

/// Environment variables never forwarded to the host
pub const DANGEROUS_ENV_VARS: &[&str] = &[
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "PYTHONPATH",
];

/// Frame codec for native messaging: 32-bit little-endian length, then JSON
#[must_use]
pub fn frame_codec(max_frame_size: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .little_endian()
        .max_frame_length(max_frame_size)
        .new_codec()
}
