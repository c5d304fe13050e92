//! Host command building logic for the native messaging transport

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::config::DANGEROUS_ENV_VARS;

/// Command builder for the native messaging host
pub struct CommandBuilder<'a> {
    host_path: &'a Path,
    origin: Option<&'a str>,
}

impl<'a> CommandBuilder<'a> {
    /// Create a new command builder
    pub const fn new(host_path: &'a Path, origin: Option<&'a str>) -> Self {
        Self { host_path, origin }
    }

    /// Build the host command with piped stdio
    ///
    /// Browsers pass the caller origin as the first argument; the same
    /// convention is kept so an existing host works unchanged.
    pub fn build(&self) -> Command {
        let mut cmd = Command::new(self.host_path);

        if let Some(origin) = self.origin {
            cmd.arg(origin);
        }

        for var in DANGEROUS_ENV_VARS {
            cmd.env_remove(var);
        }

        // stderr is piped, not inherited, so the host cannot touch our terminal
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }
}
