//! Native messaging host manifests
//!
//! Browsers only start a native messaging host that is described by a
//! manifest in a well-known directory. Chrome and Chromium look under their
//! config directories; Firefox looks under `~/.mozilla`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MediaKeysError, Result};
use crate::transport::native::{HOST_CONFIG_DIR, HOST_EXECUTABLE, HOST_NAME};

/// Extension id used for Firefox when none is given
pub const DEFAULT_FIREFOX_EXTENSION_ID: &str = "media-keys@kodegen.ai";

const CHROME_ID_LEN: usize = 32;
const CHROME_CONFIG_DIRS: &[&str] = &["chromium", "google-chrome"];
const CHROME_HOSTS_DIR: &str = "NativeMessagingHosts";
const FIREFOX_HOSTS_DIR: &str = ".mozilla/native-messaging-hosts";

/// Browser family a manifest is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    /// Chrome and Chromium
    Chrome,
    /// Firefox
    Firefox,
}

/// Manifest describing the host to the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeHostManifest {
    /// Registered host name
    pub name: String,
    /// Human readable description
    pub description: String,
    /// Absolute path of the host executable
    pub path: PathBuf,
    /// Always `stdio`
    #[serde(rename = "type")]
    pub kind: String,
    /// Chrome extension origins allowed to connect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    /// Firefox extension ids allowed to connect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
}

impl NativeHostManifest {
    /// Manifest for `browser` allowing `extension_id`
    ///
    /// # Errors
    /// `InvalidConfig` if a Chrome extension id is malformed
    pub fn new(
        browser: Browser,
        host_path: impl Into<PathBuf>,
        extension_id: &str,
    ) -> Result<Self> {
        let mut manifest = Self {
            name: HOST_NAME.to_string(),
            description: "Kodegen media keys MPRIS native messaging host".to_string(),
            path: host_path.into(),
            kind: "stdio".to_string(),
            allowed_origins: None,
            allowed_extensions: None,
        };

        match browser {
            Browser::Chrome => {
                validate_chrome_id(extension_id)?;
                manifest.allowed_origins =
                    Some(vec![format!("chrome-extension://{extension_id}/")]);
            }
            Browser::Firefox => {
                manifest.allowed_extensions = Some(vec![extension_id.to_string()]);
            }
        }

        Ok(manifest)
    }
}

/// Check a Chrome extension id
///
/// Chrome ids are 32 characters drawn from `a` through `p`.
///
/// # Errors
/// `InvalidConfig` if the id has the wrong length or alphabet
pub fn validate_chrome_id(id: &str) -> Result<()> {
    let valid = id.len() == CHROME_ID_LEN && id.bytes().all(|b| (b'a'..=b'p').contains(&b));
    if valid {
        Ok(())
    } else {
        Err(MediaKeysError::invalid_config(format!("Not a valid extension ID: {id}")))
    }
}

/// Base directories manifests are placed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLocations {
    config_home: PathBuf,
    home: PathBuf,
}

impl ManifestLocations {
    /// Use explicit config and home directories
    pub fn new(config_home: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            config_home: config_home.into(),
            home: home.into(),
        }
    }

    /// Use the current user's directories
    ///
    /// # Errors
    /// `InvalidConfig` if the home or config directory is unknown
    pub fn from_env() -> Result<Self> {
        let config_home = dirs::config_dir()
            .ok_or_else(|| MediaKeysError::invalid_config("Cannot determine config directory"))?;
        let home = dirs::home_dir()
            .ok_or_else(|| MediaKeysError::invalid_config("Cannot determine home directory"))?;
        Ok(Self::new(config_home, home))
    }

    /// Default install location of the host executable
    #[must_use]
    pub fn default_host_path(&self) -> PathBuf {
        self.config_home.join(HOST_CONFIG_DIR).join(HOST_EXECUTABLE)
    }

    /// Manifest files for `browser`
    ///
    /// Chrome manifests are listed only for browsers whose config directory
    /// exists.
    #[must_use]
    pub fn manifest_paths(&self, browser: Browser) -> Vec<PathBuf> {
        let file_name = manifest_file_name();
        match browser {
            Browser::Chrome => CHROME_CONFIG_DIRS
                .iter()
                .map(|dir| self.config_home.join(dir))
                .filter(|dir| dir.exists())
                .map(|dir| dir.join(CHROME_HOSTS_DIR).join(&file_name))
                .collect(),
            Browser::Firefox => vec![self.home.join(FIREFOX_HOSTS_DIR).join(file_name)],
        }
    }
}

fn manifest_file_name() -> String {
    format!("{HOST_NAME}.json")
}

/// Write `manifest` for `browser`
///
/// Returns the files written.
///
/// # Errors
/// Returns error if a directory or file cannot be written
pub fn install(
    locations: &ManifestLocations,
    browser: Browser,
    manifest: &NativeHostManifest,
) -> Result<Vec<PathBuf>> {
    let json = serde_json::to_string_pretty(manifest)?;
    let paths = locations.manifest_paths(browser);

    if paths.is_empty() {
        log::warn!("No {browser:?} config directory found; nothing installed");
    }

    for path in &paths {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &json)?;
        set_readable(path)?;
        log::info!("Installed native host manifest {}", path.display());
    }

    Ok(paths)
}

/// Remove the manifests for `browser`
///
/// Missing files are skipped. Returns the files removed.
///
/// # Errors
/// Returns error if an existing file cannot be removed
pub fn uninstall(locations: &ManifestLocations, browser: Browser) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for path in locations.manifest_paths(browser) {
        if !path.is_file() {
            continue;
        }
        fs::remove_file(&path)?;
        log::info!("Removed native host manifest {}", path.display());
        removed.push(path);
    }

    Ok(removed)
}

#[cfg(unix)]
fn set_readable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_readable(_path: &Path) -> Result<()> {
    Ok(())
}
