use std::fs;
use tempfile::TempDir;

use kodegen_media_keys::MediaKeysError;
use kodegen_media_keys::manifest::{
    Browser, DEFAULT_FIREFOX_EXTENSION_ID, ManifestLocations, NativeHostManifest, install,
    uninstall,
};
use kodegen_media_keys::transport::native::{HOST_CONFIG_DIR, HOST_EXECUTABLE, HOST_NAME};

const CHROME_ID: &str = "abcdefghijklmnopabcdefghijklmnop";

fn locations() -> (TempDir, ManifestLocations) {
    let root = tempfile::tempdir().unwrap();
    let config = root.path().join("config");
    let home = root.path().join("home");
    fs::create_dir_all(&config).unwrap();
    fs::create_dir_all(&home).unwrap();
    let locations = ManifestLocations::new(config, home);
    (root, locations)
}

#[test]
fn test_chrome_manifest_only_for_installed_browsers() {
    let (root, locations) = locations();
    fs::create_dir_all(root.path().join("config/chromium")).unwrap();

    let manifest =
        NativeHostManifest::new(Browser::Chrome, locations.default_host_path(), CHROME_ID)
            .unwrap();
    let written = install(&locations, Browser::Chrome, &manifest).unwrap();

    let expected = root
        .path()
        .join("config/chromium/NativeMessagingHosts")
        .join(format!("{HOST_NAME}.json"));
    assert_eq!(written, [expected.clone()]);
    assert!(!root.path().join("config/google-chrome").exists());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&expected).unwrap()).unwrap();
    assert_eq!(json["name"], HOST_NAME);
    assert_eq!(
        json["path"],
        root.path()
            .join("config")
            .join(HOST_CONFIG_DIR)
            .join(HOST_EXECUTABLE)
            .to_string_lossy()
            .into_owned()
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&expected).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}

#[test]
fn test_no_browser_dirs_installs_nothing() {
    let (_root, locations) = locations();
    let manifest = NativeHostManifest::new(Browser::Chrome, "/opt/host", CHROME_ID).unwrap();

    assert!(install(&locations, Browser::Chrome, &manifest).unwrap().is_empty());
    assert!(uninstall(&locations, Browser::Chrome).unwrap().is_empty());
}

#[test]
fn test_firefox_install_and_uninstall() {
    let (root, locations) = locations();
    let manifest =
        NativeHostManifest::new(Browser::Firefox, "/opt/host", DEFAULT_FIREFOX_EXTENSION_ID)
            .unwrap();

    let written = install(&locations, Browser::Firefox, &manifest).unwrap();
    assert_eq!(written.len(), 1);
    assert!(written[0].starts_with(root.path().join("home/.mozilla/native-messaging-hosts")));

    let parsed: NativeHostManifest =
        serde_json::from_str(&fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(parsed, manifest);

    let removed = uninstall(&locations, Browser::Firefox).unwrap();
    assert_eq!(removed, written);
    assert!(!written[0].exists());

    // Already gone
    assert!(uninstall(&locations, Browser::Firefox).unwrap().is_empty());
}

#[test]
fn test_invalid_chrome_id_is_rejected() {
    let err = NativeHostManifest::new(Browser::Chrome, "/opt/host", "not-an-id").unwrap_err();
    assert!(matches!(err, MediaKeysError::InvalidConfig(_)));
}
