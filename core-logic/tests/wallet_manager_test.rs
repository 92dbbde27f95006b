use core_logic::{ConfigError, CoreError, WalletError, WalletManager};
use std::fs;
use tempfile::TempDir;

fn write_key(dir: &TempDir, name: &str, bytes: &[u8]) {
    let json = serde_json::to_string(bytes).unwrap();
    fs::write(dir.path().join(name), json).unwrap();
}

#[test]
fn test_missing_directory_is_config_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("keys");

    match WalletManager::new(&missing) {
        Err(CoreError::Config(ConfigError::FileNotFound { path })) => {
            assert!(path.ends_with("keys"));
        }
        other => panic!("expected FileNotFound, got {:?}", other),
    }
}

#[test]
fn test_scans_only_json_files_sorted() {
    let dir = TempDir::new().unwrap();
    write_key(&dir, "b.json", &[2; 64]);
    write_key(&dir, "a.json", &[1; 64]);
    fs::write(dir.path().join("notes.txt"), "not a key").unwrap();

    let manager = WalletManager::new(dir.path()).unwrap();

    assert_eq!(manager.count(), 2);
    assert_eq!(manager.list_wallets(), vec!["a.json", "b.json"]);

    let keys = manager.load_all().unwrap();
    assert_eq!(keys[0].bytes(), &[1u8; 64][..]);
    assert_eq!(keys[1].bytes(), &[2u8; 64][..]);
}

#[test]
fn test_malformed_key_file_fails_the_load() {
    let dir = TempDir::new().unwrap();
    write_key(&dir, "a.json", &[1; 64]);
    fs::write(dir.path().join("b.json"), "{\"secret\": true}").unwrap();

    let manager = WalletManager::new(dir.path()).unwrap();

    match manager.load_all() {
        Err(WalletError::DecodeFailed { path, .. }) => assert!(path.ends_with("b.json")),
        other => panic!("expected DecodeFailed, got {:?}", other),
    }
}

#[test]
fn test_byte_out_of_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.json"), "[1, 2, 300]").unwrap();

    let manager = WalletManager::new(dir.path()).unwrap();

    assert!(matches!(
        manager.load_all(),
        Err(WalletError::DecodeFailed { .. })
    ));
}

#[test]
fn test_expected_length_is_enforced() {
    let dir = TempDir::new().unwrap();
    write_key(&dir, "short.json", &[7; 32]);

    let manager = WalletManager::new(dir.path())
        .unwrap()
        .with_expected_len(64);

    assert_eq!(
        manager.load_all().unwrap_err(),
        WalletError::InvalidKeyLength {
            path: dir.path().join("short.json").display().to_string(),
            expected: 64,
            length: 32,
        }
    );
}

#[test]
fn test_debug_output_redacts_secret() {
    let dir = TempDir::new().unwrap();
    write_key(&dir, "a.json", &[42; 64]);

    let keys = WalletManager::new(dir.path()).unwrap().load_all().unwrap();
    let debug = format!("{:?}", keys[0]);

    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("42, 42"));
}
