use std::path::PathBuf;

use super::*;

fn store_in(dir: &tempfile::TempDir) -> FileSessionStore {
    FileSessionStore::new(dir.path().join("nested").join("token"))
}

// =============================================================================
// LOAD / SAVE / CLEAR
// =============================================================================

#[test]
fn load_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(store_in(&dir).load(), None);
}

#[test]
fn save_creates_parent_dirs_and_load_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save("tok_abc");
    assert!(store.path().exists());
    assert_eq!(store.load().as_deref(), Some("tok_abc"));
}

#[test]
fn save_overwrites_previous_credential() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save("a_much_longer_first_token");
    store.save("short");
    assert_eq!(store.load().as_deref(), Some("short"));
}

#[test]
fn load_trims_whitespace_and_ignores_blank_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save("  tok_xyz\n");
    assert_eq!(store.load().as_deref(), Some("tok_xyz"));

    store.save("\n \n");
    assert_eq!(store.load(), None);
}

#[test]
fn clear_removes_file_and_tolerates_missing() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save("tok");
    store.clear();
    assert!(!store.path().exists());
    assert_eq!(store.load(), None);
    store.clear();
}

#[cfg(unix)]
#[test]
fn saved_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save("tok");
    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

// =============================================================================
// DEFAULT PATH
// =============================================================================

#[test]
fn token_path_prefers_xdg_config_home() {
    let path = token_path_from(|name| match name {
        "XDG_CONFIG_HOME" => Some(PathBuf::from("/xdg")),
        "HOME" => Some(PathBuf::from("/home/ruth")),
        _ => None,
    });
    assert_eq!(path, PathBuf::from("/xdg/blessed-belly/token"));
}

#[test]
fn token_path_falls_back_to_home_config() {
    let path = token_path_from(|name| match name {
        "XDG_CONFIG_HOME" => Some(PathBuf::new()),
        "HOME" => Some(PathBuf::from("/home/ruth")),
        _ => None,
    });
    assert_eq!(path, PathBuf::from("/home/ruth/.config/blessed-belly/token"));
}

#[test]
fn token_path_without_home_uses_working_dir() {
    assert_eq!(token_path_from(|_| None), PathBuf::from(".bb-token"));
}
