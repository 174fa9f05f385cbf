use std::io::Write;

use launchpad_client::file_backend::FileBackend;
use launchpad_client::storage::{
    MAX_STORE_BYTES, SAVED_SERVERS_FILE, SETTINGS_FILE, Settings, load_json_from_path,
    load_json_or_default, save_json_with_retry,
};
use launchpad_core::{Backend, ServerProfile};

fn languages() -> Vec<String> {
    vec!["en-US".to_owned(), "fr-FR".to_owned()]
}

#[test]
fn load_ignores_oversized_file() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let path = dir.path().join(SAVED_SERVERS_FILE);

    let mut file = std::fs::File::create(&path).expect("create saved-servers.json");
    file.write_all(&vec![b'a'; (MAX_STORE_BYTES as usize) + 1024])
        .expect("write oversized saved-servers.json");
    drop(file);

    let err = load_json_from_path::<Vec<ServerProfile>>(&path)
        .expect_err("oversized file should error");
    let msg = err.to_string();
    assert!(msg.contains("too large"), "unexpected error: {msg}");

    let fallback: Vec<ServerProfile> = load_json_or_default(&path);
    assert!(fallback.is_empty());
}

#[test]
fn saved_list_is_pretty_json_in_list_order() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let path = dir.path().join(SAVED_SERVERS_FILE);
    let profiles = vec![
        ServerProfile {
            nickname: "Home".to_owned(),
            udp_endpoint: "127.0.0.1:20042".to_owned(),
            https_endpoint: "https://127.0.0.1".to_owned(),
        },
        ServerProfile::named("Club"),
    ];

    save_json_with_retry(&path, &profiles).expect("save profiles");
    let raw = std::fs::read_to_string(&path).expect("read back");
    assert!(raw.contains("\n  {"), "expected pretty output: {raw}");
    assert!(raw.contains("\"udp_endpoint\": \"127.0.0.1:20042\""));

    let loaded: Vec<ServerProfile> = load_json_from_path(&path).expect("load profiles");
    assert_eq!(loaded, profiles);
}

#[tokio::test]
async fn malformed_files_open_as_empty_defaults() {
    let dir = tempfile::tempdir().expect("create tempdir");
    std::fs::write(dir.path().join(SAVED_SERVERS_FILE), "[{\"nickname\": ").unwrap();
    std::fs::write(dir.path().join(SETTINGS_FILE), "not json").unwrap();

    let backend = FileBackend::open(dir.path(), languages());
    assert!(backend.load_profiles().await.unwrap().is_empty());
    assert_eq!(backend.current_language().await, Settings::default().language);
    assert!(backend.list_installed_clients().await.unwrap().is_empty());

    // The next write replaces the broken file with a valid one.
    backend.add_profile(ServerProfile::named("Fresh")).await.unwrap();
    let loaded: Vec<ServerProfile> =
        load_json_from_path(&dir.path().join(SAVED_SERVERS_FILE)).unwrap();
    assert_eq!(loaded, vec![ServerProfile::named("Fresh")]);
}

#[tokio::test]
async fn unknown_saved_language_falls_back_to_default() {
    let dir = tempfile::tempdir().expect("create tempdir");
    save_json_with_retry(
        &dir.path().join(SETTINGS_FILE),
        &Settings {
            language: "xx-XX".to_owned(),
        },
    )
    .unwrap();
    let backend = FileBackend::open(dir.path(), languages());
    assert_eq!(backend.current_language().await, "en-US");
}
