use std::collections::HashMap;

use super::*;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite:menus.db"), "sqlite://menus.db");
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(normalize_database_url("  "), Settings::default().database_url);
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("menu_admin.toml");
    fs::write(
        &path,
        "database_url = \"sqlite://./menus.db\"\npage_size = 25\nlog_filter = \"debug\"\n",
    )
    .expect("write config");

    let settings = load_settings_with(Some(path.as_path()), env_from(&[])).expect("settings");
    assert_eq!(settings.database_url, "sqlite://./menus.db");
    assert_eq!(settings.page_size, 25);
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("menu_admin.toml");
    fs::write(&path, "page_size = 25\n").expect("write config");

    let settings = load_settings_with(
        Some(path.as_path()),
        env_from(&[
            ("MENU_ADMIN_DATABASE_URL", "first.db"),
            ("APP__DATABASE_URL", "second.db"),
            ("APP__PAGE_SIZE", "40"),
        ]),
    )
    .expect("settings");
    assert_eq!(settings.database_url, "sqlite://second.db");
    assert_eq!(settings.page_size, 40);
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn unparsable_env_page_size_is_ignored_and_zero_is_clamped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("menu_admin.toml");
    fs::write(&path, "page_size = 0\n").expect("write config");

    let settings =
        load_settings_with(Some(path.as_path()), env_from(&[("APP__PAGE_SIZE", "lots")])).expect("settings");
    assert_eq!(settings.page_size, 1);
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.toml");
    let err = load_settings_with(Some(missing.as_path()), env_from(&[])).expect_err("missing file");
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("menu_admin.toml");
    fs::write(&path, "page_size = \"ten\"\n").expect("write config");
    assert!(load_settings_with(Some(path.as_path()), env_from(&[])).is_err());
}
