//! Where DocPresenter keeps its preferences, stored documents and logs.
//!
//! Development runs (cargo run, debug builds) keep everything next to the
//! working directory. Installed builds use the platform locations:
//! - Windows: `%APPDATA%\DocPresenter\`
//! - macOS: `~/Library/Application Support/DocPresenter/`
//! - Linux: `~/.config/docpresenter/` for preferences, `~/.local/share/docpresenter/` for data

use std::path::PathBuf;

#[cfg(target_os = "linux")]
const APP_DIR_NAME: &str = "docpresenter";
#[cfg(not(target_os = "linux"))]
const APP_DIR_NAME: &str = "DocPresenter";

/// Development mode: `CARGO` is set or debug assertions are on.
pub fn is_dev_mode() -> bool {
    std::env::var("CARGO").is_ok() || cfg!(debug_assertions)
}

/// Preferences directory. Linux separates it from the data directory.
pub fn config_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }
    if cfg!(target_os = "linux") {
        dirs::config_dir().map(|base| base.join(APP_DIR_NAME))
    } else {
        data_dir()
    }
}

pub fn data_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }
    dirs::data_dir().map(|base| base.join(APP_DIR_NAME))
}

/// `name` under the data directory, or relative to the working directory.
fn data_path(name: &str) -> PathBuf {
    data_dir()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}

/// `config.json` in the preferences directory.
pub fn config_file() -> PathBuf {
    config_dir()
        .map(|dir| dir.join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

/// Root of the document and highlight store.
pub fn store_dir() -> PathBuf {
    data_path("store")
}

pub fn logs_dir() -> PathBuf {
    data_path("logs")
}

/// Create the preferences, store and log directories.
pub fn ensure_directories() -> std::io::Result<()> {
    let mut dirs: Vec<PathBuf> = config_dir().into_iter().collect();
    dirs.push(store_dir());
    dirs.push(logs_dir());
    for dir in dirs {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}
