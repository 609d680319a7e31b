use dirs::home_dir;
use std::path::{Path, PathBuf};

/// Returns the modsync home directory (`~/.modsync`).
///
/// `MODSYNC_HOME` overrides the location. Falls back to a relative
/// `.modsync` when the user's home cannot be resolved.
pub fn modsync_home() -> PathBuf {
    if let Ok(val) = std::env::var("MODSYNC_HOME") {
        return PathBuf::from(val);
    }
    home_dir().map_or_else(|| PathBuf::from(".modsync"), |h| h.join(".modsync"))
}

/// Logs directory: ~/.modsync/logs
pub fn log_dir() -> PathBuf {
    modsync_home().join("logs")
}

/// The platform's default game directory, if it can be located.
///
/// - Windows: `%APPDATA%\.minecraft`
/// - macOS: `~/Library/Application Support/minecraft`
/// - elsewhere: `~/.minecraft`
pub fn default_game_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::config_dir().map(|d| d.join(".minecraft"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir().map(|d| d.join("minecraft"))
    } else {
        home_dir().map(|h| h.join(".minecraft"))
    }
}

/// Package directory inside a game directory: `<game_dir>/mods`
pub fn mods_dir(game_dir: &Path) -> PathBuf {
    game_dir.join("mods")
}
