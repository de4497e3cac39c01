use std::path::PathBuf;

/// Resolve the kitintel home directory.
///
/// Priority:
/// 1) KITINTEL_HOME
/// 2) HOME/USERPROFILE
/// 3) ./.kitintel
pub fn kitintel_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("KITINTEL_HOME") {
        return PathBuf::from(override_path);
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        return PathBuf::from(home).join(".kitintel");
    }
    PathBuf::from(".").join(".kitintel")
}

/// Config file: ~/.kitintel/config.toml
pub fn default_config_path() -> PathBuf {
    kitintel_home().join("config.toml")
}

/// Logs directory: ~/.kitintel/logs
pub fn default_logs_dir() -> PathBuf {
    kitintel_home().join("logs")
}
