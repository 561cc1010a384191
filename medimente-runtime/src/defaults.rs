use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "medimente";
pub const CONFIG_FILENAME: &str = "config.json";

/// `<platform config dir>/medimente/config.json`, or the working directory
/// when the platform has no config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_default()
        .join(CONFIG_FILENAME)
}
