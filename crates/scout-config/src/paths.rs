use std::path::PathBuf;

/// XDG app name used for every config, state and data path.
pub const APP_NAME: &str = "niche-scout";

const CONFIG_FILE_NAME: &str = "config.toml";
const MEMORY_FILE_NAME: &str = "memory.json";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Default config file: `~/.config/niche-scout/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Default memory file under the XDG state dir.
///
/// Falls back to the local data dir where `state_dir()` is unavailable
/// (macOS), then to the temp dir when no home directory can be found.
pub fn default_memory_path() -> PathBuf {
    if let Some(dirs) = project_dirs() {
        return dirs
            .state_dir()
            .unwrap_or_else(|| dirs.data_local_dir())
            .join("memory")
            .join(MEMORY_FILE_NAME);
    }

    std::env::temp_dir()
        .join(format!("{APP_NAME}-state"))
        .join("memory")
        .join(MEMORY_FILE_NAME)
}

/// Default directory that rendered products are written to.
pub fn default_products_dir() -> PathBuf {
    if let Some(dirs) = project_dirs() {
        return dirs.data_dir().join("products");
    }

    std::env::temp_dir()
        .join(format!("{APP_NAME}-data"))
        .join("products")
}
