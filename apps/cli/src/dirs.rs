use std::path::PathBuf;

const APP_DIR_NAME: &str = "lastfm-etl";

pub fn config_dir() -> Result<PathBuf, String> {
    base_dir("XDG_CONFIG_HOME", ".config").map(|base| base.join(APP_DIR_NAME))
}

/// Holds the default database, attached schemas and the response cache.
pub fn data_dir() -> Result<PathBuf, String> {
    base_dir("XDG_DATA_HOME", ".local/share").map(|base| base.join(APP_DIR_NAME))
}

fn base_dir(xdg_var: &str, home_fallback: &str) -> Result<PathBuf, String> {
    if let Ok(path) = std::env::var(xdg_var)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var("HOME").map_err(|err| format!("resolve HOME: {}", err))?;
    Ok(PathBuf::from(home).join(home_fallback))
}
