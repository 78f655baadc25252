use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the Stillmind application data root directory.
///
/// # Platform-specific paths
/// - macOS: ~/Library/Application Support/Stillmind
/// - Windows: %APPDATA%\Stillmind
/// - Linux: $XDG_DATA_HOME/Stillmind or ~/.local/share/Stillmind
///
/// Does not create directories; callers decide when to create them.
pub fn app_data_dir() -> Result<PathBuf> {
    let base_dir =
        get_platform_data_dir().context("Failed to get platform-specific data directory")?;

    Ok(base_dir.join("Stillmind"))
}

/// Directory holding the quiz flow records.
pub fn flow_dir() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("flow"))
}

/// Directory holding the mood journal.
pub fn mood_dir() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("mood"))
}

fn get_platform_data_dir() -> Result<PathBuf> {
    if let Some(xdg_data_home) = std::env::var_os("XDG_DATA_HOME") {
        return Ok(PathBuf::from(xdg_data_home));
    }
    dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Unable to get platform data directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_app_name() {
        let path = app_data_dir().expect("Should be able to get app data dir");
        assert!(path.ends_with("Stillmind"));
    }

    #[test]
    fn derived_dirs_sit_under_the_root() {
        let flow = flow_dir().unwrap();
        assert!(flow.ends_with("flow"));
        assert!(flow.components().any(|c| c.as_os_str() == "Stillmind"));

        let mood = mood_dir().unwrap();
        assert!(mood.ends_with("mood"));
    }
}
