//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Resolves where the cache settings are stored.
///
/// `--dir` points at a directory holding `config.toml` (for example a media
/// center's add-on data directory). Without it the per-user
/// `~/.config/alacarta/config.toml` is used.
///
/// # Errors
///
/// Returns an error if `HOME` is unset and no `dir` was given.
pub fn resolve_config_path(dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }

    let home = std::env::var_os("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("alacarta")
        .join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_resolve_addon_data_dir() {
        // Arrange
        let dir = PathBuf::from("/home/kodi/.kodi/userdata/addon_data/plugin.video.alacarta");

        // Act
        let path = resolve_config_path(Some(&dir)).unwrap();

        // Assert
        assert_eq!(
            path,
            PathBuf::from(
                "/home/kodi/.kodi/userdata/addon_data/plugin.video.alacarta/config.toml"
            )
        );
    }

    #[test]
    fn test_resolve_relative_dir_stays_relative() {
        // Arrange & Act
        let path = resolve_config_path(Some(Path::new("tv3-profile"))).unwrap();

        // Assert
        assert_eq!(path, Path::new("tv3-profile").join("config.toml"));
    }

    #[test]
    fn test_resolve_default_is_per_user_alacarta_dir() {
        // Arrange & Act
        let path = resolve_config_path(None).unwrap();

        // Assert
        assert!(path.ends_with(".config/alacarta/config.toml"));
    }
}
