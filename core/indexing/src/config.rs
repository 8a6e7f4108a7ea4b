use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vault_schemas::{defaults, VaultConfig};

use crate::error::{Result, VaultError};

/// Load `vault.config.json` from `root`, falling back to defaults field by
/// field. The returned `vault_root` is absolute.
pub fn load_config(root: &Path) -> Result<VaultConfig> {
    let root = absolute(root)?;
    let config_path = root.join(defaults::CONFIG_FILE);

    if !config_path.exists() {
        debug!("No {} found, using defaults", defaults::CONFIG_FILE);
        return Ok(VaultConfig {
            vault_root: root,
            ..VaultConfig::default()
        });
    }

    let raw = fs::read_to_string(&config_path).map_err(|e| VaultError::io(&config_path, e))?;
    let mut config: VaultConfig =
        serde_json::from_str(&raw).map_err(|e| VaultError::Config {
            path: config_path.clone(),
            message: e.to_string(),
        })?;

    config.vault_root = normalize(&root.join(&config.vault_root));
    info!(
        "Loaded {} (vault root: {})",
        config_path.display(),
        config.vault_root.display()
    );
    Ok(config)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(|e| VaultError::io(path, e))?;
    Ok(normalize(&cwd.join(path)))
}

/// Lexically resolve `.` and `..` components without touching the disk
pub fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
