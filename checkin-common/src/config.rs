//! Configuration file loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "CHECKIN_ROOT_FOLDER";

/// Directory name used under the platform config/data directories
const APP_DIR: &str = "checkin";

/// Contents of the optional TOML configuration file
///
/// Every field is optional; anything left out falls back to the compiled
/// default chosen by the server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the participant document, uploads and TLS material
    pub root_folder: Option<PathBuf>,
    pub server: ServerSection,
    pub event: EventSection,
}

/// `[server]` table
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    /// The single origin allowed by CORS (credentials are allowed for it)
    pub allowed_origin: Option<String>,
    /// PEM certificate; relative paths are resolved against the root folder
    pub tls_cert: Option<PathBuf>,
    /// PEM private key; relative paths are resolved against the root folder
    pub tls_key: Option<PathBuf>,
    pub max_upload_bytes: Option<usize>,
}

/// `[event]` table
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventSection {
    /// IANA timezone name used for calendar-day logic and export formatting
    pub timezone: Option<String>,
    /// Upper bound on how long the daily counter task sleeps between checks
    pub rollover_poll_secs: Option<u64>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Load the TOML configuration file
///
/// An explicit path must exist. Without one, the platform locations are
/// searched; finding nothing is not an error and yields the defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match locate_config_file() {
            Some(path) => path,
            None => {
                info!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    debug!("Reading config file {}", path.display());
    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = TomlConfig::from_toml_str(&content)?;
    info!("Loaded config file {}", path.display());
    Ok(config)
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Resolve a configured path against the root folder
pub fn resolve_in_root(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Find the first existing config file for the platform
fn locate_config_file() -> Option<PathBuf> {
    // ~/.config/checkin/config.toml first, then /etc/checkin/config.toml
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/checkin (or /var/lib/checkin for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/var/lib/checkin"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/checkin"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\checkin"))
    } else {
        PathBuf::from("./checkin_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(
            r#"
            root_folder = "/srv/checkin"

            [server]
            port = 8443
            allowed_origin = "https://frontend.example:3000"
            tls_cert = "certs/cert.pem"

            [event]
            timezone = "Asia/Taipei"
            rollover_poll_secs = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/checkin")));
        assert_eq!(config.server.port, Some(8443));
        assert_eq!(
            config.server.allowed_origin.as_deref(),
            Some("https://frontend.example:3000")
        );
        assert_eq!(config.server.tls_cert, Some(PathBuf::from("certs/cert.pem")));
        assert!(config.server.tls_key.is_none());
        assert_eq!(config.event.timezone.as_deref(), Some("Asia/Taipei"));
        assert_eq!(config.event.rollover_poll_secs, Some(15));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let result = TomlConfig::from_toml_str("[server]\nport = \"not a number\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_resolve_in_root() {
        let root = Path::new("/srv/checkin");
        assert_eq!(
            resolve_in_root(root, Path::new("cert.pem")),
            PathBuf::from("/srv/checkin/cert.pem")
        );
        assert_eq!(
            resolve_in_root(root, Path::new("/etc/ssl/cert.pem")),
            PathBuf::from("/etc/ssl/cert.pem")
        );
    }

    #[test]
    fn test_default_root_folder_not_empty() {
        assert!(!default_root_folder().as_os_str().is_empty());
    }
}
