use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{FtsError, Result};

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_SETTINGS_NAME: &str = "fts";

/// Prefix of environment overrides, e.g. `FTS_GATEWAY__USERNAME`
pub const ENV_PREFIX: &str = "FTS";

/// Configuration for a transfer run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gateway defaults
    pub gateway: GatewaySettings,

    /// Location of the delimited tables
    pub tables: TableSettings,

    /// Log file location
    pub log: LogSettings,

    /// Transfer behaviour
    pub transfer: TransferSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Gateway username used when none is passed on the command line
    pub username: Option<String>,

    /// Gateway password; ignored when a username is passed on the command line
    pub password: Option<String>,

    /// Control port used when the gateway address carries none
    pub port: u16,

    /// Connect/read/write timeout in seconds
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub directory: String,
    pub gateways: String,
    pub server_groups: String,
    pub hosts: String,
    pub clients: String,
    pub delimiter: char,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub directory: String,
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Local directory files are uploaded from and downloaded into
    pub local_directory: String,

    /// Server-group code that selects managed service hosts
    pub managed_code: String,

    /// Managed directories are `<prefix><client id>/<infix>/<gateway user>`
    pub directory_prefix: String,
    pub directory_infix: String,

    /// Abort instead of skipping when a file to upload is missing
    pub strict_upload: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            port: 21,
            timeout: 30,
        }
    }
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            directory: "config".to_string(),
            gateways: "gateways.csv".to_string(),
            server_groups: "server_groups.csv".to_string(),
            hosts: "non_ms_hosts.csv".to_string(),
            clients: "ms_client_accounts.csv".to_string(),
            delimiter: ',',
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file: "fts.log".to_string(),
        }
    }
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            local_directory: ".".to_string(),
            managed_code: "ms".to_string(),
            directory_prefix: "aiprod".to_string(),
            directory_infix: "implementor".to_string(),
            strict_upload: false,
        }
    }
}

impl Settings {
    /// Load defaults, then the settings file, then `FTS_*` environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with_env(explicit, None)
    }

    /// `load` reading overrides from `env` instead of the process environment
    /// when one is given
    fn load_with_env(
        explicit: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();

        builder = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(FtsError::ConfigMissing(path.display().to_string()));
                }
                builder.add_source(config::File::from(path))
            }
            None => {
                builder.add_source(config::File::with_name(DEFAULT_SETTINGS_NAME).required(false))
            }
        };

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(env),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Full path of the log file
    pub fn log_file(&self) -> PathBuf {
        Path::new(&self.log.directory).join(&self.log.file)
    }

    pub fn local_directory(&self) -> &Path {
        Path::new(&self.transfer.local_directory)
    }

    /// Validate the basic configuration
    pub fn validate(&self) -> Result<()> {
        if self.gateway.port == 0 {
            return Err(FtsError::ConfigInvalid(
                "gateway.port cannot be 0".to_string(),
            ));
        }

        if self.gateway.timeout == 0 {
            return Err(FtsError::ConfigInvalid(
                "gateway.timeout cannot be 0".to_string(),
            ));
        }

        if self.tables.delimiter.is_whitespace() || self.tables.delimiter == '"' {
            return Err(FtsError::ConfigInvalid(format!(
                "tables.delimiter cannot be {:?}",
                self.tables.delimiter
            )));
        }

        if self.transfer.managed_code.trim().is_empty() {
            return Err(FtsError::ConfigInvalid(
                "transfer.managed_code cannot be empty".to_string(),
            ));
        }

        if self.log.file.trim().is_empty() {
            return Err(FtsError::ConfigInvalid(
                "log.file cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Settings - Tables: {}, Log: {}, Local Dir: {}, Port: {}, Timeout: {}s, Gateway User: {}",
            self.tables.directory,
            self.log_file().display(),
            self.transfer.local_directory,
            self.gateway.port,
            self.gateway.timeout,
            self.gateway.username.as_deref().unwrap_or("-")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.gateway.port, 21);
        assert_eq!(settings.tables.clients, "ms_client_accounts.csv");
        assert_eq!(settings.log_file(), Path::new("logs").join("fts.log"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_explicit_file_keeps_unset_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "[gateway]\nusername = \"jdoe\"\ntimeout = 10\n\n[transfer]\nstrict_upload = true\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.gateway.username.as_deref(), Some("jdoe"));
        assert_eq!(settings.gateway.timeout, 10);
        assert_eq!(settings.gateway.port, 21);
        assert!(settings.transfer.strict_upload);
        assert_eq!(settings.transfer.directory_prefix, "aiprod");
    }

    #[test]
    fn test_environment_overrides_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[gateway]\nusername = \"fileuser\"\nport = 21\ntimeout = 10\n").unwrap();
        let env = [
            ("FTS_GATEWAY__USERNAME", "envuser"),
            ("FTS_GATEWAY__PORT", "2121"),
            ("OTHER_GATEWAY__PORT", "9"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let settings = Settings::load_with_env(Some(&path), Some(env)).unwrap();
        assert_eq!(settings.gateway.username.as_deref(), Some("envuser"));
        assert_eq!(settings.gateway.port, 2121);
        assert_eq!(settings.gateway.timeout, 10);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Settings::load(Some(&dir.path().join("absent.toml"))),
            Err(FtsError::ConfigMissing(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut settings = Settings::default();
        settings.gateway.timeout = 0;
        assert!(matches!(
            settings.validate(),
            Err(FtsError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_display_hides_password() {
        let mut settings = Settings::default();
        settings.gateway.password = Some("hunter2".to_string());
        assert!(!settings.to_string().contains("hunter2"));
    }
}
