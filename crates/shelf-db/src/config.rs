//! Env-file configuration loading.
//!
//! The loader reads a dotenv-style `KEY=VALUE` file and resolves it into a
//! [`ConnectionConfig`]. Required keys are checked before any connection
//! attempt so a misconfigured run fails fast with a configuration error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::connection::{ConnectionConfig, DEFAULT_TIMEOUT_MS, is_remote_url};
use crate::{Error, Result};

/// Database path or remote URL. Required.
pub const DATABASE_KEY: &str = "SHELF_DATABASE";
/// Auth token for remote databases. Required when the database URL is remote.
pub const AUTH_TOKEN_KEY: &str = "SHELF_AUTH_TOKEN";
/// Open/busy timeout in milliseconds. Optional.
pub const TIMEOUT_KEY: &str = "SHELF_TIMEOUT_MS";

/// Parsed key-value configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl EnvConfig {
    /// Read and parse a dotenv-style file.
    ///
    /// Blank lines and `#` comments are skipped; values may be wrapped in
    /// single or double quotes.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| Error::Config {
            details: format!("Cannot read config file '{}': {err}", path.display()),
        })?;

        let mut values = BTreeMap::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| Error::Config {
                details: format!(
                    "Malformed line {} in '{}': expected KEY=VALUE",
                    index + 1,
                    path.display()
                ),
            })?;

            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Config {
                    details: format!(
                        "Malformed line {} in '{}': empty key",
                        index + 1,
                        path.display()
                    ),
                });
            }

            values.insert(key.to_string(), unquote(value.trim()).to_string());
        }

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up a key, failing with a configuration error when absent or empty.
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::Config {
                details: format!(
                    "Missing required key '{key}' in '{}'",
                    self.path.display()
                ),
            }),
        }
    }

    /// Resolve this file into a connection configuration.
    pub fn connection_config(&self) -> Result<ConnectionConfig> {
        let database_url = self.require(DATABASE_KEY)?.to_string();

        let auth_token = match self.get(AUTH_TOKEN_KEY) {
            Some(token) if !token.is_empty() => Some(token.to_string()),
            _ if is_remote_url(&database_url) => {
                return Err(Error::Config {
                    details: format!(
                        "'{AUTH_TOKEN_KEY}' is required for remote database '{database_url}'"
                    ),
                });
            }
            _ => None,
        };

        let timeout_ms = match self.get(TIMEOUT_KEY) {
            Some(raw) => raw.parse::<u64>().ok().filter(|ms| *ms > 0).ok_or_else(|| {
                Error::Config {
                    details: format!("'{TIMEOUT_KEY}' must be a positive integer, got '{raw}'"),
                }
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(ConnectionConfig {
            database_url,
            auth_token,
            timeout_ms,
        })
    }
}

/// Load the connection configuration from an env file in one step.
pub fn connection_config_from_env_file(path: impl AsRef<Path>) -> Result<ConnectionConfig> {
    EnvConfig::from_file(path)?.connection_config()
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parses_keys_comments_and_quotes() {
        let file = env_file(
            "# shelf config\n\nSHELF_DATABASE=\"./books.db\"\nSHELF_TIMEOUT_MS='2500'\n",
        );
        let config = EnvConfig::from_file(file.path()).unwrap();

        assert_eq!(config.get(DATABASE_KEY), Some("./books.db"));
        assert_eq!(config.get(TIMEOUT_KEY), Some("2500"));
        assert_eq!(config.get("UNKNOWN"), None);
    }

    #[test]
    fn test_missing_database_key_is_config_error() {
        let file = env_file("SHELF_AUTH_TOKEN=abc\n");
        let err = EnvConfig::from_file(file.path())
            .unwrap()
            .connection_config()
            .unwrap_err();

        match err {
            Error::Config { details } => assert!(details.contains(DATABASE_KEY)),
            other => panic!("expected config error, got {other}"),
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let file = env_file("SHELF_DATABASE=\n");
        let err = connection_config_from_env_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_remote_url_requires_auth_token() {
        let file = env_file("SHELF_DATABASE=libsql://catalog.example.io\n");
        let err = connection_config_from_env_file(file.path()).unwrap_err();
        match err {
            Error::Config { details } => assert!(details.contains(AUTH_TOKEN_KEY)),
            other => panic!("expected config error, got {other}"),
        }
    }

    #[test]
    fn test_remote_url_with_token_resolves() {
        let file =
            env_file("SHELF_DATABASE=libsql://catalog.example.io\nSHELF_AUTH_TOKEN=secret\n");
        let config = connection_config_from_env_file(file.path()).unwrap();

        assert_eq!(config.database_url, "libsql://catalog.example.io");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_local_path_needs_no_token() {
        let file = env_file("SHELF_DATABASE=./books.db\n");
        let config = connection_config_from_env_file(file.path()).unwrap();
        assert_eq!(config.auth_token, None);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let file = env_file("SHELF_DATABASE=./books.db\nSHELF_TIMEOUT_MS=soon\n");
        let err = connection_config_from_env_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = connection_config_from_env_file("/path/that/does/not/exist.env").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_malformed_line_rejected() {
        let file = env_file("SHELF_DATABASE ./books.db\n");
        let err = EnvConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
