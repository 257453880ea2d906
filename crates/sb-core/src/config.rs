//! Settings resolution
//!
//! Sources, highest precedence first:
//! 1. Process environment (`SB_VAULT`, `SB_VAULT_DIR`, `SB_DB`, `SB_MODEL`, ...)
//! 2. `~/.secondbrain/config.sh` (`export KEY=VALUE` lines, parsed with dotenvy)
//! 3. Built-in defaults

use crate::errors::{Result, SbError, SecondBrainError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const ENV_VAULT: &str = "SB_VAULT";
pub const ENV_VAULT_DIR: &str = "SB_VAULT_DIR";
pub const ENV_DB: &str = "SB_DB";
pub const ENV_MODEL: &str = "SB_MODEL";
pub const ENV_CONFIDENCE_THRESHOLD: &str = "SB_CONFIDENCE_THRESHOLD";
pub const ENV_MAX_RETRIES: &str = "SB_MAX_RETRIES";

pub const DEFAULT_MODEL: &str = "phi4-mini:latest";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.60;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

const SB_HOME_DIR: &str = ".secondbrain";

/// Resolved settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub home: PathBuf,
    /// `~/.secondbrain`
    pub sb_home: PathBuf,
    pub db_path: PathBuf,
    pub bin_dir: PathBuf,
    pub rc_file: PathBuf,
    pub config_file: PathBuf,
    pub aliases_path: PathBuf,
    /// Vault root; `None` when unset or empty
    pub vault: Option<String>,
    /// Vault-relative notes directory; `None` when unset or empty
    pub vault_dir: Option<String>,
    pub model: String,
    pub confidence_threshold: f64,
    pub max_retries: u32,
}

impl Settings {
    /// Resolve settings from the real home directory and process environment
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().ok_or(SecondBrainError::HomeDirUnknown)?;
        Self::resolve(&home, |key| std::env::var(key).ok())
    }

    /// Resolve settings for `home`, reading variables through `env`
    ///
    /// The config file is optional; when present it must parse.
    pub fn resolve<F>(home: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sb_home = home.join(SB_HOME_DIR);
        let config_file = sb_home.join("config.sh");

        let file_vars = if config_file.is_file() {
            read_config_file(&config_file)?
        } else {
            HashMap::new()
        };

        let lookup = |key: &str| -> Option<String> {
            env(key)
                .filter(|v| !v.is_empty())
                .or_else(|| file_vars.get(key).cloned())
                .filter(|v| !v.is_empty())
        };

        let db_path = lookup(ENV_DB)
            .map(PathBuf::from)
            .unwrap_or_else(|| sb_home.join("brain.db"));

        let confidence_threshold = match lookup(ENV_CONFIDENCE_THRESHOLD) {
            Some(raw) => {
                let value: f64 = parse_setting(&config_file, ENV_CONFIDENCE_THRESHOLD, &raw)?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(invalid_setting(&config_file, ENV_CONFIDENCE_THRESHOLD, &raw));
                }
                value
            }
            None => DEFAULT_CONFIDENCE_THRESHOLD,
        };
        let max_retries = match lookup(ENV_MAX_RETRIES) {
            Some(raw) => parse_setting(&config_file, ENV_MAX_RETRIES, &raw)?,
            None => DEFAULT_MAX_RETRIES,
        };

        Ok(Self {
            home: home.to_path_buf(),
            db_path,
            bin_dir: sb_home.join("bin"),
            rc_file: home.join(".bashrc"),
            aliases_path: sb_home.join("aliases.json"),
            vault: lookup(ENV_VAULT),
            vault_dir: lookup(ENV_VAULT_DIR),
            model: lookup(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            confidence_threshold,
            max_retries,
            config_file,
            sb_home,
        })
    }
}

/// Parse `config.sh` into a variable map
///
/// Accepts the subset of shell dotenvy understands: comments, `KEY=VALUE`,
/// `export KEY=VALUE`, quoting and `$VAR` expansion.
pub fn read_config_file(path: &Path) -> Result<HashMap<String, String>> {
    let invalid = |reason: String| SecondBrainError::InvalidConfig {
        path: path.display().to_string(),
        reason,
    };

    let iter = dotenvy::from_path_iter(path).map_err(|e| invalid(e.to_string()))?;
    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| invalid(e.to_string()))?;
        vars.insert(key, value);
    }
    tracing::debug!(path = %path.display(), vars = vars.len(), "loaded config file");
    Ok(vars)
}

fn parse_setting<T: std::str::FromStr>(config_file: &Path, key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| invalid_setting(config_file, key, raw))
}

fn invalid_setting(config_file: &Path, key: &str, raw: &str) -> SbError {
    SecondBrainError::InvalidConfig {
        path: config_file.display().to_string(),
        reason: format!("{} has invalid value '{}'", key, raw),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SbErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_config_file() {
        let home = TempDir::new().unwrap();
        let s = Settings::resolve(home.path(), no_env).unwrap();

        assert_eq!(s.sb_home, home.path().join(".secondbrain"));
        assert_eq!(s.db_path, home.path().join(".secondbrain/brain.db"));
        assert_eq!(s.bin_dir, home.path().join(".secondbrain/bin"));
        assert_eq!(s.rc_file, home.path().join(".bashrc"));
        assert_eq!(s.vault, None);
        assert_eq!(s.vault_dir, None);
        assert_eq!(s.model, DEFAULT_MODEL);
        assert_eq!(s.max_retries, 2);
        assert!((s.confidence_threshold - 0.60).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_file_supplies_values() {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join(".secondbrain")).unwrap();
        fs::write(
            home.path().join(".secondbrain/config.sh"),
            "# secondbrain\nexport SB_VAULT=\"/notes/vault/\"\nexport SB_VAULT_DIR=/SecondBrain\nSB_MAX_RETRIES=0\n",
        )
        .unwrap();

        let s = Settings::resolve(home.path(), no_env).unwrap();
        assert_eq!(s.vault.as_deref(), Some("/notes/vault/"));
        assert_eq!(s.vault_dir.as_deref(), Some("/SecondBrain"));
        assert_eq!(s.max_retries, 0);
    }

    #[test]
    fn test_environment_overrides_config_file() {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join(".secondbrain")).unwrap();
        fs::write(
            home.path().join(".secondbrain/config.sh"),
            "export SB_VAULT=/from/file\nexport SB_MODEL=llama3\n",
        )
        .unwrap();

        let s = Settings::resolve(home.path(), |key| match key {
            "SB_VAULT" => Some("/from/env".to_string()),
            "SB_MODEL" => Some(String::new()),
            _ => None,
        })
        .unwrap();

        assert_eq!(s.vault.as_deref(), Some("/from/env"));
        // An empty environment value does not mask the file
        assert_eq!(s.model, "llama3");
    }

    #[test]
    fn test_invalid_numeric_setting_fails() {
        let home = TempDir::new().unwrap();
        let err = Settings::resolve(home.path(), |key| {
            (key == "SB_CONFIDENCE_THRESHOLD").then(|| "high".to_string())
        })
        .unwrap_err();
        assert_eq!(err.kind(), SbErrorKind::InvalidInput);
        assert!(err.to_string().contains("SB_CONFIDENCE_THRESHOLD"));
    }

    #[test]
    fn test_threshold_outside_unit_range_fails() {
        let home = TempDir::new().unwrap();
        for raw in ["NaN", "inf", "-0.1", "1.5"] {
            let err = Settings::resolve(home.path(), |key| {
                (key == "SB_CONFIDENCE_THRESHOLD").then(|| raw.to_string())
            })
            .unwrap_err();
            assert_eq!(err.kind(), SbErrorKind::InvalidInput, "value {}", raw);
        }

        let s = Settings::resolve(home.path(), |key| {
            (key == "SB_CONFIDENCE_THRESHOLD").then(|| "1".to_string())
        })
        .unwrap();
        assert!((s.confidence_threshold - 1.0).abs() < f64::EPSILON);
    }
}
