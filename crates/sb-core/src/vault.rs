//! Vault note paths
//!
//! A note for entity `<type>/<id>` lives at `<vault>/<vault_dir>/<type>/<id>.md`.

use crate::config::{Settings, ENV_VAULT, ENV_VAULT_DIR};
use crate::errors::{Result, SecondBrainError};

/// Format the markdown path of an entity's note
///
/// One trailing `/` is trimmed from `vault` and one leading `/` from
/// `vault_dir`. Unset or empty base paths are reported by variable name.
pub fn note_path(
    vault: Option<&str>,
    vault_dir: Option<&str>,
    entity_type: &str,
    entity_id: &str,
) -> Result<String> {
    if entity_type.is_empty() {
        return Err(SecondBrainError::EmptyArgument {
            name: "type".to_string(),
        }
        .into());
    }
    if entity_id.is_empty() {
        return Err(SecondBrainError::EmptyArgument {
            name: "id".to_string(),
        }
        .into());
    }

    let vault = required(vault, ENV_VAULT)?;
    let vault_dir = required(vault_dir, ENV_VAULT_DIR)?;

    let root = vault.strip_suffix('/').unwrap_or(vault);
    let dir = vault_dir.strip_prefix('/').unwrap_or(vault_dir);

    Ok(format!("{}/{}/{}/{}.md", root, dir, entity_type, entity_id))
}

fn required<'a>(value: Option<&'a str>, var: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SecondBrainError::EnvUnset {
            var: var.to_string(),
        }
        .into()),
    }
}

/// The two vault base paths, bound once from settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultLayout {
    vault: Option<String>,
    vault_dir: Option<String>,
}

impl VaultLayout {
    pub fn new(vault: Option<String>, vault_dir: Option<String>) -> Self {
        Self { vault, vault_dir }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.vault.clone(), settings.vault_dir.clone())
    }

    pub fn note_path(&self, entity_type: &str, entity_id: &str) -> Result<String> {
        note_path(
            self.vault.as_deref(),
            self.vault_dir.as_deref(),
            entity_type,
            entity_id,
        )
    }
}
