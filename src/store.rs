//! Persistence boundary for the configuration tree.
//!
//! The core owns no transport; it talks to a [`SettingsStore`]
//! collaborator that loads the top-level forest and accepts it back on
//! save. A [`FileStore`] implementation is provided for file-backed
//! deployments, supporting TOML and JSON by extension with a timestamped
//! backup before each overwrite.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::bail;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::node::ConfigNode;

/// Reply returned by the collaborator's save operation.
///
/// `code == 200` is success; any other code is a user-visible failure
/// carrying `msg`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveReply {
    /// Status code; 200 means the save was accepted.
    pub code: i32,
    /// Collaborator-supplied message.
    pub msg: String,
}

impl SaveReply {
    /// Whether the save was accepted.
    pub fn is_success(&self) -> bool {
        self.code == 200
    }
}

/// External collaborator holding the persisted configuration.
pub trait SettingsStore: Send + Sync {
    /// Load the top-level forest.
    ///
    /// # Errors
    ///
    /// Returns an error when the persisted payload cannot be read or
    /// does not match the node shape.
    fn load(&self) -> anyhow::Result<Vec<ConfigNode>>;

    /// Persist the forest.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures; a collaborator-level
    /// rejection is reported through the reply code instead.
    fn save(&self, roots: &[ConfigNode]) -> anyhow::Result<SaveReply>;
}

/// TOML root must be a table, so the forest is wrapped in one document
/// struct for both formats.
#[derive(Serialize, Deserialize)]
struct FileDoc {
    settings: Vec<ConfigNode>,
}

/// File-backed settings store.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for the given settings file. The format is chosen
    /// by extension (`json`, `toml`, `tml`).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string()
    }
}

impl SettingsStore for FileStore {
    fn load(&self) -> anyhow::Result<Vec<ConfigNode>> {
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let doc: FileDoc = match self.extension().as_str() {
            "json" => serde_json::from_str(&content)?,
            "toml" | "tml" => toml::from_str(&content)?,
            ext => {
                bail!("unsupported settings file extension: {ext:?}");
            }
        };
        Ok(doc.settings)
    }

    fn save(&self, roots: &[ConfigNode]) -> anyhow::Result<SaveReply> {
        let ext = self.extension();
        let doc = FileDoc {
            settings: roots.to_vec(),
        };
        let content = match ext.as_str() {
            "json" => serde_json::to_string_pretty(&doc)?,
            "toml" | "tml" => toml::to_string_pretty(&doc)?,
            _ => {
                bail!("unsupported settings file extension: {ext:?}");
            }
        };

        if self.path.exists() {
            let bk = format!(
                "bk-{}.{ext}",
                SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)?
                    .as_secs()
            );
            let backup_path = self.path.with_extension(bk);
            fs::copy(&self.path, &backup_path)?;
            debug!("backed up settings to {}", backup_path.display());
        }

        fs::write(&self.path, content)?;
        Ok(SaveReply {
            code: 200,
            msg: "ok".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::node::{FieldKind, FieldOption};

    fn sample_roots() -> Vec<ConfigNode> {
        vec![
            ConfigNode::leaf("markets", "Markets", FieldKind::CheckboxGroup, "a,h").with_options(
                vec![FieldOption::new("a", "A股"), FieldOption::new("h", "港股")],
            ),
            ConfigNode::group(
                "theme",
                "Theme",
                vec![ConfigNode::leaf(
                    "color",
                    "Accent color",
                    FieldKind::ColorPicker,
                    "#336699",
                )],
            ),
        ]
    }

    #[test]
    fn json_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("settings.json"));

        let roots = sample_roots();
        let reply = store.save(&roots).unwrap();
        assert!(reply.is_success());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, roots);
    }

    #[test]
    fn toml_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("settings.toml"));

        let roots = sample_roots();
        store.save(&roots).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, roots);
    }

    #[test]
    fn save_backs_up_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("settings.json"));

        store.save(&sample_roots()).unwrap();
        store.save(&sample_roots()).unwrap();

        let backups = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("bk-"))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let store = FileStore::new("settings.yaml");
        assert!(store.save(&sample_roots()).is_err());
    }
}
