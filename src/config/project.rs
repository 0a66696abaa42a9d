//! Per-project configuration stored as `project_config.json`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// File name of the project configuration inside a project directory.
pub const CONFIG_FILE_NAME: &str = "project_config.json";

/// Placeholder used for fields the user left unset.
pub const UNSET_FIELD: &str = "None";

/// Language, framework and specialization of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "unset")]
    pub language: String,
    #[serde(default = "unset")]
    pub framework: String,
    #[serde(default = "unset")]
    pub specialization: String,
}

fn unset() -> String {
    UNSET_FIELD.to_string()
}

impl ProjectConfig {
    pub fn new(
        language: impl Into<String>,
        framework: impl Into<String>,
        specialization: impl Into<String>,
    ) -> Self {
        Self {
            language: non_blank(language.into()),
            framework: non_blank(framework.into()),
            specialization: non_blank(specialization.into()),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self::new(UNSET_FIELD, UNSET_FIELD, UNSET_FIELD)
    }
}

fn non_blank(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        unset()
    } else {
        trimmed.to_string()
    }
}

/// Handle on the configuration file of one project directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            path: project_dir.join(CONFIG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the configuration, or `None` if the file does not exist.
    pub fn load(&self) -> Result<Option<ProjectConfig>, ConfigError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::ReadFailed {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::ParseFailed {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(config))
    }

    /// Write the configuration, replacing any existing file.
    pub fn save(&self, config: &ProjectConfig) -> Result<(), ConfigError> {
        let data = serde_json::to_string_pretty(config).map_err(ConfigError::SerializeFailed)?;
        fs::write(&self.path, data).map_err(|source| ConfigError::WriteFailed {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "Saved project config");
        Ok(())
    }
}
