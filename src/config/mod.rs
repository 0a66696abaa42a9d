//! Project configuration and runtime settings.

pub mod project;
pub mod settings;

pub use project::{CONFIG_FILE_NAME, ConfigStore, ProjectConfig, UNSET_FIELD};
pub use settings::{Settings, default_project_dir};
