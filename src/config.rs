use crate::errors::Result;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Serializer, Value};
use std::path::{Path, PathBuf};

/// Default location of the saved field values, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// The six values the user types in before triggering an action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowConfig {
    pub directory_name: String,
    pub git_url: String,
    #[serde(rename = "branch1")]
    pub source_branch: String,
    #[serde(rename = "branch2")]
    pub target_branch: String,
    pub new_branch: String,
    pub commit_message: String,
}

impl WorkflowConfig {
    /// Build a config from a parsed store, field by field
    ///
    /// Keys that are missing or hold something other than a string stay empty.
    fn from_object(object: &Map<String, Value>) -> Self {
        let field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        WorkflowConfig {
            directory_name: field("directory_name"),
            git_url: field("git_url"),
            source_branch: field("branch1"),
            target_branch: field("branch2"),
            new_branch: field("new_branch"),
            commit_message: field("commit_message"),
        }
    }
}

/// JSON file holding the last saved [`WorkflowConfig`]
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved values
    ///
    /// A missing file is a first run and yields empty fields. Unreadable or
    /// malformed content is logged and also yields empty fields, startup never fails
    /// because of the store.
    pub fn load(&self) -> WorkflowConfig {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No saved values at {}", self.path.display());
                return WorkflowConfig::default();
            }
            Err(e) => {
                log::warn!("Cannot read {}: {}", self.path.display(), e);
                return WorkflowConfig::default();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(object)) => WorkflowConfig::from_object(&object),
            Ok(_) => {
                log::warn!(
                    "{} does not hold a JSON object, starting with empty fields",
                    self.path.display()
                );
                WorkflowConfig::default()
            }
            Err(e) => {
                log::warn!(
                    "Cannot parse {}: {}, starting with empty fields",
                    self.path.display(),
                    e
                );
                WorkflowConfig::default()
            }
        }
    }

    /// Overwrite the store with the given values, commit message trimmed
    pub fn save(&self, config: &WorkflowConfig) -> Result<()> {
        let record = WorkflowConfig {
            commit_message: config.commit_message.trim().to_string(),
            ..config.clone()
        };

        let mut buffer = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        record.serialize(&mut serializer)?;

        std::fs::write(&self.path, buffer)?;
        log::info!("Saved field values to {}", self.path.display());
        Ok(())
    }
}
