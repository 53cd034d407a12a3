use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::types::WorkflowDocument;
use crate::error::{Error, Result};

/// Load/save access to the workflow document. Implementations hand back the
/// whole document and take it back whole; there are no partial updates.
pub trait WorkflowStore: Send + Sync {
    fn load(&self) -> Result<WorkflowDocument>;
    fn save(&self, document: &WorkflowDocument) -> Result<()>;
}

/// Keeps definitions in a YAML file that is read on every access.
#[derive(Debug, Clone)]
pub struct YamlFileStore {
    path: PathBuf,
    seed_from_example: bool,
}

impl YamlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed_from_example: false,
        }
    }

    pub fn with_seed_from_example(mut self, enabled: bool) -> Self {
        self.seed_from_example = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `workflows.yaml` is seeded from `workflows.example.yaml` next to it.
    pub fn example_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("workflows");
        self.path.with_file_name(format!("{stem}.example.yaml"))
    }

    fn seed(&self) -> Result<bool> {
        if !self.seed_from_example {
            return Ok(false);
        }
        let example = self.example_path();
        if !example.is_file() {
            return Ok(false);
        }

        self.ensure_parent()?;
        fs::copy(&example, &self.path).map_err(|err| {
            Error::Storage(format!(
                "failed seeding '{}' from '{}': {err}",
                self.path.display(),
                example.display()
            ))
        })?;
        warn!(
            path = %self.path.display(),
            example = %example.display(),
            "workflow file missing, seeded from example"
        );
        Ok(true)
    }

    fn ensure_parent(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|err| {
                    Error::Storage(format!(
                        "failed creating directory '{}': {err}",
                        parent.display()
                    ))
                })
            }
            _ => Ok(()),
        }
    }
}

impl WorkflowStore for YamlFileStore {
    fn load(&self) -> Result<WorkflowDocument> {
        if !self.path.exists() && !self.seed()? {
            debug!(path = %self.path.display(), "no workflow file, using empty document");
            return Ok(WorkflowDocument::default());
        }

        let raw = fs::read_to_string(&self.path).map_err(|err| {
            Error::Storage(format!(
                "failed reading workflows '{}': {err}",
                self.path.display()
            ))
        })?;
        if raw.trim().is_empty() {
            return Ok(WorkflowDocument::default());
        }

        serde_yaml::from_str::<WorkflowDocument>(&raw).map_err(|err| {
            Error::Storage(format!(
                "failed parsing workflows '{}': {err}",
                self.path.display()
            ))
        })
    }

    fn save(&self, document: &WorkflowDocument) -> Result<()> {
        self.ensure_parent()?;
        let raw = serde_yaml::to_string(document).map_err(|err| {
            Error::Storage(format!("failed serializing workflows: {err}"))
        })?;
        fs::write(&self.path, raw).map_err(|err| {
            Error::Storage(format!(
                "failed writing workflows '{}': {err}",
                self.path.display()
            ))
        })
    }
}

/// In-process document, for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<WorkflowDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: WorkflowDocument) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }
}

impl WorkflowStore for MemoryStore {
    fn load(&self) -> Result<WorkflowDocument> {
        self.document
            .lock()
            .map(|document| document.clone())
            .map_err(|_| Error::Storage("workflow store lock poisoned".to_owned()))
    }

    fn save(&self, document: &WorkflowDocument) -> Result<()> {
        let mut guard = self
            .document
            .lock()
            .map_err(|_| Error::Storage("workflow store lock poisoned".to_owned()))?;
        *guard = document.clone();
        Ok(())
    }
}
