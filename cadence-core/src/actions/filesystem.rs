use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::actions::types::{optional_bool, required_str, Action, ActionError, ActionParams};

/// Directories file actions may touch. Everything else is refused.
#[derive(Debug, Clone, Default)]
pub struct SafeDirectories {
    roots: Vec<PathBuf>,
}

impl SafeDirectories {
    pub fn new(dirs: &[String]) -> Self {
        Self {
            roots: dirs.iter().map(|dir| expand_home(dir)).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn resolve(&self, raw: &str) -> Result<PathBuf, ActionError> {
        let path = expand_home(raw.trim());
        if !path.is_absolute() {
            return Err(ActionError::InvalidParam {
                name: "path".to_owned(),
                reason: format!("'{raw}' must be absolute or start with '~/'"),
            });
        }
        if path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(ActionError::InvalidParam {
                name: "path".to_owned(),
                reason: format!("'{raw}' must not contain '..'"),
            });
        }
        if !self.roots.iter().any(|root| path.starts_with(root)) {
            return Err(ActionError::Execution(format!(
                "path '{}' is outside the allowed directories",
                path.display()
            )));
        }
        Ok(path)
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(raw)
}

#[derive(Debug, Clone)]
pub struct ReadFileAction {
    dirs: Arc<SafeDirectories>,
}

impl ReadFileAction {
    pub fn new(dirs: Arc<SafeDirectories>) -> Self {
        Self { dirs }
    }
}

impl Action for ReadFileAction {
    fn name(&self) -> &str {
        "read-file"
    }

    fn invoke(&self, params: &ActionParams) -> Result<Value, ActionError> {
        let path = self.dirs.resolve(required_str(params, "path")?)?;
        let content = std::fs::read_to_string(&path).map_err(|err| {
            ActionError::Execution(format!("failed to read '{}': {err}", path.display()))
        })?;
        Ok(json!({
            "path": path.display().to_string(),
            "content": content,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct WriteFileAction {
    dirs: Arc<SafeDirectories>,
}

impl WriteFileAction {
    pub fn new(dirs: Arc<SafeDirectories>) -> Self {
        Self { dirs }
    }

    fn write(path: &Path, content: &str, append: bool) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        file.write_all(content.as_bytes())
    }
}

impl Action for WriteFileAction {
    fn name(&self) -> &str {
        "write-file"
    }

    fn invoke(&self, params: &ActionParams) -> Result<Value, ActionError> {
        let path = self.dirs.resolve(required_str(params, "path")?)?;
        let content = required_str(params, "content")?;
        let append = optional_bool(params, "append")?.unwrap_or(false);

        Self::write(&path, content, append).map_err(|err| {
            ActionError::Execution(format!("failed to write '{}': {err}", path.display()))
        })?;

        Ok(json!({
            "path": path.display().to_string(),
            "bytes_written": content.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs_for(root: &Path) -> Arc<SafeDirectories> {
        Arc::new(SafeDirectories::new(&[root.display().to_string()]))
    }

    fn params(value: Value) -> ActionParams {
        value.as_object().cloned().expect("object params")
    }

    #[test]
    fn write_then_read_inside_safe_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dirs = dirs_for(dir.path());
        let target = dir.path().join("notes/today.txt");

        let written = WriteFileAction::new(dirs.clone())
            .invoke(&params(json!({
                "path": target.display().to_string(),
                "content": "first",
            })))
            .expect("write");
        assert_eq!(written["bytes_written"], json!(5));

        WriteFileAction::new(dirs.clone())
            .invoke(&params(json!({
                "path": target.display().to_string(),
                "content": " second",
                "append": "true",
            })))
            .expect("append");

        let read = ReadFileAction::new(dirs)
            .invoke(&params(json!({ "path": target.display().to_string() })))
            .expect("read");
        assert_eq!(read["content"], json!("first second"));
    }

    #[test]
    fn refuses_paths_outside_safe_directories() {
        let allowed = tempfile::tempdir().expect("tempdir");
        let other = tempfile::tempdir().expect("tempdir");
        let dirs = dirs_for(allowed.path());

        let error = ReadFileAction::new(dirs)
            .invoke(&params(json!({
                "path": other.path().join("secret.txt").display().to_string(),
            })))
            .expect_err("outside path should be refused");
        assert!(error.to_string().contains("outside the allowed directories"));
    }

    #[test]
    fn refuses_parent_traversal_and_relative_paths() {
        let allowed = tempfile::tempdir().expect("tempdir");
        let dirs = SafeDirectories::new(&[allowed.path().display().to_string()]);

        let escaped = format!("{}/../etc/passwd", allowed.path().display());
        assert!(matches!(
            dirs.resolve(&escaped),
            Err(ActionError::InvalidParam { .. })
        ));
        assert!(matches!(
            dirs.resolve("relative.txt"),
            Err(ActionError::InvalidParam { .. })
        ));
    }
}
