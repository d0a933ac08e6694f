//! Filesystem-backed benchmark task catalog.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use gauntlet_core::domain::{HarnessError, Result, TaskDescriptor};
use gauntlet_core::traits::TaskCatalog;

/// Environment variable naming the benchmark root directory.
pub const ROOT_ENV: &str = "GAUNTLET_ROOT";

/// Catalog over a benchmark root directory.
///
/// Layout: `<root>/tasks/<task_id>/task.json`. The root is validated once at
/// construction; unknown or unreadable task data fails only the task that
/// references it.
pub struct FsTaskCatalog {
    root: PathBuf,
    tasks_dir: PathBuf,
}

impl FsTaskCatalog {
    /// Open a catalog rooted at `root`. Fails with a configuration error if
    /// the tasks directory does not exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let tasks_dir = root.join("tasks");
        if !tasks_dir.is_dir() {
            return Err(HarnessError::Configuration(format!(
                "benchmark tasks directory not found: {}",
                tasks_dir.display()
            )));
        }
        Ok(Self { root, tasks_dir })
    }

    /// Open a catalog from the `GAUNTLET_ROOT` environment variable.
    pub fn from_env() -> Result<Self> {
        let root = std::env::var(ROOT_ENV).map_err(|_| {
            HarnessError::Configuration(format!(
                "{ROOT_ENV} is not set; point it at the benchmark root directory"
            ))
        })?;
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn task_file(&self, task_id: &str) -> PathBuf {
        self.tasks_dir.join(task_id).join("task.json")
    }
}

#[async_trait]
impl TaskCatalog for FsTaskCatalog {
    async fn list_task_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.tasks_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        // read_dir order is platform-dependent; sort for a stable listing.
        ids.sort();
        Ok(ids)
    }

    async fn load_descriptor(&self, task_id: &str) -> Result<TaskDescriptor> {
        let path = self.task_file(task_id);
        let raw = fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                HarnessError::TaskNotFound {
                    task_id: task_id.to_string(),
                    reason: "no task.json in benchmark storage".to_string(),
                }
            } else {
                HarnessError::Io(e)
            }
        })?;
        serde_json::from_slice(&raw).map_err(|e| HarnessError::TaskNotFound {
            task_id: task_id.to_string(),
            reason: format!("corrupt task data: {e}"),
        })
    }
}
