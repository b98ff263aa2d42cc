use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::task;

use crate::{
    app::ports::{ExportFile, ExportReport, FileExportPort},
    domain::errors::{DomainError, Result},
};

/// Writes generated projects under `<root>/<project>/`.
pub struct FileExportFsAdapter {
    canonical_root: PathBuf,
}

struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
    relative: String,
}

impl FileExportFsAdapter {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root).map_err(|e| {
            DomainError::Io(format!(
                "failed to create export root '{}': {}",
                root.display(),
                e
            ))
        })?;
        let canonical_root = std::fs::canonicalize(&root).map_err(|e| {
            DomainError::InvalidData(format!(
                "export root '{}' is invalid: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { canonical_root })
    }

    pub fn root(&self) -> &Path {
        &self.canonical_root
    }

    fn validate_project(project: &str) -> Result<()> {
        if project.is_empty()
            || !project
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(DomainError::InvalidData(format!(
                "invalid project directory name '{}'",
                project
            )));
        }
        Ok(())
    }

    fn tmp_path_for(target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        target.with_file_name(format!(".{}.export-tmp", name))
    }

    fn stage_file(project_dir: &Path, file: &ExportFile) -> Result<StagedFile> {
        let target = project_dir.join(file.path.as_str());
        let parent = target.parent().unwrap_or(project_dir);
        std::fs::create_dir_all(parent).map_err(|e| {
            DomainError::Io(format!("failed to create directory for '{}': {}", file.path, e))
        })?;
        let canonical_parent = std::fs::canonicalize(parent)?;
        if !canonical_parent.starts_with(project_dir) {
            return Err(DomainError::InvalidData(format!(
                "path '{}' resolves outside the export directory",
                file.path
            )));
        }

        let tmp = Self::tmp_path_for(&target);
        std::fs::write(&tmp, file.content.as_bytes())
            .map_err(|e| DomainError::Io(format!("failed to write '{}': {}", file.path, e)))?;
        Ok(StagedFile {
            tmp,
            target,
            relative: file.path.as_str().to_string(),
        })
    }

    fn discard(staged: &[StagedFile]) {
        for file in staged {
            if let Err(e) = std::fs::remove_file(&file.tmp) {
                tracing::warn!("failed to remove staged file '{}': {}", file.tmp.display(), e);
            }
        }
    }

    fn unwind(moved: &[StagedFile]) {
        for file in moved {
            if let Err(e) = std::fs::remove_file(&file.target) {
                tracing::warn!("failed to remove exported file '{}': {}", file.target.display(), e);
            }
        }
    }

    /// Stage every file next to its target, then move them into place.
    fn export_sync(canonical_root: &Path, project: &str, files: &[ExportFile]) -> Result<ExportReport> {
        Self::validate_project(project)?;

        let mut seen = HashSet::new();
        for file in files {
            if !seen.insert(file.path.as_str()) {
                return Err(DomainError::InvalidData(format!(
                    "duplicate file path '{}'",
                    file.path
                )));
            }
        }
        for file in files {
            let nested_under = Path::new(file.path.as_str())
                .ancestors()
                .skip(1)
                .filter_map(Path::to_str)
                .find(|ancestor| seen.contains(ancestor));
            if let Some(ancestor) = nested_under {
                return Err(DomainError::InvalidData(format!(
                    "file path '{}' is nested under file path '{}'",
                    file.path, ancestor
                )));
            }
        }

        let project_dir = canonical_root.join(project);
        std::fs::create_dir_all(&project_dir).map_err(|e| {
            DomainError::Io(format!("failed to create project directory: {}", e))
        })?;
        let project_dir = std::fs::canonicalize(&project_dir)?;
        if !project_dir.starts_with(canonical_root) {
            return Err(DomainError::InvalidData(format!(
                "project directory '{}' resolves outside the export root",
                project
            )));
        }

        let mut staged = Vec::with_capacity(files.len());
        for file in files {
            match Self::stage_file(&project_dir, file) {
                Ok(s) => staged.push(s),
                Err(err) => {
                    Self::discard(&staged);
                    return Err(err);
                }
            }
        }

        let mut total_bytes = 0u64;
        let mut written = Vec::with_capacity(staged.len());
        for (idx, file) in staged.iter().enumerate() {
            if let Err(e) = std::fs::rename(&file.tmp, &file.target) {
                Self::discard(&staged[idx..]);
                Self::unwind(&staged[..idx]);
                return Err(DomainError::Io(format!(
                    "failed to move '{}' into place: {}",
                    file.relative, e
                )));
            }
            written.push(file.relative.clone());
        }
        for file in files {
            total_bytes += file.content.len() as u64;
        }

        Ok(ExportReport {
            directory: project_dir.display().to_string(),
            files: written,
            total_bytes,
            exported_at: Utc::now(),
        })
    }
}

#[async_trait]
impl FileExportPort for FileExportFsAdapter {
    async fn export(&self, project: &str, files: &[ExportFile]) -> Result<ExportReport> {
        let canonical_root = self.canonical_root.clone();
        let project = project.to_string();
        let files = files.to_vec();
        task::spawn_blocking(move || Self::export_sync(&canonical_root, &project, &files))
            .await
            .map_err(|e| DomainError::Io(format!("task execution failed: {}", e)))?
    }
}
