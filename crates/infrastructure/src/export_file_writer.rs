use std::path::{Path, PathBuf};

use januscope_application::ExportFile;
use januscope_core::{AppError, AppResult};
use tracing::info;

/// Saves export files into one directory.
#[derive(Debug, Clone)]
pub struct ExportFileWriter {
    directory: PathBuf,
}

impl ExportFileWriter {
    /// Creates a writer targeting `directory`. The directory is created on first write.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the target directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes the file, replacing an existing one of the same name, and returns its path.
    pub async fn write(&self, file: &ExportFile) -> AppResult<PathBuf> {
        let file_name = Path::new(&file.file_name);
        if file.file_name.is_empty()
            || file_name.components().count() != 1
            || file_name.file_name().is_none()
        {
            return Err(AppError::Validation(format!(
                "export file name '{}' must be a plain file name",
                file.file_name
            )));
        }

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|error| {
                AppError::Export(format!(
                    "failed to create export directory '{}': {error}",
                    self.directory.display()
                ))
            })?;

        let path = self.directory.join(file_name);
        tokio::fs::write(&path, &file.bytes).await.map_err(|error| {
            AppError::Export(format!(
                "failed to write export file '{}': {error}",
                path.display()
            ))
        })?;

        info!(
            path = %path.display(),
            bytes = file.bytes.len(),
            mime_type = file.mime_type,
            "export file written"
        );
        Ok(path)
    }
}
