use std::io::ErrorKind;
use vidlift_core::{CapturedFile, CleanupError};

/// Deletes local files once the destination holds them.
#[derive(Clone, Debug, Default)]
pub struct CleanupManager;

impl CleanupManager {
    pub fn new() -> Self {
        Self
    }

    pub async fn cleanup(&self, file: &CapturedFile) -> Result<(), CleanupError> {
        match tokio::fs::remove_file(&file.path).await {
            Ok(()) => {
                tracing::debug!(file = %file.path.display(), "Deleted uploaded file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CleanupError::AlreadyGone(file.path.clone()))
            }
            Err(source) => Err(CleanupError::Io {
                path: file.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"frames").unwrap();

        let file = CapturedFile::from_path(&path).unwrap();
        CleanupManager::new().cleanup(&file).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_file_is_already_gone() {
        let dir = tempfile::tempdir().unwrap();
        let file = CapturedFile::from_path(dir.path().join("clip.mp4")).unwrap();
        assert!(matches!(
            CleanupManager::new().cleanup(&file).await,
            Err(CleanupError::AlreadyGone(_))
        ));
    }

    #[tokio::test]
    async fn directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("clip.mp4");
        std::fs::create_dir(&sub).unwrap();
        let file = CapturedFile::from_path(&sub).unwrap();
        assert!(matches!(
            CleanupManager::new().cleanup(&file).await,
            Err(CleanupError::Io { .. })
        ));
    }
}
