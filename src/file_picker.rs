use std::path::{Path, PathBuf};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "mkv", "avi"];

/// A media file the user picked on this device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    /// Display name (file name component)
    pub name: String,
}

impl LocalFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    /// Content type sent with the byte transfer, derived from the extension
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("mp4") | Some("m4v") => "video/mp4",
            Some("mov") => "video/quicktime",
            Some("webm") => "video/webm",
            Some("mkv") => "video/x-matroska",
            Some("avi") => "video/x-msvideo",
            _ => "application/octet-stream",
        }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Result of asking the user for a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    Cancelled,
    Selected(LocalFile),
}

impl FileSelection {
    /// Cancelling is not an error, it just means no upload starts
    pub fn into_file(self) -> Option<LocalFile> {
        match self {
            FileSelection::Cancelled => None,
            FileSelection::Selected(file) => Some(file),
        }
    }
}

/// Trait for on-device file selection (allows mocking for tests)
#[async_trait::async_trait]
pub trait FilePicker: Send + Sync {
    async fn pick_video(&self) -> FileSelection;
}

/// Native file dialog filtered to video files
#[derive(Debug, Clone, Default)]
pub struct DialogFilePicker {
    start_dir: Option<PathBuf>,
}

impl DialogFilePicker {
    pub fn new() -> Self {
        Self {
            start_dir: dirs::video_dir(),
        }
    }

    pub fn with_start_dir(dir: &Path) -> Self {
        Self {
            start_dir: Some(dir.to_path_buf()),
        }
    }
}

#[async_trait::async_trait]
impl FilePicker for DialogFilePicker {
    async fn pick_video(&self) -> FileSelection {
        let mut dialog = rfd::AsyncFileDialog::new()
            .set_title("Select a video")
            .add_filter("Video", VIDEO_EXTENSIONS);
        if let Some(dir) = &self.start_dir {
            dialog = dialog.set_directory(dir);
        }

        match dialog.pick_file().await {
            Some(handle) => FileSelection::Selected(LocalFile::from_path(handle.path())),
            None => {
                tracing::debug!("File selection cancelled");
                FileSelection::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_file_name_and_mime() {
        let file = LocalFile::from_path("/tmp/clips/Holiday.MOV");
        assert_eq!(file.name, "Holiday.MOV");
        assert_eq!(file.mime_type(), "video/quicktime");

        let file = LocalFile::from_path("/tmp/clips/raw.bin");
        assert_eq!(file.mime_type(), "application/octet-stream");
    }

    #[test]
    fn test_cancelled_selection_has_no_file() {
        assert_eq!(FileSelection::Cancelled.into_file(), None);
        let file = LocalFile::from_path("/tmp/a.mp4");
        assert_eq!(
            FileSelection::Selected(file.clone()).into_file(),
            Some(file)
        );
    }
}
