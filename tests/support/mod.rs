#![allow(dead_code)]

use vidshare::file_picker::LocalFile;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Write a small fake video into a temp dir and return it as a picked file
pub fn fake_video(dir: &tempfile::TempDir, name: &str) -> LocalFile {
    let path = dir.path().join(name);
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42 fake video bytes").unwrap();
    LocalFile::from_path(path)
}
