use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary workspace directory
pub fn create_test_workspace() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a workspace file with content, including any parent directories
pub fn create_test_file(workspace: &TempDir, relative_path: &str, content: &str) -> PathBuf {
    let file_path = workspace.path().join(relative_path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();
    file_path
}
