use crate::session::{SessionDocument, SessionError};
use relative_path::RelativePath;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory inside a workspace that holds annotext's own files
pub const STATE_DIR: &str = ".annotext";

/// Session file name inside [`STATE_DIR`]
pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("No such file: {0}")]
    NotFound(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid workspace directory {path}: {reason}")]
    InvalidWorkspace { path: PathBuf, reason: &'static str },
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Read a workspace file as UTF-8 text
pub fn read_file(relative_path: &RelativePath, workspace_root: &Path) -> Result<String, IoError> {
    let path = relative_path.to_path(workspace_root);
    fs::read_to_string(&path).map_err(|error| match error.kind() {
        ErrorKind::NotFound => IoError::NotFound(path),
        _ => IoError::Io(error),
    })
}

/// Replace a workspace file's content, creating its directory if needed
pub fn write_file(
    relative_path: &RelativePath,
    workspace_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let path = relative_path.to_path(workspace_root);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&path, content)?;
    Ok(())
}

pub fn validate_workspace(path: &Path) -> Result<(), IoError> {
    let reason = match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => return Ok(()),
        Ok(_) => "not a directory",
        Err(_) => "directory does not exist",
    };
    Err(IoError::InvalidWorkspace {
        path: path.to_path_buf(),
        reason,
    })
}

/// Location of the session file for a workspace
pub fn session_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(STATE_DIR).join(SESSION_FILE)
}

/// Load the workspace session, starting a fresh one named after the workspace
/// folder when none has been saved yet
pub fn load_session(workspace_root: &Path) -> Result<SessionDocument, IoError> {
    validate_workspace(workspace_root)?;

    match SessionDocument::load_from_path(session_path(workspace_root))? {
        Some(session) => Ok(session),
        None => {
            let folder_name = workspace_root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            log::debug!("No session yet for {}", workspace_root.display());
            Ok(SessionDocument::new(folder_name))
        }
    }
}

pub fn save_session(workspace_root: &Path, session: &SessionDocument) -> anyhow::Result<()> {
    session.save_to_path(session_path(workspace_root))
}
