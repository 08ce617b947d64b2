use std::fs;
use std::io::{self, Write};
use std::path::Path;

use marksort_core::BookmarkNode;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("parent directory missing or not writable: {0}")]
    ParentDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid bookmark tree: {0}")]
    Json(#[from] serde_json::Error),
}

/// Atomically replaces `path` with `content` by writing a sibling temp file
/// then renaming it over the target.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), PersistError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| PersistError::ParentDir(e.to_string()))?;
    } else if !dir.is_dir() {
        return Err(PersistError::ParentDir(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| PersistError::Io(e.error))?;
    Ok(())
}

/// Reads a bookmark tree from JSON. A top-level array (as exported by
/// browsers' `getTree`) is accepted and its first element used.
pub fn load_tree(path: &Path) -> Result<BookmarkNode, PersistError> {
    let text = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let root = match value {
        serde_json::Value::Array(mut nodes) if !nodes.is_empty() => nodes.swap_remove(0),
        other => other,
    };
    Ok(serde_json::from_value(root)?)
}

pub fn save_tree(path: &Path, tree: &BookmarkNode) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(tree)?;
    write_atomic(path, &json)
}
