use crate::io::document::Document;
use std::path::PathBuf;

/// Save a document to a JSON file.
pub fn save_document(doc: &Document, path: &PathBuf) -> Result<(), String> {
    let json = serde_json::to_string_pretty(doc).map_err(|e| e.to_string())?;
    std::fs::write(path, json).map_err(|e| e.to_string())
}

/// Load a document from a JSON file.
pub fn load_document(path: &PathBuf) -> Result<Document, String> {
    let json = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&json).map_err(|e| e.to_string())
}

/// Per-user data directory, created on first use.
pub fn data_dir() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "Blockline")?;
    let dir = dirs.data_dir().to_path_buf();
    let _ = std::fs::create_dir_all(&dir);
    Some(dir)
}

/// Where the autosaved session document lives between runs.
pub fn session_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("session.json"))
}
