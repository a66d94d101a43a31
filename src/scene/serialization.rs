use crate::scene::EntityStore;
use crate::ui::EditorSettings;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn save_store_to_file(store: &EntityStore, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(store)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_store_from_file(path: &Path) -> Result<EntityStore> {
    let json = std::fs::read_to_string(path)?;
    let store: EntityStore = serde_json::from_str(&json)?;
    Ok(store)
}

pub fn save_settings_to_file(settings: &EditorSettings, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Missing fields fall back to [`EditorSettings::default`].
pub fn load_settings_from_file(path: &Path) -> Result<EditorSettings> {
    let json = std::fs::read_to_string(path)?;
    let settings: EditorSettings = serde_json::from_str(&json)?;
    Ok(settings)
}
