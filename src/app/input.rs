use super::EditorCommand;

/// Maps a key name from the presentation layer to an editor command.
///
/// Shortcuts only apply in edit mode.
pub fn command_for_key(key: &str, edit_mode: bool) -> Option<EditorCommand> {
    if !edit_mode {
        return None;
    }
    match key {
        "Escape" => Some(EditorCommand::SetEditMode(false)),
        "Delete" | "Backspace" => Some(EditorCommand::RemoveSelected),
        _ => None,
    }
}
