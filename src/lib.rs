//! Planviz: keeps a 3D floor-plan scene in step with an editable list of
//! walls, doors, windows and rooms.

pub mod app;
pub mod assets;
pub mod render;
pub mod scene;
pub mod ui;

pub use app::{Editor, EditorCommand, EditorError, EditorEvent, ViewerHandle};
pub use render::{HeadlessScene, RenderConfig, SceneGraph};
pub use scene::{Category, DetectionSummary, EntityStore};
pub use ui::EditorSettings;
