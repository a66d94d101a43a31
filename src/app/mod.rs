//! Editor façade: owns the entity store, settings, selection and hover, and
//! keeps the scene graph consistent with them after every change.

mod input;

pub use input::command_for_key;

use crate::assets::ModelAsset;
use crate::render::capture::{self, CaptureError};
use crate::render::visuals::{self, VisualInputs};
use crate::render::{
    route, Affordance, CameraPreset, CameraRig, CameraState, Environment, HoverChange,
    PointerEvent, ReconcileReport, SceneGraph, SceneMirror, SelectionRef,
};
use crate::scene::{Category, EntityId, EntityStore, Rgb, SceneError};
use crate::ui::{EditorSettings, LightingMode};

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Commands from the surrounding application. Names and colors arrive as
/// strings and are validated before anything changes.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    AddWall,
    RemoveSelected,
    ToggleObjectVisibility { id: String, category: String },
    ToggleCategoryVisibility(String),
    UpdateSelectedColor(String),
    /// Selection from the object list rather than the viewport.
    Select(String),
    ClearSelection,
    SetEditMode(bool),
    SetWireframe(bool),
    SetGrid(bool),
    SetLighting(LightingMode),
    Camera(CameraPreset),
    Screenshot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    SelectionChanged(Option<SelectionRef>),
    Affordance(Affordance),
    ScreenshotSaved(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("screenshot failed: {0}")]
    Capture(#[from] CaptureError),
}

/// Zero-argument camera and capture triggers exposed to the application.
pub trait ViewerHandle {
    fn reset_camera(&mut self);
    fn set_top_view(&mut self);
    fn set_front_view(&mut self);
    fn set_side_view(&mut self);
    fn take_screenshot(&mut self);
}

pub struct Editor<S: SceneGraph> {
    scene: S,
    store: EntityStore,
    settings: EditorSettings,
    selection: Option<SelectionRef>,
    hover: Option<EntityId>,
    mirror: SceneMirror,
    rig: CameraRig,
    rng: StdRng,
    capture_dir: PathBuf,
    events: Vec<EditorEvent>,
}

impl<S: SceneGraph> Editor<S> {
    pub fn new(scene: S, store: EntityStore, settings: EditorSettings) -> Self {
        let mut editor = Self {
            scene,
            store,
            settings,
            selection: None,
            hover: None,
            mirror: SceneMirror::new(),
            rig: CameraRig::new().with_orbit_controls(),
            rng: StdRng::from_entropy(),
            capture_dir: PathBuf::from("."),
            events: Vec::new(),
        };
        editor.sync();
        editor
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = dir.into();
        self
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn selection(&self) -> Option<&SelectionRef> {
        self.selection.as_ref()
    }

    pub fn hover(&self) -> Option<&EntityId> {
        self.hover.as_ref()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn mirror(&self) -> &SceneMirror {
        &self.mirror
    }

    pub fn camera(&self) -> &CameraState {
        self.rig.camera()
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    pub fn capture_dir(&self) -> &Path {
        &self.capture_dir
    }

    /// Hands the loaded asset's nodes to the scene and styles them.
    pub fn attach_model(&mut self, model: &ModelAsset) -> usize {
        let count = model.attach(&mut self.scene).len();
        self.sync();
        count
    }

    /// Replaces the whole store, e.g. with a snapshot from the application.
    pub fn replace_store(&mut self, store: EntityStore) {
        self.store = store;
        self.drop_dangling_references();
        self.sync();
    }

    pub fn replace_settings(&mut self, settings: EditorSettings) {
        let leaving_edit_mode = self.settings.edit_mode && !settings.edit_mode;
        self.settings = settings;
        if leaving_edit_mode {
            self.clear_interaction();
        }
        self.sync();
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn dispatch(&mut self, command: EditorCommand) -> Result<(), EditorError> {
        log::debug!("Command {:?}", command);
        match command {
            EditorCommand::AddWall => self.add_wall(),
            EditorCommand::RemoveSelected => self.remove_selected(),
            EditorCommand::ToggleObjectVisibility { id, category } => {
                let category: Category = category.parse()?;
                let visible = self.store.toggle_visibility(category, &id)?;
                log::info!("Toggled visibility of {}: {}", id, visible);
            }
            EditorCommand::ToggleCategoryVisibility(name) => {
                let category: Category = name.parse()?;
                let visible = self.settings.toggle_category(category);
                log::info!("Toggled category {}: {}", category.plural(), visible);
            }
            EditorCommand::UpdateSelectedColor(color) => {
                let color: Rgb = color.parse()?;
                self.update_selected_color(color)?;
            }
            EditorCommand::Select(id) => self.select_by_id(&id)?,
            EditorCommand::ClearSelection => self.set_selection(None),
            EditorCommand::SetEditMode(enabled) => self.set_edit_mode(enabled),
            EditorCommand::SetWireframe(enabled) => self.settings.show_wireframe = enabled,
            EditorCommand::SetGrid(enabled) => self.settings.show_grid = enabled,
            EditorCommand::SetLighting(mode) => self.settings.lighting = mode,
            EditorCommand::Camera(preset) => self.rig.apply_preset(preset),
            EditorCommand::Screenshot => {
                self.screenshot()?;
            }
        }
        self.sync();
        Ok(())
    }

    /// Feeds a pointer event from the viewport through the router.
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        let output = route(self.settings.edit_mode, event, &self.scene);
        if output.is_empty() {
            return false;
        }
        if let Some(selected) = output.selected {
            if self.store.contains(selected.id.as_str()) {
                self.set_selection(Some(selected));
            } else {
                log::debug!("Ignoring click on {} with no entity record", selected.id);
            }
        }
        match output.hover {
            Some(HoverChange::Set(id)) => self.hover = Some(id),
            Some(HoverChange::Cleared) => self.hover = None,
            None => {}
        }
        if let Some(affordance) = output.affordance {
            self.events.push(EditorEvent::Affordance(affordance));
        }
        self.refresh_visuals();
        output.stop_propagation
    }

    pub fn key(&mut self, key: &str) -> Result<(), EditorError> {
        match command_for_key(key, self.settings.edit_mode) {
            Some(command) => self.dispatch(command),
            None => Ok(()),
        }
    }

    /// Draws the current state into the scene's frame buffer.
    pub fn render_frame(&mut self) {
        self.scene.draw(self.rig.camera());
    }

    /// Renders, captures and writes `blueprint-3d-<millis>.png` to the capture directory.
    pub fn screenshot(&mut self) -> Result<PathBuf, EditorError> {
        self.render_frame();
        let frame = self.scene.read_frame();
        let path = capture::save_screenshot(&frame, &self.capture_dir, SystemTime::now())?;
        self.events.push(EditorEvent::ScreenshotSaved(path.clone()));
        Ok(path)
    }

    /// Releases every mirrored node and returns the scene.
    pub fn into_scene(mut self) -> S {
        let released = self.mirror.release_all(&mut self.scene);
        log::debug!("Released {} mirrored nodes", released);
        self.scene
    }

    fn add_wall(&mut self) {
        let wall = self.store.add_wall(self.settings.paint_color, &mut self.rng);
        let selection = SelectionRef {
            id: wall.id.clone(),
            name: wall.name.clone(),
            kind: Some(Category::Wall),
            node: None,
        };
        self.mirror.reconcile(&self.store, &mut self.scene);
        let node = self.mirror.node_for(selection.id.as_str());
        self.set_selection(Some(SelectionRef { node, ..selection }));
    }

    fn remove_selected(&mut self) {
        let Some(selection) = self.selection.clone() else {
            log::debug!("Remove with no selection");
            return;
        };
        let Some(kind) = selection.kind else {
            return;
        };
        match self.store.remove(kind, selection.id.as_str()) {
            Some(_) => log::info!("Removed {} {}", kind, selection.id),
            None => log::warn!("Selected {} {} is not in the {} list", kind, selection.id, kind.plural()),
        }
        if self.hover.as_ref() == Some(&selection.id) {
            self.hover = None;
        }
        self.set_selection(None);
    }

    fn update_selected_color(&mut self, color: Rgb) -> Result<(), SceneError> {
        let Some(selection) = &self.selection else {
            log::debug!("Color change with no selection");
            return Ok(());
        };
        let Some(kind) = selection.kind else {
            return Ok(());
        };
        self.store.set_color(kind, selection.id.as_str(), color)?;
        self.settings.paint_color = color;
        log::info!("Updated color for {}: {}", selection.id, color);
        Ok(())
    }

    fn select_by_id(&mut self, id: &str) -> Result<(), SceneError> {
        let Some((category, entity)) = self.store.get(id) else {
            return Err(match Category::from_tag(id) {
                Some(category) => SceneError::UnknownEntity {
                    category,
                    id: EntityId::new(id),
                },
                None => SceneError::UnknownId(EntityId::new(id)),
            });
        };
        let selection = SelectionRef {
            id: entity.id.clone(),
            name: entity.name.clone(),
            kind: Some(category),
            node: self.mirror.node_for(id),
        };
        self.set_selection(Some(selection));
        Ok(())
    }

    fn set_edit_mode(&mut self, enabled: bool) {
        if self.settings.edit_mode == enabled {
            return;
        }
        self.settings.edit_mode = enabled;
        log::info!("Edit mode {}", if enabled { "on" } else { "off" });
        if !enabled {
            self.clear_interaction();
        }
    }

    fn clear_interaction(&mut self) {
        self.set_selection(None);
        if self.hover.take().is_some() {
            self.events.push(EditorEvent::Affordance(Affordance::Default));
        }
    }

    fn set_selection(&mut self, selection: Option<SelectionRef>) {
        if self.selection == selection {
            return;
        }
        self.selection = selection;
        self.events.push(EditorEvent::SelectionChanged(self.selection.clone()));
    }

    fn drop_dangling_references(&mut self) {
        let selection_gone = self
            .selection
            .as_ref()
            .is_some_and(|selection| !self.store.contains(selection.id.as_str()));
        if selection_gone {
            self.set_selection(None);
        }
        if self.hover.as_ref().is_some_and(|id| !self.store.contains(id.as_str())) {
            self.hover = None;
        }
    }

    fn sync(&mut self) -> ReconcileReport {
        let report = self.mirror.reconcile(&self.store, &mut self.scene);
        self.scene.set_environment(Environment {
            show_grid: self.settings.show_grid,
            lighting: self.settings.lighting.intensity(),
        });
        self.refresh_visuals();
        report
    }

    fn refresh_visuals(&mut self) -> usize {
        let retired = self.mirror.retired(&self.store);
        let inputs = VisualInputs {
            store: &self.store,
            settings: &self.settings,
            selected: self.selection.as_ref().map(|selection| &selection.id),
            hovered: self.hover.as_ref(),
            retired: &retired,
        };
        let resolved = visuals::resolve(&inputs, &self.scene.nodes());
        visuals::apply(&mut self.scene, &resolved)
    }
}

impl<S: SceneGraph> ViewerHandle for Editor<S> {
    fn reset_camera(&mut self) {
        self.rig.apply_preset(CameraPreset::Default);
    }

    fn set_top_view(&mut self) {
        self.rig.apply_preset(CameraPreset::Top);
    }

    fn set_front_view(&mut self) {
        self.rig.apply_preset(CameraPreset::Front);
    }

    fn set_side_view(&mut self) {
        self.rig.apply_preset(CameraPreset::Side);
    }

    fn take_screenshot(&mut self) {
        if let Err(err) = self.screenshot() {
            log::warn!("Screenshot failed: {}", err);
        }
    }
}
