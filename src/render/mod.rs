mod camera;
pub mod capture;
mod headless;
pub mod mirror;
pub mod pick;
pub mod visuals;

pub use camera::{CameraPreset, CameraRig, CameraState, OrbitControls};
pub use headless::{HeadlessScene, RenderConfig, SceneStats};
pub use mirror::{ReconcileReport, SceneMirror};
pub use pick::{route, Affordance, HoverChange, PointerEvent, RouterOutput, SelectionRef};

use crate::scene::{Category, EntityId, Placement, Rgb};
use crate::ui::LightingIntensity;

/// Opaque handle to a node owned by a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u64);

impl NodeHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Typed back-reference from a scene node to the entity it renders.
///
/// Fixed when the node is created or attached; `category` is `None` for asset
/// nodes whose name carries no known prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeTag {
    pub category: Option<Category>,
    pub id: EntityId,
}

impl NodeTag {
    pub fn new(category: Category, id: EntityId) -> Self {
        Self {
            category: Some(category),
            id,
        }
    }

    /// Classifies an asset node by its name.
    pub fn from_name(name: &str) -> Self {
        Self {
            category: Category::from_tag(name),
            id: EntityId::new(name),
        }
    }

    /// `wall_3` becomes `Wall 3`; unclassified names are returned as-is.
    pub fn display_name(&self) -> String {
        let Some(category) = self.category else {
            return self.id.to_string();
        };
        let rest = self
            .id
            .as_str()
            .strip_prefix(category.prefix())
            .unwrap_or_default();
        match rest.strip_prefix('_') {
            Some(suffix) => format!("{} {}", category.label(), suffix),
            None => format!("{}{}", category.label(), rest),
        }
    }

    pub fn kind_label(&self) -> &'static str {
        self.category.map_or("unknown", Category::prefix)
    }
}

/// Emissive highlight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub color: Rgb,
    pub intensity: f32,
}

impl Tint {
    pub const NONE: Self = Self {
        color: Rgb::BLACK,
        intensity: 0.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeAppearance {
    pub visible: bool,
    pub color: Rgb,
    pub wireframe: bool,
    pub tint: Tint,
}

impl Default for NodeAppearance {
    fn default() -> Self {
        Self {
            visible: true,
            color: Rgb::new(0x80, 0x80, 0x80),
            wireframe: false,
            tint: Tint::NONE,
        }
    }
}

/// Box-shaped renderable materialized for a new entity.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpec {
    pub tag: NodeTag,
    pub placement: Placement,
    pub color: Rgb,
}

/// Scene-wide settings that are not per node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub show_grid: bool,
    pub lighting: LightingIntensity,
}

/// The imperative scene graph the editor drives.
///
/// Only the scene mirror creates and destroys nodes, and only the visual pass
/// writes appearances. Both run on the caller's thread.
pub trait SceneGraph {
    /// Creates box geometry plus a material, inserts the node and returns it.
    fn spawn_box(&mut self, spec: &BoxSpec) -> NodeHandle;

    /// Registers a node that already exists in the loaded asset. Asset nodes
    /// own no engine-created resources and are never despawned by the mirror.
    fn insert_asset_node(&mut self, tag: NodeTag, appearance: NodeAppearance) -> NodeHandle;

    /// Removes the node and releases its geometry and material.
    /// Returns `false` if the handle is unknown.
    fn despawn(&mut self, node: NodeHandle) -> bool;

    fn tag(&self, node: NodeHandle) -> Option<&NodeTag>;

    /// Every live node with its tag.
    fn nodes(&self) -> Vec<(NodeHandle, NodeTag)>;

    fn appearance(&self, node: NodeHandle) -> Option<NodeAppearance>;

    fn set_appearance(&mut self, node: NodeHandle, appearance: NodeAppearance);

    fn set_environment(&mut self, environment: Environment);

    fn draw(&mut self, camera: &CameraState);

    /// Pixels of the last drawn frame.
    ///
    /// Renderers configured without a retained drawing buffer return a blank
    /// image here; that is a configuration error and is not detected.
    fn read_frame(&self) -> image::RgbaImage;
}
