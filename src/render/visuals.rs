//! Visual State Resolver.
//!
//! [`resolve`] is a pure function of the entity store, editor settings,
//! selection and hover, plus the retired asset ids reported by
//! [`super::SceneMirror::retired`]. [`apply`] writes its result into a scene
//! graph.

use super::{NodeAppearance, NodeHandle, NodeTag, SceneGraph, Tint};
use crate::scene::{EntityId, EntityStore, Rgb};
use crate::ui::EditorSettings;

pub const SELECTION_TINT: Tint = Tint {
    color: Rgb::new(0x00, 0x66, 0xff),
    intensity: 0.3,
};

pub const HOVER_TINT: Tint = Tint {
    color: Rgb::new(0x33, 0x33, 0x33),
    intensity: 0.1,
};

#[derive(Debug, Clone, Copy)]
pub struct VisualInputs<'a> {
    pub store: &'a EntityStore,
    pub settings: &'a EditorSettings,
    pub selected: Option<&'a EntityId>,
    pub hovered: Option<&'a EntityId>,
    /// Asset nodes whose entity was deleted. They are hidden, never destroyed.
    pub retired: &'a [EntityId],
}

/// Appearance for one node, or `None` when no entity record ever matched and
/// the node should keep whatever it has.
pub fn resolve_node(inputs: &VisualInputs<'_>, tag: &NodeTag) -> Option<NodeAppearance> {
    let category = tag.category?;
    let Some(entity) = inputs.store.find(category, tag.id.as_str()) else {
        return inputs.retired.contains(&tag.id).then(|| NodeAppearance {
            visible: false,
            color: category.default_color(),
            wireframe: inputs.settings.show_wireframe,
            tint: Tint::NONE,
        });
    };
    let visible = entity.visible && inputs.settings.category_visible(category);

    let tint = if !visible {
        Tint::NONE
    } else if inputs.selected == Some(&tag.id) {
        SELECTION_TINT
    } else if inputs.hovered == Some(&tag.id) {
        HOVER_TINT
    } else {
        Tint::NONE
    };

    Some(NodeAppearance {
        visible,
        color: entity.color,
        wireframe: inputs.settings.show_wireframe,
        tint,
    })
}

pub fn resolve(
    inputs: &VisualInputs<'_>,
    nodes: &[(NodeHandle, NodeTag)],
) -> Vec<(NodeHandle, NodeAppearance)> {
    nodes
        .iter()
        .filter_map(|(node, tag)| resolve_node(inputs, tag).map(|appearance| (*node, appearance)))
        .collect()
}

/// Writes resolved appearances, skipping nodes that already match.
/// Returns the number of nodes written.
pub fn apply<S: SceneGraph + ?Sized>(scene: &mut S, resolved: &[(NodeHandle, NodeAppearance)]) -> usize {
    let mut written = 0;
    for (node, appearance) in resolved {
        if scene.appearance(*node).as_ref() != Some(appearance) {
            scene.set_appearance(*node, *appearance);
            written += 1;
        }
    }
    written
}
