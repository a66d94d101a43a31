//! Interaction Router: pointer events on scene nodes become selection and
//! hover changes.
//!
//! Routing is gated by edit mode and never touches global state. Cursor
//! changes are returned as an [`Affordance`] for the presentation layer.

use super::{NodeHandle, NodeTag, SceneGraph};
use crate::scene::{Category, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Click(NodeHandle),
    Enter(NodeHandle),
    Leave,
}

/// Cursor hint for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Default,
    Pointer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRef {
    pub id: EntityId,
    pub name: String,
    /// `None` when the node name matched no known category.
    pub kind: Option<Category>,
    pub node: Option<NodeHandle>,
}

impl SelectionRef {
    pub fn from_tag(tag: &NodeTag, node: Option<NodeHandle>) -> Self {
        Self {
            id: tag.id.clone(),
            name: tag.display_name(),
            kind: tag.category,
            node,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        self.kind.map_or("unknown", Category::prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverChange {
    Set(EntityId),
    Cleared,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterOutput {
    pub selected: Option<SelectionRef>,
    pub hover: Option<HoverChange>,
    pub affordance: Option<Affordance>,
    /// The event was consumed and must not reach nodes behind this one.
    pub stop_propagation: bool,
}

impl RouterOutput {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub fn route<S: SceneGraph + ?Sized>(edit_mode: bool, event: PointerEvent, scene: &S) -> RouterOutput {
    if !edit_mode {
        return RouterOutput::default();
    }
    match event {
        PointerEvent::Click(node) => {
            let Some(tag) = scene.tag(node) else {
                log::debug!("Click on unknown node {:?}", node);
                return RouterOutput::default();
            };
            RouterOutput {
                selected: Some(SelectionRef::from_tag(tag, Some(node))),
                stop_propagation: true,
                ..RouterOutput::default()
            }
        }
        PointerEvent::Enter(node) => match scene.tag(node) {
            Some(tag) => RouterOutput {
                hover: Some(HoverChange::Set(tag.id.clone())),
                affordance: Some(Affordance::Pointer),
                ..RouterOutput::default()
            },
            None => RouterOutput::default(),
        },
        PointerEvent::Leave => RouterOutput {
            hover: Some(HoverChange::Cleared),
            affordance: Some(Affordance::Default),
            ..RouterOutput::default()
        },
    }
}
