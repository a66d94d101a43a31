//! Entity Store: the declarative list of walls, doors, windows and rooms.
//!
//! The store is the single source of truth for what exists in the plan.
//! Scene nodes are derived from it by [`crate::render::mirror::SceneMirror`]
//! and never feed back into it.

pub mod serialization;

use rand::Rng;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown category: {0:?}")]
    UnknownCategory(String),
    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),
    #[error("no {category} with id {id:?}")]
    UnknownEntity { category: Category, id: EntityId },
    #[error("no entity with id {0:?}")]
    UnknownId(EntityId),
}

/// One of the four fixed entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Wall,
    Door,
    Window,
    Room,
}

impl Category {
    pub const ALL: [Category; 4] = [Self::Wall, Self::Door, Self::Window, Self::Room];

    /// Token used as the id prefix (`wall_3`).
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Door => "door",
            Self::Window => "window",
            Self::Room => "room",
        }
    }

    /// Capitalized label used in display names (`Wall 3`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Wall => "Wall",
            Self::Door => "Door",
            Self::Window => "Window",
            Self::Room => "Room",
        }
    }

    /// Name of the category list (`walls`), as used by category toggles.
    pub fn plural(self) -> &'static str {
        match self {
            Self::Wall => "walls",
            Self::Door => "doors",
            Self::Window => "windows",
            Self::Room => "rooms",
        }
    }

    /// Classifies a node name or entity id by its category prefix.
    ///
    /// The prefix must be followed by `_` or end the string, so `wallpaper`
    /// is not a wall.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| {
            tag.strip_prefix(category.prefix())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('_'))
        })
    }

    pub fn default_color(self) -> Rgb {
        match self {
            Self::Wall => Rgb::new(0xcc, 0xcc, 0xcc),
            Self::Door | Self::Room => Rgb::new(0x8b, 0x45, 0x13),
            Self::Window => Rgb::new(0x87, 0xce, 0xeb),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Category {
    type Err = SceneError;

    /// Accepts both the singular prefix (`door`) and the list name (`doors`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| s == category.prefix() || s == category.plural())
            .ok_or_else(|| SceneError::UnknownCategory(s.to_string()))
    }
}

/// Stable, category-prefixed entity id (`wall_0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn numbered(category: Category, index: u32) -> Self {
        Self(format!("{}_{}", category.prefix(), index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::borrow::Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// 8-bit RGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Self = Self([0, 0, 0]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn to_f32(self) -> [f32; 3] {
        self.0.map(|channel| channel as f32 / 255.0)
    }
}

impl FromStr for Rgb {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SceneError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }
}

impl TryFrom<String> for Rgb {
    type Error = SceneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

/// Placement of an entity the engine materializes itself.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    pub position: [f32; 3],
    /// Box dimensions.
    pub scale: [f32; 3],
    /// Euler angles in radians, XYZ order.
    pub rotation: [f32; 3],
}

pub const DEFAULT_WALL_SCALE: [f32; 3] = [2.0, 3.0, 0.2];
/// New walls land at `x, z` in `[-WALL_SPREAD, WALL_SPREAD)`.
pub const WALL_SPREAD: f32 = 3.0;

impl Placement {
    pub fn random_wall<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            position: [
                rng.gen_range(-WALL_SPREAD..WALL_SPREAD),
                0.0,
                rng.gen_range(-WALL_SPREAD..WALL_SPREAD),
            ],
            scale: DEFAULT_WALL_SCALE,
            rotation: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub visible: bool,
    pub color: Rgb,
    /// Created this session and materialized by the engine.
    #[serde(default)]
    pub is_new: bool,
    /// Present at load time; geometry lives inside the loaded asset.
    #[serde(default)]
    pub is_original: bool,
    #[serde(default, flatten, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
}

/// Entity counts reported by the blueprint analysis backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DetectionSummary {
    pub walls_detected: u32,
    pub doors_detected: u32,
    pub windows_detected: u32,
    pub rooms_detected: u32,
}

impl DetectionSummary {
    pub fn count(&self, category: Category) -> u32 {
        match category {
            Category::Wall => self.walls_detected,
            Category::Door => self.doors_detected,
            Category::Window => self.windows_detected,
            Category::Room => self.rooms_detected,
        }
    }
}

/// Next sequential index per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NextIds {
    pub wall: u32,
    pub door: u32,
    pub window: u32,
    pub room: u32,
}

impl NextIds {
    fn slot(&mut self, category: Category) -> &mut u32 {
        match category {
            Category::Wall => &mut self.wall,
            Category::Door => &mut self.door,
            Category::Window => &mut self.window,
            Category::Room => &mut self.room,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EntityStore {
    walls: Vec<Entity>,
    doors: Vec<Entity>,
    windows: Vec<Entity>,
    rooms: Vec<Entity>,
    next_id: NextIds,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with the original entities found by the analysis.
    pub fn from_detection(summary: DetectionSummary) -> Self {
        let mut store = Self::new();
        for category in Category::ALL {
            let count = summary.count(category);
            let list = store.list_mut(category);
            list.extend((0..count).map(|index| Entity {
                id: EntityId::numbered(category, index),
                name: format!("{} {}", category.label(), index + 1),
                visible: true,
                color: category.default_color(),
                is_new: false,
                is_original: true,
                placement: None,
            }));
            *store.next_id.slot(category) = count;
        }
        store
    }

    pub fn list(&self, category: Category) -> &[Entity] {
        match category {
            Category::Wall => &self.walls,
            Category::Door => &self.doors,
            Category::Window => &self.windows,
            Category::Room => &self.rooms,
        }
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<Entity> {
        match category {
            Category::Wall => &mut self.walls,
            Category::Door => &mut self.doors,
            Category::Window => &mut self.windows,
            Category::Room => &mut self.rooms,
        }
    }

    /// Every entity across the four lists, tagged with its category.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &Entity)> {
        Category::ALL
            .into_iter()
            .flat_map(move |category| self.list(category).iter().map(move |e| (category, e)))
    }

    pub fn get(&self, id: &str) -> Option<(Category, &Entity)> {
        self.iter().find(|(_, entity)| entity.id.as_str() == id)
    }

    pub fn find(&self, category: Category, id: &str) -> Option<&Entity> {
        self.list(category).iter().find(|entity| entity.id.as_str() == id)
    }

    fn find_mut(&mut self, category: Category, id: &str) -> Result<&mut Entity, SceneError> {
        self.list_mut(category)
            .iter_mut()
            .find(|entity| entity.id.as_str() == id)
            .ok_or_else(|| SceneError::UnknownEntity {
                category,
                id: EntityId::new(id),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.list(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn visible_count(&self, category: Category) -> usize {
        self.list(category).iter().filter(|e| e.visible).count()
    }

    pub fn next_ids(&self) -> NextIds {
        self.next_id
    }

    /// Appends a new wall with the next sequential id and a random placement.
    pub fn add_wall<R: Rng + ?Sized>(&mut self, color: Rgb, rng: &mut R) -> &Entity {
        // Snapshots may arrive without counters; never hand out a live id.
        let mut index = self.next_id.wall;
        while self.contains(EntityId::numbered(Category::Wall, index).as_str()) {
            index += 1;
        }
        self.next_id.wall = index + 1;
        let wall = Entity {
            id: EntityId::numbered(Category::Wall, index),
            name: format!("{} {}", Category::Wall.label(), index + 1),
            visible: true,
            color,
            is_new: true,
            is_original: false,
            placement: Some(Placement::random_wall(rng)),
        };
        log::info!("Added wall {} at {:?}", wall.id, wall.placement.map(|p| p.position));
        let walls = self.list_mut(Category::Wall);
        walls.push(wall);
        &walls[walls.len() - 1]
    }

    pub fn remove(&mut self, category: Category, id: &str) -> Option<Entity> {
        let list = self.list_mut(category);
        let index = list.iter().position(|entity| entity.id.as_str() == id)?;
        Some(list.remove(index))
    }

    /// Flips the entity's own `visible` flag and returns the new value.
    pub fn toggle_visibility(&mut self, category: Category, id: &str) -> Result<bool, SceneError> {
        let entity = self.find_mut(category, id)?;
        entity.visible = !entity.visible;
        Ok(entity.visible)
    }

    pub fn set_color(&mut self, category: Category, id: &str, color: Rgb) -> Result<(), SceneError> {
        self.find_mut(category, id)?.color = color;
        Ok(())
    }
}
