//! Editor settings driven by the surrounding panels.

use crate::scene::{Category, Rgb};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightingMode {
    #[default]
    Default,
    Bright,
    Soft,
    Dramatic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingIntensity {
    pub ambient: f32,
    pub directional: f32,
}

impl LightingMode {
    pub fn intensity(self) -> LightingIntensity {
        let (ambient, directional) = match self {
            Self::Default => (0.4, 1.5),
            Self::Bright => (0.8, 2.0),
            Self::Soft => (0.6, 1.0),
            Self::Dramatic => (0.2, 3.0),
        };
        LightingIntensity {
            ambient,
            directional,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorSettings {
    pub walls_visible: bool,
    pub doors_visible: bool,
    pub windows_visible: bool,
    pub rooms_visible: bool,
    pub show_wireframe: bool,
    pub show_grid: bool,
    pub lighting: LightingMode,
    /// Color given to newly added walls.
    pub paint_color: Rgb,
    pub edit_mode: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            walls_visible: true,
            doors_visible: true,
            windows_visible: true,
            rooms_visible: true,
            show_wireframe: false,
            show_grid: true,
            lighting: LightingMode::Default,
            paint_color: Category::Wall.default_color(),
            edit_mode: false,
        }
    }
}

impl EditorSettings {
    pub fn category_visible(&self, category: Category) -> bool {
        match category {
            Category::Wall => self.walls_visible,
            Category::Door => self.doors_visible,
            Category::Window => self.windows_visible,
            Category::Room => self.rooms_visible,
        }
    }

    fn category_flag_mut(&mut self, category: Category) -> &mut bool {
        match category {
            Category::Wall => &mut self.walls_visible,
            Category::Door => &mut self.doors_visible,
            Category::Window => &mut self.windows_visible,
            Category::Room => &mut self.rooms_visible,
        }
    }

    pub fn set_category_visible(&mut self, category: Category, visible: bool) {
        *self.category_flag_mut(category) = visible;
    }

    /// Flips one category flag and returns the new value. Entity flags are untouched.
    pub fn toggle_category(&mut self, category: Category) -> bool {
        let flag = self.category_flag_mut(category);
        *flag = !*flag;
        *flag
    }
}
