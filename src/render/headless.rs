//! In-process scene graph with a small software rasterizer.
//!
//! Stands in for a GPU renderer: it owns node records, hands out resource ids
//! for geometry and materials, counts every release, and draws flat-shaded
//! screen-space boxes so captures have real pixels.

use super::{BoxSpec, CameraState, Environment, NodeAppearance, NodeHandle, NodeTag, SceneGraph};
use crate::scene::{Placement, Rgb};
use crate::ui::LightingMode;
use glam::{EulerRot, Quat, Vec3, Vec4};
use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Keep the drawn frame readable after presentation. Captures are blank without it.
    pub preserve_drawing_buffer: bool,
    pub clear_color: Rgb,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            preserve_drawing_buffer: true,
            clear_color: Rgb::new(0x11, 0x18, 0x27),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub spawned: usize,
    pub despawned: usize,
    pub geometries_released: usize,
    pub materials_released: usize,
    pub appearance_writes: usize,
}

impl SceneStats {
    /// Structural and appearance writes since creation.
    pub fn mutations(&self) -> usize {
        self.spawned + self.despawned + self.appearance_writes
    }
}

#[derive(Debug, Clone, Copy)]
struct GpuResources {
    geometry: u64,
    material: u64,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    tag: NodeTag,
    placement: Option<Placement>,
    appearance: NodeAppearance,
    resources: Option<GpuResources>,
}

pub struct HeadlessScene {
    config: RenderConfig,
    nodes: BTreeMap<NodeHandle, NodeRecord>,
    next_handle: u64,
    next_resource: u64,
    stats: SceneStats,
    released: Vec<(NodeHandle, u64)>,
    environment: Environment,
    frame: RgbaImage,
}

const GRID_HALF_EXTENT: i32 = 10;
const GRID_COLOR: Rgba<u8> = Rgba([0x44, 0x44, 0x44, 0xff]);

impl HeadlessScene {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            nodes: BTreeMap::new(),
            next_handle: 1,
            next_resource: 1,
            stats: SceneStats::default(),
            released: Vec::new(),
            environment: Environment {
                show_grid: true,
                lighting: LightingMode::Default.intensity(),
            },
            frame: RgbaImage::new(config.width, config.height),
        }
    }

    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// How many times the geometry of `node` was released.
    pub fn release_count(&self, node: NodeHandle) -> usize {
        self.released.iter().filter(|(handle, _)| *handle == node).count()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    fn allocate_resource(&mut self) -> u64 {
        let id = self.next_resource;
        self.next_resource += 1;
        id
    }

    fn insert(&mut self, record: NodeRecord) -> NodeHandle {
        let handle = NodeHandle::new(self.next_handle);
        self.next_handle += 1;
        self.nodes.insert(handle, record);
        handle
    }

    fn shade(&self, appearance: &NodeAppearance) -> Rgba<u8> {
        let light = (self.environment.lighting.ambient + self.environment.lighting.directional * 0.3).min(1.0);
        let base = appearance.color.to_f32();
        let tint = appearance.tint.color.to_f32();
        let channel = |i: usize| {
            let value = base[i] * light + tint[i] * appearance.tint.intensity;
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        };
        Rgba([channel(0), channel(1), channel(2), 0xff])
    }

    fn project(&self, view_projection: &glam::Mat4, point: Vec3) -> Option<(f32, f32)> {
        let clip = *view_projection * Vec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= 1e-4 {
            return None;
        }
        let ndc = clip / clip.w;
        let x = (ndc.x * 0.5 + 0.5) * self.config.width as f32;
        let y = (1.0 - (ndc.y * 0.5 + 0.5)) * self.config.height as f32;
        Some((x, y))
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba<u8>) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let limit = 4 * (self.config.width + self.config.height) as usize;
        let steps = (dx.abs().max(dy.abs()).ceil() as usize).clamp(1, limit);
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            self.put_pixel(from.0 + dx * t, from.1 + dy * t, color);
        }
    }

    fn put_pixel(&mut self, x: f32, y: f32, color: Rgba<u8>) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x < self.frame.width() && y < self.frame.height() {
            self.frame.put_pixel(x, y, color);
        }
    }

    fn draw_grid(&mut self, view_projection: &glam::Mat4) {
        let extent = GRID_HALF_EXTENT as f32;
        for i in -GRID_HALF_EXTENT..=GRID_HALF_EXTENT {
            let offset = i as f32;
            let lines = [
                (Vec3::new(offset, 0.0, -extent), Vec3::new(offset, 0.0, extent)),
                (Vec3::new(-extent, 0.0, offset), Vec3::new(extent, 0.0, offset)),
            ];
            for (a, b) in lines {
                if let (Some(pa), Some(pb)) = (self.project(view_projection, a), self.project(view_projection, b)) {
                    self.draw_line(pa, pb, GRID_COLOR);
                }
            }
        }
    }

    /// Screen-space bounding rectangle of a placed box.
    fn box_rect(&self, view_projection: &glam::Mat4, placement: &Placement) -> Option<(f32, f32, f32, f32)> {
        let [rx, ry, rz] = placement.rotation;
        let rotation = Quat::from_euler(EulerRot::XYZ, rx, ry, rz);
        let center = Vec3::from_array(placement.position);
        let half = Vec3::from_array(placement.scale) * 0.5;
        let mut rect: Option<(f32, f32, f32, f32)> = None;
        for corner in 0..8u8 {
            let sign = Vec3::new(
                if corner & 1 == 0 { -1.0 } else { 1.0 },
                if corner & 2 == 0 { -1.0 } else { 1.0 },
                if corner & 4 == 0 { -1.0 } else { 1.0 },
            );
            let (x, y) = self.project(view_projection, center + rotation * (half * sign))?;
            rect = Some(match rect {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        rect
    }
}

impl SceneGraph for HeadlessScene {
    fn spawn_box(&mut self, spec: &BoxSpec) -> NodeHandle {
        let resources = GpuResources {
            geometry: self.allocate_resource(),
            material: self.allocate_resource(),
        };
        self.stats.spawned += 1;
        self.insert(NodeRecord {
            tag: spec.tag.clone(),
            placement: Some(spec.placement),
            appearance: NodeAppearance {
                color: spec.color,
                ..NodeAppearance::default()
            },
            resources: Some(resources),
        })
    }

    fn insert_asset_node(&mut self, tag: NodeTag, appearance: NodeAppearance) -> NodeHandle {
        self.insert(NodeRecord {
            tag,
            placement: None,
            appearance,
            resources: None,
        })
    }

    fn despawn(&mut self, node: NodeHandle) -> bool {
        let Some(record) = self.nodes.remove(&node) else {
            return false;
        };
        self.stats.despawned += 1;
        if let Some(resources) = record.resources {
            self.stats.geometries_released += 1;
            self.stats.materials_released += 1;
            self.released.push((node, resources.geometry));
            log::debug!(
                "Released geometry {} and material {} of {:?}",
                resources.geometry,
                resources.material,
                node
            );
        }
        true
    }

    fn tag(&self, node: NodeHandle) -> Option<&NodeTag> {
        self.nodes.get(&node).map(|record| &record.tag)
    }

    fn nodes(&self) -> Vec<(NodeHandle, NodeTag)> {
        self.nodes
            .iter()
            .map(|(handle, record)| (*handle, record.tag.clone()))
            .collect()
    }

    fn appearance(&self, node: NodeHandle) -> Option<NodeAppearance> {
        self.nodes.get(&node).map(|record| record.appearance)
    }

    fn set_appearance(&mut self, node: NodeHandle, appearance: NodeAppearance) {
        if let Some(record) = self.nodes.get_mut(&node) {
            record.appearance = appearance;
            self.stats.appearance_writes += 1;
        }
    }

    fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
    }

    fn draw(&mut self, camera: &CameraState) {
        let [r, g, b] = self.config.clear_color.0;
        self.frame = RgbaImage::from_pixel(self.config.width, self.config.height, Rgba([r, g, b, 0xff]));
        let aspect = self.config.width as f32 / self.config.height.max(1) as f32;
        let view_projection = camera.view_projection(aspect);

        if self.environment.show_grid {
            self.draw_grid(&view_projection);
        }

        let boxes: Vec<(Placement, NodeAppearance)> = self
            .nodes
            .values()
            .filter(|record| record.appearance.visible)
            .filter_map(|record| record.placement.map(|placement| (placement, record.appearance)))
            .collect();
        for (placement, appearance) in boxes {
            let Some((x0, y0, x1, y1)) = self.box_rect(&view_projection, &placement) else {
                continue;
            };
            let color = self.shade(&appearance);
            if appearance.wireframe {
                self.draw_line((x0, y0), (x1, y0), color);
                self.draw_line((x1, y0), (x1, y1), color);
                self.draw_line((x1, y1), (x0, y1), color);
                self.draw_line((x0, y1), (x0, y0), color);
                continue;
            }
            let (w, h) = (self.frame.width() as f32, self.frame.height() as f32);
            let (xs, xe) = (x0.max(0.0) as u32, x1.min(w).max(0.0) as u32);
            let (ys, ye) = (y0.max(0.0) as u32, y1.min(h).max(0.0) as u32);
            for y in ys..ye {
                for x in xs..xe {
                    self.frame.put_pixel(x, y, color);
                }
            }
        }
    }

    fn read_frame(&self) -> RgbaImage {
        if self.config.preserve_drawing_buffer {
            self.frame.clone()
        } else {
            RgbaImage::new(self.config.width, self.config.height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::capture::is_blank;
    use crate::scene::{Category, EntityId};

    fn wall_spec(id: &str, color: Rgb) -> BoxSpec {
        BoxSpec {
            tag: NodeTag::new(Category::Wall, EntityId::new(id)),
            placement: Placement {
                position: [0.0, 1.5, 0.0],
                scale: [2.0, 3.0, 0.2],
                rotation: [0.0, 0.0, 0.0],
            },
            color,
        }
    }

    fn small_config(preserve: bool) -> RenderConfig {
        RenderConfig {
            width: 64,
            height: 48,
            preserve_drawing_buffer: preserve,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn despawn_releases_resources_once() {
        let mut scene = HeadlessScene::new(small_config(true));
        let node = scene.spawn_box(&wall_spec("wall_0", Rgb::BLACK));
        assert!(scene.despawn(node));
        assert!(!scene.despawn(node));
        assert_eq!(scene.release_count(node), 1);
        assert_eq!(scene.stats().geometries_released, 1);
        assert_eq!(scene.stats().materials_released, 1);
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn asset_nodes_own_no_resources() {
        let mut scene = HeadlessScene::new(small_config(true));
        let node = scene.insert_asset_node(NodeTag::from_name("door_0"), NodeAppearance::default());
        assert!(scene.despawn(node));
        assert_eq!(scene.stats().geometries_released, 0);
    }

    #[test]
    fn drawn_box_shows_up_in_frame() {
        let mut scene = HeadlessScene::new(small_config(true));
        scene.spawn_box(&wall_spec("wall_0", Rgb::new(0xff, 0, 0)));
        let mut camera = CameraState::default();
        camera.look_at(Vec3::new(0.0, 1.5, 10.0), Vec3::new(0.0, 1.5, 0.0));
        scene.draw(&camera);
        let frame = scene.read_frame();
        let center = frame.get_pixel(32, 24);
        assert!(center.0[0] > center.0[1], "center pixel {center:?} is not red-dominant");
    }

    #[test]
    fn hidden_nodes_are_not_drawn() {
        let mut scene = HeadlessScene::new(small_config(true));
        let node = scene.spawn_box(&wall_spec("wall_0", Rgb::new(0xff, 0, 0)));
        scene.set_appearance(node, NodeAppearance { visible: false, ..NodeAppearance::default() });
        let mut camera = CameraState::default();
        camera.look_at(Vec3::new(0.0, 1.5, 10.0), Vec3::new(0.0, 1.5, 0.0));
        scene.draw(&camera);
        let [r, g, b] = RenderConfig::default().clear_color.0;
        assert_eq!(scene.read_frame().get_pixel(32, 24), &Rgba([r, g, b, 0xff]));
    }

    #[test]
    fn frame_is_blank_without_preserved_buffer() {
        let mut scene = HeadlessScene::new(small_config(false));
        scene.spawn_box(&wall_spec("wall_0", Rgb::new(0xff, 0, 0)));
        scene.draw(&CameraState::default());
        assert!(is_blank(&scene.read_frame()));
    }
}
