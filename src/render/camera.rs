use glam::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Named camera positions. Every preset looks at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPreset {
    Default,
    Top,
    Front,
    Side,
}

impl CameraPreset {
    pub fn position(self) -> Vec3 {
        match self {
            Self::Default => Vec3::new(15.0, 15.0, 15.0),
            Self::Top => Vec3::new(0.0, 25.0, 0.0),
            Self::Front => Vec3::new(0.0, 5.0, 25.0),
            Self::Side => Vec3::new(25.0, 5.0, 0.0),
        }
    }

    pub fn target(self) -> Vec3 {
        Vec3::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y_deg: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: CameraPreset::Default.position(),
            target: CameraPreset::Default.target(),
            fov_y_deg: 60.0,
        }
    }
}

impl CameraState {
    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// World up, except when looking straight along it.
    pub fn up(&self) -> Vec3 {
        if self.forward().cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::NEG_Z
        } else {
            Vec3::Y
        }
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let projection = Mat4::perspective_rh(self.fov_y_deg.to_radians(), aspect.max(1e-3), 0.1, 1000.0);
        let view = Mat4::look_at_rh(self.position, self.target, self.up());
        projection * view
    }
}

/// Orbit-style interactive control around a target point.
///
/// Keeps its own spherical coordinates; after the camera is moved from
/// outside, [`OrbitControls::update`] must be called so the next drag starts
/// from the new position instead of the stale one.
#[derive(Debug, Clone, Copy)]
pub struct OrbitControls {
    target: Vec3,
    distance: f32,
    yaw: f32,
    pitch: f32,
    saved_position: Vec3,
    saved_target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Largest angle from straight up; `PI / 2` keeps the camera above ground.
    pub max_polar_angle: f32,
}

const POLE_EPSILON: f32 = 1e-4;

impl OrbitControls {
    /// Attaches to the camera and remembers its pose for [`OrbitControls::reset`].
    pub fn new(camera: &CameraState) -> Self {
        let mut controls = Self {
            target: camera.target,
            distance: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            saved_position: camera.position,
            saved_target: camera.target,
            min_distance: 5.0,
            max_distance: 100.0,
            max_polar_angle: FRAC_PI_2,
        };
        controls.update(camera);
        controls
    }

    /// Re-reads the camera pose.
    pub fn update(&mut self, camera: &CameraState) {
        self.target = camera.target;
        let offset = camera.position - camera.target;
        self.distance = offset.length();
        let (yaw, pitch) = offset_to_yaw_pitch(offset);
        self.yaw = yaw;
        self.pitch = pitch;
    }

    /// Restores the pose saved at attach time.
    pub fn reset(&mut self, camera: &mut CameraState) {
        camera.look_at(self.saved_position, self.saved_target);
        self.update(camera);
    }

    pub fn rotate(&mut self, camera: &mut CameraState, yaw_delta: f32, pitch_delta: f32) {
        let min_pitch = FRAC_PI_2 - self.max_polar_angle;
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(min_pitch, FRAC_PI_2 - POLE_EPSILON);
        self.apply(camera);
    }

    /// Scales the orbit distance; `factor < 1` moves closer.
    pub fn zoom(&mut self, camera: &mut CameraState, factor: f32) {
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
        self.apply(camera);
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    fn apply(&self, camera: &mut CameraState) {
        let cos_pitch = self.pitch.cos();
        let dir = Vec3::new(
            self.yaw.cos() * cos_pitch,
            self.pitch.sin(),
            self.yaw.sin() * cos_pitch,
        );
        camera.look_at(self.target + dir * self.distance, self.target);
    }
}

fn offset_to_yaw_pitch(offset: Vec3) -> (f32, f32) {
    let dir = offset.normalize_or_zero();
    if dir == Vec3::ZERO {
        return (0.0, 0.0);
    }
    let yaw = dir.z.atan2(dir.x);
    let pitch = dir.y.clamp(-1.0, 1.0).asin();
    (yaw, pitch)
}

/// Camera plus its optional interactive control, driven by preset commands.
#[derive(Debug, Clone, Default)]
pub struct CameraRig {
    camera: CameraState,
    controls: Option<OrbitControls>,
}

impl CameraRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orbit_controls(mut self) -> Self {
        self.controls = Some(OrbitControls::new(&self.camera));
        self
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }

    /// Drag input from the presentation layer.
    pub fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32) {
        if let Some(controls) = &mut self.controls {
            controls.rotate(&mut self.camera, yaw_delta, pitch_delta);
        }
    }

    pub fn zoom(&mut self, factor: f32) {
        if let Some(controls) = &mut self.controls {
            controls.zoom(&mut self.camera, factor);
        }
    }

    pub fn apply_preset(&mut self, preset: CameraPreset) {
        self.camera.look_at(preset.position(), preset.target());
        if let Some(controls) = &mut self.controls {
            match preset {
                CameraPreset::Default => controls.reset(&mut self.camera),
                _ => controls.update(&self.camera),
            }
        }
        log::debug!(
            "Camera preset {:?}: eye {:?} target {:?}",
            preset,
            self.camera.position,
            self.camera.target
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_eq(actual: Vec3, expected: Vec3) {
        assert_relative_eq!(actual.x, expected.x, epsilon = 1e-4);
        assert_relative_eq!(actual.y, expected.y, epsilon = 1e-4);
        assert_relative_eq!(actual.z, expected.z, epsilon = 1e-4);
    }

    #[test]
    fn reset_after_top_view_returns_to_default_pose() {
        let mut rig = CameraRig::new().with_orbit_controls();
        rig.apply_preset(CameraPreset::Top);
        assert_vec_eq(rig.camera().position, Vec3::new(0.0, 25.0, 0.0));
        rig.apply_preset(CameraPreset::Default);
        assert_vec_eq(rig.camera().position, Vec3::new(15.0, 15.0, 15.0));
        assert_vec_eq(rig.camera().target, Vec3::ZERO);
    }

    #[test]
    fn reset_without_controls_uses_default_position() {
        let mut rig = CameraRig::new();
        rig.apply_preset(CameraPreset::Side);
        rig.apply_preset(CameraPreset::Default);
        assert_vec_eq(rig.camera().position, CameraPreset::Default.position());
    }

    #[test]
    fn drag_after_preset_continues_from_preset() {
        let mut rig = CameraRig::new().with_orbit_controls();
        rig.apply_preset(CameraPreset::Front);
        let before = rig.camera().position;
        rig.orbit(0.01, 0.0);
        let after = rig.camera().position;
        assert!((after - before).length() < 1.0, "camera snapped from {before:?} to {after:?}");
        assert_relative_eq!(after.length(), before.length(), epsilon = 1e-3);
    }

    #[test]
    fn controls_keep_camera_above_ground() {
        let mut rig = CameraRig::new().with_orbit_controls();
        rig.apply_preset(CameraPreset::Side);
        rig.orbit(0.0, -3.0);
        assert!(rig.camera().position.y >= -1e-4);
        rig.orbit(0.0, 6.0);
        assert!(rig.camera().position.y.is_finite());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut rig = CameraRig::new().with_orbit_controls();
        rig.zoom(0.01);
        assert_relative_eq!(rig.controls().unwrap().distance(), 5.0, epsilon = 1e-4);
        rig.zoom(1000.0);
        assert_relative_eq!(rig.controls().unwrap().distance(), 100.0, epsilon = 1e-4);
    }

    #[test]
    fn top_view_projection_is_finite() {
        let mut camera = CameraState::default();
        camera.look_at(CameraPreset::Top.position(), Vec3::ZERO);
        assert_eq!(camera.up(), Vec3::NEG_Z);
        let vp = camera.view_projection(16.0 / 9.0);
        assert!(vp.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
