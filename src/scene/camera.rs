//! Orbital camera that frames scene content.

use glam::{Quat, Vec3};

/// Eye, target and field of view of the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye position in world space.
    pub eye: Vec3,
    /// Look-at target.
    pub target: Vec3,
    /// Up direction.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
}

/// Camera orbiting a focus point: fit, zoom and a turntable spin.
#[derive(Debug, Clone)]
pub struct CameraController {
    orientation: Quat,
    distance: f32,
    focus_point: Vec3,

    /// Current camera.
    pub camera: Camera,

    fit_padding: f32,
    /// Turntable spin, radians per second.
    spin_speed: f32,
    spinning: bool,
}

impl CameraController {
    /// Controller looking down -Z at the origin.
    #[must_use]
    pub fn new(fovy: f32, fit_padding: f32) -> Self {
        let focus_point = Vec3::ZERO;
        let distance = 150.0;
        let camera = Camera {
            eye: focus_point + Vec3::new(0.0, 0.0, distance),
            target: focus_point,
            up: Vec3::Y,
            fovy,
        };
        Self {
            orientation: Quat::IDENTITY,
            distance,
            focus_point,
            camera,
            fit_padding,
            spin_speed: 0.5,
            spinning: false,
        }
    }

    fn place_eye(&mut self) {
        let back = self.orientation * Vec3::Z;
        self.camera.eye = self.focus_point + back * self.distance;
        self.camera.target = self.focus_point;
        self.camera.up = self.orientation * Vec3::Y;
    }

    /// Multiply the view distance by `1 / factor` (factor > 1 zooms in).
    pub fn zoom_by(&mut self, factor: f32) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        self.distance = (self.distance / factor).clamp(1.0, 1000.0);
        self.place_eye();
    }

    /// Center on the positions' centroid at a distance that keeps their
    /// bounding sphere in view. Empty input leaves the camera unchanged.
    pub fn fit_to_positions(&mut self, positions: &[Vec3]) {
        if positions.is_empty() {
            return;
        }

        let centroid: Vec3 =
            positions.iter().copied().sum::<Vec3>() / positions.len() as f32;
        let radius = positions
            .iter()
            .map(|p| (*p - centroid).length())
            .fold(0.0f32, f32::max);

        self.focus_point = centroid;

        let fovy_rad = self.camera.fovy.to_radians();
        let fit_distance = radius / (fovy_rad / 2.0).tan();
        self.distance = (fit_distance * self.fit_padding).max(1.0);

        self.place_eye();
    }

    /// Enable or disable turntable spin.
    pub fn set_spin(&mut self, spinning: bool) {
        self.spinning = spinning;
    }

    /// Whether the turntable is spinning.
    #[must_use]
    pub fn is_spinning(&self) -> bool {
        self.spinning
    }

    /// Advance the turntable by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if !self.spinning {
            return;
        }
        let spin = Quat::from_axis_angle(Vec3::Y, self.spin_speed * dt);
        self.orientation = spin * self.orientation;
        self.place_eye();
    }

    /// Orbit center.
    #[must_use]
    pub fn focus_point(&self) -> Vec3 {
        self.focus_point
    }

    /// Eye-to-focus distance.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.distance
    }
}
