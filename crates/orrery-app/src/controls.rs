//! Pointer-driven orbit camera.
//!
//! The camera sits on a sphere around a fixed target. Dragging with the left
//! button turns it around the target, the wheel moves it closer or further.
//! With damping enabled, input feeds a pending delta that is applied a
//! fraction at a time, so motion eases out over several frames.

use glam::Vec3;
use orrery_config::CameraConfig;

use crate::input::MouseState;

/// Keeps the camera just short of the poles, where "up" would flip.
const POLAR_EPSILON: f32 = 1e-4;

/// Remaining motion below this is dropped.
const SETTLE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    radius: f32,
    /// Azimuth around +Y, measured from +Z towards +X.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
    min_distance: f32,
    max_distance: f32,
    damping: f32,
    rotate_speed: f32,
    zoom_speed: f32,
}

impl OrbitControls {
    /// Controls orbiting the origin, starting from `config.position`.
    pub fn new(config: &CameraConfig) -> Self {
        let mut controls = Self {
            target: Vec3::ZERO,
            radius: 1.0,
            theta: 0.0,
            phi: std::f32::consts::FRAC_PI_2,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            min_distance: config.min_distance.max(0.0),
            max_distance: config.max_distance.max(config.min_distance),
            damping: config.damping.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed.clamp(0.0, 0.99),
        };
        controls.set_position(Vec3::from(config.position));
        controls
    }

    /// Place the camera at `position`, keeping the current target.
    pub fn set_position(&mut self, position: Vec3) {
        let offset = position - self.target;
        let radius = offset.length();
        if radius > f32::EPSILON {
            self.theta = offset.x.atan2(offset.z);
            self.phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        }
        self.radius = radius.clamp(self.min_distance, self.max_distance);
        self.phi = self.clamp_phi(self.phi);
    }

    /// Turn around the target. Positive angles move the camera to the left.
    pub fn rotate_left(&mut self, angle: f32) {
        self.pending_theta -= angle;
    }

    /// Tilt over the target. Positive angles move the camera up.
    pub fn rotate_up(&mut self, angle: f32) {
        self.pending_phi -= angle;
    }

    /// Move towards the target by `lines` wheel steps (negative moves away).
    pub fn zoom(&mut self, lines: f32) {
        self.pending_scale *= (1.0 - self.zoom_speed).powf(lines);
    }

    /// Fold this frame's pointer input into the pending motion.
    pub fn handle_mouse(&mut self, mouse: &MouseState) {
        if mouse.is_left_pressed() {
            let delta = mouse.delta();
            self.rotate_left(delta.x * self.rotate_speed);
            self.rotate_up(delta.y * self.rotate_speed);
        }
        if mouse.scroll() != 0.0 {
            self.zoom(mouse.scroll());
        }
    }

    /// Apply pending motion for one frame. Returns true when the camera moved.
    pub fn update(&mut self) -> bool {
        let (old_theta, old_phi, old_radius) = (self.theta, self.phi, self.radius);

        let step = if self.damping > 0.0 { self.damping } else { 1.0 };
        self.theta += self.pending_theta * step;
        self.phi = self.clamp_phi(self.phi + self.pending_phi * step);

        let scale = self.pending_scale.powf(step);
        self.radius = (self.radius * scale).clamp(self.min_distance, self.max_distance);

        if self.damping > 0.0 {
            self.pending_theta *= 1.0 - self.damping;
            self.pending_phi *= 1.0 - self.damping;
            self.pending_scale = self.pending_scale.powf(1.0 - self.damping);
        } else {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
            self.pending_scale = 1.0;
        }
        if self.pending_theta.abs() < SETTLE_EPSILON {
            self.pending_theta = 0.0;
        }
        if self.pending_phi.abs() < SETTLE_EPSILON {
            self.pending_phi = 0.0;
        }
        if (self.pending_scale - 1.0).abs() < SETTLE_EPSILON {
            self.pending_scale = 1.0;
        }

        self.theta != old_theta || self.phi != old_phi || self.radius != old_radius
    }

    /// Current camera position.
    pub fn position(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.target
            + Vec3::new(
                self.radius * sin_phi * sin_theta,
                self.radius * cos_phi,
                self.radius * sin_phi * cos_theta,
            )
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    /// Whether motion is still easing out.
    pub fn is_settling(&self) -> bool {
        self.pending_theta != 0.0 || self.pending_phi != 0.0 || self.pending_scale != 1.0
    }

    fn clamp_phi(&self, phi: f32) -> f32 {
        phi.clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON)
    }
}
