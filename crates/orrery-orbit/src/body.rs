//! Celestial body records stored in the orbit arena.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Handle to a body inside an [`OrbitModel`](crate::OrbitModel) arena.
///
/// Indices are assigned in topological order: a parent always has a lower
/// index than any of its children, and the root is always `BodyId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    /// The root body (the star).
    pub const ROOT: BodyId = BodyId(0);

    /// Arena index of this body.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a body is, derived from its depth in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Star,
    Planet,
    Moon,
}

impl BodyKind {
    /// Kind of a body at the given tree depth (root = 0).
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => BodyKind::Star,
            1 => BodyKind::Planet,
            _ => BodyKind::Moon,
        }
    }
}

/// Surface shading model the renderer should use for a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Material {
    /// Texture colour only, unaffected by lights.
    #[default]
    Basic,
    /// Lit by the star and ambient light.
    Standard,
}

/// One simulated body: static configuration plus the rotation accumulator.
#[derive(Clone, Debug)]
pub struct CelestialBody {
    /// Name, unique among siblings.
    pub name: String,
    pub kind: BodyKind,
    /// Uniform scale applied to the unit sphere.
    pub radius: f64,
    /// Distance from the parent's centre.
    pub orbit_distance: f64,
    /// Radians added to `rotation_angle` on each tick.
    pub angular_speed: f64,
    /// Texture file name, resolved by the renderer.
    pub texture: Option<String>,
    pub material: Material,
    /// Reserved. Carried from configuration but never interpreted.
    pub color: Option<u32>,
    pub(crate) parent: Option<BodyId>,
    pub(crate) children: Vec<BodyId>,
    pub(crate) rotation_angle: f64,
    pub(crate) local_offset: DVec3,
    pub(crate) world_position: DVec3,
}

impl CelestialBody {
    /// The body this one orbits, or `None` for the root.
    pub fn parent(&self) -> Option<BodyId> {
        self.parent
    }

    /// Bodies orbiting this one, in configuration order.
    pub fn children(&self) -> &[BodyId] {
        &self.children
    }

    /// Accumulated orbit angle in radians. Never wrapped.
    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    /// Offset from the parent's centre as of the last tick.
    pub fn local_offset(&self) -> DVec3 {
        self.local_offset
    }

    /// Position in the root coordinate space as of the last tick.
    pub fn world_position(&self) -> DVec3 {
        self.world_position
    }

    /// Offset for a given angle: the orbit lies in the X/Z plane.
    pub fn offset_at(&self, angle: f64) -> DVec3 {
        let (sin, cos) = angle.sin_cos();
        DVec3::new(sin * self.orbit_distance, 0.0, cos * self.orbit_distance)
    }
}
