//! The seam between the orbit model and whatever presents it.

use glam::DVec3;

use crate::body::BodyId;

/// Receives per-body world positions once per frame.
///
/// The model never draws anything itself; a scene graph or renderer
/// implements this and decides how to present the positions.
pub trait SceneSink {
    /// Set the world-space position of one body.
    fn set_world_position(&mut self, id: BodyId, position: DVec3);
}

/// Plain position table indexed by [`BodyId`]. Grows on demand.
impl SceneSink for Vec<DVec3> {
    fn set_world_position(&mut self, id: BodyId, position: DVec3) {
        let index = id.index();
        if index >= self.len() {
            self.resize(index + 1, DVec3::ZERO);
        }
        self[index] = position;
    }
}
