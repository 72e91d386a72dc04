//! Retained scene graph fed by the orbit model.

use glam::{DVec3, Mat4, Vec3};
use orrery_orbit::{BodyId, BodyKind, Material, OrbitModel, SceneSink};
use orrery_render::BodyDraw;
use tracing::{info, warn};

/// One drawable body.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub kind: BodyKind,
    /// Uniform scale applied to the unit sphere.
    pub scale: f64,
    pub position: DVec3,
    pub material: Material,
    pub texture: Option<String>,
}

impl SceneNode {
    /// Translation × uniform scale. Orbit motion never rotates a node.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position.as_vec3())
            * Mat4::from_scale(Vec3::splat(self.scale as f32))
    }
}

/// Scene nodes indexed like the model's [`BodyId`]s.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// One node per body, placed at the model's current positions.
    pub fn from_model(model: &OrbitModel) -> Self {
        let nodes = model
            .bodies()
            .map(|(_, body)| SceneNode {
                name: body.name.clone(),
                kind: body.kind,
                scale: body.radius,
                position: body.world_position(),
                material: body.material,
                texture: body.texture.clone(),
            })
            .collect();
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: BodyId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn model_matrices(&self) -> Vec<Mat4> {
        self.nodes.iter().map(SceneNode::model_matrix).collect()
    }

    /// Static per-body data the renderer needs when building bind groups.
    pub fn draw_list(&self) -> Vec<BodyDraw<'_>> {
        self.nodes
            .iter()
            .map(|node| BodyDraw {
                name: &node.name,
                texture: node.texture.as_deref(),
                material: node.material,
            })
            .collect()
    }

    /// Position of the star, which is where the scene's light sits.
    pub fn light_position(&self) -> Vec3 {
        self.nodes
            .first()
            .map(|node| node.position.as_vec3())
            .unwrap_or(Vec3::ZERO)
    }

    pub fn log_positions(&self, frame: u64) {
        for node in &self.nodes {
            info!(
                frame,
                body = %node.name,
                x = node.position.x,
                y = node.position.y,
                z = node.position.z,
                "body position"
            );
        }
    }
}

impl SceneSink for SceneGraph {
    fn set_world_position(&mut self, id: BodyId, position: DVec3) {
        match self.nodes.get_mut(id.index()) {
            Some(node) => node.position = position,
            None => warn!(body = id.0, "position for unknown scene node"),
        }
    }
}

/// Whether positions should be logged on `frame` for a given interval (0 = never).
pub fn should_log_positions(frame: u64, interval: u64) -> bool {
    interval > 0 && frame % interval == 0
}
