//! Hierarchical orbit animation over an arena of bodies.
//!
//! Each tick advances every body's rotation accumulator by its angular speed
//! and re-derives its position from its parent's position of the same tick.
//! Bodies are stored so that every parent precedes its children, which makes
//! a single forward pass over the arena a valid evaluation order.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::DVec3;
use serde::Serialize;
use tracing::{debug, info};

use crate::body::{BodyId, BodyKind, CelestialBody, Material};
use crate::error::OrbitError;
use crate::sink::SceneSink;
use crate::system::{BodyDef, BodyRecord, SystemDef};

/// Serializable view of one body after the latest tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BodySnapshot {
    pub name: String,
    pub kind: BodyKind,
    pub rotation_angle: f64,
    pub local_offset: [f64; 3],
    pub world_position: [f64; 3],
}

/// Owns the body tree and its per-body rotation state.
#[derive(Clone, Debug)]
pub struct OrbitModel {
    bodies: Vec<CelestialBody>,
    tick_count: u64,
}

/// Fields shared by nested definitions and flat records.
struct BodySpec<'a> {
    name: &'a str,
    radius: f64,
    distance: f64,
    speed: f64,
    texture: Option<&'a String>,
    material: Material,
    color: Option<u32>,
}

impl<'a> From<&'a BodyDef> for BodySpec<'a> {
    fn from(def: &'a BodyDef) -> Self {
        Self {
            name: &def.name,
            radius: def.radius,
            distance: def.distance,
            speed: def.speed,
            texture: def.texture.as_ref(),
            material: def.material,
            color: def.color,
        }
    }
}

impl<'a> From<&'a BodyRecord> for BodySpec<'a> {
    fn from(record: &'a BodyRecord) -> Self {
        Self {
            name: &record.name,
            radius: record.radius,
            distance: record.distance,
            speed: record.speed,
            texture: record.texture.as_ref(),
            material: record.material,
            color: record.color,
        }
    }
}

fn validate(spec: &BodySpec, is_root: bool) -> Result<(), OrbitError> {
    if !(spec.radius.is_finite() && spec.radius > 0.0) {
        return Err(OrbitError::InvalidRadius {
            body: spec.name.to_string(),
            radius: spec.radius,
        });
    }
    if !is_root && !(spec.distance.is_finite() && spec.distance >= 0.0) {
        return Err(OrbitError::InvalidDistance {
            body: spec.name.to_string(),
            distance: spec.distance,
        });
    }
    if !is_root && !spec.speed.is_finite() {
        return Err(OrbitError::InvalidSpeed {
            body: spec.name.to_string(),
            speed: spec.speed,
        });
    }
    Ok(())
}

impl OrbitModel {
    /// Build the arena from a nested system table.
    ///
    /// Moon names only need to be unique among their siblings.
    pub fn from_system(system: &SystemDef) -> Result<Self, OrbitError> {
        let star = &system.star;
        let root = BodySpec {
            name: &star.name,
            radius: star.radius,
            distance: 0.0,
            speed: 0.0,
            texture: star.texture.as_ref(),
            material: star.material,
            color: None,
        };

        let mut model = Self::with_root(&root)?;

        // Breadth-first so every parent is pushed before its children.
        let mut queue: VecDeque<(BodyId, &[BodyDef])> = VecDeque::new();
        queue.push_back((BodyId::ROOT, system.planets.as_slice()));
        while let Some((parent, defs)) = queue.pop_front() {
            let mut seen = HashSet::new();
            for def in defs {
                if !seen.insert(def.name.as_str()) {
                    return Err(OrbitError::DuplicateName {
                        name: def.name.clone(),
                    });
                }
                let id = model.attach(parent, &BodySpec::from(def))?;
                queue.push_back((id, def.moons.as_slice()));
            }
        }

        model.log_built();
        Ok(model)
    }

    /// Build the arena from flat records that reference parents by name.
    ///
    /// Rejects a missing or repeated root, unknown parents, duplicate names
    /// and parent cycles.
    ///
    /// Parents are looked up by name, so a name may appear only once in the
    /// whole list, not merely once per parent. A repeat anywhere fails with
    /// [`OrbitError::DuplicateName`].
    pub fn from_records(records: &[BodyRecord]) -> Result<Self, OrbitError> {
        let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if by_name.insert(record.name.as_str(), index).is_some() {
                return Err(OrbitError::DuplicateName {
                    name: record.name.clone(),
                });
            }
        }

        let mut root = None;
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
        for (index, record) in records.iter().enumerate() {
            match &record.parent {
                None => {
                    if let Some(first) = root {
                        let first: &BodyRecord = &records[first];
                        return Err(OrbitError::MultipleRoots {
                            first: first.name.clone(),
                            second: record.name.clone(),
                        });
                    }
                    root = Some(index);
                }
                Some(parent) => {
                    let Some(&parent_index) = by_name.get(parent.as_str()) else {
                        return Err(OrbitError::UnknownParent {
                            body: record.name.clone(),
                            parent: parent.clone(),
                        });
                    };
                    children[parent_index].push(index);
                }
            }
        }
        let root = root.ok_or(OrbitError::MissingRoot)?;

        let mut model = Self::with_root(&BodySpec::from(&records[root]))?;
        let mut placed = vec![false; records.len()];
        placed[root] = true;

        let mut queue = VecDeque::from([(BodyId::ROOT, root)]);
        while let Some((parent_id, parent_index)) = queue.pop_front() {
            for &child in &children[parent_index] {
                let id = model.attach(parent_id, &BodySpec::from(&records[child]))?;
                placed[child] = true;
                queue.push_back((id, child));
            }
        }

        // Anything not reached from the root hangs off a parent loop.
        if let Some(index) = placed.iter().position(|placed| !placed) {
            return Err(OrbitError::Cycle {
                body: records[index].name.clone(),
            });
        }

        model.log_built();
        Ok(model)
    }

    fn with_root(spec: &BodySpec) -> Result<Self, OrbitError> {
        validate(spec, true)?;
        let root = CelestialBody {
            name: spec.name.to_string(),
            kind: BodyKind::Star,
            radius: spec.radius,
            orbit_distance: 0.0,
            angular_speed: 0.0,
            texture: spec.texture.cloned(),
            material: spec.material,
            color: spec.color,
            parent: None,
            children: Vec::new(),
            rotation_angle: 0.0,
            local_offset: DVec3::ZERO,
            world_position: DVec3::ZERO,
        };
        Ok(Self {
            bodies: vec![root],
            tick_count: 0,
        })
    }

    /// Append a body under `parent` and place it at angle zero.
    fn attach(&mut self, parent: BodyId, spec: &BodySpec) -> Result<BodyId, OrbitError> {
        validate(spec, false)?;
        let id = BodyId(self.bodies.len() as u32);
        let depth = self.depth(parent) + 1;
        let parent_world = self.bodies[parent.index()].world_position;

        let mut body = CelestialBody {
            name: spec.name.to_string(),
            kind: BodyKind::from_depth(depth),
            radius: spec.radius,
            orbit_distance: spec.distance,
            angular_speed: spec.speed,
            texture: spec.texture.cloned(),
            material: spec.material,
            color: spec.color,
            parent: Some(parent),
            children: Vec::new(),
            rotation_angle: 0.0,
            local_offset: DVec3::ZERO,
            world_position: DVec3::ZERO,
        };
        body.local_offset = body.offset_at(0.0);
        body.world_position = parent_world + body.local_offset;

        self.bodies[parent.index()].children.push(id);
        self.bodies.push(body);
        Ok(id)
    }

    fn depth(&self, mut id: BodyId) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.bodies[id.index()].parent {
            depth += 1;
            id = parent;
        }
        depth
    }

    fn log_built(&self) {
        let root = &self.bodies[0];
        info!(
            star = %root.name,
            bodies = self.bodies.len(),
            "orbit model built"
        );
    }

    /// Advance every orbiting body by one step and re-derive positions.
    ///
    /// The root never moves. Because parents precede children in the arena,
    /// each child reads its parent's position from this same tick.
    pub fn tick(&mut self) {
        for index in 1..self.bodies.len() {
            let parent = match self.bodies[index].parent {
                Some(parent) => parent.index(),
                None => continue,
            };
            let parent_world = self.bodies[parent].world_position;

            let body = &mut self.bodies[index];
            body.rotation_angle += body.angular_speed;
            body.local_offset = body.offset_at(body.rotation_angle);
            body.world_position = parent_world + body.local_offset;
        }
        self.tick_count += 1;
        debug!(tick = self.tick_count, "orbit tick");
    }

    /// Number of completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of bodies, root included.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Always false: a model has at least its root.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn root(&self) -> &CelestialBody {
        &self.bodies[0]
    }

    pub fn body(&self, id: BodyId) -> Option<&CelestialBody> {
        self.bodies.get(id.index())
    }

    /// All bodies in arena order, paired with their handles.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &CelestialBody)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(index, body)| (BodyId(index as u32), body))
    }

    /// First body with the given name, in arena order.
    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.bodies
            .iter()
            .position(|body| body.name == name)
            .map(|index| BodyId(index as u32))
    }

    /// Resolve a slash-separated path below the root, e.g. `"Mars/Phobos"`.
    pub fn find_path(&self, path: &str) -> Option<BodyId> {
        let mut current = BodyId::ROOT;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = *self.bodies[current.index()]
                .children
                .iter()
                .find(|child| self.bodies[child.index()].name == segment)?;
        }
        Some(current)
    }

    pub fn world_position(&self, id: BodyId) -> Option<DVec3> {
        self.body(id).map(CelestialBody::world_position)
    }

    pub fn local_offset(&self, id: BodyId) -> Option<DVec3> {
        self.body(id).map(CelestialBody::local_offset)
    }

    /// Hand every body's world position to the sink, root first.
    pub fn publish<S: SceneSink + ?Sized>(&self, sink: &mut S) {
        for (id, body) in self.bodies() {
            sink.set_world_position(id, body.world_position);
        }
    }

    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.bodies
            .iter()
            .map(|body| BodySnapshot {
                name: body.name.clone(),
                kind: body.kind,
                rotation_angle: body.rotation_angle,
                local_offset: body.local_offset.to_array(),
                world_position: body.world_position.to_array(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::default_solar_system;

    const EPS: f64 = 1e-9;

    fn demo() -> OrbitModel {
        OrbitModel::from_system(&default_solar_system()).unwrap()
    }

    fn record(name: &str, parent: Option<&str>, distance: f64, speed: f64) -> BodyRecord {
        BodyRecord {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            radius: 1.0,
            distance,
            speed,
            texture: None,
            material: Material::Basic,
            color: None,
        }
    }

    fn assert_close(a: DVec3, b: DVec3, tol: f64) {
        assert!((a - b).length() < tol, "{a:?} != {b:?} (tol {tol})");
    }

    #[test]
    fn test_arena_is_topologically_ordered() {
        let model = demo();
        for (id, body) in model.bodies() {
            if let Some(parent) = body.parent() {
                assert!(parent < id, "{} precedes its parent", body.name);
            }
        }
        assert_eq!(model.root().kind, BodyKind::Star);
        assert_eq!(model.len(), 8);
    }

    #[test]
    fn test_kinds_follow_depth() {
        let model = demo();
        let earth = model.find("Earth").unwrap();
        let moon = model.find("Moon").unwrap();
        assert_eq!(model.body(earth).unwrap().kind, BodyKind::Planet);
        assert_eq!(model.body(moon).unwrap().kind, BodyKind::Moon);
    }

    #[test]
    fn test_every_child_listed_once_in_parent() {
        let model = demo();
        for (id, body) in model.bodies().skip(1) {
            let parent = model.body(body.parent().unwrap()).unwrap();
            let count = parent.children().iter().filter(|&&c| c == id).count();
            assert_eq!(count, 1, "{} listed {count} times", body.name);
        }
    }

    #[test]
    fn test_rotation_accumulates_without_wrapping() {
        let mut model = demo();
        let phobos = model.find_path("Mars/Phobos").unwrap();
        for _ in 0..1000 {
            model.tick();
        }
        let body = model.body(phobos).unwrap();
        // 1000 * 0.02 = 20 rad, well past TAU.
        assert!((body.rotation_angle() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_local_offset_after_n_ticks() {
        let mut model = demo();
        let venus = model.find("Venus").unwrap();
        let n = 37;
        for _ in 0..n {
            model.tick();
        }
        let angle = n as f64 * 0.007;
        let expected = DVec3::new(angle.sin() * 15.0, 0.0, angle.cos() * 15.0);
        assert_close(model.local_offset(venus).unwrap(), expected, 1e-9);
    }

    #[test]
    fn test_root_never_moves() {
        let mut model = demo();
        for _ in 0..250 {
            model.tick();
            assert_eq!(model.root().world_position(), DVec3::ZERO);
        }
    }

    #[test]
    fn test_earth_moon_after_one_tick() {
        let mut model = demo();
        model.tick();

        let earth = model.world_position(model.find("Earth").unwrap()).unwrap();
        assert_close(earth, DVec3::new(0.0999967, 0.0, 19.99975), 1e-5);

        let moon_id = model.find_path("Earth/Moon").unwrap();
        let moon_local = model.local_offset(moon_id).unwrap();
        assert_close(moon_local, DVec3::new(0.044999, 0.0, 2.999663), 1e-5);
        assert_close(model.world_position(moon_id).unwrap(), earth + moon_local, EPS);
    }

    #[test]
    fn test_mars_moons_share_current_parent_position() {
        let mut model = demo();
        for _ in 0..100 {
            model.tick();
        }
        let mars = model.find("Mars").unwrap();
        let mars_now = model.world_position(mars).unwrap();
        let stale = model.body(mars).unwrap().offset_at(99.0 * 0.003);

        for path in ["Mars/Phobos", "Mars/Deimos"] {
            let id = model.find_path(path).unwrap();
            let world = model.world_position(id).unwrap();
            let local = model.local_offset(id).unwrap();
            assert_close(world, mars_now + local, EPS);
            assert!((world - (stale + local)).length() > 1e-6, "{path} used a stale parent");
        }
    }

    #[test]
    fn test_zero_speed_holds_initial_offset() {
        let records = [
            record("Star", None, 0.0, 0.0),
            record("Still", Some("Star"), 4.0, 0.0),
        ];
        let mut model = OrbitModel::from_records(&records).unwrap();
        let still = model.find("Still").unwrap();
        for _ in 0..50 {
            model.tick();
            assert_eq!(model.local_offset(still).unwrap(), DVec3::new(0.0, 0.0, 4.0));
        }
    }

    #[test]
    fn test_zero_distance_collapses_onto_parent() {
        let records = [
            record("Star", None, 0.0, 0.0),
            record("Planet", Some("Star"), 10.0, 0.1),
            record("Twin", Some("Planet"), 0.0, 0.3),
        ];
        let mut model = OrbitModel::from_records(&records).unwrap();
        for _ in 0..10 {
            model.tick();
        }
        let planet = model.world_position(model.find("Planet").unwrap()).unwrap();
        let twin = model.world_position(model.find("Twin").unwrap()).unwrap();
        assert_eq!(planet, twin);
    }

    #[test]
    fn test_negative_speed_orbits_backwards() {
        let records = [
            record("Star", None, 0.0, 0.0),
            record("Retro", Some("Star"), 1.0, -0.5),
        ];
        let mut model = OrbitModel::from_records(&records).unwrap();
        model.tick();
        let offset = model.local_offset(model.find("Retro").unwrap()).unwrap();
        assert!(offset.x < 0.0);
    }

    #[test]
    fn test_ticks_preserve_structure() {
        let mut model = demo();
        let before: Vec<_> = model
            .bodies()
            .map(|(_, b)| (b.name.clone(), b.radius, b.orbit_distance, b.parent(), b.children().to_vec()))
            .collect();
        for _ in 0..500 {
            model.tick();
        }
        let after: Vec<_> = model
            .bodies()
            .map(|(_, b)| (b.name.clone(), b.radius, b.orbit_distance, b.parent(), b.children().to_vec()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(model.tick_count(), 500);
    }

    #[test]
    fn test_same_tick_count_gives_same_positions() {
        let mut a = demo();
        let mut b = demo();
        for _ in 0..321 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_initial_positions_sit_at_angle_zero() {
        let model = demo();
        let earth = model.find("Earth").unwrap();
        let moon = model.find("Moon").unwrap();
        assert_eq!(model.world_position(earth).unwrap(), DVec3::new(0.0, 0.0, 20.0));
        assert_eq!(model.world_position(moon).unwrap(), DVec3::new(0.0, 0.0, 23.0));
    }

    #[test]
    fn test_publish_sends_every_body() {
        let mut model = demo();
        model.tick();
        let mut sink: Vec<DVec3> = Vec::new();
        model.publish(&mut sink);
        assert_eq!(sink.len(), model.len());
        for (id, body) in model.bodies() {
            assert_eq!(sink[id.index()], body.world_position());
        }
    }

    #[test]
    fn test_find_path() {
        let model = demo();
        assert_eq!(model.find_path(""), Some(BodyId::ROOT));
        assert!(model.find_path("Earth/Moon").is_some());
        assert!(model.find_path("Mars/Moon").is_none());
        assert!(model.find_path("Pluto").is_none());
    }

    #[test]
    fn test_sibling_names_may_repeat_across_parents() {
        let mut system = default_solar_system();
        system.planets[3].moons[0].name = "Moon".to_string();
        let model = OrbitModel::from_system(&system).unwrap();
        assert!(model.find_path("Earth/Moon").is_some());
        assert!(model.find_path("Mars/Moon").is_some());
    }

    #[test]
    fn test_duplicate_sibling_rejected() {
        let mut system = default_solar_system();
        system.planets[1].name = "Mercury".to_string();
        let err = OrbitModel::from_system(&system).unwrap_err();
        assert!(matches!(err, OrbitError::DuplicateName { name } if name == "Mercury"));
    }

    #[test]
    fn test_invalid_radius_rejected() {
        let mut system = default_solar_system();
        system.planets[0].moons.push(BodyDef {
            name: "Ghost".to_string(),
            radius: 0.0,
            distance: 1.0,
            speed: 0.1,
            texture: None,
            material: Material::Basic,
            color: None,
            moons: Vec::new(),
        });
        let err = OrbitModel::from_system(&system).unwrap_err();
        assert!(matches!(err, OrbitError::InvalidRadius { .. }));
    }

    #[test]
    fn test_negative_distance_rejected() {
        let records = [
            record("Star", None, 0.0, 0.0),
            record("Inside", Some("Star"), -1.0, 0.1),
        ];
        let err = OrbitModel::from_records(&records).unwrap_err();
        assert!(matches!(err, OrbitError::InvalidDistance { .. }));
    }

    #[test]
    fn test_non_finite_speed_rejected() {
        let records = [
            record("Star", None, 0.0, 0.0),
            record("Spin", Some("Star"), 1.0, f64::NAN),
        ];
        let err = OrbitModel::from_records(&records).unwrap_err();
        assert!(matches!(err, OrbitError::InvalidSpeed { .. }));
    }

    #[test]
    fn test_records_multiple_roots_rejected() {
        let records = [record("A", None, 0.0, 0.0), record("B", None, 0.0, 0.0)];
        let err = OrbitModel::from_records(&records).unwrap_err();
        assert!(matches!(err, OrbitError::MultipleRoots { .. }));
    }

    #[test]
    fn test_records_missing_root_rejected() {
        let records = [
            record("A", Some("B"), 1.0, 0.0),
            record("B", Some("A"), 1.0, 0.0),
        ];
        let err = OrbitModel::from_records(&records).unwrap_err();
        assert!(matches!(err, OrbitError::MissingRoot));
    }

    #[test]
    fn test_records_unknown_parent_rejected() {
        let records = [
            record("Star", None, 0.0, 0.0),
            record("Lost", Some("Nowhere"), 1.0, 0.0),
        ];
        let err = OrbitModel::from_records(&records).unwrap_err();
        assert!(matches!(err, OrbitError::UnknownParent { parent, .. } if parent == "Nowhere"));
    }

    #[test]
    fn test_records_cycle_rejected() {
        let records = [
            record("Star", None, 0.0, 0.0),
            record("Planet", Some("Star"), 5.0, 0.1),
            record("Loop", Some("Knot"), 1.0, 0.0),
            record("Knot", Some("Loop"), 1.0, 0.0),
        ];
        let err = OrbitModel::from_records(&records).unwrap_err();
        assert!(matches!(err, OrbitError::Cycle { .. }));
    }

    #[test]
    fn test_records_name_unique_across_parents() {
        let records = [
            record("Star", None, 0.0, 0.0),
            record("Alpha", Some("Star"), 5.0, 0.1),
            record("Beta", Some("Star"), 9.0, 0.1),
            record("Rock", Some("Alpha"), 1.0, 0.2),
            record("Rock", Some("Beta"), 1.0, 0.2),
        ];
        let err = OrbitModel::from_records(&records).unwrap_err();
        assert!(matches!(err, OrbitError::DuplicateName { name } if name == "Rock"));
    }

    #[test]
    fn test_records_self_parent_is_cycle() {
        let records = [
            record("Star", None, 0.0, 0.0),
            record("Ouroboros", Some("Ouroboros"), 1.0, 0.0),
        ];
        let err = OrbitModel::from_records(&records).unwrap_err();
        assert!(matches!(err, OrbitError::Cycle { body } if body == "Ouroboros"));
    }

    #[test]
    fn test_records_out_of_order_parents_resolve() {
        let records = [
            record("Moon", Some("Planet"), 1.0, 0.2),
            record("Planet", Some("Star"), 5.0, 0.1),
            record("Star", None, 0.0, 0.0),
        ];
        let mut model = OrbitModel::from_records(&records).unwrap();
        assert_eq!(model.root().name, "Star");
        model.tick();
        let planet = model.world_position(model.find("Planet").unwrap()).unwrap();
        let moon_id = model.find("Moon").unwrap();
        assert_close(
            model.world_position(moon_id).unwrap(),
            planet + model.local_offset(moon_id).unwrap(),
            EPS,
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut model = demo();
        model.tick();
        let snapshot = model.snapshot();
        assert_eq!(snapshot.len(), 8);
        assert_eq!(snapshot[0].name, "Sun");
        assert_eq!(snapshot[0].world_position, [0.0, 0.0, 0.0]);
        let text = ron::to_string(&snapshot).unwrap();
        assert!(text.contains("Phobos"));
    }
}
