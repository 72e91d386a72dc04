//! Windowless host: drives the frame loop from an in-process scheduler.

use std::cell::Cell;

use orrery_orbit::{BodySnapshot, OrbitModel};
use tracing::info;

use crate::frame_driver::{FrameDriver, FrameOutcome, FrameScheduler};
use crate::scene::{SceneGraph, should_log_positions};

/// Scheduler that remembers whether a frame has been asked for.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    pending: Cell<bool>,
    requests: Cell<u64>,
}

impl HeadlessHost {
    /// Consume the pending request, if any.
    pub fn take_pending(&self) -> bool {
        self.pending.replace(false)
    }

    /// Total frames requested so far.
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }
}

impl FrameScheduler for HeadlessHost {
    fn request_next_frame(&self) {
        self.pending.set(true);
        self.requests.set(self.requests.get() + 1);
    }
}

/// Result of a headless run.
#[derive(Debug)]
pub struct HeadlessRun {
    pub frames: u64,
    pub scene: SceneGraph,
    pub model: OrbitModel,
}

impl HeadlessRun {
    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.model.snapshot()
    }
}

/// Run `frames` frames without a window or GPU.
///
/// The loop only advances while the driver keeps requesting frames, exactly
/// like the windowed host, and cancels itself once the count is reached.
pub fn run_headless(model: OrbitModel, frames: u64, position_log_interval: u64) -> HeadlessRun {
    let host = HeadlessHost::default();
    let mut scene = SceneGraph::from_model(&model);
    let mut driver = FrameDriver::new(model);

    if frames > 0 {
        driver.start(&host);
    }
    while host.take_pending() {
        if let FrameOutcome::Advanced { frame } = driver.on_frame(&host, &mut scene) {
            if should_log_positions(frame, position_log_interval) {
                scene.log_positions(frame);
            }
            if frame >= frames {
                driver.cancel();
            }
        }
    }

    let frames = driver.frame_count();
    info!(frames, requests = host.requests(), "headless run finished");
    HeadlessRun {
        frames,
        scene,
        model: driver.into_model(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_orbit::{BodyId, default_solar_system};

    fn model() -> OrbitModel {
        OrbitModel::from_system(&default_solar_system()).unwrap()
    }

    #[test]
    fn test_runs_exact_frame_count() {
        let run = run_headless(model(), 100, 0);
        assert_eq!(run.frames, 100);
        assert_eq!(run.model.tick_count(), 100);
    }

    #[test]
    fn test_zero_frames_leaves_initial_state() {
        let run = run_headless(model(), 0, 0);
        assert_eq!(run.frames, 0);
        let earth = run.model.find("Earth").unwrap();
        assert_eq!(
            run.scene.node(earth).unwrap().position,
            glam::DVec3::new(0.0, 0.0, 20.0)
        );
    }

    #[test]
    fn test_scene_matches_model_after_run() {
        let run = run_headless(model(), 42, 10);
        for (id, body) in run.model.bodies() {
            assert_eq!(run.scene.node(id).unwrap().position, body.world_position());
        }
        assert_eq!(run.scene.node(BodyId::ROOT).unwrap().position, glam::DVec3::ZERO);
    }

    #[test]
    fn test_mars_moons_share_parent_position() {
        let run = run_headless(model(), 100, 0);
        let mars = run.model.world_position(run.model.find("Mars").unwrap()).unwrap();
        for path in ["Mars/Phobos", "Mars/Deimos"] {
            let id = run.model.find_path(path).unwrap();
            let body = run.model.body(id).unwrap();
            let composed = mars + body.local_offset();
            assert!((body.world_position() - composed).length() < 1e-12);
        }
    }

    #[test]
    fn test_snapshot_lists_every_body() {
        let run = run_headless(model(), 1, 0);
        let snapshot = run.snapshot();
        assert_eq!(snapshot.len(), 8);
        assert_eq!(snapshot[0].name, "Sun");
    }

    #[test]
    fn test_host_tracks_requests() {
        let host = HeadlessHost::default();
        assert!(!host.take_pending());
        host.request_next_frame();
        host.request_next_frame();
        assert!(host.take_pending());
        assert!(!host.take_pending());
        assert_eq!(host.requests(), 2);
    }
}
