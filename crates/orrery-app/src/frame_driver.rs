//! Per-frame driver: one orbit tick per host frame.
//!
//! The host (a winit window, or the headless runner) owns the frame cadence.
//! Every frame it calls [`FrameDriver::on_frame`], which advances the model
//! once, publishes the new positions, then asks the host for another frame.
//! Cancelling just stops the rescheduling.

use std::cell::Cell;
use std::rc::Rc;

use orrery_orbit::{OrbitModel, SceneSink};
use tracing::{debug, info};

/// Frames between `debug!` traces of the frame number.
pub const TRACE_INTERVAL: u64 = 600;

/// Something that can be asked for one more frame callback.
pub trait FrameScheduler {
    fn request_next_frame(&self);
}

impl FrameScheduler for winit::window::Window {
    fn request_next_frame(&self) {
        self.request_redraw();
    }
}

/// What a call to [`FrameDriver::on_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The model ticked, positions were published and a frame was requested.
    Advanced { frame: u64 },
    /// The driver is not running; nothing happened.
    Stopped,
}

/// Shared stop flag. Clones refer to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Rc<Cell<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }

    fn reset(&self) {
        self.0.set(false);
    }
}

pub struct FrameDriver {
    model: OrbitModel,
    cancel: CancelHandle,
    running: bool,
    frame_count: u64,
}

impl FrameDriver {
    pub fn new(model: OrbitModel) -> Self {
        Self {
            model,
            cancel: CancelHandle::default(),
            running: false,
            frame_count: 0,
        }
    }

    /// Mark the loop running and request the first frame.
    ///
    /// Also used to resume after [`cancel`](Self::cancel); the model keeps
    /// its state, so motion continues where it stopped.
    pub fn start<H: FrameScheduler + ?Sized>(&mut self, host: &H) {
        self.cancel.reset();
        self.running = true;
        info!(
            bodies = self.model.len(),
            tick = self.model.tick_count(),
            "frame loop started"
        );
        host.request_next_frame();
    }

    /// Run one tick → publish → reschedule cycle.
    pub fn on_frame<H, S>(&mut self, host: &H, sink: &mut S) -> FrameOutcome
    where
        H: FrameScheduler + ?Sized,
        S: SceneSink + ?Sized,
    {
        if self.cancel.is_cancelled() {
            if self.running {
                self.running = false;
                info!(frames = self.frame_count, "frame loop cancelled");
            }
            return FrameOutcome::Stopped;
        }
        if !self.running {
            return FrameOutcome::Stopped;
        }

        self.model.tick();
        self.model.publish(sink);
        self.frame_count += 1;
        if self.frame_count % TRACE_INTERVAL == 0 {
            debug!(frame = self.frame_count, "frame");
        }

        host.request_next_frame();
        FrameOutcome::Advanced {
            frame: self.frame_count,
        }
    }

    /// Stop the loop; the next `on_frame` neither ticks nor reschedules.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
    }

    /// Handle that can stop this driver from elsewhere on the thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running && !self.cancel.is_cancelled()
    }

    /// Frames that advanced the model.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn model(&self) -> &OrbitModel {
        &self.model
    }

    pub fn into_model(self) -> OrbitModel {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use orrery_orbit::default_solar_system;

    #[derive(Default)]
    struct CountingHost {
        requests: Cell<u32>,
    }

    impl FrameScheduler for CountingHost {
        fn request_next_frame(&self) {
            self.requests.set(self.requests.get() + 1);
        }
    }

    fn driver() -> FrameDriver {
        FrameDriver::new(OrbitModel::from_system(&default_solar_system()).unwrap())
    }

    #[test]
    fn test_start_requests_first_frame() {
        let host = CountingHost::default();
        let mut driver = driver();
        assert!(!driver.is_running());
        driver.start(&host);
        assert!(driver.is_running());
        assert_eq!(host.requests.get(), 1);
        assert_eq!(driver.model().tick_count(), 0);
    }

    #[test]
    fn test_one_tick_per_frame() {
        let host = CountingHost::default();
        let mut sink: Vec<DVec3> = Vec::new();
        let mut driver = driver();
        driver.start(&host);

        for expected in 1..=5 {
            let outcome = driver.on_frame(&host, &mut sink);
            assert_eq!(outcome, FrameOutcome::Advanced { frame: expected });
            assert_eq!(driver.model().tick_count(), expected);
        }
        assert_eq!(driver.frame_count(), 5);
        // One request from start, one per frame.
        assert_eq!(host.requests.get(), 6);
    }

    #[test]
    fn test_tick_precedes_publish() {
        let host = CountingHost::default();
        let mut sink: Vec<DVec3> = Vec::new();
        let mut driver = driver();
        let earth = driver.model().find("Earth").unwrap();
        let before = driver.model().world_position(earth).unwrap();

        driver.start(&host);
        driver.on_frame(&host, &mut sink);

        // The very first publish already carries tick 1's position.
        let published = sink[earth.index()];
        assert_eq!(published, driver.model().world_position(earth).unwrap());
        assert_ne!(published, before);
        assert!((published.x - 20.0 * 0.005f64.sin()).abs() < 1e-12);
    }

    #[test]
    fn test_not_started_does_nothing() {
        let host = CountingHost::default();
        let mut sink: Vec<DVec3> = Vec::new();
        let mut driver = driver();

        assert_eq!(driver.on_frame(&host, &mut sink), FrameOutcome::Stopped);
        assert_eq!(driver.model().tick_count(), 0);
        assert_eq!(host.requests.get(), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_cancel_stops_rescheduling() {
        let host = CountingHost::default();
        let mut sink: Vec<DVec3> = Vec::new();
        let mut driver = driver();
        driver.start(&host);
        driver.on_frame(&host, &mut sink);
        driver.on_frame(&host, &mut sink);

        driver.cancel();
        let requests_before = host.requests.get();
        assert_eq!(driver.on_frame(&host, &mut sink), FrameOutcome::Stopped);
        assert_eq!(driver.model().tick_count(), 2);
        assert_eq!(host.requests.get(), requests_before);
        assert!(!driver.is_running());
    }

    #[test]
    fn test_cancel_handle_shares_flag() {
        let host = CountingHost::default();
        let mut sink: Vec<DVec3> = Vec::new();
        let mut driver = driver();
        let handle = driver.cancel_handle();
        driver.start(&host);

        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(driver.on_frame(&host, &mut sink), FrameOutcome::Stopped);
        assert_eq!(driver.model().tick_count(), 0);
    }

    #[test]
    fn test_restart_resumes_from_same_state() {
        let host = CountingHost::default();
        let mut sink: Vec<DVec3> = Vec::new();
        let mut driver = driver();
        driver.start(&host);
        for _ in 0..3 {
            driver.on_frame(&host, &mut sink);
        }
        driver.cancel();
        driver.on_frame(&host, &mut sink);

        driver.start(&host);
        assert_eq!(
            driver.on_frame(&host, &mut sink),
            FrameOutcome::Advanced { frame: 4 }
        );
        assert_eq!(driver.model().tick_count(), 4);
    }

    #[test]
    fn test_frames_match_direct_ticks() {
        let host = CountingHost::default();
        let mut sink: Vec<DVec3> = Vec::new();
        let mut driver = driver();
        let mut reference = OrbitModel::from_system(&default_solar_system()).unwrap();

        driver.start(&host);
        for _ in 0..100 {
            driver.on_frame(&host, &mut sink);
            reference.tick();
        }

        let mut expected: Vec<DVec3> = Vec::new();
        reference.publish(&mut expected);
        assert_eq!(sink, expected);
    }
}
