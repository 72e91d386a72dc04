//! Orrery application layer.
//!
//! Hosts the orbit model: the [`FrameDriver`] ticks it once per frame, the
//! [`SceneGraph`] receives the resulting positions, and either the winit
//! window or the headless runner supplies the frames.

pub mod controls;
pub mod error;
pub mod frame_driver;
pub mod headless;
pub mod input;
pub mod scene;
pub mod window;

pub use controls::OrbitControls;
pub use error::AppError;
pub use frame_driver::{CancelHandle, FrameDriver, FrameOutcome, FrameScheduler};
pub use headless::{HeadlessHost, HeadlessRun, run_headless};
pub use input::MouseState;
pub use scene::{SceneGraph, SceneNode};
pub use window::{OrreryApp, run};
