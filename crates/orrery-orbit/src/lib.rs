//! Hierarchical orbit animation for a stylized solar system.
//!
//! A [`SystemDef`] table describes a star, its planets and their moons. It is
//! turned once into an [`OrbitModel`], an arena of [`CelestialBody`] records
//! whose positions are re-derived on every [`OrbitModel::tick`]. Presentation
//! happens elsewhere, through the [`SceneSink`] trait.

mod body;
mod error;
mod model;
mod sink;
mod system;

pub use body::{BodyId, BodyKind, CelestialBody, Material};
pub use error::OrbitError;
pub use model::{BodySnapshot, OrbitModel};
pub use sink::SceneSink;
pub use system::{BodyDef, BodyRecord, StarDef, SystemDef, default_solar_system};
