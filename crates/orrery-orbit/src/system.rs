//! Static body configuration: the nested system table and its flat form.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::body::Material;
use crate::error::OrbitError;

/// The root of a system table. The star sits at the origin and never moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarDef {
    pub name: String,
    pub radius: f64,
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default)]
    pub material: Material,
}

/// A body orbiting its enclosing definition (a planet, or a moon of a planet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDef {
    pub name: String,
    pub radius: f64,
    /// Orbit distance from the parent's centre.
    #[serde(default)]
    pub distance: f64,
    /// Radians per tick.
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default)]
    pub material: Material,
    /// Reserved; never interpreted.
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(default)]
    pub moons: Vec<BodyDef>,
}

/// A complete system: one star and its planets, each with nested moons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDef {
    pub star: StarDef,
    #[serde(default)]
    pub planets: Vec<BodyDef>,
}

/// Flat body description that names its parent instead of nesting.
///
/// Names must be unique across the whole record list since they are the
/// only way to refer to a parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyRecord {
    pub name: String,
    /// `None` marks the root.
    #[serde(default)]
    pub parent: Option<String>,
    pub radius: f64,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default)]
    pub material: Material,
    #[serde(default)]
    pub color: Option<u32>,
}

impl SystemDef {
    /// Parse a system table from RON text.
    pub fn from_ron(source: &str) -> Result<Self, OrbitError> {
        ron::from_str(source).map_err(OrbitError::Parse)
    }

    /// Load a system table from a RON file.
    pub fn load(path: &Path) -> Result<Self, OrbitError> {
        let contents = std::fs::read_to_string(path).map_err(OrbitError::Read)?;
        let system = Self::from_ron(&contents)?;
        tracing::info!(
            path = %path.display(),
            planets = system.planets.len(),
            "loaded system table"
        );
        Ok(system)
    }

    /// Total number of bodies, star included.
    pub fn body_count(&self) -> usize {
        fn count(def: &BodyDef) -> usize {
            1 + def.moons.iter().map(count).sum::<usize>()
        }
        1 + self.planets.iter().map(count).sum::<usize>()
    }
}

const MOON_TEXTURE: &str = "2k_moon.jpg";

fn moon(name: &str, radius: f64, distance: f64, speed: f64) -> BodyDef {
    BodyDef {
        name: name.to_string(),
        radius,
        distance,
        speed,
        texture: Some(MOON_TEXTURE.to_string()),
        material: Material::Basic,
        color: None,
        moons: Vec::new(),
    }
}

fn planet(
    name: &str,
    radius: f64,
    distance: f64,
    speed: f64,
    texture: &str,
    moons: Vec<BodyDef>,
) -> BodyDef {
    BodyDef {
        name: name.to_string(),
        radius,
        distance,
        speed,
        texture: Some(texture.to_string()),
        material: Material::Basic,
        color: None,
        moons,
    }
}

/// The demo system: the sun, four inner planets, the Moon, Phobos and Deimos.
pub fn default_solar_system() -> SystemDef {
    let mut mercury = planet("Mercury", 0.5, 10.0, 0.01, "2k_mercury.jpg", Vec::new());
    mercury.material = Material::Standard;

    let mut deimos = moon("Deimos", 0.2, 3.0, 0.015);
    deimos.color = Some(0xffffff);

    SystemDef {
        star: StarDef {
            name: "Sun".to_string(),
            radius: 5.0,
            texture: Some("2k_sun.jpg".to_string()),
            material: Material::Basic,
        },
        planets: vec![
            mercury,
            planet("Venus", 0.8, 15.0, 0.007, "2k_venus_surface.jpg", Vec::new()),
            planet(
                "Earth",
                1.0,
                20.0,
                0.005,
                "2k_earth_daymap.jpg",
                vec![moon("Moon", 0.3, 3.0, 0.015)],
            ),
            planet(
                "Mars",
                0.7,
                25.0,
                0.003,
                "2k_mars.jpg",
                vec![moon("Phobos", 0.1, 2.0, 0.02), deimos],
            ),
        ],
    }
}
