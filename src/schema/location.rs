/// Location data — the contract with the external world/location service.
///
/// A `LocationProvider` hands the composer one of these per location id;
/// every field is optional-ish by construction so a sparse location still
/// generates a scene.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::scene::ParticleKind;

/// Newtype wrapper for location ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub String);

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Dungeon,
    Cave,
    Forest,
    Town,
    Ruins,
}

/// Bounding volume of the location, centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f32,
    pub length: f32,
    pub height: f32,
}

impl Default for Extent {
    fn default() -> Self {
        Extent {
            width: 50.0,
            length: 50.0,
            height: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    Stone,
    Dirt,
    Grass,
    Sand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainFeature {
    Cracks,
    Moss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    #[serde(rename = "type")]
    pub kind: TerrainKind,
    #[serde(default = "default_roughness")]
    pub roughness: f32,
    #[serde(default)]
    pub features: Vec<TerrainFeature>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchElementKind {
    Wall,
    Pillar,
}

/// One architecture element: a kind plus the 2D waypoints it spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchElement {
    #[serde(rename = "type")]
    pub kind: ArchElementKind,
    pub waypoints: Vec<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Architecture {
    pub style: Option<String>,
    pub elements: Vec<ArchElement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecorationKind {
    Torch,
    Chest,
    Barrel,
    Rubble,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    #[serde(rename = "type")]
    pub kind: DecorationKind,
    pub positions: Vec<Vec2>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub loot_table: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractiveKind {
    Door,
    Lever,
    Chest,
    Button,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveObject {
    #[serde(rename = "type")]
    pub kind: InteractiveKind,
    pub position: Vec3,
    #[serde(default)]
    pub style: Option<String>,
    /// Game event fired when the object activates (levers, buttons).
    #[serde(default)]
    pub trigger_event: Option<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub loot_table: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Ambient {
    pub particles: Vec<ParticleKind>,
    pub sounds: Vec<String>,
}

/// Everything the world service knows about a location that matters for
/// scene composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    #[serde(rename = "type")]
    pub kind: LocationKind,
    #[serde(default)]
    pub size: Extent,
    pub terrain: Terrain,
    #[serde(default)]
    pub architecture: Architecture,
    #[serde(default)]
    pub decorations: Vec<Decoration>,
    #[serde(default)]
    pub interactive: Vec<InteractiveObject>,
    #[serde(default)]
    pub ambient: Ambient,
}

impl LocationData {
    pub fn has_decoration(&self, kind: DecorationKind) -> bool {
        self.decorations.iter().any(|d| d.kind == kind)
    }
}

fn default_roughness() -> f32 {
    0.8
}
