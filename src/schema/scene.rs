/// Scene data model — the renderer-shaped output of the composition engine.

use glam::Vec3;
use rustc_hash::FxHashSet;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use super::animation::{AnimationChain, AnimationSequence, AnimationState, StateMachine, Value};

/// Newtype wrapper for generated scene ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(pub String);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Newtype wrapper for external asset identifiers (models, textures).
///
/// The engine never loads assets itself — it only collects the ids a
/// scene references so the caller can resolve and preload them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    /// Sentinel id emitted when no asset (or fallback) could be resolved.
    pub fn placeholder() -> AssetId {
        AssetId("placeholder".to_string())
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == "placeholder"
    }
}

/// RGB color stored as 0xRRGGBB.
///
/// Accepts either a `"#rrggbb"` string or a plain integer when
/// deserializing; always serializes as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const BLACK: Color = Color(0x000000);

    pub fn hex(&self) -> String {
        format!("#{:06x}", self.0)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ColorVisitor;

        impl<'de> de::Visitor<'de> for ColorVisitor {
            type Value = Color;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a \"#rrggbb\" string or an integer in 0..=0xffffff")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Color, E> {
                if v > 0xffffff {
                    return Err(E::custom(format!("color {v:#x} out of range")));
                }
                Ok(Color(v as u32))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Color, E> {
                if v < 0 {
                    return Err(E::custom("negative color value"));
                }
                self.visit_u64(v as u64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Color, E> {
                let hex = v.strip_prefix('#').unwrap_or(v);
                u32::from_str_radix(hex, 16)
                    .map_err(|_| E::custom(format!("invalid color string '{v}'")))
                    .and_then(|c| self.visit_u64(c as u64))
            }
        }

        deserializer.deserialize_any(ColorVisitor)
    }
}

/// Geometry of a scene object: a tagged primitive with its constructor
/// parameter list, or an instanced mesh carrying per-instance transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    #[serde(rename = "PlaneGeometry")]
    Plane { parameters: Vec<f32> },
    #[serde(rename = "BoxGeometry")]
    Box { parameters: Vec<f32> },
    #[serde(rename = "SphereGeometry")]
    Sphere { parameters: Vec<f32> },
    #[serde(rename = "CylinderGeometry")]
    Cylinder { parameters: Vec<f32> },
    #[serde(rename = "ConeGeometry")]
    Cone { parameters: Vec<f32> },
    #[serde(rename = "InstancedMesh")]
    Instanced(InstancedMesh),
}

/// Per-instance transform arrays over a shared base geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstancedMesh {
    pub base_geometry: Box<Geometry>,
    #[serde(default)]
    pub positions: Vec<Vec3>,
    #[serde(default)]
    pub rotations: Vec<Vec3>,
    #[serde(default)]
    pub scales: Vec<Vec3>,
}

impl InstancedMesh {
    pub fn instance_count(&self) -> usize {
        self.positions.len()
    }
}

/// Physically-based surface description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardMaterial {
    #[serde(default = "color_white")]
    pub color: Color,
    #[serde(default = "half")]
    pub roughness: f32,
    #[serde(default)]
    pub metalness: f32,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default)]
    pub transparent: bool,
    #[serde(default)]
    pub emissive: Option<Color>,
    #[serde(default)]
    pub emissive_intensity: Option<f32>,
    #[serde(default)]
    pub map: Option<AssetId>,
    #[serde(default)]
    pub normal_map: Option<AssetId>,
    #[serde(default)]
    pub roughness_map: Option<AssetId>,
    #[serde(default)]
    pub alpha_test: Option<f32>,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        StandardMaterial {
            color: Color::WHITE,
            roughness: 0.5,
            metalness: 0.0,
            opacity: 1.0,
            transparent: false,
            emissive: None,
            emissive_intensity: None,
            map: None,
            normal_map: None,
            roughness_map: None,
            alpha_test: None,
        }
    }
}

/// Unlit flat-color surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicMaterial {
    #[serde(default = "color_white")]
    pub color: Color,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default)]
    pub transparent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Material {
    #[serde(rename = "MeshStandardMaterial")]
    Standard(StandardMaterial),
    #[serde(rename = "MeshBasicMaterial")]
    Basic(BasicMaterial),
}

impl Material {
    /// Texture asset ids this material references.
    pub fn texture_ids(&self) -> Vec<&AssetId> {
        match self {
            Material::Standard(m) => [&m.map, &m.normal_map, &m.roughness_map]
                .into_iter()
                .filter_map(|id| id.as_ref())
                .collect(),
            Material::Basic(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
    Spot,
    Hemisphere,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightDefinition {
    #[serde(rename = "type")]
    pub kind: LightKind,
    #[serde(default = "color_white")]
    pub color: Color,
    #[serde(default = "one")]
    pub intensity: f32,
    #[serde(default)]
    pub position: Option<Vec3>,
    #[serde(default)]
    pub cast_shadows: bool,
    #[serde(default = "default_shadow_map_size")]
    pub shadow_map_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDefinition {
    #[serde(rename = "type")]
    pub kind: CameraKind,
    #[serde(default = "default_camera_position")]
    pub position: Vec3,
    #[serde(default)]
    pub target: Vec3,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraDefinition {
    fn default() -> Self {
        CameraDefinition {
            kind: CameraKind::Perspective,
            position: default_camera_position(),
            target: Vec3::ZERO,
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FogKind {
    Linear,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    #[serde(rename = "type")]
    pub kind: FogKind,
    pub color: Color,
    #[serde(default)]
    pub density: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Fog {
    pub fn exponential(color: Color, density: f32) -> Fog {
        Fog {
            kind: FogKind::Exponential,
            color,
            density,
            near: default_near(),
            far: default_far(),
        }
    }
}

/// A positional, looping environmental sound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientSound {
    pub name: String,
    #[serde(default = "half")]
    pub volume: f32,
    #[serde(default = "default_true", rename = "loop")]
    pub looped: bool,
    #[serde(default = "default_true")]
    pub spatial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Environment {
    pub background: Option<Color>,
    pub fog: Option<Fog>,
    pub skybox: Option<AssetId>,
    pub sounds: Vec<AmbientSound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    Dust,
    Embers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSystem {
    pub system: ParticleKind,
    pub count: u32,
    pub size: f32,
    pub color: Color,
    pub opacity: f32,
    #[serde(default)]
    pub velocity: Vec3,
    /// (min, max) lifetime in seconds, for systems that recycle particles.
    #[serde(default)]
    pub lifetime: Option<(f32, f32)>,
}

/// A post-processing effect in the scene's effect stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Ssao { radius: f32, intensity: f32 },
    Bloom { intensity: f32, threshold: f32 },
    VolumetricLight { density: f32, decay: f32, weight: f32 },
    Particles(ParticleSystem),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Door,
    Lever,
    Chest,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTrigger {
    OnClick,
    OnHover,
    OnStateChange,
}

/// An action the interaction runtime performs in response to a trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventAction {
    ToggleState {
        states: [String; 2],
    },
    ChangeState {
        target: String,
    },
    PlaySound {
        sound: String,
    },
    TriggerEvent {
        event: String,
    },
    Highlight {
        intensity: f32,
    },
    GenerateLoot {
        table: String,
    },
    /// Branch on an instance variable; `success` runs when the variable
    /// is truthy, `failure` otherwise.
    CheckCondition {
        condition: String,
        success: Box<EventAction>,
        failure: Box<EventAction>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBinding {
    pub trigger: EventTrigger,
    pub actions: Vec<EventAction>,
}

/// State-machine payload attached to an interactive object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub kind: InteractionKind,
    pub machine: StateMachine,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    #[serde(default = "default_true")]
    pub highlight: bool,
    #[serde(default)]
    pub events: Vec<EventBinding>,
}

/// Scene-level interaction plumbing descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSystem {
    pub raycast_layers: Vec<String>,
    pub pointer_events: bool,
    pub highlight_color: Color,
    pub highlight_intensity: f32,
}

impl Default for InteractionSystem {
    fn default() -> Self {
        InteractionSystem {
            raycast_layers: vec![
                "interactive".to_string(),
                "pickable".to_string(),
                "ui".to_string(),
            ],
            pointer_events: true,
            highlight_color: Color(0xffff00),
            highlight_intensity: 0.5,
        }
    }
}

/// A single object in a generated scene.
///
/// Names are unique within one scene; pattern and animation application
/// target objects by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDefinition {
    pub name: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub material: Option<Material>,
    #[serde(default)]
    pub model: Option<AssetId>,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "vec3_one")]
    pub scale: Vec3,
    #[serde(default)]
    pub cast_shadows: bool,
    #[serde(default)]
    pub receive_shadows: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub render_order: i32,
    #[serde(default)]
    pub interactive: bool,
    #[serde(default)]
    pub interaction: Option<Interaction>,
    #[serde(default)]
    pub animations: Vec<AnimationState>,
}

impl ObjectDefinition {
    /// A bare named object at the origin.
    pub fn named(name: impl Into<String>) -> ObjectDefinition {
        ObjectDefinition {
            name: name.into(),
            geometry: None,
            material: None,
            model: None,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            cast_shadows: false,
            receive_shadows: false,
            visible: true,
            render_order: 0,
            interactive: false,
            interaction: None,
            animations: Vec::new(),
        }
    }
}

/// What an attached animation drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationTarget {
    Scene,
    Object(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachedAnimation {
    Sequence(AnimationSequence),
    Chain(AnimationChain),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationAttachment {
    pub target: AnimationTarget,
    pub animation: AttachedAnimation,
}

/// The aggregate scene: everything a renderer needs to set the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDefinition {
    pub id: SceneId,
    pub camera: CameraDefinition,
    #[serde(default)]
    pub lights: Vec<LightDefinition>,
    #[serde(default)]
    pub objects: Vec<ObjectDefinition>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub animations: Vec<AnimationAttachment>,
    #[serde(default)]
    pub interaction_system: Option<InteractionSystem>,
}

impl SceneDefinition {
    pub fn new(id: SceneId) -> SceneDefinition {
        SceneDefinition {
            id,
            camera: CameraDefinition::default(),
            lights: Vec::new(),
            objects: Vec::new(),
            environment: Environment::default(),
            effects: Vec::new(),
            animations: Vec::new(),
            interaction_system: None,
        }
    }

    pub fn object(&self, name: &str) -> Option<&ObjectDefinition> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut ObjectDefinition> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.object(name).is_some()
    }

    /// Distinct asset ids referenced anywhere in the scene: object models,
    /// material texture maps, and the environment skybox.
    pub fn required_assets(&self) -> FxHashSet<AssetId> {
        let mut ids = FxHashSet::default();
        for obj in &self.objects {
            if let Some(model) = &obj.model {
                ids.insert(model.clone());
            }
            if let Some(material) = &obj.material {
                for id in material.texture_ids() {
                    ids.insert(id.clone());
                }
            }
        }
        if let Some(skybox) = &self.environment.skybox {
            ids.insert(skybox.clone());
        }
        ids
    }
}

fn color_white() -> Color {
    Color::WHITE
}

fn one() -> f32 {
    1.0
}

fn half() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

fn vec3_one() -> Vec3 {
    Vec3::ONE
}

fn default_shadow_map_size() -> u32 {
    1024
}

fn default_camera_position() -> Vec3 {
    Vec3::new(0.0, 5.0, 10.0)
}

fn default_fov() -> f32 {
    75.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}
