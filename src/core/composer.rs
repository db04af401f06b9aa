/// The scene composer: template resolution → pattern application →
/// location layering → quality application, producing a finished scene
/// definition plus the asset ids it needs resolved externally.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, TAU};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::core::animation::{validate_machine, AnimationError, AnimationSystem};
use crate::core::layout::{self, PillarConfig, WallConfig};
use crate::core::pattern::{PatternError, PatternLibrary};
use crate::core::scatter::{poisson_disk, ScatterConfig};
use crate::core::substitute::Params;
use crate::core::template::{TemplateAnimation, TemplateError, TemplateStore};
use crate::schema::animation::{
    AnimationState, Easing, Keyframe, StateMachine, Transition, Value,
};
use crate::schema::location::{
    ArchElementKind, DecorationKind, InteractiveKind, InteractiveObject, LocationData, LocationId,
    TerrainFeature,
};
use crate::schema::quality::{QualityError, QualitySettings, QualityTier};
use crate::schema::scene::{
    AmbientSound, AnimationAttachment, AnimationTarget, AssetId, AttachedAnimation,
    CameraDefinition, Color, Effect, Environment, EventAction, EventBinding, EventTrigger, Fog,
    Geometry, InstancedMesh, Interaction, InteractionKind, InteractionSystem, LightDefinition,
    LightKind, Material, ObjectDefinition, ParticleKind, ParticleSystem, SceneDefinition, SceneId,
    StandardMaterial,
};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("scene not found: {0}")]
    SceneNotFound(String),
    #[error("quality error: {0}")]
    Quality(#[from] QualityError),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),
    #[error("animation error: {0}")]
    Animation(#[from] AnimationError),
}

/// World/location service contract. Returning `None` is a valid,
/// expected outcome (a new or unpopulated location) and never aborts
/// scene generation.
pub trait LocationProvider {
    fn location(&self, id: &LocationId) -> Option<LocationData>;
}

/// Asset service contract. The composer only asks for ids; loading and
/// timeout policy belong to the implementation.
pub trait AssetResolver {
    fn model(&self, kind: &str, style: Option<&str>) -> Option<AssetId>;
    fn texture(&self, kind: &str) -> Option<AssetId>;
}

struct NullLocations;

impl LocationProvider for NullLocations {
    fn location(&self, _: &LocationId) -> Option<LocationData> {
        None
    }
}

struct NullAssets;

impl AssetResolver for NullAssets {
    fn model(&self, _: &str, _: Option<&str>) -> Option<AssetId> {
        None
    }

    fn texture(&self, _: &str) -> Option<AssetId> {
        None
    }
}

/// Map-backed location provider, for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticLocations {
    locations: FxHashMap<LocationId, LocationData>,
}

impl StaticLocations {
    pub fn new() -> StaticLocations {
        StaticLocations::default()
    }

    pub fn insert(&mut self, id: LocationId, data: LocationData) {
        self.locations.insert(id, data);
    }
}

impl LocationProvider for StaticLocations {
    fn location(&self, id: &LocationId) -> Option<LocationData> {
        self.locations.get(id).cloned()
    }
}

/// Map-backed asset resolver, for tests and demos. Model lookups try
/// `kind:style` first, then the bare kind.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    models: FxHashMap<String, AssetId>,
    textures: FxHashMap<String, AssetId>,
}

impl StaticAssets {
    pub fn new() -> StaticAssets {
        StaticAssets::default()
    }

    pub fn insert_model(&mut self, key: impl Into<String>, id: AssetId) {
        self.models.insert(key.into(), id);
    }

    pub fn insert_texture(&mut self, key: impl Into<String>, id: AssetId) {
        self.textures.insert(key.into(), id);
    }
}

impl AssetResolver for StaticAssets {
    fn model(&self, kind: &str, style: Option<&str>) -> Option<AssetId> {
        if let Some(style) = style {
            if let Some(id) = self.models.get(&format!("{kind}:{style}")) {
                return Some(id.clone());
            }
        }
        self.models.get(kind).cloned()
    }

    fn texture(&self, kind: &str) -> Option<AssetId> {
        self.textures.get(kind).cloned()
    }
}

/// Per-request tuning knobs for the procedural layers.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub moss_scatter: ScatterConfig,
    /// Ground area, in square units, per crack decal.
    pub crack_area: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            moss_scatter: ScatterConfig::default(),
            crack_area: 25.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneRequest {
    pub location_id: LocationId,
    pub template_name: String,
    pub quality: QualityTier,
    pub options: GenerateOptions,
}

impl SceneRequest {
    pub fn new(
        location_id: LocationId,
        template_name: impl Into<String>,
        quality: QualityTier,
    ) -> SceneRequest {
        SceneRequest {
            location_id,
            template_name: template_name.into(),
            quality,
            options: GenerateOptions::default(),
        }
    }
}

/// Partial update applied to a cached scene.
#[derive(Debug, Clone, Default)]
pub struct SceneUpdate {
    pub camera: Option<CameraDefinition>,
    pub lights: Option<Vec<LightDefinition>>,
    pub environment: Option<Environment>,
    pub effects: Option<Vec<Effect>>,
}

/// The composer's sole output: the scene plus every asset id it needs
/// resolved externally.
#[derive(Debug, Clone)]
pub struct SceneResponse {
    pub scene_id: SceneId,
    pub scene: SceneDefinition,
    pub assets_required: FxHashSet<AssetId>,
}

/// Orchestrates scene generation. Built via `SceneComposer::builder()`.
///
/// Template store and pattern library are read-only after construction;
/// the active-scene cache is the only mutable state and sits behind a
/// mutex so concurrent `generate`/`update_scene` calls stay coherent.
pub struct SceneComposer {
    templates: TemplateStore,
    patterns: PatternLibrary,
    locations: Box<dyn LocationProvider>,
    assets: Box<dyn AssetResolver>,
    seed: u64,
    scenes: Mutex<FxHashMap<SceneId, SceneDefinition>>,
    next_scene: AtomicU64,
}

/// Builder for constructing a `SceneComposer`.
pub struct SceneComposerBuilder {
    templates_dir: Option<PathBuf>,
    patterns_dir: Option<PathBuf>,
    templates: Option<TemplateStore>,
    patterns: Option<PatternLibrary>,
    locations: Option<Box<dyn LocationProvider>>,
    assets: Option<Box<dyn AssetResolver>>,
    seed: u64,
}

impl SceneComposer {
    pub fn builder() -> SceneComposerBuilder {
        SceneComposerBuilder {
            templates_dir: None,
            patterns_dir: None,
            templates: None,
            patterns: None,
            locations: None,
            assets: None,
            seed: 0,
        }
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    /// Generate a scene for a location from a named template.
    pub fn generate(&self, request: &SceneRequest) -> Result<SceneResponse, ComposeError> {
        let template = self
            .templates
            .resolve(&request.template_name)?
            .ok_or_else(|| ComposeError::TemplateNotFound(request.template_name.clone()))?;
        let settings = QualitySettings::preset(request.quality);

        let scene_id = SceneId(format!(
            "scene_{}",
            self.next_scene.fetch_add(1, Ordering::Relaxed)
        ));
        let mut rng = StdRng::seed_from_u64(self.request_seed(request));

        let mut scene = SceneDefinition::new(scene_id.clone());
        scene.camera = template.camera.clone().unwrap_or_default();
        scene.lights = template.lights.clone();
        scene.environment = template.environment.clone().unwrap_or_default();
        for obj in &template.objects {
            insert_object(&mut scene, obj.clone());
        }

        // Template-declared patterns. Template variables seed the
        // parameter map; invocation parameters override on overlap.
        for invocation in &template.patterns {
            let mut params: Params = template.variables.clone();
            params.extend(invocation.parameters.clone());
            self.patterns.apply(&mut scene, &invocation.name, &params);
        }

        // Template-declared animations, validated up front.
        let mut animations = AnimationSystem::new();
        for anim in &template.animations {
            match anim {
                TemplateAnimation::Sequence(seq) => {
                    animations.register_sequence(seq.clone())?;
                    scene.animations.push(AnimationAttachment {
                        target: AnimationTarget::Scene,
                        animation: AttachedAnimation::Sequence(seq.clone()),
                    });
                }
                TemplateAnimation::Chain(chain) => {
                    animations.register_chain(chain.clone())?;
                    scene.animations.push(AnimationAttachment {
                        target: AnimationTarget::Scene,
                        animation: AttachedAnimation::Chain(chain.clone()),
                    });
                }
            }
        }

        // Location layers, in fixed order. A missing location degrades
        // to template-only content; it never fails the request.
        match self.locations.location(&request.location_id) {
            Some(location) => {
                self.add_terrain(&mut scene, &location, &request.options, &mut rng);
                self.add_architecture(&mut scene, &location);
                self.add_decorations(&mut scene, &location, &mut rng);
                self.add_interactive(&mut scene, &location)?;
                add_ambient_life(&mut scene, &location);
                add_environment_effects(&mut scene, &location);
            }
            None => {
                log::warn!(
                    "no location data for {}; generating template-only scene",
                    request.location_id
                );
            }
        }

        apply_quality(&mut scene, &settings);

        let assets_required = scene.required_assets();
        self.lock_scenes().insert(scene_id.clone(), scene.clone());

        Ok(SceneResponse {
            scene_id,
            scene,
            assets_required,
        })
    }

    /// Apply a partial update to a cached scene.
    pub fn update_scene(
        &self,
        scene_id: &SceneId,
        update: SceneUpdate,
    ) -> Result<SceneResponse, ComposeError> {
        let mut scenes = self.lock_scenes();
        let scene = scenes
            .get_mut(scene_id)
            .ok_or_else(|| ComposeError::SceneNotFound(scene_id.0.clone()))?;

        if let Some(camera) = update.camera {
            scene.camera = camera;
        }
        if let Some(lights) = update.lights {
            scene.lights = lights;
        }
        if let Some(environment) = update.environment {
            scene.environment = environment;
        }
        if let Some(effects) = update.effects {
            scene.effects = effects;
        }

        let assets_required = scene.required_assets();
        Ok(SceneResponse {
            scene_id: scene_id.clone(),
            scene: scene.clone(),
            assets_required,
        })
    }

    /// The cached scene for an id, if still active.
    pub fn scene(&self, scene_id: &SceneId) -> Option<SceneDefinition> {
        self.lock_scenes().get(scene_id).cloned()
    }

    fn lock_scenes(&self) -> std::sync::MutexGuard<'_, FxHashMap<SceneId, SceneDefinition>> {
        self.scenes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request_seed(&self, request: &SceneRequest) -> u64 {
        let mut hasher = FxHasher::default();
        request.location_id.0.hash(&mut hasher);
        request.template_name.hash(&mut hasher);
        self.seed ^ hasher.finish()
    }

    fn resolve_texture(&self, kind: &str) -> AssetId {
        if let Some(id) = self.assets.texture(kind) {
            return id;
        }
        if let Some(fallback) = fallback_texture(kind) {
            if let Some(id) = self.assets.texture(fallback) {
                return id;
            }
        }
        log::warn!("no texture for `{kind}`; using placeholder");
        AssetId::placeholder()
    }

    fn resolve_model(&self, kind: &str, style: Option<&str>) -> AssetId {
        match self.assets.model(kind, style) {
            Some(id) => id,
            None => {
                log::warn!("no model for `{kind}`; using placeholder");
                AssetId::placeholder()
            }
        }
    }

    fn add_terrain(
        &self,
        scene: &mut SceneDefinition,
        location: &LocationData,
        options: &GenerateOptions,
        rng: &mut StdRng,
    ) {
        let size = location.size;

        let mut ground = ObjectDefinition::named("ground");
        ground.geometry = Some(Geometry::Plane {
            parameters: vec![size.width, size.length],
        });
        ground.material = Some(Material::Standard(StandardMaterial {
            color: Color(0x808080),
            roughness: location.terrain.roughness,
            metalness: 0.1,
            ..StandardMaterial::default()
        }));
        ground.rotation = Vec3::new(-FRAC_PI_2, 0.0, 0.0);
        ground.receive_shadows = true;
        insert_object(scene, ground);

        for feature in &location.terrain.features {
            match feature {
                TerrainFeature::Cracks => {
                    self.add_terrain_cracks(scene, location, options, rng);
                }
                TerrainFeature::Moss => {
                    self.add_terrain_moss(scene, location, options, rng);
                }
            }
        }
    }

    fn add_terrain_cracks(
        &self,
        scene: &mut SceneDefinition,
        location: &LocationData,
        options: &GenerateOptions,
        rng: &mut StdRng,
    ) {
        let size = location.size;
        let material = Material::Standard(StandardMaterial {
            color: Color(0x505050),
            roughness: 1.0,
            metalness: 0.0,
            opacity: 0.8,
            transparent: true,
            map: Some(self.resolve_texture("terrain_cracks")),
            normal_map: Some(self.resolve_texture("terrain_cracks_normal")),
            roughness_map: Some(self.resolve_texture("terrain_cracks_roughness")),
            ..StandardMaterial::default()
        });

        let count = ((size.width * size.length) / options.crack_area) as usize;
        for i in 0..count {
            let x = rng.gen_range(-size.width / 2.0..=size.width / 2.0);
            let z = rng.gen_range(-size.length / 2.0..=size.length / 2.0);
            let yaw = rng.gen_range(0.0..TAU);
            let scale = rng.gen_range(0.8..1.5);

            let mut crack = ObjectDefinition::named(format!("crack_decal_{i}"));
            crack.geometry = Some(Geometry::Plane {
                parameters: vec![2.0 * scale, 2.0 * scale],
            });
            crack.material = Some(material.clone());
            // Slightly above the ground so the decal wins the depth test.
            crack.position = Vec3::new(x, 0.01, z);
            crack.rotation = Vec3::new(-FRAC_PI_2, yaw, 0.0);
            crack.receive_shadows = true;
            crack.render_order = 1;
            insert_object(scene, crack);
        }
    }

    fn add_terrain_moss(
        &self,
        scene: &mut SceneDefinition,
        location: &LocationData,
        options: &GenerateOptions,
        rng: &mut StdRng,
    ) {
        let size = location.size;
        let scattered = poisson_disk(rng, size.width, size.length, &options.moss_scatter);
        if scattered.is_empty() {
            return;
        }

        let positions: Vec<Vec3> = scattered.iter().map(|p| Vec3::new(p.x, 0.0, p.y)).collect();
        let scales: Vec<Vec3> = scattered
            .iter()
            .map(|_| Vec3::splat(rng.gen_range(0.5..1.5)))
            .collect();
        let rotations: Vec<Vec3> = scattered
            .iter()
            .map(|_| Vec3::new(0.0, rng.gen_range(0.0..TAU), 0.0))
            .collect();

        let mut moss = ObjectDefinition::named("moss_patches");
        moss.geometry = Some(Geometry::Instanced(InstancedMesh {
            base_geometry: Box::new(Geometry::Plane {
                parameters: vec![1.0, 1.0],
            }),
            positions,
            rotations,
            scales,
        }));
        moss.material = Some(Material::Standard(StandardMaterial {
            color: Color(0x2d4f1e),
            roughness: 1.0,
            metalness: 0.0,
            transparent: true,
            alpha_test: Some(0.5),
            map: Some(self.resolve_texture("terrain_moss")),
            normal_map: Some(self.resolve_texture("terrain_moss_normal")),
            ..StandardMaterial::default()
        }));
        moss.position = Vec3::new(0.0, 0.02, 0.0);
        moss.rotation = Vec3::new(-FRAC_PI_2, 0.0, 0.0);
        moss.receive_shadows = true;
        insert_object(scene, moss);
    }

    fn add_architecture(&self, scene: &mut SceneDefinition, location: &LocationData) {
        let mut wall_count = 0;
        let mut pillar_count = 0;
        for element in &location.architecture.elements {
            match element.kind {
                ArchElementKind::Wall => {
                    let segments =
                        layout::wall_segments(&element.waypoints, wall_count, &WallConfig::default());
                    wall_count += segments.len();
                    for segment in segments {
                        insert_object(scene, segment);
                    }
                }
                ArchElementKind::Pillar => {
                    let columns =
                        layout::pillars(&element.waypoints, pillar_count, &PillarConfig::default());
                    pillar_count += columns.len();
                    for column in columns {
                        insert_object(scene, column);
                    }
                }
            }
        }
    }

    fn add_decorations(
        &self,
        scene: &mut SceneDefinition,
        location: &LocationData,
        rng: &mut StdRng,
    ) {
        let style = location.architecture.style.as_deref();
        let mut counts: FxHashMap<DecorationKind, usize> = FxHashMap::default();

        for decoration in &location.decorations {
            for pos in &decoration.positions {
                let count = counts.entry(decoration.kind).or_insert(0);
                let index = *count;
                *count += 1;
                match decoration.kind {
                    DecorationKind::Torch => {
                        let mut torch = ObjectDefinition::named(format!("torch_{index}"));
                        torch.model = Some(self.resolve_model("torch", style));
                        torch.position = Vec3::new(pos.x, 2.0, pos.y);
                        torch.cast_shadows = true;
                        insert_object(scene, torch);

                        scene.lights.push(LightDefinition {
                            kind: LightKind::Point,
                            color: Color(0xff6600),
                            intensity: rng.gen_range(0.8..1.2),
                            position: Some(Vec3::new(pos.x, 2.2, pos.y)),
                            cast_shadows: true,
                            shadow_map_size: 512,
                        });
                    }
                    DecorationKind::Chest => {
                        let mut chest = ObjectDefinition::named(format!("chest_{index}"));
                        chest.model = Some(self.resolve_model("chest", style));
                        chest.position = Vec3::new(pos.x, 0.5, pos.y);
                        chest.cast_shadows = true;
                        chest.receive_shadows = true;
                        chest.interactive = true;
                        insert_object(scene, chest);
                    }
                    DecorationKind::Barrel => {
                        let mut barrel = ObjectDefinition::named(format!("barrel_{index}"));
                        barrel.model = Some(self.resolve_model("barrel", style));
                        barrel.position = Vec3::new(pos.x, 0.5, pos.y);
                        barrel.cast_shadows = true;
                        barrel.receive_shadows = true;
                        insert_object(scene, barrel);
                    }
                    DecorationKind::Rubble => {
                        let mut rubble = ObjectDefinition::named(format!("rubble_{index}"));
                        rubble.model = Some(self.resolve_model("rubble", style));
                        rubble.position = Vec3::new(pos.x, 0.0, pos.y);
                        rubble.receive_shadows = true;
                        insert_object(scene, rubble);
                    }
                }
            }
        }
    }

    fn add_interactive(
        &self,
        scene: &mut SceneDefinition,
        location: &LocationData,
    ) -> Result<(), ComposeError> {
        scene.interaction_system = Some(InteractionSystem::default());

        let style = location.architecture.style.as_deref();
        let mut counts: FxHashMap<InteractiveKind, usize> = FxHashMap::default();

        for spec in &location.interactive {
            let index = *counts.entry(spec.kind).or_insert(0);
            counts.insert(spec.kind, index + 1);

            let obj = match spec.kind {
                InteractiveKind::Door => self.door_object(index, spec, style)?,
                InteractiveKind::Lever => self.lever_object(index, spec, style)?,
                InteractiveKind::Chest => self.chest_object(index, spec, style)?,
                InteractiveKind::Button => self.button_object(index, spec, style)?,
            };
            insert_object(scene, obj);
        }
        Ok(())
    }

    fn door_object(
        &self,
        index: usize,
        spec: &InteractiveObject,
        style: Option<&str>,
    ) -> Result<ObjectDefinition, ComposeError> {
        let machine = door_machine();
        validate_machine(&machine)?;

        let mut door = interactive_base(format!("door_{index}"), spec);
        door.model = Some(self.resolve_model("door", style.or(spec.style.as_deref())));
        door.interaction = Some(Interaction {
            kind: InteractionKind::Door,
            machine,
            variables: HashMap::new(),
            highlight: true,
            events: vec![
                EventBinding {
                    trigger: EventTrigger::OnClick,
                    actions: vec![EventAction::ToggleState {
                        states: ["open".to_string(), "closed".to_string()],
                    }],
                },
                hover_highlight(),
            ],
        });
        Ok(door)
    }

    fn lever_object(
        &self,
        index: usize,
        spec: &InteractiveObject,
        style: Option<&str>,
    ) -> Result<ObjectDefinition, ComposeError> {
        let machine = lever_machine();
        validate_machine(&machine)?;

        let trigger = spec.trigger_event.clone().unwrap_or_else(|| "none".to_string());
        let mut lever = interactive_base(format!("lever_{index}"), spec);
        lever.model = Some(self.resolve_model("lever", style.or(spec.style.as_deref())));
        lever.interaction = Some(Interaction {
            kind: InteractionKind::Lever,
            machine,
            variables: HashMap::new(),
            highlight: true,
            events: vec![
                EventBinding {
                    trigger: EventTrigger::OnClick,
                    actions: vec![
                        EventAction::ToggleState {
                            states: ["on".to_string(), "off".to_string()],
                        },
                        EventAction::PlaySound {
                            sound: "lever_click".to_string(),
                        },
                    ],
                },
                EventBinding {
                    trigger: EventTrigger::OnStateChange,
                    actions: vec![EventAction::TriggerEvent { event: trigger }],
                },
                hover_highlight(),
            ],
        });
        Ok(lever)
    }

    fn chest_object(
        &self,
        index: usize,
        spec: &InteractiveObject,
        style: Option<&str>,
    ) -> Result<ObjectDefinition, ComposeError> {
        let machine = chest_machine();
        validate_machine(&machine)?;

        let loot_table = spec.loot_table.clone().unwrap_or_else(|| "common".to_string());
        let mut chest = interactive_base(format!("chest_{index}"), spec);
        chest.model = Some(self.resolve_model("chest", style.or(spec.style.as_deref())));
        chest.interaction = Some(Interaction {
            kind: InteractionKind::Chest,
            machine,
            variables: HashMap::from([
                ("is_locked".to_string(), Value::Bool(spec.locked)),
                ("loot_table".to_string(), Value::String(loot_table.clone())),
            ]),
            highlight: true,
            events: vec![
                EventBinding {
                    trigger: EventTrigger::OnClick,
                    actions: vec![EventAction::CheckCondition {
                        condition: "is_locked".to_string(),
                        success: Box::new(EventAction::PlaySound {
                            sound: "chest_locked".to_string(),
                        }),
                        failure: Box::new(EventAction::ChangeState {
                            target: "opening".to_string(),
                        }),
                    }],
                },
                EventBinding {
                    trigger: EventTrigger::OnStateChange,
                    actions: vec![EventAction::GenerateLoot { table: loot_table }],
                },
                hover_highlight(),
            ],
        });
        Ok(chest)
    }

    fn button_object(
        &self,
        index: usize,
        spec: &InteractiveObject,
        style: Option<&str>,
    ) -> Result<ObjectDefinition, ComposeError> {
        let machine = button_machine(spec.position);
        validate_machine(&machine)?;

        let trigger = spec.trigger_event.clone().unwrap_or_else(|| "none".to_string());
        let mut button = interactive_base(format!("button_{index}"), spec);
        button.model = Some(self.resolve_model("button", style.or(spec.style.as_deref())));
        button.interaction = Some(Interaction {
            kind: InteractionKind::Button,
            machine,
            variables: HashMap::new(),
            highlight: true,
            events: vec![
                EventBinding {
                    trigger: EventTrigger::OnClick,
                    actions: vec![
                        EventAction::ChangeState {
                            target: "down".to_string(),
                        },
                        EventAction::TriggerEvent { event: trigger },
                        EventAction::PlaySound {
                            sound: "button_click".to_string(),
                        },
                    ],
                },
                hover_highlight(),
            ],
        });
        Ok(button)
    }
}

impl SceneComposerBuilder {
    pub fn templates_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.templates_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn patterns_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.patterns_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Provide templates directly (for testing without files).
    pub fn with_templates(mut self, templates: TemplateStore) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Provide patterns directly (for testing without files).
    pub fn with_patterns(mut self, patterns: PatternLibrary) -> Self {
        self.patterns = Some(patterns);
        self
    }

    pub fn location_provider(mut self, provider: impl LocationProvider + 'static) -> Self {
        self.locations = Some(Box::new(provider));
        self
    }

    pub fn asset_resolver(mut self, resolver: impl AssetResolver + 'static) -> Self {
        self.assets = Some(Box::new(resolver));
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<SceneComposer, ComposeError> {
        let mut templates = self.templates.unwrap_or_default();
        let mut patterns = self.patterns.unwrap_or_default();

        if let Some(dir) = &self.templates_dir {
            if dir.exists() {
                templates.merge(TemplateStore::load_dir(dir)?);
            }
        }
        if let Some(dir) = &self.patterns_dir {
            if dir.exists() {
                patterns.merge(PatternLibrary::load_dir(dir)?);
            }
        }

        Ok(SceneComposer {
            templates,
            patterns,
            locations: self.locations.unwrap_or_else(|| Box::new(NullLocations)),
            assets: self.assets.unwrap_or_else(|| Box::new(NullAssets)),
            seed: self.seed,
            scenes: Mutex::new(FxHashMap::default()),
            next_scene: AtomicU64::new(0),
        })
    }
}

/// Append an object, bump-suffixing its name if a user-supplied object
/// already took it. Generated numbering never collides silently.
fn insert_object(scene: &mut SceneDefinition, mut obj: ObjectDefinition) {
    if scene.has_object(&obj.name) {
        let base = obj.name.clone();
        let mut n = 2;
        while scene.has_object(&format!("{base}_{n}")) {
            n += 1;
        }
        log::warn!("object name `{base}` already taken; renamed to `{base}_{n}`");
        obj.name = format!("{base}_{n}");
    }
    scene.objects.push(obj);
}

fn interactive_base(name: String, spec: &InteractiveObject) -> ObjectDefinition {
    let mut obj = ObjectDefinition::named(name);
    obj.position = spec.position;
    obj.cast_shadows = true;
    obj.receive_shadows = true;
    obj.interactive = true;
    obj
}

fn hover_highlight() -> EventBinding {
    EventBinding {
        trigger: EventTrigger::OnHover,
        actions: vec![EventAction::Highlight { intensity: 0.5 }],
    }
}

fn pose_state(name: &str, transitions: Vec<(&str, Transition)>, keyframes: Vec<Keyframe>) -> AnimationState {
    AnimationState {
        name: name.to_string(),
        duration: 0.0,
        keyframes,
        transitions: transitions
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        conditions: None,
    }
}

fn transition(target: &str, duration: f32, easing: Easing) -> Transition {
    Transition {
        target: target.to_string(),
        duration,
        easing,
        conditions: None,
    }
}

fn door_machine() -> StateMachine {
    StateMachine {
        states: vec![
            pose_state(
                "closed",
                vec![("opening", transition("open", 1.0, Easing::EaseInOutQuad))],
                vec![Keyframe::at(0.0).rotation(Vec3::ZERO)],
            ),
            pose_state(
                "open",
                vec![("closing", transition("closed", 1.0, Easing::EaseInOutQuad))],
                vec![Keyframe::at(0.0).rotation(Vec3::new(0.0, FRAC_PI_2, 0.0))],
            ),
        ],
        initial: "closed".to_string(),
    }
}

fn lever_machine() -> StateMachine {
    StateMachine {
        states: vec![
            pose_state(
                "off",
                vec![("activate", transition("on", 0.5, Easing::EaseOutBounce))],
                vec![Keyframe::at(0.0).rotation(Vec3::ZERO)],
            ),
            pose_state(
                "on",
                vec![("deactivate", transition("off", 0.5, Easing::EaseOutBounce))],
                vec![Keyframe::at(0.0).rotation(Vec3::new(0.0, 0.0, -FRAC_PI_3))],
            ),
        ],
        initial: "off".to_string(),
    }
}

fn chest_machine() -> StateMachine {
    let mut open = transition("opening", 0.5, Easing::Linear);
    open.conditions = Some(HashMap::from([(
        "is_locked".to_string(),
        Value::Bool(false),
    )]));

    let mut opening = pose_state(
        "opening",
        vec![("complete", transition("open", 0.0, Easing::Linear))],
        vec![
            Keyframe::at(0.0)
                .rotation(Vec3::ZERO)
                .easing(Easing::EaseOutQuad),
            Keyframe::at(0.5)
                .rotation(Vec3::new(-FRAC_PI_3, 0.0, 0.0))
                .easing(Easing::EaseOutBounce),
        ],
    );
    opening.duration = 0.5;

    StateMachine {
        states: vec![
            pose_state(
                "closed",
                vec![("open", open)],
                vec![Keyframe::at(0.0).rotation(Vec3::ZERO)],
            ),
            opening,
            pose_state(
                "open",
                vec![("close", transition("closed", 0.3, Easing::EaseInQuad))],
                vec![Keyframe::at(0.0).rotation(Vec3::new(-FRAC_PI_3, 0.0, 0.0))],
            ),
        ],
        initial: "closed".to_string(),
    }
}

fn button_machine(position: Vec3) -> StateMachine {
    let mut down = pose_state(
        "down",
        vec![("release", transition("up", 0.2, Easing::Linear))],
        vec![Keyframe::at(0.0)
            .position(position - Vec3::new(0.0, 0.05, 0.0))
            .easing(Easing::EaseOutElastic)],
    );
    down.duration = 0.2;

    StateMachine {
        states: vec![
            pose_state(
                "up",
                vec![("press", transition("down", 0.1, Easing::EaseInQuad))],
                vec![Keyframe::at(0.0).position(position)],
            ),
            down,
        ],
        initial: "up".to_string(),
    }
}

fn add_ambient_life(scene: &mut SceneDefinition, location: &LocationData) {
    for particle in &location.ambient.particles {
        let system = match particle {
            ParticleKind::Dust => ParticleSystem {
                system: ParticleKind::Dust,
                count: 1000,
                size: 0.02,
                color: Color(0xcccccc),
                opacity: 0.3,
                velocity: Vec3::new(0.0, -0.01, 0.0),
                lifetime: None,
            },
            ParticleKind::Embers => ParticleSystem {
                system: ParticleKind::Embers,
                count: 50,
                size: 0.05,
                color: Color(0xff4400),
                opacity: 0.6,
                velocity: Vec3::new(0.0, 0.05, 0.0),
                lifetime: Some((1.0, 3.0)),
            },
        };
        scene.effects.push(Effect::Particles(system));
    }
}

fn add_environment_effects(scene: &mut SceneDefinition, location: &LocationData) {
    use crate::schema::location::LocationKind;

    match location.kind {
        LocationKind::Dungeon => {
            scene.environment.fog = Some(Fog::exponential(Color(0x222222), 0.05));
        }
        LocationKind::Cave => {
            scene.environment.fog = Some(Fog::exponential(Color(0x111111), 0.08));
        }
        LocationKind::Forest | LocationKind::Town | LocationKind::Ruins => {}
    }

    if location.has_decoration(DecorationKind::Torch) {
        scene.effects.push(Effect::VolumetricLight {
            density: 0.05,
            decay: 0.95,
            weight: 0.5,
        });
    }

    for sound in &location.ambient.sounds {
        scene.environment.sounds.push(AmbientSound {
            name: sound.clone(),
            volume: 0.5,
            looped: true,
            spatial: true,
        });
    }
}

fn apply_quality(scene: &mut SceneDefinition, settings: &QualitySettings) {
    for light in &mut scene.lights {
        if matches!(light.kind, LightKind::Directional | LightKind::Spot) {
            light.cast_shadows = settings.shadows;
            light.shadow_map_size = settings.shadow_map_size;
        }
    }
    if settings.ambient_occlusion {
        scene.effects.push(Effect::Ssao {
            radius: 4.0,
            intensity: 1.5,
        });
    }
    if settings.bloom {
        scene.effects.push(Effect::Bloom {
            intensity: 1.0,
            threshold: 0.85,
        });
    }
}

fn fallback_texture(kind: &str) -> Option<&'static str> {
    match kind {
        "terrain_cracks" => Some("generic_cracks"),
        "terrain_cracks_normal" | "terrain_moss_normal" => Some("generic_normal"),
        "terrain_cracks_roughness" => Some("generic_roughness"),
        "terrain_moss" => Some("generic_moss"),
        _ => None,
    }
}
