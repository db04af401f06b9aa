/// Pattern library — reusable parameterized scene fragments.

use glam::Vec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::animation::validate_state;
use crate::core::substitute::{substitute, Params};
use crate::schema::animation::AnimationState;
use crate::schema::scene::{ObjectDefinition, SceneDefinition};

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named, reusable fragment applied on top of a template.
///
/// Object and animation specs stay as raw JSON until application time so
/// `$token` placeholders can stand in for values of any type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Pattern {
    ObjectGroup {
        name: String,
        objects: Vec<serde_json::Value>,
    },
    AnimationSequence {
        name: String,
        animations: Vec<serde_json::Value>,
    },
}

impl Pattern {
    pub fn name(&self) -> &str {
        match self {
            Pattern::ObjectGroup { name, .. } => name,
            Pattern::AnimationSequence { name, .. } => name,
        }
    }
}

/// Rigid transform composed onto every object a pattern emits:
/// translation and rotation add, scale multiplies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PatternTransform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for PatternTransform {
    fn default() -> Self {
        PatternTransform {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl PatternTransform {
    fn apply(&self, obj: &mut ObjectDefinition) {
        obj.position += self.position;
        obj.rotation += self.rotation;
        obj.scale *= self.scale;
    }
}

/// The set of loaded patterns, keyed by name. Read-only after load.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: FxHashMap<String, Pattern>,
}

impl PatternLibrary {
    pub fn new() -> PatternLibrary {
        PatternLibrary::default()
    }

    /// Load every `*.json` pattern in a directory, with the same
    /// log-and-skip semantics as template loading.
    pub fn load_dir(dir: &Path) -> Result<PatternLibrary, PatternError> {
        let mut library = PatternLibrary::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let contents = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("skipping pattern {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_str::<Pattern>(&contents) {
                Ok(pattern) => {
                    library.insert(pattern);
                }
                Err(e) => {
                    log::error!("skipping pattern {}: {}", path.display(), e);
                }
            }
        }
        log::info!("loaded {} patterns", library.patterns.len());
        Ok(library)
    }

    pub fn insert(&mut self, pattern: Pattern) {
        self.patterns.insert(pattern.name().to_string(), pattern);
    }

    /// Merge another library into this one. Patterns from `other`
    /// override same-named patterns in `self`.
    pub fn merge(&mut self, other: PatternLibrary) {
        for (name, pattern) in other.patterns {
            self.patterns.insert(name, pattern);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.patterns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    /// Apply a pattern to a scene.
    ///
    /// An unknown pattern name warns and leaves the scene untouched; a
    /// spec that fails to deserialize after substitution (the usual sign
    /// of an unresolved `$token` in a typed position) is logged and
    /// skipped rather than failing the scene.
    pub fn apply(&self, scene: &mut SceneDefinition, name: &str, params: &Params) {
        let Some(pattern) = self.patterns.get(name) else {
            log::warn!("pattern not found: {name}");
            return;
        };
        match pattern {
            Pattern::ObjectGroup { objects, .. } => {
                apply_object_group(scene, name, objects, params);
            }
            Pattern::AnimationSequence { animations, .. } => {
                apply_animation_sequence(scene, name, animations, params);
            }
        }
    }
}

fn apply_object_group(
    scene: &mut SceneDefinition,
    pattern_name: &str,
    objects: &[serde_json::Value],
    params: &Params,
) {
    let transform = match params.get("transform") {
        Some(raw) => match serde_json::from_value::<PatternTransform>(raw.clone()) {
            Ok(t) => Some(t),
            Err(e) => {
                log::error!("pattern {pattern_name}: invalid transform: {e}");
                None
            }
        },
        None => None,
    };

    for spec in objects {
        let substituted = substitute(spec, params);
        match serde_json::from_value::<ObjectDefinition>(substituted) {
            Ok(mut obj) => {
                if let Some(t) = &transform {
                    t.apply(&mut obj);
                }
                scene.objects.push(obj);
            }
            Err(e) => {
                log::error!("pattern {pattern_name}: invalid object spec: {e}");
            }
        }
    }
}

fn apply_animation_sequence(
    scene: &mut SceneDefinition,
    pattern_name: &str,
    animations: &[serde_json::Value],
    params: &Params,
) {
    let targets: Vec<String> = match params.get("targets") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(t) => t,
            Err(e) => {
                log::error!("pattern {pattern_name}: invalid targets: {e}");
                return;
            }
        },
        None => return,
    };

    for target in &targets {
        if !scene.has_object(target) {
            continue;
        }
        for spec in animations {
            let substituted = substitute(spec, params);
            let state = match serde_json::from_value::<AnimationState>(substituted) {
                Ok(s) => s,
                Err(e) => {
                    log::error!("pattern {pattern_name}: invalid animation spec: {e}");
                    continue;
                }
            };
            if let Err(e) = validate_state(&state) {
                log::error!("pattern {pattern_name}: {e}");
                continue;
            }
            if let Some(obj) = scene.object_mut(target) {
                obj.animations.push(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::scene::SceneId;
    use serde_json::json;

    fn params_from(value: serde_json::Value) -> Params {
        serde_json::from_value(value).unwrap()
    }

    fn pillar_group() -> Pattern {
        serde_json::from_value(json!({
            "type": "object_group",
            "name": "pillar_group",
            "objects": [{
                "name": "$prefix",
                "geometry": {"type": "CylinderGeometry", "parameters": [0.4, 0.4, 4.0, 8.0]},
                "material": {"type": "MeshStandardMaterial", "color": "$color"},
                "position": "$position"
            }]
        }))
        .unwrap()
    }

    fn library_with(patterns: Vec<Pattern>) -> PatternLibrary {
        let mut library = PatternLibrary::new();
        for p in patterns {
            library.insert(p);
        }
        library
    }

    fn empty_scene() -> SceneDefinition {
        SceneDefinition::new(SceneId("scene_0".to_string()))
    }

    #[test]
    fn object_group_emits_substituted_objects() {
        let library = library_with(vec![pillar_group()]);
        let mut scene = empty_scene();
        library.apply(
            &mut scene,
            "pillar_group",
            &params_from(json!({
                "prefix": "north_pillar",
                "color": "#808080",
                "position": [5.0, 2.0, 5.0]
            })),
        );

        assert_eq!(scene.objects.len(), 1);
        let obj = &scene.objects[0];
        assert_eq!(obj.name, "north_pillar");
        assert_eq!(obj.position, Vec3::new(5.0, 2.0, 5.0));
    }

    #[test]
    fn identity_transform_is_a_no_op() {
        let library = library_with(vec![pillar_group()]);

        let mut plain = empty_scene();
        library.apply(
            &mut plain,
            "pillar_group",
            &params_from(json!({
                "prefix": "p", "color": "#808080", "position": [1.0, 2.0, 3.0]
            })),
        );

        let mut with_identity = empty_scene();
        library.apply(
            &mut with_identity,
            "pillar_group",
            &params_from(json!({
                "prefix": "p", "color": "#808080", "position": [1.0, 2.0, 3.0],
                "transform": {}
            })),
        );

        assert_eq!(plain.objects[0].position, with_identity.objects[0].position);
        assert_eq!(plain.objects[0].rotation, with_identity.objects[0].rotation);
        assert_eq!(plain.objects[0].scale, with_identity.objects[0].scale);
    }

    #[test]
    fn transform_composes_additively_and_multiplicatively() {
        let library = library_with(vec![pillar_group()]);
        let mut scene = empty_scene();
        library.apply(
            &mut scene,
            "pillar_group",
            &params_from(json!({
                "prefix": "p", "color": "#808080", "position": [1.0, 0.0, 1.0],
                "transform": {
                    "position": [10.0, 0.0, -2.0],
                    "rotation": [0.0, 1.5707964, 0.0],
                    "scale": [2.0, 2.0, 2.0]
                }
            })),
        );

        let obj = &scene.objects[0];
        assert_eq!(obj.position, Vec3::new(11.0, 0.0, -1.0));
        assert!((obj.rotation.y - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert_eq!(obj.scale, Vec3::splat(2.0));
    }

    #[test]
    fn unknown_pattern_is_a_warning_no_op() {
        let library = library_with(vec![]);
        let mut scene = empty_scene();
        library.apply(&mut scene, "missing", &Params::new());
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn unresolved_token_in_typed_position_skips_object() {
        let library = library_with(vec![pillar_group()]);
        let mut scene = empty_scene();
        // `position` stays "$position", which cannot deserialize as a vector.
        library.apply(
            &mut scene,
            "pillar_group",
            &params_from(json!({"prefix": "p", "color": "#808080"})),
        );
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn animation_pattern_targets_existing_objects() {
        let pattern: Pattern = serde_json::from_value(json!({
            "type": "animation_sequence",
            "name": "door_swing",
            "animations": [{
                "name": "opening",
                "duration": 0.5,
                "keyframes": [
                    {"time": 0.0, "rotation": [0.0, 0.0, 0.0]},
                    {"time": 0.5, "rotation": "$open_rotation"}
                ]
            }]
        }))
        .unwrap();
        let library = library_with(vec![pattern]);

        let mut scene = empty_scene();
        scene.objects.push(ObjectDefinition::named("door_0"));

        library.apply(
            &mut scene,
            "door_swing",
            &params_from(json!({
                "targets": ["door_0", "door_missing"],
                "open_rotation": [0.0, 1.5707964, 0.0]
            })),
        );

        let door = scene.object("door_0").unwrap();
        assert_eq!(door.animations.len(), 1);
        assert_eq!(door.animations[0].name, "opening");
        // The missing target was silently skipped.
        assert!(scene.object("door_missing").is_none());
    }

    #[test]
    fn animation_pattern_without_targets_is_a_no_op() {
        let pattern: Pattern = serde_json::from_value(json!({
            "type": "animation_sequence",
            "name": "sway",
            "animations": []
        }))
        .unwrap();
        let library = library_with(vec![pattern]);
        let mut scene = empty_scene();
        scene.objects.push(ObjectDefinition::named("banner"));
        library.apply(&mut scene, "sway", &Params::new());
        assert!(scene.object("banner").unwrap().animations.is_empty());
    }

    #[test]
    fn pattern_tag_round_trip() {
        let p = pillar_group();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "object_group");
        let back: Pattern = serde_json::from_value(json).unwrap();
        assert_eq!(back.name(), "pillar_group");
    }
}
