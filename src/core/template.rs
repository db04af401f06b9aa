/// Scene template store — loading, lookup, and inheritance resolution.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::substitute::Params;
use crate::schema::animation::{AnimationChain, AnimationSequence};
use crate::schema::scene::{CameraDefinition, Environment, LightDefinition, ObjectDefinition};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("circular template inheritance at `{0}`")]
    CircularInheritance(String),
}

/// A template-declared animation: a sequence or a chain definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateAnimation {
    Sequence(AnimationSequence),
    Chain(AnimationChain),
}

/// A pattern applied by a template: the pattern name plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternInvocation {
    pub name: String,
    #[serde(default)]
    pub parameters: Params,
}

/// A named, inheritable blueprint for a scene's base content.
///
/// Templates are immutable after load; inheritance is resolved lazily at
/// lookup time, so edits to a base template propagate to children on the
/// next lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SceneTemplate {
    pub name: String,
    #[serde(default)]
    pub base_template: Option<String>,
    #[serde(default)]
    pub objects: Vec<ObjectDefinition>,
    #[serde(default)]
    pub lights: Vec<LightDefinition>,
    #[serde(default)]
    pub camera: Option<CameraDefinition>,
    #[serde(default)]
    pub environment: Option<Environment>,
    #[serde(default)]
    pub animations: Vec<TemplateAnimation>,
    #[serde(default)]
    pub patterns: Vec<PatternInvocation>,
    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,
}

/// The set of raw templates, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: FxHashMap<String, SceneTemplate>,
}

impl TemplateStore {
    pub fn new() -> TemplateStore {
        TemplateStore::default()
    }

    /// Load every `*.json` template in a directory.
    ///
    /// Files that fail to parse are logged and skipped — a bad template
    /// leaves its entry absent rather than failing startup.
    pub fn load_dir(dir: &Path) -> Result<TemplateStore, TemplateError> {
        let mut store = TemplateStore::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let contents = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("skipping template {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_str::<SceneTemplate>(&contents) {
                Ok(template) => {
                    store.insert(template);
                }
                Err(e) => {
                    log::error!("skipping template {}: {}", path.display(), e);
                }
            }
        }
        log::info!("loaded {} scene templates", store.templates.len());
        Ok(store)
    }

    pub fn insert(&mut self, template: SceneTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Merge another store into this one. Templates from `other`
    /// override same-named templates in `self`.
    pub fn merge(&mut self, other: TemplateStore) {
        for (name, template) in other.templates {
            self.templates.insert(name, template);
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// The raw (unmerged) template, if present.
    pub fn raw(&self, name: &str) -> Option<&SceneTemplate> {
        self.templates.get(name)
    }

    /// Look up a template and resolve its inheritance chain.
    ///
    /// A name missing at any point in the chain yields `Ok(None)` — no
    /// partial result. A self- or mutually-referential chain is a
    /// structural error.
    pub fn resolve(&self, name: &str) -> Result<Option<SceneTemplate>, TemplateError> {
        let mut seen = FxHashSet::default();
        self.resolve_inner(name, &mut seen)
    }

    fn resolve_inner(
        &self,
        name: &str,
        seen: &mut FxHashSet<String>,
    ) -> Result<Option<SceneTemplate>, TemplateError> {
        if !seen.insert(name.to_string()) {
            return Err(TemplateError::CircularInheritance(name.to_string()));
        }
        let Some(template) = self.templates.get(name) else {
            return Ok(None);
        };
        let Some(base_name) = &template.base_template else {
            return Ok(Some(template.clone()));
        };
        match self.resolve_inner(base_name, seen)? {
            Some(base) => Ok(Some(merge_templates(&base, template))),
            None => {
                log::warn!(
                    "template `{}` inherits missing base `{}`",
                    name,
                    base_name
                );
                Ok(None)
            }
        }
    }
}

/// Merge a resolved base under a child: the child's non-empty value wins
/// per section, and `variables` union key-wise with child precedence.
fn merge_templates(base: &SceneTemplate, child: &SceneTemplate) -> SceneTemplate {
    let mut variables = base.variables.clone();
    variables.extend(child.variables.iter().map(|(k, v)| (k.clone(), v.clone())));

    SceneTemplate {
        name: child.name.clone(),
        base_template: child.base_template.clone(),
        objects: pick_vec(&child.objects, &base.objects),
        lights: pick_vec(&child.lights, &base.lights),
        camera: child.camera.clone().or_else(|| base.camera.clone()),
        environment: child.environment.clone().or_else(|| base.environment.clone()),
        animations: pick_vec(&child.animations, &base.animations),
        patterns: pick_vec(&child.patterns, &base.patterns),
        variables,
    }
}

fn pick_vec<T: Clone>(child: &[T], base: &[T]) -> Vec<T> {
    if child.is_empty() {
        base.to_vec()
    } else {
        child.to_vec()
    }
}
