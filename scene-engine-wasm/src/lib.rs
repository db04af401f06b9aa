//! WASM bindings for scene-engine — powers the interactive web demo.

use wasm_bindgen::prelude::*;

use scene_engine::core::composer::{SceneComposer, SceneRequest, StaticLocations};
use scene_engine::core::pattern::PatternLibrary;
use scene_engine::core::template::{SceneTemplate, TemplateStore};
use scene_engine::schema::location::{LocationData, LocationId};
use scene_engine::schema::quality::QualityTier;

// ---------------------------------------------------------------------------
// Embedded scene data — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const DUNGEON_BASE: &str = include_str!("../../scene_data/templates/dungeon_base.json");
    pub const DUNGEON_ROOM: &str = include_str!("../../scene_data/templates/dungeon_room.json");
    pub const CAVERN: &str = include_str!("../../scene_data/templates/cavern.json");

    pub const GATE_PILLARS: &str = include_str!("../../scene_data/patterns/gate_pillars.json");
    pub const WALL_BANNER: &str = include_str!("../../scene_data/patterns/wall_banner.json");
    pub const DOOR_SWING: &str = include_str!("../../scene_data/patterns/door_swing.json");

    /// The demo location driving the full layer stack in the browser.
    pub const DEMO_LOCATION: &str = r#"{
        "type": "dungeon",
        "size": {"width": 40.0, "length": 40.0, "height": 10.0},
        "terrain": {"type": "stone", "roughness": 0.7, "features": ["cracks", "moss"]},
        "architecture": {
            "style": "gothic",
            "elements": [
                {"type": "wall", "waypoints": [[-10.0, -10.0], [10.0, -10.0], [10.0, 10.0]]},
                {"type": "pillar", "waypoints": [[-5.0, -5.0], [5.0, -5.0]]}
            ]
        },
        "decorations": [
            {"type": "torch", "positions": [[-8.0, -9.5], [8.0, -9.5]]}
        ],
        "interactive": [
            {"type": "door", "position": [0.0, 0.0, -10.0]},
            {"type": "chest", "position": [5.0, 0.5, 8.0], "locked": true}
        ],
        "ambient": {"particles": ["dust"], "sounds": ["dripping_water"]}
    }"#;
}

fn parse_quality(s: &str) -> Result<QualityTier, JsError> {
    s.parse::<QualityTier>()
        .map_err(|e| JsError::new(&e.to_string()))
}

fn embedded_templates() -> Result<TemplateStore, JsError> {
    let mut store = TemplateStore::new();
    for raw in [data::DUNGEON_BASE, data::DUNGEON_ROOM, data::CAVERN] {
        let template: SceneTemplate =
            serde_json::from_str(raw).map_err(|e| JsError::new(&e.to_string()))?;
        store.insert(template);
    }
    Ok(store)
}

fn embedded_patterns() -> Result<PatternLibrary, JsError> {
    let mut library = PatternLibrary::new();
    for raw in [data::GATE_PILLARS, data::WALL_BANNER, data::DOOR_SWING] {
        let pattern =
            serde_json::from_str(raw).map_err(|e| JsError::new(&e.to_string()))?;
        library.insert(pattern);
    }
    Ok(library)
}

/// A composer over the embedded demo content, exposed to JavaScript.
#[wasm_bindgen]
pub struct WasmSceneComposer {
    composer: SceneComposer,
}

#[wasm_bindgen]
impl WasmSceneComposer {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<WasmSceneComposer, JsError> {
        let location: LocationData = serde_json::from_str(data::DEMO_LOCATION)
            .map_err(|e| JsError::new(&e.to_string()))?;
        let mut locations = StaticLocations::new();
        locations.insert(LocationId("demo".to_string()), location);

        let composer = SceneComposer::builder()
            .with_templates(embedded_templates()?)
            .with_patterns(embedded_patterns()?)
            .location_provider(locations)
            .seed(seed)
            .build()
            .map_err(|e| JsError::new(&e.to_string()))?;

        Ok(WasmSceneComposer { composer })
    }

    /// Template names available in the embedded content.
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .composer
            .templates()
            .names()
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    /// Generate a scene and return it as a JSON string, ready to feed a
    /// Three.js loader on the JS side.
    pub fn generate(&self, template: &str, quality: &str) -> Result<String, JsError> {
        let request = SceneRequest::new(
            LocationId("demo".to_string()),
            template,
            parse_quality(quality)?,
        );
        let response = self
            .composer
            .generate(&request)
            .map_err(|e| JsError::new(&e.to_string()))?;

        serde_json::to_string(&response.scene).map_err(|e| JsError::new(&e.to_string()))
    }

    /// The asset ids the most recent generation of `template` would need
    /// resolved, as a JSON array of strings.
    pub fn required_assets(&self, template: &str, quality: &str) -> Result<String, JsError> {
        let request = SceneRequest::new(
            LocationId("demo".to_string()),
            template,
            parse_quality(quality)?,
        );
        let response = self
            .composer
            .generate(&request)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let mut ids: Vec<&str> = response
            .assets_required
            .iter()
            .map(|id| id.0.as_str())
            .collect();
        ids.sort();
        serde_json::to_string(&ids).map_err(|e| JsError::new(&e.to_string()))
    }
}
