//! Minimal end-to-end demo: compose a dungeon room and print what the
//! renderer would receive.
//!
//! Run with: cargo run --example dungeon_room

use scene_engine::core::composer::{SceneComposer, SceneRequest, StaticAssets, StaticLocations};
use scene_engine::schema::location::{LocationData, LocationId};
use scene_engine::schema::quality::QualityTier;

fn main() {
    env_logger::init();

    let location: LocationData = serde_json::from_str(
        r#"{
            "type": "dungeon",
            "size": {"width": 30.0, "length": 30.0, "height": 8.0},
            "terrain": {"type": "stone", "roughness": 0.7, "features": ["moss"]},
            "architecture": {
                "style": "gothic",
                "elements": [
                    {"type": "wall", "waypoints": [[-8.0, -8.0], [8.0, -8.0]]}
                ]
            },
            "decorations": [
                {"type": "torch", "positions": [[-4.0, -7.5], [4.0, -7.5]]}
            ],
            "interactive": [
                {"type": "chest", "position": [3.0, 0.5, 4.0], "locked": true}
            ],
            "ambient": {"particles": ["dust"], "sounds": ["dripping_water"]}
        }"#,
    )
    .expect("demo location");

    let mut locations = StaticLocations::new();
    locations.insert(LocationId("demo".to_string()), location);

    let mut assets = StaticAssets::new();
    assets.insert_model("torch:gothic", scene_engine::schema::scene::AssetId("model_torch_gothic".to_string()));
    assets.insert_texture("terrain_moss", scene_engine::schema::scene::AssetId("tex_moss".to_string()));

    let composer = SceneComposer::builder()
        .templates_dir("scene_data/templates")
        .patterns_dir("scene_data/patterns")
        .location_provider(locations)
        .asset_resolver(assets)
        .seed(7)
        .build()
        .expect("composer");

    let request = SceneRequest::new(
        LocationId("demo".to_string()),
        "dungeon_room",
        QualityTier::High,
    );
    let response = composer.generate(&request).expect("scene generation");

    println!(
        "generated {} with {} objects, {} lights, {} effects",
        response.scene_id,
        response.scene.objects.len(),
        response.scene.lights.len(),
        response.scene.effects.len()
    );
    println!("assets to preload:");
    for asset in &response.assets_required {
        println!("  {}", asset.0);
    }
}
