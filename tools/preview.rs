/// Scene Preview — generate a scene from a template and dump a summary.
///
/// Usage: preview <template> [--seed <n>] [--quality <tier>] [--json]
///
/// Uses a built-in demo dungeon location so the full layer stack runs
/// without a world service.

use scene_engine::core::composer::{SceneComposer, SceneRequest, StaticLocations};
use scene_engine::schema::location::{LocationData, LocationId};
use scene_engine::schema::quality::QualityTier;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: preview <template> [--seed <n>] [--quality <tier>] [--json]");
        process::exit(0);
    }

    let template = args[1].clone();
    let mut seed = 42u64;
    let mut quality = QualityTier::Medium;
    let mut as_json = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("ERROR: invalid seed '{}'", args[i]);
                    process::exit(1);
                });
            }
            "--quality" if i + 1 < args.len() => {
                i += 1;
                quality = args[i].parse().unwrap_or_else(|e| {
                    eprintln!("ERROR: {}", e);
                    process::exit(1);
                });
            }
            "--json" => as_json = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut locations = StaticLocations::new();
    locations.insert(LocationId("demo".to_string()), demo_location());

    let composer = SceneComposer::builder()
        .templates_dir("scene_data/templates")
        .patterns_dir("scene_data/patterns")
        .location_provider(locations)
        .seed(seed)
        .build()
        .unwrap_or_else(|e| {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        });

    let request = SceneRequest::new(LocationId("demo".to_string()), template, quality);
    let response = match composer.generate(&request) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    if as_json {
        match serde_json::to_string_pretty(&response.scene) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let scene = &response.scene;
    println!("Scene {}", scene.id);
    println!("  objects: {}", scene.objects.len());
    println!("  lights:  {}", scene.lights.len());
    println!("  effects: {}", scene.effects.len());
    println!(
        "  fog:     {}",
        if scene.environment.fog.is_some() { "yes" } else { "no" }
    );
    println!("  assets:  {}", response.assets_required.len());
    println!();
    for obj in &scene.objects {
        let marker = if obj.interactive { "*" } else { " " };
        println!(
            " {} {} @ ({:.1}, {:.1}, {:.1})",
            marker, obj.name, obj.position.x, obj.position.y, obj.position.z
        );
    }
}

fn demo_location() -> LocationData {
    serde_json::from_str(
        r#"{
            "type": "dungeon",
            "size": {"width": 50.0, "length": 50.0, "height": 10.0},
            "terrain": {"type": "stone", "roughness": 0.7, "features": ["cracks", "moss"]},
            "architecture": {
                "style": "gothic",
                "elements": [
                    {"type": "wall", "waypoints": [[-10.0, -10.0], [10.0, -10.0], [10.0, 10.0]]},
                    {"type": "pillar", "waypoints": [[-5.0, -5.0], [5.0, -5.0]]}
                ]
            },
            "decorations": [
                {"type": "torch", "positions": [[-8.0, -9.5], [8.0, -9.5]]},
                {"type": "barrel", "positions": [[9.0, 8.0]]}
            ],
            "interactive": [
                {"type": "door", "position": [0.0, 0.0, -10.0]},
                {"type": "chest", "position": [5.0, 0.5, 8.0], "locked": true, "loot_table": "rare"},
                {"type": "lever", "position": [-9.5, 1.0, 0.0], "trigger_event": "open_gate"}
            ],
            "ambient": {"particles": ["dust", "embers"], "sounds": ["dripping_water"]}
        }"#,
    )
    .unwrap_or_else(|e| {
        eprintln!("ERROR: demo location is invalid: {}", e);
        process::exit(1);
    })
}
