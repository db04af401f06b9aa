/// Shipped-content integration tests — the scene_data templates and
/// patterns must load, cross-reference, and fully resolve.

use scene_engine::core::animation::AnimationSystem;
use scene_engine::core::pattern::{Pattern, PatternLibrary};
use scene_engine::core::substitute::{substitute_strict, unresolved_tokens, Params};
use scene_engine::core::template::{TemplateAnimation, TemplateStore};
use std::path::Path;

fn load_templates() -> TemplateStore {
    TemplateStore::load_dir(Path::new("scene_data/templates")).unwrap()
}

fn load_patterns() -> PatternLibrary {
    PatternLibrary::load_dir(Path::new("scene_data/patterns")).unwrap()
}

#[test]
fn shipped_templates_load() {
    let store = load_templates();
    for name in ["dungeon_base", "dungeon_room", "cavern"] {
        assert!(store.contains(name), "missing template: {name}");
    }
}

#[test]
fn shipped_patterns_load() {
    let library = load_patterns();
    for name in ["gate_pillars", "wall_banner", "door_swing"] {
        assert!(library.contains(name), "missing pattern: {name}");
    }
}

#[test]
fn dungeon_room_inherits_base_sections() {
    let store = load_templates();
    let room = store.resolve("dungeon_room").unwrap().unwrap();

    // Camera, lights, and environment come from dungeon_base.
    assert!(room.camera.is_some());
    assert_eq!(room.lights.len(), 2);
    assert!(room.environment.is_some());
    // Variables merged down from the base.
    assert!(room.variables.contains_key("banner_color"));
    // The child's own pattern invocations survive the merge.
    assert_eq!(room.patterns.len(), 2);
}

#[test]
fn cavern_overrides_environment() {
    let store = load_templates();
    let cavern = store.resolve("cavern").unwrap().unwrap();
    let environment = cavern.environment.unwrap();
    assert!(environment.fog.is_some());
}

#[test]
fn every_template_invocation_references_a_shipped_pattern() {
    let store = load_templates();
    let library = load_patterns();

    for name in store.names() {
        let template = store.resolve(name).unwrap().unwrap();
        for invocation in &template.patterns {
            assert!(
                library.contains(&invocation.name),
                "template `{}` invokes missing pattern `{}`",
                name,
                invocation.name
            );
        }
    }
}

#[test]
fn no_invocation_leaves_unresolved_tokens() {
    // Strict substitution over every shipped invocation: template
    // variables plus invocation parameters must cover every `$token`
    // the pattern declares, so no placeholder can leak into a scene.
    let store = load_templates();
    let library = load_patterns();

    for name in store.names() {
        let template = store.resolve(name).unwrap().unwrap();
        for invocation in &template.patterns {
            let pattern = library.get(&invocation.name).unwrap();
            let mut params: Params = template.variables.clone();
            params.extend(invocation.parameters.clone());

            let specs = match pattern {
                Pattern::ObjectGroup { objects, .. } => objects,
                Pattern::AnimationSequence { animations, .. } => animations,
            };
            for spec in specs {
                let resolved = substitute_strict(spec, &params).unwrap_or_else(|e| {
                    panic!(
                        "template `{}` + pattern `{}`: {}",
                        name, invocation.name, e
                    )
                });
                assert!(unresolved_tokens(&resolved).is_empty());
            }
        }
    }
}

#[test]
fn shipped_template_animations_validate() {
    let store = load_templates();
    let cavern = store.resolve("cavern").unwrap().unwrap();
    assert!(!cavern.animations.is_empty());

    let mut system = AnimationSystem::new();
    for animation in &cavern.animations {
        match animation {
            TemplateAnimation::Sequence(seq) => {
                system.register_sequence(seq.clone()).unwrap();
            }
            TemplateAnimation::Chain(chain) => {
                system.register_chain(chain.clone()).unwrap();
            }
        }
    }
    let drip = system.sequence("drip_cycle").unwrap();
    assert!(drip.looped);
    // Two states of 1.2s and 0.5s with one 0.4s gap.
    assert!((drip.total_duration() - 2.1).abs() < 1e-5);
}
