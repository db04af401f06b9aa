/// Scene Linter — validates template and pattern content.
///
/// Usage: scene_linter [<scene_data_dir>]
///
/// Checks that every template resolves (no broken or circular
/// inheritance), every pattern invocation references a loaded pattern
/// and fully resolves its `$tokens`, and every template animation passes
/// structural validation.

use scene_engine::core::animation::AnimationSystem;
use scene_engine::core::pattern::{Pattern, PatternLibrary};
use scene_engine::core::substitute::{substitute_strict, Params};
use scene_engine::core::template::{TemplateAnimation, TemplateStore};
use std::collections::HashSet;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        println!("Usage: scene_linter [<scene_data_dir>]");
        process::exit(0);
    }

    let data_dir = args.get(1).map(String::as_str).unwrap_or("scene_data");
    let templates_dir = Path::new(data_dir).join("templates");
    let patterns_dir = Path::new(data_dir).join("patterns");

    let templates = match TemplateStore::load_dir(&templates_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("ERROR: failed to load templates from {}: {}", templates_dir.display(), e);
            process::exit(1);
        }
    };
    let patterns = match PatternLibrary::load_dir(&patterns_dir) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("ERROR: failed to load patterns from {}: {}", patterns_dir.display(), e);
            process::exit(1);
        }
    };

    println!("Loaded {} templates, {} patterns", templates.len(), patterns.len());

    let (errors, warnings) = lint(&templates, &patterns);

    println!("\n=== Scene Content Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }
    for warning in &warnings {
        println!("WARNING: {}", warning);
    }
    for error in &errors {
        println!("ERROR: {}", error);
    }
    println!(
        "\n{} error(s), {} warning(s)",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        process::exit(1);
    }
}

fn lint(templates: &TemplateStore, patterns: &PatternLibrary) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut invoked: HashSet<String> = HashSet::new();

    let mut names: Vec<&str> = templates.names().collect();
    names.sort();

    for name in names {
        let resolved = match templates.resolve(name) {
            Ok(Some(t)) => t,
            Ok(None) => {
                errors.push(format!(
                    "template `{}` does not resolve (missing base in its inheritance chain)",
                    name
                ));
                continue;
            }
            Err(e) => {
                errors.push(format!("template `{}`: {}", name, e));
                continue;
            }
        };

        for invocation in &resolved.patterns {
            invoked.insert(invocation.name.clone());
            let Some(pattern) = patterns.get(&invocation.name) else {
                errors.push(format!(
                    "template `{}` invokes missing pattern `{}`",
                    name, invocation.name
                ));
                continue;
            };

            let mut params: Params = resolved.variables.clone();
            params.extend(invocation.parameters.clone());

            let specs = match pattern {
                Pattern::ObjectGroup { objects, .. } => objects,
                Pattern::AnimationSequence { animations, .. } => animations,
            };
            for spec in specs {
                if let Err(e) = substitute_strict(spec, &params) {
                    errors.push(format!(
                        "template `{}` + pattern `{}`: {}",
                        name, invocation.name, e
                    ));
                }
            }
        }

        let mut system = AnimationSystem::new();
        for animation in &resolved.animations {
            let result = match animation {
                TemplateAnimation::Sequence(seq) => system.register_sequence(seq.clone()),
                TemplateAnimation::Chain(chain) => system.register_chain(chain.clone()),
            };
            if let Err(e) = result {
                errors.push(format!("template `{}`: {}", name, e));
            }
        }
    }

    let mut pattern_names: Vec<&str> = patterns.names().collect();
    pattern_names.sort();
    for name in pattern_names {
        if !invoked.contains(name) {
            warnings.push(format!(
                "pattern `{}` is not invoked by any template",
                name
            ));
        }
    }

    (errors, warnings)
}
