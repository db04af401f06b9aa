/// Parameter substitution — rewrites `$token` placeholders in a JSON tree.
///
/// The production walk is tolerant: a token with no matching parameter is
/// left in place as its literal string, so a bad invocation degrades
/// instead of failing the whole scene. `substitute_strict` is the
/// everything-must-resolve variant for tests and the content linter.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Caller-supplied parameter values, keyed by bare token name.
pub type Params = HashMap<String, Value>;

/// Marker prefix identifying a placeholder string.
const TOKEN_MARKER: char = '$';

#[derive(Debug, Error)]
pub enum SubstituteError {
    #[error("unresolved parameter token `${0}`")]
    Unresolved(String),
}

/// The bare token name if `s` is a placeholder (`"$radius"` → `"radius"`).
pub fn token_name(s: &str) -> Option<&str> {
    s.strip_prefix(TOKEN_MARKER).filter(|rest| !rest.is_empty())
}

/// Replace every `$token` string leaf with its parameter value.
///
/// Recurses into objects and arrays; non-string scalars pass through.
/// A missing parameter leaves the literal placeholder untouched.
pub fn substitute(value: &Value, params: &Params) -> Value {
    match value {
        Value::String(s) => match token_name(s) {
            Some(name) => params.get(name).cloned().unwrap_or_else(|| value.clone()),
            None => value.clone(),
        },
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| substitute(v, params)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, params)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Like `substitute`, but an unresolved token is an error.
pub fn substitute_strict(value: &Value, params: &Params) -> Result<Value, SubstituteError> {
    match value {
        Value::String(s) => match token_name(s) {
            Some(name) => params
                .get(name)
                .cloned()
                .ok_or_else(|| SubstituteError::Unresolved(name.to_string())),
            None => Ok(value.clone()),
        },
        Value::Array(items) => items
            .iter()
            .map(|v| substitute_strict(v, params))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| substitute_strict(v, params).map(|v| (k.clone(), v)))
            .collect::<Result<serde_json::Map<_, _>, _>>()
            .map(Value::Object),
        _ => Ok(value.clone()),
    }
}

/// Every placeholder token name surviving in `value`, in walk order.
///
/// Used by the linter and by tests asserting that no `$token` leaks into
/// generated output.
pub fn unresolved_tokens(value: &Value) -> Vec<String> {
    let mut tokens = Vec::new();
    collect_tokens(value, &mut tokens);
    tokens
}

fn collect_tokens(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if let Some(name) = token_name(s) {
                out.push(name.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_tokens(item, out);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                collect_tokens(v, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn replaces_string_token() {
        let value = json!({"name": "$prefix_pillar"});
        let out = substitute(&value, &params(&[("prefix_pillar", json!("north_pillar"))]));
        assert_eq!(out, json!({"name": "north_pillar"}));
    }

    #[test]
    fn token_can_carry_non_string_value() {
        let value = json!({"position": "$pos", "count": "$count"});
        let out = substitute(
            &value,
            &params(&[("pos", json!([1.0, 0.0, 2.0])), ("count", json!(4))]),
        );
        assert_eq!(out, json!({"position": [1.0, 0.0, 2.0], "count": 4}));
    }

    #[test]
    fn missing_parameter_leaves_literal() {
        let value = json!({"color": "$color"});
        let out = substitute(&value, &Params::new());
        assert_eq!(out, json!({"color": "$color"}));
    }

    #[test]
    fn recurses_into_nested_structures() {
        let value = json!({
            "objects": [
                {"material": {"color": "$color"}},
                {"material": {"color": "#ffffff"}}
            ]
        });
        let out = substitute(&value, &params(&[("color", json!("#2d4f1e"))]));
        assert_eq!(out["objects"][0]["material"]["color"], json!("#2d4f1e"));
        assert_eq!(out["objects"][1]["material"]["color"], json!("#ffffff"));
    }

    #[test]
    fn non_string_scalars_pass_through() {
        let value = json!({"time": 0.5, "loop": true, "label": null});
        assert_eq!(substitute(&value, &Params::new()), value);
    }

    #[test]
    fn bare_dollar_is_not_a_token() {
        let value = json!("$");
        assert_eq!(substitute(&value, &Params::new()), value);
        assert!(unresolved_tokens(&value).is_empty());
    }

    #[test]
    fn strict_mode_errors_on_miss() {
        let value = json!({"scale": "$size"});
        let err = substitute_strict(&value, &Params::new()).unwrap_err();
        assert!(matches!(err, SubstituteError::Unresolved(ref name) if name == "size"));
    }

    #[test]
    fn strict_mode_resolves_when_complete() {
        let value = json!({"scale": "$size"});
        let out = substitute_strict(&value, &params(&[("size", json!(2.0))])).unwrap();
        assert_eq!(out, json!({"scale": 2.0}));
    }

    #[test]
    fn unresolved_tokens_lists_survivors() {
        let value = json!({"a": "$one", "b": ["$two", {"c": "$three"}], "d": "plain"});
        let mut tokens = unresolved_tokens(&value);
        tokens.sort();
        assert_eq!(tokens, vec!["one", "three", "two"]);
    }
}
