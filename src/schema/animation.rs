/// Animation data model — keyframes, states, sequences, and chains.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::scene::Color;

/// A dynamic value bound to an animation instance or checked by a
/// transition condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Easing curve applied to a keyframe or transition.
///
/// Serialized with the camelCase names renderers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "easeInQuad")]
    EaseInQuad,
    #[serde(rename = "easeOutQuad")]
    EaseOutQuad,
    #[serde(rename = "easeInOutQuad")]
    EaseInOutQuad,
    #[serde(rename = "easeOutBounce")]
    EaseOutBounce,
    #[serde(rename = "easeOutElastic")]
    EaseOutElastic,
}

impl Default for Easing {
    fn default() -> Self {
        Self::Linear
    }
}

/// A time-stamped pose/appearance delta within an animation state.
///
/// Every channel is optional; consumers interpolate only the channels a
/// keyframe carries. `time` values are non-decreasing within a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    #[serde(default)]
    pub position: Option<Vec3>,
    #[serde(default)]
    pub rotation: Option<Vec3>,
    #[serde(default)]
    pub scale: Option<Vec3>,
    #[serde(default)]
    pub opacity: Option<f32>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    /// A pose-only keyframe at the given time.
    pub fn at(time: f32) -> Keyframe {
        Keyframe {
            time,
            position: None,
            rotation: None,
            scale: None,
            opacity: None,
            color: None,
            easing: Easing::Linear,
        }
    }

    pub fn rotation(mut self, rotation: Vec3) -> Keyframe {
        self.rotation = Some(rotation);
        self
    }

    pub fn position(mut self, position: Vec3) -> Keyframe {
        self.position = Some(position);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Keyframe {
        self.easing = easing;
        self
    }
}

/// An outgoing edge in a state's transition table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub target: String,
    #[serde(default)]
    pub duration: f32,
    #[serde(default)]
    pub easing: Easing,
    /// Gate checked against instance variables when the transition fires.
    #[serde(default)]
    pub conditions: Option<HashMap<String, Value>>,
}

/// A named animation state: keyframe payload plus outgoing transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub name: String,
    #[serde(default)]
    pub duration: f32,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    #[serde(default)]
    pub transitions: HashMap<String, Transition>,
    /// Gate checked against instance variables on state entry.
    #[serde(default)]
    pub conditions: Option<HashMap<String, Value>>,
}

impl AnimationState {
    /// Playback span of this state: the last keyframe timestamp, or the
    /// declared duration for pose-only states.
    pub fn span(&self) -> f32 {
        let keyframe_end = self.keyframes.last().map(|k| k.time).unwrap_or(0.0);
        keyframe_end.max(self.duration)
    }
}

/// A named set of states with a designated initial state.
///
/// Machines carry no current-state pointer themselves — each instance
/// (an interactive object, a chain stage) owns its own pointer; see
/// `core::animation::MachineInstance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    pub states: Vec<AnimationState>,
    pub initial: String,
}

impl StateMachine {
    /// Look up a state by name.
    pub fn state(&self, name: &str) -> Option<&AnimationState> {
        self.states.iter().find(|s| s.name == name)
    }
}

/// An element of a sequence: a state, or a nested sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceElement {
    State(AnimationState),
    Sequence(Box<AnimationSequence>),
}

impl SequenceElement {
    /// Playback span of this element.
    pub fn span(&self) -> f32 {
        match self {
            SequenceElement::State(state) => state.span(),
            SequenceElement::Sequence(seq) => seq.total_duration(),
        }
    }
}

/// An ordered, optionally looping run of animation states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSequence {
    pub name: String,
    pub animations: Vec<SequenceElement>,
    #[serde(default, rename = "loop")]
    pub looped: bool,
    #[serde(default)]
    pub transition_time: f32,
    /// Lifecycle hooks: hook name (e.g. "on_start", "on_complete") to
    /// game event name.
    #[serde(default)]
    pub events: HashMap<String, String>,
}

impl AnimationSequence {
    /// Duration of one full pass: the sum of element spans plus the
    /// transition time between consecutive elements.
    ///
    /// Looping sequences never terminate on their own; this is the
    /// duration of a single cycle.
    pub fn total_duration(&self) -> f32 {
        let spans: f32 = self.animations.iter().map(|a| a.span()).sum();
        let gaps = self.animations.len().saturating_sub(1) as f32;
        spans + gaps * self.transition_time
    }
}

/// One stage of a chain: sequence references plus activation conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStage {
    /// Names of registered sequences dispatched when this stage activates.
    #[serde(default)]
    pub animations: Vec<String>,
    /// Variables that must match for the stage to become eligible.
    #[serde(default)]
    pub conditions: HashMap<String, Value>,
}

/// A staged animation structure with conditional advancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationChain {
    pub name: String,
    pub stages: Vec<ChainStage>,
    /// When true, every eligible stage may be active at once; when false,
    /// stages dispatch strictly in order.
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub events: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_state(name: &str, span: f32) -> AnimationState {
        AnimationState {
            name: name.to_string(),
            duration: 0.0,
            keyframes: vec![Keyframe::at(0.0), Keyframe::at(span)],
            transitions: HashMap::new(),
            conditions: None,
        }
    }

    #[test]
    fn state_span_uses_last_keyframe() {
        let state = pose_state("wave", 1.5);
        assert_eq!(state.span(), 1.5);
    }

    #[test]
    fn state_span_falls_back_to_duration() {
        let state = AnimationState {
            name: "hold".to_string(),
            duration: 0.75,
            keyframes: vec![Keyframe::at(0.0)],
            transitions: HashMap::new(),
            conditions: None,
        };
        assert_eq!(state.span(), 0.75);
    }

    #[test]
    fn sequence_total_duration_includes_transition_gaps() {
        let seq = AnimationSequence {
            name: "sweep".to_string(),
            animations: vec![
                SequenceElement::State(pose_state("a", 1.0)),
                SequenceElement::State(pose_state("b", 2.0)),
                SequenceElement::State(pose_state("c", 0.5)),
            ],
            looped: false,
            transition_time: 0.25,
            events: HashMap::new(),
        };
        assert!((seq.total_duration() - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn nested_sequence_span() {
        let inner = AnimationSequence {
            name: "inner".to_string(),
            animations: vec![SequenceElement::State(pose_state("a", 1.0))],
            looped: false,
            transition_time: 0.0,
            events: HashMap::new(),
        };
        let outer = AnimationSequence {
            name: "outer".to_string(),
            animations: vec![
                SequenceElement::Sequence(Box::new(inner)),
                SequenceElement::State(pose_state("b", 1.0)),
            ],
            looped: false,
            transition_time: 0.5,
            events: HashMap::new(),
        };
        assert!((outer.total_duration() - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn easing_serializes_camel_case() {
        let json = serde_json::to_string(&Easing::EaseInOutQuad).unwrap();
        assert_eq!(json, "\"easeInOutQuad\"");
    }

    #[test]
    fn keyframe_from_json_defaults() {
        let kf: Keyframe = serde_json::from_str(r#"{"time": 0.5}"#).unwrap();
        assert_eq!(kf.time, 0.5);
        assert!(kf.position.is_none());
        assert_eq!(kf.easing, Easing::Linear);
    }

    #[test]
    fn value_untagged_round_trip() {
        let vars: HashMap<String, Value> = serde_json::from_str(
            r#"{"is_locked": false, "loot_table": "common", "uses": 3}"#,
        )
        .unwrap();
        assert_eq!(vars["is_locked"], Value::Bool(false));
        assert_eq!(vars["loot_table"], Value::String("common".to_string()));
        assert_eq!(vars["uses"], Value::Int(3));
    }

    #[test]
    fn sequence_loop_field_renames() {
        let seq: AnimationSequence = serde_json::from_str(
            r#"{"name": "flicker", "animations": [], "loop": true}"#,
        )
        .unwrap();
        assert!(seq.looped);
    }
}
