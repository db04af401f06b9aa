/// Animation runtime — structural validation, per-instance state
/// machines, chain controllers, and the sequence/chain registry.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::HashMap;
use thiserror::Error;

use crate::schema::animation::{
    AnimationChain, AnimationSequence, AnimationState, Easing, SequenceElement, StateMachine,
    Value,
};

#[derive(Debug, Error)]
pub enum AnimationError {
    #[error("state `{state}`: transition `{transition}` targets undefined state `{target}`")]
    UndefinedTarget {
        state: String,
        transition: String,
        target: String,
    },
    #[error("duplicate state name `{0}`")]
    DuplicateState(String),
    #[error("initial state `{0}` is not defined")]
    UndefinedInitial(String),
    #[error("state `{0}` has keyframes out of time order")]
    NonMonotonicKeyframes(String),
    #[error("chain `{chain}` stage {stage} references unknown sequence `{name}`")]
    UnknownSequence {
        chain: String,
        stage: usize,
        name: String,
    },
}

/// True when every condition key has an equal bound variable.
pub fn conditions_met(conditions: &HashMap<String, Value>, vars: &HashMap<String, Value>) -> bool {
    conditions
        .iter()
        .all(|(key, expected)| vars.get(key) == Some(expected))
}

/// Structural checks on one state: keyframe times must be non-decreasing
/// (playback relies on monotonicity).
pub fn validate_state(state: &AnimationState) -> Result<(), AnimationError> {
    let monotonic = state
        .keyframes
        .windows(2)
        .all(|pair| pair[0].time <= pair[1].time);
    if !monotonic {
        return Err(AnimationError::NonMonotonicKeyframes(state.name.clone()));
    }
    Ok(())
}

/// Structural checks on a machine: unique state names, a defined initial
/// state, and every transition targeting a defined state. These are
/// statically detectable, so they fail here rather than at playback.
pub fn validate_machine(machine: &StateMachine) -> Result<(), AnimationError> {
    let mut names = FxHashSet::default();
    for state in &machine.states {
        if !names.insert(state.name.as_str()) {
            return Err(AnimationError::DuplicateState(state.name.clone()));
        }
        validate_state(state)?;
    }
    if !names.contains(machine.initial.as_str()) {
        return Err(AnimationError::UndefinedInitial(machine.initial.clone()));
    }
    for state in &machine.states {
        for (transition_name, transition) in &state.transitions {
            if !names.contains(transition.target.as_str()) {
                return Err(AnimationError::UndefinedTarget {
                    state: state.name.clone(),
                    transition: transition_name.clone(),
                    target: transition.target.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Structural checks on a sequence: each state is internally valid, and
/// its transitions only target sibling states at the same nesting level.
pub fn validate_sequence(sequence: &AnimationSequence) -> Result<(), AnimationError> {
    let siblings: FxHashSet<&str> = sequence
        .animations
        .iter()
        .filter_map(|el| match el {
            SequenceElement::State(s) => Some(s.name.as_str()),
            SequenceElement::Sequence(_) => None,
        })
        .collect();

    for element in &sequence.animations {
        match element {
            SequenceElement::State(state) => {
                validate_state(state)?;
                for (transition_name, transition) in &state.transitions {
                    if !siblings.contains(transition.target.as_str()) {
                        return Err(AnimationError::UndefinedTarget {
                            state: state.name.clone(),
                            transition: transition_name.clone(),
                            target: transition.target.clone(),
                        });
                    }
                }
            }
            SequenceElement::Sequence(nested) => validate_sequence(nested)?,
        }
    }
    Ok(())
}

/// Result of asking an instance to fire a named transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The pointer moved; interpolation runs for `duration` seconds.
    Fired {
        target: String,
        duration: f32,
        easing: Easing,
    },
    /// The transition exists but its conditions are unmet; the pointer
    /// is unchanged.
    Blocked,
    /// The current state has no transition by that name.
    NotAvailable,
}

/// A live instance of a state machine.
///
/// The machine itself is shared, read-only data; each instance owns its
/// own current-state pointer and variable bindings.
#[derive(Debug)]
pub struct MachineInstance<'a> {
    machine: &'a StateMachine,
    current: String,
    vars: HashMap<String, Value>,
}

impl<'a> MachineInstance<'a> {
    pub fn new(machine: &'a StateMachine) -> Result<MachineInstance<'a>, AnimationError> {
        Self::with_vars(machine, HashMap::new())
    }

    pub fn with_vars(
        machine: &'a StateMachine,
        vars: HashMap<String, Value>,
    ) -> Result<MachineInstance<'a>, AnimationError> {
        validate_machine(machine)?;
        Ok(MachineInstance {
            machine,
            current: machine.initial.clone(),
            vars,
        })
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn state(&self) -> &AnimationState {
        // Always present: the pointer only ever holds validated names.
        self.machine
            .state(&self.current)
            .unwrap_or(&self.machine.states[0])
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Fire a transition by name from the current state.
    ///
    /// Conditions on the transition and on the target state's entry both
    /// gate the move; if either is unmet the pointer stays put.
    pub fn fire(&mut self, transition_name: &str) -> TransitionOutcome {
        let Some(state) = self.machine.state(&self.current) else {
            return TransitionOutcome::NotAvailable;
        };
        let Some(transition) = state.transitions.get(transition_name) else {
            return TransitionOutcome::NotAvailable;
        };
        if let Some(conditions) = &transition.conditions {
            if !conditions_met(conditions, &self.vars) {
                return TransitionOutcome::Blocked;
            }
        }
        let Some(target_state) = self.machine.state(&transition.target) else {
            return TransitionOutcome::NotAvailable;
        };
        if let Some(conditions) = &target_state.conditions {
            if !conditions_met(conditions, &self.vars) {
                return TransitionOutcome::Blocked;
            }
        }
        self.current = transition.target.clone();
        TransitionOutcome::Fired {
            target: transition.target.clone(),
            duration: transition.duration,
            easing: transition.easing,
        }
    }
}

/// Drives a chain's staged advancement.
///
/// The controller has no internal clock — the caller ticks it, passing
/// the current variable bindings, and dispatches whatever stages the
/// tick reports.
#[derive(Debug)]
pub struct ChainController<'a> {
    chain: &'a AnimationChain,
    current_stage: usize,
    dispatched: Vec<bool>,
}

impl<'a> ChainController<'a> {
    /// Build a controller, checking every stage's sequence references
    /// against the registry.
    pub fn new(
        chain: &'a AnimationChain,
        system: &AnimationSystem,
    ) -> Result<ChainController<'a>, AnimationError> {
        system.validate_chain_refs(chain)?;
        Ok(Self::unchecked(chain))
    }

    fn unchecked(chain: &'a AnimationChain) -> ChainController<'a> {
        ChainController {
            chain,
            current_stage: 0,
            dispatched: vec![false; chain.stages.len()],
        }
    }

    pub fn current_stage(&self) -> usize {
        self.current_stage
    }

    pub fn is_dispatched(&self, stage: usize) -> bool {
        self.dispatched.get(stage).copied().unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.dispatched.iter().all(|d| *d)
    }

    /// Evaluate stage eligibility once and dispatch.
    ///
    /// Non-parallel chains dispatch at most the current stage and advance
    /// the stage pointer past it; parallel chains dispatch every eligible
    /// stage and leave the pointer alone. Returns the stage indices
    /// dispatched this tick.
    pub fn tick(&mut self, vars: &HashMap<String, Value>) -> Vec<usize> {
        let mut fired = Vec::new();
        if self.chain.parallel {
            for (i, stage) in self.chain.stages.iter().enumerate() {
                if !self.dispatched[i] && conditions_met(&stage.conditions, vars) {
                    self.dispatched[i] = true;
                    fired.push(i);
                }
            }
        } else if let Some(stage) = self.chain.stages.get(self.current_stage) {
            if conditions_met(&stage.conditions, vars) {
                self.dispatched[self.current_stage] = true;
                fired.push(self.current_stage);
                self.current_stage += 1;
            }
        }
        fired
    }
}

/// Registry of validated sequences and chains for one scene.
#[derive(Debug, Default)]
pub struct AnimationSystem {
    sequences: FxHashMap<String, AnimationSequence>,
    chains: FxHashMap<String, AnimationChain>,
}

impl AnimationSystem {
    pub fn new() -> AnimationSystem {
        AnimationSystem::default()
    }

    /// Register a sequence, validating its structure first.
    pub fn register_sequence(&mut self, sequence: AnimationSequence) -> Result<(), AnimationError> {
        validate_sequence(&sequence)?;
        self.sequences.insert(sequence.name.clone(), sequence);
        Ok(())
    }

    /// Register a chain; every stage's sequence references must already
    /// be registered.
    pub fn register_chain(&mut self, chain: AnimationChain) -> Result<(), AnimationError> {
        self.validate_chain_refs(&chain)?;
        self.chains.insert(chain.name.clone(), chain);
        Ok(())
    }

    pub fn sequence(&self, name: &str) -> Option<&AnimationSequence> {
        self.sequences.get(name)
    }

    pub fn chain(&self, name: &str) -> Option<&AnimationChain> {
        self.chains.get(name)
    }

    /// A controller over a registered (already validated) chain.
    pub fn controller(&self, name: &str) -> Option<ChainController<'_>> {
        self.chains.get(name).map(ChainController::unchecked)
    }

    fn validate_chain_refs(&self, chain: &AnimationChain) -> Result<(), AnimationError> {
        for (i, stage) in chain.stages.iter().enumerate() {
            for name in &stage.animations {
                if !self.sequences.contains_key(name) {
                    return Err(AnimationError::UnknownSequence {
                        chain: chain.name.clone(),
                        stage: i,
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::animation::{ChainStage, Keyframe, Transition};
    use glam::Vec3;

    fn transition(target: &str, duration: f32) -> Transition {
        Transition {
            target: target.to_string(),
            duration,
            easing: Easing::Linear,
            conditions: None,
        }
    }

    fn state(name: &str, transitions: Vec<(&str, Transition)>) -> AnimationState {
        AnimationState {
            name: name.to_string(),
            duration: 0.0,
            keyframes: vec![Keyframe::at(0.0)],
            transitions: transitions
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            conditions: None,
        }
    }

    /// The chest machine from the interactive-object layer: `open` is
    /// gated on the chest being unlocked.
    fn chest_machine() -> StateMachine {
        let mut open_transition = transition("opening", 0.5);
        open_transition.conditions = Some(HashMap::from([(
            "is_locked".to_string(),
            Value::Bool(false),
        )]));

        StateMachine {
            states: vec![
                state("closed", vec![("open", open_transition)]),
                state("opening", vec![("complete", transition("open", 0.0))]),
                state("open", vec![("close", transition("closed", 0.3))]),
            ],
            initial: "closed".to_string(),
        }
    }

    #[test]
    fn locked_chest_does_not_open() {
        let machine = chest_machine();
        let mut instance = MachineInstance::with_vars(
            &machine,
            HashMap::from([("is_locked".to_string(), Value::Bool(true))]),
        )
        .unwrap();

        assert_eq!(instance.fire("open"), TransitionOutcome::Blocked);
        assert_eq!(instance.current(), "closed");
    }

    #[test]
    fn unlocked_chest_opens() {
        let machine = chest_machine();
        let mut instance = MachineInstance::with_vars(
            &machine,
            HashMap::from([("is_locked".to_string(), Value::Bool(false))]),
        )
        .unwrap();

        let outcome = instance.fire("open");
        assert!(matches!(
            outcome,
            TransitionOutcome::Fired { ref target, duration, .. }
                if target == "opening" && duration == 0.5
        ));
        assert_eq!(instance.current(), "opening");

        instance.fire("complete");
        assert_eq!(instance.current(), "open");
    }

    #[test]
    fn unlocking_at_runtime_unblocks() {
        let machine = chest_machine();
        let mut instance = MachineInstance::with_vars(
            &machine,
            HashMap::from([("is_locked".to_string(), Value::Bool(true))]),
        )
        .unwrap();

        assert_eq!(instance.fire("open"), TransitionOutcome::Blocked);
        instance.set_var("is_locked", Value::Bool(false));
        assert!(matches!(instance.fire("open"), TransitionOutcome::Fired { .. }));
    }

    #[test]
    fn unknown_transition_not_available() {
        let machine = chest_machine();
        let mut instance = MachineInstance::new(&machine).unwrap();
        assert_eq!(instance.fire("explode"), TransitionOutcome::NotAvailable);
        assert_eq!(instance.current(), "closed");
    }

    #[test]
    fn undefined_transition_target_rejected_at_construction() {
        let machine = StateMachine {
            states: vec![state("closed", vec![("open", transition("ajar", 1.0))])],
            initial: "closed".to_string(),
        };
        let err = MachineInstance::new(&machine).unwrap_err();
        assert!(matches!(
            err,
            AnimationError::UndefinedTarget { ref target, .. } if target == "ajar"
        ));
    }

    #[test]
    fn duplicate_state_names_rejected() {
        let machine = StateMachine {
            states: vec![state("closed", vec![]), state("closed", vec![])],
            initial: "closed".to_string(),
        };
        assert!(matches!(
            validate_machine(&machine),
            Err(AnimationError::DuplicateState(_))
        ));
    }

    #[test]
    fn undefined_initial_rejected() {
        let machine = StateMachine {
            states: vec![state("open", vec![])],
            initial: "closed".to_string(),
        };
        assert!(matches!(
            validate_machine(&machine),
            Err(AnimationError::UndefinedInitial(_))
        ));
    }

    #[test]
    fn non_monotonic_keyframes_rejected() {
        let bad = AnimationState {
            name: "wobble".to_string(),
            duration: 1.0,
            keyframes: vec![
                Keyframe::at(0.5).rotation(Vec3::ZERO),
                Keyframe::at(0.1).rotation(Vec3::ONE),
            ],
            transitions: HashMap::new(),
            conditions: None,
        };
        assert!(matches!(
            validate_state(&bad),
            Err(AnimationError::NonMonotonicKeyframes(_))
        ));
    }

    #[test]
    fn target_entry_conditions_also_gate() {
        let mut armed = state("armed", vec![]);
        armed.conditions = Some(HashMap::from([(
            "has_power".to_string(),
            Value::Bool(true),
        )]));
        let machine = StateMachine {
            states: vec![state("idle", vec![("arm", transition("armed", 0.2))]), armed],
            initial: "idle".to_string(),
        };
        let mut instance = MachineInstance::new(&machine).unwrap();
        assert_eq!(instance.fire("arm"), TransitionOutcome::Blocked);
        instance.set_var("has_power", Value::Bool(true));
        assert!(matches!(instance.fire("arm"), TransitionOutcome::Fired { .. }));
    }

    fn sequence(name: &str) -> AnimationSequence {
        AnimationSequence {
            name: name.to_string(),
            animations: vec![SequenceElement::State(state("a", vec![]))],
            looped: false,
            transition_time: 0.0,
            events: HashMap::new(),
        }
    }

    fn two_stage_chain(parallel: bool) -> AnimationChain {
        AnimationChain {
            name: "trap".to_string(),
            stages: vec![
                ChainStage {
                    animations: vec!["rumble".to_string()],
                    conditions: HashMap::from([(
                        "lever_on".to_string(),
                        Value::Bool(true),
                    )]),
                },
                ChainStage {
                    animations: vec!["collapse".to_string()],
                    conditions: HashMap::from([(
                        "floor_cracked".to_string(),
                        Value::Bool(true),
                    )]),
                },
            ],
            parallel,
            events: HashMap::new(),
        }
    }

    fn system_with_sequences() -> AnimationSystem {
        let mut system = AnimationSystem::new();
        system.register_sequence(sequence("rumble")).unwrap();
        system.register_sequence(sequence("collapse")).unwrap();
        system
    }

    #[test]
    fn serial_chain_advances_one_stage_per_tick() {
        let system = system_with_sequences();
        let chain = two_stage_chain(false);
        let mut controller = ChainController::new(&chain, &system).unwrap();

        // Nothing eligible yet.
        assert!(controller.tick(&HashMap::new()).is_empty());
        assert_eq!(controller.current_stage(), 0);

        let vars = HashMap::from([
            ("lever_on".to_string(), Value::Bool(true)),
            ("floor_cracked".to_string(), Value::Bool(true)),
        ]);

        // Even with both conditions true, a serial chain dispatches one
        // stage per tick.
        assert_eq!(controller.tick(&vars), vec![0]);
        assert_eq!(controller.current_stage(), 1);
        assert_eq!(controller.tick(&vars), vec![1]);
        assert!(controller.is_complete());
        assert!(controller.tick(&vars).is_empty());
    }

    #[test]
    fn parallel_chain_dispatches_every_eligible_stage() {
        let system = system_with_sequences();
        let chain = two_stage_chain(true);
        let mut controller = ChainController::new(&chain, &system).unwrap();

        let vars = HashMap::from([
            ("lever_on".to_string(), Value::Bool(true)),
            ("floor_cracked".to_string(), Value::Bool(true)),
        ]);
        assert_eq!(controller.tick(&vars), vec![0, 1]);
        assert_eq!(controller.current_stage(), 0);
        assert!(controller.is_complete());
    }

    #[test]
    fn chain_with_unknown_sequence_rejected() {
        let system = AnimationSystem::new();
        let chain = two_stage_chain(false);
        let err = ChainController::new(&chain, &system).unwrap_err();
        assert!(matches!(
            err,
            AnimationError::UnknownSequence { ref name, .. } if name == "rumble"
        ));
    }

    #[test]
    fn registry_lookup_after_registration() {
        let mut system = system_with_sequences();
        system.register_chain(two_stage_chain(false)).unwrap();
        assert!(system.sequence("rumble").is_some());
        assert!(system.chain("trap").is_some());
        assert!(system.controller("trap").is_some());
        assert!(system.controller("missing").is_none());
    }

    #[test]
    fn sequence_with_broken_sibling_transition_rejected() {
        let mut a = state("a", vec![("next", transition("z", 0.1))]);
        a.keyframes = vec![Keyframe::at(0.0)];
        let seq = AnimationSequence {
            name: "broken".to_string(),
            animations: vec![SequenceElement::State(a)],
            looped: false,
            transition_time: 0.0,
            events: HashMap::new(),
        };
        assert!(matches!(
            validate_sequence(&seq),
            Err(AnimationError::UndefinedTarget { .. })
        ));
    }
}
