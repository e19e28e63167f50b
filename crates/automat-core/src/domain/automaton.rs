//! Immutable description of a deterministic finite automaton
//!
//! The automaton is loaded once (usually from a JSON definition) and treated as
//! read-only configuration by every worker. Lookups fail with a not-found error
//! instead of returning an empty value, because an unresolvable lookup always
//! points to a misconfigured worker or to invalid input.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::CoreError;

lazy_static! {
    static ref STATE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// A symbol of the input alphabet. Equality and ordering use `symbol` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphabetSymbol {
    /// The symbol itself, exactly one character
    pub symbol: String,

    /// Decorative description
    #[serde(default)]
    pub description: String,
}

impl AlphabetSymbol {
    /// Create a new alphabet symbol
    pub fn new(symbol: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            description: description.into(),
        }
    }
}

impl PartialEq for AlphabetSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for AlphabetSymbol {}

impl Hash for AlphabetSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl PartialOrd for AlphabetSymbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AlphabetSymbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.symbol.cmp(&other.symbol)
    }
}

impl Borrow<str> for AlphabetSymbol {
    fn borrow(&self) -> &str {
        &self.symbol
    }
}

/// A state of the automaton. Equality and ordering use `name` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomatonState {
    /// State name, restricted to identifier characters
    pub name: String,

    /// Decorative description
    #[serde(default)]
    pub description: String,
}

impl AutomatonState {
    /// Create a new automaton state
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl PartialEq for AutomatonState {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for AutomatonState {}

impl Hash for AutomatonState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for AutomatonState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AutomatonState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Borrow<str> for AutomatonState {
    fn borrow(&self) -> &str {
        &self.name
    }
}

/// A transition of the transition function.
///
/// Ordered by `(current_state_name, input_symbol, subsequent_state_name)`;
/// equality ignores the description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTransition {
    /// State the transition starts from
    #[serde(alias = "currentState")]
    pub current_state_name: String,

    /// Input symbol that triggers the transition
    pub input_symbol: String,

    /// State the transition leads to
    #[serde(alias = "subsequentState")]
    pub subsequent_state_name: String,

    /// Decorative description
    #[serde(default)]
    pub description: String,
}

impl StateTransition {
    /// Create a new state transition
    pub fn new(
        current_state_name: impl Into<String>,
        input_symbol: impl Into<String>,
        subsequent_state_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            current_state_name: current_state_name.into(),
            input_symbol: input_symbol.into(),
            subsequent_state_name: subsequent_state_name.into(),
            description: description.into(),
        }
    }

    fn key(&self) -> (&str, &str, &str) {
        (
            &self.current_state_name,
            &self.input_symbol,
            &self.subsequent_state_name,
        )
    }
}

impl PartialEq for StateTransition {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for StateTransition {}

impl Hash for StateTransition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for StateTransition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StateTransition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Serialized shape of an automaton definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatonDefinition {
    /// Input alphabet
    pub alphabet: Vec<AlphabetSymbol>,
    /// Declared states
    pub states: Vec<AutomatonState>,
    /// Transition function
    pub transitions: Vec<StateTransition>,
    /// Name of the start state
    pub start_state: String,
    /// Names of the accept states
    pub accept_states: Vec<String>,
    /// Decorative description
    #[serde(default)]
    pub description: String,
}

/// Validated, immutable deterministic finite automaton
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "AutomatonDefinition", into = "AutomatonDefinition")]
pub struct DeterministicFiniteAutomaton {
    alphabet: BTreeSet<AlphabetSymbol>,
    states: BTreeSet<AutomatonState>,
    transitions: BTreeSet<StateTransition>,
    start_state: String,
    accept_states: BTreeSet<String>,
    description: String,
}

impl DeterministicFiniteAutomaton {
    /// Create and validate a new automaton
    pub fn new(
        alphabet: impl IntoIterator<Item = AlphabetSymbol>,
        states: impl IntoIterator<Item = AutomatonState>,
        transitions: impl IntoIterator<Item = StateTransition>,
        start_state: impl Into<String>,
        accept_states: impl IntoIterator<Item = String>,
        description: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let transitions: Vec<StateTransition> = transitions.into_iter().collect();
        let automaton = Self {
            alphabet: alphabet.into_iter().collect(),
            states: states.into_iter().collect(),
            transitions: transitions.iter().cloned().collect(),
            start_state: start_state.into(),
            accept_states: accept_states.into_iter().collect(),
            description: description.into(),
        };

        automaton.validate(&transitions)?;
        Ok(automaton)
    }

    /// Parse and validate an automaton from its JSON definition
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let definition: AutomatonDefinition = serde_json::from_str(json)?;
        Self::try_from(definition)
    }

    /// Read, parse and validate an automaton definition file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Serialize to the JSON definition format
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The input alphabet
    pub fn alphabet(&self) -> &BTreeSet<AlphabetSymbol> {
        &self.alphabet
    }

    /// The declared states
    pub fn states(&self) -> &BTreeSet<AutomatonState> {
        &self.states
    }

    /// The transition function
    pub fn transitions(&self) -> &BTreeSet<StateTransition> {
        &self.transitions
    }

    /// Name of the start state
    pub fn start_state(&self) -> &str {
        &self.start_state
    }

    /// Names of the accept states
    pub fn accept_states(&self) -> &BTreeSet<String> {
        &self.accept_states
    }

    /// Decorative description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether `state_name` is an accept state
    pub fn is_accept_state(&self, state_name: &str) -> bool {
        self.accept_states.contains(state_name)
    }

    /// Look up a state by its exact name
    pub fn get_state(&self, name: &str) -> Result<&AutomatonState, CoreError> {
        self.states
            .get(name)
            .ok_or_else(|| CoreError::StateNotFound(name.to_string()))
    }

    /// Look up the transition for a state and an input symbol
    pub fn get_transition(
        &self,
        current_state_name: &str,
        input_symbol: &str,
    ) -> Result<&StateTransition, CoreError> {
        self.transitions
            .iter()
            .find(|t| t.current_state_name == current_state_name && t.input_symbol == input_symbol)
            .ok_or_else(|| CoreError::TransitionNotFound {
                state: current_state_name.to_string(),
                symbol: input_symbol.to_string(),
            })
    }

    fn validate(&self, declared_transitions: &[StateTransition]) -> Result<(), CoreError> {
        let mut errors = Vec::new();

        if self.states.is_empty() {
            errors.push("The automaton declares no states".to_string());
        }

        for state in &self.states {
            if !STATE_NAME_REGEX.is_match(&state.name) {
                errors.push(format!("Invalid state name '{}'", state.name));
            }
        }

        for symbol in &self.alphabet {
            if symbol.symbol.chars().count() != 1 {
                errors.push(format!(
                    "Alphabet symbol '{}' must be exactly one character",
                    symbol.symbol
                ));
            }
        }

        if !self.states.contains(self.start_state.as_str()) {
            errors.push(format!("Start state {} is not declared", self.start_state));
        }

        for accept_state in &self.accept_states {
            if !self.states.contains(accept_state.as_str()) {
                errors.push(format!("Accept state {} is not declared", accept_state));
            }
        }

        let mut moves = HashMap::with_capacity(declared_transitions.len());
        for transition in declared_transitions {
            for endpoint in [&transition.current_state_name, &transition.subsequent_state_name] {
                if !self.states.contains(endpoint.as_str()) {
                    errors.push(format!(
                        "Transition {} -{}-> {} references undeclared state {}",
                        transition.current_state_name,
                        transition.input_symbol,
                        transition.subsequent_state_name,
                        endpoint
                    ));
                }
            }
            if !self.alphabet.contains(transition.input_symbol.as_str()) {
                errors.push(format!(
                    "Transition {} -{}-> {} uses symbol outside the alphabet",
                    transition.current_state_name,
                    transition.input_symbol,
                    transition.subsequent_state_name
                ));
            }
            let target = moves
                .entry((&transition.current_state_name, &transition.input_symbol))
                .or_insert(&transition.subsequent_state_name);
            if *target != &transition.subsequent_state_name {
                errors.push(format!(
                    "More than one transition for state {} and symbol {}",
                    transition.current_state_name, transition.input_symbol
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::ConfigurationError(errors.join("; ")))
        }
    }
}

impl TryFrom<AutomatonDefinition> for DeterministicFiniteAutomaton {
    type Error = CoreError;

    fn try_from(definition: AutomatonDefinition) -> Result<Self, Self::Error> {
        Self::new(
            definition.alphabet,
            definition.states,
            definition.transitions,
            definition.start_state,
            definition.accept_states,
            definition.description,
        )
    }
}

impl From<DeterministicFiniteAutomaton> for AutomatonDefinition {
    fn from(automaton: DeterministicFiniteAutomaton) -> Self {
        Self {
            alphabet: automaton.alphabet.into_iter().collect(),
            states: automaton.states.into_iter().collect(),
            transitions: automaton.transitions.into_iter().collect(),
            start_state: automaton.start_state,
            accept_states: automaton.accept_states.into_iter().collect(),
            description: automaton.description,
        }
    }
}
