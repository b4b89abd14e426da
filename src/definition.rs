//! Machine specification: states, transitions, and process-wide hooks.
//!
//! A [`Specification`] is built once per machine definition and shared
//! read-only (via `Arc`) by every machine bound to it. Declaration order is
//! significant everywhere: states keep their declaration order (the first
//! declared state is the initial state) and a state's transitions keep
//! theirs, including multiple transitions registered under the same event
//! name.
//!
//! Transition targets are deliberately *not* validated at build time, so a
//! specification can be authored incrementally; a dangling target becomes a
//! structural error at the moment the transition actually fires.

use crate::error::Error;
use crate::guard::Guard;
use crate::hook::{Action, CallbackError, Control, ErrorHook, StateHook, TransitionHook};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One outgoing edge: `(state, event)` to a target state, with an optional
/// guard and an optional inline action.
#[derive(Clone)]
pub struct TransitionDef<H> {
    event: String,
    target: String,
    guard: Option<Guard<H>>,
    action: Option<Action<H>>,
}

impl<H> TransitionDef<H> {
    pub fn new(event: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            target: target.into(),
            guard: None,
            action: None,
        }
    }

    pub fn with_guard(mut self, guard: Guard<H>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_action(mut self, action: Action<H>) -> Self {
        self.action = Some(action);
        self
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Target state name. Resolved lazily; must name a declared state by the
    /// time this transition fires.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn guard(&self) -> Option<&Guard<H>> {
        self.guard.as_ref()
    }

    pub fn action(&self) -> Option<&Action<H>> {
        self.action.as_ref()
    }
}

impl<H> fmt::Debug for TransitionDef<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionDef")
            .field("event", &self.event)
            .field("target", &self.target)
            .field("guard", &self.guard)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// A named state: ordered outgoing transitions plus optional inline
/// entry/exit hooks that override the host's interface hooks.
pub struct StateDef<H> {
    name: String,
    transitions: Vec<TransitionDef<H>>,
    on_entry: Option<StateHook<H>>,
    on_exit: Option<StateHook<H>>,
}

impl<H> StateDef<H> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transitions(&self) -> &[TransitionDef<H>] {
        &self.transitions
    }

    /// Transitions registered under `event`, in declaration order.
    pub fn transitions_for<'a>(
        &'a self,
        event: &'a str,
    ) -> impl Iterator<Item = &'a TransitionDef<H>> + 'a {
        self.transitions.iter().filter(move |t| t.event == event)
    }

    /// Unique event names, in first-declaration order.
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for t in &self.transitions {
            if !names.iter().any(|n| *n == t.event) {
                names.push(&t.event);
            }
        }
        names
    }

    pub fn on_entry(&self) -> Option<&StateHook<H>> {
        self.on_entry.as_ref()
    }

    pub fn on_exit(&self) -> Option<&StateHook<H>> {
        self.on_exit.as_ref()
    }
}

impl<H> fmt::Debug for StateDef<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDef")
            .field("name", &self.name)
            .field("transitions", &self.transitions)
            .field("has_on_entry", &self.on_entry.is_some())
            .field("has_on_exit", &self.on_exit.is_some())
            .finish()
    }
}

/// Builder for a single state.
pub struct StateBuilder<H> {
    inner: StateDef<H>,
}

impl<H> StateBuilder<H> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: StateDef {
                name: name.into(),
                transitions: Vec::new(),
                on_entry: None,
                on_exit: None,
            },
        }
    }

    /// Registers a plain (unguarded, no-action) transition.
    pub fn on(self, event: impl Into<String>, target: impl Into<String>) -> Self {
        self.transition(TransitionDef::new(event, target))
    }

    /// Registers a fully specified transition.
    pub fn transition(mut self, transition: TransitionDef<H>) -> Self {
        self.inner.transitions.push(transition);
        self
    }

    /// Inline entry hook, invoked as `(host, control, prior_state, event,
    /// args)`. Overrides the host's `on_entry` for this state.
    pub fn on_entry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut H, &mut Control, &str, &str, &[Value]) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        self.inner.on_entry = Some(Arc::new(hook));
        self
    }

    /// Inline exit hook, invoked as `(host, control, next_state, event,
    /// args)`. Overrides the host's `on_exit` for this state.
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut H, &mut Control, &str, &str, &[Value]) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        self.inner.on_exit = Some(Arc::new(hook));
        self
    }

    pub(crate) fn into_state(self) -> StateDef<H> {
        self.inner
    }
}

/// Immutable description of one machine: states, transitions, and
/// process-wide hooks. Built once, shared read-only by every instance.
pub struct Specification<H> {
    states: Vec<StateDef<H>>,
    index: HashMap<String, usize>,
    before_transition: Option<TransitionHook<H>>,
    on_transition: Option<TransitionHook<H>>,
    after_transition: Option<TransitionHook<H>>,
    on_error: Option<ErrorHook<H>>,
    parent: Option<Arc<Specification<H>>>,
}

impl<H> Specification<H> {
    pub fn builder() -> SpecificationBuilder<H> {
        SpecificationBuilder::new()
    }

    /// All states, in declaration order.
    pub fn states(&self) -> &[StateDef<H>] {
        &self.states
    }

    /// Looks up a state by name.
    pub fn state(&self, name: &str) -> Option<&StateDef<H>> {
        self.index.get(name).map(|&i| &self.states[i])
    }

    /// The first declared state. The builder guarantees at least one state.
    pub fn initial_state(&self) -> &StateDef<H> {
        &self.states[0]
    }

    /// Unique event names across all states, in declaration order. This is
    /// the enumeration surface call-site sugar is generated from.
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for state in &self.states {
            for t in state.transitions() {
                if !names.iter().any(|n| *n == t.event()) {
                    names.push(t.event());
                }
            }
        }
        names
    }

    /// The specification this one replaced, if any. Introspection only: a
    /// redefinition fully replaces the prior specification, no field-level
    /// merge.
    pub fn parent(&self) -> Option<&Arc<Specification<H>>> {
        self.parent.as_ref()
    }

    pub(crate) fn before_transition(&self) -> Option<&TransitionHook<H>> {
        self.before_transition.as_ref()
    }

    pub(crate) fn on_transition(&self) -> Option<&TransitionHook<H>> {
        self.on_transition.as_ref()
    }

    pub(crate) fn after_transition(&self) -> Option<&TransitionHook<H>> {
        self.after_transition.as_ref()
    }

    pub(crate) fn on_error(&self) -> Option<&ErrorHook<H>> {
        self.on_error.as_ref()
    }
}

impl<H> fmt::Debug for Specification<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("states", &self.states)
            .field("has_before_transition", &self.before_transition.is_some())
            .field("has_on_transition", &self.on_transition.is_some())
            .field("has_after_transition", &self.after_transition.is_some())
            .field("has_on_error", &self.on_error.is_some())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Builder for a [`Specification`].
pub struct SpecificationBuilder<H> {
    states: Vec<StateDef<H>>,
    before_transition: Option<TransitionHook<H>>,
    on_transition: Option<TransitionHook<H>>,
    after_transition: Option<TransitionHook<H>>,
    on_error: Option<ErrorHook<H>>,
    parent: Option<Arc<Specification<H>>>,
}

impl<H> SpecificationBuilder<H> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            before_transition: None,
            on_transition: None,
            after_transition: None,
            on_error: None,
            parent: None,
        }
    }

    /// Declares a state. The first declared state is the initial state.
    pub fn state(mut self, state: StateBuilder<H>) -> Self {
        self.states.push(state.into_state());
        self
    }

    /// Hook invoked as `(host, control, from, to, event, args)` before any
    /// state change; halting here aborts the cycle.
    pub fn before_transition<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut H, &mut Control, &str, &str, &str, &[Value]) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        self.before_transition = Some(Arc::new(hook));
        self
    }

    /// Hook invoked as `(host, control, from, to, event, args)` after the
    /// halt check, before exit/persist/entry.
    pub fn on_transition<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut H, &mut Control, &str, &str, &str, &[Value]) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        self.on_transition = Some(Arc::new(hook));
        self
    }

    /// Hook invoked as `(host, control, from, to, event, args)` once the
    /// transition has fully completed.
    pub fn after_transition<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut H, &mut Control, &str, &str, &str, &[Value]) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        self.after_transition = Some(Arc::new(hook));
        self
    }

    /// Recovery hook invoked as `(host, control, error, from, to, event,
    /// args)` when an action fails; the engine forces a halt afterwards.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(
                &mut H,
                &mut Control,
                &(dyn std::error::Error + Send + Sync),
                &str,
                &str,
                &str,
                &[Value],
            ) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Records the specification this one replaces, for introspection.
    pub fn parent(mut self, parent: Arc<Specification<H>>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Validates state-name uniqueness and builds the shared specification.
    /// Transition targets are not checked here.
    pub fn build(self) -> Result<Arc<Specification<H>>, Error> {
        if self.states.is_empty() {
            return Err(Error::EmptySpecification);
        }

        let mut index = HashMap::with_capacity(self.states.len());
        for (i, state) in self.states.iter().enumerate() {
            if index.insert(state.name().to_string(), i).is_some() {
                return Err(Error::DuplicateState {
                    state: state.name().to_string(),
                });
            }
        }

        Ok(Arc::new(Specification {
            states: self.states,
            index,
            before_transition: self.before_transition,
            on_transition: self.on_transition,
            after_transition: self.after_transition,
            on_error: self.on_error,
            parent: self.parent,
        }))
    }
}

impl<H> Default for SpecificationBuilder<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    fn sample_spec() -> Arc<Specification<Noop>> {
        Specification::builder()
            .state(
                StateBuilder::new("created")
                    .on("pay", "paid")
                    .on("cancel", "cancelled"),
            )
            .state(
                StateBuilder::new("paid")
                    .on("ship", "shipped")
                    .on("cancel", "cancelled"),
            )
            .state(StateBuilder::new("shipped"))
            .state(StateBuilder::new("cancelled"))
            .build()
            .unwrap()
    }

    #[test]
    fn states_keep_declaration_order() {
        let spec = sample_spec();
        let names: Vec<&str> = spec.states().iter().map(|s| s.name()).collect();
        assert_eq!(names, ["created", "paid", "shipped", "cancelled"]);
        assert_eq!(spec.initial_state().name(), "created");
    }

    #[test]
    fn state_lookup() {
        let spec = sample_spec();
        assert_eq!(spec.state("paid").unwrap().name(), "paid");
        assert!(spec.state("refunded").is_none());
    }

    #[test]
    fn duplicate_state_is_a_build_error() {
        let result = Specification::<Noop>::builder()
            .state(StateBuilder::new("a"))
            .state(StateBuilder::new("a"))
            .build();
        assert!(matches!(result, Err(Error::DuplicateState { state }) if state == "a"));
    }

    #[test]
    fn empty_specification_is_a_build_error() {
        let result = Specification::<Noop>::builder().build();
        assert!(matches!(result, Err(Error::EmptySpecification)));
    }

    #[test]
    fn dangling_target_is_legal_at_build_time() {
        let spec = Specification::<Noop>::builder()
            .state(StateBuilder::new("a").on("go", "nowhere"))
            .build();
        assert!(spec.is_ok());
    }

    #[test]
    fn repeated_event_names_keep_declaration_order() {
        let spec = Specification::<Noop>::builder()
            .state(
                StateBuilder::new("off")
                    .on("turn_on", "on")
                    .on("turn_on", "low_battery"),
            )
            .state(StateBuilder::new("on"))
            .state(StateBuilder::new("low_battery"))
            .build()
            .unwrap();

        let targets: Vec<&str> = spec
            .state("off")
            .unwrap()
            .transitions_for("turn_on")
            .map(|t| t.target())
            .collect();
        assert_eq!(targets, ["on", "low_battery"]);
    }

    #[test]
    fn event_names_are_unique_in_declaration_order() {
        let spec = sample_spec();
        assert_eq!(spec.event_names(), ["pay", "cancel", "ship"]);
        assert_eq!(
            spec.state("created").unwrap().event_names(),
            ["pay", "cancel"]
        );
    }

    #[test]
    fn redefinition_replaces_and_keeps_parent_for_introspection() {
        let parent = sample_spec();
        let child = Specification::builder()
            .state(StateBuilder::new("draft").on("submit", "submitted"))
            .state(StateBuilder::new("submitted"))
            .parent(Arc::clone(&parent))
            .build()
            .unwrap();

        assert_eq!(child.initial_state().name(), "draft");
        assert!(child.state("created").is_none());
        let recorded = child.parent().unwrap();
        assert_eq!(recorded.initial_state().name(), "created");
    }
}
