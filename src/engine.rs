//! The transition engine: one event-processing cycle at a time.
//!
//! [`Machine`] binds a shared [`Specification`] to one host object and steps
//! it through guarded transitions. Each call to
//! [`process_event`](Machine::process_event) runs a strictly ordered
//! protocol:
//!
//! 1. resolve the first applicable transition (guards in declaration order)
//! 2. reset halt bookkeeping
//! 3. validate the target state is declared
//! 4. `before_transition` hook — a halt here aborts the cycle
//! 5. action (transition's inline action, else the host's), with `on_error`
//!    recovery for failures
//! 6. halt check — a halt recorded so far aborts the cycle
//! 7. `on_transition` hook
//! 8. exit hook of the state being left
//! 9. persist the new state on the host
//! 10. entry hook of the state being entered
//! 11. `after_transition` hook
//! 12. surface the action result, else the persist result
//!
//! Aborts triggered in steps 4-6 fully suppress persistence and the
//! entry/exit/after hooks. Halts recorded during steps 7-11 are bookkeeping
//! only: they stop the raising callback (for the hard-halt signal) but the
//! remainder of the cycle runs, since the last halt check is step 6.

use crate::definition::{Specification, StateDef};
use crate::error::Error;
use crate::guard::GuardEvaluator;
use crate::hook::{CallbackError, Control};
use crate::host::Host;
use serde_json::Value;
use std::sync::Arc;

/// Result of one completed or halted processing cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The transition ran to completion. `value` is the action result when
    /// it produced one, else the persist result.
    Completed {
        from: String,
        to: String,
        value: Value,
    },
    /// The cycle was aborted by a halt: no state change, and the reason is
    /// queryable via [`Machine::halted_because`].
    Halted,
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }

    /// The surfaced value of a completed cycle.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Completed { value, .. } => Some(value),
            Outcome::Halted => None,
        }
    }
}

/// A host object bound to a specification.
///
/// The specification is read-only and freely shared between machines; the
/// machine itself belongs to one host and provides no thread-safety. All
/// callbacks run in-line, on the calling thread, before `process_event`
/// returns.
pub struct Machine<H: Host> {
    spec: Arc<Specification<H>>,
    host: H,
    control: Control,
}

/// Maps the host's persisted state to a state definition, defaulting to the
/// first declared state when unset or unknown.
fn resolve_current<'a, H: Host>(spec: &'a Specification<H>, host: &H) -> &'a StateDef<H> {
    host.load_state()
        .and_then(|name| spec.state(&name))
        .unwrap_or_else(|| spec.initial_state())
}

/// Converts a callback result at a hook boundary: the halt signal is
/// absorbed (the control already recorded it), any other failure propagates.
fn boundary(result: Result<(), CallbackError>, hook: &'static str) -> Result<(), Error> {
    match result {
        Ok(()) | Err(CallbackError::Halted) => Ok(()),
        Err(CallbackError::Failed(source)) => Err(Error::Hook { hook, source }),
    }
}

impl<H: Host> Machine<H> {
    pub fn new(spec: Arc<Specification<H>>, host: H) -> Self {
        Self {
            spec,
            host,
            control: Control::default(),
        }
    }

    pub fn spec(&self) -> &Arc<Specification<H>> {
        &self.spec
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// The current state: the host's persisted name mapped to its
    /// definition, defaulting to the first declared state.
    pub fn current_state(&self) -> &StateDef<H> {
        resolve_current(&self.spec, &self.host)
    }

    /// True iff the current state is `name`.
    pub fn in_state(&self, name: &str) -> bool {
        self.current_state().name() == name
    }

    /// Side-effect-free probe: true iff an applicable transition exists for
    /// `event` in the current state. Does not touch halt bookkeeping.
    pub fn can_fire(&self, event: &str, args: &[Value]) -> bool {
        GuardEvaluator::first_applicable(self.current_state(), event, &self.host, args).is_some()
    }

    /// True if the last processing cycle was halted.
    pub fn halted(&self) -> bool {
        self.control.is_halted()
    }

    /// The reason recorded by the halt that aborted the last cycle.
    pub fn halted_because(&self) -> Option<&Value> {
        self.control.reason()
    }

    /// Processes one event against the current state.
    pub fn process_event(&mut self, event: &str, args: &[Value]) -> Result<Outcome, Error> {
        let spec = Arc::clone(&self.spec);

        // Resolution happens against the pre-reset flags: a failed lookup
        // leaves the previous cycle's halt state observable.
        let from_state = resolve_current(&spec, &self.host);
        let transition = GuardEvaluator::first_applicable(from_state, event, &self.host, args)
            .ok_or_else(|| Error::NoTransitionAllowed {
                state: from_state.name().to_string(),
                event: event.to_string(),
            })?;
        let from = from_state.name().to_string();

        self.control.reset();

        let to_state =
            spec.state(transition.target())
                .ok_or_else(|| Error::UndeclaredTarget {
                    event: event.to_string(),
                    target: transition.target().to_string(),
                })?;
        let to = to_state.name();

        if let Some(hook) = spec.before_transition() {
            boundary(
                hook(&mut self.host, &mut self.control, &from, to, event, args),
                "before_transition",
            )?;
        }
        if self.control.is_halted() {
            tracing::debug!(
                "transition '{}' -> '{}' on '{}' halted before starting",
                from,
                to,
                event
            );
            return Ok(Outcome::Halted);
        }

        let attempted = if let Some(action) = transition.action() {
            action
                .invoke(&mut self.host, &mut self.control, args)
                .map(Some)
        } else {
            self.host.action(event, &mut self.control, args)
        };
        let action_value = match attempted {
            Ok(value) => value.filter(|v| !v.is_null()),
            Err(CallbackError::Halted) => None,
            Err(CallbackError::Failed(source)) => {
                let Some(hook) = spec.on_error() else {
                    return Err(Error::Action {
                        event: event.to_string(),
                        source,
                    });
                };
                tracing::warn!(
                    "action for event '{}' failed, routing to on_error: {}",
                    event,
                    source
                );
                boundary(
                    hook(
                        &mut self.host,
                        &mut self.control,
                        source.as_ref(),
                        &from,
                        to,
                        event,
                        args,
                    ),
                    "on_error",
                )?;
                // The error is considered handled; force a halt so the
                // remaining steps are skipped.
                self.control.halt(Value::from(source.to_string()));
                None
            }
        };

        if self.control.is_halted() {
            tracing::debug!("transition '{}' -> '{}' on '{}' halted", from, to, event);
            return Ok(Outcome::Halted);
        }

        if let Some(hook) = spec.on_transition() {
            boundary(
                hook(&mut self.host, &mut self.control, &from, to, event, args),
                "on_transition",
            )?;
        }

        let exit_result = if let Some(hook) = from_state.on_exit() {
            hook(&mut self.host, &mut self.control, to, event, args)
        } else {
            self.host.on_exit(&from, to, event, &mut self.control, args)
        };
        boundary(exit_result, "on_exit")?;

        let persist_value = self.host.persist_state(to);
        tracing::debug!("transitioned '{}' -> '{}' on event '{}'", from, to, event);

        let entry_result = if let Some(hook) = to_state.on_entry() {
            hook(&mut self.host, &mut self.control, &from, event, args)
        } else {
            self.host
                .on_entry(to, &from, event, &mut self.control, args)
        };
        boundary(entry_result, "on_entry")?;

        if let Some(hook) = spec.after_transition() {
            boundary(
                hook(&mut self.host, &mut self.control, &from, to, event, args),
                "after_transition",
            )?;
        }

        Ok(Outcome::Completed {
            from,
            to: to.to_string(),
            value: action_value.unwrap_or(persist_value),
        })
    }
}
