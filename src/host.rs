//! The host capability interface.
//!
//! A machine does not store state itself: the host object it is bound to
//! loads and persists the state name, and may additionally expose named
//! guards, per-event actions, and per-state entry/exit handlers. Presence of
//! the optional capabilities is expressed through the trait's defaulted
//! methods rather than reflection: returning the default means "not
//! provided".

use crate::hook::{CallbackError, Control};
use serde_json::Value;

/// Capabilities a host object provides to the engine.
pub trait Host {
    /// Reads the persisted state name. `None` means "use the initial state".
    fn load_state(&self) -> Option<String>;

    /// Writes the new state name. The return value is surfaced to the caller
    /// of `process_event` when the action produced no explicit result.
    fn persist_state(&mut self, state: &str) -> Value;

    /// Resolves a named guard. Called freshly on every evaluation, so a
    /// redefinition on the host is honored. `None` means the host does not
    /// recognize the name; the evaluator treats that as not applicable.
    /// Implementations receive the full argument slice and may ignore any
    /// extras.
    fn guard(&self, name: &str, args: &[Value]) -> Option<bool> {
        let _ = (name, args);
        None
    }

    /// Runs the host-defined action for an event, consulted only when the
    /// resolved transition has no inline action. `Ok(None)` means the host
    /// has no handler for this event; `Ok(Some(Value::Null))` means handled
    /// with no explicit result (the persist result is surfaced instead).
    fn action(
        &mut self,
        event: &str,
        control: &mut Control,
        args: &[Value],
    ) -> Result<Option<Value>, CallbackError> {
        let _ = (event, control, args);
        Ok(None)
    }

    /// Entry handler for `state`, consulted only when the state defines no
    /// inline `on_entry`. `prior` is the state being left.
    fn on_entry(
        &mut self,
        state: &str,
        prior: &str,
        event: &str,
        control: &mut Control,
        args: &[Value],
    ) -> Result<(), CallbackError> {
        let _ = (state, prior, event, control, args);
        Ok(())
    }

    /// Exit handler for `state`, consulted only when the state defines no
    /// inline `on_exit`. `next` is the state being entered.
    fn on_exit(
        &mut self,
        state: &str,
        next: &str,
        event: &str,
        control: &mut Control,
        args: &[Value],
    ) -> Result<(), CallbackError> {
        let _ = (state, next, event, control, args);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare {
        state: Option<String>,
    }

    impl Host for Bare {
        fn load_state(&self) -> Option<String> {
            self.state.clone()
        }

        fn persist_state(&mut self, state: &str) -> Value {
            self.state = Some(state.to_string());
            Value::Bool(true)
        }
    }

    #[test]
    fn defaults_mean_no_capability() {
        let mut host = Bare { state: None };
        let mut control = Control::default();

        assert!(host.guard("anything", &[]).is_none());
        assert!(host
            .action("anything", &mut control, &[])
            .unwrap()
            .is_none());
        assert!(host.on_entry("a", "b", "go", &mut control, &[]).is_ok());
        assert!(host.on_exit("a", "b", "go", &mut control, &[]).is_ok());
    }

    #[test]
    fn persist_then_load_round_trip() {
        let mut host = Bare { state: None };
        assert!(host.load_state().is_none());
        host.persist_state("ready");
        assert_eq!(host.load_state().as_deref(), Some("ready"));
    }
}
