//! Lifecycle callbacks and halt bookkeeping.
//!
//! Every guard, action, and hook receives the host object explicitly as its
//! first parameter; there is no implicit receiver context. Actions and hooks
//! additionally receive a [`Control`] handle through which they can abort the
//! current processing cycle:
//!
//! - [`Control::halt`] records a reason and lets the callback keep running;
//!   the engine aborts the cycle at its next halt check.
//! - [`Control::halt_now`] records the reason and hands back a signal value
//!   for the callback to return, unwinding the rest of the callback body.
//!   The engine catches the signal at each callback boundary and treats it
//!   exactly like a soft halt; it never escapes `process_event`.

use crate::error::BoxError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error type returned by actions and hooks.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The halt signal produced by [`Control::halt_now`]. Caught by the
    /// engine at every callback boundary; carries no payload because the
    /// [`Control`] already recorded the reason.
    #[error("transition halted")]
    Halted,

    /// An arbitrary callback failure. For actions this is routed to the
    /// specification's `on_error` hook when one is configured; everywhere
    /// else it propagates to the caller.
    #[error("{0}")]
    Failed(#[from] BoxError),
}

/// Per-cycle halt bookkeeping.
///
/// Cleared at the start of every processing cycle; a halt never carries over
/// between cycles.
#[derive(Debug, Default)]
pub struct Control {
    halted: bool,
    reason: Option<Value>,
}

impl Control {
    /// Soft halt: record the reason and return normally. The cycle aborts at
    /// the engine's next halt check.
    pub fn halt(&mut self, reason: impl Into<Value>) {
        let reason = reason.into();
        self.reason = if reason.is_null() { None } else { Some(reason) };
        self.halted = true;
    }

    /// Hard halt: same bookkeeping as [`halt`](Self::halt), then returns the
    /// signal for the callback to propagate with `?` or `return`, stopping
    /// the rest of the callback body.
    pub fn halt_now(&mut self, reason: impl Into<Value>) -> CallbackError {
        self.halt(reason);
        CallbackError::Halted
    }

    /// True if the current cycle was halted.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The reason supplied with the halt, if any.
    pub fn reason(&self) -> Option<&Value> {
        self.reason.as_ref()
    }

    pub(crate) fn reset(&mut self) {
        self.halted = false;
        self.reason = None;
    }
}

/// Process-wide transition hook: `(host, control, from, to, event, args)`.
pub type TransitionHook<H> = Arc<
    dyn Fn(&mut H, &mut Control, &str, &str, &str, &[Value]) -> Result<(), CallbackError>
        + Send
        + Sync,
>;

/// Error recovery hook: `(host, control, error, from, to, event, args)`.
pub type ErrorHook<H> = Arc<
    dyn Fn(
            &mut H,
            &mut Control,
            &(dyn std::error::Error + Send + Sync),
            &str,
            &str,
            &str,
            &[Value],
        ) -> Result<(), CallbackError>
        + Send
        + Sync,
>;

/// Per-state entry/exit hook: `(host, control, other_state, event, args)`.
/// Entry hooks receive the prior state, exit hooks the next state.
pub type StateHook<H> = Arc<
    dyn Fn(&mut H, &mut Control, &str, &str, &[Value]) -> Result<(), CallbackError> + Send + Sync,
>;

/// Inline transition action.
///
/// A `Value::Null` result counts as "no explicit result" and the caller of
/// `process_event` receives the persist result instead. An optional declared
/// arity clips the argument slice the same way inline guards do: extra
/// trailing arguments are silently discarded.
#[derive(Clone)]
pub struct Action<H> {
    arity: Option<usize>,
    run: Arc<dyn Fn(&mut H, &mut Control, &[Value]) -> Result<Value, CallbackError> + Send + Sync>,
}

impl<H> Action<H> {
    /// An action that accepts the full argument slice.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut H, &mut Control, &[Value]) -> Result<Value, CallbackError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            arity: None,
            run: Arc::new(f),
        }
    }

    /// An action that declares `arity` parameters; supplied arguments beyond
    /// that are discarded before the closure runs.
    pub fn with_arity<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&mut H, &mut Control, &[Value]) -> Result<Value, CallbackError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            arity: Some(arity),
            run: Arc::new(f),
        }
    }

    pub(crate) fn invoke(
        &self,
        host: &mut H,
        control: &mut Control,
        args: &[Value],
    ) -> Result<Value, CallbackError> {
        (self.run)(host, control, crate::guard::clip_args(args, self.arity))
    }
}

impl<H> fmt::Debug for Action<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}
