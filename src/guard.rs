//! Guard predicates and the transition-resolution scan.
//!
//! A guard decides whether a candidate transition is applicable for a given
//! host instance and the positional arguments supplied with the triggering
//! call. Guards come in two shapes:
//!
//! - **Named**: a symbolic reference resolved freshly on the host at every
//!   evaluation via [`Host::guard`], so a redefinition on the host is
//!   honored the next time the guard runs.
//! - **Inline**: a predicate closure taking the host as its explicit first
//!   parameter. An optional declared arity clips the supplied arguments:
//!   extras beyond the declared count are silently discarded, and a guard
//!   may declare arity zero.
//!
//! Guard evaluation is side-effect-free, so capability probes such as
//! `Machine::can_fire` never disturb halt bookkeeping.

use crate::definition::{StateDef, TransitionDef};
use crate::host::Host;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Applies the declared-arity policy: pass at most `arity` of the supplied
/// arguments, discarding any extras.
pub(crate) fn clip_args(args: &[Value], arity: Option<usize>) -> &[Value] {
    match arity {
        Some(n) if n < args.len() => &args[..n],
        _ => args,
    }
}

/// A transition guard.
#[derive(Clone)]
pub enum Guard<H> {
    /// Resolved on the host by name at evaluation time.
    Named(String),
    /// Inline predicate with an optional declared arity.
    Inline {
        arity: Option<usize>,
        pred: Arc<dyn Fn(&H, &[Value]) -> bool + Send + Sync>,
    },
}

impl<H> Guard<H> {
    /// A guard resolved via [`Host::guard`] under the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Guard::Named(name.into())
    }

    /// An inline predicate that accepts the full argument slice.
    pub fn new<F>(pred: F) -> Self
    where
        F: Fn(&H, &[Value]) -> bool + Send + Sync + 'static,
    {
        Guard::Inline {
            arity: None,
            pred: Arc::new(pred),
        }
    }

    /// An inline predicate that declares `arity` parameters; supplied
    /// arguments beyond that are discarded before the closure runs.
    pub fn with_arity<F>(arity: usize, pred: F) -> Self
    where
        F: Fn(&H, &[Value]) -> bool + Send + Sync + 'static,
    {
        Guard::Inline {
            arity: Some(arity),
            pred: Arc::new(pred),
        }
    }
}

impl<H: Host> Guard<H> {
    /// Evaluates the guard for the given host and call arguments.
    ///
    /// A named guard the host does not recognize evaluates as not applicable;
    /// the misconfiguration is logged rather than raised so that resolution
    /// and capability probes stay total.
    pub fn applicable(&self, host: &H, args: &[Value]) -> bool {
        match self {
            Guard::Named(name) => match host.guard(name, args) {
                Some(applicable) => applicable,
                None => {
                    tracing::warn!(
                        "named guard '{}' is not defined on the host; treating as not applicable",
                        name
                    );
                    false
                }
            },
            Guard::Inline { arity, pred } => pred(host, clip_args(args, *arity)),
        }
    }
}

impl<H> fmt::Debug for Guard<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Guard::Inline { arity, .. } => f
                .debug_struct("Inline")
                .field("arity", arity)
                .finish_non_exhaustive(),
        }
    }
}

/// Resolves which transition, if any, applies for an event.
pub struct GuardEvaluator;

impl GuardEvaluator {
    /// Evaluates an optional guard (no guard means always applicable).
    pub fn applicable_opt<H: Host>(guard: Option<&Guard<H>>, host: &H, args: &[Value]) -> bool {
        guard.map(|g| g.applicable(host, args)).unwrap_or(true)
    }

    /// Scans the state's transitions registered under `event` in declaration
    /// order and returns the first whose guard is applicable. `None` means
    /// the state has no applicable transition for this event; the engine
    /// maps that to a caller-visible error.
    pub fn first_applicable<'a, H: Host>(
        state: &'a StateDef<H>,
        event: &'a str,
        host: &H,
        args: &[Value],
    ) -> Option<&'a TransitionDef<H>> {
        state
            .transitions_for(event)
            .find(|t| Self::applicable_opt(t.guard(), host, args))
    }
}
