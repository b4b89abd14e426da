//! Engine error types.

use thiserror::Error;

/// Boxed error type carried by failed callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported by the transition engine and the specification builder.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no transition for event '{event}' in state '{state}'")]
    NoTransitionAllowed { state: String, event: String },

    #[error("transition on event '{event}' targets undeclared state '{target}'")]
    UndeclaredTarget { event: String, target: String },

    #[error("duplicate state '{state}' in specification")]
    DuplicateState { state: String },

    #[error("specification declares no states")]
    EmptySpecification,

    #[error("action for event '{event}' failed: {source}")]
    Action {
        event: String,
        #[source]
        source: BoxError,
    },

    #[error("{hook} hook failed: {source}")]
    Hook {
        hook: &'static str,
        #[source]
        source: BoxError,
    },
}
