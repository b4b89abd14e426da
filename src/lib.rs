//! # flowstate
//!
//! An embeddable finite-state-machine runtime: an arbitrary host object
//! acquires state, guarded transitions, and lifecycle hooks without
//! inheriting from a base type.
//!
//! This crate provides:
//! - Immutable machine specifications: ordered states, ordered (possibly
//!   repeating) event transitions, guards, actions, and six hook kinds
//! - Transition resolution honoring guard declaration order
//! - A strictly ordered transition protocol with halt and error-recovery
//!   semantics
//! - A `Host` capability trait through which state is loaded and persisted
//!
//! State storage always belongs to the host: the engine only calls
//! [`Host::load_state`] and [`Host::persist_state`]. Processing is
//! synchronous and single-threaded; a built [`Specification`] is read-only
//! and may be shared by any number of machines.
//!
//! # Example
//!
//! ```rust
//! use flowstate::{Guard, Host, Machine, Specification, StateBuilder, TransitionDef};
//! use serde_json::Value;
//!
//! struct Device {
//!     battery: i64,
//!     state: Option<String>,
//! }
//!
//! impl Host for Device {
//!     fn load_state(&self) -> Option<String> {
//!         self.state.clone()
//!     }
//!
//!     fn persist_state(&mut self, state: &str) -> Value {
//!         self.state = Some(state.to_string());
//!         Value::Bool(true)
//!     }
//!
//!     fn guard(&self, name: &str, _args: &[Value]) -> Option<bool> {
//!         match name {
//!             "sufficient_battery" => Some(self.battery > 10),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let spec = Specification::builder()
//!     .state(
//!         StateBuilder::new("off")
//!             .transition(
//!                 TransitionDef::new("turn_on", "on")
//!                     .with_guard(Guard::named("sufficient_battery")),
//!             )
//!             // Declaration order decides: this one fires when the guarded
//!             // transition above is not applicable.
//!             .transition(
//!                 TransitionDef::new("turn_on", "low_battery")
//!                     .with_guard(Guard::new(|device: &Device, _| device.battery > 0)),
//!             ),
//!     )
//!     .state(StateBuilder::new("on"))
//!     .state(StateBuilder::new("low_battery"))
//!     .build()?;
//!
//! let mut machine = Machine::new(spec, Device { battery: 50, state: None });
//! assert!(machine.in_state("off"));
//! assert!(machine.can_fire("turn_on", &[]));
//!
//! machine.process_event("turn_on", &[])?;
//! assert!(machine.in_state("on"));
//! # Ok::<(), flowstate::Error>(())
//! ```

pub mod definition;
pub mod engine;
pub mod error;
pub mod guard;
pub mod hook;
pub mod host;

pub use definition::{Specification, SpecificationBuilder, StateBuilder, StateDef, TransitionDef};
pub use engine::{Machine, Outcome};
pub use error::{BoxError, Error};
pub use guard::{Guard, GuardEvaluator};
pub use hook::{Action, CallbackError, Control, ErrorHook, StateHook, TransitionHook};
pub use host::Host;
