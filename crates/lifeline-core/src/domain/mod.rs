//! Domain model (lifecycle states, dispatch ids, errors).

pub mod errors;
pub mod ids;
pub mod lifecycle;

pub use self::errors::{DispatchError, LifecycleError, TaskFailure, TaskOutcome};
pub use self::ids::DispatchId;
pub use self::lifecycle::{LifecycleEvent, LifecycleState};
