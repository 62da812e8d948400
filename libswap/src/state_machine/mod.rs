// Swap lock state machine
mod atomic_lock;
pub mod lifecycle;

pub mod error;
pub mod events;
mod guard;

pub use atomic_lock::{AtomicLock, CallContext, DeployParams};
pub use error::LockError;
pub use events::{EventLog, EventSink, NullSink, SwapEvent};
pub use guard::{GuardedSection, ReentrancyGuard};
pub use lifecycle::LockStage;
