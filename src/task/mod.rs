pub mod error;
pub mod sched;
pub mod sync;
pub mod types;

pub use sched::{Clock, CycleCounter, Kernel, Scheduler};
pub use types::{Priority, TaskId, TaskStatus, WakeReason};
