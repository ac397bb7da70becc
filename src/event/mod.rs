//! 事件组
pub mod abi;
pub mod core;
pub mod error;
pub mod group;
pub mod handle;
pub mod types;

pub use error::EventError;
pub use group::EventGroupTable;
pub use handle::EventHandle;
pub use types::{EventSetFlags, EventWaitFlags};
