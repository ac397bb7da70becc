#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod utils;

pub mod arch;
pub mod bench;
pub mod config;
pub mod event;
pub mod interrupt;
pub mod mem;
pub mod result;
pub mod task;
pub mod tick;


pub use event::{EventError, EventGroupTable, EventHandle, EventSetFlags, EventWaitFlags};
pub use mem::quota::HeapCapability;
pub use result::{SystemError, SystemResult};
pub use tick::Timeout;
