pub mod quota;

pub use quota::{HeapCapability, QuotaId};
