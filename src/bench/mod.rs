//! 基准测试
pub mod interrupt_latency;
