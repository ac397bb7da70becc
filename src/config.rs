pub const OK: u32 = 0;
pub const WAIT_FOREVER: u32 = u32::MAX;

// task
pub const TASK_PRIORITY_HIGHEST: u16 = 0;
pub const TASK_PRIORITY_LOWEST: u16 = 31;
pub const TASK_LIMIT: usize = 16;

// event
/// 事件组表容量
pub const EVENT_GROUP_LIMIT: usize = 16;
/// 单个事件组的最大等待者数量，每个任务至多一个等待请求
pub const EVENT_WAITER_LIMIT: usize = TASK_LIMIT;
/// 可用事件位（低24位）
pub const EVENT_BITS_MASK: u32 = 0x00FF_FFFF;
/// 保留位（高8位），与FreeRTOS事件组保持兼容
pub const EVENT_RESERVED_MASK: u32 = !EVENT_BITS_MASK;

// host simulator
pub const SIM_CONTEXT_SWITCH_CYCLES: u32 = 32;
pub const SIM_INTERRUPT_ENTRY_CYCLES: u32 = 12;
