//! 事件组核心操作实现
//!
//! 这里的函数都在调用者持有的临界区内执行，只修改控制块并唤醒任务，
//! 不会切换任务。

use crate::config::EVENT_RESERVED_MASK;
use crate::println_error;
use crate::result::{SystemError, SystemResult};
use crate::task::sched::{Kernel, preempts_current};
use crate::task::sync::wait::task_wake;
use crate::task::types::WakeReason;

use super::error::EventError;
use super::types::{EventGroupCB, EventWaitFlags, WaitRequest, is_satisfied};

/// 检查等待掩码是否有效
#[inline]
pub fn validate_event_mask(event_mask: u32) -> SystemResult<()> {
    if event_mask == 0 {
        println_error!("event mask must not be zero");
        return Err(SystemError::Event(EventError::InvalidArgument));
    }
    validate_event_bits(event_mask)
}

/// 检查设置或清除的事件位是否使用了保留位
#[inline]
pub fn validate_event_bits(events: u32) -> SystemResult<()> {
    if events & EVENT_RESERVED_MASK != 0 {
        println_error!("event bits {:#010x} use reserved bits", events);
        Err(SystemError::Event(EventError::InvalidArgument))
    } else {
        Ok(())
    }
}

/// 事件轮询操作
///
/// 满足时返回清除前的事件位，并按`CLEAR_ON_EXIT`清除等待的位。
#[inline]
pub fn poll(event_cb: &mut EventGroupCB, event_mask: u32, flags: EventWaitFlags) -> Option<u32> {
    let bits = event_cb.bits;
    if !is_satisfied(bits, event_mask, flags) {
        return None;
    }

    if flags.contains(EventWaitFlags::CLEAR_ON_EXIT) {
        event_cb.clear_events(event_mask);
    }
    Some(bits)
}

/// 加入等待队列尾部
#[inline]
pub fn enqueue(event_cb: &mut EventGroupCB, request: WaitRequest) -> SystemResult<()> {
    debug_assert!(!event_cb.has_waiter(request.task));

    event_cb
        .waiters
        .push(request)
        .map_err(|_| {
            println_error!("event wait list is full, task {} not queued", request.task);
            SystemError::Event(EventError::OutOfMemory)
        })
}

/// 按入队顺序唤醒所有满足条件的等待者
///
/// 每个等待者都用设置后的事件位判断，得到同一个清除前的快照；
/// 需要清除的位在遍历结束后统一清除。已经超时的等待记录直接丢弃。
/// 返回是否唤醒了比当前任务优先级更高的任务。
pub fn wake_waiting_tasks<K: Kernel + ?Sized>(kernel: &K, event_cb: &mut EventGroupCB) -> bool {
    debug_assert!(kernel.int_locked());

    let snapshot = event_cb.bits;
    let mut bits_to_clear = 0;
    let mut need_schedule = false;

    let mut index = 0;
    while index < event_cb.waiters.len() {
        let request = event_cb.waiters[index];

        if !kernel.is_pending(request.task) {
            event_cb.waiters.remove(index);
            continue;
        }

        if !request.is_satisfied(snapshot) {
            index += 1;
            continue;
        }

        event_cb.waiters.remove(index);
        if request.clear_on_exit() {
            bits_to_clear |= request.bits_to_wait;
        }
        if task_wake(kernel, request.task, WakeReason::Satisfied(snapshot))
            && preempts_current(kernel, request.task)
        {
            need_schedule = true;
        }
    }

    event_cb.clear_events(bits_to_clear);
    need_schedule
}

/// 以`reason`唤醒全部等待者并清空等待队列
pub fn wake_all<K: Kernel + ?Sized>(
    kernel: &K,
    event_cb: &mut EventGroupCB,
    reason: WakeReason,
) -> bool {
    debug_assert!(kernel.int_locked());

    let mut need_schedule = false;
    for request in event_cb.waiters.iter() {
        if task_wake(kernel, request.task, reason) && preempts_current(kernel, request.task) {
            need_schedule = true;
        }
    }
    event_cb.waiters.clear();

    need_schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EVENT_BITS_MASK;

    #[test]
    fn zero_mask_and_reserved_bits_are_rejected() {
        let invalid = Err(SystemError::Event(EventError::InvalidArgument));
        assert_eq!(validate_event_mask(0), invalid);
        assert_eq!(validate_event_mask(0x0100_0000), invalid);
        assert_eq!(validate_event_bits(0x8000_0001), invalid);
        assert_eq!(validate_event_mask(EVENT_BITS_MASK), Ok(()));
        assert_eq!(validate_event_bits(0), Ok(()));
    }

    #[test]
    fn poll_returns_snapshot_before_clearing() {
        let mut event_cb = EventGroupCB::new();
        event_cb.set_events(0b1011);

        let flags = EventWaitFlags::WAIT_ALL | EventWaitFlags::CLEAR_ON_EXIT;
        assert_eq!(poll(&mut event_cb, 0b0011, flags), Some(0b1011));
        assert_eq!(event_cb.bits, 0b1000);
        assert_eq!(poll(&mut event_cb, 0b0011, flags), None);
    }

    #[test]
    fn poll_without_clear_keeps_bits() {
        let mut event_cb = EventGroupCB::new();
        event_cb.set_events(0b0100);

        assert_eq!(poll(&mut event_cb, 0b0110, EventWaitFlags::empty()), Some(0b0100));
        assert_eq!(event_cb.bits, 0b0100);
    }
}
