//! 事件组相关类型定义
use bitflags::bitflags;

use crate::{config::EVENT_WAITER_LIMIT, task::types::TaskId, tick::Deadline};

bitflags! {
    /// 等待模式
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct EventWaitFlags: u32 {
        /// 与模式：所有事件都必须满足；不设置时任意一个事件满足即可
        const WAIT_ALL = 0x01;
        /// 清除模式：满足后清除等待的事件位
        const CLEAR_ON_EXIT = 0x02;
    }
}

bitflags! {
    /// 设置事件时的选项
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct EventSetFlags: u32 {
        /// 唤醒更高优先级任务后不立即让出CPU
        const NO_YIELD = 0x01;
    }
}

/// 阻塞在事件组上的一次等待
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitRequest {
    pub task: TaskId,
    pub bits_to_wait: u32,
    pub flags: EventWaitFlags,
    pub deadline: Deadline,
}

impl WaitRequest {
    /// `bits`是否满足该等待
    #[inline]
    pub fn is_satisfied(&self, bits: u32) -> bool {
        is_satisfied(bits, self.bits_to_wait, self.flags)
    }

    #[inline]
    pub fn clear_on_exit(&self) -> bool {
        self.flags.contains(EventWaitFlags::CLEAR_ON_EXIT)
    }
}

/// 判断事件位是否满足等待条件
#[inline]
pub fn is_satisfied(bits: u32, bits_to_wait: u32, flags: EventWaitFlags) -> bool {
    if flags.contains(EventWaitFlags::WAIT_ALL) {
        bits & bits_to_wait == bits_to_wait
    } else {
        bits & bits_to_wait != 0
    }
}

/// 事件组控制块
#[derive(Debug)]
pub struct EventGroupCB {
    /// 当前事件位，保留位始终为0
    pub bits: u32,
    /// 按入队顺序排列的等待者
    pub waiters: heapless::Vec<WaitRequest, EVENT_WAITER_LIMIT>,
}

impl EventGroupCB {
    pub const fn new() -> Self {
        Self {
            bits: 0,
            waiters: heapless::Vec::new(),
        }
    }

    /// 设置事件位
    #[inline]
    pub fn set_events(&mut self, events: u32) {
        self.bits |= events;
    }

    /// 清除事件位
    #[inline]
    pub fn clear_events(&mut self, events: u32) {
        self.bits &= !events;
    }

    #[inline]
    pub fn has_waiter(&self, task: TaskId) -> bool {
        self.waiters.iter().any(|request| request.task == task)
    }

    /// 删除`task`的等待记录，返回是否找到
    pub fn remove_waiter(&mut self, task: TaskId) -> bool {
        match self.waiters.iter().position(|request| request.task == task) {
            Some(index) => {
                self.waiters.remove(index);
                true
            }
            None => false,
        }
    }
}

impl Default for EventGroupCB {
    fn default() -> Self {
        Self::new()
    }
}
