use bitflags::bitflags;
use core::fmt;

use crate::{
    config::{TASK_LIMIT, TASK_PRIORITY_HIGHEST, TASK_PRIORITY_LOWEST},
    event::error::EventError,
    task::error::TaskError,
};

/// 任务ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TaskId(u32);

impl TaskId {
    pub fn new(raw: u32) -> Result<Self, TaskError> {
        if (raw as usize) < TASK_LIMIT {
            Ok(Self(raw))
        } else {
            Err(TaskError::InvalidId)
        }
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 任务优先级，数值越小优先级越高
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Priority(u16);

impl Priority {
    pub const HIGHEST: Self = Self(TASK_PRIORITY_HIGHEST);
    pub const LOWEST: Self = Self(TASK_PRIORITY_LOWEST);

    pub fn new(raw: u16) -> Result<Self, TaskError> {
        if raw <= TASK_PRIORITY_LOWEST {
            Ok(Self(raw))
        } else {
            Err(TaskError::PriorityError)
        }
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// 是否严格高于`other`
    #[inline]
    pub const fn is_higher_than(self, other: Priority) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct TaskStatus: u16 {
        const READY = 0x0004;     // 任务就绪
        const PEND = 0x0008;      // 任务阻塞
        const RUNNING = 0x0010;   // 任务运行中
        const TIMEOUT = 0x0040;   // 等待事件超时
        const PEND_TIME = 0x0080; // 任务等待特定时间
        const EXITED = 0x0100;    // 任务入口函数已返回

        /// 任务阻塞状态掩码
        const BLOCKED = Self::PEND.bits() | Self::PEND_TIME.bits();
    }
}

/// 阻塞任务被唤醒的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// 等待条件满足，携带满足时（清除前）的事件位
    Satisfied(u32),
    /// 截止时间到达
    TimedOut,
    /// 等待的对象被删除
    Deleted,
}

impl WakeReason {
    /// 转换为等待操作的返回值
    pub fn into_result(self) -> Result<u32, EventError> {
        match self {
            WakeReason::Satisfied(bits) => Ok(bits),
            WakeReason::TimedOut => Err(EventError::TimedOut),
            WakeReason::Deleted => Err(EventError::Deleted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smaller_value_means_higher_priority() {
        let high = Priority::new(1).unwrap();
        let low = Priority::new(9).unwrap();
        assert!(high.is_higher_than(low));
        assert!(!low.is_higher_than(high));
        assert!(!high.is_higher_than(high));
        assert!(Priority::HIGHEST.is_higher_than(Priority::LOWEST));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(
            Priority::new(TASK_PRIORITY_LOWEST + 1),
            Err(TaskError::PriorityError)
        );
        assert_eq!(TaskId::new(TASK_LIMIT as u32), Err(TaskError::InvalidId));
        assert_eq!(TaskId::new(3).map(TaskId::index), Ok(3));
    }

    #[test]
    fn wake_reason_maps_to_wait_result() {
        assert_eq!(WakeReason::Satisfied(0x12).into_result(), Ok(0x12));
        assert_eq!(
            WakeReason::TimedOut.into_result(),
            Err(EventError::TimedOut)
        );
        assert_eq!(WakeReason::Deleted.into_result(), Err(EventError::Deleted));
    }
}
