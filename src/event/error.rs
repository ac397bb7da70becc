/// 事件组操作错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventError {
    /// 参数无效（等待掩码为0、使用了保留位、未知标志或堆能力不足）
    InvalidArgument,
    /// 句柄无效（从未创建、已删除或不属于本事件组表）
    InvalidHandle,
    /// 创建事件组时内存不足
    OutOfMemory,
    /// 等待超时
    TimedOut,
    /// 等待期间事件组被删除
    Deleted,
    /// 在中断上下文中阻塞等待
    WaitInInterrupt,
}

impl From<EventError> for u32 {
    fn from(err: EventError) -> u32 {
        match err {
            EventError::InvalidArgument => ERRNO_EVENT_INVALID_ARGUMENT,
            EventError::InvalidHandle => ERRNO_EVENT_INVALID_HANDLE,
            EventError::OutOfMemory => ERRNO_EVENT_NO_MEMORY,
            EventError::TimedOut => ERRNO_EVENT_WAIT_TIMEOUT,
            EventError::Deleted => ERRNO_EVENT_DELETED,
            EventError::WaitInInterrupt => ERRNO_EVENT_WAIT_IN_INTERRUPT,
        }
    }
}

/// 从u32错误码转换为EventError
impl TryFrom<u32> for EventError {
    type Error = ();

    fn try_from(errno: u32) -> Result<Self, Self::Error> {
        match errno {
            ERRNO_EVENT_INVALID_ARGUMENT => Ok(EventError::InvalidArgument),
            ERRNO_EVENT_INVALID_HANDLE => Ok(EventError::InvalidHandle),
            ERRNO_EVENT_NO_MEMORY => Ok(EventError::OutOfMemory),
            ERRNO_EVENT_WAIT_TIMEOUT => Ok(EventError::TimedOut),
            ERRNO_EVENT_DELETED => Ok(EventError::Deleted),
            ERRNO_EVENT_WAIT_IN_INTERRUPT => Ok(EventError::WaitInInterrupt),
            _ => Err(()),
        }
    }
}

impl core::fmt::Display for EventError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let desc = match self {
            Self::InvalidArgument => "Event argument is invalid",
            Self::InvalidHandle => "Event group handle is invalid",
            Self::OutOfMemory => "Out of memory for event group",
            Self::TimedOut => "Event wait timeout",
            Self::Deleted => "Event group deleted while waiting",
            Self::WaitInInterrupt => "Cannot wait for event in interrupt context",
        };
        write!(f, "{}", desc)
    }
}

pub const ERRNO_EVENT_INVALID_ARGUMENT: u32 = 0x02001c00;
pub const ERRNO_EVENT_INVALID_HANDLE: u32 = 0x02001c01;
pub const ERRNO_EVENT_NO_MEMORY: u32 = 0x03001c02;
pub const ERRNO_EVENT_WAIT_TIMEOUT: u32 = 0x02001c03;
pub const ERRNO_EVENT_DELETED: u32 = 0x02001c04;
pub const ERRNO_EVENT_WAIT_IN_INTERRUPT: u32 = 0x02001c05;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_maps_back_to_the_same_error() {
        let all = [
            EventError::InvalidArgument,
            EventError::InvalidHandle,
            EventError::OutOfMemory,
            EventError::TimedOut,
            EventError::Deleted,
            EventError::WaitInInterrupt,
        ];
        for err in all {
            let errno = u32::from(err);
            assert_ne!(errno, 0);
            assert_eq!(EventError::try_from(errno), Ok(err));
        }
        assert_eq!(EventError::try_from(0x02001cff), Err(()));
    }

    #[test]
    fn out_of_memory_is_a_fatal_class_error() {
        assert_eq!(u32::from(EventError::OutOfMemory) >> 24, 0x03);
        assert_eq!(u32::from(EventError::TimedOut) >> 24, 0x02);
    }
}
