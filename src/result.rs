use crate::{event::error::EventError, task::error::TaskError};

pub type SystemResult<T> = Result<T, SystemError>;

/// 系统级通用错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemError {
    /// 任务相关错误
    Task(TaskError),
    /// 事件操作错误类型
    Event(EventError),
    /// 未知错误码
    Unknown(u32),
}

impl From<TaskError> for SystemError {
    fn from(err: TaskError) -> Self {
        SystemError::Task(err)
    }
}

impl From<EventError> for SystemError {
    fn from(err: EventError) -> Self {
        SystemError::Event(err)
    }
}

impl From<SystemError> for u32 {
    fn from(error: SystemError) -> Self {
        match error {
            SystemError::Task(err) => u32::from(err),
            SystemError::Event(err) => u32::from(err),
            SystemError::Unknown(errno) => errno,
        }
    }
}

impl core::fmt::Display for SystemError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SystemError::Task(err) => write!(f, "Task error: {}", err),
            SystemError::Event(err) => write!(f, "Event error: {}", err),
            SystemError::Unknown(code) => write!(f, "Unknown error: 0x{:08x}", code),
        }
    }
}

pub struct ErrorCode(pub u32);

impl From<ErrorCode> for SystemResult<()> {
    fn from(code: ErrorCode) -> Self {
        let errno = code.0;
        if errno == 0 {
            Ok(())
        } else if let Ok(task_error) = TaskError::try_from(errno) {
            Err(SystemError::Task(task_error))
        } else if let Ok(event_error) = EventError::try_from(errno) {
            Err(SystemError::Event(event_error))
        } else {
            Err(SystemError::Unknown(errno))
        }
    }
}

/// 将操作结果转换为状态码，0表示成功
#[inline]
pub fn status_of<T>(result: &SystemResult<T>) -> u32 {
    match result {
        Ok(_) => crate::config::OK,
        Err(err) => u32::from(*err),
    }
}
