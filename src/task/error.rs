/// 任务管理错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// 任务ID无效
    InvalidId,
    /// 任务优先级错误
    PriorityError,
    /// 没有可用的空闲任务
    NoFreeTasks,
    /// 任务没有处于挂起状态
    NotSuspended,
}

/// 将TaskError转换为错误码
impl From<TaskError> for u32 {
    fn from(error: TaskError) -> Self {
        match error {
            TaskError::InvalidId => ERRNO_TSK_ID_INVALID,
            TaskError::PriorityError => ERRNO_TSK_PRIOR_ERROR,
            TaskError::NoFreeTasks => ERRNO_TSK_TCB_UNAVAILABLE,
            TaskError::NotSuspended => ERRNO_TSK_NOT_SUSPENDED,
        }
    }
}

pub const ERRNO_TSK_PRIOR_ERROR: u32 = 0x02000203;
pub const ERRNO_TSK_ID_INVALID: u32 = 0x02000207;
pub const ERRNO_TSK_NOT_SUSPENDED: u32 = 0x02000209;
pub const ERRNO_TSK_TCB_UNAVAILABLE: u32 = 0x02000211;

/// 从u32错误码转换为TaskError
impl TryFrom<u32> for TaskError {
    type Error = ();

    fn try_from(errno: u32) -> Result<Self, Self::Error> {
        match errno {
            ERRNO_TSK_ID_INVALID => Ok(TaskError::InvalidId),
            ERRNO_TSK_PRIOR_ERROR => Ok(TaskError::PriorityError),
            ERRNO_TSK_TCB_UNAVAILABLE => Ok(TaskError::NoFreeTasks),
            ERRNO_TSK_NOT_SUSPENDED => Ok(TaskError::NotSuspended),
            _ => Err(()),
        }
    }
}

impl core::fmt::Display for TaskError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let desc = match self {
            Self::InvalidId => "Task id is invalid",
            Self::PriorityError => "Task priority is out of range",
            Self::NoFreeTasks => "No free task control block",
            Self::NotSuspended => "Task is not suspended",
        };
        write!(f, "{}", desc)
    }
}
