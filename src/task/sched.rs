//! 事件组依赖的调度器接口
//!
//! 事件组不负责任务的创建和切换，只通过这里的接口挂起、唤醒当前任务。
//! 所有接口都要求在关中断的临界区内调用（`yield_now`除外）。

use crate::{
    interrupt::Interrupts,
    task::types::{Priority, TaskId, WakeReason},
    tick::{Deadline, Tick},
};

pub trait Scheduler {
    /// 当前运行的任务；中断上下文中返回被中断的任务
    fn current_task(&self) -> TaskId;

    fn priority(&self, task: TaskId) -> Priority;

    /// 将任务移出就绪集合，到达`deadline`仍未被唤醒时以`WakeReason::TimedOut`唤醒
    fn suspend(&self, task: TaskId, deadline: Deadline);

    /// 以`reason`唤醒阻塞中的任务
    ///
    /// 任务已经因为其他原因被唤醒时返回`false`，保留先到的原因。
    fn ready(&self, task: TaskId, reason: WakeReason) -> bool;

    /// 任务是否仍处于阻塞状态
    fn is_pending(&self, task: TaskId) -> bool;

    /// 取出任务最近一次被唤醒的原因
    fn take_wake_reason(&self, task: TaskId) -> Option<WakeReason>;

    /// 让出CPU，选择最高优先级的就绪任务运行
    fn yield_now(&self);
}

/// 系统tick时钟
pub trait Clock {
    fn now(&self) -> Tick;
}

/// 周期计数器，回绕后继续计数
pub trait CycleCounter {
    fn cycles(&self) -> u32;
}

/// 事件组运行所需的全部内核服务
pub trait Kernel: Interrupts + Scheduler + Clock + CycleCounter {}

impl<T: Interrupts + Scheduler + Clock + CycleCounter + ?Sized> Kernel for T {}

/// 唤醒`task`后是否需要抢占当前任务
#[inline]
pub fn preempts_current<S: Scheduler + ?Sized>(sched: &S, task: TaskId) -> bool {
    sched
        .priority(task)
        .is_higher_than(sched.priority(sched.current_task()))
}
