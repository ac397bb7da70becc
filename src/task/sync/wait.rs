use crate::{
    println_debug,
    task::{
        sched::Kernel,
        types::{TaskId, WakeReason},
    },
    tick::Deadline,
};

/// 将任务挂起，等待唤醒或超时
///
/// 调用者需要已经关中断，并且已经把等待记录放入对象的等待队列。
pub fn task_wait<K: Kernel + ?Sized>(kernel: &K, task: TaskId, deadline: Deadline) {
    debug_assert!(kernel.int_locked(), "task_wait requires interrupts disabled");

    kernel.suspend(task, deadline);
    println_debug!("task {} pend, deadline {:?}", task, deadline);
}

/// 唤醒等待中的任务
///
/// 返回`false`表示任务已经被超时唤醒，此次唤醒被丢弃。
pub fn task_wake<K: Kernel + ?Sized>(kernel: &K, task: TaskId, reason: WakeReason) -> bool {
    debug_assert!(kernel.int_locked(), "task_wake requires interrupts disabled");

    let woken = kernel.ready(task, reason);
    if woken {
        println_debug!("task {} woken: {:?}", task, reason);
    }
    woken
}
