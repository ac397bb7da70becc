//! 事件组对外操作
//!
//! 事件组由24个事件位和一个等待队列组成。任务可以阻塞等待任意或全部
//! 指定位被设置，设置事件位时按入队顺序唤醒所有满足条件的等待者。

use crate::{
    interrupt::{IntLockGuard, IrqMutex, is_interrupt_active},
    mem::quota::HeapCapability,
    println_debug, println_error, println_warning,
    result::{SystemError, SystemResult},
    task::{
        error::TaskError,
        sched::Kernel,
        sync::wait::task_wait,
        types::WakeReason,
    },
    tick::Timeout,
};

use super::{
    core::{
        enqueue, poll, validate_event_bits, validate_event_mask, wake_all, wake_waiting_tasks,
    },
    error::EventError,
    handle::{EventHandle, EventTable},
    types::{EventSetFlags, EventWaitFlags, WaitRequest},
};

/// 事件组控制块表及其依赖的内核服务
pub struct EventGroupTable<K: Kernel> {
    kernel: K,
    table: IrqMutex<EventTable>,
}

impl<K: Kernel> EventGroupTable<K> {
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            table: IrqMutex::new(EventTable::new()),
        }
    }

    #[inline]
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// 创建事件组，事件位全部为0
    ///
    /// 控制块来自定长表，分配不会阻塞，`timeout`保持不变。
    pub fn create(&self, _timeout: &mut Timeout, heap: &HeapCapability) -> SystemResult<EventHandle> {
        let cs = IntLockGuard::new(&self.kernel);
        let mut table = self.table.borrow(&cs);
        let handle = table
            .allocate(heap)
            .inspect_err(|err| println_error!("event group creation failed: {}", err))?;

        println_debug!("event group {} created", handle);
        Ok(handle)
    }

    /// 等待事件位
    ///
    /// 条件满足时返回清除前的事件位。`timeout.remaining`为0时只检查一次；
    /// 否则阻塞到条件满足、超时或事件组被删除，返回时`timeout`记录已等待
    /// 的tick数。
    pub fn bits_wait(
        &self,
        timeout: &mut Timeout,
        handle: EventHandle,
        bits_to_wait: u32,
        flags: EventWaitFlags,
    ) -> SystemResult<u32> {
        validate_event_mask(bits_to_wait)?;

        let kernel = &self.kernel;
        let (task, started) = {
            let cs = IntLockGuard::new(kernel);
            let mut table = self.table.borrow(&cs);
            let event_cb = table.resolve(handle)?;

            if let Some(bits) = poll(event_cb, bits_to_wait, flags) {
                return Ok(bits);
            }

            if !timeout.may_block() {
                return Err(SystemError::Event(EventError::TimedOut));
            }

            if is_interrupt_active(kernel) {
                println_error!("blocking wait on {} from interrupt context", handle);
                return Err(SystemError::Event(EventError::WaitInInterrupt));
            }

            let task = kernel.current_task();
            let started = kernel.now();
            let request = WaitRequest {
                task,
                bits_to_wait,
                flags,
                deadline: timeout.deadline_from(started),
            };
            enqueue(event_cb, request)?;
            task_wait(kernel, task, request.deadline);
            (task, started)
        };

        kernel.yield_now();

        let reason = {
            let cs = IntLockGuard::new(kernel);
            let reason = kernel.take_wake_reason(task);
            if !matches!(reason, Some(WakeReason::Satisfied(_) | WakeReason::Deleted)) {
                // 超时唤醒时等待记录还在队列中
                let mut table = self.table.borrow(&cs);
                if let Ok(event_cb) = table.resolve(handle) {
                    event_cb.remove_waiter(task);
                }
            }
            reason
        };

        timeout.elapse(kernel.now().saturating_sub(started));

        match reason {
            Some(reason) => reason.into_result().map_err(SystemError::Event),
            None => {
                println_error!("task {} resumed without wake reason", task);
                Err(SystemError::Task(TaskError::NotSuspended))
            }
        }
    }

    /// 设置事件位，返回唤醒等待者并清除之后的事件位
    ///
    /// 唤醒了更高优先级的任务时立即让出CPU，除非指定了`NO_YIELD`或者
    /// 在中断上下文中调用。
    pub fn bits_set(
        &self,
        handle: EventHandle,
        bits_to_set: u32,
        flags: EventSetFlags,
    ) -> SystemResult<u32> {
        validate_event_bits(bits_to_set)?;

        let kernel = &self.kernel;
        let (bits, need_schedule) = {
            let cs = IntLockGuard::new(kernel);
            let mut table = self.table.borrow(&cs);
            let event_cb = table.resolve(handle)?;

            event_cb.set_events(bits_to_set);
            let need_schedule = wake_waiting_tasks(kernel, event_cb);
            (event_cb.bits, need_schedule)
        };

        if need_schedule && !flags.contains(EventSetFlags::NO_YIELD) && !is_interrupt_active(kernel)
        {
            kernel.yield_now();
        }

        Ok(bits)
    }

    /// 读取当前事件位
    pub fn bits_get(&self, handle: EventHandle) -> SystemResult<u32> {
        let cs = IntLockGuard::new(&self.kernel);
        let mut table = self.table.borrow(&cs);
        Ok(table.resolve(handle)?.bits)
    }

    /// 清除事件位，返回清除之前的事件位
    ///
    /// 清除不会唤醒任何等待者。
    pub fn bits_clear(&self, handle: EventHandle, bits_to_clear: u32) -> SystemResult<u32> {
        validate_event_bits(bits_to_clear)?;

        let cs = IntLockGuard::new(&self.kernel);
        let mut table = self.table.borrow(&cs);
        let event_cb = table.resolve(handle)?;
        let bits = event_cb.bits;
        event_cb.clear_events(bits_to_clear);
        Ok(bits)
    }

    /// 删除事件组
    ///
    /// 所有等待者以`Deleted`返回，句柄随即失效，控制块归还给`heap`。
    /// 只有创建事件组时使用的配额才能删除它。
    pub fn delete(&self, heap: &HeapCapability, handle: EventHandle) -> SystemResult<()> {
        let kernel = &self.kernel;
        let need_schedule = {
            let cs = IntLockGuard::new(kernel);
            let mut table = self.table.borrow(&cs);
            let mut event_cb = match table.release(handle, heap) {
                Ok(event_cb) => event_cb,
                Err(EventError::InvalidArgument) => {
                    println_warning!("event group {} is not owned by the given heap", handle);
                    return Err(SystemError::Event(EventError::InvalidArgument));
                }
                Err(err) => return Err(SystemError::Event(err)),
            };
            wake_all(kernel, &mut event_cb, WakeReason::Deleted)
        };

        println_debug!("event group {} deleted", handle);

        if need_schedule && !is_interrupt_active(kernel) {
            kernel.yield_now();
        }

        Ok(())
    }

    /// 正在使用的事件组数量
    pub fn len(&self) -> usize {
        let cs = IntLockGuard::new(&self.kernel);
        self.table.borrow(&cs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
