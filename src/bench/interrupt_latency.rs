//! 中断延迟基准测试
//!
//! 高优先级任务关中断等待事件位0；低优先级任务在关中断期间设置该位（不
//! 让出CPU）并记录起始周期数，随后主动让出CPU。高优先级任务被唤醒后立即
//! 读取周期数，两者之差就是从唤醒到目标任务运行的延迟。

use core::sync::atomic::{AtomicU32, Ordering};

use crate::{
    event::{EventError, EventGroupTable, EventHandle, EventSetFlags, EventWaitFlags},
    interrupt::{IntLockGuard, IrqMutex, with_interrupts_disabled},
    mem::quota::HeapCapability,
    println_common, println_debug,
    result::{SystemError, SystemResult},
    task::sched::Kernel,
    tick::Timeout,
};

pub const BENCH_HIGH_PRIORITY: u16 = 1;
pub const BENCH_LOW_PRIORITY: u16 = 2;

const BENCH_EVENT_BIT: u32 = 1;
const BENCH_MILESTONE_LIMIT: usize = 8;

/// 基准测试过程中的关键节点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    /// 高优先级任务发布了事件组句柄
    GroupPublished,
    /// 低优先级任务设置了事件位
    BitsSet,
    /// 低优先级任务记录起始周期数后准备让出CPU
    LowYielding,
    /// 高优先级任务被唤醒
    HighWoken,
    /// 低优先级任务重新运行
    LowResumed,
}

pub struct InterruptBench<K: Kernel> {
    groups: EventGroupTable<K>,
    heap: HeapCapability,
    event_group: IrqMutex<Option<EventHandle>>,
    start: AtomicU32,
    milestones: IrqMutex<heapless::Vec<Milestone, BENCH_MILESTONE_LIMIT>>,
}

impl<K: Kernel> InterruptBench<K> {
    pub fn new(kernel: K) -> Self {
        Self {
            groups: EventGroupTable::new(kernel),
            heap: HeapCapability::new(1),
            event_group: IrqMutex::new(None),
            start: AtomicU32::new(0),
            milestones: IrqMutex::new(heapless::Vec::new()),
        }
    }

    fn mark(&self, cs: &IntLockGuard<'_, K>, milestone: Milestone) {
        let _ = self.milestones.borrow(cs).push(milestone);
    }

    /// 高优先级任务入口，返回测得的延迟
    pub fn entry_high_priority(&self) -> SystemResult<u32> {
        let kernel = self.groups.kernel();
        let mut timeout = Timeout::UNLIMITED;

        let handle = self.groups.create(&mut timeout, &self.heap)?;
        with_interrupts_disabled(kernel, |cs| {
            *self.event_group.borrow(cs) = Some(handle);
            self.mark(cs, Milestone::GroupPublished);
        });

        let end = with_interrupts_disabled(kernel, |cs| -> SystemResult<u32> {
            self.groups.bits_wait(
                &mut timeout,
                handle,
                BENCH_EVENT_BIT,
                EventWaitFlags::WAIT_ALL | EventWaitFlags::CLEAR_ON_EXIT,
            )?;
            let end = kernel.cycles();
            self.mark(cs, Milestone::HighWoken);
            Ok(end)
        })?;

        let latency = end.wrapping_sub(self.start.load(Ordering::Acquire));
        println_common!("Interrupt delivery took {} cycles / instructions", latency);

        self.groups.delete(&self.heap, handle)?;
        Ok(latency)
    }

    /// 低优先级任务入口
    pub fn entry_low_priority(&self) -> SystemResult<()> {
        let kernel = self.groups.kernel();

        println_debug!("before yield");
        with_interrupts_disabled(kernel, |cs| -> SystemResult<()> {
            let handle = (*self.event_group.borrow(cs))
                .ok_or(SystemError::Event(EventError::InvalidHandle))?;
            self.groups
                .bits_set(handle, BENCH_EVENT_BIT, EventSetFlags::NO_YIELD)?;
            self.mark(cs, Milestone::BitsSet);

            self.start.store(kernel.cycles(), Ordering::Release);
            self.mark(cs, Milestone::LowYielding);
            kernel.yield_now();
            Ok(())
        })?;

        with_interrupts_disabled(kernel, |cs| self.mark(cs, Milestone::LowResumed));
        println_debug!("after yield");
        Ok(())
    }

    /// 按发生顺序返回记录的节点
    pub fn into_milestones(self) -> heapless::Vec<Milestone, BENCH_MILESTONE_LIMIT> {
        self.milestones.into_inner()
    }
}

#[cfg(any(test, feature = "std"))]
pub use host::{BenchError, BenchReport, run_on_host};

#[cfg(any(test, feature = "std"))]
mod host {
    use std::fmt;
    use std::sync::{Arc, Mutex, PoisonError};

    use super::{BENCH_HIGH_PRIORITY, BENCH_LOW_PRIORITY, InterruptBench, Milestone};
    use crate::{
        arch::host::{Sim, SimError, SimReport},
        result::SystemError,
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct BenchReport {
        /// 唤醒延迟（周期数）
        pub latency: u32,
        pub milestones: Vec<Milestone>,
        pub sim: SimReport,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum BenchError {
        Spawn(SystemError),
        Sim(SimError),
        Task(SystemError),
        /// 任务没有运行到结束
        Incomplete,
    }

    impl fmt::Display for BenchError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                BenchError::Spawn(err) => write!(f, "failed to spawn task: {}", err),
                BenchError::Sim(err) => write!(f, "simulation failed: {}", err),
                BenchError::Task(err) => write!(f, "benchmark task failed: {}", err),
                BenchError::Incomplete => write!(f, "benchmark did not complete"),
            }
        }
    }

    /// 在主机模拟器上运行基准测试
    pub fn run_on_host() -> Result<BenchReport, BenchError> {
        let mut sim = Sim::new();
        let bench = Arc::new(InterruptBench::new(sim.kernel()));
        let latency = Arc::new(Mutex::new(None));
        let low_result = Arc::new(Mutex::new(None));

        let (high_bench, high_slot) = (bench.clone(), latency.clone());
        sim.spawn("interrupt_bench_high", BENCH_HIGH_PRIORITY, move |_| {
            let result = high_bench.entry_high_priority();
            *high_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        })
        .map_err(BenchError::Spawn)?;

        let (low_bench, low_slot) = (bench.clone(), low_result.clone());
        sim.spawn("interrupt_bench_low", BENCH_LOW_PRIORITY, move |_| {
            let result = low_bench.entry_low_priority();
            *low_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        })
        .map_err(BenchError::Spawn)?;

        let sim = sim.run().map_err(BenchError::Sim)?;

        let low = low_result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let high = latency.lock().unwrap_or_else(PoisonError::into_inner).take();
        let latency = match (high, low) {
            (Some(high), Some(low)) => {
                low.map_err(BenchError::Task)?;
                high.map_err(BenchError::Task)?
            }
            _ => return Err(BenchError::Incomplete),
        };

        let bench = Arc::into_inner(bench).ok_or(BenchError::Incomplete)?;
        Ok(BenchReport {
            latency,
            milestones: bench.into_milestones().into_iter().collect(),
            sim,
        })
    }
}
