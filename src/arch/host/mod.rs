//! 主机端单核模拟器
//!
//! 每个任务运行在一个宿主线程上，但任意时刻只有`current`指向的任务在执行，
//! 其余线程都阻塞在条件变量上。任务切换就是把`current`交给下一个任务并
//! 唤醒所有线程。没有任务就绪时时钟直接跳到最早的截止时间。
//!
//! 时钟只在没有任务就绪时前进，`yield_now`不会推进时钟。一个反复让出CPU
//! 但始终就绪的任务会推迟所有截止时间的到期，即使等待者的优先级更高。

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::{
    config::{SIM_CONTEXT_SWITCH_CYCLES, SIM_INTERRUPT_ENTRY_CYCLES, TASK_LIMIT},
    interrupt::{IntSave, Interrupts},
    println_debug, println_error, println_warning,
    result::SystemResult,
    task::{
        error::TaskError,
        sched::{Clock, CycleCounter, Scheduler},
        types::{Priority, TaskId, TaskStatus, WakeReason},
    },
    tick::{Deadline, Tick},
};

/// 中断处理函数，在被中断任务的线程上以中断上下文执行
pub type InterruptHandler = Box<dyn FnOnce(&SimKernel) + Send + 'static>;

/// 调度轨迹记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// 任务阻塞
    Suspended(TaskId),
    /// 阻塞任务被唤醒
    Readied(TaskId),
    /// 阻塞任务超时
    Expired(TaskId),
    /// 任务切换
    Switched { from: Option<TaskId>, to: TaskId },
    /// 进入中断，记录被中断的任务
    Interrupt(TaskId),
    /// 任务入口函数返回
    Exited(TaskId),
}

/// 一次模拟运行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimReport {
    pub trace: Vec<SimEvent>,
    pub cycles: u32,
    pub now: Tick,
}

impl SimReport {
    /// 轨迹中第一条满足条件的记录的位置
    pub fn position(&self, predicate: impl Fn(&SimEvent) -> bool) -> Option<usize> {
        self.trace.iter().position(predicate)
    }

    pub fn count(&self, predicate: impl Fn(&SimEvent) -> bool) -> usize {
        self.trace.iter().filter(|event| predicate(event)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// 所有未退出的任务都无限期阻塞
    Deadlock { blocked: Vec<&'static str> },
    /// 任务入口函数panic
    TaskPanicked(&'static str),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Deadlock { blocked } => write!(f, "deadlock, blocked tasks: {:?}", blocked),
            SimError::TaskPanicked(name) => write!(f, "task '{}' panicked", name),
        }
    }
}

struct SimTask {
    id: TaskId,
    name: &'static str,
    priority: Priority,
    status: TaskStatus,
    deadline: Deadline,
    wake_reason: Option<WakeReason>,
    /// 任务自己的中断屏蔽状态，切换时随任务保存
    int_masked: bool,
    /// 进入就绪状态的顺序，同优先级先就绪先运行
    ready_seq: u64,
    panicked: bool,
}

struct SimState {
    tasks: Vec<SimTask>,
    current: Option<TaskId>,
    now: Tick,
    cycles: u32,
    seq: u64,
    isr_depth: u32,
    /// 没有任务运行时（启动前、结束后）的中断屏蔽状态
    boot_int_masked: bool,
    pending_irqs: VecDeque<InterruptHandler>,
    trace: Vec<SimEvent>,
    deadlock: bool,
}

impl SimState {
    fn new() -> Self {
        Self {
            tasks: Vec::new(),
            current: None,
            now: 0,
            cycles: 0,
            seq: 0,
            isr_depth: 0,
            boot_int_masked: false,
            pending_irqs: VecDeque::new(),
            trace: Vec::new(),
            deadlock: false,
        }
    }

    #[inline]
    fn charge(&mut self, cycles: u32) {
        self.cycles = self.cycles.wrapping_add(cycles);
    }

    #[inline]
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn running(&self) -> TaskId {
        self.current
            .expect("kernel service used outside of a simulated task")
    }

    /// 当前执行流的中断屏蔽状态
    fn int_masked(&self) -> bool {
        match self.current {
            Some(task) => self.task(task).int_masked,
            None => self.boot_int_masked,
        }
    }

    fn int_masked_mut(&mut self) -> &mut bool {
        match self.current {
            Some(task) => &mut self.tasks[task.index()].int_masked,
            None => &mut self.boot_int_masked,
        }
    }

    fn task(&self, task: TaskId) -> &SimTask {
        &self.tasks[task.index()]
    }

    fn task_mut(&mut self, task: TaskId) -> &mut SimTask {
        &mut self.tasks[task.index()]
    }

    /// 最高优先级的就绪任务
    fn pick_next(&self) -> Option<TaskId> {
        self.tasks
            .iter()
            .filter(|task| task.status.contains(TaskStatus::READY))
            .min_by_key(|task| (task.priority.raw(), task.ready_seq))
            .map(|task| task.id)
    }

    fn higher_priority_ready(&self, me: TaskId) -> bool {
        let mine = self.task(me).priority;
        self.tasks.iter().any(|task| {
            task.id != me
                && task.status.contains(TaskStatus::READY)
                && task.priority.is_higher_than(mine)
        })
    }

    fn switch_to(&mut self, next: TaskId) {
        let from = self.current;
        if let Some(prev) = from {
            self.task_mut(prev).status.remove(TaskStatus::RUNNING);
        }
        self.task_mut(next).status.insert(TaskStatus::RUNNING);
        self.current = Some(next);
        self.charge(SIM_CONTEXT_SWITCH_CYCLES);
        self.trace.push(SimEvent::Switched { from, to: next });
    }

    /// 唤醒阻塞任务，任务已不在阻塞状态时返回false
    fn wake(&mut self, task: TaskId, reason: WakeReason) -> bool {
        let seq = self.next_seq();
        let task = self.task_mut(task);
        if !task.status.contains(TaskStatus::PEND) {
            return false;
        }
        task.status.remove(TaskStatus::BLOCKED);
        task.status.insert(TaskStatus::READY);
        task.deadline = Deadline::Never;
        task.wake_reason = Some(reason);
        task.ready_seq = seq;
        true
    }

    /// 时钟跳到最早的截止时间，唤醒所有到期的任务
    fn expire_earliest(&mut self) -> bool {
        let earliest = self
            .tasks
            .iter()
            .filter(|task| task.status.contains(TaskStatus::PEND))
            .filter_map(|task| match task.deadline {
                Deadline::At(tick) => Some(tick),
                Deadline::Never => None,
            })
            .min();
        let Some(tick) = earliest else {
            return false;
        };

        self.now = self.now.max(tick);
        let now = self.now;
        for index in 0..self.tasks.len() {
            let task = &self.tasks[index];
            if task.status.contains(TaskStatus::PEND) && task.deadline.has_passed(now) {
                let id = task.id;
                self.wake(id, WakeReason::TimedOut);
                self.tasks[index].status.insert(TaskStatus::TIMEOUT);
                self.trace.push(SimEvent::Expired(id));
            }
        }
        true
    }

    fn all_exited(&self) -> bool {
        self.tasks
            .iter()
            .all(|task| task.status.contains(TaskStatus::EXITED))
    }

    fn finished(&self) -> bool {
        self.deadlock || self.all_exited()
    }

    fn blocked_names(&self) -> Vec<&'static str> {
        self.tasks
            .iter()
            .filter(|task| task.status.contains(TaskStatus::PEND))
            .map(|task| task.name)
            .collect()
    }
}

struct SimShared {
    state: Mutex<SimState>,
    turn: Condvar,
}

impl SimShared {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_for_turn<'a>(
        &'a self,
        mut state: MutexGuard<'a, SimState>,
        me: TaskId,
    ) -> MutexGuard<'a, SimState> {
        while state.current != Some(me) {
            state = self.turn.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        state
    }

    /// 切换到最高优先级的就绪任务，等到`me`再次被选中后返回
    fn reschedule<'a>(
        &'a self,
        mut state: MutexGuard<'a, SimState>,
        me: TaskId,
    ) -> MutexGuard<'a, SimState> {
        loop {
            match state.pick_next() {
                Some(next) if next == me => return state,
                Some(next) => {
                    state.switch_to(next);
                    break;
                }
                None if state.expire_earliest() => continue,
                None => {
                    state.current = None;
                    state.deadlock = true;
                    break;
                }
            }
        }
        self.turn.notify_all();
        self.wait_for_turn(state, me)
    }

    fn exit(&self, me: TaskId, panicked: bool) {
        let mut state = self.lock();
        let task = state.task_mut(me);
        task.status = TaskStatus::EXITED;
        task.panicked = panicked;
        state.trace.push(SimEvent::Exited(me));

        loop {
            match state.pick_next() {
                Some(next) => {
                    state.switch_to(next);
                    break;
                }
                None if state.expire_earliest() => continue,
                None => {
                    state.current = None;
                    state.deadlock = !state.all_exited();
                    break;
                }
            }
        }
        self.turn.notify_all();
    }
}

/// 模拟器提供给任务的内核服务
#[derive(Clone)]
pub struct SimKernel {
    shared: Arc<SimShared>,
}

impl SimKernel {
    /// 触发一次软件中断
    ///
    /// 当前任务中断使能时立即执行`handler`，否则挂起到中断重新使能时执行。
    /// 没有任务运行时中断一直挂起，直到某个任务以中断使能的状态运行。
    pub fn raise_interrupt<F>(&self, handler: F)
    where
        F: FnOnce(&SimKernel) + Send + 'static,
    {
        let deliver = {
            let mut state = self.shared.lock();
            state.pending_irqs.push_back(Box::new(handler));
            state.isr_depth == 0 && !state.int_masked()
        };
        if deliver {
            self.deliver_pending();
        }
    }

    /// 执行所有挂起的中断，中断返回时检查是否需要抢占
    fn deliver_pending(&self) {
        loop {
            let (me, handler) = {
                let mut state = self.shared.lock();
                if state.isr_depth > 0 {
                    return;
                }
                let Some(me) = state.current else {
                    return;
                };
                if state.task(me).int_masked {
                    return;
                }
                let Some(handler) = state.pending_irqs.pop_front() else {
                    return;
                };
                state.isr_depth += 1;
                state.task_mut(me).int_masked = true;
                state.charge(SIM_INTERRUPT_ENTRY_CYCLES);
                state.trace.push(SimEvent::Interrupt(me));
                (me, handler)
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(move || handler(self)));

            let mut state = self.shared.lock();
            state.isr_depth -= 1;
            state.task_mut(me).int_masked = false;
            if let Err(payload) = outcome {
                drop(state);
                panic::resume_unwind(payload);
            }
            if state.higher_priority_ready(me) {
                println_debug!("task {} preempted at interrupt exit", me);
                drop(self.shared.reschedule(state, me));
            }
        }
    }

    fn task_entry<F>(self, me: TaskId, name: &'static str, entry: F)
    where
        F: FnOnce(SimKernel),
    {
        drop(self.shared.wait_for_turn(self.shared.lock(), me));
        self.deliver_pending();

        let kernel = self.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(move || entry(kernel)));
        if outcome.is_err() {
            println_error!("task '{}' panicked", name);
        }
        self.shared.exit(me, outcome.is_err());
    }
}

impl Interrupts for SimKernel {
    fn int_lock(&self) -> IntSave {
        let mut state = self.shared.lock();
        state.charge(1);
        let masked = state.int_masked_mut();
        let int_save = if *masked {
            IntSave::DISABLED
        } else {
            IntSave::ENABLED
        };
        *masked = true;
        int_save
    }

    fn int_restore(&self, int_save: IntSave) {
        let deliver = {
            let mut state = self.shared.lock();
            state.charge(1);
            *state.int_masked_mut() = !int_save.was_enabled();
            int_save.was_enabled()
                && state.isr_depth == 0
                && state.current.is_some()
                && !state.pending_irqs.is_empty()
        };
        if deliver {
            self.deliver_pending();
        }
    }

    fn int_locked(&self) -> bool {
        let state = self.shared.lock();
        state.isr_depth > 0 || state.int_masked()
    }

    fn in_interrupt(&self) -> bool {
        self.shared.lock().isr_depth > 0
    }
}

impl Scheduler for SimKernel {
    fn current_task(&self) -> TaskId {
        let mut state = self.shared.lock();
        state.charge(1);
        state.running()
    }

    fn priority(&self, task: TaskId) -> Priority {
        self.shared.lock().task(task).priority
    }

    fn suspend(&self, task: TaskId, deadline: Deadline) {
        let mut state = self.shared.lock();
        state.charge(1);
        let sim_task = state.task_mut(task);
        sim_task.status.remove(TaskStatus::READY);
        sim_task.status.insert(TaskStatus::PEND);
        if let Deadline::At(_) = deadline {
            sim_task.status.insert(TaskStatus::PEND_TIME);
        }
        sim_task.deadline = deadline;
        sim_task.wake_reason = None;
        state.trace.push(SimEvent::Suspended(task));
    }

    fn ready(&self, task: TaskId, reason: WakeReason) -> bool {
        let mut state = self.shared.lock();
        state.charge(1);
        let woken = state.wake(task, reason);
        if woken {
            state.trace.push(SimEvent::Readied(task));
        }
        woken
    }

    fn is_pending(&self, task: TaskId) -> bool {
        self.shared
            .lock()
            .task(task)
            .status
            .contains(TaskStatus::PEND)
    }

    fn take_wake_reason(&self, task: TaskId) -> Option<WakeReason> {
        let mut state = self.shared.lock();
        let sim_task = state.task_mut(task);
        sim_task.status.remove(TaskStatus::TIMEOUT);
        sim_task.wake_reason.take()
    }

    fn yield_now(&self) {
        {
            let mut state = self.shared.lock();
            state.charge(1);
            let me = state.running();
            if state.isr_depth > 0 {
                println_warning!("task {} yield in interrupt context ignored", me);
                return;
            }
            if state.task(me).status.contains(TaskStatus::READY) {
                let seq = state.next_seq();
                state.task_mut(me).ready_seq = seq;
            }
            drop(self.shared.reschedule(state, me));
        }
        self.deliver_pending();
    }
}

impl Clock for SimKernel {
    fn now(&self) -> Tick {
        self.shared.lock().now
    }
}

impl CycleCounter for SimKernel {
    fn cycles(&self) -> u32 {
        self.shared.lock().cycles
    }
}

/// 单核模拟器
pub struct Sim {
    kernel: SimKernel,
    threads: Vec<JoinHandle<()>>,
}

impl Sim {
    pub fn new() -> Self {
        Self {
            kernel: SimKernel {
                shared: Arc::new(SimShared {
                    state: Mutex::new(SimState::new()),
                    turn: Condvar::new(),
                }),
            },
            threads: Vec::new(),
        }
    }

    /// 供任务共享的内核服务句柄
    pub fn kernel(&self) -> SimKernel {
        self.kernel.clone()
    }

    /// 创建任务，任务在`run`之后才开始执行
    pub fn spawn<F>(&mut self, name: &'static str, priority: u16, entry: F) -> SystemResult<TaskId>
    where
        F: FnOnce(SimKernel) + Send + 'static,
    {
        let priority = Priority::new(priority)?;
        let index = self.kernel.shared.lock().tasks.len();
        if index >= TASK_LIMIT {
            return Err(TaskError::NoFreeTasks.into());
        }
        let id = TaskId::new(index as u32)?;

        let kernel = self.kernel.clone();
        let thread = thread::Builder::new()
            .name(name.into())
            .spawn(move || kernel.task_entry(id, name, entry))
            .map_err(|_| TaskError::NoFreeTasks)?;
        self.threads.push(thread);

        let seq = {
            let mut state = self.kernel.shared.lock();
            let seq = state.next_seq();
            state.tasks.push(SimTask {
                id,
                name,
                priority,
                status: TaskStatus::READY,
                deadline: Deadline::Never,
                wake_reason: None,
                int_masked: false,
                ready_seq: seq,
                panicked: false,
            });
            seq
        };
        println_debug!("task '{}' created, id {}, priority {}, seq {}", name, id, priority, seq);

        Ok(id)
    }

    /// 运行到所有任务退出
    pub fn run(self) -> Result<SimReport, SimError> {
        let shared = &self.kernel.shared;
        {
            let mut state = shared.lock();
            if let Some(first) = state.pick_next() {
                state.switch_to(first);
            }
            shared.turn.notify_all();

            while !state.finished() {
                state = shared.turn.wait(state).unwrap_or_else(PoisonError::into_inner);
            }
            if state.deadlock {
                // 阻塞的线程永远等不到调度，不再回收
                return Err(SimError::Deadlock {
                    blocked: state.blocked_names(),
                });
            }
        }

        for thread in self.threads {
            let _ = thread.join();
        }

        let mut state = shared.lock();
        if let Some(task) = state.tasks.iter().find(|task| task.panicked) {
            return Err(SimError::TaskPanicked(task.name));
        }
        Ok(SimReport {
            trace: std::mem::take(&mut state.trace),
            cycles: state.cycles,
            now: state.now,
        })
    }
}

impl Default for Sim {
    fn default() -> Self {
        Self::new()
    }
}
