//! Tick、超时与截止时间

use crate::config::WAIT_FOREVER;

/// 系统tick计数
pub type Tick = u64;

/// 阻塞等待的绝对截止时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// 永不超时
    Never,
    /// 到达该tick时超时
    At(Tick),
}

impl Deadline {
    #[inline]
    pub fn has_passed(self, now: Tick) -> bool {
        match self {
            Deadline::Never => false,
            Deadline::At(tick) => now >= tick,
        }
    }
}

/// 调用方提供的超时
///
/// `remaining`为0表示只做一次检查、不阻塞；`WAIT_FOREVER`表示无限等待。
/// 阻塞返回后`elapsed`累加实际等待的tick数，`remaining`相应减少。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    pub elapsed: u32,
    pub remaining: u32,
}

impl Timeout {
    pub const UNLIMITED: Self = Self::new(WAIT_FOREVER);
    pub const IMMEDIATE: Self = Self::new(0);

    pub const fn new(ticks: u32) -> Self {
        Self {
            elapsed: 0,
            remaining: ticks,
        }
    }

    #[inline]
    pub const fn may_block(&self) -> bool {
        self.remaining > 0
    }

    #[inline]
    pub const fn is_unlimited(&self) -> bool {
        self.remaining == WAIT_FOREVER
    }

    /// 以`now`为起点计算截止时间
    pub fn deadline_from(&self, now: Tick) -> Deadline {
        if self.is_unlimited() {
            Deadline::Never
        } else {
            Deadline::At(now.saturating_add(self.remaining as Tick))
        }
    }

    /// 记录已经过去的tick
    pub fn elapse(&mut self, ticks: Tick) {
        let ticks = u32::try_from(ticks).unwrap_or(u32::MAX);
        self.elapsed = self.elapsed.saturating_add(ticks);
        if !self.is_unlimited() {
            self.remaining = self.remaining.saturating_sub(ticks);
        }
    }
}
