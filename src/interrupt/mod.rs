//! 中断开关与临界区
//!
//! 单核系统中关中断是内核共享状态的唯一互斥手段：关中断期间既不会发生
//! 任务切换，也不会有中断处理函数抢占当前执行流。

pub mod lock;

pub use lock::{IntLockGuard, IrqMutex, with_interrupts_disabled};

/// 关中断前保存的中断状态
///
/// 与PRIMASK的语义一致：最低位为1表示中断已被屏蔽。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct IntSave(u32);

impl IntSave {
    /// 中断使能
    pub const ENABLED: Self = Self(0);
    /// 中断屏蔽
    pub const DISABLED: Self = Self(1);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & 1)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// 保存时中断是否处于使能状态
    #[inline]
    pub const fn was_enabled(self) -> bool {
        self.0 & 1 == 0
    }
}

/// 架构相关的中断控制接口
pub trait Interrupts {
    /// 关中断并返回之前的中断状态
    fn int_lock(&self) -> IntSave;

    /// 恢复到`int_lock`保存的中断状态
    fn int_restore(&self, int_save: IntSave);

    /// 当前是否处于关中断状态
    fn int_locked(&self) -> bool;

    /// 当前是否在中断处理上下文中
    fn in_interrupt(&self) -> bool {
        false
    }
}

#[inline]
pub fn disable_interrupts<I: Interrupts + ?Sized>(irq: &I) -> IntSave {
    irq.int_lock()
}

#[inline]
pub fn restore_interrupt_state<I: Interrupts + ?Sized>(irq: &I, int_save: IntSave) {
    irq.int_restore(int_save);
}

#[inline]
pub fn is_interrupt_active<I: Interrupts + ?Sized>(irq: &I) -> bool {
    irq.in_interrupt()
}
