use core::cell::{RefCell, RefMut};
use core::marker::PhantomData;

use super::{IntSave, Interrupts};

/// 关中断临界区守卫
///
/// 创建时关中断并保存之前的状态，析构时恢复到保存的状态。正常返回、
/// `?`提前返回以及panic展开都会经过`Drop`，因此任何退出路径都会恢复中断
/// 状态。嵌套使用时内层守卫恢复的是"已关中断"，不会提前打开中断。
#[must_use = "临界区在守卫析构时结束"]
pub struct IntLockGuard<'a, I: Interrupts + ?Sized> {
    irq: &'a I,
    int_save: IntSave,
    // 守卫只能在创建它的执行流中释放
    _not_send: PhantomData<*mut ()>,
}

impl<'a, I: Interrupts + ?Sized> IntLockGuard<'a, I> {
    #[inline]
    pub fn new(irq: &'a I) -> Self {
        let int_save = irq.int_lock();
        Self {
            irq,
            int_save,
            _not_send: PhantomData,
        }
    }

    /// 进入临界区之前的中断状态
    #[inline]
    pub fn int_save(&self) -> IntSave {
        self.int_save
    }
}

impl<I: Interrupts + ?Sized> Drop for IntLockGuard<'_, I> {
    #[inline]
    fn drop(&mut self) {
        self.irq.int_restore(self.int_save);
    }
}

/// 在关中断的临界区内执行闭包
///
/// ```ignore
/// with_interrupts_disabled(&kernel, |_cs| {
///     // 访问共享状态
/// });
/// ```
#[inline]
pub fn with_interrupts_disabled<I, F, R>(irq: &I, f: F) -> R
where
    I: Interrupts + ?Sized,
    F: FnOnce(&IntLockGuard<'_, I>) -> R,
{
    let guard = IntLockGuard::new(irq);
    f(&guard)
}

/// 只能在临界区内访问的数据
///
/// 借用需要出示一个`IntLockGuard`，保证访问发生在关中断期间。
pub struct IrqMutex<T> {
    inner: RefCell<T>,
}

// SAFETY: 单核系统中只有持有IntLockGuard（关中断）才能借用内部数据，此时不会
// 有其他执行流并发访问；RefCell的运行时检查防止同一执行流内的重复借用。
unsafe impl<T: Send> Sync for IrqMutex<T> {}

impl<T> IrqMutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: RefCell::new(value),
        }
    }

    #[inline]
    pub fn borrow<'cs, I: Interrupts + ?Sized>(
        &'cs self,
        _cs: &'cs IntLockGuard<'_, I>,
    ) -> RefMut<'cs, T> {
        self.inner.borrow_mut()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
