//! Cortex-M中断控制与周期计数
//!
//! 用PRIMASK实现临界区，用DWT的CYCCNT作为周期计数器。

use cortex_m::peripheral::scb::VectActive;
use cortex_m::peripheral::{DCB, DWT, SCB};
use cortex_m::register::primask;

use crate::{
    interrupt::{IntSave, Interrupts},
    task::sched::CycleCounter,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CortexM;

impl Interrupts for CortexM {
    #[inline]
    fn int_lock(&self) -> IntSave {
        let int_save = if primask::read().is_active() {
            IntSave::ENABLED
        } else {
            IntSave::DISABLED
        };
        cortex_m::interrupt::disable();
        int_save
    }

    #[inline]
    fn int_restore(&self, int_save: IntSave) {
        if int_save.was_enabled() {
            // SAFETY: 只恢复进入临界区之前已经使能的状态
            unsafe { cortex_m::interrupt::enable() };
        }
    }

    #[inline]
    fn int_locked(&self) -> bool {
        primask::read().is_inactive()
    }

    #[inline]
    fn in_interrupt(&self) -> bool {
        SCB::vect_active() != VectActive::ThreadMode
    }
}

impl CycleCounter for CortexM {
    #[inline]
    fn cycles(&self) -> u32 {
        DWT::cycle_count()
    }
}

/// 使能DWT周期计数器并清零
pub fn enable_cycle_counter(dcb: &mut DCB, dwt: &mut DWT) {
    dcb.enable_trace();
    dwt.set_cycle_count(0);
    dwt.enable_cycle_counter();
}
