//! 返回状态码的事件组接口
//!
//! 成功返回`OK`，失败返回错误码；结果通过输出参数返回。

use crate::{
    config::OK,
    mem::quota::HeapCapability,
    result::{SystemError, status_of},
    task::sched::Kernel,
    tick::Timeout,
};

use super::{
    error::EventError,
    group::EventGroupTable,
    handle::EventHandle,
    types::{EventSetFlags, EventWaitFlags},
};

/// 原始标志中是否包含`desired`
#[inline]
pub fn has_event_wait_flag(flags: u32, desired: EventWaitFlags) -> bool {
    flags & desired.bits() == desired.bits()
}

#[inline]
pub fn has_event_set_flag(flags: u32, desired: EventSetFlags) -> bool {
    flags & desired.bits() == desired.bits()
}

fn wait_flags(flags: u32) -> Result<EventWaitFlags, SystemError> {
    EventWaitFlags::from_bits(flags).ok_or(SystemError::Event(EventError::InvalidArgument))
}

fn set_flags(flags: u32) -> Result<EventSetFlags, SystemError> {
    EventSetFlags::from_bits(flags).ok_or(SystemError::Event(EventError::InvalidArgument))
}

impl<K: Kernel> EventGroupTable<K> {
    pub fn event_create(
        &self,
        timeout: &mut Timeout,
        heap: &HeapCapability,
        ret: &mut Option<EventHandle>,
    ) -> u32 {
        match self.create(timeout, heap) {
            Ok(handle) => {
                *ret = Some(handle);
                OK
            }
            Err(e) => e.into(),
        }
    }

    pub fn event_bits_wait(
        &self,
        timeout: &mut Timeout,
        evt: EventHandle,
        ret_bits: &mut u32,
        bits_to_wait: u32,
        flags: u32,
    ) -> u32 {
        let result = wait_flags(flags)
            .and_then(|flags| self.bits_wait(timeout, evt, bits_to_wait, flags));
        match result {
            Ok(bits) => {
                *ret_bits = bits;
                OK
            }
            Err(e) => e.into(),
        }
    }

    pub fn event_bits_set(
        &self,
        evt: EventHandle,
        ret_bits: &mut u32,
        bits_to_set: u32,
        flags: u32,
    ) -> u32 {
        match set_flags(flags).and_then(|flags| self.bits_set(evt, bits_to_set, flags)) {
            Ok(bits) => {
                *ret_bits = bits;
                OK
            }
            Err(e) => e.into(),
        }
    }

    pub fn event_bits_get(&self, evt: EventHandle, ret_bits: &mut u32) -> u32 {
        match self.bits_get(evt) {
            Ok(bits) => {
                *ret_bits = bits;
                OK
            }
            Err(e) => e.into(),
        }
    }

    pub fn event_bits_clear(&self, evt: EventHandle, ret_bits: &mut u32, bits_to_clear: u32) -> u32 {
        match self.bits_clear(evt, bits_to_clear) {
            Ok(bits) => {
                *ret_bits = bits;
                OK
            }
            Err(e) => e.into(),
        }
    }

    pub fn event_delete(&self, heap: &HeapCapability, evt: EventHandle) -> u32 {
        status_of(&self.delete(heap, evt))
    }
}
