//! 事件组句柄与控制块表

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::{
    config::EVENT_GROUP_LIMIT,
    mem::quota::{HeapCapability, QuotaId},
    println_error,
};

use super::{error::EventError, types::EventGroupCB};

/// 每张控制块表的标识，防止把一张表的句柄用在另一张表上
static NEXT_SEAL: AtomicU32 = AtomicU32::new(1);

/// 事件组句柄
///
/// 句柄只能由`create`得到，字段对外不可见。控制块被删除后槽位的代数
/// 加一，旧句柄随即失效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle {
    seal: u32,
    index: u16,
    generation: u32,
}

impl fmt::Display for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    owner: Option<QuotaId>,
    event_cb: Option<EventGroupCB>,
}

/// 定长的事件组控制块表
#[derive(Debug)]
pub struct EventTable {
    seal: u32,
    slots: heapless::Vec<Slot, EVENT_GROUP_LIMIT>,
}

impl EventTable {
    pub fn new() -> Self {
        Self {
            seal: NEXT_SEAL.fetch_add(1, Ordering::Relaxed),
            slots: heapless::Vec::new(),
        }
    }

    /// 正在使用的控制块数量
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.event_cb.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 从`heap`的配额中分配一个空的控制块
    pub fn allocate(&mut self, heap: &HeapCapability) -> Result<EventHandle, EventError> {
        heap.check()?;

        let index = match self.slots.iter().position(|slot| slot.event_cb.is_none()) {
            Some(index) => index,
            None => {
                let slot = Slot {
                    generation: 0,
                    owner: None,
                    event_cb: None,
                };
                self.slots.push(slot).map_err(|_| EventError::OutOfMemory)?;
                self.slots.len() - 1
            }
        };

        heap.charge()?;
        let slot = &mut self.slots[index];
        slot.owner = Some(heap.id());
        slot.event_cb = Some(EventGroupCB::new());

        Ok(EventHandle {
            seal: self.seal,
            index: index as u16,
            generation: slot.generation,
        })
    }

    fn slot_mut(&mut self, handle: EventHandle) -> Result<&mut Slot, EventError> {
        let seal = self.seal;
        match self.slots.get_mut(handle.index as usize) {
            Some(slot)
                if handle.seal == seal
                    && slot.generation == handle.generation
                    && slot.event_cb.is_some() =>
            {
                Ok(slot)
            }
            _ => {
                println_error!("{} is not a live event group of this table", handle);
                Err(EventError::InvalidHandle)
            }
        }
    }

    /// 将句柄解析为控制块
    pub fn resolve(&mut self, handle: EventHandle) -> Result<&mut EventGroupCB, EventError> {
        self.slot_mut(handle)?
            .event_cb
            .as_mut()
            .ok_or(EventError::InvalidHandle)
    }

    /// 释放控制块并使句柄失效，返回被释放的控制块
    ///
    /// 只有分配该控制块的配额才能释放它。
    pub fn release(
        &mut self,
        handle: EventHandle,
        heap: &HeapCapability,
    ) -> Result<EventGroupCB, EventError> {
        let slot = self.slot_mut(handle)?;
        if slot.owner != Some(heap.id()) {
            return Err(EventError::InvalidArgument);
        }

        let event_cb = slot.event_cb.take().ok_or(EventError::InvalidHandle)?;
        slot.owner = None;
        slot.generation = slot.generation.wrapping_add(1);
        heap.refund();

        Ok(event_cb)
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_handle_becomes_stale() {
        let heap = HeapCapability::new(4);
        let mut table = EventTable::new();

        let handle = table.allocate(&heap).unwrap();
        table.resolve(handle).unwrap().set_events(1);
        assert!(table.release(handle, &heap).is_ok());

        assert_eq!(table.resolve(handle).err(), Some(EventError::InvalidHandle));
        assert_eq!(
            table.release(handle, &heap).err(),
            Some(EventError::InvalidHandle)
        );

        // 槽位被复用后旧句柄仍然无效
        let reused = table.allocate(&heap).unwrap();
        assert_ne!(reused, handle);
        assert_eq!(table.resolve(handle).err(), Some(EventError::InvalidHandle));
        assert_eq!(table.resolve(reused).map(|cb| cb.bits), Ok(0));
    }

    #[test]
    fn handle_from_another_table_is_rejected() {
        let heap = HeapCapability::new(4);
        let mut first = EventTable::new();
        let mut second = EventTable::new();

        let handle = first.allocate(&heap).unwrap();
        second.allocate(&heap).unwrap();
        assert_eq!(second.resolve(handle).err(), Some(EventError::InvalidHandle));
    }

    #[test]
    fn release_requires_owning_capability() {
        let owner = HeapCapability::new(1);
        let other = HeapCapability::new(1);
        let mut table = EventTable::new();

        let handle = table.allocate(&owner).unwrap();
        assert_eq!(
            table.release(handle, &other).err(),
            Some(EventError::InvalidArgument)
        );
        assert!(table.resolve(handle).is_ok());
        assert_eq!(owner.used(), 1);

        assert!(table.release(handle, &owner).is_ok());
        assert_eq!(owner.used(), 0);
    }

    #[test]
    fn table_capacity_is_bounded() {
        let heap = HeapCapability::new(u32::MAX);
        let mut table = EventTable::new();
        for _ in 0..EVENT_GROUP_LIMIT {
            table.allocate(&heap).unwrap();
        }
        assert_eq!(table.allocate(&heap).err(), Some(EventError::OutOfMemory));
        assert_eq!(heap.used(), EVENT_GROUP_LIMIT as u32);
        assert_eq!(table.len(), EVENT_GROUP_LIMIT);
    }
}
