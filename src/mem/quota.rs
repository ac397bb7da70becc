//! 事件组内存配额
//!
//! 每个事件组占用调用者配额中的一个单位，删除时归还。

use core::sync::atomic::{AtomicU32, Ordering};

use crate::event::error::EventError;

static NEXT_QUOTA_ID: AtomicU32 = AtomicU32::new(1);

/// 配额ID，用于记录事件组由哪个配额分配
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct QuotaId(u32);

/// 调用者持有的分配能力
#[derive(Debug)]
pub struct HeapCapability {
    id: QuotaId,
    quota: u32,
    used: AtomicU32,
    peak: AtomicU32,
}

impl HeapCapability {
    /// 可以分配`quota`个事件组的配额；配额为0的能力不能用于分配
    pub fn new(quota: u32) -> Self {
        Self {
            id: QuotaId(NEXT_QUOTA_ID.fetch_add(1, Ordering::Relaxed)),
            quota,
            used: AtomicU32::new(0),
            peak: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn id(&self) -> QuotaId {
        self.id
    }

    #[inline]
    pub fn quota(&self) -> u32 {
        self.quota
    }

    #[inline]
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::Acquire)
    }

    /// 历史最大使用量
    #[inline]
    pub fn peak(&self) -> u32 {
        self.peak.load(Ordering::Acquire)
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.quota.saturating_sub(self.used())
    }

    /// 检查能力是否可用于分配
    pub(crate) fn check(&self) -> Result<(), EventError> {
        if self.quota == 0 {
            return Err(EventError::InvalidArgument);
        }
        if self.remaining() == 0 {
            return Err(EventError::OutOfMemory);
        }
        Ok(())
    }

    /// 占用一个单位
    pub(crate) fn charge(&self) -> Result<(), EventError> {
        self.check()?;
        let used = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.quota).then_some(used + 1)
            })
            .map_err(|_| EventError::OutOfMemory)?;
        self.peak.fetch_max(used + 1, Ordering::AcqRel);
        Ok(())
    }

    /// 归还一个单位
    pub(crate) fn refund(&self) {
        let _ = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| used.checked_sub(1));
    }
}
