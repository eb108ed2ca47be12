//! Frame memory limit, to exercise the row-streaming path on the desktop.

use std::mem::size_of;

use bootsplash_common::render::{FrameAllocator, HeapAllocator};

/// Heap allocator that refuses requests above a byte limit.
#[derive(Clone, Copy, Default, Debug)]
pub struct FrameBudget {
    limit: Option<usize>,
    refused: u32,
}

impl FrameBudget {
    /// `None` means unlimited.
    pub const fn new(limit: Option<usize>) -> Self { Self { limit, refused: 0 } }

    /// Requests turned down so far.
    #[inline]
    pub const fn refused(&self) -> u32 { self.refused }
}

impl FrameAllocator for FrameBudget {
    fn try_alloc<P: Copy>(
        &mut self,
        len: usize,
        fill: P,
    ) -> Option<Vec<P>> {
        let bytes = len.checked_mul(size_of::<P>())?;
        if let Some(limit) = self.limit.filter(|&limit| bytes > limit) {
            log::debug!("refusing {} byte buffer (limit {})", bytes, limit);
            self.refused += 1;
            return None;
        }
        HeapAllocator.try_alloc(len, fill)
    }
}
