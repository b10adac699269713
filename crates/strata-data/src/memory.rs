// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Component buffer allocation.
//!
//! All component memory is requested here. Blocks come from the installed
//! [`HostAllocator`](strata_core::HostAllocator), are reported to the
//! process-wide counters in [`strata_core::memory`] and, with the
//! `memory-tracker` feature, are recorded in a per-thread tracker that validates
//! every free and answers [`owns`] queries.
//!
//! Zero-byte requests never reach the host allocator: they yield a dangling,
//! suitably aligned pointer and freeing them is a no-op.

use std::alloc::Layout;
use std::ptr::NonNull;

use strata_core::memory::{host_allocator, record_allocation, record_deallocation};

/// Allocates an uninitialized block for `layout`.
pub(crate) fn allocate(layout: Layout) -> *mut u8 {
    if layout.size() == 0 {
        return dangling(layout.align());
    }
    let ptr = host_allocator().allocate(layout);
    record_allocation(layout.size());
    #[cfg(feature = "memory-tracker")]
    tracker::on_allocate(ptr.as_ptr(), layout.size());
    ptr.as_ptr()
}

/// Frees a block returned by [`allocate`] with the same layout.
///
/// # Safety
///
/// `ptr` must come from [`allocate`] with `layout` and must not be freed twice.
pub(crate) unsafe fn free(ptr: *mut u8, layout: Layout) {
    if layout.size() == 0 {
        return;
    }
    #[cfg(feature = "memory-tracker")]
    tracker::on_free(ptr, layout.size());
    record_deallocation(layout.size());
    if let Some(ptr) = NonNull::new(ptr) {
        host_allocator().free(ptr, layout);
    }
}

fn dangling(align: usize) -> *mut u8 {
    // An address equal to the alignment is non-null and aligned.
    align as *mut u8
}

/// Returns `true` if `[ptr, ptr + size)` lies inside one live block allocated by this thread.
///
/// Always `true` when the `memory-tracker` feature is disabled.
#[must_use]
pub fn owns(ptr: *const u8, size: usize) -> bool {
    #[cfg(feature = "memory-tracker")]
    {
        tracker::owns(ptr as usize, size)
    }
    #[cfg(not(feature = "memory-tracker"))]
    {
        let _ = (ptr, size);
        true
    }
}

/// Number of component blocks currently allocated by this thread.
///
/// Always 0 when the `memory-tracker` feature is disabled.
#[must_use]
pub fn live_allocation_count() -> usize {
    #[cfg(feature = "memory-tracker")]
    {
        tracker::live_count()
    }
    #[cfg(not(feature = "memory-tracker"))]
    {
        0
    }
}

/// Bytes of component memory currently allocated by this thread.
///
/// Always 0 when the `memory-tracker` feature is disabled.
#[must_use]
pub fn live_bytes() -> usize {
    #[cfg(feature = "memory-tracker")]
    {
        tracker::live_bytes()
    }
    #[cfg(not(feature = "memory-tracker"))]
    {
        0
    }
}

#[cfg(feature = "memory-tracker")]
mod tracker {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use strata_core::strata_assert;

    thread_local! {
        /// Start address -> size of every live block allocated on this thread.
        static BLOCKS: RefCell<BTreeMap<usize, usize>> = const { RefCell::new(BTreeMap::new()) };
    }

    pub(super) fn on_allocate(ptr: *mut u8, size: usize) {
        BLOCKS.with(|blocks| {
            let previous = blocks.borrow_mut().insert(ptr as usize, size);
            strata_assert!(
                previous.is_none(),
                "block {:p} handed out twice by the host allocator",
                ptr
            );
        });
    }

    pub(super) fn on_free(ptr: *mut u8, size: usize) {
        BLOCKS.with(|blocks| {
            let removed = blocks.borrow_mut().remove(&(ptr as usize));
            match removed {
                Some(recorded) => strata_assert!(
                    recorded == size,
                    "block {:p} freed with size {} but was allocated with {}",
                    ptr,
                    size,
                    recorded
                ),
                None => strata_assert!(false, "freeing unknown or already freed block {:p}", ptr),
            }
        });
    }

    pub(super) fn owns(address: usize, size: usize) -> bool {
        BLOCKS.with(|blocks| {
            let blocks = blocks.borrow();
            match blocks.range(..=address).next_back() {
                Some((&start, &len)) => address
                    .checked_add(size)
                    .is_some_and(|end| end <= start + len),
                None => false,
            }
        })
    }

    pub(super) fn live_count() -> usize {
        BLOCKS.with(|blocks| blocks.borrow().len())
    }

    pub(super) fn live_bytes() -> usize {
        BLOCKS.with(|blocks| blocks.borrow().values().sum())
    }
}

#[cfg(all(test, feature = "memory-tracker"))]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_free_tracks_blocks() {
        let before = live_allocation_count();
        let layout = Layout::from_size_align(32, 8).unwrap();
        let ptr = allocate(layout);

        assert_eq!(live_allocation_count(), before + 1);
        assert!(owns(ptr, 32));
        assert!(owns(ptr.wrapping_add(8), 24), "Interior ranges are owned");
        assert!(!owns(ptr.wrapping_add(8), 32), "Ranges past the end are not owned");

        unsafe { free(ptr, layout) };
        assert_eq!(live_allocation_count(), before);
        assert!(!owns(ptr, 1));
    }

    #[test]
    fn test_zero_sized_requests_skip_the_host() {
        let before = live_allocation_count();
        let layout = Layout::from_size_align(0, 16).unwrap();
        let ptr = allocate(layout);

        assert!(!ptr.is_null());
        assert_eq!(ptr as usize % 16, 0);
        assert_eq!(live_allocation_count(), before);
        unsafe { free(ptr, layout) };
    }

    #[test]
    #[should_panic(expected = "freed with size")]
    fn test_free_with_wrong_size_is_fatal() {
        let layout = Layout::from_size_align(16, 8).unwrap();
        let ptr = allocate(layout);
        unsafe { free(ptr, Layout::from_size_align(8, 8).unwrap()) };
    }
}
