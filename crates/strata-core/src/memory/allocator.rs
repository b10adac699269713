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

//! The host allocator seam.

use crate::error::{StrataError, StrataResult};
use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::OnceLock;

/// The allocator the storage engine requests component memory from.
///
/// Any conforming allocator is acceptable. Allocation failure is fatal: an
/// implementation must never return a dangling pointer for a non-zero layout.
pub trait HostAllocator: Send + Sync {
    /// Allocates a block for `layout`. `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> NonNull<u8>;

    /// Frees a block previously returned by [`HostAllocator::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by this allocator with the same `layout`
    /// and must not have been freed already.
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout);

    /// A short name used in diagnostics.
    fn name(&self) -> &'static str {
        "host"
    }
}

/// The default host allocator, backed by the Rust global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl HostAllocator for SystemAllocator {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        debug_assert!(layout.size() > 0, "zero-sized allocations are not forwarded");
        // SAFETY: the layout has a non-zero size.
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).unwrap_or_else(|| std::alloc::handle_alloc_error(layout))
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

static SYSTEM: SystemAllocator = SystemAllocator;
static HOST: OnceLock<&'static dyn HostAllocator> = OnceLock::new();

/// Installs the process-wide host allocator.
///
/// Must be called before the first component allocation; once any allocation
/// happened the system allocator is locked in and installation fails.
pub fn install_host_allocator(allocator: &'static dyn HostAllocator) -> StrataResult<()> {
    HOST.set(allocator)
        .map_err(|_| StrataError::AllocatorAlreadyInstalled(host_allocator().name()))?;
    log::debug!("Installed host allocator '{}'", allocator.name());
    Ok(())
}

/// Returns the installed host allocator, locking in [`SystemAllocator`] if none was installed.
pub fn host_allocator() -> &'static dyn HostAllocator {
    *HOST.get_or_init(|| &SYSTEM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_allocator_round_trip() {
        let layout = Layout::from_size_align(64, 16).unwrap();
        let ptr = SystemAllocator.allocate(layout);
        assert_eq!(ptr.as_ptr() as usize % 16, 0, "Block must honour alignment");

        unsafe {
            ptr.as_ptr().write_bytes(0xAB, 64);
            assert_eq!(*ptr.as_ptr().add(63), 0xAB);
            SystemAllocator.free(ptr, layout);
        }
    }

    #[test]
    fn test_second_installation_fails() {
        // Whatever is installed first, a later installation must be rejected.
        let _ = host_allocator();
        let result = install_host_allocator(&SYSTEM);
        assert!(matches!(
            result,
            Err(StrataError::AllocatorAlreadyInstalled(_))
        ));
    }
}
