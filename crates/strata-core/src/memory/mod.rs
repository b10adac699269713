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

//! Process-wide statistics for component storage memory.
//!
//! Every component buffer the engine allocates goes through the installed
//! [`HostAllocator`] and is reported here with [`record_allocation`] and
//! [`record_deallocation`]. Any part of the program can read the counters with
//! [`get_storage_memory_stats`] in a thread-safe manner.

mod allocator;

pub use allocator::{host_allocator, install_host_allocator, HostAllocator, SystemAllocator};

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// The size, in bytes, above which an allocation is considered "large".
pub const LARGE_ALLOCATION_THRESHOLD: usize = 1024 * 1024; // 1MB
/// The size, in bytes, below which an allocation is considered "small".
pub const SMALL_ALLOCATION_THRESHOLD: usize = 1024; // 1KB

// --- Global Memory Counters ---

/// Bytes of component storage currently allocated.
pub static CURRENTLY_ALLOCATED_BYTES: AtomicUsize = AtomicUsize::new(0);

/// Peak bytes of component storage allocated simultaneously.
pub static PEAK_ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);

/// Number of component buffer allocations.
pub static TOTAL_ALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// Number of component buffer frees.
pub static TOTAL_DEALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// Cumulative bytes ever allocated for component storage.
pub static BYTES_ALLOCATED_LIFETIME: AtomicU64 = AtomicU64::new(0);

/// Cumulative bytes ever freed from component storage.
pub static BYTES_DEALLOCATED_LIFETIME: AtomicU64 = AtomicU64::new(0);

/// Number of "large" allocations (>= 1MB).
pub static LARGE_ALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// Number of "small" allocations (< 1KB).
pub static SMALL_ALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// A snapshot of the storage memory counters, including derived metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageMemoryStats {
    /// Bytes currently in use.
    pub current_allocated_bytes: usize,
    /// The maximum number of bytes that were ever in use simultaneously.
    pub peak_allocated_bytes: u64,
    /// Number of allocations requested.
    pub total_allocations: u64,
    /// Number of frees requested.
    pub total_deallocations: u64,
    /// Active allocations (`total_allocations` - `total_deallocations`).
    pub net_allocations: i64,
    /// Sum of all bytes ever allocated.
    pub bytes_allocated_lifetime: u64,
    /// Sum of all bytes ever freed.
    pub bytes_deallocated_lifetime: u64,
    /// Number of allocations classified as "large".
    pub large_allocations: u64,
    /// Number of allocations classified as "small".
    pub small_allocations: u64,
    /// Number of allocations that are neither small nor large.
    pub medium_allocations: u64,
    /// Average size of a single allocation.
    pub average_allocation_size: f64,
}

impl StorageMemoryStats {
    /// Populates the derived metrics based on the raw counter values.
    pub fn calculate_derived_metrics(&mut self) {
        self.net_allocations = self.total_allocations as i64 - self.total_deallocations as i64;

        if self.total_allocations > 0 {
            self.average_allocation_size =
                self.bytes_allocated_lifetime as f64 / self.total_allocations as f64;
        }

        self.medium_allocations = self
            .total_allocations
            .saturating_sub(self.small_allocations + self.large_allocations);
    }
}

/// Records a successful allocation of `size` bytes.
pub fn record_allocation(size: usize) {
    let result = CURRENTLY_ALLOCATED_BYTES.fetch_update(
        Ordering::Relaxed,
        Ordering::Relaxed,
        |current| current.checked_add(size),
    );

    match result {
        Ok(previous) => {
            PEAK_ALLOCATED_BYTES.fetch_max((previous + size) as u64, Ordering::Relaxed);
            TOTAL_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
            BYTES_ALLOCATED_LIFETIME.fetch_add(size as u64, Ordering::Relaxed);

            if size >= LARGE_ALLOCATION_THRESHOLD {
                LARGE_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
            } else if size < SMALL_ALLOCATION_THRESHOLD {
                SMALL_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
            }
        }
        Err(_) => log::error!("Storage memory counter overflowed during alloc! Size: {size}"),
    }
}

/// Records the release of `size` bytes.
pub fn record_deallocation(size: usize) {
    let result = CURRENTLY_ALLOCATED_BYTES.fetch_update(
        Ordering::Relaxed,
        Ordering::Relaxed,
        |current| current.checked_sub(size),
    );

    if result.is_err() {
        log::error!("Storage memory counter underflowed during free! Size: {size}");
    } else {
        TOTAL_DEALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        BYTES_DEALLOCATED_LIFETIME.fetch_add(size as u64, Ordering::Relaxed);
    }
}

/// Takes a snapshot of all storage memory counters.
pub fn get_storage_memory_stats() -> StorageMemoryStats {
    let mut stats = StorageMemoryStats {
        current_allocated_bytes: CURRENTLY_ALLOCATED_BYTES.load(Ordering::Relaxed),
        peak_allocated_bytes: PEAK_ALLOCATED_BYTES.load(Ordering::Relaxed),
        total_allocations: TOTAL_ALLOCATIONS.load(Ordering::Relaxed),
        total_deallocations: TOTAL_DEALLOCATIONS.load(Ordering::Relaxed),
        bytes_allocated_lifetime: BYTES_ALLOCATED_LIFETIME.load(Ordering::Relaxed),
        bytes_deallocated_lifetime: BYTES_DEALLOCATED_LIFETIME.load(Ordering::Relaxed),
        large_allocations: LARGE_ALLOCATIONS.load(Ordering::Relaxed),
        small_allocations: SMALL_ALLOCATIONS.load(Ordering::Relaxed),
        ..Default::default()
    };

    stats.calculate_derived_metrics();
    stats
}

/// Bytes of component storage currently allocated.
pub fn get_currently_allocated_bytes() -> usize {
    CURRENTLY_ALLOCATED_BYTES.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_metrics() {
        let mut stats = StorageMemoryStats {
            total_allocations: 10,
            total_deallocations: 4,
            bytes_allocated_lifetime: 1000,
            small_allocations: 6,
            large_allocations: 1,
            ..Default::default()
        };
        stats.calculate_derived_metrics();

        assert_eq!(stats.net_allocations, 6);
        assert_eq!(stats.medium_allocations, 3);
        assert!((stats.average_allocation_size - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_updates_lifetime_counters() {
        // Other tests may allocate concurrently, so only monotonic counters are checked.
        let before = get_storage_memory_stats();
        record_allocation(64);
        record_deallocation(64);
        let after = get_storage_memory_stats();

        assert!(after.total_allocations > before.total_allocations);
        assert!(after.total_deallocations > before.total_deallocations);
        assert!(after.bytes_allocated_lifetime >= before.bytes_allocated_lifetime + 64);
        assert!(after.small_allocations > before.small_allocations);
        assert!(after.peak_allocated_bytes >= 64);
    }
}
