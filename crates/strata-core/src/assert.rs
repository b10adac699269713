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

//! Precondition assertions.
//!
//! A broken precondition in the storage engine means the memory layout can no
//! longer be trusted. These macros log the failure through the `log` facade and
//! then panic, so the message reaches both the log sink and the panic hook.

/// Asserts a storage precondition in every build.
///
/// Use it for cheap checks on container state (null data, structure mismatch,
/// capacity). The failure is logged with `log::error!` before panicking.
#[macro_export]
macro_rules! strata_assert {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::__log::error!("precondition failed: {}", stringify!($cond));
            panic!("precondition failed: {}", stringify!($cond));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::__log::error!($($arg)+);
            panic!($($arg)+);
        }
    };
}

/// Asserts a storage precondition in debug builds only.
///
/// Use it for per-range checks on hot bulk paths where callers are expected to
/// validate bounds themselves.
#[macro_export]
macro_rules! strata_debug_assert {
    ($($arg:tt)+) => {
        if cfg!(debug_assertions) {
            $crate::strata_assert!($($arg)+);
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_passes_on_true_condition() {
        strata_assert!(1 + 1 == 2);
        strata_assert!(true, "never printed {}", 42);
        strata_debug_assert!(2 > 1);
    }

    #[test]
    #[should_panic(expected = "capacity exceeded: 3 > 2")]
    fn test_assert_panics_with_formatted_message() {
        let count = 3;
        strata_assert!(count <= 2, "capacity exceeded: {} > {}", count, 2);
    }

    #[test]
    #[should_panic(expected = "precondition failed")]
    fn test_assert_panics_with_condition_text() {
        let data: Option<u8> = None;
        strata_assert!(data.is_some());
    }
}
