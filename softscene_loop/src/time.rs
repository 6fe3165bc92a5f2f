// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host clock reads.

use std::sync::OnceLock;
use std::time::Instant;

use softscene_core::time::HostTime;

/// Returns the current monotonic host time in nanoseconds.
///
/// The origin is the first call in the process; only differences between
/// readings are meaningful.
#[must_use]
pub fn now() -> HostTime {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    let origin = *ORIGIN.get_or_init(Instant::now);
    let nanos = Instant::now().saturating_duration_since(origin).as_nanos();
    HostTime(u64::try_from(nanos).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let a = now();
        let b = now();
        assert!(b >= a, "{b:?} < {a:?}");
    }
}
