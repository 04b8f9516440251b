// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_advances() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
    assert!(clock.epoch_ms() > 0);
}

#[test]
fn fake_clock_is_frozen_until_advanced() {
    let clock = FakeClock::new();
    let a = clock.now();
    let b = clock.now();
    assert_eq!(a, b);
}

#[test]
fn fake_clock_advance_moves_both_time_sources() {
    let clock = FakeClock::new();
    let start = clock.now();
    let start_ms = clock.epoch_ms();

    clock.advance(Duration::from_secs(5));

    assert_eq!(clock.now() - start, Duration::from_secs(5));
    assert_eq!(clock.epoch_ms() - start_ms, 5_000);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let clone = clock.clone();
    clock.advance(Duration::from_secs(1));
    assert_eq!(clone.now(), clock.now());
}
