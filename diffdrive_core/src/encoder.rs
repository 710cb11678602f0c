//! Interrupt-side encoder pulse counter.
//!
//! One `EncoderCounter` per motor, shared (`Arc`) between the edge source
//! (GPIO interrupt thread or simulated plant) and the control loop. Position
//! and the inter-edge velocity live in a single `AtomicU64`, so the loop's
//! [`EncoderCounter::read_snapshot`] can never observe a position from one
//! edge paired with the velocity of another.
//!
//! Counting is single-edge and magnitude-only: reversing the wheel still
//! increments `position`.
use std::sync::atomic::{AtomicU64, Ordering};

use diffdrive_traits::EdgeSink;

use crate::util::elapsed_s;

/// Consistent view of the interrupt-owned state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EncoderSnapshot {
    /// Rising edges seen since start (wraps at u32::MAX).
    pub position: u32,
    /// 1 / Δt between the last two edges, pulses per second.
    pub velocity_pps: f32,
}

#[inline]
fn pack(position: u32, velocity_pps: f32) -> u64 {
    (u64::from(position) << 32) | u64::from(velocity_pps.to_bits())
}

#[inline]
fn unpack(word: u64) -> EncoderSnapshot {
    EncoderSnapshot {
        position: (word >> 32) as u32,
        velocity_pps: f32::from_bits(word as u32),
    }
}

#[derive(Debug)]
pub struct EncoderCounter {
    // (position << 32) | velocity_pps.to_bits()
    state: AtomicU64,
    // Owned by the edge context only.
    last_edge_us: AtomicU64,
    min_dt_s: f32,
}

impl Default for EncoderCounter {
    fn default() -> Self {
        Self::new(1e-6)
    }
}

impl EncoderCounter {
    pub fn new(min_dt_s: f32) -> Self {
        Self {
            state: AtomicU64::new(0),
            last_edge_us: AtomicU64::new(0),
            min_dt_s,
        }
    }

    /// Record one rising edge at `now_us`.
    ///
    /// Single writer per counter: each encoder input has exactly one edge
    /// source, so a plain load/store on `state` is sufficient.
    #[inline]
    pub fn on_edge(&self, now_us: u64) {
        let prev_us = self.last_edge_us.swap(now_us, Ordering::Relaxed);
        let dt = elapsed_s(now_us, prev_us, self.min_dt_s);
        let velocity = 1.0 / dt;
        let position = unpack(self.state.load(Ordering::Relaxed))
            .position
            .wrapping_add(1);
        self.state.store(pack(position, velocity), Ordering::Release);
    }

    /// Atomic snapshot of `(position, velocity)` for the control loop.
    #[inline]
    pub fn read_snapshot(&self) -> EncoderSnapshot {
        unpack(self.state.load(Ordering::Acquire))
    }
}

impl EdgeSink for EncoderCounter {
    fn on_rising_edge(&self, now_us: u64) {
        self.on_edge(now_us);
    }
}
