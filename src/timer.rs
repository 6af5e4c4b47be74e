//! TIMER0 and its tick generator.
//!
//! TIMER0 is a 64-bit counter advanced by the `TICKS` block. With `clk_ref`
//! on the 12 MHz crystal and 12 cycles per tick it counts microseconds.

use crate::reg::Bus;

const TIMER0_BASE: u32 = 0x400b_0000;
/// Write bits 63:32. Always write `TIMELW` first.
const TIMEHW: u32 = TIMER0_BASE + 0x00;
/// Write bits 31:0, copied into the counter when `TIMEHW` is written.
const TIMELW: u32 = TIMER0_BASE + 0x04;
/// Raw bits 63:32, no side effects
const TIMERAWH: u32 = TIMER0_BASE + 0x24;
/// Raw bits 31:0, no side effects
const TIMERAWL: u32 = TIMER0_BASE + 0x28;

const TICKS_BASE: u32 = 0x4010_8000;
const TICKS_TIMER0_CTRL: u32 = TICKS_BASE + 0x18;
const TICKS_TIMER0_CYCLES: u32 = TICKS_BASE + 0x1c;
const TICKS_CTRL_ENABLE: u32 = 1 << 0;

/// Counter rate once [`start`] has run with a matching divisor
pub const TICK_HZ: u32 = 1_000_000;

/// `clk_ref` cycles per tick for a 1 MHz tick
pub const fn tick_cycles_for(ref_hz: u32) -> u16 {
    let cycles = ref_hz / TICK_HZ;
    assert!(cycles >= 1 && cycles <= 0x1ff, "tick divisor out of range");
    cycles as u16
}

/// Zero the counter and start ticking every `cycles` `clk_ref` cycles.
pub fn start<B: Bus>(bus: &B, cycles: u16) {
    assert!(cycles >= 1 && cycles <= 0x1ff, "tick divisor out of range");

    bus.write(TIMELW, 0);
    bus.write(TIMEHW, 0);

    bus.write(TICKS_TIMER0_CYCLES, cycles as u32);
    bus.set_bits(TICKS_TIMER0_CTRL, TICKS_CTRL_ENABLE);
}

/// Current counter value.
///
/// The halves are separate registers, so the low word can wrap between the
/// two loads. Read high, low, high and retry until both high reads agree.
pub fn now<B: Bus>(bus: &B) -> u64 {
    loop {
        let hi = bus.read(TIMERAWH);
        let lo = bus.read(TIMERAWL);
        if bus.read(TIMERAWH) == hi {
            return ((hi as u64) << 32) | lo as u64;
        }
    }
}

/// Blocking delay on TIMER0.
///
/// Busy waits; nothing else runs in the meantime besides interrupts.
pub struct Delay<B: Bus> {
    bus: B,
}

impl<B: Bus> Delay<B> {
    /// Create a delay on an already started timer
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Counter value in ticks
    #[inline(always)]
    pub fn now(&self) -> u64 {
        now(&self.bus)
    }

    /// Wait at least `us` microseconds.
    pub fn wait_us(&self, us: u32) {
        self.wait_ticks(us as u64);
    }

    /// Wait at least `ms` milliseconds.
    pub fn wait_ms(&self, ms: u32) {
        self.wait_ticks(ms as u64 * 1000);
    }

    fn wait_ticks(&self, ticks: u64) {
        let target = self.now() + ticks;
        while self.now() < target {}
    }
}

impl<B: Bus> embedded_hal::delay::DelayNs for Delay<B> {
    #[inline]
    fn delay_ns(&mut self, ns: u32) {
        self.wait_ticks(ns.div_ceil(1000) as u64);
    }

    #[inline]
    fn delay_us(&mut self, us: u32) {
        self.wait_us(us);
    }

    #[inline]
    fn delay_ms(&mut self, ms: u32) {
        self.wait_ms(ms);
    }
}
