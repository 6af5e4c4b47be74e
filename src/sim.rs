//! Simulated RP2350 register file for host tests.
//!
//! Models just enough hardware behaviour for bring-up to complete: atomic
//! aliases on APB peripherals, reset acknowledgement, oscillator stability,
//! PLL lock, clock mux confirmation, the tick driven 64-bit timer and the
//! SIO output registers. Anything else is plain storage.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::reg::Bus;

const RESET: u32 = 0x4002_0000;
const RESET_DONE: u32 = 0x4002_0008;
const RESET_ALL: u32 = 0x1fff_ffff;

const CLK_REF_CTRL: u32 = 0x4001_0030;
const CLK_REF_SELECTED: u32 = 0x4001_0038;
const CLK_SYS_CTRL: u32 = 0x4001_003c;
const CLK_SYS_SELECTED: u32 = 0x4001_0044;

const XOSC_CTRL: u32 = 0x4004_8000;
const XOSC_STATUS: u32 = 0x4004_8004;

const PLL_CS: u32 = 0x4005_0000;
const PLL_PWR: u32 = 0x4005_0004;
const PLL_FBDIV_INT: u32 = 0x4005_0008;
const PLL_PRIM: u32 = 0x4005_000c;
const PLL_SYS_RESET_BIT: u32 = 1 << 14;

const TICKS_TIMER0_CTRL: u32 = 0x4010_8018;
const TICKS_TIMER0_CYCLES: u32 = 0x4010_801c;

const TIMEHW: u32 = 0x400b_0000;
const TIMELW: u32 = 0x400b_0004;
const TIMERAWH: u32 = 0x400b_0024;
const TIMERAWL: u32 = 0x400b_0028;

const SIO_GPIO_OUT: u32 = 0xd000_0010;
const SIO_GPIO_OUT_SET: u32 = 0xd000_0018;
const SIO_GPIO_OUT_CLR: u32 = 0xd000_0020;
const SIO_GPIO_OUT_XOR: u32 = 0xd000_0028;
const SIO_GPIO_OE: u32 = 0xd000_0030;
const SIO_GPIO_OE_SET: u32 = 0xd000_0038;

/// One bus transaction, with the value that crossed the bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Read(u32, u32),
    Write(u32, u32),
}

pub struct SimBus {
    regs: RefCell<BTreeMap<u32, u32>>,
    writes: RefCell<Vec<(u32, u32)>>,
    log: RefCell<Vec<Access>>,
    status_pending: RefCell<BTreeMap<u32, u32>>,
    reads: RefCell<BTreeMap<u32, usize>>,
    reset_latency: Cell<u32>,
    reset_pending: Cell<u32>,
    reset_done: Cell<u32>,
    counter: Cell<u64>,
    counter_low_latch: Cell<u32>,
    ticks_per_read: Cell<u64>,
}

impl SimBus {
    /// Register file in its power-on state.
    pub fn new() -> Self {
        let mut regs = BTreeMap::new();
        regs.insert(RESET, RESET_ALL);
        // PD, DSMPD, POSTDIVPD and VCOPD all set.
        regs.insert(PLL_PWR, 0x2d);
        regs.insert(PLL_PRIM, 0x0007_7000);
        // Both muxes come up on their first source.
        regs.insert(CLK_REF_SELECTED, 0x1);
        regs.insert(CLK_SYS_SELECTED, 0x1);

        Self {
            regs: RefCell::new(regs),
            writes: RefCell::new(Vec::new()),
            log: RefCell::new(Vec::new()),
            status_pending: RefCell::new(BTreeMap::new()),
            reads: RefCell::new(BTreeMap::new()),
            reset_latency: Cell::new(0),
            reset_pending: Cell::new(0),
            reset_done: Cell::new(0),
            counter: Cell::new(0),
            counter_low_latch: Cell::new(0),
            ticks_per_read: Cell::new(7),
        }
    }

    /// Number of `RESET_DONE` reads that still report the old state after
    /// each write to `RESET`.
    pub fn set_reset_latency(&self, reads: u32) {
        self.reset_latency.set(reads);
    }

    /// Number of reads of the status register at `addr` (XOSC `STATUS`,
    /// PLL `CS`, `CLK_REF_SELECTED` or `CLK_SYS_SELECTED`) that still report
    /// the hardware as not ready.
    pub fn set_status_latency(&self, addr: u32, reads: u32) {
        self.status_pending.borrow_mut().insert(addr, reads);
    }

    /// How far the counter moves on every `TIMERAWL` read once ticking.
    pub fn set_ticks_per_read(&self, ticks: u64) {
        self.ticks_per_read.set(ticks);
    }

    /// Force the counter value, as if time had passed.
    pub fn set_counter(&self, value: u64) {
        self.counter.set(value);
    }

    /// Stored value without any read side effects.
    pub fn peek(&self, addr: u32) -> u32 {
        self.regs.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Every write issued so far, as `(address, value)`.
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.writes.borrow().clone()
    }

    /// Every read and write so far, in bus order.
    pub fn log(&self) -> Vec<Access> {
        self.log.borrow().clone()
    }

    /// Values returned by `TIMERAWL`, in order.
    pub fn timer_low_reads(&self) -> Vec<u32> {
        self.log
            .borrow()
            .iter()
            .filter_map(|a| match *a {
                Access::Read(TIMERAWL, v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn clear_log(&self) {
        self.writes.borrow_mut().clear();
        self.log.borrow_mut().clear();
        self.reads.borrow_mut().clear();
    }

    pub fn reads_of(&self, addr: u32) -> usize {
        self.reads.borrow().get(&addr).copied().unwrap_or(0)
    }

    fn ticking(&self) -> bool {
        self.peek(TICKS_TIMER0_CTRL) & 1 != 0 && self.peek(TICKS_TIMER0_CYCLES) != 0
    }

    fn store(&self, addr: u32, value: u32) {
        self.regs.borrow_mut().insert(addr, value);
    }

    /// Consume one read of latency for `addr`, `true` while still pending.
    fn still_pending(&self, addr: u32) -> bool {
        match self.status_pending.borrow_mut().get_mut(&addr) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }

    fn pll_locked(&self) -> bool {
        let out_of_reset = self.peek(RESET) & PLL_SYS_RESET_BIT == 0;
        let powered = self.peek(PLL_PWR) & ((1 << 5) | (1 << 0)) == 0;
        out_of_reset && powered && self.peek(PLL_FBDIV_INT) & 0xfff != 0
    }

    fn side_effects(&self, addr: u32, value: u32) {
        match addr {
            RESET => self.reset_pending.set(self.reset_latency.get()),
            TIMELW => self.counter_low_latch.set(value),
            TIMEHW => self
                .counter
                .set(((value as u64) << 32) | self.counter_low_latch.get() as u64),
            SIO_GPIO_OUT_SET => self.store(SIO_GPIO_OUT, self.peek(SIO_GPIO_OUT) | value),
            SIO_GPIO_OUT_CLR => self.store(SIO_GPIO_OUT, self.peek(SIO_GPIO_OUT) & !value),
            SIO_GPIO_OUT_XOR => self.store(SIO_GPIO_OUT, self.peek(SIO_GPIO_OUT) ^ value),
            SIO_GPIO_OE_SET => self.store(SIO_GPIO_OE, self.peek(SIO_GPIO_OE) | value),
            _ => {}
        }
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBus {
    fn read_reg(&self, addr: u32) -> u32 {
        match addr {
            RESET_DONE => {
                let pending = self.reset_pending.get();
                if pending > 0 {
                    self.reset_pending.set(pending - 1);
                } else {
                    self.reset_done.set(!self.peek(RESET) & RESET_ALL);
                }
                self.reset_done.get()
            }
            XOSC_STATUS | PLL_CS | CLK_REF_SELECTED | CLK_SYS_SELECTED
                if self.still_pending(addr) =>
            {
                match addr {
                    XOSC_STATUS => 0,
                    PLL_CS => self.peek(PLL_CS) & !(1 << 31),
                    // Still on the power-on source.
                    _ => 0x1,
                }
            }
            XOSC_STATUS => {
                let enabled = (self.peek(XOSC_CTRL) >> 12) & 0xfff == 0xfab;
                if enabled {
                    (1 << 31) | (1 << 12)
                } else {
                    0
                }
            }
            PLL_CS => {
                let cs = self.peek(PLL_CS) & !(1 << 31);
                if self.pll_locked() {
                    cs | (1 << 31)
                } else {
                    cs
                }
            }
            CLK_REF_SELECTED => 1 << (self.peek(CLK_REF_CTRL) & 0x3),
            CLK_SYS_SELECTED => 1 << (self.peek(CLK_SYS_CTRL) & 0x1),
            TIMERAWH => (self.counter.get() >> 32) as u32,
            TIMERAWL => {
                let now = self.counter.get();
                if self.ticking() {
                    self.counter.set(now + self.ticks_per_read.get());
                }
                now as u32
            }
            _ => self.peek(addr),
        }
    }
}

impl Bus for SimBus {
    fn read(&self, addr: u32) -> u32 {
        *self.reads.borrow_mut().entry(addr).or_insert(0) += 1;
        let value = self.read_reg(addr);
        self.log.borrow_mut().push(Access::Read(addr, value));
        value
    }

    fn write(&self, addr: u32, value: u32) {
        self.writes.borrow_mut().push((addr, value));
        self.log.borrow_mut().push(Access::Write(addr, value));

        let aliased = (0x4000_0000..0x5000_0000).contains(&addr);
        let (base, op) = if aliased {
            (addr & !0x3000, (addr >> 12) & 0x3)
        } else {
            (addr, 0)
        };

        let old = self.peek(base);
        let new = match op {
            0 => value,
            1 => old ^ value,
            2 => old | value,
            _ => old & !value,
        };
        self.store(base, new);
        self.side_effects(base, new);
    }
}
