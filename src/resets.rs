//! Subsystem resets.
//!
//! Most blocks come out of the boot ROM held in reset. [`release`] takes
//! them out and waits for the hardware to acknowledge.

use core::ops::BitOr;

use crate::reg::Bus;

const RESETS_BASE: u32 = 0x4002_0000;
const RESET: u32 = RESETS_BASE + 0x0;
const RESET_DONE: u32 = RESETS_BASE + 0x8;

/// A set of blocks in the `RESET` / `RESET_DONE` registers.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResetMask(pub u32);

impl ResetMask {
    /// No block
    pub const NONE: Self = Self(0);
    /// `IO_BANK0`, GPIO function select
    pub const IO_BANK0: Self = Self(1 << 6);
    /// `IO_QSPI`
    pub const IO_QSPI: Self = Self(1 << 7);
    /// `PADS_BANK0`, GPIO pad control
    pub const PADS_BANK0: Self = Self(1 << 9);
    /// `PADS_QSPI`
    pub const PADS_QSPI: Self = Self(1 << 10);
    /// `PLL_SYS`
    pub const PLL_SYS: Self = Self(1 << 14);
    /// `PLL_USB`
    pub const PLL_USB: Self = Self(1 << 15);
    /// `TIMER0`
    pub const TIMER0: Self = Self(1 << 23);
    /// `TIMER1`
    pub const TIMER1: Self = Self(1 << 24);

    /// Raw register bits
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for ResetMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Take `mask` out of reset and wait until every block in it reports done.
///
/// There is no timeout. A block that never comes out of reset (unclocked
/// or absent) hangs the caller here, which is the only visible symptom of
/// a broken board this early in boot.
pub fn release<B: Bus>(bus: &B, mask: ResetMask) {
    trace!("release resets {:#x}", mask.bits());
    bus.clear_bits(RESET, mask.bits());
    while bus.read(RESET_DONE) & mask.bits() != mask.bits() {}
}
