//! Clock module for RP2350
//!
//! Brings the clock tree from the boot ROM state (ring oscillator) to:
//! - XOSC running from the 12 MHz crystal
//! - `pll_sys` locked, `fbdiv` / `postdiv1` / `postdiv2` from [`PllConfig`]
//!   (150 MHz by default)
//! - `clk_ref` on XOSC (12 MHz), feeding the tick generators
//! - `clk_sys` on its aux source, which is `pll_sys` out of reset
//!
//! Every step finishes by polling a status bit. None of the polls time out:
//! if the hardware never confirms, bring-up stops right there.

use crate::reg::Bus;

/// Crystal frequency on the Pico 2
pub const XOSC_FREQ_HZ: u32 = 12_000_000;

/// Frequencies after [`init`]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Clocks {
    /// `clk_ref`, also the input of the tick generators
    pub ref_hz: u32,
    /// `clk_sys`
    pub sys_hz: u32,
}

pub mod xosc {
    //! Crystal oscillator

    use super::*;

    const XOSC_BASE: u32 = 0x4004_8000;
    const CTRL: u32 = XOSC_BASE + 0x00;
    const STATUS: u32 = XOSC_BASE + 0x04;
    const STARTUP: u32 = XOSC_BASE + 0x0c;

    const STARTUP_DELAY_MASK: u32 = 0x3fff;
    /// `ENABLE` = 0xfab, `FREQ_RANGE` = 0xaa0 (1-15 MHz)
    const CTRL_ENABLE_1_15MHZ: u32 = 0x00fa_baa0;
    const CTRL_MASK: u32 = 0x00ff_ffff;
    const STATUS_STABLE: u32 = 1 << 31;

    /// `STARTUP.DELAY` for a crystal of `xosc_hz` that needs `delay_ms` to settle.
    ///
    /// The field counts in units of 256 XOSC cycles.
    pub const fn startup_delay_for(xosc_hz: u32, delay_ms: u32) -> u16 {
        let cycles = (xosc_hz / 1000) * delay_ms;
        let delay = (cycles + 128) / 256;
        assert!(delay <= STARTUP_DELAY_MASK, "XOSC startup delay out of range");
        delay as u16
    }

    /// Start the crystal oscillator and wait until it is stable.
    pub fn start<B: Bus>(bus: &B, startup_delay: u16) {
        assert!(
            startup_delay as u32 <= STARTUP_DELAY_MASK,
            "XOSC startup delay out of range"
        );
        bus.modify(STARTUP, STARTUP_DELAY_MASK, startup_delay as u32);
        bus.modify(CTRL, CTRL_MASK, CTRL_ENABLE_1_15MHZ);

        while bus.read(STATUS) & STATUS_STABLE == 0 {}
    }

}

pub mod pll_sys {
    //! System PLL

    use super::*;
    use crate::resets::{self, ResetMask};

    const PLL_SYS_BASE: u32 = 0x4005_0000;
    const CS: u32 = PLL_SYS_BASE + 0x00;
    const PWR: u32 = PLL_SYS_BASE + 0x04;
    const FBDIV_INT: u32 = PLL_SYS_BASE + 0x08;
    const PRIM: u32 = PLL_SYS_BASE + 0x0c;

    const CS_LOCK: u32 = 1 << 31;
    const PWR_PD: u32 = 1 << 0;
    const PWR_POSTDIVPD: u32 = 1 << 3;
    const PWR_VCOPD: u32 = 1 << 5;
    const FBDIV_MASK: u32 = 0xfff;
    const POSTDIV1_SHIFT: u32 = 16;
    const POSTDIV2_SHIFT: u32 = 12;
    const PRIM_MASK: u32 = (0x7 << POSTDIV1_SHIFT) | (0x7 << POSTDIV2_SHIFT);

    /// PLL divider settings, with the reference divider fixed at 1
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct PllConfig {
        fbdiv: u16,
        postdiv1: u8,
        postdiv2: u8,
    }

    impl PllConfig {
        /// 12 MHz * 125 = 1500 MHz VCO, / 5 / 2 = 150 MHz
        pub const SYS_150MHZ: Self = Self::new(125, 5, 2);

        /// Create a configuration
        ///
        /// Panics when a divider is outside what the hardware accepts:
        /// `fbdiv` in [16, 320], post dividers in [1, 7], and `postdiv1`
        /// not smaller than `postdiv2`.
        pub const fn new(fbdiv: u16, postdiv1: u8, postdiv2: u8) -> Self {
            assert!(fbdiv >= 16 && fbdiv <= 320, "fbdiv out of range");
            assert!(postdiv1 >= 1 && postdiv1 <= 7, "postdiv1 out of range");
            assert!(postdiv2 >= 1 && postdiv2 <= 7, "postdiv2 out of range");
            assert!(postdiv1 >= postdiv2, "postdiv1 must be >= postdiv2");
            Self {
                fbdiv,
                postdiv1,
                postdiv2,
            }
        }

        /// Feedback divider, VCO = ref * `fbdiv`
        pub const fn fbdiv(&self) -> u16 {
            self.fbdiv
        }

        /// First post divider
        pub const fn postdiv1(&self) -> u8 {
            self.postdiv1
        }

        /// Second post divider
        pub const fn postdiv2(&self) -> u8 {
            self.postdiv2
        }

        /// VCO frequency for a given reference
        pub const fn vco_freq(&self, ref_hz: u32) -> u64 {
            ref_hz as u64 * self.fbdiv as u64
        }

        /// Output frequency after both post dividers
        ///
        /// Panics if the result does not fit a `u32`.
        pub const fn output_freq(&self, ref_hz: u32) -> u32 {
            let out = self.vco_freq(ref_hz) / (self.postdiv1 as u64 * self.postdiv2 as u64);
            assert!(out <= u32::MAX as u64, "PLL output frequency overflows u32");
            out as u32
        }

        const fn prim(&self) -> u32 {
            ((self.postdiv1 as u32) << POSTDIV1_SHIFT) | ((self.postdiv2 as u32) << POSTDIV2_SHIFT)
        }
    }

    impl Default for PllConfig {
        fn default() -> Self {
            Self::SYS_150MHZ
        }
    }

    /// Configure `pll_sys` and release its output
    ///
    /// The post dividers stay powered down until the VCO has locked, so
    /// nothing downstream sees the PLL while it is still settling.
    pub fn configure<B: Bus>(bus: &B, config: PllConfig) {
        resets::release(bus, ResetMask::PLL_SYS);

        bus.modify(FBDIV_INT, FBDIV_MASK, config.fbdiv() as u32);

        bus.clear_bits(PWR, PWR_PD | PWR_VCOPD);
        while bus.read(CS) & CS_LOCK == 0 {}

        bus.modify(PRIM, PRIM_MASK, config.prim());
        bus.clear_bits(PWR, PWR_POSTDIVPD);
    }

}

pub mod clk_ref {
    //! Reference clock mux

    use super::*;

    const CLOCKS_BASE: u32 = 0x4001_0000;
    const CLK_REF_CTRL: u32 = CLOCKS_BASE + 0x30;
    const CLK_REF_SELECTED: u32 = CLOCKS_BASE + 0x38;

    const CTRL_SRC_MASK: u32 = 0x3;
    const SRC_XOSC_CLKSRC: u32 = 0x2;
    const SELECTED_MASK: u32 = 0xf;

    /// Switch `clk_ref` to XOSC and wait for the glitchless mux to confirm.
    ///
    /// `SELECTED` is one-hot per source.
    pub fn select_xosc<B: Bus>(bus: &B) {
        bus.modify(CLK_REF_CTRL, CTRL_SRC_MASK, SRC_XOSC_CLKSRC);
        while bus.read(CLK_REF_SELECTED) & SELECTED_MASK != 1 << SRC_XOSC_CLKSRC {}
    }

}

pub mod clk_sys {
    //! System clock mux

    use super::*;

    const CLOCKS_BASE: u32 = 0x4001_0000;
    const CLK_SYS_CTRL: u32 = CLOCKS_BASE + 0x3c;
    const CLK_SYS_SELECTED: u32 = CLOCKS_BASE + 0x44;

    const CTRL_SRC_AUX: u32 = 1 << 0;
    const SELECTED_MASK: u32 = 0x3;
    const SELECTED_AUX: u32 = 1 << 1;

    /// Switch `clk_sys` to its aux source and wait for confirmation.
    ///
    /// `AUXSRC` is left at its reset value, `pll_sys`, so the PLL has to be
    /// locked before this runs.
    pub fn select_aux<B: Bus>(bus: &B) {
        bus.set_bits(CLK_SYS_CTRL, CTRL_SRC_AUX);
        while bus.read(CLK_SYS_SELECTED) & SELECTED_MASK != SELECTED_AUX {}
    }

}

/// Initialize and configure clocks
///
/// - start XOSC with `startup_delay`
/// - configure and lock `pll_sys`
/// - switch `clk_ref` to XOSC
/// - switch `clk_sys` to `pll_sys`
pub fn init<B: Bus>(bus: &B, startup_delay: u16, pll: pll_sys::PllConfig) -> Clocks {
    debug!("init xosc");
    xosc::start(bus, startup_delay);

    debug!("init pll_sys");
    pll_sys::configure(bus, pll);

    debug!("switch clk_ref to xosc");
    clk_ref::select_xosc(bus);

    debug!("switch clk_sys to pll_sys");
    clk_sys::select_aux(bus);

    Clocks {
        ref_hz: XOSC_FREQ_HZ,
        sys_hz: pll.output_freq(XOSC_FREQ_HZ),
    }
}
