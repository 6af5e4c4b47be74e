#![cfg_attr(not(test), no_std)]

use core::sync::atomic::{AtomicBool, Ordering};

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod clocks;
pub mod gpio;
pub mod reg;
pub mod resets;
pub mod timer;

#[cfg(test)]
mod sim;

use clocks::pll_sys::PllConfig;
use clocks::Clocks;
use reg::{Bus, Mmio};
use resets::ResetMask;

/// Initialize the HAL.
///
/// Runs [`bring_up`] on the real register map. It's guaranteed that this
/// will only be able to run once.
pub fn init(config: Config) -> Peripherals {
    // Enforce single use of init.
    static TAKEN: AtomicBool = AtomicBool::new(false);
    if Ok(false) != TAKEN.compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed) {
        panic!("HAL initialized multiple times");
    }

    // Safety: guarded by `TAKEN` above.
    let bus = unsafe { Mmio::steal() };
    let clocks = bring_up(&bus, &config);

    Peripherals {
        clocks,
        delay: timer::Delay::new(bus),
        bus,
    }
}

/// Bring the chip up, then run `app`.
///
/// If `app` ever returns the core parks in an empty loop.
pub fn boot<F: FnOnce(Peripherals)>(config: Config, app: F) -> ! {
    app(init(config));

    loop {
        cortex_m::asm::nop();
    }
}

/// The boot sequence, in the only order the hardware accepts.
///
/// - release IO_BANK0 and PADS_BANK0 from reset
/// - start XOSC
/// - lock `pll_sys`
/// - switch `clk_ref` to XOSC, then `clk_sys` to `pll_sys`
/// - zero TIMER0 and start its tick
///
/// Nothing is retried or rolled back. A step the hardware never confirms
/// blocks forever.
pub fn bring_up<B: Bus>(bus: &B, config: &Config) -> Clocks {
    debug!("release io_bank0 and pads_bank0");
    resets::release(bus, ResetMask::IO_BANK0 | ResetMask::PADS_BANK0);

    let clocks = clocks::init(bus, config.xosc_startup_delay, config.pll);

    debug!("start timer0, {} cycles per tick", config.tick_cycles);
    timer::start(bus, config.tick_cycles);

    info!("clk_sys at {} Hz", clocks.sys_hz);
    clocks
}

/// System configuration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug)]
pub struct Config {
    /// `XOSC.STARTUP.DELAY`, in units of 256 crystal cycles
    pub xosc_startup_delay: u16,
    /// `pll_sys` dividers
    pub pll: PllConfig,
    /// `clk_ref` cycles per TIMER0 tick
    pub tick_cycles: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            xosc_startup_delay: clocks::xosc::startup_delay_for(clocks::XOSC_FREQ_HZ, 10),
            pll: PllConfig::SYS_150MHZ,
            tick_cycles: timer::tick_cycles_for(clocks::XOSC_FREQ_HZ),
        }
    }
}

/// Everything handed to the application after bring-up.
pub struct Peripherals {
    /// Frequencies the clock tree was set to
    pub clocks: Clocks,
    /// Millisecond delay on TIMER0
    pub delay: timer::Delay<Mmio>,
    /// Register map, for pins and anything else the application drives
    pub bus: Mmio,
}
