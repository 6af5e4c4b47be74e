//! Blink the Pico 2 LED at 5 Hz once the clock tree is up.

#![no_std]
#![no_main]
#![allow(clippy::empty_loop)]

use cortex_m_rt::{entry, exception, ExceptionFrame};
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_halt as _;

use rp2350_bringup::{gpio, Config, Peripherals};

/// GPIO25 drives the on-board LED
const LED_PIN: u8 = 25;
const HALF_PERIOD_MS: u32 = 100;

/// Minimal RP2350 boot ROM image definition: executable, secure, ARM.
///
/// The boot ROM scans the start of flash for this block before it will
/// jump to the vector table.
#[link_section = ".image_def"]
#[used]
pub static IMAGE_DEF: [u32; 5] = [
    0xffff_ded3, // START
    0x1021_0142, // IMAGE_TYPE: EXE | S-mode | ARM | RP2350
    0x0000_01ff, // LAST item
    0x0000_0000, // next block: self
    0xab12_3579, // END
];

#[entry]
fn main() -> ! {
    rp2350_bringup::boot(Config::default(), blink)
}

fn blink(p: Peripherals) {
    let led = gpio::Output::new(p.bus, LED_PIN);

    loop {
        led.set();
        p.delay.wait_ms(HALF_PERIOD_MS);

        led.clear();
        p.delay.wait_ms(HALF_PERIOD_MS);
    }
}

#[exception]
unsafe fn HardFault(_ef: &ExceptionFrame) -> ! {
    loop {}
}

#[exception]
unsafe fn DefaultHandler(_irqn: i16) {
    loop {}
}
