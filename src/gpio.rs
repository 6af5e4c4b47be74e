//! General purpose I/O.
//!
//! Only what it takes to drive a pin from software: function select to SIO,
//! pad isolation and output disable cleared, output enable set.

use crate::reg::Bus;

const IO_BANK0_BASE: u32 = 0x4002_8000;
const PADS_BANK0_BASE: u32 = 0x4003_8000;
const SIO_BASE: u32 = 0xd000_0000;

const SIO_GPIO_OUT: u32 = SIO_BASE + 0x010;
const SIO_GPIO_OUT_SET: u32 = SIO_BASE + 0x018;
const SIO_GPIO_OUT_CLR: u32 = SIO_BASE + 0x020;
const SIO_GPIO_OUT_XOR: u32 = SIO_BASE + 0x028;
const SIO_GPIO_OE_SET: u32 = SIO_BASE + 0x038;

const CTRL_FUNCSEL_MASK: u32 = 0x1f;
const FUNCSEL_SIO: u32 = 5;
const PAD_OD: u32 = 1 << 7;
const PAD_ISO: u32 = 1 << 8;

/// `GPIOn_CTRL` in IO_BANK0
const fn ctrl(pin: u8) -> u32 {
    IO_BANK0_BASE + 0x004 + 8 * pin as u32
}

/// `GPIOn` in PADS_BANK0
const fn pad(pin: u8) -> u32 {
    PADS_BANK0_BASE + 0x004 + 4 * pin as u32
}

/// An output GPIO, driven through SIO.
///
/// Pins 0 to 31 only: SIO keeps the upper pins in separate `*_HI` registers.
pub struct Output<B: Bus> {
    bus: B,
    pin: u8,
}

impl<B: Bus> Output<B> {
    /// Create a new output pin.
    ///
    /// `IO_BANK0` and `PADS_BANK0` must be out of reset.
    pub fn new(bus: B, pin: u8) -> Self {
        assert!(pin < 32, "only GPIO0-31 are supported");

        bus.clear_bits(ctrl(pin), CTRL_FUNCSEL_MASK);
        bus.set_bits(ctrl(pin), FUNCSEL_SIO);
        bus.write(SIO_GPIO_OE_SET, 1 << pin);
        bus.clear_bits(pad(pin), PAD_ISO | PAD_OD);

        Self { bus, pin }
    }

    #[inline(always)]
    fn mask(&self) -> u32 {
        1 << self.pin
    }

    /// GPIO number
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Set the GPIO high.
    #[inline(always)]
    pub fn set(&self) {
        self.bus.write(SIO_GPIO_OUT_SET, self.mask());
    }

    /// Set the GPIO low.
    #[inline(always)]
    pub fn clear(&self) {
        self.bus.write(SIO_GPIO_OUT_CLR, self.mask());
    }

    /// Alternate the GPIO pin output.
    ///
    /// `toggle` is implemented in hardware, so it will be more efficient
    /// than implementing in software.
    #[inline(always)]
    pub fn toggle(&self) {
        self.bus.write(SIO_GPIO_OUT_XOR, self.mask());
    }

    /// Returns `true` if the GPIO is set.
    #[inline(always)]
    pub fn is_set(&self) -> bool {
        self.bus.read(SIO_GPIO_OUT) & self.mask() != 0
    }
}

impl<B: Bus> embedded_hal::digital::ErrorType for Output<B> {
    type Error = core::convert::Infallible;
}

impl<B: Bus> embedded_hal::digital::OutputPin for Output<B> {
    #[inline(always)]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        Output::set(self);
        Ok(())
    }

    #[inline(always)]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Output::clear(self);
        Ok(())
    }
}

impl<B: Bus> embedded_hal::digital::StatefulOutputPin for Output<B> {
    #[inline(always)]
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(Output::is_set(self))
    }

    #[inline(always)]
    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!Output::is_set(self))
    }

    #[inline(always)]
    fn toggle(&mut self) -> Result<(), Self::Error> {
        Output::toggle(self);
        Ok(())
    }
}
