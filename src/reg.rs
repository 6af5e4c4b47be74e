//! Register access.
//!
//! Every other module touches hardware through [`Bus`] only. Addresses are
//! the physical ones from the RP2350 datasheet and are kept as plain `u32`
//! constants next to the block that owns them.
//!
//! APB peripherals expose three aliases of each register, each performing
//! its operation as a single bus transaction:
//!
//! | offset            | effect                  |
//! |-------------------|-------------------------|
//! | [`ATOMIC_XOR`]    | `reg ^= value`          |
//! | [`ATOMIC_SET`]    | `reg \|= value`         |
//! | [`ATOMIC_CLEAR`]  | `reg &= !value`         |
//!
//! Bit updates that another execution context could also perform must go
//! through the aliases. [`Bus::modify`] is a software read-modify-write and
//! is only used for field programming during single-threaded bring-up.

/// XOR alias offset
pub const ATOMIC_XOR: u32 = 0x1000;
/// Set alias offset
pub const ATOMIC_SET: u32 = 0x2000;
/// Clear alias offset
pub const ATOMIC_CLEAR: u32 = 0x3000;

/// Full-width access to 32-bit memory mapped registers.
pub trait Bus {
    /// Load the register at `addr`.
    fn read(&self, addr: u32) -> u32;

    /// Store `value` to the register at `addr`.
    fn write(&self, addr: u32, value: u32);

    /// `reg |= mask` through the set alias.
    #[inline(always)]
    fn set_bits(&self, addr: u32, mask: u32) {
        self.write(addr + ATOMIC_SET, mask);
    }

    /// `reg &= !mask` through the clear alias.
    #[inline(always)]
    fn clear_bits(&self, addr: u32, mask: u32) {
        self.write(addr + ATOMIC_CLEAR, mask);
    }

    /// `reg ^= mask` through the XOR alias.
    #[inline(always)]
    fn toggle_bits(&self, addr: u32, mask: u32) {
        self.write(addr + ATOMIC_XOR, mask);
    }

    /// Replace the bits selected by `mask` with `value`, keeping the rest.
    ///
    /// `value` is masked, so stray bits outside the field are dropped.
    #[inline(always)]
    fn modify(&self, addr: u32, mask: u32, value: u32) {
        let old = self.read(addr);
        self.write(addr, (old & !mask) | (value & mask));
    }
}

impl<B: Bus + ?Sized> Bus for &B {
    #[inline(always)]
    fn read(&self, addr: u32) -> u32 {
        (**self).read(addr)
    }

    #[inline(always)]
    fn write(&self, addr: u32, value: u32) {
        (**self).write(addr, value)
    }
}

/// The physical register map.
#[derive(Clone, Copy)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Get a handle to the register map.
    ///
    /// # Safety
    ///
    /// Must run on the RP2350 itself. Whoever holds the handle can
    /// reconfigure any peripheral, so it should be created once, by
    /// [`crate::init`].
    #[inline(always)]
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl Bus for Mmio {
    #[inline(always)]
    fn read(&self, addr: u32) -> u32 {
        // Safety: `Mmio` only exists on target, and every address this crate
        // uses is a word aligned register from the datasheet.
        unsafe { core::ptr::read_volatile(addr as usize as *const u32) }
    }

    #[inline(always)]
    fn write(&self, addr: u32, value: u32) {
        // Safety: see `read`.
        unsafe { core::ptr::write_volatile(addr as usize as *mut u32, value) }
    }
}
