//! System-on-Chip Traits.
//!
//! This module defines the interfaces at the edges of the framework: the
//! bus-facing `Device` trait implemented by peripherals, and the
//! `Enablement` capability a peripheral consumes from its clock-management
//! collaborator.

use std::cell::Cell;
use std::rc::Rc;

/// Trait for memory-mapped I/O devices.
///
/// All devices attached to a system bus implement this trait to handle read
/// and write operations at offsets relative to their base address.
pub trait Device {
    /// Returns the user-friendly name of the device.
    ///
    /// Used for debugging and logging purposes.
    fn name(&self) -> &str;

    /// Returns the address range (Base Address, Size) of the device.
    ///
    /// Used by a system bus to route memory accesses to the correct device.
    fn address_range(&self) -> (u64, u64);

    /// Reads a byte from the device at the specified offset.
    fn read_u8(&mut self, offset: u64) -> u8;

    /// Reads a half-word (16-bit) from the device at the specified offset.
    fn read_u16(&mut self, offset: u64) -> u16;

    /// Reads a word (32-bit) from the device at the specified offset.
    fn read_u32(&mut self, offset: u64) -> u32;

    /// Reads a double-word (64-bit) from the device at the specified offset.
    fn read_u64(&mut self, offset: u64) -> u64;

    /// Writes a byte to the device at the specified offset.
    fn write_u8(&mut self, offset: u64, val: u8);

    /// Writes a half-word (16-bit) to the device at the specified offset.
    fn write_u16(&mut self, offset: u64, val: u16);

    /// Writes a word (32-bit) to the device at the specified offset.
    fn write_u32(&mut self, offset: u64, val: u32);

    /// Writes a double-word (64-bit) to the device at the specified offset.
    fn write_u64(&mut self, offset: u64, val: u64);

    /// Restores the device to its power-on state.
    fn reset(&mut self) {}
}

/// Capability answering whether a peripheral is currently enabled.
///
/// Supplied by the clock-management collaborator of a peripheral (for
/// example a clock-enable or oscillator-request query). Consulted by
/// synchronized fields on every write and free to be used by value providers.
pub trait Enablement {
    fn is_enabled(&self) -> bool;
}

impl<F: Fn() -> bool> Enablement for F {
    fn is_enabled(&self) -> bool {
        self()
    }
}

/// Enablement of a peripheral with no clock gating.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysEnabled;

impl Enablement for AlwaysEnabled {
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Shared, externally switchable enable bit.
///
/// Clones observe the same bit, so one handle can be injected into a
/// peripheral while another is driven by the collaborator.
#[derive(Clone, Debug, Default)]
pub struct EnableFlag {
    enabled: Rc<Cell<bool>>,
}

impl EnableFlag {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Rc::new(Cell::new(enabled)),
        }
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn get(&self) -> bool {
        self.enabled.get()
    }
}

impl Enablement for EnableFlag {
    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}
