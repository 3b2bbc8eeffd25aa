//! Register-Based Peripheral.
//!
//! `Peripheral` is the bus-facing adapter around one register collection. It
//! decodes alias regions, injects the enablement collaborator into
//! synchronized fields, propagates resets, and turns every access failure
//! into a log event plus a statistics counter. Bus accesses never fail and
//! never panic: emulated software always observes a plausible response.

use crate::common::data::AccessType;
use crate::common::error::AccessError;
use crate::register::{RegisterCollection, RegisterSnapshot};
use crate::soc::alias::{AliasDecoder, AliasOp};
use crate::soc::traits::{Device, Enablement};
use crate::stats::AccessStats;
use log::{debug, error, trace};
use std::rc::Rc;

/// Side effect run on every peripheral reset, after registers are restored.
pub type ResetHook = Box<dyn FnMut()>;

/// Bus-facing peripheral built on a register collection.
pub struct Peripheral {
    name: String,
    base: u64,
    registers: RegisterCollection,
    decoder: AliasDecoder,
    enablement: Rc<dyn Enablement>,
    reset_hooks: Vec<ResetHook>,
    stats: AccessStats,
}

impl Peripheral {
    /// Creates a peripheral with the default 4 KiB alias regions.
    ///
    /// # Arguments
    ///
    /// * `name` - Name used in log events.
    /// * `base` - Base address reported through [`Device::address_range`].
    /// * `registers` - The register map; its enablement is replaced.
    /// * `enablement` - Clock/enable query of the owning collaborator.
    pub fn new(
        name: &str,
        base: u64,
        mut registers: RegisterCollection,
        enablement: Rc<dyn Enablement>,
    ) -> Self {
        registers.set_enablement(Rc::clone(&enablement));
        Self {
            name: name.to_string(),
            base,
            registers,
            decoder: AliasDecoder::default(),
            enablement,
            reset_hooks: Vec::new(),
            stats: AccessStats::default(),
        }
    }

    /// Replaces the alias decoder.
    pub fn with_decoder(mut self, decoder: AliasDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Adds a reset hook. Hooks run in registration order.
    pub fn on_reset(&mut self, hook: impl FnMut() + 'static) {
        self.reset_hooks.push(Box::new(hook));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// Size of the address window, all alias regions included.
    pub fn size(&self) -> u64 {
        self.decoder.window_size()
    }

    pub fn decoder(&self) -> &AliasDecoder {
        &self.decoder
    }

    pub fn is_enabled(&self) -> bool {
        self.enablement.is_enabled()
    }

    pub fn registers(&self) -> &RegisterCollection {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut RegisterCollection {
        &mut self.registers
    }

    pub fn stats(&self) -> &AccessStats {
        &self.stats
    }

    /// Captures the live state of every register.
    pub fn snapshot(&mut self) -> Vec<RegisterSnapshot> {
        self.registers.snapshot()
    }

    /// Serves a 32-bit bus read at `address` (relative to the base).
    ///
    /// # Returns
    ///
    /// The register value, or `0` if the access could not be served.
    pub fn read_word(&mut self, address: u32) -> u32 {
        self.stats.reads += 1;
        match self.decoder.read(&mut self.registers, address) {
            Ok(read) => {
                if read.op != AliasOp::Direct {
                    self.stats.unsupported_alias_reads += 1;
                }
                trace!("{}: read {:#06x} -> {:#010x}", self.name, address, read.value);
                read.value
            }
            Err(err) => {
                self.report(err);
                0
            }
        }
    }

    /// Serves a 32-bit bus write at `address` (relative to the base).
    pub fn write_word(&mut self, address: u32, value: u32) {
        self.stats.writes += 1;
        match self.decoder.write(&mut self.registers, address, value) {
            Ok(write) => {
                self.stats.record_alias_write(write.op);
                self.stats.sync_violations += write.report.sync_violations as u64;
                if write.report.locked {
                    self.stats.locked_writes += 1;
                }
                trace!(
                    "{}: write {:#06x} <- {:#010x} ({}, stored {:#010x})",
                    self.name,
                    address,
                    value,
                    write.op,
                    write.written
                );
            }
            Err(err) => self.report(err),
        }
    }

    /// Restores every register to its reset value, then runs reset hooks.
    pub fn reset(&mut self) {
        debug!("{}: reset", self.name);
        self.registers.reset();
        for hook in &mut self.reset_hooks {
            hook();
        }
        self.stats.resets += 1;
    }

    fn report(&mut self, err: AccessError) {
        error!("{}: {}", self.name, err);
        self.stats.record_error(&err);
    }

    fn unsupported_width(&mut self, access: AccessType, offset: u64, width: u8) {
        self.report(AccessError::UnsupportedWidth {
            access,
            address: offset,
            width,
        });
    }

    /// Narrows a device offset to a register-window address.
    fn window_address(&mut self, offset: u64, access: AccessType) -> Option<u32> {
        match u32::try_from(offset) {
            Ok(address) => Some(address),
            Err(_) => {
                let size = self.size();
                self.report(AccessError::OutOfRange {
                    access,
                    address: offset,
                    size,
                });
                None
            }
        }
    }
}

impl Device for Peripheral {
    fn name(&self) -> &str {
        &self.name
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base, self.size())
    }

    fn read_u8(&mut self, offset: u64) -> u8 {
        self.unsupported_width(AccessType::Read, offset, 1);
        0
    }

    fn read_u16(&mut self, offset: u64) -> u16 {
        self.unsupported_width(AccessType::Read, offset, 2);
        0
    }

    fn read_u32(&mut self, offset: u64) -> u32 {
        match self.window_address(offset, AccessType::Read) {
            Some(address) => self.read_word(address),
            None => 0,
        }
    }

    fn read_u64(&mut self, offset: u64) -> u64 {
        self.unsupported_width(AccessType::Read, offset, 8);
        0
    }

    fn write_u8(&mut self, offset: u64, _val: u8) {
        self.unsupported_width(AccessType::Write, offset, 1);
    }

    fn write_u16(&mut self, offset: u64, _val: u16) {
        self.unsupported_width(AccessType::Write, offset, 2);
    }

    fn write_u32(&mut self, offset: u64, val: u32) {
        if let Some(address) = self.window_address(offset, AccessType::Write) {
            self.write_word(address, val);
        }
    }

    fn write_u64(&mut self, offset: u64, _val: u64) {
        self.unsupported_width(AccessType::Write, offset, 8);
    }

    fn reset(&mut self) {
        Peripheral::reset(self);
    }
}
