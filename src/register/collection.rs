//! Register Collections.
//!
//! A collection maps base-bank offsets to registers and serves whole-word
//! reads and writes. It knows nothing about alias regions; the alias decoder
//! resolves those before calling in.

use crate::common::data::AccessType;
use crate::common::error::{AccessError, LayoutError};
use crate::register::{Register, RegisterSnapshot, WriteReport};
use crate::soc::traits::{AlwaysEnabled, Enablement};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Offset-keyed set of registers with at most one register per offset.
pub struct RegisterCollection {
    registers: BTreeMap<u32, Register>,
    enablement: Rc<dyn Enablement>,
}

impl Default for RegisterCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterCollection {
    /// Creates an empty collection whose synchronized fields see an always
    /// enabled peripheral.
    pub fn new() -> Self {
        Self {
            registers: BTreeMap::new(),
            enablement: Rc::new(AlwaysEnabled),
        }
    }

    /// Creates a collection from already built registers.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::DuplicateRegister`] if two registers share an
    /// offset.
    pub fn from_registers(
        registers: impl IntoIterator<Item = Register>,
    ) -> Result<Self, LayoutError> {
        let mut collection = Self::new();
        for register in registers {
            collection.insert(register)?;
        }
        Ok(collection)
    }

    /// Adds a register at its own offset.
    pub fn insert(&mut self, register: Register) -> Result<(), LayoutError> {
        if let Some(existing) = self.registers.get(&register.offset()) {
            return Err(LayoutError::DuplicateRegister {
                offset: register.offset(),
                existing: existing.name().to_string(),
            });
        }
        self.registers.insert(register.offset(), register);
        Ok(())
    }

    /// Replaces the enablement consulted by synchronized fields.
    pub fn set_enablement(&mut self, enablement: Rc<dyn Enablement>) {
        self.enablement = enablement;
    }

    pub fn is_enabled(&self) -> bool {
        self.enablement.is_enabled()
    }

    /// Reads the register at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::UnknownRegister`] if no register is defined.
    pub fn read(&mut self, offset: u32) -> Result<u32, AccessError> {
        self.registers
            .get_mut(&offset)
            .map(Register::read)
            .ok_or(AccessError::UnknownRegister {
                access: AccessType::Read,
                offset,
            })
    }

    /// Writes `value` to the register at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::UnknownRegister`] if no register is defined.
    pub fn write(&mut self, offset: u32, value: u32) -> Result<WriteReport, AccessError> {
        match self.registers.get_mut(&offset) {
            Some(register) => Ok(register.write(value, self.enablement.as_ref())),
            None => Err(AccessError::UnknownRegister {
                access: AccessType::Write,
                offset,
            }),
        }
    }

    /// Resets every register.
    pub fn reset(&mut self) {
        for register in self.registers.values_mut() {
            register.reset();
        }
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.registers.contains_key(&offset)
    }

    pub fn get(&self, offset: u32) -> Option<&Register> {
        self.registers.get(&offset)
    }

    pub fn get_mut(&mut self, offset: u32) -> Option<&mut Register> {
        self.registers.get_mut(&offset)
    }

    /// Finds a register by name.
    pub fn by_name(&self, name: &str) -> Option<&Register> {
        self.registers.values().find(|r| r.name() == name)
    }

    /// Finds a register by name, mutably.
    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Register> {
        self.registers.values_mut().find(|r| r.name() == name)
    }

    /// Iterates registers in offset order.
    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.registers.values()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Captures the live state of every register, in offset order.
    pub fn snapshot(&mut self) -> Vec<RegisterSnapshot> {
        self.registers.values_mut().map(Register::snapshot).collect()
    }
}
