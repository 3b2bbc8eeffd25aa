//! Registers.
//!
//! A register is a 32-bit word composed of ordered fields plus reserved bits.
//! It owns the stored word and all callbacks of its fields. Reads and writes
//! always cover the whole word.
//!
//! # Dispatch order
//!
//! * **Read**: value providers in field order, composition, read-to-clear
//!   and read-to-set side effects, field read callbacks in field order, field
//!   change callbacks, register read hooks, register change hooks.
//! * **Write**: for each field in order the slice is stored through its
//!   access mode, synchronization is checked and the field write callback
//!   runs; then field change callbacks run, the lock guard is checked, and
//!   register write hooks and change hooks run.
//!
//! Change callbacks and hooks only run when the access changed the stored
//! bits they cover.

use crate::common::bits;
use crate::common::error::LayoutError;
use crate::register::enumerated::variant_name;
use crate::soc::traits::Enablement;
use log::{error, warn};
use serde::Serialize;

/// Bit-range field descriptors.
pub mod field;

/// Enumerated field values and the `field_enum!` macro.
pub mod enumerated;

/// Offset-keyed register maps.
pub mod collection;

/// Lock-key state machines.
pub mod lock;

pub use collection::RegisterCollection;
pub use enumerated::{EnumValue, FieldEnum};
pub use field::{Field, FieldAccess, FieldKind, SyncMode};
pub use lock::{LockDomain, LockState};

/// Whole-register hook, called with `(old, new)` words.
pub type RegisterHook = Box<dyn FnMut(u32, u32)>;

/// Observable side effects of a single register write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Synchronized fields written while the peripheral was disabled.
    pub sync_violations: u32,
    /// The register was written while its lock guard was locked.
    pub locked: bool,
}

/// A 32-bit register.
pub struct Register {
    name: String,
    offset: u32,
    reset_value: u32,
    value: u32,
    fields: Vec<Field>,
    reserved_mask: u32,
    write_only_mask: u32,
    read_hooks: Vec<RegisterHook>,
    write_hooks: Vec<RegisterHook>,
    change_hooks: Vec<RegisterHook>,
    lock_guard: Option<LockDomain>,
}

impl Register {
    /// Starts building a register.
    ///
    /// # Arguments
    ///
    /// * `offset` - Byte offset of the register in the base bank.
    /// * `name` - Name used in log events and dumps.
    /// * `reset_value` - Word restored by [`Register::reset`].
    pub fn builder(offset: u32, name: &str, reset_value: u32) -> RegisterBuilder {
        RegisterBuilder {
            name: name.to_string(),
            offset,
            reset_value,
            fields: Vec::new(),
            reserved: Vec::new(),
            read_hooks: Vec::new(),
            write_hooks: Vec::new(),
            change_hooks: Vec::new(),
            lock_guard: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn reset_value(&self) -> u32 {
        self.reset_value
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Bits not covered by any field.
    pub fn reserved_mask(&self) -> u32 {
        self.reserved_mask
    }

    /// Bits a write can change: writable fields only.
    pub fn writable_mask(&self) -> u32 {
        self.fields
            .iter()
            .filter(|f| f.access_mode().is_writable())
            .fold(0, |acc, f| acc | f.mask())
    }

    /// Returns the stored word without running any callback.
    ///
    /// Unlike [`Register::read`], write-only bits are included.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Returns the field named `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Returns the stored slice of field `name` without running callbacks.
    pub fn field_value(&self, name: &str) -> Option<u32> {
        self.field(name).map(|f| f.extract(self.value))
    }

    /// Overwrites the stored slice of field `name` without running callbacks.
    ///
    /// Behavioral peripheral code uses this to update status bits. Returns
    /// `false` if no such field exists.
    pub fn set_field_value(&mut self, name: &str, value: u32) -> bool {
        match self.fields.iter().find(|f| f.name() == name) {
            Some(field) => {
                self.value = field.insert(self.value, value);
                true
            }
            None => false,
        }
    }

    /// Reads the register through the full read path.
    ///
    /// # Returns
    ///
    /// The composed word. Write-only bits read as zero and reserved bits
    /// read as their reset value.
    pub fn read(&mut self) -> u32 {
        self.refresh();

        let base = self.value;
        let word = base & !self.write_only_mask;

        for field in &self.fields {
            let current = field.extract(self.value);
            let next = field.access_mode().apply_read(current, field.width());
            self.value = field.insert(self.value, next);
        }
        for field in &mut self.fields {
            let (old, new) = (field.extract(base), field.extract(self.value));
            field.notify_read(old, new);
        }
        for field in &mut self.fields {
            field.notify_change(base, self.value);
        }
        for hook in &mut self.read_hooks {
            hook(base, self.value);
        }
        self.notify_change(base);

        word
    }

    /// Stores the output of every value provider.
    fn refresh(&mut self) {
        for field in &mut self.fields {
            let current = field.extract(self.value);
            let provided = field.provide(current);
            self.value = field.insert(self.value, provided);
        }
    }

    fn notify_change(&mut self, old_word: u32) {
        if old_word == self.value {
            return;
        }
        for hook in &mut self.change_hooks {
            hook(old_word, self.value);
        }
    }

    /// Writes a whole word through the full write path.
    ///
    /// # Arguments
    ///
    /// * `value` - The bus word. Reserved bits of it are discarded.
    /// * `gate` - Enablement consulted for synchronized fields.
    ///
    /// # Returns
    ///
    /// A [`WriteReport`] describing reported, non-fatal violations.
    pub fn write(&mut self, value: u32, gate: &dyn Enablement) -> WriteReport {
        let old_word = self.value;
        let mut report = WriteReport::default();

        for field in &mut self.fields {
            let old = field.extract(self.value);
            let written = field.extract(value);
            let next = field.access_mode().apply_write(old, written, field.width());
            self.value = field.insert(self.value, next);

            if let Some(mode) = field.sync_mode() {
                if !gate.is_enabled() {
                    warn!(
                        "{}: write to {} field '{}' while peripheral is disabled",
                        self.name,
                        mode,
                        field.name()
                    );
                    report.sync_violations += 1;
                }
            }
            field.notify_write(old, written);
        }
        for field in &mut self.fields {
            field.notify_change(old_word, self.value);
        }

        if let Some(lock) = &self.lock_guard {
            if lock.is_locked() {
                error!("{}: write access to a locked register", self.name);
                report.locked = true;
            }
        }
        for hook in &mut self.write_hooks {
            hook(old_word, self.value);
        }
        self.notify_change(old_word);

        report
    }

    /// Restores the reset value. Callbacks do not run.
    pub fn reset(&mut self) {
        self.value = self.reset_value;
    }

    /// Captures the live state for dumps.
    ///
    /// Value providers run and their output is stored, as at the start of a
    /// read. No callback runs and no read side effect applies.
    pub fn snapshot(&mut self) -> RegisterSnapshot {
        self.refresh();
        RegisterSnapshot {
            name: self.name.clone(),
            offset: self.offset,
            value: self.value,
            fields: self
                .fields
                .iter()
                .map(|f| {
                    let value = f.extract(self.value);
                    let variant = match f.kind() {
                        FieldKind::Enumerated(variants) => {
                            variant_name(variants, value).map(str::to_string)
                        }
                        _ => None,
                    };
                    FieldSnapshot {
                        name: f.name().to_string(),
                        value,
                        variant,
                    }
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Register")
            .field("name", &self.name)
            .field("offset", &format_args!("{:#x}", self.offset))
            .field("value", &format_args!("{:#010x}", self.value))
            .field("fields", &self.fields)
            .finish()
    }
}

/// Live state of a register, as written to dumps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterSnapshot {
    pub name: String,
    pub offset: u32,
    pub value: u32,
    pub fields: Vec<FieldSnapshot>,
}

/// Live state of a field, as written to dumps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldSnapshot {
    pub name: String,
    pub value: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Builder validating a register layout.
pub struct RegisterBuilder {
    name: String,
    offset: u32,
    reset_value: u32,
    fields: Vec<Field>,
    reserved: Vec<(u8, u8)>,
    read_hooks: Vec<RegisterHook>,
    write_hooks: Vec<RegisterHook>,
    change_hooks: Vec<RegisterHook>,
    lock_guard: Option<LockDomain>,
}

impl RegisterBuilder {
    /// Appends a field. Declaration order is dispatch order.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a plain read/write flag.
    pub fn with_flag(self, offset: u8, name: &str) -> Self {
        self.with_field(Field::flag(offset, name))
    }

    /// Declares a reserved range.
    ///
    /// Bits covered by no field are reserved anyway; declaring them makes the
    /// layout explicit and lets [`RegisterBuilder::build`] check it.
    pub fn with_reserved_bits(mut self, offset: u8, width: u8) -> Self {
        self.reserved.push((offset, width));
        self
    }

    /// Adds a whole-register read hook, called with `(old, new)`.
    pub fn on_read(mut self, hook: impl FnMut(u32, u32) + 'static) -> Self {
        self.read_hooks.push(Box::new(hook));
        self
    }

    /// Adds a whole-register write hook, called with `(old, new)`.
    pub fn on_write(mut self, hook: impl FnMut(u32, u32) + 'static) -> Self {
        self.write_hooks.push(Box::new(hook));
        self
    }

    /// Adds a whole-register change hook, called with `(old, new)` after a
    /// read or write that changed the stored word.
    pub fn on_change(mut self, hook: impl FnMut(u32, u32) + 'static) -> Self {
        self.change_hooks.push(Box::new(hook));
        self
    }

    /// Reports writes made while `lock` is locked. Writes still apply.
    pub fn lock_guard(mut self, lock: LockDomain) -> Self {
        self.lock_guard = Some(lock);
        self
    }

    /// Validates the layout and builds the register in its reset state.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] if the offset is not word aligned, or if a
    /// field or reserved range has zero width, exceeds bit 31, overlaps
    /// another range or duplicates a field name.
    pub fn build(self) -> Result<Register, LayoutError> {
        if self.offset % 4 != 0 {
            return Err(LayoutError::MisalignedRegister {
                register: self.name,
                offset: self.offset,
            });
        }

        let ranges = self
            .fields
            .iter()
            .map(|f| (f.name(), f.offset(), f.width()))
            .chain(self.reserved.iter().map(|&(o, w)| ("RESERVED", o, w)));

        let mut occupied = 0u32;
        for (name, offset, width) in ranges {
            if width == 0 {
                return Err(LayoutError::ZeroWidth {
                    register: self.name.clone(),
                    name: name.to_string(),
                });
            }
            if offset as u32 + width as u32 > 32 {
                return Err(LayoutError::OutOfRange {
                    register: self.name.clone(),
                    name: name.to_string(),
                    offset,
                    width,
                });
            }
            let mask = bits::mask(offset, width);
            if occupied & mask != 0 {
                return Err(LayoutError::Overlap {
                    register: self.name.clone(),
                    name: name.to_string(),
                });
            }
            occupied |= mask;
        }

        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name() == field.name()) {
                return Err(LayoutError::DuplicateField {
                    register: self.name.clone(),
                    name: field.name().to_string(),
                });
            }
        }

        let field_mask = self.fields.iter().fold(0, |acc, f| acc | f.mask());
        let write_only_mask = self
            .fields
            .iter()
            .filter(|f| !f.access_mode().is_readable())
            .fold(0, |acc, f| acc | f.mask());

        Ok(Register {
            name: self.name,
            offset: self.offset,
            reset_value: self.reset_value,
            value: self.reset_value,
            fields: self.fields,
            reserved_mask: !field_mask,
            write_only_mask,
            read_hooks: self.read_hooks,
            write_hooks: self.write_hooks,
            change_hooks: self.change_hooks,
            lock_guard: self.lock_guard,
        })
    }
}
