//! Register Fields.
//!
//! A field is a named, contiguous bit range of a 32-bit register with an
//! access mode, a value kind and optional callbacks. Fields never hold their
//! own value: the owning [`Register`](super::Register) keeps the word and
//! hands each field its slice when a callback has to run.
//!
//! Fields are built with chained modifiers:
//!
//! ```
//! use mmio_regs::register::field::{Field, FieldAccess};
//!
//! let ready = Field::flag(0, "Rdy")
//!     .read_only()
//!     .flag_provider(|_| true);
//! assert_eq!(ready.access_mode(), FieldAccess::ReadOnly);
//! ```

use crate::common::bits;
use crate::register::enumerated::{variants_of, EnumValue, FieldEnum, Variant};
use serde::Deserialize;
use std::fmt;

/// Computes the live value of a field from its stored value.
pub type ValueProvider = Box<dyn FnMut(u32) -> u32>;

/// Observes a field access with `(old, new)` raw values.
pub type FieldCallback = Box<dyn FnMut(u32, u32)>;

/// Access mode of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAccess {
    /// Writes are discarded.
    #[serde(alias = "r", alias = "ro")]
    ReadOnly,

    /// Reads return zero.
    #[serde(alias = "w", alias = "wo")]
    WriteOnly,

    /// Plain storage.
    #[serde(alias = "rw")]
    ReadWrite,

    /// Writing 1 clears the bit, writing 0 leaves it unchanged.
    #[serde(alias = "w1c")]
    WriteOneToClear,

    /// Read/write storage that is cleared after every read.
    #[serde(alias = "rc")]
    ReadToClear,

    /// Read/write storage that is set to all ones after every read.
    #[serde(alias = "rs")]
    ReadToSet,

    /// Writing 1 sets the bit, writing 0 leaves it unchanged.
    #[serde(alias = "w1s")]
    Set,

    /// Writing 1 inverts the bit, writing 0 leaves it unchanged.
    #[serde(alias = "w1t")]
    Toggle,

    /// Any write clears the field.
    #[serde(alias = "wc")]
    WriteToClear,

    /// Any write sets every bit of the field.
    #[serde(alias = "ws")]
    WriteToSet,

    /// Writing 0 clears the bit, writing 1 leaves it unchanged.
    #[serde(alias = "w0c")]
    WriteZeroToClear,

    /// Writing 0 sets the bit, writing 1 leaves it unchanged.
    #[serde(alias = "w0s")]
    WriteZeroToSet,

    /// Writing 0 inverts the bit, writing 1 leaves it unchanged.
    #[serde(alias = "w0t")]
    WriteZeroToToggle,
}

impl FieldAccess {
    /// Returns `true` if reads expose the stored bits.
    pub fn is_readable(self) -> bool {
        !matches!(self, FieldAccess::WriteOnly)
    }

    /// Returns `true` if writes can change the stored bits.
    pub fn is_writable(self) -> bool {
        !matches!(self, FieldAccess::ReadOnly)
    }

    /// Computes the stored bits after a write of `written` over `current`.
    ///
    /// Both values are field slices of `width` bits.
    pub fn apply_write(self, current: u32, written: u32, width: u8) -> u32 {
        let next = match self {
            FieldAccess::ReadOnly => current,
            FieldAccess::WriteOnly
            | FieldAccess::ReadWrite
            | FieldAccess::ReadToClear
            | FieldAccess::ReadToSet => written,
            FieldAccess::Set => current | written,
            FieldAccess::Toggle => current ^ written,
            FieldAccess::WriteOneToClear => current & !written,
            FieldAccess::WriteToClear => 0,
            FieldAccess::WriteToSet => u32::MAX,
            FieldAccess::WriteZeroToClear => current & written,
            FieldAccess::WriteZeroToSet => current | !written,
            FieldAccess::WriteZeroToToggle => current ^ !written,
        };
        bits::truncate(next, width)
    }

    /// Computes the stored bits left behind by a read of `current`.
    pub fn apply_read(self, current: u32, width: u8) -> u32 {
        match self {
            FieldAccess::ReadToClear => 0,
            FieldAccess::ReadToSet => bits::truncate(u32::MAX, width),
            _ => current,
        }
    }
}

/// Write synchronization requirement of a field.
///
/// Writes to synchronized fields are only meaningful while the owning
/// peripheral is enabled. Violations are reported, never rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Write synchronized.
    Wsync,
    /// Read and write synchronized.
    Rwsync,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Wsync => write!(f, "WSYNC"),
            SyncMode::Rwsync => write!(f, "RWSYNC"),
        }
    }
}

/// Semantic value kind of a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-bit boolean.
    Flag,
    /// Unsigned integer.
    Value,
    /// Named encodings.
    Enumerated(Vec<Variant>),
}

/// A named bit range of a register.
pub struct Field {
    name: String,
    offset: u8,
    width: u8,
    access: FieldAccess,
    kind: FieldKind,
    sync: Option<SyncMode>,
    provider: Option<ValueProvider>,
    read_callback: Option<FieldCallback>,
    write_callback: Option<FieldCallback>,
    change_callback: Option<FieldCallback>,
}

impl Field {
    fn new(offset: u8, width: u8, kind: FieldKind, name: &str) -> Self {
        Self {
            name: name.to_string(),
            offset,
            width,
            access: FieldAccess::ReadWrite,
            kind,
            sync: None,
            provider: None,
            read_callback: None,
            write_callback: None,
            change_callback: None,
        }
    }

    /// Creates a read/write single-bit flag at `offset`.
    pub fn flag(offset: u8, name: &str) -> Self {
        Self::new(offset, 1, FieldKind::Flag, name)
    }

    /// Creates a read/write unsigned value field.
    pub fn value(offset: u8, width: u8, name: &str) -> Self {
        Self::new(offset, width, FieldKind::Value, name)
    }

    /// Creates a read/write enumerated field typed by `E`.
    pub fn enumerated<E: FieldEnum>(offset: u8, width: u8, name: &str) -> Self {
        Self::new(offset, width, FieldKind::Enumerated(variants_of::<E>()), name)
    }

    /// Creates a read/write enumerated field from a runtime variant table.
    pub fn with_variants(offset: u8, width: u8, name: &str, variants: Vec<Variant>) -> Self {
        Self::new(offset, width, FieldKind::Enumerated(variants), name)
    }

    /// Sets the access mode.
    pub fn access(mut self, access: FieldAccess) -> Self {
        self.access = access;
        self
    }

    /// Makes the field read-only.
    pub fn read_only(self) -> Self {
        self.access(FieldAccess::ReadOnly)
    }

    /// Makes the field write-only.
    pub fn write_only(self) -> Self {
        self.access(FieldAccess::WriteOnly)
    }

    /// Marks the field as requiring synchronization on write.
    pub fn sync(mut self, mode: SyncMode) -> Self {
        self.sync = Some(mode);
        self
    }

    /// Shorthand for `sync(SyncMode::Wsync)`.
    pub fn wsync(self) -> Self {
        self.sync(SyncMode::Wsync)
    }

    /// Shorthand for `sync(SyncMode::Rwsync)`.
    pub fn rwsync(self) -> Self {
        self.sync(SyncMode::Rwsync)
    }

    /// Installs a raw value provider.
    ///
    /// The provider receives the stored bits and returns the bits to store
    /// before the register word is composed. Extra high bits are discarded.
    pub fn provider(mut self, provider: impl FnMut(u32) -> u32 + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Installs a boolean value provider on a flag.
    pub fn flag_provider(self, mut provider: impl FnMut(bool) -> bool + 'static) -> Self {
        self.provider(move |bits| provider(bits != 0) as u32)
    }

    /// Installs a typed value provider on an enumerated field.
    pub fn enum_provider<E: FieldEnum>(
        self,
        mut provider: impl FnMut(EnumValue<E>) -> EnumValue<E> + 'static,
    ) -> Self {
        self.provider(move |bits| provider(EnumValue::from_bits(bits)).bits())
    }

    /// Installs a raw write callback, called with `(old, written)`.
    ///
    /// `written` is the slice of the bus word, even when the field is
    /// read-only and the slice was discarded.
    pub fn on_write(mut self, callback: impl FnMut(u32, u32) + 'static) -> Self {
        self.write_callback = Some(Box::new(callback));
        self
    }

    /// Installs a boolean write callback on a flag.
    pub fn on_flag_write(self, mut callback: impl FnMut(bool, bool) + 'static) -> Self {
        self.on_write(move |old, new| callback(old != 0, new != 0))
    }

    /// Installs a typed write callback on an enumerated field.
    pub fn on_enum_write<E: FieldEnum>(
        self,
        mut callback: impl FnMut(EnumValue<E>, EnumValue<E>) + 'static,
    ) -> Self {
        self.on_write(move |old, new| {
            callback(EnumValue::from_bits(old), EnumValue::from_bits(new))
        })
    }

    /// Installs a raw read callback, called with `(old, new)` after the
    /// register word has been composed.
    pub fn on_read(mut self, callback: impl FnMut(u32, u32) + 'static) -> Self {
        self.read_callback = Some(Box::new(callback));
        self
    }

    /// Installs a raw change callback, called with `(old, new)` stored bits.
    ///
    /// Runs after a read or write only if the access changed the stored
    /// slice. Values supplied by a provider do not count as changes.
    pub fn on_change(mut self, callback: impl FnMut(u32, u32) + 'static) -> Self {
        self.change_callback = Some(Box::new(callback));
        self
    }

    /// Installs a boolean change callback on a flag.
    pub fn on_flag_change(self, mut callback: impl FnMut(bool, bool) + 'static) -> Self {
        self.on_change(move |old, new| callback(old != 0, new != 0))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn access_mode(&self) -> FieldAccess {
        self.access
    }

    /// Returns the synchronization requirement, if any.
    pub fn sync_mode(&self) -> Option<SyncMode> {
        self.sync
    }

    /// Returns the mask of the field within the register word.
    pub fn mask(&self) -> u32 {
        bits::mask(self.offset, self.width)
    }

    /// Returns the field slice of `word`.
    pub fn extract(&self, word: u32) -> u32 {
        bits::extract(word, self.offset, self.width)
    }

    /// Returns `word` with the field slice replaced by `value`.
    pub fn insert(&self, word: u32, value: u32) -> u32 {
        bits::insert(word, self.offset, self.width, value)
    }

    /// Runs the value provider, returning the live bits.
    pub(crate) fn provide(&mut self, current: u32) -> u32 {
        match self.provider.as_mut() {
            Some(provider) => bits::truncate(provider(current), self.width),
            None => current,
        }
    }

    pub(crate) fn notify_read(&mut self, old: u32, new: u32) {
        if let Some(callback) = self.read_callback.as_mut() {
            callback(old, new);
        }
    }

    pub(crate) fn notify_write(&mut self, old: u32, written: u32) {
        if let Some(callback) = self.write_callback.as_mut() {
            callback(old, written);
        }
    }

    /// Calls the change callback if the slice differs between the two words.
    pub(crate) fn notify_change(&mut self, old_word: u32, new_word: u32) {
        let (old, new) = (self.extract(old_word), self.extract(new_word));
        if old == new {
            return;
        }
        if let Some(callback) = self.change_callback.as_mut() {
            callback(old, new);
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("width", &self.width)
            .field("access", &self.access)
            .field("kind", &self.kind)
            .field("sync", &self.sync)
            .finish()
    }
}
