//! Error Types.
//!
//! Two families of errors exist. `LayoutError` is produced while a register
//! map is being assembled and means the description itself is wrong.
//! `AccessError` is produced while serving a bus access; the peripheral
//! adapter turns it into a log event and never lets it reach the bus.

use crate::common::data::AccessType;
use thiserror::Error;

/// Construction-time register layout violations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A field or reserved range was declared with zero bits.
    #[error("field '{name}' in register '{register}' has zero width")]
    ZeroWidth { register: String, name: String },

    /// A field or reserved range extends past bit 31.
    #[error("field '{name}' (bit {offset}, width {width}) does not fit in register '{register}'")]
    OutOfRange {
        register: String,
        name: String,
        offset: u8,
        width: u8,
    },

    /// Two ranges of the same register share at least one bit.
    #[error("field '{name}' intersects with another range in register '{register}'")]
    Overlap { register: String, name: String },

    /// Two fields of the same register carry the same name.
    #[error("register '{register}' defines field '{name}' more than once")]
    DuplicateField { register: String, name: String },

    /// Two registers were placed at the same offset.
    #[error("offset {offset:#x} is already occupied by register '{existing}'")]
    DuplicateRegister { offset: u32, existing: String },

    /// A register offset is not a multiple of four.
    #[error("register '{register}' offset {offset:#x} is not word aligned")]
    MisalignedRegister { register: String, offset: u32 },

    /// An alias region size that is not a power of two of at least one word.
    #[error("alias region size {size:#x} is not a power of two >= 4")]
    RegionSize { size: u32 },
}

/// Failures while serving a single bus access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No register is defined at the decoded offset.
    #[error("{access} of non existing register at offset {offset:#x}")]
    UnknownRegister { access: AccessType, offset: u32 },

    /// The address falls outside the peripheral window.
    #[error("{access} at {address:#x} is outside the {size:#x} byte window")]
    OutOfRange {
        access: AccessType,
        address: u64,
        size: u64,
    },

    /// The address is not doubleword aligned.
    #[error("{access} at {address:#x} is not word aligned")]
    Misaligned { access: AccessType, address: u32 },

    /// Only 32-bit accesses are modeled.
    #[error("{width}-byte {access} at {address:#x} is not supported")]
    UnsupportedWidth {
        access: AccessType,
        address: u64,
        width: u8,
    },
}

impl AccessError {
    /// Returns the direction of the failed access.
    pub fn access(&self) -> AccessType {
        match self {
            AccessError::UnknownRegister { access, .. }
            | AccessError::OutOfRange { access, .. }
            | AccessError::Misaligned { access, .. }
            | AccessError::UnsupportedWidth { access, .. } => *access,
        }
    }
}
