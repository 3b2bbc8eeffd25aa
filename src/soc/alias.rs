//! Alias Address Decoding.
//!
//! Peripherals following the SET/CLR/TGL bus convention expose every register
//! four times, once per region of `region_size` bytes:
//!
//! | Region | Offset             | Write effect            |
//! |--------|--------------------|-------------------------|
//! | 0      | `+0`               | plain write             |
//! | 1      | `+region_size`     | `reg = reg \| value`    |
//! | 2      | `+2 * region_size` | `reg = reg & !value`    |
//! | 3      | `+3 * region_size` | `reg = reg ^ value`     |
//!
//! Alias writes are a read-modify-write through the full register read and
//! write paths. Reads through an alias region are not supported: they log a
//! warning and return the base register, unmodified by the alias operation.

use crate::common::data::AccessType;
use crate::common::error::{AccessError, LayoutError};
use crate::register::{RegisterCollection, WriteReport};
use log::warn;
use serde::Serialize;
use std::fmt;

/// Region size of the common 4 KiB bank convention.
pub const DEFAULT_REGION_SIZE: u32 = 0x1000;

/// Number of regions: direct, set, clear, toggle.
pub const REGION_COUNT: u32 = 4;

/// Operation selected by the alias region of an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasOp {
    Direct,
    Set,
    Clear,
    Toggle,
}

impl AliasOp {
    /// Maps a region index to its operation.
    pub fn from_region(region: u32) -> Option<Self> {
        match region {
            0 => Some(AliasOp::Direct),
            1 => Some(AliasOp::Set),
            2 => Some(AliasOp::Clear),
            3 => Some(AliasOp::Toggle),
            _ => None,
        }
    }

    /// Returns the region index of the operation.
    pub fn region(self) -> u32 {
        self as u32
    }

    /// Combines the current register word with a bus word.
    pub fn apply(self, current: u32, value: u32) -> u32 {
        match self {
            AliasOp::Direct => value,
            AliasOp::Set => current | value,
            AliasOp::Clear => current & !value,
            AliasOp::Toggle => current ^ value,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AliasOp::Direct => "Direct",
            AliasOp::Set => "Set",
            AliasOp::Clear => "Clr",
            AliasOp::Toggle => "Tgl",
        }
    }
}

impl fmt::Display for AliasOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A raw address split into operation and base-bank offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedAddress {
    pub op: AliasOp,
    pub offset: u32,
}

/// Result of a read served through the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AliasRead {
    pub op: AliasOp,
    pub offset: u32,
    pub value: u32,
}

/// Result of a write served through the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AliasWrite {
    pub op: AliasOp,
    pub offset: u32,
    /// Word handed to the base register after applying the operation.
    pub written: u32,
    pub report: WriteReport,
}

/// Splits bus addresses into alias operation and register offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AliasDecoder {
    region_size: u32,
}

impl Default for AliasDecoder {
    fn default() -> Self {
        Self {
            region_size: DEFAULT_REGION_SIZE,
        }
    }
}

impl AliasDecoder {
    /// Creates a decoder for regions of `region_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::RegionSize`] unless `region_size` is a power of
    /// two of at least one word and the four regions fit in 32 bits.
    pub fn new(region_size: u32) -> Result<Self, LayoutError> {
        if !region_size.is_power_of_two() || region_size < 4 || region_size > 1 << 30 {
            return Err(LayoutError::RegionSize { size: region_size });
        }
        Ok(Self { region_size })
    }

    pub fn region_size(&self) -> u32 {
        self.region_size
    }

    /// Total addressable size: all four regions.
    pub fn window_size(&self) -> u64 {
        self.region_size as u64 * REGION_COUNT as u64
    }

    /// Decodes `address` (relative to the peripheral base).
    ///
    /// # Errors
    ///
    /// * [`AccessError::Misaligned`] if the address is not a multiple of 4.
    /// * [`AccessError::OutOfRange`] if it lies past the toggle region.
    pub fn decode(&self, address: u32, access: AccessType) -> Result<DecodedAddress, AccessError> {
        if address % 4 != 0 {
            return Err(AccessError::Misaligned { access, address });
        }
        let op = AliasOp::from_region(address / self.region_size).ok_or(
            AccessError::OutOfRange {
                access,
                address: address as u64,
                size: self.window_size(),
            },
        )?;
        Ok(DecodedAddress {
            op,
            offset: address & (self.region_size - 1),
        })
    }

    /// Reads through the decoder.
    ///
    /// Alias-region reads log a warning and fall back to the base register.
    pub fn read(
        &self,
        registers: &mut RegisterCollection,
        address: u32,
    ) -> Result<AliasRead, AccessError> {
        let DecodedAddress { op, offset } = self.decode(address, AccessType::Read)?;
        if op != AliasOp::Direct {
            warn!(
                "Reading from {} alias at {:#x} is not supported, returning base register {:#x}",
                op, address, offset
            );
        }
        let value = registers.read(offset)?;
        Ok(AliasRead { op, offset, value })
    }

    /// Writes through the decoder.
    ///
    /// Alias-region writes read the base register, apply the operation and
    /// write the result back.
    pub fn write(
        &self,
        registers: &mut RegisterCollection,
        address: u32,
        value: u32,
    ) -> Result<AliasWrite, AccessError> {
        let DecodedAddress { op, offset } = self.decode(address, AccessType::Write)?;
        if !registers.contains(offset) {
            return Err(AccessError::UnknownRegister {
                access: AccessType::Write,
                offset,
            });
        }

        let written = match op {
            AliasOp::Direct => value,
            _ => op.apply(registers.read(offset)?, value),
        };
        let report = registers.write(offset, written)?;

        Ok(AliasWrite {
            op,
            offset,
            written,
            report,
        })
    }
}
