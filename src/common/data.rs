//! Memory Access Types.
//!
//! This module defines the classification of bus accesses used throughout
//! the framework. Access types are carried by errors and statistics so that
//! every reported event names the direction of the offending access.

use std::fmt;

/// Type of bus access operation.
///
/// Used to distinguish between reads and writes when reporting unknown
/// registers, out-of-range addresses and unsupported access widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Data read access.
    ///
    /// Runs value providers and read callbacks of the targeted register.
    Read,

    /// Data write access.
    ///
    /// Stores field slices and runs write callbacks of the targeted register.
    Write,
}

impl AccessType {
    /// Returns the lowercase name of the access type.
    pub fn name(&self) -> &'static str {
        match self {
            AccessType::Read => "read",
            AccessType::Write => "write",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
