//! System-on-Chip side of the framework.
//!
//! Everything the bus sees of a register-modeled peripheral: the device and
//! enablement traits, alias address decoding and the peripheral adapter.

/// SET/CLR/TGL alias address decoding.
pub mod alias;

/// Bus-facing peripheral adapter.
pub mod peripheral;

/// Device and collaborator interfaces.
pub mod traits;

pub use alias::{AliasDecoder, AliasOp};
pub use peripheral::Peripheral;
pub use traits::{AlwaysEnabled, Device, EnableFlag, Enablement};
