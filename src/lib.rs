//! MMIO Register Modeling Library.
//!
//! This crate models the memory-mapped registers of emulated peripherals:
//! bit-accurate fields with access modes and callbacks, 32-bit registers
//! composed of those fields, offset-keyed register collections, and a
//! bus-facing peripheral adapter that decodes SET/CLR/TGL alias regions.
//!
//! # Architecture
//!
//! * **Fields**: named bit ranges (flags, values, enumerations) with value
//!   providers, read/write callbacks and optional write synchronization.
//! * **Registers**: whole-word read/write dispatch over ordered fields,
//!   reserved bits, whole-register hooks and lock guards.
//! * **Peripherals**: alias decoding, enablement injection, reset hooks and
//!   access statistics. Bus accesses never fail; problems are logged.
//!
//! # Modules
//!
//! * `common`: Bit helpers, access types and error types.
//! * `config`: TOML peripheral descriptions.
//! * `register`: Fields, registers, collections and lock domains.
//! * `sim`: Access script replay.
//! * `soc`: Bus-facing traits, alias decoding and the peripheral adapter.
//! * `stats`: Access statistics collection and reporting.

/// Shared bit manipulation helpers, access types and error types.
pub mod common;

/// Declarative peripheral descriptions.
///
/// Loads TOML descriptions of registers, fields and lock domains and
/// instantiates them as ready-to-use peripherals.
pub mod config;

/// Field, register and register collection implementation.
///
/// Implements field composition, value providers, callbacks, access modes,
/// enumerated values and lock-key domains.
pub mod register;

/// Access script replay against a peripheral.
pub mod sim;

/// System-on-Chip side: device traits, alias decoding and the peripheral
/// adapter that serves bus accesses.
pub mod soc;

/// Access statistics collection and reporting.
///
/// Tracks reads, writes, alias operations and every non-fatal violation
/// reported while serving bus accesses.
pub mod stats;
