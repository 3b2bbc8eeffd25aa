//! Common utilities and types used throughout the register framework.
//!
//! This module provides the access classification, bit manipulation helpers
//! and error types shared by fields, registers, the alias decoder and the
//! peripheral adapter.

/// Bit range helpers (masks, extraction, insertion).
pub mod bits;

/// Memory access type definitions.
pub mod data;

/// Error types for layout construction and bus accesses.
pub mod error;

pub use data::AccessType;
pub use error::{AccessError, LayoutError};
