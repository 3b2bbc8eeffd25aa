//! Peripheral Descriptions.
//!
//! A register map can be described in TOML instead of Rust. Addresses, offsets,
//! reset values and lock keys are hex strings (`"0x1A20"`, underscores allowed),
//! everything else uses plain TOML types:
//!
//! ```toml
//! [peripheral]
//! name = "LFXO"
//! base = "0x4002_0000"
//!
//! [[register]]
//! name = "Ctrl"
//! offset = "0x4"
//! reset = "0x2"
//! field = [
//!     { name = "Div", bit = 0, width = 4, sync = "wsync" },
//!     { name = "Pending", bit = 8, width = 2, access = "w1c" },
//! ]
//!
//! [[lock]]
//! name = "LFXO"
//! key_register = "Lock"
//! key_field = "Lockkey"
//! keys = ["0x1A20"]
//! ```

use crate::common::bits;
use crate::common::error::LayoutError;
use crate::register::enumerated::Variant;
use crate::register::field::{Field, FieldAccess, SyncMode};
use crate::register::lock::{LockDomain, LockState};
use crate::register::{Register, RegisterCollection};
use crate::soc::alias::AliasDecoder;
use crate::soc::peripheral::Peripheral;
use crate::soc::traits::EnableFlag;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

const DEFAULT_REGION_SIZE: &str = "0x1000";
const DEFAULT_RESET: &str = "0x0";

/// Failures while loading or instantiating a description.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse description: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("'{0}' is not a valid hex value")]
    InvalidHex(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("lock '{lock}' refers to unknown field '{register}.{field}'")]
    UnknownLockTarget {
        lock: String,
        register: String,
        field: String,
    },

    #[error("lock '{lock}' guards unknown register '{register}'")]
    UnknownGuard { lock: String, register: String },

    #[error("lock '{lock}' key {key} does not fit its {width}-bit key field")]
    KeyTooWide { lock: String, key: String, width: u8 },
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub peripheral: PeripheralConfig,
    #[serde(rename = "register", default)]
    pub registers: Vec<RegisterConfig>,
    #[serde(rename = "lock", default)]
    pub locks: Vec<LockConfig>,
}

#[derive(Debug, Deserialize)]
pub struct PeripheralConfig {
    pub name: String,

    #[serde(default = "default_base")]
    pub base: String,

    #[serde(default = "default_region_size")]
    pub region_size: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl PeripheralConfig {
    pub fn base_val(&self) -> Result<u64, ConfigError> {
        parse_hex(&self.base)
    }

    pub fn region_size_val(&self) -> Result<u32, ConfigError> {
        parse_hex32(&self.region_size)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterConfig {
    pub name: String,
    pub offset: String,

    #[serde(default = "default_reset")]
    pub reset: String,

    #[serde(rename = "field", default)]
    pub fields: Vec<FieldConfig>,

    #[serde(default)]
    pub reserved: Vec<ReservedConfig>,
}

#[derive(Debug, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    pub bit: u8,

    #[serde(default = "default_width")]
    pub width: u8,

    #[serde(default = "default_access")]
    pub access: FieldAccess,

    #[serde(default)]
    pub sync: Option<SyncMode>,

    #[serde(rename = "variant", default)]
    pub variants: Vec<Variant>,
}

impl FieldConfig {
    /// Builds the field. Single-bit fields without variants become flags.
    pub fn to_field(&self) -> Field {
        let field = if !self.variants.is_empty() {
            Field::with_variants(self.bit, self.width, &self.name, self.variants.clone())
        } else if self.width == 1 {
            Field::flag(self.bit, &self.name)
        } else {
            Field::value(self.bit, self.width, &self.name)
        };
        let field = field.access(self.access);
        match self.sync {
            Some(mode) => field.sync(mode),
            None => field,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReservedConfig {
    pub bit: u8,
    pub width: u8,
}

#[derive(Debug, Deserialize)]
pub struct LockConfig {
    pub name: String,
    pub key_register: String,
    pub key_field: String,

    #[serde(default)]
    pub status_register: Option<String>,

    #[serde(default)]
    pub status_field: Option<String>,

    pub keys: Vec<String>,

    #[serde(default)]
    pub locked_at_reset: bool,

    #[serde(default)]
    pub guards: Vec<String>,
}

impl LockConfig {
    fn is_key(&self, register: &str, field: &str) -> bool {
        self.key_register == register && self.key_field == field
    }

    fn is_status(&self, register: &str, field: &str) -> bool {
        self.status_register.as_deref() == Some(register)
            && self.status_field.as_deref() == Some(field)
    }

    /// Builds the lock domain. Every key must fit the key field, since only
    /// the field slice of a bus write is compared.
    fn domain(&self, registers: &[RegisterConfig]) -> Result<LockDomain, ConfigError> {
        let width = registers
            .iter()
            .filter(|r| r.name == self.key_register)
            .flat_map(|r| r.fields.iter())
            .find(|f| f.name == self.key_field)
            .map_or(32, |f| f.width);

        let mut keys = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let value = parse_hex32(key)?;
            if value != bits::truncate(value, width) {
                return Err(ConfigError::KeyTooWide {
                    lock: self.name.clone(),
                    key: key.clone(),
                    width,
                });
            }
            keys.push(value);
        }
        let reset_state = if self.locked_at_reset {
            LockState::Locked
        } else {
            LockState::Unlocked
        };
        Ok(LockDomain::new(&self.name, &keys, reset_state))
    }

    /// Checks that every register and field the lock names exists.
    fn validate(&self, registers: &[RegisterConfig]) -> Result<(), ConfigError> {
        let has_field = |register: &str, field: &str| {
            registers
                .iter()
                .any(|r| r.name == register && r.fields.iter().any(|f| f.name == field))
        };
        let unknown = |register: &str, field: &str| ConfigError::UnknownLockTarget {
            lock: self.name.clone(),
            register: register.to_string(),
            field: field.to_string(),
        };

        if !has_field(self.key_register.as_str(), self.key_field.as_str()) {
            return Err(unknown(self.key_register.as_str(), self.key_field.as_str()));
        }
        match (self.status_register.as_deref(), self.status_field.as_deref()) {
            (Some(register), Some(field)) if !has_field(register, field) => {
                return Err(unknown(register, field));
            }
            (Some(register), None) => return Err(unknown(register, "")),
            (None, Some(field)) => return Err(unknown("", field)),
            _ => {}
        }
        for guarded in &self.guards {
            if !registers.iter().any(|r| &r.name == guarded) {
                return Err(ConfigError::UnknownGuard {
                    lock: self.name.clone(),
                    register: guarded.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Config {
    /// Parses a description from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a description file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Instantiates the described peripheral.
    ///
    /// Key and status fields named by `[[lock]]` tables are wired to their
    /// lock domain, guarded registers get a lock guard and every domain is
    /// reset together with the peripheral.
    ///
    /// # Returns
    ///
    /// The peripheral and the enable flag gating its synchronized fields,
    /// initialized from `peripheral.enabled`.
    pub fn build(&self) -> Result<(Peripheral, EnableFlag), ConfigError> {
        let mut domains = Vec::with_capacity(self.locks.len());
        for lock in &self.locks {
            lock.validate(&self.registers)?;
            domains.push(lock.domain(&self.registers)?);
        }

        let mut collection = RegisterCollection::new();
        for register in &self.registers {
            collection.insert(self.build_register(register, &domains)?)?;
        }

        let enable = EnableFlag::new(self.peripheral.enabled);
        let decoder = AliasDecoder::new(self.peripheral.region_size_val()?)?;
        let mut peripheral = Peripheral::new(
            &self.peripheral.name,
            self.peripheral.base_val()?,
            collection,
            Rc::new(enable.clone()),
        )
        .with_decoder(decoder);

        for domain in domains {
            peripheral.on_reset(move || domain.reset());
        }

        Ok((peripheral, enable))
    }

    fn build_register(
        &self,
        register: &RegisterConfig,
        domains: &[LockDomain],
    ) -> Result<Register, ConfigError> {
        let mut builder = Register::builder(
            parse_hex32(&register.offset)?,
            &register.name,
            parse_hex32(&register.reset)?,
        );

        for field_config in &register.fields {
            let mut field = field_config.to_field();
            for (lock, domain) in self.locks.iter().zip(domains) {
                if lock.is_key(&register.name, &field_config.name) {
                    field = domain.attach_key(field);
                }
                if lock.is_status(&register.name, &field_config.name) {
                    field = domain.attach_status(field);
                }
            }
            builder = builder.with_field(field);
        }
        for reserved in &register.reserved {
            builder = builder.with_reserved_bits(reserved.bit, reserved.width);
        }
        for (lock, domain) in self.locks.iter().zip(domains) {
            if lock.guards.contains(&register.name) {
                builder = builder.lock_guard(domain.clone());
            }
        }

        Ok(builder.build()?)
    }
}

/// Parses a hex string with an optional `0x` prefix and `_` separators.
pub fn parse_hex(s: &str) -> Result<u64, ConfigError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .replace('_', "");
    u64::from_str_radix(&digits, 16).map_err(|_| ConfigError::InvalidHex(s.to_string()))
}

/// Parses a hex string that must fit in 32 bits.
pub fn parse_hex32(s: &str) -> Result<u32, ConfigError> {
    u32::try_from(parse_hex(s)?).map_err(|_| ConfigError::InvalidHex(s.to_string()))
}

fn default_base() -> String {
    DEFAULT_RESET.to_string()
}

fn default_region_size() -> String {
    DEFAULT_REGION_SIZE.to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_reset() -> String {
    DEFAULT_RESET.to_string()
}

fn default_width() -> u8 {
    1
}

fn default_access() -> FieldAccess {
    FieldAccess::ReadWrite
}
