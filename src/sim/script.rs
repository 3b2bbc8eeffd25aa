//! Access Script Replay.
//!
//! A script is a TOML list of bus operations replayed against one
//! peripheral. Every step yields a [`TraceRecord`]; the CLI prints them as
//! JSON lines.
//!
//! ```toml
//! [[step]]
//! op = "write"
//! address = "0x1024"
//! value = "0x1A20"
//!
//! [[step]]
//! op = "read"
//! address = "0x10"
//! expect = "0x0"
//! ```

use crate::common::data::AccessType;
use crate::config::{parse_hex32, ConfigError};
use crate::soc::alias::AliasOp;
use crate::soc::peripheral::Peripheral;
use crate::soc::traits::EnableFlag;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct Script {
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

/// One scripted operation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// 32-bit read; `expect` marks the record on mismatch.
    Read {
        address: String,
        #[serde(default)]
        expect: Option<String>,
    },
    /// 32-bit write.
    Write { address: String, value: String },
    /// Peripheral reset.
    Reset,
    /// Drives the enable flag high.
    Enable,
    /// Drives the enable flag low.
    Disable,
}

/// Outcome of one replayed step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceRecord {
    pub step: usize,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<AliasOp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<u32>,
}

impl TraceRecord {
    fn new(step: usize, op: &'static str) -> Self {
        Self {
            step,
            op,
            address: None,
            alias: None,
            value: None,
            expected: None,
        }
    }

    /// Returns `false` only for reads whose value differs from `expect`.
    pub fn matches(&self) -> bool {
        match self.expected {
            Some(expected) => self.value == Some(expected),
            None => true,
        }
    }
}

impl Script {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Replays every step in order.
    ///
    /// # Arguments
    ///
    /// * `peripheral` - Target of the bus operations.
    /// * `enable` - Flag driven by `enable`/`disable` steps; normally the one
    ///   returned by [`Config::build`](crate::config::Config::build).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHex`] for a malformed address or value.
    /// Steps before the malformed one have already been applied.
    pub fn run(
        &self,
        peripheral: &mut Peripheral,
        enable: &EnableFlag,
    ) -> Result<Vec<TraceRecord>, ConfigError> {
        let mut trace = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let record = match step {
                Step::Read { address, expect } => {
                    let address = parse_hex32(address)?;
                    let expected = expect.as_deref().map(parse_hex32).transpose()?;
                    let value = peripheral.read_word(address);
                    let record = TraceRecord {
                        address: Some(address),
                        alias: alias_of(peripheral, address, AccessType::Read),
                        value: Some(value),
                        expected,
                        ..TraceRecord::new(index, "read")
                    };
                    if !record.matches() {
                        warn!(
                            "step {}: read {:#x} returned {:#010x}, expected {:#010x}",
                            index,
                            address,
                            value,
                            expected.unwrap_or_default()
                        );
                    }
                    record
                }
                Step::Write { address, value } => {
                    let address = parse_hex32(address)?;
                    let value = parse_hex32(value)?;
                    peripheral.write_word(address, value);
                    TraceRecord {
                        address: Some(address),
                        alias: alias_of(peripheral, address, AccessType::Write),
                        value: Some(value),
                        ..TraceRecord::new(index, "write")
                    }
                }
                Step::Reset => {
                    peripheral.reset();
                    TraceRecord::new(index, "reset")
                }
                Step::Enable => {
                    enable.set(true);
                    TraceRecord::new(index, "enable")
                }
                Step::Disable => {
                    enable.set(false);
                    TraceRecord::new(index, "disable")
                }
            };
            debug!("step {}: {:?}", index, record);
            trace.push(record);
        }
        Ok(trace)
    }
}

fn alias_of(peripheral: &Peripheral, address: u32, access: AccessType) -> Option<AliasOp> {
    peripheral
        .decoder()
        .decode(address, access)
        .ok()
        .map(|decoded| decoded.op)
}
