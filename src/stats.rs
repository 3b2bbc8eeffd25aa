//! Access statistics collection and reporting.
//!
//! Tracks every observable event of a peripheral: bus accesses, alias
//! operations, and the non-fatal violations that are logged instead of
//! failing the access.

use crate::common::error::AccessError;
use crate::soc::alias::AliasOp;
use serde::Serialize;

/// Access statistics of one peripheral.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AccessStats {
    pub reads: u64,
    pub writes: u64,

    pub set_writes: u64,
    pub clear_writes: u64,
    pub toggle_writes: u64,

    pub unsupported_alias_reads: u64,

    pub unknown_registers: u64,
    pub out_of_range: u64,
    pub misaligned: u64,
    pub unsupported_widths: u64,

    pub sync_violations: u64,
    pub locked_writes: u64,

    pub resets: u64,
}

impl AccessStats {
    /// Counts a successful write through `op`.
    pub fn record_alias_write(&mut self, op: AliasOp) {
        match op {
            AliasOp::Direct => {}
            AliasOp::Set => self.set_writes += 1,
            AliasOp::Clear => self.clear_writes += 1,
            AliasOp::Toggle => self.toggle_writes += 1,
        }
    }

    /// Counts a failed access.
    pub fn record_error(&mut self, err: &AccessError) {
        match err {
            AccessError::UnknownRegister { .. } => self.unknown_registers += 1,
            AccessError::OutOfRange { .. } => self.out_of_range += 1,
            AccessError::Misaligned { .. } => self.misaligned += 1,
            AccessError::UnsupportedWidth { .. } => self.unsupported_widths += 1,
        }
    }

    /// Total number of failed accesses.
    pub fn errors(&self) -> u64 {
        self.unknown_registers + self.out_of_range + self.misaligned + self.unsupported_widths
    }

    /// Prints a formatted summary of all access statistics.
    pub fn print(&self, name: &str) {
        let accesses = self.reads + self.writes;
        let alias_writes = self.set_writes + self.clear_writes + self.toggle_writes;
        let alias_pct = if self.writes == 0 {
            0.0
        } else {
            100.0 * alias_writes as f64 / self.writes as f64
        };

        println!("\n==========================================================");
        println!("ACCESS STATISTICS: {}", name);
        println!("==========================================================");
        println!("accesses                 {}", accesses);
        println!("  reads                  {}", self.reads);
        println!("  writes                 {}", self.writes);
        println!("alias writes             {} ({:.1}% of writes)", alias_writes, alias_pct);
        println!("  set                    {}", self.set_writes);
        println!("  clear                  {}", self.clear_writes);
        println!("  toggle                 {}", self.toggle_writes);
        println!("alias reads (fallback)   {}", self.unsupported_alias_reads);
        println!("----------------------------------------------------------");
        println!("failed accesses          {}", self.errors());
        println!("  unknown register       {}", self.unknown_registers);
        println!("  out of range           {}", self.out_of_range);
        println!("  misaligned             {}", self.misaligned);
        println!("  unsupported width      {}", self.unsupported_widths);
        println!("sync violations          {}", self.sync_violations);
        println!("locked writes            {}", self.locked_writes);
        println!("resets                   {}", self.resets);
        println!("==========================================================");
    }
}
