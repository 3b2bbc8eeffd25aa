//! Register Model CLI.
//!
//! Loads a TOML peripheral description, optionally replays an access script
//! against it and prints the resulting trace, register dump and access
//! statistics.
//!
//! # Usage
//!
//! ```text
//! regsim --config configs/lfxo.toml --script configs/lfxo_script.toml --dump
//! ```

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};
use std::error::Error;
use std::process;

extern crate mmio_regs;

use mmio_regs::config::Config;
use mmio_regs::sim::Script;

/// Command-line arguments for the register model runner.
#[derive(Parser, Debug)]
#[command(author, version, about = "MMIO register model runner")]
struct Args {
    #[arg(short, long, default_value = "configs/lfxo.toml")]
    config: String,

    #[arg(short, long)]
    script: Option<String>,

    /// Print a JSON dump of every register after the script.
    #[arg(short, long)]
    dump: bool,

    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,
}

/// Writes log events to stderr as `[LEVEL] message`.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    let args = Args::parse();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(args.log_level);
    }

    if let Err(e) = run(&args) {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = Config::load(&args.config)?;
    let (mut peripheral, enable) = config.build()?;

    println!("Peripheral Configuration");
    println!("------------------------");
    println!("  Name:               {}", peripheral.name());
    println!("  Base:               {:#x}", peripheral.base());
    println!("  Window:             {:#x}", peripheral.size());
    println!("  Alias Region:       {:#x}", peripheral.decoder().region_size());
    println!("  Registers:          {}", peripheral.registers().len());
    println!("  Locks:              {}", config.locks.len());
    println!("  Enabled:            {}", enable.get());
    println!("------------------------");

    let mut mismatches = 0;
    if let Some(path) = &args.script {
        let script = Script::load(path)?;
        for record in script.run(&mut peripheral, &enable)? {
            if !record.matches() {
                mismatches += 1;
            }
            println!("{}", serde_json::to_string(&record)?);
        }
    }

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&peripheral.snapshot())?);
    }

    peripheral.stats().print(peripheral.name());

    if mismatches > 0 {
        return Err(format!("{} scripted read(s) did not match", mismatches).into());
    }
    Ok(())
}
