//! Integration tests for access script replay.

mod common;

use mmio_regs::config::{Config, ConfigError};
use mmio_regs::sim::{Script, Step, TraceRecord};
use mmio_regs::soc::AliasOp;

const LFXO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/lfxo.toml");
const LFXO_SCRIPT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/lfxo_script.toml");

/// Tests the bundled bring-up script against the bundled description.
#[test]
fn test_lfxo_script() {
    let (mut peripheral, enable) = Config::load(LFXO).unwrap().build().unwrap();
    let script = Script::load(LFXO_SCRIPT).unwrap();
    let trace = script.run(&mut peripheral, &enable).unwrap();

    assert_eq!(trace.len(), script.steps.len());
    assert!(trace.iter().all(TraceRecord::matches));
    assert!(enable.get());

    let set_write = trace
        .iter()
        .find(|r| r.op == "write" && r.alias == Some(AliasOp::Set))
        .unwrap();
    assert_eq!(set_write.address, Some(0x1008));

    let stats = peripheral.stats();
    assert_eq!(stats.sync_violations, 0);
    assert_eq!(stats.set_writes, 1);
    assert_eq!(stats.toggle_writes, 1);
    assert_eq!(stats.resets, 1);
    assert_eq!(stats.errors(), 0);
}

/// Tests that enable and disable steps drive the enable flag.
#[test]
fn test_enable_steps() {
    let mut f = common::fixture();
    let script = Script {
        steps: vec![
            Step::Disable,
            Step::Write {
                address: "0x14".to_string(),
                value: "0x5".to_string(),
            },
            Step::Enable,
            Step::Write {
                address: "0x14".to_string(),
                value: "0x6".to_string(),
            },
        ],
    };
    let trace = script.run(&mut f.peripheral, &f.clock).unwrap();
    assert_eq!(trace[0].op, "disable");
    assert_eq!(trace[3].value, Some(0x6));
    assert!(f.clock.get());
    assert_eq!(f.peripheral.stats().sync_violations, 1);
}

/// Tests that failed expectations are flagged without stopping the replay.
#[test]
fn test_read_mismatch() {
    let mut f = common::fixture();
    let script = Script::from_toml_str(
        r#"
        [[step]]
        op = "read"
        address = "0x4"
        expect = "0x3"

        [[step]]
        op = "read"
        address = "0x4"
        expect = "0x2"
        "#,
    )
    .unwrap();

    let trace = script.run(&mut f.peripheral, &f.clock).unwrap();
    assert!(!trace[0].matches());
    assert!(trace[1].matches());
    assert_eq!(trace[0].value, Some(0x2));
    assert_eq!(trace[0].expected, Some(0x3));
}

/// Tests the JSON form of trace records.
#[test]
fn test_trace_json() {
    let mut f = common::fixture();
    let script = Script::from_toml_str(
        r#"
        [[step]]
        op = "write"
        address = "0x3004"
        value = "0x1"

        [[step]]
        op = "reset"
        "#,
    )
    .unwrap();
    let trace = script.run(&mut f.peripheral, &f.clock).unwrap();

    let write = serde_json::to_value(&trace[0]).unwrap();
    assert_eq!(write["op"], "write");
    assert_eq!(write["alias"], "toggle");
    assert_eq!(write["address"], 0x3004);
    assert!(write.get("expected").is_none());

    let reset = serde_json::to_string(&trace[1]).unwrap();
    assert_eq!(reset, r#"{"step":1,"op":"reset"}"#);
}

/// Tests malformed scripts.
#[test]
fn test_script_errors() {
    assert!(matches!(
        Script::from_toml_str("[[step]]\nop = \"jump\"\n"),
        Err(ConfigError::Parse(_))
    ));

    let mut f = common::fixture();
    let script = Script {
        steps: vec![
            Step::Reset,
            Step::Read {
                address: "0xGG".to_string(),
                expect: None,
            },
        ],
    };
    assert!(matches!(
        script.run(&mut f.peripheral, &f.clock),
        Err(ConfigError::InvalidHex(_))
    ));
    assert_eq!(f.peripheral.stats().resets, 1);
}
