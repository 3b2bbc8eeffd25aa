//! Integration tests for TOML peripheral descriptions.

use mmio_regs::common::LayoutError;
use mmio_regs::config::{parse_hex, parse_hex32, Config, ConfigError};
use mmio_regs::register::{FieldAccess, FieldKind, SyncMode};

const LFXO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/lfxo.toml");

const MINIMAL: &str = r#"
[peripheral]
name = "MINI"
base = "0x5000_0000"

[[register]]
name = "Ctrl"
offset = "0x0"
reset = "0x1"
field = [
    { name = "En", bit = 0 },
    { name = "Div", bit = 4, width = 4, access = "rw", sync = "wsync" },
    { name = "Flags", bit = 8, width = 2, access = "w1c" },
]

[[register]]
name = "Key"
offset = "0x4"
field = [{ name = "Key", bit = 0, width = 16, access = "wo" }]

[[register]]
name = "Status"
offset = "0x8"
field = [{ name = "Locked", bit = 0, access = "ro" }]

[[lock]]
name = "MINI"
key_register = "Key"
key_field = "Key"
status_register = "Status"
status_field = "Locked"
keys = ["0xADE8"]
locked_at_reset = true
guards = ["Ctrl"]
"#;

/// Tests hex parsing with and without prefix and separators.
#[test]
fn test_parse_hex() {
    assert_eq!(parse_hex("0x1A20").unwrap(), 0x1A20);
    assert_eq!(parse_hex("1a20").unwrap(), 0x1A20);
    assert_eq!(parse_hex("0X8000_0181").unwrap(), 0x8000_0181);
    assert_eq!(parse_hex("0x1_0000_0000").unwrap(), 0x1_0000_0000);
    assert!(matches!(parse_hex("zz"), Err(ConfigError::InvalidHex(_))));
    assert!(matches!(parse_hex32("0x1_0000_0000"), Err(ConfigError::InvalidHex(_))));
}

/// Tests field defaults and access mode names.
#[test]
fn test_field_defaults() {
    let config = Config::from_toml_str(MINIMAL).unwrap();
    assert_eq!(config.peripheral.region_size, "0x1000");
    assert!(config.peripheral.enabled);

    let fields = &config.registers[0].fields;
    assert_eq!(fields[0].width, 1);
    assert_eq!(fields[0].access, FieldAccess::ReadWrite);
    assert_eq!(fields[2].access, FieldAccess::WriteOneToClear);
    assert_eq!(fields[0].to_field().kind(), &FieldKind::Flag);
    assert_eq!(fields[1].to_field().kind(), &FieldKind::Value);
    assert_eq!(config.registers[1].fields[0].access, FieldAccess::WriteOnly);
}

/// Tests lock wiring of a built description.
#[test]
fn test_build_wires_lock() {
    let (mut peripheral, enable) = Config::from_toml_str(MINIMAL).unwrap().build().unwrap();
    assert!(enable.get());
    assert_eq!(peripheral.base(), 0x5000_0000);
    assert_eq!(peripheral.read_word(0x8), 0x1);

    peripheral.write_word(0x4, 0xADE8);
    assert_eq!(peripheral.read_word(0x8), 0x0);
    assert_eq!(peripheral.read_word(0x4), 0x0);

    peripheral.write_word(0x0, 0x31);
    assert_eq!(peripheral.stats().locked_writes, 0);
    peripheral.write_word(0x4, 0x0);
    peripheral.write_word(0x0, 0x30);
    assert_eq!(peripheral.stats().locked_writes, 1);

    peripheral.write_word(0x4, 0xADE8);
    peripheral.reset();
    assert_eq!(peripheral.read_word(0x8), 0x1);
    assert_eq!(peripheral.read_word(0x0), 0x1);
}

/// Tests the bundled oscillator description.
#[test]
fn test_load_lfxo() {
    let config = Config::load(LFXO).unwrap();
    assert_eq!(config.peripheral.name, "LFXO");
    assert_eq!(config.locks.len(), 1);

    let (mut peripheral, enable) = config.build().unwrap();
    assert_eq!(peripheral.registers().len(), 11);
    assert_eq!(peripheral.read_word(0x0), 0x2);
    assert_eq!(peripheral.read_word(0x8), 0x10700);
    assert_eq!(peripheral.read_word(0x10), 0x0);

    let flags = peripheral.registers().by_name("If").unwrap();
    assert_eq!(flags.field("Rdy").unwrap().access_mode(), FieldAccess::ReadWrite);

    let cfg = peripheral.registers_mut().by_name_mut("Cfg").unwrap();
    assert_eq!(cfg.field("Mode").unwrap().sync_mode(), None);
    let snapshot = cfg.snapshot();
    let timeout = snapshot.fields.iter().find(|f| f.name == "Timeout").unwrap();
    assert_eq!(timeout.variant.as_deref(), Some("CYCLES32K"));

    enable.set(false);
    peripheral.write_word(0x14, 0x140);
    assert_eq!(peripheral.stats().sync_violations, 0);
    assert_eq!(peripheral.read_word(0x14), 0x140);
}

/// Tests that described synchronized fields report writes while disabled.
#[test]
fn test_description_sync_fields() {
    let (mut peripheral, enable) = Config::from_toml_str(MINIMAL).unwrap().build().unwrap();
    let ctrl = peripheral.registers().by_name("Ctrl").unwrap();
    assert_eq!(ctrl.field("Div").unwrap().sync_mode(), Some(SyncMode::Wsync));
    assert_eq!(ctrl.field("En").unwrap().sync_mode(), None);

    peripheral.write_word(0x4, 0xADE8);
    enable.set(false);
    peripheral.write_word(0x0, 0x51);
    assert_eq!(peripheral.stats().sync_violations, 1);
    assert_eq!(peripheral.read_word(0x0), 0x51);
}

/// Tests description errors.
#[test]
fn test_description_errors() {
    assert!(matches!(
        Config::from_toml_str("[peripheral]\n"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        Config::load("/nonexistent/description.toml"),
        Err(ConfigError::Io { .. })
    ));

    let overlap = MINIMAL.replace("bit = 4, width = 4", "bit = 0, width = 4");
    let result = Config::from_toml_str(&overlap).unwrap().build();
    assert!(matches!(
        result,
        Err(ConfigError::Layout(LayoutError::Overlap { .. }))
    ));

    let bad_region = MINIMAL.replace("base = \"0x5000_0000\"", "region_size = \"0x300\"");
    let result = Config::from_toml_str(&bad_region).unwrap().build();
    assert!(matches!(
        result,
        Err(ConfigError::Layout(LayoutError::RegionSize { size: 0x300 }))
    ));

    let bad_key = MINIMAL.replace("[\"0xADE8\"]", "[\"0xNOPE\"]");
    let result = Config::from_toml_str(&bad_key).unwrap().build();
    assert!(matches!(result, Err(ConfigError::InvalidHex(_))));

    let wide_key = MINIMAL.replace("[\"0xADE8\"]", "[\"0x1_ADE8\"]");
    let result = Config::from_toml_str(&wide_key).unwrap().build();
    assert!(matches!(
        result,
        Err(ConfigError::KeyTooWide { width: 16, .. })
    ));

    let bad_target = MINIMAL.replace("key_field = \"Key\"", "key_field = \"Missing\"");
    let result = Config::from_toml_str(&bad_target).unwrap().build();
    assert!(matches!(result, Err(ConfigError::UnknownLockTarget { .. })));

    let bad_guard = MINIMAL.replace("guards = [\"Ctrl\"]", "guards = [\"Nope\"]");
    let result = Config::from_toml_str(&bad_guard).unwrap().build();
    assert!(matches!(result, Err(ConfigError::UnknownGuard { .. })));
}
