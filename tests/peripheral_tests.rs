//! Integration tests for the bus-facing peripheral adapter.

mod common;

use common::{CAL, CFG, CTRL, STATUS};
use log::Level;
use mmio_regs::soc::Device;
use std::cell::RefCell;
use std::rc::Rc;

/// Tests that a gated write while disabled is applied and warned about once.
#[test]
fn test_gated_write_while_disabled() {
    let mut f = common::fixture();
    f.clock.set(false);
    assert!(!f.peripheral.is_enabled());

    common::capture_logs();
    f.peripheral.write_word(CAL, 0x142);
    let events = common::take_events();
    assert_eq!(common::count(&events, Level::Warn), 1);
    assert_eq!(common::count(&events, Level::Error), 0);
    assert!(events
        .iter()
        .any(|(_, msg)| msg.contains("WSYNC") && msg.contains("Captune")));

    assert_eq!(f.peripheral.read_word(CAL), 0x142);
    assert_eq!(f.peripheral.stats().sync_violations, 1);
}

/// Tests that gated writes while enabled are silent.
#[test]
fn test_gated_write_while_enabled() {
    let mut f = common::fixture();
    common::capture_logs();
    f.peripheral.write_word(CAL, 0x42);
    assert_eq!(common::count(&common::take_events(), Level::Warn), 0);
    assert_eq!(f.peripheral.stats().sync_violations, 0);
}

/// Tests that unknown offsets read as zero and drop writes.
#[test]
fn test_unknown_offset() {
    let mut f = common::fixture();
    common::capture_logs();
    assert_eq!(f.peripheral.read_word(0x30), 0);
    f.peripheral.write_word(0x30, 0xFFFF);
    assert_eq!(common::count(&common::take_events(), Level::Error), 2);
    assert_eq!(f.peripheral.stats().unknown_registers, 2);
}

/// Tests addresses outside the window and misaligned addresses.
#[test]
fn test_out_of_range_and_misaligned() {
    let mut f = common::fixture();
    assert_eq!(f.peripheral.read_word(0x4000), 0);
    assert_eq!(f.peripheral.read_u32(0x1_0000_0000), 0);
    f.peripheral.write_word(0x6, 0x1);
    assert_eq!(f.peripheral.read_word(CTRL + 2), 0);

    let stats = f.peripheral.stats();
    assert_eq!(stats.out_of_range, 2);
    assert_eq!(stats.misaligned, 2);
    assert_eq!(stats.errors(), 4);
    assert_eq!(f.peripheral.read_word(CTRL), 0x2);
}

/// Tests that only 32-bit accesses are served.
#[test]
fn test_unsupported_widths() {
    let mut f = common::fixture();
    common::capture_logs();
    assert_eq!(f.peripheral.read_u8(CTRL as u64), 0);
    assert_eq!(f.peripheral.read_u16(CTRL as u64), 0);
    assert_eq!(f.peripheral.read_u64(CTRL as u64), 0);
    f.peripheral.write_u8(CTRL as u64, 0x1);
    f.peripheral.write_u64(CTRL as u64, 0x1);

    assert_eq!(common::count(&common::take_events(), Level::Error), 5);
    assert_eq!(f.peripheral.stats().unsupported_widths, 5);
    assert_eq!(f.peripheral.read_u32(CTRL as u64), 0x2);
}

/// Tests 32-bit accesses through the device interface.
#[test]
fn test_device_interface() {
    let mut f = common::fixture();
    assert_eq!(Device::name(&f.peripheral), "TESTXO");
    assert_eq!(f.peripheral.address_range(), (0x4002_0000, 0x4000));

    f.peripheral.write_u32(0x1000 + CTRL as u64, 0x1);
    assert_eq!(f.peripheral.read_u32(CTRL as u64), 0x3);

    Device::reset(&mut f.peripheral);
    assert_eq!(f.peripheral.read_u32(CTRL as u64), 0x2);
    assert_eq!(f.peripheral.stats().resets, 1);
}

/// Tests that reset is idempotent and restores every register.
#[test]
fn test_reset_idempotent() {
    let mut f = common::fixture();
    let pristine = f.peripheral.snapshot();

    f.peripheral.write_word(CTRL, 0x1);
    f.peripheral.write_word(CFG, 0x0);
    f.peripheral.write_word(CAL, 0x3FF);
    f.ready.set(true);
    f.peripheral.read_word(STATUS);
    f.lock.lock();
    assert_ne!(f.peripheral.snapshot(), pristine);

    // Rdy is provided from outside the register map.
    f.ready.set(false);
    f.peripheral.reset();
    let once = f.peripheral.snapshot();
    f.peripheral.reset();
    assert_eq!(f.peripheral.snapshot(), once);
    assert_eq!(once, pristine);
    assert!(!f.lock.is_locked());
    assert_eq!(f.peripheral.stats().resets, 2);
}

/// Tests that reset hooks run in registration order after registers reset.
#[test]
fn test_reset_hook_order() {
    let mut f = common::fixture();
    let order = Rc::new(RefCell::new(Vec::new()));
    for tag in ["first", "second"] {
        let order = Rc::clone(&order);
        f.peripheral.on_reset(move || order.borrow_mut().push(tag));
    }

    f.peripheral.reset();
    assert_eq!(*order.borrow(), vec!["first", "second"]);
}

/// Tests access counters and their serialized form.
#[test]
fn test_stats_counters() {
    let mut f = common::fixture();
    f.peripheral.read_word(CTRL);
    f.peripheral.read_word(0x1000 + CTRL);
    f.peripheral.write_word(0x2000 + CTRL, 0x2);

    let stats = f.peripheral.stats();
    assert_eq!(stats.reads, 2);
    assert_eq!(stats.writes, 1);
    assert_eq!(stats.clear_writes, 1);
    assert_eq!(stats.unsupported_alias_reads, 1);

    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["reads"], 2);
    assert_eq!(json["clear_writes"], 1);
}
