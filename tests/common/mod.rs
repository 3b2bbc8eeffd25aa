//! Shared fixtures for the integration tests.
//!
//! Provides a log capture usable from parallel tests and a small
//! oscillator-like peripheral exercising every field kind.

#![allow(dead_code)]

use log::{Level, LevelFilter, Log, Metadata, Record};
use mmio_regs::field_enum;
use mmio_regs::register::{
    Field, FieldAccess, LockDomain, LockState, Register, RegisterCollection,
};
use mmio_regs::soc::{EnableFlag, Peripheral};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Once;

pub const IPVERSION: u32 = 0x00;
pub const CTRL: u32 = 0x04;
pub const CFG: u32 = 0x08;
pub const STATUS: u32 = 0x10;
pub const CAL: u32 = 0x14;
pub const IF: u32 = 0x18;
pub const LOCK: u32 = 0x24;

pub const SET: u32 = 0x1000;
pub const CLR: u32 = 0x2000;
pub const TGL: u32 = 0x3000;

pub const LOCK_KEY: u32 = 0xADE8;
pub const CFG_RESET: u32 = 0x8000_0181;
pub const CFG_RESERVED: u32 = 0xFFFF_FE00;

field_enum! {
    pub enum Mode {
        Xtal = 0,
        XtalHp = 1,
        BufExtClk = 2,
        DigExtClk = 3,
    }
}

field_enum! {
    /// Only some encodings of the 3-bit field are defined.
    pub enum Timeout {
        Cycles2 = 0,
        Cycles256 = 1,
        Cycles1K = 2,
        Cycles4K = 4,
    }
}

thread_local! {
    static EVENTS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

/// Records events on the thread that emitted them.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        EVENTS.with(|events| {
            events
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Installs the capture logger and clears events of the current thread.
pub fn capture_logs() {
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });
    EVENTS.with(|events| events.borrow_mut().clear());
}

/// Drains the events captured on the current thread.
pub fn take_events() -> Vec<(Level, String)> {
    EVENTS.with(|events| std::mem::take(&mut *events.borrow_mut()))
}

pub fn count(events: &[(Level, String)], level: Level) -> usize {
    events.iter().filter(|(l, _)| *l == level).count()
}

/// Oscillator-like test peripheral and the handles driving it.
pub struct Fixture {
    pub peripheral: Peripheral,
    pub clock: EnableFlag,
    pub lock: LockDomain,
    pub ready: Rc<Cell<bool>>,
}

/// Builds the register map of the test peripheral.
///
/// | Offset | Register  | Layout                                             |
/// |--------|-----------|----------------------------------------------------|
/// | 0x00   | Ipversion | read-only, reset 0x2                               |
/// | 0x04   | Ctrl      | Forceen (0), Disondemand (1)                       |
/// | 0x08   | Cfg       | Mode 0-1, Highamp 2, Timeout 4-6, Drvcurr 7-8      |
/// | 0x10   | Status    | Rdy (0) from a provider, Lock (31) lock status     |
/// | 0x14   | Cal       | Captune 0-7 (WSYNC), Gain 8-9                      |
/// | 0x18   | If        | Rdy (0), Fail (1), write-one-to-clear              |
/// | 0x24   | Lock      | Lockkey 0-15, write-only                           |
pub fn registers(lock: &LockDomain, ready: &Rc<Cell<bool>>) -> RegisterCollection {
    let ready = Rc::clone(ready);
    let registers = vec![
        Register::builder(IPVERSION, "Ipversion", 0x2)
            .with_field(Field::value(0, 32, "Ipversion").read_only())
            .build(),
        Register::builder(CTRL, "Ctrl", 0x2)
            .with_flag(0, "Forceen")
            .with_flag(1, "Disondemand")
            .with_reserved_bits(2, 30)
            .build(),
        Register::builder(CFG, "Cfg", CFG_RESET)
            .with_field(Field::enumerated::<Mode>(0, 2, "Mode"))
            .with_flag(2, "Highamp")
            .with_reserved_bits(3, 1)
            .with_field(Field::enumerated::<Timeout>(4, 3, "Timeout"))
            .with_field(Field::value(7, 2, "Drvcurr"))
            .with_reserved_bits(9, 23)
            .lock_guard(lock.clone())
            .build(),
        Register::builder(STATUS, "Status", 0)
            .with_field(
                Field::flag(0, "Rdy")
                    .read_only()
                    .flag_provider(move |_| ready.get()),
            )
            .with_field(lock.status_field(31, "Lock"))
            .build(),
        Register::builder(CAL, "Cal", 0x100)
            .with_field(Field::value(0, 8, "Captune").wsync())
            .with_field(Field::value(8, 2, "Gain"))
            .build(),
        Register::builder(IF, "If", 0)
            .with_field(Field::flag(0, "Rdy").access(FieldAccess::WriteOneToClear))
            .with_field(Field::flag(1, "Fail").access(FieldAccess::WriteOneToClear))
            .build(),
        Register::builder(LOCK, "Lock", 0)
            .with_field(lock.key_field(0, 16, "Lockkey"))
            .build(),
    ];

    let mut collection = RegisterCollection::new();
    for register in registers {
        match register {
            Ok(register) => collection.insert(register).expect("unique offsets"),
            Err(e) => panic!("invalid test layout: {}", e),
        }
    }
    collection
}

/// Builds the test peripheral: enabled, unlocked, not ready.
pub fn fixture() -> Fixture {
    let lock = LockDomain::new("Lock", &[LOCK_KEY], LockState::Unlocked);
    let ready = Rc::new(Cell::new(false));
    let clock = EnableFlag::new(true);

    let mut peripheral = Peripheral::new(
        "TESTXO",
        0x4002_0000,
        registers(&lock, &ready),
        Rc::new(clock.clone()),
    );
    let reset_lock = lock.clone();
    peripheral.on_reset(move || reset_lock.reset());

    Fixture {
        peripheral,
        clock,
        lock,
        ready,
    }
}
