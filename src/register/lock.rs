//! Lock-Key Domains.
//!
//! Many peripherals protect their configuration registers with a key
//! register: writing the magic key unlocks the domain, writing anything else
//! locks it. A companion read-only status field reports the current state.
//!
//! `LockDomain` is that two-state machine. It is a cheap handle around shared
//! state so the key field's write callback, the status field's value provider,
//! lock guards on protected registers and the peripheral reset hook can all
//! observe the same domain.

use crate::field_enum;
use crate::register::enumerated::{EnumValue, FieldEnum};
use crate::register::field::Field;
use log::debug;
use std::cell::Cell;
use std::rc::Rc;

field_enum! {
    /// State of a lock domain, encoded as reported by lock status fields.
    pub enum LockState {
        Unlocked = 0,
        Locked = 1,
    }
}

struct LockInner {
    name: String,
    keys: Vec<u32>,
    reset_state: LockState,
    state: Cell<LockState>,
}

/// Shared handle to a lock domain.
#[derive(Clone)]
pub struct LockDomain {
    inner: Rc<LockInner>,
}

impl LockDomain {
    /// Creates a domain that unlocks on an exact match of any of `keys`.
    ///
    /// # Arguments
    ///
    /// * `name` - Name used in log events.
    /// * `keys` - Unlock keys, compared against the raw key field slice.
    /// * `reset_state` - State restored by [`LockDomain::reset`].
    pub fn new(name: &str, keys: &[u32], reset_state: LockState) -> Self {
        Self {
            inner: Rc::new(LockInner {
                name: name.to_string(),
                keys: keys.to_vec(),
                reset_state,
                state: Cell::new(reset_state),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn keys(&self) -> &[u32] {
        &self.inner.keys
    }

    pub fn state(&self) -> LockState {
        self.inner.state.get()
    }

    pub fn is_locked(&self) -> bool {
        self.state() == LockState::Locked
    }

    /// Feeds a key write into the domain.
    ///
    /// An exact match of any key unlocks; every other value, including
    /// partial keys, locks.
    ///
    /// # Returns
    ///
    /// The state after the write.
    pub fn write_key(&self, value: u32) -> LockState {
        let next = if self.inner.keys.contains(&value) {
            LockState::Unlocked
        } else {
            LockState::Locked
        };
        debug!("{}: key {:#x} -> {:?}", self.inner.name, value, next);
        self.inner.state.set(next);
        next
    }

    /// Locks the domain regardless of its current state.
    pub fn lock(&self) {
        self.inner.state.set(LockState::Locked);
    }

    /// Restores the declared reset state.
    pub fn reset(&self) {
        self.inner.state.set(self.inner.reset_state);
    }

    /// Wires `field` as the key field of this domain.
    ///
    /// Every write of the field slice is fed to [`LockDomain::write_key`].
    /// The field is expected to be write-only; its access mode is left as is.
    pub fn attach_key(&self, field: Field) -> Field {
        let domain = self.clone();
        field.on_write(move |_, written| {
            domain.write_key(written);
        })
    }

    /// Wires `field` as a status field of this domain.
    ///
    /// The field reads `0` while unlocked and `1` while locked.
    pub fn attach_status(&self, field: Field) -> Field {
        let domain = self.clone();
        field.provider(move |_| domain.state().bits())
    }

    /// Builds a write-only key field of `width` bits at `offset`.
    pub fn key_field(&self, offset: u8, width: u8, name: &str) -> Field {
        self.attach_key(Field::value(offset, width, name).write_only())
    }

    /// Builds a read-only single-bit status field at `offset`.
    pub fn status_field(&self, offset: u8, name: &str) -> Field {
        let domain = self.clone();
        Field::enumerated::<LockState>(offset, 1, name)
            .read_only()
            .enum_provider(move |_: EnumValue<LockState>| domain.state().into())
    }
}

impl std::fmt::Debug for LockDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockDomain")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}
