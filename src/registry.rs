//! Panel registry
//!
//! Fixed-capacity table of attached panels keyed by panel id. The COG G1
//! boards carry a single panel, so the default capacity is one slot and a
//! second registration fails with [`Error::AlreadyRegistered`].
//!
//! The registry lock is only held while a slot is read or written, never while
//! a panel refreshes.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use log::info;

use crate::error::Error;
use crate::panel::EpdDevice;

/// Table of registered panels
pub struct Registry<'a, M: RawMutex, const N: usize = 1> {
    slots: Mutex<M, Cell<[Option<&'a dyn EpdDevice>; N]>>,
}

impl<'a, M: RawMutex, const N: usize> Registry<'a, M, N> {
    /// Empty registry
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(Cell::new([None; N])),
        }
    }

    /// Register `device` under its id
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyRegistered` if the id is taken or every slot is
    /// in use.
    pub fn register(&self, device: &'a dyn EpdDevice) -> Result<(), Error> {
        let id = device.id();
        self.slots.lock(|cell| {
            let mut slots = cell.get();
            if slots.iter().flatten().any(|entry| entry.id() == id) {
                return Err(Error::AlreadyRegistered);
            }
            let free = slots
                .iter_mut()
                .find(|slot| slot.is_none())
                .ok_or(Error::AlreadyRegistered)?;
            *free = Some(device);
            cell.set(slots);
            Ok(())
        })?;
        info!("registered panel {}", id);
        Ok(())
    }

    /// Remove `device`
    ///
    /// Does nothing if this exact device is not registered.
    pub fn unregister(&self, device: &dyn EpdDevice) {
        let removed = self.slots.lock(|cell| {
            let mut slots = cell.get();
            let slot = slots.iter_mut().find(|slot| {
                matches!(slot, Some(entry) if core::ptr::addr_eq(*entry, device))
            });
            let Some(slot) = slot else {
                return false;
            };
            *slot = None;
            cell.set(slots);
            true
        });
        if removed {
            info!("unregistered panel {}", device.id());
        }
    }

    /// Find the panel registered under `id`
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSuchDevice` if no panel has that id.
    pub fn lookup(&self, id: u32) -> Result<&'a dyn EpdDevice, Error> {
        self.slots.lock(|cell| {
            cell.get()
                .into_iter()
                .flatten()
                .find(|entry| entry.id() == id)
                .ok_or(Error::NoSuchDevice)
        })
    }

    /// Number of registered panels
    pub fn len(&self) -> usize {
        self.slots
            .lock(|cell| cell.get().iter().filter(|slot| slot.is_some()).count())
    }

    /// `true` if no panel is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<M: RawMutex, const N: usize> Default for Registry<'_, M, N> {
    fn default() -> Self {
        Self::new()
    }
}
