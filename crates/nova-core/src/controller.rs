//! Weak references between controllers.
//!
//! Controllers never hold each other directly. A pushed controller remembers
//! its navigation controller, a hook asks for "my stack", and callers keep the
//! id returned by `present` or `push`. All of those are [`ControllerId`]s:
//! a slot in the window's arena plus the generation that slot had when the
//! controller was created.
//!
//! Destroying a controller retires its generation. Any id still naming it
//! then fails [`ControllerAllocator::is_alive`], and the window answers
//! requests made through it with a `StaleController` warning instead of
//! acting on whichever controller reuses the slot later.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Handle to a controller owned by a window.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControllerId {
    slot: u32,
    generation: u32,
}

impl ControllerId {
    pub fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub fn slot(self) -> u32 {
        self.slot
    }

    /// How many controllers held this slot before this one.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControllerId({self})")
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u32,
    occupied: bool,
}

/// Hands out [`ControllerId`]s and decides which of them are still valid.
///
/// Retired slots are reused oldest first.
#[derive(Debug, Default)]
pub struct ControllerAllocator {
    slots: Vec<Slot>,
    retired: VecDeque<u32>,
}

impl ControllerAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an id for a controller about to be instantiated.
    pub fn allocate(&mut self) -> ControllerId {
        match self.retired.pop_front() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.occupied = true;
                ControllerId::new(slot, entry.generation)
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    occupied: true,
                });
                ControllerId::new(slot, 0)
            }
        }
    }

    /// Retire `id` once its controller is destroyed. Returns `false` when the
    /// id was already stale.
    pub fn deallocate(&mut self, id: ControllerId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let entry = &mut self.slots[id.slot as usize];
        entry.occupied = false;
        entry.generation = entry.generation.wrapping_add(1);
        self.retired.push_back(id.slot);
        true
    }

    pub fn is_alive(&self, id: ControllerId) -> bool {
        self.slots
            .get(id.slot as usize)
            .is_some_and(|entry| entry.occupied && entry.generation == id.generation)
    }

    pub fn alive_count(&self) -> usize {
        self.slots.iter().filter(|entry| entry.occupied).count()
    }
}
