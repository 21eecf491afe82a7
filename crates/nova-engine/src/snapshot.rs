//! Serializable view of a window's controller tree with BLAKE3 hashing.
//!
//! [`WindowSnapshot`] captures every live controller: the presented tree
//! (top-level controllers and, recursively, their navigation stacks) plus any
//! controller that is alive but not reachable from it, such as one popped and
//! still fading out. A BLAKE3 hex digest over the serialized tree lets tests
//! and tools compare two runs for identical navigation state.
//!
//! ```
//! use nova_engine::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Home;
//! impl ViewController for Home {}
//!
//! let mut pool = ControllerPrefabPool::new();
//! pool.register(ControllerTemplate::new("Home", Home));
//! let mut window = Window::new("main", WindowConfig::default(), pool);
//! window.present::<Home>(false);
//!
//! let snapshot = window.capture_snapshot();
//! assert_eq!(snapshot.controllers.len(), 1);
//! assert_eq!(snapshot.hash.len(), 64);
//! assert!(snapshot.verify().is_ok());
//! assert_eq!(snapshot.hash, window.state_hash());
//! ```
//!
//! Controller behaviors (user state) and pending callbacks are not captured.

use std::collections::BTreeSet;

use nova_core::configuration::ViewControllerConfiguration;
use nova_core::controller::ControllerId;
use nova_core::lifecycle::LifecycleState;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::navigation::{NavigationBar, PopFloor};
use crate::window::Window;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// One controller and, for navigation controllers, its stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub id: ControllerId,
    pub name: String,
    pub type_name: String,
    pub lifecycle: LifecycleState,
    pub active: bool,
    pub opacity: f32,
    pub is_fading: bool,
    pub configuration: ViewControllerConfiguration,
    pub navigation: Option<StackSnapshot>,
}

/// A navigation stack, bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSnapshot {
    pub depth: usize,
    pub is_transitioning: bool,
    pub pop_floor: PopFloor,
    pub navigation_bar: Option<NavigationBar>,
    pub controllers: Vec<ControllerSnapshot>,
}

/// Everything alive in a window at one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub name: String,
    pub frame: u64,
    /// Presented controllers in sibling order.
    pub controllers: Vec<ControllerSnapshot>,
    /// Alive but not reachable from `controllers`.
    pub detached: Vec<ControllerSnapshot>,
    /// BLAKE3 hex digest (64 lowercase hex chars) of the fields above.
    pub hash: String,
}

impl WindowSnapshot {
    /// Recompute the hash and compare it with the recorded one.
    pub fn verify(&self) -> anyhow::Result<()> {
        let expected = compute_hash(&self.name, self.frame, &self.controllers, &self.detached);
        if expected != self.hash {
            anyhow::bail!(
                "snapshot hash mismatch: recorded {} but recomputed {expected}",
                self.hash
            );
        }
        Ok(())
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every controller in the snapshot, depth first.
    pub fn iter(&self) -> impl Iterator<Item = &ControllerSnapshot> {
        let mut pending: Vec<&ControllerSnapshot> =
            self.controllers.iter().chain(&self.detached).rev().collect();
        std::iter::from_fn(move || {
            let next = pending.pop()?;
            if let Some(stack) = &next.navigation {
                pending.extend(stack.controllers.iter().rev());
            }
            Some(next)
        })
    }
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

fn compute_hash(
    name: &str,
    frame: u64,
    controllers: &[ControllerSnapshot],
    detached: &[ControllerSnapshot],
) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        name: &'a str,
        frame: u64,
        controllers: &'a [ControllerSnapshot],
        detached: &'a [ControllerSnapshot],
    }

    let mut hasher = blake3::Hasher::new();
    let state = HashableState {
        name,
        frame,
        controllers,
        detached,
    };
    if let Err(err) = serde_json::to_writer(&mut hasher, &state) {
        warn!(%err, "snapshot state did not serialize cleanly");
    }
    hasher.finalize().to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Window capture
// ---------------------------------------------------------------------------

impl Window {
    /// Capture the whole controller tree.
    pub fn capture_snapshot(&self) -> WindowSnapshot {
        let mut seen = BTreeSet::new();
        let controllers: Vec<ControllerSnapshot> = self
            .presented()
            .iter()
            .filter_map(|id| self.snapshot_controller(*id, &mut seen))
            .collect();
        let orphans: Vec<ControllerId> = self.controllers().filter(|id| !seen.contains(id)).collect();
        let detached: Vec<ControllerSnapshot> = orphans
            .into_iter()
            .filter_map(|id| {
                if seen.contains(&id) {
                    None
                } else {
                    self.snapshot_controller(id, &mut seen)
                }
            })
            .collect();

        let hash = compute_hash(self.name(), self.frame(), &controllers, &detached);
        WindowSnapshot {
            name: self.name().to_owned(),
            frame: self.frame(),
            controllers,
            detached,
            hash,
        }
    }

    /// The BLAKE3 digest [`capture_snapshot`](Self::capture_snapshot) would
    /// record.
    pub fn state_hash(&self) -> String {
        self.capture_snapshot().hash
    }

    fn snapshot_controller(
        &self,
        id: ControllerId,
        seen: &mut BTreeSet<ControllerId>,
    ) -> Option<ControllerSnapshot> {
        if !seen.insert(id) {
            return None;
        }
        let navigation = self.navigation_stack(id).map(|stack| StackSnapshot {
            depth: stack.depth(),
            is_transitioning: stack.is_transitioning(),
            pop_floor: stack.pop_floor(),
            navigation_bar: stack.navigation_bar().cloned(),
            controllers: stack
                .controllers()
                .iter()
                .filter_map(|child| self.snapshot_controller(*child, seen))
                .collect(),
        });
        Some(ControllerSnapshot {
            id,
            name: self.controller_name(id)?.to_owned(),
            type_name: self.type_name(id)?.to_owned(),
            lifecycle: self.lifecycle(id)?,
            active: self.is_active(id),
            opacity: self.opacity(id)?,
            is_fading: self.is_fading(id),
            configuration: self.configuration(id)?.clone(),
            navigation,
        })
    }
}
