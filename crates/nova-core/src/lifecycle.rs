//! The controller lifecycle state machine.
//!
//! ```text
//! Created -> WillLoad -> DidLoad -> Enabled <-> Disabled
//!    |          |           |                      |
//!    +----------+-----------+----------------------+--> WillUnload -> Destroyed
//! ```
//!
//! - `WillLoad` is entered once, right after instantiation and injection.
//! - `DidLoad` is entered once, on the first frame the controller is active.
//!   It is transient: the controller immediately settles into `Enabled` or
//!   `Disabled`.
//! - `Enabled`/`Disabled` follow the controller's active flag and may cycle
//!   any number of times.
//! - `WillUnload` is entered once, right before teardown. An enabled
//!   controller is disabled first.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::NovaError;

/// A point in a controller's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Created,
    WillLoad,
    DidLoad,
    Enabled,
    Disabled,
    WillUnload,
    Destroyed,
}

impl LifecycleState {
    /// Whether `self -> next` is a legal edge.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Created, WillLoad)
                | (WillLoad, DidLoad)
                | (DidLoad, Enabled)
                | (DidLoad, Disabled)
                | (Enabled, Disabled)
                | (Disabled, Enabled)
                | (Created, WillUnload)
                | (WillLoad, WillUnload)
                | (DidLoad, WillUnload)
                | (Disabled, WillUnload)
                | (WillUnload, Destroyed)
        )
    }

    /// `DidLoad` has run.
    pub fn has_loaded(self) -> bool {
        matches!(
            self,
            LifecycleState::DidLoad | LifecycleState::Enabled | LifecycleState::Disabled
        )
    }

    /// Teardown has started.
    pub fn is_unloading(self) -> bool {
        matches!(self, LifecycleState::WillUnload | LifecycleState::Destroyed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::WillLoad => "will_load",
            LifecycleState::DidLoad => "did_load",
            LifecycleState::Enabled => "enabled",
            LifecycleState::Disabled => "disabled",
            LifecycleState::WillUnload => "will_unload",
            LifecycleState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Tracks one controller's position in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    /// A freshly instantiated controller.
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Created,
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Move to `next`, returning the state that was left.
    ///
    /// Illegal edges leave the machine untouched and return
    /// [`NovaError::InvalidLifecycleTransition`].
    pub fn transition(&mut self, next: LifecycleState) -> Result<LifecycleState, NovaError> {
        if !self.state.can_transition_to(next) {
            return Err(NovaError::InvalidLifecycleTransition {
                from: self.state,
                to: next,
            });
        }
        let previous = self.state;
        self.state = next;
        Ok(previous)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
