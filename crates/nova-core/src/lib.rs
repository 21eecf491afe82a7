//! Nova Core -- data model for view-controller navigation.
//!
//! This crate holds the engine-independent pieces every other Nova crate
//! builds on: generational controller handles, per-controller display
//! configuration, the lifecycle state machine, anchored layout, and the error
//! taxonomy shared by the runtime.
//!
//! # Quick Start
//!
//! ```
//! use nova_core::prelude::*;
//!
//! let mut allocator = ControllerAllocator::new();
//! let id = allocator.allocate();
//!
//! let mut lifecycle = Lifecycle::new();
//! lifecycle.transition(LifecycleState::WillLoad).unwrap();
//! assert_eq!(lifecycle.state(), LifecycleState::WillLoad);
//!
//! assert!(allocator.deallocate(id));
//! assert!(!allocator.is_alive(id));
//! ```

#![deny(unsafe_code)]

pub mod configuration;
pub mod controller;
pub mod layout;
pub mod lifecycle;

use controller::ControllerId;
use lifecycle::LifecycleState;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by navigation operations.
///
/// None of these are fatal to the process. Public operations that return
/// `Option` report the error through [`NovaError::report`] and hand back
/// `None`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NovaError {
    /// The requested controller type has no template in the prefab pool.
    #[error("'{type_name}' couldn't be found in the controller pool")]
    MissingTemplate { type_name: String },

    /// A required reference was not assigned on a controller.
    #[error("'{controller}' doesn't have '{field}' assigned")]
    Misconfigured { controller: String, field: String },

    /// A push/pop/fade was requested while one is already in flight.
    #[error("{operation} dropped: a transition is already in progress")]
    Reentrant { operation: &'static str },

    /// The handle names a controller that has been destroyed.
    #[error("controller {controller} does not exist (stale or destroyed)")]
    StaleController { controller: ControllerId },

    /// Push/pop was addressed to a controller without a navigation stack.
    #[error("controller {controller} has no navigation stack")]
    NotANavigationController { controller: ControllerId },

    /// Dismiss was addressed to a controller that is not a top-level
    /// presentation.
    #[error("controller {controller} was not presented by the window")]
    NotPresented { controller: ControllerId },

    /// A lifecycle edge that the state machine does not allow.
    #[error("invalid lifecycle transition {from} -> {to}")]
    InvalidLifecycleTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    /// Configuration failed to parse or validate.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NovaError {
    /// Emit the diagnostic for this error at the level its kind calls for.
    ///
    /// Re-entrant requests are dropped silently (trace only).
    pub fn report(&self) {
        match self {
            NovaError::Reentrant { .. } => tracing::trace!("{self}"),
            NovaError::MissingTemplate { .. } | NovaError::Misconfigured { .. } => {
                tracing::error!("{self}")
            }
            _ => tracing::warn!("{self}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::configuration::{
        clamp_presentation_duration, TransitionType, ViewControllerConfiguration,
        DEFAULT_PRESENTATION_DURATION, MAX_PRESENTATION_DURATION, MIN_PRESENTATION_DURATION,
    };
    pub use crate::controller::{ControllerAllocator, ControllerId};
    pub use crate::layout::RectLayout;
    pub use crate::lifecycle::{Lifecycle, LifecycleState};
    pub use crate::NovaError;
}
