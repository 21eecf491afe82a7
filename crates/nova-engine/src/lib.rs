//! Nova Engine -- view-controller navigation runtime.
//!
//! This crate builds on [`nova_core`] to provide the runtime: a [`Window`]
//! that instantiates controllers from a prefab pool, presents them, pushes and
//! pops them on navigation stacks, fades them in and out frame by frame, and
//! drives each one through its lifecycle hooks.
//!
//! # Quick Start
//!
//! ```
//! use nova_engine::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Inbox;
//! impl ViewController for Inbox {}
//!
//! #[derive(Debug, Clone, Default)]
//! struct Message {
//!     subject: String,
//! }
//! impl ViewController for Message {}
//!
//! #[derive(Debug, Clone, Default)]
//! struct Mail;
//! impl ViewController for Mail {}
//!
//! let inbox = ControllerTemplate::new("Inbox", Inbox)
//!     .with_configuration(ViewControllerConfiguration::titled("Inbox"))
//!     .shared();
//! let mut pool = ControllerPrefabPool::new();
//! pool.register_shared(inbox.clone())
//!     .register(ControllerTemplate::new("Message", Message::default()))
//!     .register(ControllerTemplate::new("Mail", Mail).with_navigation(NavigationSettings::with_bar(inbox)));
//!
//! let window = Window::new("main", WindowConfig::default(), pool);
//! let mut frames = FrameLoop::new(window, FrameConfig::default()).unwrap();
//!
//! let mail = frames.window_mut().present::<Mail>(true).unwrap();
//! frames.run_until_idle(600);
//! assert_eq!(frames.window().navigation_stack(mail).unwrap().depth(), 1);
//!
//! let message = frames
//!     .window_mut()
//!     .push_with::<Message, _>(mail, true, |m| m.subject = "Hello".into(), None)
//!     .unwrap();
//! frames.run_until_idle(600);
//! assert_eq!(frames.window().controller::<Message>(message).unwrap().subject, "Hello");
//!
//! frames.window_mut().pop(mail, true);
//! frames.run_until_idle(600);
//! assert!(!frames.window().is_alive(message));
//! ```

#![deny(unsafe_code)]

mod command;
pub mod controller;
pub mod frame;
pub mod navigation;
pub mod snapshot;
pub mod template;
pub mod transition;
pub mod window;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the core crate for convenience.
pub use nova_core;

/// Re-export the journal crate for convenience.
pub use nova_journal;

pub use window::Window;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use nova_core::prelude::*;
    pub use nova_journal::journal::{NavigationEvent, NavigationEventKind, NavigationJournal};

    pub use crate::controller::{ControllerContext, ViewController};
    pub use crate::frame::{FrameConfig, FrameLoop, FrameReport};
    pub use crate::navigation::{NavigationBar, NavigationSettings, NavigationStack, PopFloor};
    pub use crate::snapshot::{ControllerSnapshot, StackSnapshot, WindowSnapshot};
    pub use crate::template::{ControllerPrefabPool, ControllerTemplate};
    pub use crate::transition::{FadeStep, Fader};
    pub use crate::window::{Completion, Launchable, Window, WindowConfig};
}
