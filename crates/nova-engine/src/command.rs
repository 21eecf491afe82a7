//! Deferred navigation requests queued by controller hooks.
//!
//! Hooks run while the window is in the middle of an operation, so they
//! cannot mutate it directly. Instead they push [`ControllerCommand`]s onto
//! the window's [`CommandQueue`], which is drained in strict insertion order
//! (FIFO) after the public operation that triggered the hook returns.

use std::any::TypeId;
use std::collections::VecDeque;
use std::rc::Rc;

use nova_core::controller::ControllerId;

use crate::controller::{controller_type, AsAny, ViewController};
use crate::template::ControllerTemplate;
use crate::window::Completion;

/// Type-erased prepare callback.
pub(crate) type ErasedPrepare = Box<dyn FnOnce(&mut dyn ViewController)>;

/// Which template to instantiate, plus the caller's prepare callback.
pub(crate) enum TemplateRequest {
    /// Resolve by type from the prefab pool.
    Typed {
        type_id: TypeId,
        type_name: &'static str,
        prepare: Option<ErasedPrepare>,
    },
    /// A template the caller already holds.
    Direct {
        template: Rc<ControllerTemplate>,
        prepare: Option<ErasedPrepare>,
    },
}

impl TemplateRequest {
    pub(crate) fn typed<T, P>(prepare: P) -> Self
    where
        T: ViewController,
        P: FnOnce(&mut T) + 'static,
    {
        let (type_id, type_name) = controller_type::<T>();
        Self::Typed {
            type_id,
            type_name,
            prepare: Some(erase_prepare::<T, P>(prepare)),
        }
    }

    pub(crate) fn direct(template: Rc<ControllerTemplate>) -> Self {
        Self::Direct {
            template,
            prepare: None,
        }
    }
}

/// Wrap a typed prepare callback so it can be stored next to other types'.
///
/// The downcast cannot fail for templates resolved by `TypeId`.
pub(crate) fn erase_prepare<T, P>(prepare: P) -> ErasedPrepare
where
    T: ViewController,
    P: FnOnce(&mut T) + 'static,
{
    Box::new(move |controller: &mut dyn ViewController| {
        if let Some(typed) = AsAny::as_any_mut(controller).downcast_mut::<T>() {
            prepare(typed);
        }
    })
}

/// A deferred window operation.
pub(crate) enum ControllerCommand {
    Push {
        navigation: ControllerId,
        request: TemplateRequest,
        animated: bool,
        on_complete: Option<Completion>,
    },
    Pop {
        navigation: ControllerId,
        animated: bool,
        on_complete: Option<Completion>,
    },
    Present {
        request: TemplateRequest,
        animated: bool,
        on_complete: Option<Completion>,
    },
    Dismiss {
        controller: ControllerId,
        animated: bool,
        on_complete: Option<Completion>,
    },
    FadeTo {
        controller: ControllerId,
        opacity: f32,
        duration: f32,
        on_complete: Option<Completion>,
    },
    SetActive {
        controller: ControllerId,
        active: bool,
    },
}

impl ControllerCommand {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            ControllerCommand::Push { .. } => "push",
            ControllerCommand::Pop { .. } => "pop",
            ControllerCommand::Present { .. } => "present",
            ControllerCommand::Dismiss { .. } => "dismiss",
            ControllerCommand::FadeTo { .. } => "fade_to",
            ControllerCommand::SetActive { .. } => "set_active",
        }
    }
}

/// FIFO queue of [`ControllerCommand`]s.
#[derive(Default)]
pub(crate) struct CommandQueue {
    commands: VecDeque<ControllerCommand>,
}

impl CommandQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, command: ControllerCommand) {
        self.commands.push_back(command);
    }

    pub(crate) fn pop_front(&mut self) -> Option<ControllerCommand> {
        self.commands.pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = ControllerCommand> + '_ {
        self.commands.drain(..)
    }
}
