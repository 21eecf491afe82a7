//! The [`ViewController`] trait and the context its hooks run in.
//!
//! A view controller is user code: a struct implementing [`ViewController`]
//! whose hook methods the [`Window`](crate::window::Window) calls as the
//! controller moves through its lifecycle. Every hook is a no-op by default.
//!
//! Hooks never get `&mut Window`. They receive a [`ControllerContext`] that
//! exposes the controller's identity and configuration and lets it *queue*
//! navigation requests (push, pop, present, dismiss, fade). The window applies
//! queued requests in FIFO order once the operation that ran the hook has
//! finished, so a hook can never observe a half-built stack.
//!
//! Navigation controllers get their built-in behavior (binding the back
//! action on load, pushing the initial controller on first activation) before
//! the user hook runs, so user code always sees the stack already set up.

use std::any::{Any, TypeId};
use std::rc::Rc;

use nova_core::configuration::ViewControllerConfiguration;
use nova_core::controller::ControllerId;

use crate::command::{CommandQueue, ControllerCommand, TemplateRequest};
use crate::template::ControllerTemplate;
use crate::window::Completion;

// ---------------------------------------------------------------------------
// AsAny
// ---------------------------------------------------------------------------

/// Upcast to [`Any`] so the window can hand out typed references.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// ViewController
// ---------------------------------------------------------------------------

/// A displayable unit with a lifecycle.
///
/// Implementors are instantiated by cloning the prototype registered in a
/// [`ControllerTemplate`]. Data is passed in through the `prepare` callback of
/// push/present, which runs after [`view_will_load`](Self::view_will_load)
/// and before the controller becomes visible.
pub trait ViewController: AsAny {
    /// Runs once, right after instantiation and injection.
    ///
    /// Validate required fields and do one-time setup here. Do not start
    /// further navigation from this hook; use
    /// [`view_did_load`](Self::view_did_load) for that.
    fn view_will_load(&mut self, _cx: &mut ControllerContext<'_>) {}

    /// Runs once, on the first frame the controller is active in hierarchy.
    fn view_did_load(&mut self, _cx: &mut ControllerContext<'_>) {}

    /// Runs every time the controller becomes active after loading.
    fn view_is_enabled(&mut self, _cx: &mut ControllerContext<'_>) {}

    /// Runs every time the controller becomes inactive after loading, and
    /// once more before unloading if it was enabled.
    fn view_is_disabled(&mut self, _cx: &mut ControllerContext<'_>) {}

    /// Runs when the controller is popped or dismissed, before its hide
    /// transition starts.
    fn view_will_disappear(&mut self, _cx: &mut ControllerContext<'_>) {}

    /// Runs once, right before the controller is destroyed.
    fn view_will_unload(&mut self, _cx: &mut ControllerContext<'_>) {}
}

/// The hook points, for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    WillLoad,
    DidLoad,
    Enabled,
    Disabled,
    WillDisappear,
    WillUnload,
}

impl Hook {
    pub(crate) fn invoke(self, controller: &mut dyn ViewController, cx: &mut ControllerContext<'_>) {
        match self {
            Hook::WillLoad => controller.view_will_load(cx),
            Hook::DidLoad => controller.view_did_load(cx),
            Hook::Enabled => controller.view_is_enabled(cx),
            Hook::Disabled => controller.view_is_disabled(cx),
            Hook::WillDisappear => controller.view_will_disappear(cx),
            Hook::WillUnload => controller.view_will_unload(cx),
        }
    }
}

// ---------------------------------------------------------------------------
// ControllerContext
// ---------------------------------------------------------------------------

/// What a hook can see and do.
pub struct ControllerContext<'a> {
    id: ControllerId,
    navigation_controller: Option<ControllerId>,
    configuration: &'a ViewControllerConfiguration,
    commands: &'a mut CommandQueue,
}

impl<'a> ControllerContext<'a> {
    pub(crate) fn new(
        id: ControllerId,
        navigation_controller: Option<ControllerId>,
        configuration: &'a ViewControllerConfiguration,
        commands: &'a mut CommandQueue,
    ) -> Self {
        Self {
            id,
            navigation_controller,
            configuration,
            commands,
        }
    }

    /// This controller's handle.
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// The navigation controller this controller was pushed onto, if any.
    pub fn navigation_controller(&self) -> Option<ControllerId> {
        self.navigation_controller
    }

    pub fn configuration(&self) -> &ViewControllerConfiguration {
        self.configuration
    }

    /// Queue a push of `T` onto `navigation`.
    pub fn push<T: ViewController>(&mut self, navigation: ControllerId, animated: bool) {
        self.push_with::<T, _>(navigation, animated, |_| {}, None);
    }

    /// Queue a push of `T` onto `navigation` with a prepare callback.
    pub fn push_with<T, P>(
        &mut self,
        navigation: ControllerId,
        animated: bool,
        prepare: P,
        on_complete: Option<Completion>,
    ) where
        T: ViewController,
        P: FnOnce(&mut T) + 'static,
    {
        self.commands.push(ControllerCommand::Push {
            navigation,
            request: TemplateRequest::typed::<T, P>(prepare),
            animated,
            on_complete,
        });
    }

    /// Queue a push of a specific template onto `navigation`.
    pub fn push_template(
        &mut self,
        navigation: ControllerId,
        template: Rc<ControllerTemplate>,
        animated: bool,
    ) {
        self.commands.push(ControllerCommand::Push {
            navigation,
            request: TemplateRequest::direct(template),
            animated,
            on_complete: None,
        });
    }

    /// Queue a pop of `navigation`.
    pub fn pop(&mut self, navigation: ControllerId, animated: bool, on_complete: Option<Completion>) {
        self.commands.push(ControllerCommand::Pop {
            navigation,
            animated,
            on_complete,
        });
    }

    /// Queue a pop of the stack this controller lives on. Does nothing for a
    /// top-level controller.
    pub fn pop_self(&mut self, animated: bool) {
        if let Some(navigation) = self.navigation_controller {
            self.pop(navigation, animated, None);
        }
    }

    /// Queue a top-level presentation of `T`.
    pub fn present<T: ViewController>(&mut self, animated: bool) {
        self.present_with::<T, _>(animated, |_| {}, None);
    }

    /// Queue a top-level presentation of `T` with a prepare callback.
    pub fn present_with<T, P>(&mut self, animated: bool, prepare: P, on_complete: Option<Completion>)
    where
        T: ViewController,
        P: FnOnce(&mut T) + 'static,
    {
        self.commands.push(ControllerCommand::Present {
            request: TemplateRequest::typed::<T, P>(prepare),
            animated,
            on_complete,
        });
    }

    /// Queue dismissal of this controller.
    pub fn dismiss_self(&mut self, animated: bool) {
        self.commands.push(ControllerCommand::Dismiss {
            controller: self.id,
            animated,
            on_complete: None,
        });
    }

    /// Queue a fade of this controller.
    pub fn fade_to(&mut self, opacity: f32, duration: f32, on_complete: Option<Completion>) {
        self.commands.push(ControllerCommand::FadeTo {
            controller: self.id,
            opacity,
            duration,
            on_complete,
        });
    }

    /// Queue an active-flag change for any controller.
    pub fn set_active(&mut self, controller: ControllerId, active: bool) {
        self.commands
            .push(ControllerCommand::SetActive { controller, active });
    }
}

/// `TypeId` of a controller type, for template lookup.
pub(crate) fn controller_type<T: ViewController>() -> (TypeId, &'static str) {
    (TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Last path segment of a type name (`app::screens::Settings` -> `Settings`).
pub(crate) fn short_type_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}
