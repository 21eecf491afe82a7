//! The window: root container that owns every live controller.
//!
//! A [`Window`] holds the prefab pool, the arena of controller instances, the
//! top-level presentation order, and the queue of commands hooks have
//! requested. All navigation goes through it:
//!
//! - **present / dismiss** put a controller directly under the window (last
//!   sibling, drawn on top) and take it away again.
//! - **push / pop** operate on a navigation controller's stack.
//! - **show / hide / fade_*** drive a controller's opacity.
//! - **advance** moves time forward one frame: pending controllers load, and
//!   running fades step.
//!
//! Every public operation finishes by draining the command queue, so work a
//! hook asked for is applied before the call returns, in the order it was
//! requested.
//!
//! Handles are weak: a [`ControllerId`] that outlives its controller just
//! stops resolving, and operations addressed to it report
//! [`NovaError::StaleController`].

use std::collections::BTreeMap;
use std::rc::Rc;

use nova_core::configuration::{
    clamp_presentation_duration, TransitionType, ViewControllerConfiguration,
    DEFAULT_PRESENTATION_DURATION,
};
use nova_core::controller::{ControllerAllocator, ControllerId};
use nova_core::layout::RectLayout;
use nova_core::lifecycle::{Lifecycle, LifecycleState};
use nova_core::NovaError;
use nova_journal::journal::{NavigationEventKind, NavigationJournal};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::command::{CommandQueue, ControllerCommand, ErasedPrepare, TemplateRequest};
use crate::controller::{short_type_name, AsAny, ControllerContext, Hook, ViewController};
use crate::frame::FrameReport;
use crate::navigation::{NavigationSettings, NavigationStack, PopFloor};
use crate::template::{ControllerPrefabPool, ControllerTemplate};
use crate::transition::{FadeRejected, FadeStep, Fader};

/// Callback run once a transition has finished.
pub type Completion = Box<dyn FnOnce(&mut Window)>;

// ---------------------------------------------------------------------------
// WindowConfig
// ---------------------------------------------------------------------------

/// Window-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Destroy every presented controller before the launcher runs.
    pub should_reset_view: bool,
    /// Show/hide duration for templates that do not set their own.
    pub default_presentation_duration: f32,
    /// Floor for stacks whose settings do not pick one.
    pub pop_floor: PopFloor,
    /// Most recent journal events to retain; `None` keeps every event.
    pub journal_capacity: Option<usize>,
}

/// Journal events retained by a default-configured window.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 4096;

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            should_reset_view: true,
            default_presentation_duration: DEFAULT_PRESENTATION_DURATION,
            pop_floor: PopFloor::KeepRoot,
            journal_capacity: Some(DEFAULT_JOURNAL_CAPACITY),
        }
    }
}

impl WindowConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, NovaError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| NovaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NovaError> {
        let duration = self.default_presentation_duration;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(NovaError::InvalidConfig(format!(
                "default_presentation_duration must be positive and finite, got {duration}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Launchable
// ---------------------------------------------------------------------------

/// Application entry point, run once by [`Window::launch`].
pub trait Launchable {
    fn lift_off(&mut self, window: &mut Window);
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// What the window does when a show/hide transition ends, besides running
/// the caller's callback.
enum AfterFade {
    Nothing,
    EndPush {
        navigation: ControllerId,
    },
    EndPop {
        navigation: ControllerId,
        popped: ControllerId,
    },
    Destroy {
        controller: ControllerId,
    },
}

struct FadeCompletion {
    on_complete: Option<Completion>,
    then: AfterFade,
}

impl FadeCompletion {
    fn new(on_complete: Option<Completion>, then: AfterFade) -> Self {
        Self { on_complete, then }
    }
}

struct ControllerNode {
    name: String,
    template_name: String,
    type_name: &'static str,
    configuration: ViewControllerConfiguration,
    lifecycle: Lifecycle,
    active: bool,
    layout: RectLayout,
    navigation_controller: Option<ControllerId>,
    presentation_duration: f32,
    fader: Fader,
    fade_completion: Option<FadeCompletion>,
    stack: Option<NavigationStack>,
    dismissing: bool,
    /// `None` only while one of its hooks is running.
    behavior: Option<Box<dyn ViewController>>,
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Root container of the controller hierarchy.
pub struct Window {
    name: String,
    config: WindowConfig,
    pool: ControllerPrefabPool,
    allocator: ControllerAllocator,
    nodes: BTreeMap<ControllerId, ControllerNode>,
    /// Top-level controllers in sibling order; the last one is on top.
    presented: Vec<ControllerId>,
    commands: CommandQueue,
    draining: bool,
    frame: u64,
    journal: NavigationJournal,
}

impl Window {
    pub fn new(name: impl Into<String>, mut config: WindowConfig, pool: ControllerPrefabPool) -> Self {
        config.default_presentation_duration =
            clamp_presentation_duration(config.default_presentation_duration);
        let journal = match config.journal_capacity {
            Some(capacity) => NavigationJournal::bounded(capacity),
            None => NavigationJournal::new(),
        };
        Self {
            name: name.into(),
            config,
            pool,
            allocator: ControllerAllocator::new(),
            nodes: BTreeMap::new(),
            presented: Vec::new(),
            commands: CommandQueue::new(),
            draining: false,
            frame: 0,
            journal,
        }
    }

    // -- startup ------------------------------------------------------------

    /// Reset the view if configured to, then hand the window to `launcher`.
    pub fn launch(&mut self, launcher: &mut dyn Launchable) {
        if self.config.should_reset_view {
            self.reset_view();
        }
        debug!(window = %self.name, "lift off");
        launcher.lift_off(self);
        self.drain_commands();
    }

    /// Destroy every top-level controller, newest first.
    pub fn reset_view(&mut self) {
        let presented: Vec<ControllerId> = self.presented.iter().rev().copied().collect();
        for id in presented {
            self.destroy(id);
        }
        self.drain_commands();
    }

    // -- templates ----------------------------------------------------------

    /// The template registered for `T`. Logs an error if there is none.
    pub fn get_controller_prefab<T: ViewController>(&self) -> Option<Rc<ControllerTemplate>> {
        let template = self.pool.find_type::<T>();
        if template.is_none() {
            error!(
                window = %self.name,
                type_name = std::any::type_name::<T>(),
                "controller couldn't be found in the controller pool"
            );
        }
        template
    }

    // -- present / dismiss --------------------------------------------------

    /// Present a new `T` on top of everything else.
    pub fn present<T: ViewController>(&mut self, animated: bool) -> Option<ControllerId> {
        self.present_with::<T, _>(animated, |_| {}, None)
    }

    /// Present a new `T`, running `prepare` on it before it becomes visible
    /// and `on_complete` once its show transition has finished.
    pub fn present_with<T, P>(
        &mut self,
        animated: bool,
        prepare: P,
        on_complete: Option<Completion>,
    ) -> Option<ControllerId>
    where
        T: ViewController,
        P: FnOnce(&mut T) + 'static,
    {
        self.try_present_with::<T, P>(animated, prepare, on_complete)
            .inspect_err(NovaError::report)
            .ok()
    }

    pub fn try_present_with<T, P>(
        &mut self,
        animated: bool,
        prepare: P,
        on_complete: Option<Completion>,
    ) -> Result<ControllerId, NovaError>
    where
        T: ViewController,
        P: FnOnce(&mut T) + 'static,
    {
        let result =
            self.present_request(TemplateRequest::typed::<T, P>(prepare), animated, on_complete);
        self.drain_commands();
        result
    }

    /// Present an instance of a template the caller already holds.
    pub fn present_template(
        &mut self,
        template: Rc<ControllerTemplate>,
        animated: bool,
    ) -> Option<ControllerId> {
        let result = self.present_request(TemplateRequest::direct(template), animated, None);
        self.drain_commands();
        result.inspect_err(NovaError::report).ok()
    }

    /// Hide a presented controller and destroy it. Returns `false` if the
    /// request was refused.
    pub fn dismiss(&mut self, controller: ControllerId, animated: bool) -> bool {
        self.dismiss_with(controller, animated, None)
    }

    pub fn dismiss_with(
        &mut self,
        controller: ControllerId,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> bool {
        self.try_dismiss_with(controller, animated, on_complete)
            .inspect_err(NovaError::report)
            .is_ok()
    }

    pub fn try_dismiss_with(
        &mut self,
        controller: ControllerId,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> Result<(), NovaError> {
        let result = self.dismiss_inner(controller, animated, on_complete);
        self.drain_commands();
        result
    }

    // -- push / pop ---------------------------------------------------------

    /// Push a new `T` onto `navigation`'s stack.
    pub fn push<T: ViewController>(
        &mut self,
        navigation: ControllerId,
        animated: bool,
    ) -> Option<ControllerId> {
        self.push_with::<T, _>(navigation, animated, |_| {}, None)
    }

    /// Push a new `T`, running `prepare` on it before it becomes visible and
    /// `on_complete` once its show transition has finished.
    ///
    /// Returns `None` (and creates nothing) if the stack is already
    /// transitioning.
    pub fn push_with<T, P>(
        &mut self,
        navigation: ControllerId,
        animated: bool,
        prepare: P,
        on_complete: Option<Completion>,
    ) -> Option<ControllerId>
    where
        T: ViewController,
        P: FnOnce(&mut T) + 'static,
    {
        self.try_push_with::<T, P>(navigation, animated, prepare, on_complete)
            .inspect_err(NovaError::report)
            .ok()
    }

    pub fn try_push_with<T, P>(
        &mut self,
        navigation: ControllerId,
        animated: bool,
        prepare: P,
        on_complete: Option<Completion>,
    ) -> Result<ControllerId, NovaError>
    where
        T: ViewController,
        P: FnOnce(&mut T) + 'static,
    {
        let result = self.push_request(
            navigation,
            TemplateRequest::typed::<T, P>(prepare),
            animated,
            on_complete,
        );
        self.drain_commands();
        result
    }

    /// Push an instance of a template the caller already holds.
    pub fn push_template(
        &mut self,
        navigation: ControllerId,
        template: Rc<ControllerTemplate>,
        animated: bool,
    ) -> Option<ControllerId> {
        let result = self.push_request(navigation, TemplateRequest::direct(template), animated, None);
        self.drain_commands();
        result.inspect_err(NovaError::report).ok()
    }

    /// Pop the top of `navigation`'s stack. Returns the popped controller,
    /// which stays alive until its hide transition finishes.
    pub fn pop(&mut self, navigation: ControllerId, animated: bool) -> Option<ControllerId> {
        self.pop_with(navigation, animated, None)
    }

    pub fn pop_with(
        &mut self,
        navigation: ControllerId,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> Option<ControllerId> {
        self.try_pop_with(navigation, animated, on_complete)
            .inspect_err(NovaError::report)
            .ok()
            .flatten()
    }

    /// `Ok(None)` means the pop floor made the request a no-op.
    pub fn try_pop_with(
        &mut self,
        navigation: ControllerId,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> Result<Option<ControllerId>, NovaError> {
        let result = self.pop_inner(navigation, animated, on_complete);
        self.drain_commands();
        result
    }

    /// The navigation bar's back button. Pops with animation once the
    /// navigation controller has bound its back action.
    pub fn tap_back(&mut self, navigation: ControllerId) -> Option<ControllerId> {
        let bound = self
            .navigation_stack(navigation)
            .and_then(NavigationStack::navigation_bar)
            .is_some_and(|bar| bar.is_back_action_bound());
        if !bound {
            trace!(navigation = %navigation, "back tapped with no bound action");
            return None;
        }
        self.pop(navigation, true)
    }

    // -- transitions --------------------------------------------------------

    /// Activate `controller` and bring it to full opacity. Returns `false`
    /// for a stale handle.
    pub fn show(
        &mut self,
        controller: ControllerId,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> bool {
        if !self.nodes.contains_key(&controller) {
            NovaError::StaleController { controller }.report();
            return false;
        }
        self.show_with(controller, animated, FadeCompletion::new(on_complete, AfterFade::Nothing));
        self.drain_commands();
        true
    }

    /// Bring `controller` to zero opacity. It stays alive.
    pub fn hide(
        &mut self,
        controller: ControllerId,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> bool {
        if !self.nodes.contains_key(&controller) {
            NovaError::StaleController { controller }.report();
            return false;
        }
        self.hide_with(controller, animated, FadeCompletion::new(on_complete, AfterFade::Nothing));
        self.drain_commands();
        true
    }

    /// Fade from 0 to 1 over `duration` (the controller's presentation
    /// duration if `None`). Returns whether the fade started.
    pub fn fade_in(
        &mut self,
        controller: ControllerId,
        duration: Option<f32>,
        on_complete: Option<Completion>,
    ) -> bool {
        self.fade_from(controller, 0.0, 1.0, duration, on_complete)
    }

    /// Fade from 1 to 0. See [`fade_in`](Self::fade_in).
    pub fn fade_out(
        &mut self,
        controller: ControllerId,
        duration: Option<f32>,
        on_complete: Option<Completion>,
    ) -> bool {
        self.fade_from(controller, 1.0, 0.0, duration, on_complete)
    }

    /// Fade from the current opacity to `opacity`.
    ///
    /// Dropped, without running `on_complete`, if a fade is already running
    /// or the controller is not active in hierarchy.
    pub fn fade_to(
        &mut self,
        controller: ControllerId,
        opacity: f32,
        duration: f32,
        on_complete: Option<Completion>,
    ) -> bool {
        let accepted = self.fade_to_inner(controller, opacity, duration, on_complete);
        self.drain_commands();
        accepted
    }

    /// Set a controller's own active flag. Enable/disable hooks run for it
    /// and its stacked children as their effective state changes.
    pub fn set_active(&mut self, controller: ControllerId, active: bool) -> bool {
        let found = self.set_active_inner(controller, active);
        self.drain_commands();
        found
    }

    // -- frames -------------------------------------------------------------

    /// Advance one frame of `dt` seconds.
    ///
    /// Controllers created since the last frame that are active in hierarchy
    /// load (`view_did_load`, then enabled or disabled). Then every running
    /// fade on an active-in-hierarchy controller steps; fades on inactive
    /// controllers stay paused. Completions of finished fades run last.
    pub fn advance(&mut self, dt: f32) -> FrameReport {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.frame += 1;
        let mut report = FrameReport {
            frame: self.frame,
            ..Default::default()
        };

        report.controllers_loaded = self.load_pending();

        let fading: Vec<ControllerId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.fader.is_fading())
            .map(|(id, _)| *id)
            .collect();
        let mut finished = Vec::new();
        for id in fading {
            if !self.is_active_in_hierarchy(id) {
                continue;
            }
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            match node.fader.step(dt) {
                FadeStep::Running(opacity) => {
                    report.fades_advanced += 1;
                    trace!(controller = %id, opacity, "fade step");
                }
                FadeStep::Finished(opacity) => {
                    report.fades_completed += 1;
                    let completion = node.fade_completion.take();
                    self.journal
                        .record(self.frame, id, NavigationEventKind::FadeFinished { opacity });
                    if let Some(completion) = completion {
                        finished.push(completion);
                    }
                }
                FadeStep::Idle => {}
            }
        }
        for completion in finished {
            self.complete(completion);
        }

        report.commands_applied = self.drain_commands();
        report
    }

    /// Nothing left to do: no queued commands, no running fades and no
    /// pending loads on active controllers.
    pub fn is_idle(&self) -> bool {
        self.commands.is_empty()
            && !self.nodes.iter().any(|(id, node)| {
                (node.fader.is_fading() || node.lifecycle.state() == LifecycleState::WillLoad)
                    && self.is_active_in_hierarchy(*id)
            })
    }

    // -- queries ------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn pool(&self) -> &ControllerPrefabPool {
        &self.pool
    }

    /// Frames advanced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn journal(&self) -> &NavigationJournal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut NavigationJournal {
        &mut self.journal
    }

    pub fn is_alive(&self, controller: ControllerId) -> bool {
        self.allocator.is_alive(controller)
    }

    pub fn controller_count(&self) -> usize {
        self.nodes.len()
    }

    /// All live controllers, in handle order.
    pub fn controllers(&self) -> impl Iterator<Item = ControllerId> + '_ {
        self.nodes.keys().copied()
    }

    /// Top-level controllers, bottom to top.
    pub fn presented(&self) -> &[ControllerId] {
        &self.presented
    }

    pub fn lifecycle(&self, controller: ControllerId) -> Option<LifecycleState> {
        self.nodes.get(&controller).map(|n| n.lifecycle.state())
    }

    pub fn opacity(&self, controller: ControllerId) -> Option<f32> {
        self.nodes.get(&controller).map(|n| n.fader.opacity())
    }

    pub fn is_fading(&self, controller: ControllerId) -> bool {
        self.nodes
            .get(&controller)
            .is_some_and(|n| n.fader.is_fading())
    }

    /// The controller's own active flag.
    pub fn is_active(&self, controller: ControllerId) -> bool {
        self.nodes.get(&controller).is_some_and(|n| n.active)
    }

    /// The controller and every navigation controller above it are active.
    pub fn is_active_in_hierarchy(&self, controller: ControllerId) -> bool {
        let mut current = Some(controller);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(&id) else {
                return false;
            };
            if !node.active {
                return false;
            }
            current = node.navigation_controller;
        }
        true
    }

    /// Instance name: the template name for pushed controllers, the short
    /// type name for presented ones.
    pub fn controller_name(&self, controller: ControllerId) -> Option<&str> {
        self.nodes.get(&controller).map(|n| n.name.as_str())
    }

    pub fn template_name(&self, controller: ControllerId) -> Option<&str> {
        self.nodes.get(&controller).map(|n| n.template_name.as_str())
    }

    pub fn type_name(&self, controller: ControllerId) -> Option<&'static str> {
        self.nodes.get(&controller).map(|n| n.type_name)
    }

    pub fn configuration(&self, controller: ControllerId) -> Option<&ViewControllerConfiguration> {
        self.nodes.get(&controller).map(|n| &n.configuration)
    }

    pub fn layout(&self, controller: ControllerId) -> Option<&RectLayout> {
        self.nodes.get(&controller).map(|n| &n.layout)
    }

    pub fn presentation_duration(&self, controller: ControllerId) -> Option<f32> {
        self.nodes.get(&controller).map(|n| n.presentation_duration)
    }

    /// The navigation controller `controller` was pushed onto.
    pub fn navigation_controller(&self, controller: ControllerId) -> Option<ControllerId> {
        self.nodes
            .get(&controller)
            .and_then(|n| n.navigation_controller)
    }

    pub fn navigation_stack(&self, controller: ControllerId) -> Option<&NavigationStack> {
        self.nodes.get(&controller).and_then(|n| n.stack.as_ref())
    }

    /// Typed access to a controller's state.
    pub fn controller<T: ViewController>(&self, controller: ControllerId) -> Option<&T> {
        let behavior = self.nodes.get(&controller)?.behavior.as_deref()?;
        AsAny::as_any(behavior).downcast_ref::<T>()
    }

    pub fn controller_mut<T: ViewController>(&mut self, controller: ControllerId) -> Option<&mut T> {
        let behavior = self.nodes.get_mut(&controller)?.behavior.as_deref_mut()?;
        AsAny::as_any_mut(behavior).downcast_mut::<T>()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    fn resolve(
        &self,
        request: TemplateRequest,
    ) -> Result<(Rc<ControllerTemplate>, Option<ErasedPrepare>), NovaError> {
        match request {
            TemplateRequest::Direct { template, prepare } => Ok((template, prepare)),
            TemplateRequest::Typed {
                type_id,
                type_name,
                prepare,
            } => {
                let template = self.pool.find(type_id).ok_or_else(|| NovaError::MissingTemplate {
                    type_name: type_name.to_owned(),
                })?;
                Ok((template, prepare))
            }
        }
    }

    fn present_request(
        &mut self,
        request: TemplateRequest,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> Result<ControllerId, NovaError> {
        let (template, prepare) = self.resolve(request)?;
        let id = self.instantiate(&template, None);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = short_type_name(template.type_name()).to_owned();
            node.layout.reset_to_fill();
        }
        self.presented.push(id);
        self.run_prepare(id, prepare);
        self.record(id, NavigationEventKind::Presented);
        debug!(controller = %id, template = template.name(), "presented");

        self.show_with(id, animated, FadeCompletion::new(on_complete, AfterFade::Nothing));
        Ok(id)
    }

    fn dismiss_inner(
        &mut self,
        controller: ControllerId,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> Result<(), NovaError> {
        if !self.presented.contains(&controller) {
            return Err(if self.nodes.contains_key(&controller) {
                NovaError::NotPresented { controller }
            } else {
                NovaError::StaleController { controller }
            });
        }
        let node = self
            .nodes
            .get_mut(&controller)
            .ok_or(NovaError::StaleController { controller })?;
        if node.dismissing {
            return Err(NovaError::Reentrant {
                operation: "dismiss",
            });
        }
        node.dismissing = true;

        self.record(controller, NavigationEventKind::Dismissed);
        debug!(controller = %controller, "dismissing");
        self.record(controller, NavigationEventKind::WillDisappear);
        self.run_hook(controller, Hook::WillDisappear);
        self.hide_with(
            controller,
            animated,
            FadeCompletion::new(on_complete, AfterFade::Destroy { controller }),
        );
        Ok(())
    }

    /// Checks shared by push and pop: live handle, has a stack, and the stack
    /// is idle.
    fn stack_ready(&self, navigation: ControllerId, operation: &'static str) -> Result<(), NovaError> {
        let node = self
            .nodes
            .get(&navigation)
            .ok_or(NovaError::StaleController {
                controller: navigation,
            })?;
        let stack = node
            .stack
            .as_ref()
            .ok_or(NovaError::NotANavigationController {
                controller: navigation,
            })?;
        if stack.is_transitioning() {
            return Err(NovaError::Reentrant { operation });
        }
        Ok(())
    }

    fn push_request(
        &mut self,
        navigation: ControllerId,
        request: TemplateRequest,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> Result<ControllerId, NovaError> {
        // A dropped push must not create anything, so check before lookup.
        self.stack_ready(navigation, "push")?;
        let (template, prepare) = self.resolve(request)?;
        self.push_resolved(navigation, &template, prepare, animated, on_complete)
    }

    fn push_resolved(
        &mut self,
        navigation: ControllerId,
        template: &ControllerTemplate,
        prepare: Option<ErasedPrepare>,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> Result<ControllerId, NovaError> {
        self.stack_ready(navigation, "push")?;

        let id = self.instantiate(template, Some(navigation));
        if let Some(node) = self.nodes.get_mut(&id) {
            node.layout.reset_to_fill();
        }
        self.run_prepare(id, prepare);

        let configuration = self
            .nodes
            .get(&id)
            .map(|n| n.configuration.clone())
            .unwrap_or_default();
        let Some(stack) = self.stack_mut(navigation) else {
            self.destroy(id);
            return Err(NovaError::StaleController {
                controller: navigation,
            });
        };
        let depth = stack.push_entry(id, &configuration);
        stack.begin_transition();
        self.record(id, NavigationEventKind::Pushed { navigation, depth });
        debug!(controller = %id, navigation = %navigation, depth, "pushed");

        self.show_with(
            id,
            animated,
            FadeCompletion::new(on_complete, AfterFade::EndPush { navigation }),
        );
        Ok(id)
    }

    fn pop_inner(
        &mut self,
        navigation: ControllerId,
        animated: bool,
        on_complete: Option<Completion>,
    ) -> Result<Option<ControllerId>, NovaError> {
        self.stack_ready(navigation, "pop")?;
        let Some(stack) = self.stack_mut(navigation) else {
            return Err(NovaError::StaleController {
                controller: navigation,
            });
        };
        let Some(entry) = stack.pop_entry() else {
            trace!(navigation = %navigation, "pop ignored at stack floor");
            return Ok(None);
        };
        let depth = stack.depth();

        let previous = entry
            .previous
            .and_then(|p| self.nodes.get(&p))
            .map(|n| n.configuration.clone());
        if let Some(stack) = self.stack_mut(navigation) {
            stack.sync_after_pop(previous.as_ref());
            stack.begin_transition();
        }
        self.record(entry.popped, NavigationEventKind::Popped { navigation, depth });
        debug!(controller = %entry.popped, navigation = %navigation, depth, "popped");

        self.record(entry.popped, NavigationEventKind::WillDisappear);
        self.run_hook(entry.popped, Hook::WillDisappear);
        self.hide_with(
            entry.popped,
            animated,
            FadeCompletion::new(
                on_complete,
                AfterFade::EndPop {
                    navigation,
                    popped: entry.popped,
                },
            ),
        );
        Ok(Some(entry.popped))
    }

    fn fade_from(
        &mut self,
        controller: ControllerId,
        from: f32,
        to: f32,
        duration: Option<f32>,
        on_complete: Option<Completion>,
    ) -> bool {
        let Some(node) = self.nodes.get(&controller) else {
            NovaError::StaleController { controller }.report();
            return false;
        };
        let duration = duration.unwrap_or(node.presentation_duration);
        let accepted = match self.start_fade(
            controller,
            Some(from),
            to,
            duration,
            FadeCompletion::new(on_complete, AfterFade::Nothing),
        ) {
            Ok(()) => true,
            Err((reason, _)) => {
                trace!(controller = %controller, ?reason, "fade request dropped");
                false
            }
        };
        self.drain_commands();
        accepted
    }

    fn fade_to_inner(
        &mut self,
        controller: ControllerId,
        opacity: f32,
        duration: f32,
        on_complete: Option<Completion>,
    ) -> bool {
        match self.start_fade(
            controller,
            None,
            opacity,
            duration,
            FadeCompletion::new(on_complete, AfterFade::Nothing),
        ) {
            Ok(()) => true,
            Err((reason, _)) => {
                trace!(controller = %controller, ?reason, "fade request dropped");
                false
            }
        }
    }

    /// Start a fade, handing the completion back if the request is refused.
    fn start_fade(
        &mut self,
        controller: ControllerId,
        from: Option<f32>,
        target: f32,
        duration: f32,
        completion: FadeCompletion,
    ) -> Result<(), (FadeRejected, FadeCompletion)> {
        if !self.is_active_in_hierarchy(controller) {
            return Err((FadeRejected::Inactive, completion));
        }
        let Some(node) = self.nodes.get_mut(&controller) else {
            return Err((FadeRejected::Inactive, completion));
        };
        let started = match from {
            Some(from) => node.fader.begin_from(from, target, duration),
            None => node.fader.begin(target, duration),
        };
        if let Err(reason) = started {
            return Err((reason, completion));
        }
        let from = node.fader.opacity();
        let to = node.fader.current_fade().map_or(target, |f| f.target);
        node.fade_completion = Some(completion);
        self.record(
            controller,
            NavigationEventKind::FadeStarted { from, to, duration },
        );
        Ok(())
    }

    fn show_with(&mut self, controller: ControllerId, animated: bool, completion: FadeCompletion) {
        self.transition_visibility(controller, animated, 1.0, completion);
    }

    fn hide_with(&mut self, controller: ControllerId, animated: bool, completion: FadeCompletion) {
        self.transition_visibility(controller, animated, 0.0, completion);
    }

    /// Show (`target` 1) or hide (`target` 0). Instant when not animated,
    /// when the controller's transition type is `None`, or when a fade
    /// cannot start; the completion then runs before this returns.
    ///
    /// An instant transition lands on `target` even mid-fade. The fade it
    /// cuts short is finished first, completion included.
    fn transition_visibility(
        &mut self,
        controller: ControllerId,
        animated: bool,
        target: f32,
        completion: FadeCompletion,
    ) {
        let showing = target > 0.0;
        if showing {
            self.set_active_inner(controller, true);
        }
        let Some(node) = self.nodes.get(&controller) else {
            self.complete(completion);
            return;
        };
        let instant = !animated || node.configuration.transition_type == TransitionType::None;
        let duration = node.presentation_duration;

        let completion = if instant {
            completion
        } else {
            match self.start_fade(controller, Some(1.0 - target), target, duration, completion) {
                Ok(()) => return,
                Err((reason, completion)) => {
                    trace!(controller = %controller, ?reason, "transition runs instantly");
                    completion
                }
            }
        };
        let superseded = self.nodes.get_mut(&controller).and_then(|node| {
            node.fader.finish_at(target)?;
            Some(node.fade_completion.take())
        });
        if let Some(pending) = superseded {
            debug!(controller = %controller, opacity = target, "running fade cut short");
            self.record(controller, NavigationEventKind::FadeFinished { opacity: target });
            if let Some(pending) = pending {
                self.complete(pending);
            }
        }
        self.complete(completion);
    }

    fn complete(&mut self, completion: FadeCompletion) {
        let FadeCompletion { on_complete, then } = completion;
        match then {
            AfterFade::Nothing => self.run_completion(on_complete),
            AfterFade::EndPush { navigation } => {
                self.end_transition(navigation);
                self.run_completion(on_complete);
            }
            AfterFade::EndPop { navigation, popped } => {
                self.end_transition(navigation);
                self.run_completion(on_complete);
                self.destroy(popped);
            }
            AfterFade::Destroy { controller } => {
                self.run_completion(on_complete);
                self.destroy(controller);
            }
        }
    }

    fn run_completion(&mut self, on_complete: Option<Completion>) {
        if let Some(on_complete) = on_complete {
            on_complete(self);
        }
    }

    fn end_transition(&mut self, navigation: ControllerId) {
        if let Some(stack) = self.stack_mut(navigation) {
            stack.end_transition();
        }
    }

    fn set_active_inner(&mut self, controller: ControllerId, active: bool) -> bool {
        let Some(node) = self.nodes.get_mut(&controller) else {
            NovaError::StaleController { controller }.report();
            return false;
        };
        if node.active != active {
            node.active = active;
            trace!(controller = %controller, active, "active flag changed");
            self.refresh_enabled(controller);
        }
        true
    }

    /// Bring loaded controllers' enabled/disabled state in line with their
    /// effective activity, parent first.
    fn refresh_enabled(&mut self, controller: ControllerId) {
        let Some(state) = self.lifecycle(controller) else {
            return;
        };
        let effective = self.is_active_in_hierarchy(controller);
        match (state, effective) {
            (LifecycleState::Disabled, true) => {
                if self.set_lifecycle(controller, LifecycleState::Enabled) {
                    self.run_hook(controller, Hook::Enabled);
                }
            }
            (LifecycleState::Enabled, false) => {
                if self.set_lifecycle(controller, LifecycleState::Disabled) {
                    self.run_hook(controller, Hook::Disabled);
                }
            }
            _ => {}
        }
        for child in self.children_of(controller) {
            self.refresh_enabled(child);
        }
    }

    // -----------------------------------------------------------------------
    // Instances
    // -----------------------------------------------------------------------

    /// Create an instance, inject its navigation controller, and run its
    /// will-load step.
    fn instantiate(
        &mut self,
        template: &ControllerTemplate,
        navigation_controller: Option<ControllerId>,
    ) -> ControllerId {
        let id = self.allocator.allocate();
        let node = ControllerNode {
            name: template.name().to_owned(),
            template_name: template.name().to_owned(),
            type_name: template.type_name(),
            configuration: template.configuration().clone(),
            lifecycle: Lifecycle::new(),
            active: true,
            layout: *template.layout(),
            navigation_controller,
            presentation_duration: template
                .presentation_duration()
                .unwrap_or(self.config.default_presentation_duration),
            fader: Fader::default(),
            fade_completion: None,
            stack: template
                .navigation()
                .map(|settings| NavigationStack::new(settings, self.config.pop_floor)),
            dismissing: false,
            behavior: Some(template.instantiate()),
        };
        self.nodes.insert(id, node);
        self.record(
            id,
            NavigationEventKind::Instantiated {
                template: template.name().to_owned(),
            },
        );
        debug!(controller = %id, template = template.name(), "instantiated");

        if self.set_lifecycle(id, LifecycleState::WillLoad) {
            if let Some(settings) = template.navigation() {
                self.navigation_will_load(id, settings);
            }
            self.run_hook(id, Hook::WillLoad);
        }
        id
    }

    /// Built-in will-load step of navigation controllers.
    fn navigation_will_load(&mut self, id: ControllerId, settings: &NavigationSettings) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        if settings.initial.is_none() {
            NovaError::Misconfigured {
                controller: node.name.clone(),
                field: "initial_view_controller".to_owned(),
            }
            .report();
        }
        if settings.requires_navigation_bar && settings.navigation_bar.is_none() {
            NovaError::Misconfigured {
                controller: node.name.clone(),
                field: "navigation_bar".to_owned(),
            }
            .report();
        }
        if let Some(bar) = node.stack.as_mut().and_then(NavigationStack::navigation_bar_mut) {
            bar.bind_back_action();
        }
    }

    /// Built-in did-load step of navigation controllers: push the initial
    /// controller without animation.
    fn navigation_did_load(&mut self, id: ControllerId) {
        let Some(initial) = self
            .navigation_stack(id)
            .and_then(|stack| stack.initial().cloned())
        else {
            return;
        };
        if let Err(err) = self.push_resolved(id, &initial, None, false, None) {
            err.report();
        }
    }

    /// Run did-load for every controller still waiting to load that is
    /// active in hierarchy. Controllers created along the way wait for the
    /// next frame.
    fn load_pending(&mut self) -> usize {
        let pending: Vec<ControllerId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.lifecycle.state() == LifecycleState::WillLoad)
            .map(|(id, _)| *id)
            .collect();

        let mut loaded = 0;
        for id in pending {
            if self.lifecycle(id) != Some(LifecycleState::WillLoad) || !self.is_active_in_hierarchy(id) {
                continue;
            }
            if !self.set_lifecycle(id, LifecycleState::DidLoad) {
                continue;
            }
            self.navigation_did_load(id);
            self.run_hook(id, Hook::DidLoad);

            if self.is_active_in_hierarchy(id) {
                if self.set_lifecycle(id, LifecycleState::Enabled) {
                    self.run_hook(id, Hook::Enabled);
                }
            } else {
                self.set_lifecycle(id, LifecycleState::Disabled);
            }
            loaded += 1;
        }
        loaded
    }

    /// Tear down `id` and everything pushed onto it. Idempotent.
    fn destroy(&mut self, id: ControllerId) {
        let Some(state) = self.lifecycle(id) else {
            return;
        };
        if state.is_unloading() {
            return;
        }
        if state == LifecycleState::Enabled && self.set_lifecycle(id, LifecycleState::Disabled) {
            self.run_hook(id, Hook::Disabled);
        }
        if !self.set_lifecycle(id, LifecycleState::WillUnload) {
            return;
        }
        self.run_hook(id, Hook::WillUnload);

        let mut children = self.children_of(id);
        children.reverse();
        for child in children {
            self.destroy(child);
        }

        self.set_lifecycle(id, LifecycleState::Destroyed);
        if let Some(node) = self.nodes.remove(&id) {
            if let Some(pending) = node.fade_completion {
                debug!(controller = %id, "discarding pending transition callback");
                match pending.then {
                    AfterFade::EndPush { navigation } | AfterFade::EndPop { navigation, .. } => {
                        self.end_transition(navigation);
                    }
                    AfterFade::Nothing | AfterFade::Destroy { .. } => {}
                }
            }
            if let Some(parent) = node.navigation_controller {
                if let Some(stack) = self.stack_mut(parent) {
                    stack.remove(id);
                }
            }
            debug!(controller = %id, name = %node.name, "destroyed");
        }
        self.presented.retain(|p| *p != id);
        if !self.allocator.deallocate(id) {
            warn!(controller = %id, "destroyed controller was already deallocated");
        }
    }

    /// Controllers whose navigation controller is `id`: the stack bottom to
    /// top, then any popped controller still hiding.
    fn children_of(&self, id: ControllerId) -> Vec<ControllerId> {
        let mut children: Vec<ControllerId> = self
            .navigation_stack(id)
            .map(|stack| stack.controllers().to_vec())
            .unwrap_or_default();
        let detached: Vec<ControllerId> = self
            .nodes
            .iter()
            .filter(|(child, node)| {
                node.navigation_controller == Some(id) && !children.contains(*child)
            })
            .map(|(child, _)| *child)
            .collect();
        children.extend(detached);
        children
    }

    fn stack_mut(&mut self, controller: ControllerId) -> Option<&mut NavigationStack> {
        self.nodes
            .get_mut(&controller)
            .and_then(|n| n.stack.as_mut())
    }

    fn set_lifecycle(&mut self, id: ControllerId, next: LifecycleState) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        match node.lifecycle.transition(next) {
            Ok(from) => {
                trace!(controller = %id, %from, to = %next, "lifecycle");
                self.journal
                    .record(self.frame, id, NavigationEventKind::Lifecycle { from, to: next });
                true
            }
            Err(err) => {
                err.report();
                false
            }
        }
    }

    /// Run one hook with the behavior temporarily taken out of its node.
    fn run_hook(&mut self, id: ControllerId, hook: Hook) {
        let Some(mut behavior) = self.nodes.get_mut(&id).and_then(|n| n.behavior.take()) else {
            return;
        };
        if let Some(node) = self.nodes.get(&id) {
            let mut cx = ControllerContext::new(
                id,
                node.navigation_controller,
                &node.configuration,
                &mut self.commands,
            );
            hook.invoke(&mut *behavior, &mut cx);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.behavior = Some(behavior);
        }
    }

    fn run_prepare(&mut self, id: ControllerId, prepare: Option<ErasedPrepare>) {
        let Some(prepare) = prepare else {
            return;
        };
        let Some(mut behavior) = self.nodes.get_mut(&id).and_then(|n| n.behavior.take()) else {
            return;
        };
        prepare(&mut *behavior);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.behavior = Some(behavior);
        }
    }

    fn record(&mut self, controller: ControllerId, kind: NavigationEventKind) -> u64 {
        self.journal.record(self.frame, controller, kind)
    }

    /// Apply queued hook commands in FIFO order. Commands queued while
    /// draining join the end of the queue. Returns how many were applied.
    fn drain_commands(&mut self) -> usize {
        if self.draining {
            return 0;
        }
        self.draining = true;
        let mut applied = 0;
        while let Some(command) = self.commands.pop_front() {
            applied += 1;
            let name = command.name();
            let result = match command {
                ControllerCommand::Push {
                    navigation,
                    request,
                    animated,
                    on_complete,
                } => self
                    .push_request(navigation, request, animated, on_complete)
                    .map(drop),
                ControllerCommand::Pop {
                    navigation,
                    animated,
                    on_complete,
                } => self.pop_inner(navigation, animated, on_complete).map(drop),
                ControllerCommand::Present {
                    request,
                    animated,
                    on_complete,
                } => self.present_request(request, animated, on_complete).map(drop),
                ControllerCommand::Dismiss {
                    controller,
                    animated,
                    on_complete,
                } => self.dismiss_inner(controller, animated, on_complete),
                ControllerCommand::FadeTo {
                    controller,
                    opacity,
                    duration,
                    on_complete,
                } => {
                    self.fade_to_inner(controller, opacity, duration, on_complete);
                    Ok(())
                }
                ControllerCommand::SetActive { controller, active } => {
                    self.set_active_inner(controller, active);
                    Ok(())
                }
            };
            if let Err(err) = result {
                trace!(command = name, "queued command failed");
                err.report();
            }
        }
        self.draining = false;
        applied
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("name", &self.name)
            .field("frame", &self.frame)
            .field("controllers", &self.nodes.len())
            .field("presented", &self.presented)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
