//! Navigation stacks and their chrome.
//!
//! A [`NavigationStack`] is the ordered list of controllers pushed onto a
//! navigation controller; the last entry is the visible one. At most one
//! structural operation (push or pop) is in flight per stack: the
//! `is_transitioning` flag is set synchronously when the operation starts and
//! cleared when its show/hide transition completes. Requests arriving in
//! between are dropped.
//!
//! Chrome (a [`NavigationBar`]) is an optional capability of the stack. When
//! present, it is synchronized against the configuration of the new top
//! controller on every push and pop.
//!
//! Whether the root entry can be popped is an explicit [`PopFloor`] choice:
//!
//! - [`PopFloor::KeepRoot`]: pop on a single-entry stack is a no-op.
//! - [`PopFloor::AllowEmpty`]: pop on a single-entry stack removes and
//!   destroys the root, leaving the stack empty.
//!
//! Pop on an empty stack is a no-op under both policies.

use std::rc::Rc;

use nova_core::configuration::ViewControllerConfiguration;
use nova_core::controller::ControllerId;
use serde::{Deserialize, Serialize};

use crate::template::ControllerTemplate;

// ---------------------------------------------------------------------------
// PopFloor
// ---------------------------------------------------------------------------

/// Whether pop may remove a stack's last remaining controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopFloor {
    /// The root controller is never popped.
    #[default]
    KeepRoot,
    /// The root controller can be popped, leaving an empty stack.
    AllowEmpty,
}

impl PopFloor {
    /// Smallest depth pop leaves behind.
    pub fn min_depth(self) -> usize {
        match self {
            PopFloor::KeepRoot => 1,
            PopFloor::AllowEmpty => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// NavigationBar
// ---------------------------------------------------------------------------

/// Title bar and back button shared by every controller on a stack.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavigationBar {
    title: String,
    hidden: bool,
    title_hidden: bool,
    close_button_hidden: bool,
    back_button_hidden: bool,
    back_action_bound: bool,
}

impl NavigationBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// The whole bar, overlays included, is hidden.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_title_hidden(&self) -> bool {
        self.title_hidden
    }

    pub fn is_close_button_hidden(&self) -> bool {
        self.close_button_hidden
    }

    pub fn is_back_button_hidden(&self) -> bool {
        self.back_button_hidden
    }

    /// Whether tapping back pops the stack.
    pub fn is_back_action_bound(&self) -> bool {
        self.back_action_bound
    }

    pub(crate) fn bind_back_action(&mut self) {
        self.back_action_bound = true;
    }

    /// Mirror `configuration` and set the back button's visibility.
    pub(crate) fn sync(&mut self, configuration: &ViewControllerConfiguration, back_hidden: bool) {
        self.title.clone_from(&configuration.title);
        self.hidden = configuration.hide_navigation_overlays;
        self.title_hidden = configuration.hide_navigation_title;
        self.close_button_hidden = configuration.hide_navigation_close_button;
        self.back_button_hidden = back_hidden;
    }
}

// ---------------------------------------------------------------------------
// NavigationSettings
// ---------------------------------------------------------------------------

/// How a navigation controller template sets up its stack.
#[derive(Debug, Clone, Default)]
pub struct NavigationSettings {
    /// Pushed without animation on first activation.
    pub initial: Option<Rc<ControllerTemplate>>,
    /// Chrome installed on load.
    pub navigation_bar: Option<NavigationBar>,
    /// Report a missing `navigation_bar` as a misconfiguration.
    pub requires_navigation_bar: bool,
    /// Overrides the window's default floor.
    pub pop_floor: Option<PopFloor>,
}

impl NavigationSettings {
    /// A stack without chrome.
    pub fn bare(initial: Rc<ControllerTemplate>) -> Self {
        Self {
            initial: Some(initial),
            ..Default::default()
        }
    }

    /// A stack with a navigation bar.
    pub fn with_bar(initial: Rc<ControllerTemplate>) -> Self {
        Self {
            initial: Some(initial),
            navigation_bar: Some(NavigationBar::new()),
            requires_navigation_bar: true,
            pop_floor: None,
        }
    }

    pub fn pop_floor(mut self, floor: PopFloor) -> Self {
        self.pop_floor = Some(floor);
        self
    }
}

// ---------------------------------------------------------------------------
// NavigationStack
// ---------------------------------------------------------------------------

/// Result of removing the top entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoppedEntry {
    pub popped: ControllerId,
    /// The new top, if any.
    pub previous: Option<ControllerId>,
}

/// The ordered controllers of one navigation controller.
#[derive(Debug, Clone)]
pub struct NavigationStack {
    controllers: Vec<ControllerId>,
    navigation_bar: Option<NavigationBar>,
    initial: Option<Rc<ControllerTemplate>>,
    pop_floor: PopFloor,
    is_transitioning: bool,
}

impl NavigationStack {
    pub fn new(settings: &NavigationSettings, default_floor: PopFloor) -> Self {
        Self {
            controllers: Vec::new(),
            navigation_bar: settings.navigation_bar.clone(),
            initial: settings.initial.clone(),
            pop_floor: settings.pop_floor.unwrap_or(default_floor),
            is_transitioning: false,
        }
    }

    pub fn depth(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// The visible controller.
    pub fn top(&self) -> Option<ControllerId> {
        self.controllers.last().copied()
    }

    /// Bottom to top.
    pub fn controllers(&self) -> &[ControllerId] {
        &self.controllers
    }

    pub fn contains(&self, id: ControllerId) -> bool {
        self.controllers.contains(&id)
    }

    pub fn navigation_bar(&self) -> Option<&NavigationBar> {
        self.navigation_bar.as_ref()
    }

    pub fn initial(&self) -> Option<&Rc<ControllerTemplate>> {
        self.initial.as_ref()
    }

    pub fn pop_floor(&self) -> PopFloor {
        self.pop_floor
    }

    pub fn is_transitioning(&self) -> bool {
        self.is_transitioning
    }

    /// Whether a pop would remove anything under the current floor.
    pub fn can_pop(&self) -> bool {
        self.depth() > self.pop_floor.min_depth()
    }

    pub(crate) fn navigation_bar_mut(&mut self) -> Option<&mut NavigationBar> {
        self.navigation_bar.as_mut()
    }

    pub(crate) fn begin_transition(&mut self) {
        self.is_transitioning = true;
    }

    pub(crate) fn end_transition(&mut self) {
        self.is_transitioning = false;
    }

    /// Sync chrome for `configuration` about to become the top, then append
    /// `id`. Returns the new depth.
    pub(crate) fn push_entry(
        &mut self,
        id: ControllerId,
        configuration: &ViewControllerConfiguration,
    ) -> usize {
        let back_hidden = self.controllers.is_empty();
        if let Some(bar) = self.navigation_bar.as_mut() {
            bar.sync(configuration, back_hidden);
        }
        self.controllers.push(id);
        self.controllers.len()
    }

    /// Remove the top entry if the floor allows it.
    pub(crate) fn pop_entry(&mut self) -> Option<PoppedEntry> {
        if !self.can_pop() {
            return None;
        }
        let popped = self.controllers.pop()?;
        Some(PoppedEntry {
            popped,
            previous: self.top(),
        })
    }

    /// Sync chrome to the new top after a pop.
    pub(crate) fn sync_after_pop(&mut self, previous: Option<&ViewControllerConfiguration>) {
        let back_hidden = self.controllers.len() <= 1;
        if let Some(bar) = self.navigation_bar.as_mut() {
            match previous {
                Some(configuration) => bar.sync(configuration, back_hidden),
                None => bar.back_button_hidden = back_hidden,
            }
        }
    }

    /// Drop `id` wherever it sits. Used when a stacked controller is
    /// destroyed out of band.
    pub(crate) fn remove(&mut self, id: ControllerId) -> bool {
        let before = self.controllers.len();
        self.controllers.retain(|c| *c != id);
        before != self.controllers.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
