//! Push/pop behavior of navigation stacks.
//!
//! Covers:
//! 1. Chrome synchronization across push and pop
//! 2. Teardown ordering: disappear hook, hide transition, destroy
//! 3. Re-entrancy guard while a push/pop is in flight
//! 4. Both pop floors, including idempotent pops at the floor
//! 5. Hook-driven navigation

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use nova_engine::prelude::*;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Home;
impl ViewController for Home {}

#[derive(Debug, Clone, Default)]
struct Detail {
    item: u32,
}
impl ViewController for Detail {}

#[derive(Debug, Clone, Default)]
struct Shell;
impl ViewController for Shell {}

#[derive(Debug, Clone, Default)]
struct BareShell;
impl ViewController for BareShell {}

/// Records every hook it receives into a shared log.
#[derive(Debug, Clone, Default)]
struct Recorder {
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl ViewController for Recorder {
    fn view_will_load(&mut self, _cx: &mut ControllerContext<'_>) {
        self.log.borrow_mut().push("will_load");
    }
    fn view_did_load(&mut self, _cx: &mut ControllerContext<'_>) {
        self.log.borrow_mut().push("did_load");
    }
    fn view_is_enabled(&mut self, _cx: &mut ControllerContext<'_>) {
        self.log.borrow_mut().push("enabled");
    }
    fn view_is_disabled(&mut self, _cx: &mut ControllerContext<'_>) {
        self.log.borrow_mut().push("disabled");
    }
    fn view_will_disappear(&mut self, _cx: &mut ControllerContext<'_>) {
        self.log.borrow_mut().push("will_disappear");
    }
    fn view_will_unload(&mut self, _cx: &mut ControllerContext<'_>) {
        self.log.borrow_mut().push("will_unload");
    }
}

/// Pushes a `Detail` onto its own stack as soon as it loads.
#[derive(Debug, Clone, Default)]
struct AutoPusher;

impl ViewController for AutoPusher {
    fn view_did_load(&mut self, cx: &mut ControllerContext<'_>) {
        if let Some(navigation) = cx.navigation_controller() {
            cx.push_with::<Detail, _>(navigation, false, |d| d.item = 7, None);
        }
    }
}

const DT: f32 = 1.0 / 60.0;

fn pool(log: Rc<RefCell<Vec<&'static str>>>) -> ControllerPrefabPool {
    let home = ControllerTemplate::new("Home", Home)
        .with_configuration(ViewControllerConfiguration::titled("A"))
        .shared();
    let mut pool = ControllerPrefabPool::new();
    pool.register_shared(home.clone())
        .register(
            ControllerTemplate::new("Detail", Detail::default())
                .with_configuration(ViewControllerConfiguration::titled("B")),
        )
        .register(ControllerTemplate::new("Recorder", Recorder { log }))
        .register(
            ControllerTemplate::new("Shell", Shell)
                .with_navigation(NavigationSettings::with_bar(home.clone())),
        )
        .register(
            ControllerTemplate::new("BareShell", BareShell)
                .with_navigation(NavigationSettings::bare(home).pop_floor(PopFloor::AllowEmpty)),
        );
    pool
}

fn window() -> Window {
    Window::new("nav", WindowConfig::default(), pool(Rc::default()))
}

fn settle(window: &mut Window) {
    for _ in 0..600 {
        if window.is_idle() {
            return;
        }
        window.advance(DT);
    }
    panic!("window did not settle");
}

/// Present a navigation controller of type `T` and let it push its root.
fn launch<T: ViewController>(window: &mut Window) -> ControllerId {
    let nav = window.present::<T>(false).unwrap();
    settle(window);
    assert_eq!(window.navigation_stack(nav).unwrap().depth(), 1);
    nav
}

fn bar(window: &Window, nav: ControllerId) -> NavigationBar {
    window
        .navigation_stack(nav)
        .unwrap()
        .navigation_bar()
        .unwrap()
        .clone()
}

// ---------------------------------------------------------------------------
// Chrome and teardown
// ---------------------------------------------------------------------------

#[test]
fn chrome_follows_the_top_controller() {
    let mut window = window();
    let nav = launch::<Shell>(&mut window);

    let root_bar = bar(&window, nav);
    assert!(root_bar.is_back_button_hidden());
    assert_eq!(root_bar.title(), "A");

    let b = window.push::<Detail>(nav, true).unwrap();
    let pushed_bar = bar(&window, nav);
    assert!(!pushed_bar.is_back_button_hidden());
    assert_eq!(pushed_bar.title(), "B");
    settle(&mut window);

    let alive_at_completion = Rc::new(Cell::new(false));
    let flag = alive_at_completion.clone();
    let popped = window.pop_with(
        nav,
        true,
        Some(Box::new(move |w: &mut Window| flag.set(w.is_alive(b)))),
    );
    assert_eq!(popped, Some(b));

    let popped_bar = bar(&window, nav);
    assert!(popped_bar.is_back_button_hidden());
    assert_eq!(popped_bar.title(), "A");
    assert!(window.is_alive(b), "destroyed before the hide transition");

    settle(&mut window);
    assert!(alive_at_completion.get(), "destroy ran before on_complete");
    assert!(!window.is_alive(b));
    assert_eq!(window.navigation_stack(nav).unwrap().depth(), 1);
}

#[test]
fn teardown_is_disappear_then_hide_then_destroy() {
    let mut window = window();
    let nav = launch::<Shell>(&mut window);
    let b = window.push::<Detail>(nav, true).unwrap();
    settle(&mut window);
    window.pop(nav, true).unwrap();
    settle(&mut window);

    let journal = window.journal();
    let disappear = journal
        .first_sequence(b, |k| matches!(k, NavigationEventKind::WillDisappear))
        .unwrap();
    let hidden = journal
        .first_sequence(b, |k| {
            matches!(k, NavigationEventKind::FadeFinished { opacity } if *opacity == 0.0)
        })
        .unwrap();
    let destroyed = journal
        .first_sequence(b, |k| {
            matches!(
                k,
                NavigationEventKind::Lifecycle {
                    to: LifecycleState::Destroyed,
                    ..
                }
            )
        })
        .unwrap();
    assert!(disappear < hidden && hidden < destroyed);
}

#[test]
fn hooks_fire_in_lifecycle_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut window = Window::new("nav", WindowConfig::default(), pool(log.clone()));
    let nav = launch::<Shell>(&mut window);

    let recorder = window.push::<Recorder>(nav, true).unwrap();
    settle(&mut window);
    window.pop(nav, true).unwrap();
    settle(&mut window);

    assert_eq!(
        *log.borrow(),
        vec![
            "will_load",
            "did_load",
            "enabled",
            "will_disappear",
            "disabled",
            "will_unload"
        ]
    );
    assert_eq!(
        window.journal().lifecycle_of(recorder),
        vec![
            LifecycleState::WillLoad,
            LifecycleState::DidLoad,
            LifecycleState::Enabled,
            LifecycleState::Disabled,
            LifecycleState::WillUnload,
            LifecycleState::Destroyed,
        ]
    );
}

#[test]
fn pushed_controllers_know_their_stack_and_fill_it() {
    let mut window = window();
    let nav = launch::<Shell>(&mut window);
    let b = window
        .push_with::<Detail, _>(nav, false, |d| d.item = 42, None)
        .unwrap();
    assert_eq!(window.navigation_controller(b), Some(nav));
    assert_eq!(window.controller::<Detail>(b).unwrap().item, 42);
    assert!(window.layout(b).unwrap().fills_parent());
    assert_eq!(window.controller_name(b), Some("Detail"));
}

// ---------------------------------------------------------------------------
// Re-entrancy
// ---------------------------------------------------------------------------

#[test]
fn push_while_transitioning_is_dropped() {
    let mut window = window();
    let nav = launch::<Shell>(&mut window);
    window.push::<Detail>(nav, true).unwrap();
    assert!(window.navigation_stack(nav).unwrap().is_transitioning());

    let count = window.controller_count();
    assert!(window.push::<Home>(nav, true).is_none());
    assert_eq!(
        window.try_push_with::<Home, _>(nav, false, |_| {}, None),
        Err(NovaError::Reentrant { operation: "push" })
    );
    assert!(window.pop(nav, true).is_none());
    assert_eq!(window.controller_count(), count);
    assert_eq!(window.navigation_stack(nav).unwrap().depth(), 2);

    settle(&mut window);
    assert!(!window.navigation_stack(nav).unwrap().is_transitioning());
    assert!(window.push::<Home>(nav, false).is_some());
}

#[test]
fn completion_may_start_the_next_push() {
    let mut window = window();
    let nav = launch::<Shell>(&mut window);
    window
        .push_with::<Detail, _>(
            nav,
            true,
            |_| {},
            Some(Box::new(move |w: &mut Window| {
                w.push::<Home>(nav, false);
            })),
        )
        .unwrap();
    settle(&mut window);
    assert_eq!(window.navigation_stack(nav).unwrap().depth(), 3);
}

// ---------------------------------------------------------------------------
// Pop floors
// ---------------------------------------------------------------------------

#[test]
fn keep_root_pop_is_an_idempotent_no_op() {
    let mut window = window();
    let nav = launch::<Shell>(&mut window);
    let before = window.capture_snapshot();

    assert_eq!(window.try_pop_with(nav, true, None), Ok(None));
    let once = window.capture_snapshot();
    assert!(window.pop(nav, false).is_none());
    let twice = window.capture_snapshot();

    assert_eq!(before.hash, once.hash);
    assert_eq!(once.hash, twice.hash);
}

#[test]
fn allow_empty_pops_the_root() {
    let mut window = window();
    let nav = launch::<BareShell>(&mut window);
    let root = window.navigation_stack(nav).unwrap().top().unwrap();

    assert_eq!(window.pop(nav, true), Some(root));
    settle(&mut window);
    assert!(!window.is_alive(root));
    assert!(window.navigation_stack(nav).unwrap().is_empty());

    assert!(window.pop(nav, true).is_none(), "empty stack pop is a no-op");
    assert!(window.push::<Detail>(nav, false).is_some());
    assert_eq!(window.navigation_stack(nav).unwrap().depth(), 1);
}

#[test]
fn window_default_floor_applies_to_stacks_without_one() {
    let config = WindowConfig {
        pop_floor: PopFloor::AllowEmpty,
        ..Default::default()
    };
    let mut window = Window::new("nav", config, pool(Rc::default()));
    let nav = launch::<Shell>(&mut window);
    assert_eq!(
        window.navigation_stack(nav).unwrap().pop_floor(),
        PopFloor::AllowEmpty
    );
    assert!(window.pop(nav, false).is_some());
    assert_eq!(window.navigation_stack(nav).unwrap().depth(), 0);
}

// ---------------------------------------------------------------------------
// Back button and hook-driven navigation
// ---------------------------------------------------------------------------

#[test]
fn tap_back_pops_when_the_action_is_bound() {
    let mut window = window();
    let nav = launch::<Shell>(&mut window);
    assert!(bar(&window, nav).is_back_action_bound());

    let b = window.push::<Detail>(nav, false).unwrap();
    assert_eq!(window.tap_back(nav), Some(b));
    settle(&mut window);
    assert!(!window.is_alive(b));

    let bare = launch::<BareShell>(&mut window);
    assert!(window.tap_back(bare).is_none(), "no chrome, nothing bound");
}

#[test]
fn did_load_hook_can_push() {
    let mut pool = pool(Rc::default());
    let auto = ControllerTemplate::new("Auto", AutoPusher).shared();
    pool.register_shared(auto.clone());
    pool.register(
        ControllerTemplate::new("AutoShell", BareShell)
            .with_navigation(NavigationSettings::bare(auto)),
    );
    let mut window = Window::new("nav", WindowConfig::default(), pool);

    // Lookup by type would find the first BareShell registration.
    let shell_template = window.pool().find_by_name("AutoShell").unwrap();
    let nav = window.present_template(shell_template, false).unwrap();
    settle(&mut window);

    let stack = window.navigation_stack(nav).unwrap();
    assert_eq!(stack.depth(), 2);
    let top = stack.top().unwrap();
    assert_eq!(window.controller::<Detail>(top).unwrap().item, 7);
}

#[test]
fn push_onto_plain_controller_fails() {
    let mut window = window();
    let home = window.present::<Home>(false).unwrap();
    assert_eq!(
        window.try_push_with::<Detail, _>(home, false, |_| {}, None),
        Err(NovaError::NotANavigationController { controller: home })
    );
    assert_eq!(window.controller_count(), 1);
}

#[test]
fn dismissing_the_shell_destroys_popped_children_too() {
    let mut window = window();
    let nav = launch::<Shell>(&mut window);
    let b = window.push::<Detail>(nav, false).unwrap();
    window.pop(nav, true).unwrap();
    assert!(window.is_alive(b), "still hiding");

    assert!(window.dismiss(nav, false));
    assert!(!window.is_alive(b));
    assert_eq!(window.controller_count(), 0);
}

#[test]
fn long_running_navigation_keeps_the_journal_bounded() {
    let config = WindowConfig {
        journal_capacity: Some(64),
        ..WindowConfig::default()
    };
    let mut window = Window::new("nav", config, pool(Rc::default()));
    let nav = launch::<Shell>(&mut window);

    for _ in 0..10_000 {
        window.push::<Detail>(nav, false).unwrap();
        window.pop(nav, false).unwrap();
    }

    assert_eq!(window.controller_count(), 2);
    let journal = window.journal();
    assert_eq!(journal.len(), 64);
    assert!(journal.evicted() > 60_000);

    // The retained tail is still the most recent history.
    let last = journal.all_events().last().unwrap();
    assert_eq!(
        last.kind,
        NavigationEventKind::Lifecycle {
            from: LifecycleState::WillUnload,
            to: LifecycleState::Destroyed,
        }
    );
}
