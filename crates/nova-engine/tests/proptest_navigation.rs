//! Property tests for push/pop sequences and fades.
//!
//! These tests use `proptest` to generate random sequences of navigation
//! operations interleaved with frames, and verify that stack invariants hold
//! after every step under both pop floors.

use nova_engine::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone, Default)]
struct Page;
impl ViewController for Page {}

#[derive(Debug, Clone, Default)]
struct Shell;
impl ViewController for Shell {}

#[derive(Debug, Clone)]
enum NavOp {
    Push { animated: bool },
    Pop { animated: bool },
    TapBack,
    Frames(u8),
}

fn nav_op_strategy() -> impl Strategy<Value = NavOp> {
    prop_oneof![
        any::<bool>().prop_map(|animated| NavOp::Push { animated }),
        any::<bool>().prop_map(|animated| NavOp::Pop { animated }),
        Just(NavOp::TapBack),
        (0..8u8).prop_map(NavOp::Frames),
    ]
}

fn floor_strategy() -> impl Strategy<Value = PopFloor> {
    prop_oneof![Just(PopFloor::KeepRoot), Just(PopFloor::AllowEmpty)]
}

fn launched(floor: PopFloor) -> (Window, ControllerId) {
    let page = ControllerTemplate::new("Page", Page)
        .with_configuration(ViewControllerConfiguration::titled("Page"))
        .shared();
    let mut pool = ControllerPrefabPool::new();
    pool.register_shared(page.clone()).register(
        ControllerTemplate::new("Shell", Shell)
            .with_navigation(NavigationSettings::with_bar(page).pop_floor(floor)),
    );
    let mut window = Window::new("prop", WindowConfig::default(), pool);
    let nav = window.present::<Shell>(false).unwrap();
    window.advance(1.0 / 60.0);
    (window, nav)
}

fn stack(window: &Window, nav: ControllerId) -> &NavigationStack {
    window.navigation_stack(nav).unwrap()
}

/// Every controller on the stack is alive, not unloading, and points back at
/// the stack; the chrome's back button matches the depth.
fn check_stack(window: &Window, nav: ControllerId) -> Result<(), TestCaseError> {
    let stack = stack(window, nav);
    for id in stack.controllers() {
        prop_assert!(window.is_alive(*id));
        let state = window.lifecycle(*id).unwrap();
        prop_assert!(!state.is_unloading());
        prop_assert_eq!(window.navigation_controller(*id), Some(nav));
    }
    if stack.depth() > 1 {
        prop_assert!(!stack.navigation_bar().unwrap().is_back_button_hidden());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn push_pop_sequences_keep_the_stack_consistent(
        floor in floor_strategy(),
        ops in prop::collection::vec(nav_op_strategy(), 1..40),
    ) {
        let (mut window, nav) = launched(floor);
        prop_assert_eq!(stack(&window, nav).depth(), 1);

        for op in &ops {
            let depth = stack(&window, nav).depth();
            let transitioning = stack(&window, nav).is_transitioning();
            let count = window.controller_count();

            match op {
                NavOp::Push { animated } => {
                    let pushed = window.push::<Page>(nav, *animated);
                    if transitioning {
                        prop_assert!(pushed.is_none());
                        prop_assert_eq!(stack(&window, nav).depth(), depth);
                        prop_assert_eq!(window.controller_count(), count);
                    } else {
                        let pushed = pushed.unwrap();
                        prop_assert_eq!(stack(&window, nav).depth(), depth + 1);
                        prop_assert_eq!(stack(&window, nav).top(), Some(pushed));
                    }
                }
                NavOp::Pop { animated } => {
                    let popped = window.pop(nav, *animated);
                    if transitioning || depth <= floor.min_depth() {
                        prop_assert!(popped.is_none());
                        prop_assert_eq!(stack(&window, nav).depth(), depth);
                    } else {
                        prop_assert!(popped.is_some());
                        prop_assert_eq!(stack(&window, nav).depth(), depth - 1);
                    }
                }
                NavOp::TapBack => {
                    let popped = window.tap_back(nav);
                    if popped.is_some() {
                        prop_assert_eq!(stack(&window, nav).depth(), depth - 1);
                    } else {
                        prop_assert_eq!(stack(&window, nav).depth(), depth);
                    }
                }
                NavOp::Frames(n) => {
                    for _ in 0..*n {
                        window.advance(1.0 / 60.0);
                    }
                }
            }

            prop_assert!(stack(&window, nav).depth() >= floor.min_depth());
            check_stack(&window, nav)?;
        }

        // Once everything settles, only the shell and its stack are alive.
        for _ in 0..600 {
            if window.is_idle() {
                break;
            }
            window.advance(1.0 / 60.0);
        }
        prop_assert!(window.is_idle());
        prop_assert!(!stack(&window, nav).is_transitioning());
        prop_assert_eq!(window.controller_count(), 1 + stack(&window, nav).depth());
    }

    #[test]
    fn journal_lifecycles_only_take_legal_edges(
        floor in floor_strategy(),
        ops in prop::collection::vec(nav_op_strategy(), 1..30),
    ) {
        let (mut window, nav) = launched(floor);
        for op in &ops {
            match op {
                NavOp::Push { animated } => { window.push::<Page>(nav, *animated); }
                NavOp::Pop { animated } => { window.pop(nav, *animated); }
                NavOp::TapBack => { window.tap_back(nav); }
                NavOp::Frames(n) => {
                    for _ in 0..*n {
                        window.advance(1.0 / 60.0);
                    }
                }
            }
        }
        window.dismiss(nav, false);
        prop_assert_eq!(window.controller_count(), 0);

        let journal = window.journal();
        let mut ids: Vec<ControllerId> = journal.all_events().map(|e| e.controller).collect();
        ids.sort();
        ids.dedup();
        for id in ids {
            let mut state = LifecycleState::Created;
            for next in journal.lifecycle_of(id) {
                prop_assert!(state.can_transition_to(next), "{} -> {}", state, next);
                state = next;
            }
            prop_assert_eq!(state, LifecycleState::Destroyed);
        }
    }

    #[test]
    fn fades_stay_in_range_and_land_on_the_accepted_target(
        requests in prop::collection::vec((0.0f32..=1.0, 0.05f32..1.0, 0..6u8), 1..20),
    ) {
        let mut pool = ControllerPrefabPool::new();
        pool.register(ControllerTemplate::new("Page", Page));
        let mut window = Window::new("fades", WindowConfig::default(), pool);
        let id = window.present::<Page>(false).unwrap();

        let mut expected = window.opacity(id).unwrap();
        for (target, duration, frames) in requests {
            let was_fading = window.is_fading(id);
            let accepted = window.fade_to(id, target, duration, None);
            prop_assert_eq!(accepted, !was_fading);
            if accepted {
                expected = target;
            }
            for _ in 0..frames {
                window.advance(1.0 / 60.0);
                let opacity = window.opacity(id).unwrap();
                prop_assert!((0.0..=1.0).contains(&opacity));
            }
        }
        while window.is_fading(id) {
            window.advance(1.0 / 60.0);
        }
        prop_assert_eq!(window.opacity(id), Some(expected));
    }
}
