//! Tests for the robot façade

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    AutomationError, Component, DisplayLock, EventMode, InputEvent, Key, MouseButton, Robot,
    Settings, Ui,
};

struct Harness {
    ui: Ui,
    robot: Robot,
    lock: Arc<DisplayLock>,
}

fn harness_with(settings: Settings) -> Harness {
    super::init_tracing();
    let ui = Ui::launch().unwrap();
    let lock = Arc::new(DisplayLock::new());
    let robot = ui.robot_with("test-session", settings, lock.clone()).unwrap();
    Harness { ui, robot, lock }
}

fn harness() -> Harness {
    harness_with(Settings::default())
}

/// Window with a button wired to flip a label from "before" to "after".
fn button_and_label(ui: &Ui) -> (Component, Component, Component) {
    let window = ui.registry().new_window("main");
    let button = Component::labeled("button", "go");
    let label = Component::labeled("label", "status").with_text("before");
    let (w, b, l) = (window.clone(), button.clone(), label.clone());
    ui.executor()
        .run(move || {
            let label_for_click = l.clone();
            b.on_click(move |_| label_for_click.set_text("after"));
            w.add_child(b.clone());
            w.add_child(l.clone());
            w.show();
            Ok(())
        })
        .unwrap();
    (window, button, label)
}

#[test]
fn click_settles_before_returning() {
    let h = harness();
    let (_window, button, label) = button_and_label(&h.ui);

    h.robot.click(&button, MouseButton::Left, 1).unwrap();

    // No waiting needed: once click returns, the UI is idle.
    assert_eq!(label.text().as_deref(), Some("after"));
    assert!(h.ui.is_idle());
}

#[test]
fn click_works_in_direct_event_mode() {
    let h = harness_with(Settings::default().with_event_mode(EventMode::Direct));
    let (_window, button, label) = button_and_label(&h.ui);

    h.robot.click(&button, MouseButton::Left, 1).unwrap();
    assert_eq!(label.text().as_deref(), Some("after"));
}

#[test]
fn click_grants_focus_to_the_target() {
    let h = harness();
    let (_window, button, _label) = button_and_label(&h.ui);

    h.robot.click(&button, MouseButton::Left, 1).unwrap();
    assert!(button.is_focused());
    assert_eq!(h.ui.registry().focus_owner(), Some(button));
}

#[test]
fn multi_click_reports_the_click_count() {
    let h = harness();
    let ui = &h.ui;
    let window = ui.registry().new_window("main");
    let button = Component::labeled("button", "go");
    let max_clicks = Arc::new(AtomicUsize::new(0));
    let (w, b, seen) = (window.clone(), button.clone(), max_clicks.clone());
    ui.executor()
        .run(move || {
            b.on_input(move |_, event| {
                if let InputEvent::MousePressed { clicks, .. } = event {
                    seen.fetch_max(*clicks as usize, Ordering::SeqCst);
                }
            });
            w.add_child(b.clone());
            w.show();
            Ok(())
        })
        .unwrap();

    h.robot.click(&button, MouseButton::Left, 2).unwrap();
    assert_eq!(max_clicks.load(Ordering::SeqCst), 2);
}

#[test]
fn zero_clicks_is_an_invalid_argument() {
    let h = harness();
    let (_window, button, _label) = button_and_label(&h.ui);
    assert!(matches!(
        h.robot.click(&button, MouseButton::Left, 0),
        Err(AutomationError::InvalidArgument(_))
    ));
}

#[test]
fn clicking_a_disposed_component_fails() {
    let h = harness();
    let (window, button, _label) = button_and_label(&h.ui);
    h.robot.close(&window).unwrap();
    assert!(matches!(
        h.robot.click(&button, MouseButton::Left, 1),
        Err(AutomationError::ComponentDisposed(_))
    ));
}

#[test]
fn key_events_reach_the_focus_owner() {
    let h = harness();
    let ui = &h.ui;
    let window = ui.registry().new_window("main");
    let field = Component::labeled("textfield", "input");
    let keys_seen: Arc<Mutex<Vec<InputEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let (w, f, seen) = (window.clone(), field.clone(), keys_seen.clone());
    ui.executor()
        .run(move || {
            f.on_input(move |_, event| {
                if matches!(
                    event,
                    InputEvent::KeyPressed { .. } | InputEvent::KeyReleased { .. }
                ) {
                    seen.lock().unwrap().push(event.clone());
                }
            });
            w.add_child(f.clone());
            w.show();
            Ok(())
        })
        .unwrap();

    h.robot.click(&field, MouseButton::Left, 1).unwrap();
    h.robot
        .press_and_release_keys(&[Key::ENTER, Key::TAB])
        .unwrap();

    let seen = keys_seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            InputEvent::KeyPressed { key: Key::ENTER },
            InputEvent::KeyReleased { key: Key::ENTER },
            InputEvent::KeyPressed { key: Key::TAB },
            InputEvent::KeyReleased { key: Key::TAB },
        ]
    );
}

#[test]
fn panicking_listener_does_not_wedge_the_event_loop() {
    let h = harness();
    let ui = &h.ui;
    let window = ui.registry().new_window("main");
    let button = Component::labeled("button", "boom");
    let (w, b) = (window.clone(), button.clone());
    ui.executor()
        .run(move || {
            b.on_click(|_| panic!("listener blew up"));
            w.add_child(b.clone());
            w.show();
            Ok(())
        })
        .unwrap();

    // Queued dispatch: the panic happens inside a raw posted job, not under
    // the executor, so the click itself still returns Ok.
    h.robot.click(&button, MouseButton::Left, 1).unwrap();

    // The loop thread survived and the pending count drained back to zero.
    assert!(h.ui.is_idle());
    let answer = ui.executor().call(|| Ok(42)).unwrap();
    assert_eq!(answer, 42);
}

#[test]
fn key_events_without_a_focus_owner_are_dropped() {
    let h = harness();
    // No click happened, nothing is focused; the robot still settles fine.
    h.robot.press_key(Key::SPACE).unwrap();
    h.robot.release_key(Key::SPACE).unwrap();
}

#[test]
fn move_mouse_delivers_coordinates() {
    let h = harness();
    let ui = &h.ui;
    let window = ui.registry().new_window("main");
    let canvas = Component::labeled("canvas", "surface");
    let last_position = Arc::new(Mutex::new(None));
    let (w, c, seen) = (window.clone(), canvas.clone(), last_position.clone());
    ui.executor()
        .run(move || {
            c.on_input(move |_, event| {
                if let InputEvent::MouseMoved { x, y } = event {
                    *seen.lock().unwrap() = Some((*x, *y));
                }
            });
            w.add_child(c.clone());
            w.show();
            Ok(())
        })
        .unwrap();

    h.robot.move_mouse(&canvas, 12, 34).unwrap();
    assert_eq!(*last_position.lock().unwrap(), Some((12, 34)));
}

#[test]
fn close_is_idempotent_on_a_disposed_window() {
    let h = harness();
    let (window, _button, _label) = button_and_label(&h.ui);

    h.robot.close(&window).unwrap();
    assert!(window.is_disposed());
    assert!(h.ui.registry().windows().is_empty());

    // Second close must swallow the already-disposed error.
    h.robot.close(&window).unwrap();
}

#[test]
fn clean_up_disposes_windows_and_releases_the_lock() {
    let h = harness();
    let (window, button, _label) = button_and_label(&h.ui);
    h.robot.click(&button, MouseButton::Left, 1).unwrap();

    h.robot.clean_up().unwrap();

    assert!(window.is_disposed());
    assert!(h.ui.registry().windows().is_empty());
    assert!(h.ui.registry().focus_owner().is_none());
    assert!(!h.lock.acquired_by("test-session"));

    // The display is free for the next session.
    let successor = h
        .ui
        .robot_with("next-session", Settings::default(), h.lock.clone())
        .unwrap();
    successor.clean_up().unwrap();
}

#[test]
fn second_owner_cannot_acquire_a_held_display() {
    let h = harness();
    let result = h
        .ui
        .robot_with("intruder", Settings::default(), h.lock.clone());
    match result {
        Err(AutomationError::ScreenBusy { held_by, .. }) => {
            assert_eq!(held_by, "test-session");
        }
        other => panic!("expected ScreenBusy, got {:?}", other.err()),
    }
}

#[test]
fn dropping_the_robot_releases_the_lock() {
    let ui = Ui::launch().unwrap();
    let lock = Arc::new(DisplayLock::new());
    {
        let _robot = ui
            .robot_with("short-lived", Settings::default(), lock.clone())
            .unwrap();
        assert!(lock.acquired_by("short-lived"));
    }
    assert!(lock.owner().is_none());
}
