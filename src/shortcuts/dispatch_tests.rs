use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::*;
use crate::settings::Settings;

const TIMEOUT: Duration = Duration::from_millis(1000);

/// Ids of executed actions, in execution order.
type ExecLog = Arc<Mutex<Vec<String>>>;

struct Fixture {
    registry: ShortcutRegistry,
    log: ExecLog,
    host: Arc<RecordingHost>,
}

/// Each entry is `(action, shortcut, handled)`. Executors record the action
/// id and report `handled`.
fn fixture_with(platform: Platform, bindings: &[(&str, &str, bool)]) -> Fixture {
    let mut actions = StaticActionRegistry::from_extensions(
        bindings
            .iter()
            .map(|(id, shortcut, _)| ActionExtension::new(*id).binding(Binding::new(*shortcut))),
    );
    let log: ExecLog = Arc::default();
    for &(action, _, handled) in bindings {
        let log = log.clone();
        let id = action.to_string();
        actions.set_executor(action, move || {
            let log = log.clone();
            let id = id.clone();
            async move {
                log.lock().push(id);
                handled
            }
        });
    }

    let host = Arc::new(RecordingHost::new());
    let registry = ShortcutRegistry::new(
        Arc::new(actions),
        Settings::new(),
        host.clone(),
        RegistryOptions {
            platform,
            key_timeout: TIMEOUT,
        },
    );
    Fixture {
        registry,
        log,
        host,
    }
}

fn fixture(bindings: &[(&str, &str, bool)]) -> Fixture {
    fixture_with(Platform::Linux, bindings)
}

fn chord_fixture() -> Fixture {
    fixture(&[
        ("multi.action", "Ctrl+K Ctrl+C", true),
        ("single.action", "Ctrl+K", true),
    ])
}

fn ctrl(key: &str) -> KeyEvent {
    KeyEvent::new(key, Modifiers::CTRL)
}

fn executed(log: &ExecLog) -> Vec<String> {
    log.lock().clone()
}

#[tokio::test(start_paused = true)]
async fn single_key_runs_handler() {
    let f = fixture(&[("foo.bar", "Ctrl+K", false)]);
    let calls = Arc::new(AtomicUsize::new(0));
    let handlers = {
        let calls = calls.clone();
        Handlers::new().on("foo.bar", move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            }
        })
    };

    let mut event = ctrl("k");
    let disposition = f.registry.handle_shortcut(&mut event, Some(&handlers)).await;

    assert_eq!(disposition, KeyDisposition::Handled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(executed(&f.log).is_empty());
    assert!(event.is_consumed());
    assert!(event.is_default_prevented());
    assert_eq!(f.registry.active_prefix(), None);
    assert_eq!(f.host.fired(), ["foo.bar"]);
}

#[tokio::test(start_paused = true)]
async fn chord_prefix_times_out_to_single_action() {
    let f = chord_fixture();

    let disposition = f.registry.handle_shortcut(&mut ctrl("k"), None).await;
    assert_eq!(disposition, KeyDisposition::AwaitingChord);
    assert!(f.registry.is_awaiting_chord());
    assert!(executed(&f.log).is_empty());

    tokio::time::sleep(TIMEOUT + Duration::from_millis(500)).await;

    assert_eq!(executed(&f.log), ["single.action"]);
    assert!(!f.registry.is_awaiting_chord());
    assert_eq!(f.host.fired(), ["single.action"]);
}

#[tokio::test(start_paused = true)]
async fn chord_completed_in_time_runs_only_chord_action() {
    let f = chord_fixture();

    f.registry.handle_shortcut(&mut ctrl("k"), None).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    let disposition = f.registry.handle_shortcut(&mut ctrl("c"), None).await;

    assert_eq!(disposition, KeyDisposition::Handled);
    assert_eq!(f.registry.active_prefix(), None);

    tokio::time::sleep(TIMEOUT * 2).await;
    assert_eq!(executed(&f.log), ["multi.action"]);
}

#[tokio::test(start_paused = true)]
async fn failed_chord_falls_back_to_prefix_alone() {
    let f = fixture(&[
        ("multi.action", "Ctrl+K Ctrl+C", false),
        ("single.action", "Ctrl+K", true),
    ]);

    f.registry.handle_shortcut(&mut ctrl("k"), None).await;
    let disposition = f.registry.handle_shortcut(&mut ctrl("c"), None).await;

    assert_eq!(disposition, KeyDisposition::Unhandled);
    assert_eq!(executed(&f.log), ["multi.action", "single.action"]);
    assert!(!f.registry.is_awaiting_chord());
}

#[tokio::test(start_paused = true)]
async fn repeated_prefix_resolves_previous_and_rearms() {
    let f = chord_fixture();

    f.registry.handle_shortcut(&mut ctrl("k"), None).await;
    let disposition = f.registry.handle_shortcut(&mut ctrl("k"), None).await;

    assert_eq!(disposition, KeyDisposition::AwaitingChord);
    assert_eq!(executed(&f.log), ["single.action"]);

    tokio::time::sleep(TIMEOUT + Duration::from_millis(1)).await;
    assert_eq!(executed(&f.log), ["single.action", "single.action"]);
}

#[tokio::test(start_paused = true)]
async fn timed_out_prefix_uses_captured_handlers() {
    let f = chord_fixture();
    let calls = Arc::new(AtomicUsize::new(0));
    let handlers = {
        let calls = calls.clone();
        Handlers::new().on("single.action", move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            }
        })
    };

    f.registry.handle_shortcut(&mut ctrl("k"), Some(&handlers)).await;
    tokio::time::sleep(TIMEOUT * 2).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(executed(&f.log).is_empty());
}

#[tokio::test(start_paused = true)]
async fn dispose_cancels_pending_chord() {
    let f = chord_fixture();

    f.registry.handle_shortcut(&mut ctrl("k"), None).await;
    f.registry.dispose();
    assert!(!f.registry.is_awaiting_chord());

    tokio::time::sleep(TIMEOUT * 2).await;
    assert!(executed(&f.log).is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_registry_cancels_pending_chord() {
    let Fixture { registry, log, .. } = chord_fixture();

    registry.handle_shortcut(&mut ctrl("k"), None).await;
    drop(registry);

    tokio::time::sleep(TIMEOUT * 2).await;
    assert!(executed(&log).is_empty());
}

#[tokio::test(start_paused = true)]
async fn first_successful_action_wins() {
    let f = fixture(&[
        ("first.action", "Ctrl+E", false),
        ("second.action", "Ctrl+E", true),
        ("third.action", "Ctrl+E", true),
    ]);

    let disposition = f.registry.handle_shortcut(&mut ctrl("e"), None).await;

    assert_eq!(disposition, KeyDisposition::Handled);
    assert_eq!(executed(&f.log), ["first.action", "second.action"]);
    assert_eq!(f.host.fired(), ["second.action"]);
}

#[tokio::test(start_paused = true)]
async fn unbound_keys_are_left_alone() {
    let f = fixture(&[("foo.bar", "Ctrl+K", true)]);

    let mut event = ctrl("j");
    let disposition = f.registry.handle_shortcut(&mut event, None).await;

    assert_eq!(disposition, KeyDisposition::Ignored);
    assert!(!event.is_consumed());
}

#[tokio::test(start_paused = true)]
async fn bare_modifier_is_ignored() {
    let f = fixture(&[("ctrl.action", "Ctrl+Control", true)]);

    let mut event = KeyEvent::new("Control", Modifiers::CTRL);
    let disposition = f.registry.handle_shortcut(&mut event, None).await;

    assert_eq!(disposition, KeyDisposition::Ignored);
    assert!(executed(&f.log).is_empty());
    assert!(!event.is_consumed());
}

#[tokio::test(start_paused = true)]
async fn typing_in_text_field_is_not_a_shortcut() {
    let f = fixture(&[
        ("letter.action", "K", true),
        ("undo.action", "Ctrl+Z", true),
        ("escape.action", "Esc", true),
    ]);

    let mut typed = KeyEvent::new("k", Modifiers::empty()).in_text_field();
    assert_eq!(
        f.registry.handle_shortcut(&mut typed, None).await,
        KeyDisposition::Ignored
    );
    let mut undo = ctrl("z").in_text_field();
    assert_eq!(
        f.registry.handle_shortcut(&mut undo, None).await,
        KeyDisposition::Ignored
    );
    assert!(executed(&f.log).is_empty());

    let mut escape = KeyEvent::new("Escape", Modifiers::empty()).in_text_field();
    assert_eq!(
        f.registry.handle_shortcut(&mut escape, None).await,
        KeyDisposition::Handled
    );
    let mut outside = KeyEvent::new("k", Modifiers::empty());
    assert_eq!(
        f.registry.handle_shortcut(&mut outside, None).await,
        KeyDisposition::Handled
    );
    assert_eq!(executed(&f.log), ["escape.action", "letter.action"]);
}

#[tokio::test(start_paused = true)]
async fn altgr_counts_as_text_on_windows_only() {
    let bindings = [("altgr.action", "Ctrl+Alt+Q", true)];

    let windows = fixture_with(Platform::Windows, &bindings);
    let mut event = KeyEvent::new("q", Modifiers::CTRL | Modifiers::ALT).in_text_field();
    assert_eq!(
        windows.registry.handle_shortcut(&mut event, None).await,
        KeyDisposition::Ignored
    );

    let linux = fixture_with(Platform::Linux, &bindings);
    let mut event = KeyEvent::new("q", Modifiers::CTRL | Modifiers::ALT).in_text_field();
    assert_eq!(
        linux.registry.handle_shortcut(&mut event, None).await,
        KeyDisposition::Handled
    );
}

#[tokio::test(start_paused = true)]
async fn modal_dialog_blocks_all_but_zoom() {
    let f = fixture(&[
        ("foo.bar", "Ctrl+K", true),
        ("inspector-main.zoom-in", "Ctrl++", true),
    ]);
    f.registry.set_modal_dialog_shown(true);

    let mut blocked = ctrl("k");
    assert_eq!(
        f.registry.handle_shortcut(&mut blocked, None).await,
        KeyDisposition::Blocked
    );
    assert!(blocked.is_consumed());

    let mut zoom = ctrl("+");
    assert_eq!(
        f.registry.handle_shortcut(&mut zoom, None).await,
        KeyDisposition::Handled
    );
    assert_eq!(executed(&f.log), ["inspector-main.zoom-in"]);

    f.registry.set_modal_dialog_shown(false);
    assert_eq!(
        f.registry.handle_shortcut(&mut ctrl("k"), None).await,
        KeyDisposition::Handled
    );
}

#[tokio::test(start_paused = true)]
async fn modal_dialog_skips_non_zoom_action_sharing_the_key() {
    let f = fixture(&[
        ("foo.bar", "Ctrl++", true),
        ("inspector-main.zoom-in", "Ctrl++", true),
    ]);
    f.registry.set_modal_dialog_shown(true);

    let mut event = ctrl("+");
    assert_eq!(
        f.registry.handle_shortcut(&mut event, None).await,
        KeyDisposition::Handled
    );
    assert_eq!(executed(&f.log), ["inspector-main.zoom-in"]);
    assert_eq!(f.host.fired(), ["inspector-main.zoom-in"]);
}

#[tokio::test(start_paused = true)]
async fn modal_dialog_does_not_arm_chords() {
    let f = fixture(&[
        ("inspector-main.zoom-reset", "Ctrl+0", true),
        ("chord.action", "Ctrl+0 Ctrl+1", true),
    ]);
    f.registry.set_modal_dialog_shown(true);

    assert_eq!(
        f.registry.handle_shortcut(&mut ctrl("0"), None).await,
        KeyDisposition::Handled
    );
    assert!(!f.registry.is_awaiting_chord());
    assert_eq!(executed(&f.log), ["inspector-main.zoom-reset"]);
}

#[tokio::test(start_paused = true)]
async fn handlers_run_in_order_until_one_handles() {
    let f = fixture(&[
        ("first.action", "Ctrl+E", true),
        ("second.action", "Ctrl+E", true),
    ]);
    let order: ExecLog = Arc::default();
    let record = |name: &'static str, handled: bool| {
        let order = order.clone();
        move || {
            let order = order.clone();
            async move {
                order.lock().push(name.to_string());
                handled
            }
        }
    };
    let handlers = Handlers::new()
        .on("first.action", record("h1", false))
        .on("second.action", record("h2", true));

    let disposition = f.registry.handle_shortcut(&mut ctrl("e"), Some(&handlers)).await;

    assert_eq!(disposition, KeyDisposition::Handled);
    assert_eq!(executed(&order), ["h1", "h2"]);
    assert!(executed(&f.log).is_empty());
    assert_eq!(f.host.fired(), ["second.action"]);
}

#[tokio::test(start_paused = true)]
async fn handler_reaches_action_filtered_out_by_context() {
    let actions = StaticActionRegistry::from_extensions([
        ActionExtension::new("panel.action").binding(Binding::new("Ctrl+P"))
    ]);
    actions.set_enabled("panel.action", false);
    let registry = ShortcutRegistry::new(
        Arc::new(actions),
        Settings::new(),
        Arc::new(NoopHost),
        RegistryOptions {
            platform: Platform::Linux,
            key_timeout: TIMEOUT,
        },
    );

    assert_eq!(
        registry.handle_shortcut(&mut ctrl("p"), None).await,
        KeyDisposition::Ignored
    );

    let handlers = Handlers::new().on("panel.action", || async { true });
    let listener = registry.add_shortcut_listener(handlers);
    assert!(listener.handlers().contains("panel.action"));
    assert_eq!(
        listener.on_key_down(&mut ctrl("p")).await,
        KeyDisposition::Handled
    );
}

#[tokio::test(start_paused = true)]
async fn raw_descriptor_dispatch_without_event() {
    let f = fixture(&[("foo.bar", "F5", true)]);
    let key = KeyDescriptor::parse("F5", Platform::Linux).unwrap();

    let disposition = f.registry.handle_key(key, "F5", None, None).await;

    assert_eq!(disposition, KeyDisposition::Handled);
    assert_eq!(executed(&f.log), ["foo.bar"]);
}
