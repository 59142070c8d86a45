mod bindings;
mod dom;
mod services;

use gloo_timers::callback::Timeout;
use serde_json::json;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::config::EnhancerConfig;
use crate::cursor::{CursorEvent, CursorState};
use crate::logging::Logger;
use crate::notify::{Notification, NotificationSlot, NotificationTimings};

const OVERLAY_STYLES: &str = r#"
@keyframes slideIn {
    from { transform: translateX(100%); opacity: 0; }
    to { transform: translateX(0); opacity: 1; }
}
@keyframes slideOut {
    from { transform: translateX(0); opacity: 1; }
    to { transform: translateX(100%); opacity: 0; }
}
.toast {
    position: fixed;
    bottom: 80px;
    right: 20px;
    background-color: #27ae60;
    color: #fff;
    padding: 12px 20px;
    border-radius: 5px;
    box-shadow: 0 2px 10px rgba(0, 0, 0, 0.2);
    z-index: 1000;
}
.toast--entering { animation: slideIn var(--toast-enter-ms) ease forwards; }
.toast--exiting { animation: slideOut var(--toast-exit-ms) ease forwards; }
body.has-custom-cursor, body.has-custom-cursor a, body.has-custom-cursor button { cursor: none; }
.cursor-dot, .cursor-ring {
    position: fixed;
    top: 0;
    left: 0;
    pointer-events: none;
    z-index: 2000;
    border-radius: 50%;
    opacity: 0;
    transition: opacity 0.2s ease;
}
.cursor-dot { width: 8px; height: 8px; margin: -4px 0 0 -4px; background: #3498db; }
.cursor-ring {
    width: 32px;
    height: 32px;
    margin: -16px 0 0 -16px;
    border: 2px solid #3498db;
    transition: opacity 0.2s ease, transform 0.12s ease-out, width 0.2s ease, height 0.2s ease, margin 0.2s ease;
}
.cursor-ring.is-hovering { width: 48px; height: 48px; margin: -24px 0 0 -24px; }
.cursor-ring.is-pressed { width: 24px; height: 24px; margin: -12px 0 0 -12px; }
.cursor-dot.is-visible, .cursor-ring.is-visible { opacity: 1; }
"#;

pub enum ToastAction {
    Show(String),
    Advance(u64),
}

impl Reducible for NotificationSlot {
    type Action = ToastAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            ToastAction::Show(message) => {
                next.show(message);
            }
            ToastAction::Advance(id) => {
                if next.advance(id).is_none() {
                    return self;
                }
            }
        }
        Rc::new(next)
    }
}

impl Reducible for CursorState {
    type Action = CursorEvent;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = *self;
        next.apply(action);
        if next == *self {
            return self;
        }
        Rc::new(next)
    }
}

#[derive(Properties, PartialEq)]
struct EnhancerProps {
    config: Rc<EnhancerConfig>,
}

fn render_toast(notification: &Notification, timings: NotificationTimings) -> Html {
    let style = format!(
        "--toast-enter-ms: {}ms; --toast-exit-ms: {}ms;",
        timings.enter_ms, timings.exit_ms
    );

    html! {
        <div
            key={notification.id.to_string()}
            class={classes!("toast", notification.phase.class_name())}
            style={style}
            role="status"
        >
            {notification.message.clone()}
        </div>
    }
}

/// Page controller: owns the notification slot and cursor state, and keeps
/// the static page bound for as long as it is mounted.
#[function_component(Enhancer)]
fn enhancer(props: &EnhancerProps) -> Html {
    let config = props.config.clone();
    let logger = Logger::new(config.log_level);
    let notifications = {
        let timings = config.toast;
        use_reducer(move || NotificationSlot::new(timings))
    };
    let cursor = use_reducer(CursorState::default);
    let cursor_enabled = {
        let enabled = config.custom_cursor;
        use_state(move || enabled && dom::media_matches("(pointer: fine)"))
    };

    {
        let notify = {
            let dispatcher = notifications.dispatcher();
            Callback::from(move |message: String| dispatcher.dispatch(ToastAction::Show(message)))
        };
        let on_cursor = (*cursor_enabled).then(|| {
            let dispatcher = cursor.dispatcher();
            Callback::from(move |event: CursorEvent| dispatcher.dispatch(event))
        });
        let config = config.clone();

        use_effect_with((), move |_| {
            let bindings = bindings::install(&config, logger, notify, on_cursor);
            spawn_local(bindings::load_visitor_count(config.counter.clone(), logger));
            move || drop(bindings)
        });
    }

    // One pending timer for the live notification. A new id or phase drops the
    // previous `Timeout`, which cancels it.
    let timings = notifications.timings();
    {
        let dispatcher = notifications.dispatcher();
        let live = notifications
            .current()
            .map(|notification| (notification.id, notification.phase));

        use_effect_with(live, move |live| {
            let timer = (*live).and_then(|(id, phase)| {
                let delay = timings.phase_duration(phase)?;
                Some(Timeout::new(delay, move || {
                    dispatcher.dispatch(ToastAction::Advance(id));
                }))
            });
            move || drop(timer)
        });
    }

    html! {
        <>
            <style>{OVERLAY_STYLES}</style>
            <div class="toast-region" aria-live="polite">
                { for notifications.current().map(|notification| render_toast(notification, timings)) }
            </div>
            if *cursor_enabled {
                <>
                <div
                    class={classes!("cursor-dot", cursor.visible.then_some("is-visible"))}
                    style={cursor.transform()}
                    aria-hidden="true"
                />
                <div
                    class={classes!(
                        "cursor-ring",
                        cursor.visible.then_some("is-visible"),
                        cursor.hovering.then_some("is-hovering"),
                        cursor.pressed.then_some("is-pressed")
                    )}
                    style={cursor.transform()}
                    aria-hidden="true"
                />
                </>
            }
        </>
    }
}

pub fn run() {
    let config = Rc::new(EnhancerConfig::from_lookup(dom::config_attribute));
    let logger = Logger::new(config.log_level);

    let Some(root) = dom::mount_point() else {
        logger.warn("mount_point_unavailable", json!({}));
        return;
    };

    logger.info(
        "enhancer_started",
        json!({
            "section_offset": config.section_offset,
            "menu_breakpoint": config.menu_breakpoint,
            "counter": config.counter.as_ref().map(|counter| counter.hit_url().to_string()),
            "custom_cursor": config.custom_cursor,
        }),
    );

    yew::Renderer::<Enhancer>::with_root_and_props(root, EnhancerProps { config }).render();
}
