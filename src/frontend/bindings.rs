use js_sys::{Array, Date, Function, Reflect};
use serde_json::json;
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    window, Element, Event, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, MouseEvent, Node,
};
use yew::Callback;

use super::dom::{self, Listener};
use super::services::{write_clipboard, HttpCounterSource, LocalStore};
use crate::config::{EnhancerConfig, REVEAL_SELECTOR};
use crate::counter::{fetch_visitor_count, CounterEndpoint, VisitorCount};
use crate::cursor::{CursorEvent, INTERACTIVE_SELECTOR};
use crate::logging::Logger;
use crate::menu::{MenuEvent, MenuState};
use crate::notify::EMAIL_COPIED;
use crate::page::{format_long_date, PublicationStats};
use crate::reveal::{Rect, RevealDecision, RevealGate, RevealOptions};
use crate::scroll::{
    anchor_scroll_target, compute_active_section, link_targets_section, scroll_to_top_visible,
    FrameGate, SectionBounds,
};
use crate::theme::{resolve_theme, toggle_theme, Theme};

const NAV_LINK_SELECTOR: &str = ".nav-link";
const SECTION_SELECTOR: &str = "section[id]";
const EMAIL_LINK_SELECTOR: &str = ".email a, .contact-item a[href^=\"mailto:\"]";
const LAZY_IMAGE_SELECTOR: &str = "img[data-src]";
const REVEAL_INDEX_ATTRIBUTE: &str = "data-reveal-index";

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// Everything the page controller registered on the static document.
/// Dropping it unregisters listeners and disconnects observers.
#[derive(Default)]
pub struct PageBindings {
    listeners: Vec<Listener>,
    observers: Vec<(IntersectionObserver, ObserverCallback)>,
    frame_callbacks: Vec<Rc<Closure<dyn FnMut(f64)>>>,
}

impl Drop for PageBindings {
    fn drop(&mut self) {
        for (observer, _) in &self.observers {
            observer.disconnect();
        }
    }
}

pub fn install(
    config: &EnhancerConfig,
    logger: Logger,
    notify: Callback<String>,
    cursor: Option<Callback<CursorEvent>>,
) -> PageBindings {
    let mut bindings = PageBindings::default();
    let menu = bind_menu(&mut bindings, config);

    bind_scroll_observer(&mut bindings, config);
    bind_anchor_links(&mut bindings, config, menu);
    bind_reveal(&mut bindings, config, logger);
    bind_lazy_images(&mut bindings);
    bind_theme_toggle(&mut bindings, logger, notify.clone());
    bind_email_copy(&mut bindings, config, logger, notify);
    if let Some(cursor) = cursor {
        bind_cursor(&mut bindings, cursor);
    }

    show_last_updated();
    log_publication_stats(logger);
    bind_page_load_timing(&mut bindings, logger);

    bindings
}

fn bind_scroll_observer(bindings: &mut PageBindings, config: &EnhancerConfig) {
    let Some(win) = window() else {
        return;
    };

    let sections: Vec<HtmlElement> = dom::query_all(SECTION_SELECTOR)
        .into_iter()
        .filter_map(|element| element.dyn_into::<HtmlElement>().ok())
        .collect();
    let links = dom::query_all(NAV_LINK_SELECTOR);
    let scroll_top_button = dom::html_element_by_id("scrollToTop");

    if (sections.is_empty() || links.is_empty()) && scroll_top_button.is_none() {
        return;
    }

    let lookahead = config.section_offset;
    let threshold = config.scroll_top_threshold;
    let update = move || {
        let scroll_y = dom::scroll_y();
        let bounds: Vec<SectionBounds> = sections
            .iter()
            .map(|section| SectionBounds {
                id: section.id(),
                top: f64::from(section.offset_top()),
                height: f64::from(section.offset_height()),
            })
            .collect();
        let active = compute_active_section(&bounds, scroll_y, lookahead);

        for link in &links {
            let is_active = link
                .get_attribute("href")
                .map(|href| link_targets_section(&href, active))
                .unwrap_or(false);
            dom::set_class(link, "active", is_active);
            let _ = if is_active {
                link.set_attribute("aria-current", "true")
            } else {
                link.remove_attribute("aria-current")
            };
        }

        if let Some(button) = &scroll_top_button {
            let display = if scroll_to_top_visible(scroll_y, threshold) {
                "block"
            } else {
                "none"
            };
            let _ = button.style().set_property("display", display);
        }
    };
    update();

    let gate = Rc::new(RefCell::new(FrameGate::default()));
    let on_frame = {
        let gate = gate.clone();
        Rc::new(Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
            gate.borrow_mut().complete();
            update();
        }))
    };

    let schedule = {
        let on_frame = on_frame.clone();
        move |_event: Event| {
            if !gate.borrow_mut().request() {
                return;
            }
            let requested = window().map(|w| {
                w.request_animation_frame((*on_frame).as_ref().unchecked_ref())
                    .is_ok()
            });
            if requested != Some(true) {
                gate.borrow_mut().complete();
            }
        }
    };

    bindings
        .listeners
        .push(Listener::new(&win, "scroll", schedule.clone()));
    bindings
        .listeners
        .push(Listener::new(&win, "resize", schedule));
    bindings.frame_callbacks.push(on_frame);

    if let Some(button) = dom::element_by_id("scrollToTop") {
        bindings.listeners.push(Listener::new(&button, "click", |_| {
            dom::smooth_scroll_to(0.0);
        }));
    }
}

struct MenuControls {
    toggle: Element,
    navbar: Element,
    state: Cell<MenuState>,
    breakpoint: f64,
}

impl MenuControls {
    fn apply(&self, event: MenuEvent) {
        let mut state = self.state.get();
        if !state.apply(event, self.breakpoint) {
            return;
        }
        self.state.set(state);

        let open = state.is_open();
        dom::set_class(&self.toggle, "active", open);
        dom::set_class(&self.navbar, "active", open);
        let _ = self
            .toggle
            .set_attribute("aria-expanded", if open { "true" } else { "false" });
        if let Some(body) = dom::body() {
            let _ = body.style().set_property("overflow", state.body_overflow());
        }
    }

    fn contains(&self, target: Option<&Node>) -> bool {
        self.navbar.contains(target) || self.toggle.contains(target)
    }
}

fn bind_menu(bindings: &mut PageBindings, config: &EnhancerConfig) -> Option<Rc<MenuControls>> {
    let menu = Rc::new(MenuControls {
        toggle: dom::element_by_id("mobileMenuToggle")?,
        navbar: dom::element_by_id("navbar")?,
        state: Cell::new(MenuState::default()),
        breakpoint: config.menu_breakpoint,
    });
    let _ = menu.toggle.set_attribute("aria-expanded", "false");

    {
        let menu_handle = menu.clone();
        bindings
            .listeners
            .push(Listener::new(&menu.toggle, "click", move |_| {
                menu_handle.apply(MenuEvent::Toggle);
            }));
    }

    if let Some(document) = dom::document() {
        let menu_handle = menu.clone();
        bindings
            .listeners
            .push(Listener::new(&document, "click", move |event: Event| {
                let target = event.target().and_then(|t| t.dyn_into::<Node>().ok());
                let inside_menu = menu_handle.contains(target.as_ref());
                menu_handle.apply(MenuEvent::DocumentClick { inside_menu });
            }));
    }

    if let Some(win) = window() {
        let menu_handle = menu.clone();
        bindings
            .listeners
            .push(Listener::new(&win, "resize", move |_| {
                let width = dom::viewport().width;
                menu_handle.apply(MenuEvent::Resized { width });
            }));
    }

    Some(menu)
}

fn bind_anchor_links(
    bindings: &mut PageBindings,
    config: &EnhancerConfig,
    menu: Option<Rc<MenuControls>>,
) {
    let gap = config.anchor_gap;

    for link in dom::query_all(NAV_LINK_SELECTOR) {
        let Some(target_id) = link
            .get_attribute("href")
            .and_then(|href| href.strip_prefix('#').map(ToString::to_string))
            .filter(|id| !id.is_empty())
        else {
            continue;
        };

        let menu = menu.clone();
        bindings
            .listeners
            .push(Listener::new(&link, "click", move |event: Event| {
                let Some(section) = dom::html_element_by_id(&target_id) else {
                    return;
                };
                event.prevent_default();

                let nav_height = dom::document()
                    .and_then(|d| d.query_selector("nav").ok().flatten())
                    .and_then(|nav| nav.dyn_into::<HtmlElement>().ok())
                    .map(|nav| f64::from(nav.offset_height()))
                    .unwrap_or(0.0);
                dom::smooth_scroll_to(anchor_scroll_target(
                    f64::from(section.offset_top()),
                    nav_height,
                    gap,
                ));

                if let Some(menu) = &menu {
                    menu.apply(MenuEvent::LinkFollowed);
                }
            }));
    }
}

fn reveal_element(element: &Element) {
    dom::set_style(element, "opacity", "1");
    dom::set_style(element, "transform", "translateY(0)");
    dom::set_class(element, "revealed", true);
}

fn bind_reveal(bindings: &mut PageBindings, config: &EnhancerConfig, logger: Logger) {
    let elements = dom::query_all(REVEAL_SELECTOR);
    if elements.is_empty() {
        return;
    }

    let mut gate = RevealGate::new(elements.len());

    if !dom::has_global("IntersectionObserver") {
        let revealed = gate.reveal_all();
        for index in &revealed {
            reveal_element(&elements[*index]);
        }
        logger.info("reveal_fallback", json!({ "elements": revealed.len() }));
        return;
    }

    let transition = format!(
        "opacity {ms}ms ease, transform {ms}ms ease",
        ms = config.reveal_duration_ms
    );
    let hidden_transform = format!("translateY({}px)", config.reveal_offset);
    for (index, element) in elements.iter().enumerate() {
        let _ = element.set_attribute(REVEAL_INDEX_ATTRIBUTE, &index.to_string());
        dom::set_style(element, "opacity", "0");
        dom::set_style(element, "transform", &hidden_transform);
        dom::set_style(element, "transition", &transition);
    }

    logger.debug("reveal_observing", json!({ "elements": gate.pending_count() }));
    let gate = Rc::new(RefCell::new(gate));
    let options = config.reveal;
    let callback = {
        let gate = gate.clone();
        ObserverCallback::new(move |entries: Array, observer: IntersectionObserver| {
            let viewport = dom::viewport();

            for entry in entries.iter() {
                let entry: IntersectionObserverEntry = entry.unchecked_into();
                let target = entry.target();
                let Some(index) = reveal_index(&target) else {
                    continue;
                };

                let bounds = entry.bounding_client_rect();
                let rect = Rect {
                    top: bounds.top(),
                    left: bounds.left(),
                    width: bounds.width(),
                    height: bounds.height(),
                };
                let decision = gate.borrow_mut().observe(index, rect, viewport, options);
                apply_reveal_decision(decision, &target, &observer);
            }
        })
    };

    let init = IntersectionObserverInit::new();
    let thresholds = Array::new();
    for ratio in [0.0, options.threshold, (options.threshold + 1.0) / 2.0, 1.0] {
        if !thresholds.includes(&JsValue::from_f64(ratio), 0) {
            thresholds.push(&JsValue::from_f64(ratio));
        }
    }
    init.set_threshold(&thresholds);
    init.set_root_margin(&options.root_margin());

    match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
        Ok(observer) => {
            for element in &elements {
                observer.observe(element);
            }
            bind_reveal_recheck(bindings, elements, gate, observer.clone(), options);
            bindings.observers.push((observer, callback));
        }
        Err(_) => {
            for element in &elements {
                reveal_element(element);
            }
            logger.warn(
                "reveal_fallback",
                json!({ "elements": elements.len(), "reason": "observer_rejected" }),
            );
        }
    }
}

fn reveal_index(element: &Element) -> Option<usize> {
    element
        .get_attribute(REVEAL_INDEX_ATTRIBUTE)
        .and_then(|value| value.parse::<usize>().ok())
}

fn apply_reveal_decision(
    decision: RevealDecision,
    target: &Element,
    observer: &IntersectionObserver,
) {
    match decision {
        RevealDecision::Reveal => {
            reveal_element(target);
            observer.unobserve(target);
        }
        RevealDecision::AlreadyRevealed => observer.unobserve(target),
        RevealDecision::Pending => {}
    }
}

// The observer only fires when the element's own ratio crosses a threshold,
// which a tall element may never do. Elements already touching the root are
// re-measured on scroll until they reveal or leave.
fn bind_reveal_recheck(
    bindings: &mut PageBindings,
    elements: Vec<Element>,
    gate: Rc<RefCell<RevealGate>>,
    observer: IntersectionObserver,
    options: RevealOptions,
) {
    let Some(win) = window() else {
        return;
    };

    let recheck = move |_event: Event| {
        let watched = gate.borrow().watched();
        if watched.is_empty() {
            return;
        }

        let viewport = dom::viewport();
        for index in watched {
            let Some(target) = elements.get(index) else {
                continue;
            };
            let bounds = target.get_bounding_client_rect();
            let rect = Rect {
                top: bounds.top(),
                left: bounds.left(),
                width: bounds.width(),
                height: bounds.height(),
            };
            let decision = gate.borrow_mut().observe(index, rect, viewport, options);
            apply_reveal_decision(decision, target, &observer);
        }
    };

    bindings
        .listeners
        .push(Listener::new(&win, "scroll", recheck.clone()));
    bindings
        .listeners
        .push(Listener::new(&win, "resize", recheck));
}

fn load_image(element: &Element) {
    if let Some(src) = element.get_attribute("data-src") {
        let _ = element.set_attribute("src", &src);
        let _ = element.remove_attribute("data-src");
    }
}

fn bind_lazy_images(bindings: &mut PageBindings) {
    let images = dom::query_all(LAZY_IMAGE_SELECTOR);
    if images.is_empty() {
        return;
    }

    if !dom::has_global("IntersectionObserver") {
        images.iter().for_each(load_image);
        return;
    }

    let callback = ObserverCallback::new(|entries: Array, observer: IntersectionObserver| {
        for entry in entries.iter() {
            let entry: IntersectionObserverEntry = entry.unchecked_into();
            if entry.is_intersecting() {
                let image = entry.target();
                load_image(&image);
                observer.unobserve(&image);
            }
        }
    });

    match IntersectionObserver::new(callback.as_ref().unchecked_ref()) {
        Ok(observer) => {
            for image in &images {
                observer.observe(image);
            }
            bindings.observers.push((observer, callback));
        }
        Err(_) => images.iter().for_each(load_image),
    }
}

fn apply_theme(theme: Theme) {
    let Some(document) = dom::document() else {
        return;
    };

    if let Some(root) = document.document_element() {
        let _ = root.set_attribute("data-theme", theme.as_str());
    }
    if let Some(body) = document.body() {
        dom::set_class(&body, "dark-mode", theme == Theme::Dark);
    }

    let Some(toggle) = document.get_element_by_id("themeToggle") else {
        return;
    };
    let _ = toggle.set_attribute("aria-label", &theme.toggle_label());
    let _ = toggle.set_attribute("aria-pressed", &theme.pressed().to_string());

    if let Some(icon) = toggle.query_selector(".theme-icon, i").ok().flatten() {
        let classes = icon.class_list();
        if classes.contains("fa-moon") || classes.contains("fa-sun") {
            dom::set_class(&icon, "fa-moon", theme == Theme::Light);
            dom::set_class(&icon, "fa-sun", theme == Theme::Dark);
        } else {
            icon.set_text_content(Some(theme.icon()));
        }
    }
}

fn apply_theme_with_transition(theme: Theme) {
    if dom::media_matches("(prefers-reduced-motion: reduce)") {
        apply_theme(theme);
        return;
    }

    let Some(document) = dom::document() else {
        apply_theme(theme);
        return;
    };

    let document_js: JsValue = document.into();
    let Some(start_view_transition) =
        Reflect::get(&document_js, &JsValue::from_str("startViewTransition"))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
    else {
        apply_theme(theme);
        return;
    };

    let callback = Closure::once_into_js(move || apply_theme(theme));
    if start_view_transition
        .call1(&document_js, &callback)
        .is_err()
    {
        apply_theme(theme);
    }
}

fn bind_theme_toggle(bindings: &mut PageBindings, logger: Logger, notify: Callback<String>) {
    let current = Rc::new(Cell::new(resolve_theme(&LocalStore)));
    apply_theme(current.get());

    let Some(toggle) = dom::element_by_id("themeToggle") else {
        return;
    };

    bindings
        .listeners
        .push(Listener::new(&toggle, "click", move |_| {
            let (next, persisted) = toggle_theme(current.get(), &LocalStore);
            current.set(next);
            apply_theme_with_transition(next);
            logger.info(
                "theme_changed",
                json!({ "theme": next.as_str(), "persisted": persisted }),
            );
            notify.emit(next.notice().to_string());
        }));
}

fn email_for_link(config: &EnhancerConfig, link: &Element) -> Option<String> {
    if let Some(email) = &config.email {
        return Some(email.clone());
    }

    link.get_attribute("href")
        .and_then(|href| {
            href.strip_prefix("mailto:")
                .map(|rest| rest.split('?').next().unwrap_or(rest).to_string())
        })
        .or_else(|| link.text_content())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn copy_email(address: String, logger: Logger, notify: Callback<String>) {
    spawn_local(async move {
        match write_clipboard(&address).await {
            Ok(()) => notify.emit(EMAIL_COPIED.to_string()),
            Err(error) => logger.warn("clipboard_failed", json!({ "reason": error.as_str() })),
        }
    });
}

fn bind_email_copy(
    bindings: &mut PageBindings,
    config: &EnhancerConfig,
    logger: Logger,
    notify: Callback<String>,
) {
    for link in dom::query_all(EMAIL_LINK_SELECTOR) {
        let Some(address) = email_for_link(config, &link) else {
            continue;
        };
        let notify = notify.clone();
        bindings
            .listeners
            .push(Listener::new(&link, "contextmenu", move |event: Event| {
                event.prevent_default();
                copy_email(address.clone(), logger, notify.clone());
            }));
    }

    let Some(button) = dom::element_by_id("copyEmail") else {
        return;
    };
    let address = config.email.clone().or_else(|| {
        button
            .get_attribute("data-email")
            .filter(|value| !value.trim().is_empty())
    });
    let Some(address) = address else {
        return;
    };

    bindings
        .listeners
        .push(Listener::new(&button, "click", move |event: Event| {
            event.prevent_default();
            copy_email(address.clone(), logger, notify.clone());
        }));
}

fn bind_cursor(bindings: &mut PageBindings, cursor: Callback<CursorEvent>) {
    let Some(document) = dom::document() else {
        return;
    };
    if let Some(body) = document.body() {
        dom::set_class(&body, "has-custom-cursor", true);
    }

    {
        let cursor = cursor.clone();
        bindings
            .listeners
            .push(Listener::new(&document, "mousemove", move |event: Event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    cursor.emit(CursorEvent::Moved {
                        x: f64::from(event.client_x()),
                        y: f64::from(event.client_y()),
                    });
                }
            }));
    }
    {
        let cursor = cursor.clone();
        bindings
            .listeners
            .push(Listener::new(&document, "mouseover", move |event: Event| {
                let interactive = event
                    .target()
                    .and_then(|target| target.dyn_into::<Element>().ok())
                    .and_then(|element| element.closest(INTERACTIVE_SELECTOR).ok().flatten())
                    .is_some();
                cursor.emit(CursorEvent::HoverChanged { interactive });
            }));
    }
    for (event_name, pressed) in [("mousedown", true), ("mouseup", false)] {
        let cursor = cursor.clone();
        bindings
            .listeners
            .push(Listener::new(&document, event_name, move |_| {
                cursor.emit(CursorEvent::Pressed(pressed));
            }));
    }
    if let Some(root) = document.document_element() {
        bindings
            .listeners
            .push(Listener::new(&root, "mouseleave", move |_| {
                cursor.emit(CursorEvent::Left);
            }));
    }
}

fn show_last_updated() {
    let Some(element) = dom::element_by_id("lastUpdated") else {
        return;
    };

    let today = Date::new_0();
    let formatted = format_long_date(
        today.get_full_year() as i32,
        today.get_month(),
        today.get_date(),
    );
    if let Some(formatted) = formatted {
        element.set_text_content(Some(&formatted));
    }
}

fn log_publication_stats(logger: Logger) {
    let has_status: Vec<bool> = dom::query_all(".publication-item")
        .iter()
        .map(|item| item.query_selector(".status").ok().flatten().is_some())
        .collect();
    if has_status.is_empty() {
        return;
    }

    let under_review = dom::query_all(".pub-link.status").len();
    let stats = PublicationStats::from_items(&has_status, under_review);
    logger.info("publication_stats", stats.log_fields());
}

fn log_load_time(logger: Logger) {
    let load_time_ms = window()
        .and_then(|w| w.performance())
        .map(|performance| performance.now().round() as u64);
    logger.info("page_loaded", json!({ "load_time_ms": load_time_ms }));
}

fn bind_page_load_timing(bindings: &mut PageBindings, logger: Logger) {
    let already_loaded = dom::document()
        .map(|document| document.ready_state() == "complete")
        .unwrap_or(false);
    if already_loaded {
        log_load_time(logger);
        return;
    }

    if let Some(win) = window() {
        bindings
            .listeners
            .push(Listener::new(&win, "load", move |_| log_load_time(logger)));
    }
}

/// One increment per page load, written into `#visitorCount`.
pub async fn load_visitor_count(endpoint: Option<CounterEndpoint>, logger: Logger) {
    let Some(element) = dom::element_by_id("visitorCount") else {
        return;
    };

    let count = match endpoint {
        Some(endpoint) => fetch_visitor_count(&HttpCounterSource, &endpoint, &logger).await,
        None => {
            logger.warn("counter_unavailable", json!({ "reason": "no_endpoint" }));
            VisitorCount::Unavailable
        }
    };
    element.set_text_content(Some(&count.display_text()));
}
