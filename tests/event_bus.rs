//! Event Bus Tests
//!
//! Delivery order and handler lifetime:
//! - Exact handlers, then wildcard, then one-shot exact, then one-shot wildcard
//! - One-shot handlers run once; skip counts delay delivery
//! - Handlers removed mid-emission do not run

use std::cell::RefCell;
use std::rc::Rc;

use attrbind::events::{EventBus, ListenerId, WILDCARD};

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &Log, label: &'static str) -> impl Fn(&str, &u32) + 'static {
    let log = Rc::clone(log);
    move |ty, payload| log.borrow_mut().push(format!("{}:{}:{}", label, ty, payload))
}

#[test]
fn test_delivery_order() {
    let bus = EventBus::new();
    let log = log();

    bus.once(WILDCARD, push(&log, "once-any"));
    bus.once("change", push(&log, "once"));
    bus.on_any(push(&log, "any"));
    bus.on("change", push(&log, "exact"));
    bus.on("error", push(&log, "other"));

    bus.emit("change", &1);

    assert_eq!(
        *log.borrow(),
        ["exact:change:1", "any:change:1", "once:change:1", "once-any:change:1"]
    );
}

#[test]
fn test_registration_order_within_group() {
    let bus = EventBus::new();
    let log = log();

    bus.on("change", push(&log, "a"));
    bus.on("change", push(&log, "b"));
    bus.on("change", push(&log, "c"));
    bus.emit("change", &7);

    assert_eq!(*log.borrow(), ["a:change:7", "b:change:7", "c:change:7"]);
}

#[test]
fn test_once_runs_once() {
    let bus = EventBus::new();
    let log = log();

    bus.once("change", push(&log, "once"));
    bus.emit("change", &1);
    bus.emit("change", &2);

    assert_eq!(*log.borrow(), ["once:change:1"]);
    assert_eq!(bus.listener_count("change"), 0);
}

#[test]
fn test_skip_counts() {
    let bus = EventBus::new();
    let log = log();

    bus.on_after("change", 2, push(&log, "after"));
    bus.once_skipping("change", 1, push(&log, "second"));
    for n in 1..=4 {
        bus.emit("change", &n);
    }

    assert_eq!(
        *log.borrow(),
        ["second:change:2", "after:change:3", "after:change:4"]
    );
}

#[test]
fn test_off() {
    let bus = EventBus::new();
    let log = log();

    let id = bus.on("change", push(&log, "a"));
    assert!(!bus.off("error", id));
    assert!(bus.off("change", id));
    assert!(!bus.off("change", id));

    bus.emit("change", &1);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_removal_during_emit() {
    let bus: EventBus<u32> = EventBus::new();
    let log = log();

    let later: Rc<RefCell<Option<ListenerId>>> = Rc::new(RefCell::new(None));
    {
        let remover = bus.clone();
        let later = Rc::clone(&later);
        bus.on("change", move |_, _| {
            if let Some(id) = *later.borrow() {
                remover.off("change", id);
            }
        });
    }
    *later.borrow_mut() = Some(bus.on("change", push(&log, "removed")));

    bus.emit("change", &1);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_clear_during_emit() {
    let bus: EventBus<u32> = EventBus::new();
    let log = log();

    {
        let inner = bus.clone();
        bus.on("change", move |_, _| inner.clear());
    }
    bus.on_any(push(&log, "any"));
    bus.once("change", push(&log, "once"));

    bus.emit("change", &1);
    assert!(log.borrow().is_empty());
    assert_eq!(bus.listener_count("change"), 0);
}

#[test]
fn test_handler_added_during_emit_waits() {
    let bus: EventBus<u32> = EventBus::new();
    let log = log();

    {
        let inner = bus.clone();
        let log = Rc::clone(&log);
        bus.once("change", move |_, _| {
            inner.on("change", push(&log, "late"));
        });
    }

    bus.emit("change", &1);
    assert!(log.borrow().is_empty());
    bus.emit("change", &2);
    assert_eq!(*log.borrow(), ["late:change:2"]);
}
