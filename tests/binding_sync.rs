//! Binding Synchronization Tests
//!
//! Attribute ↔ option synchronization on a single element:
//! - Initial notifications are deferred to the next tick
//! - Attribute writes are decoded, programmatic writes are encoded
//! - Rejected values never reach the cache
//! - Required options report missing values
//! - Defaults are restored when an attribute is removed

use std::cell::RefCell;
use std::rc::Rc;

use attrbind::events::{CHANGE, ERROR};
use attrbind::host::memory::MemoryDocument;
use attrbind::host::{AttributeStore, ElementId};
use attrbind::runtime::Scheduler;
use attrbind::{
    ApiEvent, Binding, BindingError, ChangeEvent, Collection, ErrorEvent, ErrorKind, HtmlApi,
    OptionDefinition, SchemaDefinition, TypeConstraint, Value,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    scheduler: Scheduler,
    doc: MemoryDocument,
    element: ElementId,
    // Keeps the binding attached
    _collection: Collection,
    binding: Binding,
    events: Rc<RefCell<Vec<ApiEvent>>>,
}

impl Fixture {
    fn changes(&self) -> Vec<ChangeEvent> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| e.as_change().cloned())
            .collect()
    }

    fn errors(&self) -> Vec<ErrorEvent> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| e.as_error().cloned())
            .collect()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.doc.get_attribute(self.element, name)
    }

    fn get(&self, option: &str) -> Option<Value> {
        self.binding.options().get(option).unwrap()
    }
}

fn setup(definition: SchemaDefinition, attributes: &[(&str, &str)]) -> Fixture {
    let scheduler = Scheduler::new();
    let doc = MemoryDocument::new(&scheduler);
    let element = doc.insert_element("div", attributes);

    let api = HtmlApi::define(definition).unwrap();
    let collection = api.attach(&doc.context(), element).unwrap();
    let binding = collection.for_element(element).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    for ty in [CHANGE, ERROR] {
        let sink = Rc::clone(&events);
        binding.on(ty, move |_, event| sink.borrow_mut().push(event.clone()));
    }

    Fixture {
        scheduler,
        doc,
        element,
        _collection: collection,
        binding,
        events,
    }
}

// =============================================================================
// Initial Notification Tests
// =============================================================================

/// The starting value is announced on the next tick, never synchronously.
#[test]
fn test_initial_change_is_deferred() {
    let f = setup(
        SchemaDefinition::new().option("label", TypeConstraint::String),
        &[("data-label", "hi")],
    );

    assert!(f.changes().is_empty());
    f.scheduler.run_until_idle();

    let changes = f.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].option, "label");
    assert_eq!(changes[0].value, Value::from("hi"));
    assert_eq!(changes[0].old_value, Value::Null);
    assert!(changes[0].initial);
}

/// An absent nullable option announces null.
#[test]
fn test_initial_change_for_absent_option() {
    let f = setup(
        SchemaDefinition::new().option("count", TypeConstraint::Number),
        &[],
    );
    f.scheduler.run_until_idle();

    let changes = f.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].value, Value::Null);
    assert!(changes[0].initial);
}

/// An attribute written before the tick replaces the initial notification.
#[test]
fn test_attribute_set_before_tick_suppresses_initial() {
    let f = setup(
        SchemaDefinition::new().option("count", TypeConstraint::Number),
        &[],
    );

    f.doc.set_attribute(f.element, "data-count", "5");
    f.scheduler.run_until_idle();

    let changes = f.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].value, Value::Number(5.0));
    assert_eq!(changes[0].old_value, Value::Null);
    assert!(!changes[0].initial);
}

/// A programmatic write before the tick replaces the initial notification.
#[test]
fn test_set_before_tick_suppresses_initial() {
    let f = setup(
        SchemaDefinition::new().option("label", TypeConstraint::String),
        &[],
    );

    f.binding.options().set("label", "a").unwrap();
    f.scheduler.run_until_idle();

    let changes = f.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].value, Value::from("a"));
    assert!(!changes[0].initial);
}

// =============================================================================
// Decoding Tests
// =============================================================================

/// A union decodes attribute text by specificity.
#[test]
fn test_union_decoding() {
    let f = setup(
        SchemaDefinition::new().option(
            "value",
            OptionDefinition::union([TypeConstraint::String, TypeConstraint::Number]),
        ),
        &[("data-value", "10")],
    );
    assert_eq!(f.get("value"), Some(Value::Number(10.0)));

    f.doc.set_attribute(f.element, "data-value", "abc");
    f.scheduler.run_until_idle();
    assert_eq!(f.get("value"), Some(Value::from("abc")));
}

/// Attribute text the option cannot decode is reported and ignored.
#[test]
fn test_invalid_attribute_is_rejected() {
    let f = setup(
        SchemaDefinition::new().option("count", TypeConstraint::Number),
        &[("data-count", "1")],
    );
    f.scheduler.run_until_idle();

    f.doc.set_attribute(f.element, "data-count", "abc");
    f.scheduler.run_until_idle();

    let errors = f.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::InvalidValueHtml);
    assert_eq!(errors[0].option.as_deref(), Some("count"));
    assert_eq!(errors[0].value, Some(Value::from("abc")));
    assert_eq!(f.get("count"), Some(Value::Number(1.0)));
}

/// Each record of a batch is published, decoded against the text it replaced.
#[test]
fn test_batched_attribute_writes() {
    let f = setup(
        SchemaDefinition::new().option("count", TypeConstraint::Number),
        &[],
    );
    f.scheduler.run_until_idle();
    f.events.borrow_mut().clear();

    f.doc.set_attribute(f.element, "data-count", "1");
    f.doc.set_attribute(f.element, "data-count", "2");
    f.scheduler.run_until_idle();

    let pairs: Vec<_> = f
        .changes()
        .into_iter()
        .map(|c| (c.value, c.old_value))
        .collect();
    assert_eq!(
        pairs,
        [
            (Value::Number(2.0), Value::Null),
            (Value::Number(2.0), Value::Number(1.0)),
        ]
    );
    assert_eq!(f.get("count"), Some(Value::Number(2.0)));
}

/// A record whose previous text cannot be decoded is rejected.
#[test]
fn test_undecodable_previous_text_is_rejected() {
    let f = setup(
        SchemaDefinition::new().option("count", TypeConstraint::Number),
        &[("data-count", "1")],
    );
    f.scheduler.run_until_idle();
    f.events.borrow_mut().clear();

    f.doc.set_attribute(f.element, "data-count", "abc");
    f.scheduler.run_until_idle();
    f.doc.set_attribute(f.element, "data-count", "3");
    f.scheduler.run_until_idle();

    let errors = f.errors();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.kind == ErrorKind::InvalidValueHtml));
    assert_eq!(errors[1].value, Some(Value::from("3")));
    assert!(f.changes().is_empty());
    assert_eq!(f.get("count"), Some(Value::Number(1.0)));
}

/// An external write landing after a programmatic one in the same batch is
/// still published.
#[test]
fn test_external_write_after_programmatic_write() {
    let f = setup(
        SchemaDefinition::new().option("count", TypeConstraint::Number),
        &[("data-count", "1")],
    );
    f.scheduler.run_until_idle();
    f.events.borrow_mut().clear();

    f.binding.options().set("count", 2).unwrap();
    f.doc.set_attribute(f.element, "data-count", "3");
    f.scheduler.run_until_idle();

    let pairs: Vec<_> = f
        .changes()
        .into_iter()
        .map(|c| (c.value, c.old_value))
        .collect();
    assert_eq!(
        pairs,
        [
            (Value::Number(2.0), Value::Number(1.0)),
            (Value::Number(3.0), Value::Number(2.0)),
        ]
    );
    assert_eq!(f.get("count"), Some(Value::Number(3.0)));
}

// =============================================================================
// Encoding Tests
// =============================================================================

/// A value no constraint accepts leaves cache and attribute untouched.
#[test]
fn test_invalid_programmatic_value() {
    let f = setup(
        SchemaDefinition::new().option("label", TypeConstraint::String),
        &[],
    );

    f.binding.options().set("label", 5).unwrap();

    let errors = f.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::InvalidValueJs);
    assert_eq!(errors[0].value, Some(Value::Number(5.0)));
    assert_eq!(f.get("label"), Some(Value::Null));
    assert_eq!(f.attribute("data-label"), None);
}

/// Arrays are written as JSON and read back unchanged.
#[test]
fn test_array_round_trip() {
    let f = setup(
        SchemaDefinition::new().option("tags", TypeConstraint::Array),
        &[],
    );
    let tags = Value::from_json(json!(["a", "b", "c"]));

    f.binding.options().set("tags", tags.clone()).unwrap();

    assert_eq!(f.attribute("data-tags").as_deref(), Some(r#"["a","b","c"]"#));
    assert_eq!(f.get("tags"), Some(tags));
}

/// Booleans map to attribute presence.
#[test]
fn test_boolean_presence() {
    let f = setup(
        SchemaDefinition::new().option("open", TypeConstraint::Bool),
        &[],
    );

    f.binding.options().set("open", true).unwrap();
    assert_eq!(f.attribute("data-open").as_deref(), Some(""));

    f.binding.options().set("open", false).unwrap();
    assert_eq!(f.attribute("data-open"), None);
    assert_eq!(f.get("open"), Some(Value::Bool(false)));

    f.scheduler.run_until_idle();
    let values: Vec<_> = f.changes().into_iter().map(|c| c.value).collect();
    assert_eq!(values, [Value::Bool(true), Value::Bool(false)]);
}

/// A programmatic write is published once, not again when its record arrives.
#[test]
fn test_programmatic_write_published_once() {
    let f = setup(
        SchemaDefinition::new().option("count", TypeConstraint::Number),
        &[("data-count", "1")],
    );
    f.scheduler.run_until_idle();
    f.events.borrow_mut().clear();

    f.binding.options().set("count", 2).unwrap();
    assert_eq!(f.changes().len(), 1);

    f.scheduler.run_until_idle();
    let changes = f.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].value, Value::Number(2.0));
    assert_eq!(changes[0].old_value, Value::Number(1.0));
    assert_eq!(f.attribute("data-count").as_deref(), Some("2"));
}

// =============================================================================
// Required and Default Tests
// =============================================================================

/// A required option without its attribute is reported on the next tick.
#[test]
fn test_missing_required_option() {
    let f = setup(
        SchemaDefinition::new().option("id", OptionDefinition::of(TypeConstraint::String).required()),
        &[],
    );
    assert_eq!(f.get("id"), None);

    f.scheduler.run_until_idle();

    let errors = f.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::MissingRequired);
    assert_eq!(errors[0].option.as_deref(), Some("id"));
}

/// Supplying the attribute before the tick cancels the missing report.
#[test]
fn test_required_option_supplied_before_tick() {
    let f = setup(
        SchemaDefinition::new().option("id", OptionDefinition::of(TypeConstraint::String).required()),
        &[],
    );

    f.doc.set_attribute(f.element, "data-id", "x");
    f.scheduler.run_until_idle();

    assert!(f.errors().is_empty());
    assert_eq!(f.get("id"), Some(Value::from("x")));
}

/// Removing a required option's attribute is rejected.
#[test]
fn test_required_option_cannot_be_unset() {
    let f = setup(
        SchemaDefinition::new().option("id", OptionDefinition::of(TypeConstraint::String).required()),
        &[("data-id", "x")],
    );

    f.binding.options().unset("id").unwrap();

    let errors = f.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::InvalidValueJs);
    assert_eq!(f.attribute("data-id").as_deref(), Some("x"));
    assert_eq!(f.get("id"), Some(Value::from("x")));
}

/// Removing a defaulted option's attribute restores the default.
#[test]
fn test_default_restored_on_removal() {
    let f = setup(
        SchemaDefinition::new().option(
            "size",
            OptionDefinition::of(TypeConstraint::String).with_default("small"),
        ),
        &[("data-size", "large")],
    );
    assert_eq!(f.get("size"), Some(Value::from("large")));
    f.scheduler.run_until_idle();
    f.events.borrow_mut().clear();

    f.doc.remove_attribute(f.element, "data-size");
    f.scheduler.run_until_idle();

    let changes = f.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].value, Value::from("small"));
    assert_eq!(changes[0].old_value, Value::from("large"));
    assert_eq!(f.attribute("data-size"), None);
}

/// `unset` behaves like removing the attribute.
#[test]
fn test_unset_restores_default() {
    let f = setup(
        SchemaDefinition::new().option(
            "size",
            OptionDefinition::of(TypeConstraint::String).with_default("small"),
        ),
        &[("data-size", "large")],
    );

    f.binding.options().unset("size").unwrap();

    assert_eq!(f.attribute("data-size"), None);
    assert_eq!(f.get("size"), Some(Value::from("small")));
}

/// A boolean default holds while the attribute is absent.
#[test]
fn test_boolean_default() {
    let f = setup(
        SchemaDefinition::new().option(
            "open",
            OptionDefinition::of(TypeConstraint::Bool).with_default(true),
        ),
        &[],
    );
    assert_eq!(f.get("open"), Some(Value::Bool(true)));

    f.binding.options().set("open", false).unwrap();
    assert_eq!(f.get("open"), Some(Value::Bool(false)));
    f.binding.options().unset("open").unwrap();
    assert_eq!(f.get("open"), Some(Value::Bool(true)));

    f.doc.set_attribute(f.element, "data-open", "false");
    f.scheduler.run_until_idle();
    assert_eq!(f.get("open"), Some(Value::Bool(false)));

    f.doc.remove_attribute(f.element, "data-open");
    f.scheduler.run_until_idle();
    assert_eq!(f.get("open"), Some(Value::Bool(true)));
    let last = f.changes().pop().unwrap();
    assert_eq!(last.value, Value::Bool(true));
    assert_eq!(last.old_value, Value::Bool(false));
}

// =============================================================================
// Destroy Tests
// =============================================================================

/// Destroying twice is harmless, and nothing is published afterwards.
#[test]
fn test_destroy_is_idempotent() {
    let f = setup(
        SchemaDefinition::new().option("label", TypeConstraint::String),
        &[],
    );

    f.binding.destroy();
    f.binding.destroy();
    f.doc.set_attribute(f.element, "data-label", "x");
    f.scheduler.run_until_idle();

    assert!(f.events.borrow().is_empty());
    assert!(f.binding.is_destroyed());
    assert_eq!(
        f.binding.options().set("label", "y"),
        Err(BindingError::Destroyed)
    );
}

/// Unknown options are misuse, not events.
#[test]
fn test_unknown_option() {
    let f = setup(
        SchemaDefinition::new().option("label", TypeConstraint::String),
        &[],
    );

    assert_eq!(
        f.binding.options().set("size", "x"),
        Err(BindingError::UnknownOption("size".to_string()))
    );
    assert!(f.events.borrow().is_empty());
}
