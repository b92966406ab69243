//! Per-element bindings
//!
//! A [`Binding`] keeps one element's attributes and a typed value cache in
//! sync, in both directions.
//!
//! # Lifecycle
//!
//! Each option moves through `Uninitialized → Seeded → Live`:
//!
//! - **Seeding** (synchronous, on attach): a present attribute is decoded
//!   and a failure aborts the attach. An absent attribute reads as the
//!   default, else as what absence decodes to (`null`, `false`). A required
//!   option without its attribute gets no cached value and a deferred
//!   `missing-required` error.
//! - **Initial notification**: every option gets a deferred
//!   `change { initial: true, old_value: null }`. An accepted change of the
//!   option before the tick cancels it, so an initial notification never
//!   follows a real one.
//! - **Live**: each attribute record is decoded from the current text and
//!   the record's previous text, and discarded when the two are equal.
//!   Programmatic writes publish synchronously; their own records are
//!   recognized on arrival and not published twice, and records delivered
//!   ahead of them are superseded.
//!
//! # Invariants
//!
//! 1. A rejected value never touches the cache; a rejected programmatic
//!    value never touches the attribute either.
//! 2. No `RefCell` borrow is held while events are emitted.
//! 3. After `destroy`, no task, watch record or event reaches listeners.

mod errors;
mod options;

pub use errors::{BindingError, BindingResult};
pub use options::{OptionAccessor, Options};

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use uuid::Uuid;

use crate::codec::{CodecError, CodecResult, ValueCodec};
use crate::collection::{AttachError, AttachResult};
use crate::events::{change_type, ApiEvent, ChangeEvent, ErrorEvent, ErrorKind, EventBus, ListenerId, CHANGE, ERROR};
use crate::host::{AttributeRecord, AttributeStore, AttributeWatch, ElementId, HostContext, WatchHandle};
use crate::observability::{log_event_with_fields, Event};
use crate::runtime::TaskHandle;
use crate::schema::{OptionSpec, Schema};
use crate::types::Value;

#[derive(Default)]
struct BindingState {
    /// Cached values; a missing entry is an absent required option
    values: HashMap<String, Value>,
    /// Previous text of each attribute write this binding made whose
    /// record has not been delivered yet, oldest first
    own_writes: HashMap<String, VecDeque<Option<String>>>,
    initials: HashMap<String, TaskHandle>,
    missing: HashMap<String, TaskHandle>,
    watch: Option<Box<dyn WatchHandle>>,
    destroyed: bool,
}

pub(crate) struct BindingInner {
    id: Uuid,
    element: ElementId,
    schema: Rc<Schema>,
    ctx: HostContext,
    bus: EventBus<ApiEvent>,
    options: Options,
    state: RefCell<BindingState>,
}

/// Live synchronization of one schema on one element.
///
/// Cloning yields another handle to the same binding.
#[derive(Clone)]
pub struct Binding {
    inner: Rc<BindingInner>,
}

/// What an absent attribute reads as for this option
fn absent_value(spec: &OptionSpec) -> CodecResult<Value> {
    match spec.default_value() {
        Some(default) => Ok(default.clone()),
        None => ValueCodec::decode(spec, None),
    }
}

/// Value an attribute record's previous text stood for.
///
/// A required option with no previous text had no value yet.
fn previous_value(spec: &OptionSpec, text: Option<&str>) -> CodecResult<Value> {
    match text {
        Some(text) => ValueCodec::decode(spec, Some(text)),
        None if spec.is_required() => Ok(Value::Null),
        None => absent_value(spec),
    }
}

impl Binding {
    /// Seed the cache from `element`'s attributes and start watching them.
    ///
    /// # Errors
    ///
    /// `AttachError::InitialValue` if a present attribute fails to decode.
    pub fn attach(schema: Rc<Schema>, ctx: &HostContext, element: ElementId) -> AttachResult<Self> {
        let host = ctx.host();
        let mut state = BindingState::default();
        let mut missing = Vec::new();

        for spec in schema.iter() {
            let text = host.get_attribute(element, spec.attribute());
            let seeded = match &text {
                Some(text) => ValueCodec::decode(spec, Some(text.as_str())).map(Some),
                None if spec.is_required() => Ok(None),
                None => absent_value(spec).map(Some),
            };
            match seeded {
                Ok(Some(value)) => {
                    state.values.insert(spec.name().to_string(), value);
                }
                Ok(None) => missing.push(spec.name().to_string()),
                Err(err) => {
                    return Err(AttachError::InitialValue {
                        element,
                        option: spec.name().to_string(),
                        message: err.to_string(),
                    })
                }
            }
        }

        let inner = Rc::new_cyclic(|weak: &Weak<BindingInner>| BindingInner {
            id: Uuid::new_v4(),
            element,
            options: Options::build(schema.names(), weak),
            schema: Rc::clone(&schema),
            ctx: ctx.clone(),
            bus: EventBus::new(),
            state: RefCell::new(state),
        });

        let weak = Rc::downgrade(&inner);
        let watch = host.watch_attributes(
            element,
            schema.attribute_names(),
            Rc::new(move |records: Vec<AttributeRecord>| {
                if let Some(inner) = weak.upgrade() {
                    for record in &records {
                        inner.handle_record(record);
                    }
                }
            }),
        );
        inner.state.borrow_mut().watch = Some(watch);

        for spec in schema.iter() {
            inner.schedule_initial(spec.name());
        }
        for name in missing {
            inner.schedule_missing(&name);
        }

        let id = inner.id.to_string();
        let element = element.to_string();
        log_event_with_fields(
            Event::BindingAttached,
            &[("binding", id.as_str()), ("element", element.as_str())],
        );

        Ok(Self { inner })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn element(&self) -> ElementId {
        self.inner.element
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Options accessor table
    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub fn on(&self, ty: &str, handler: impl Fn(&str, &ApiEvent) + 'static) -> ListenerId {
        self.inner.bus.on(ty, handler)
    }

    pub fn on_any(&self, handler: impl Fn(&str, &ApiEvent) + 'static) -> ListenerId {
        self.inner.bus.on_any(handler)
    }

    pub fn on_after(&self, ty: &str, skip: usize, handler: impl Fn(&str, &ApiEvent) + 'static) -> ListenerId {
        self.inner.bus.on_after(ty, skip, handler)
    }

    pub fn once(&self, ty: &str, handler: impl Fn(&str, &ApiEvent) + 'static) -> ListenerId {
        self.inner.bus.once(ty, handler)
    }

    pub fn once_skipping(&self, ty: &str, skip: usize, handler: impl Fn(&str, &ApiEvent) + 'static) -> ListenerId {
        self.inner.bus.once_skipping(ty, skip, handler)
    }

    pub fn off(&self, ty: &str, id: ListenerId) -> bool {
        self.inner.bus.off(ty, id)
    }

    /// Cancel pending notifications, stop watching and drop every listener.
    ///
    /// Idempotent.
    pub fn destroy(&self) {
        self.inner.teardown();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.state.borrow().destroyed
    }

    /// Whether two handles refer to the same binding
    pub fn ptr_eq(&self, other: &Binding) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.inner.id)
            .field("element", &self.inner.element)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl BindingInner {
    pub(crate) fn cached(&self, option: &str) -> Option<Value> {
        self.state.borrow().values.get(option).cloned()
    }

    fn spec(&self, option: &str) -> BindingResult<&OptionSpec> {
        self.schema
            .get(option)
            .ok_or_else(|| BindingError::UnknownOption(option.to_string()))
    }

    /// Programmatic write
    pub(crate) fn write(&self, option: &str, value: Value) -> BindingResult<()> {
        let spec = self.spec(option)?;
        if self.state.borrow().destroyed {
            return Err(BindingError::Destroyed);
        }

        match ValueCodec::encode(spec, Some(&value)) {
            Ok(text) => self.commit(spec, text, value),
            Err(err) => self.reject_program_value(spec, Some(value), &err),
        }
        Ok(())
    }

    /// Programmatic removal
    pub(crate) fn remove(&self, option: &str) -> BindingResult<()> {
        let spec = self.spec(option)?;
        if self.state.borrow().destroyed {
            return Err(BindingError::Destroyed);
        }

        if spec.is_required() {
            self.reject_program_value(spec, None, &CodecError::InvalidRemoval);
            return Ok(());
        }
        match absent_value(spec) {
            Ok(value) => self.commit(spec, None, value),
            Err(err) => self.reject_program_value(spec, None, &err),
        }
        Ok(())
    }

    /// Write `text` to the attribute (removing it for `None`) and cache `value`
    fn commit(&self, spec: &OptionSpec, text: Option<String>, value: Value) {
        let host = self.ctx.host();
        let current = host.get_attribute(self.element, spec.attribute());
        let text_changed = current != text;

        if text_changed {
            self.state
                .borrow_mut()
                .own_writes
                .entry(spec.name().to_string())
                .or_default()
                .push_back(current);
            match &text {
                Some(text) => host.set_attribute(self.element, spec.attribute(), text),
                None => host.remove_attribute(self.element, spec.attribute()),
            }
        }

        let old_value = self.accept(spec.name(), value.clone());
        if text_changed || old_value.as_ref() != Some(&value) {
            self.emit_change(spec.name(), value, old_value.unwrap_or(Value::Null), false);
        }
    }

    /// Store an accepted value, cancelling pending synthetic events.
    ///
    /// Returns the previous cached value.
    fn accept(&self, option: &str, value: Value) -> Option<Value> {
        let (old, initial, missing) = {
            let mut state = self.state.borrow_mut();
            (
                state.values.insert(option.to_string(), value),
                state.initials.remove(option),
                state.missing.remove(option),
            )
        };
        let scheduler = self.ctx.scheduler();
        for handle in initial.into_iter().chain(missing) {
            scheduler.cancel(handle);
        }
        old
    }

    fn handle_record(&self, record: &AttributeRecord) {
        if self.state.borrow().destroyed {
            return;
        }
        let Some(spec) = self.schema.option_for_attribute(&record.attribute) else {
            return;
        };

        // Records ahead of a pending own write predate it and were superseded
        // by its synchronous publication.
        {
            let mut state = self.state.borrow_mut();
            if let Some(pending) = state.own_writes.get_mut(spec.name()) {
                if let Some(previous) = pending.front() {
                    if *previous == record.old_value {
                        pending.pop_front();
                    }
                    if pending.is_empty() {
                        state.own_writes.remove(spec.name());
                    }
                    return;
                }
            }
        }

        let current = self.ctx.host().get_attribute(self.element, spec.attribute());
        if current == record.old_value {
            return;
        }

        let decoded = match &current {
            Some(text) => ValueCodec::decode(spec, Some(text.as_str())),
            None if spec.is_required() => Err(CodecError::InvalidRemoval),
            None => absent_value(spec),
        }
        .and_then(|value| {
            previous_value(spec, record.old_value.as_deref()).map(|old_value| (value, old_value))
        });

        match decoded {
            Ok((value, old_value)) => {
                self.accept(spec.name(), value.clone());
                self.emit_change(spec.name(), value, old_value, false);
            }
            Err(err) => {
                let message = format!("Error setting option \"{}\" via HTML: {}", spec.name(), err);
                let value = current.map(Value::String).unwrap_or(Value::Null);
                self.emit_error(ErrorKind::InvalidValueHtml, spec.name(), Some(value), message);
            }
        }
    }

    fn reject_program_value(&self, spec: &OptionSpec, value: Option<Value>, err: &CodecError) {
        let message = format!("Error setting option \"{}\": {}", spec.name(), err);
        self.emit_error(ErrorKind::InvalidValueJs, spec.name(), value, message);
    }

    fn schedule_initial(self: &Rc<Self>, option: &str) {
        let weak = Rc::downgrade(self);
        let name = option.to_string();
        let handle = self.ctx.scheduler().defer(move || {
            if let Some(inner) = weak.upgrade() {
                inner.fire_initial(&name);
            }
        });
        self.state
            .borrow_mut()
            .initials
            .insert(option.to_string(), handle);
    }

    fn fire_initial(&self, option: &str) {
        let value = {
            let mut state = self.state.borrow_mut();
            if state.destroyed || state.initials.remove(option).is_none() {
                return;
            }
            state.values.get(option).cloned().unwrap_or(Value::Null)
        };
        self.emit_change(option, value, Value::Null, true);
    }

    fn schedule_missing(self: &Rc<Self>, option: &str) {
        let weak = Rc::downgrade(self);
        let name = option.to_string();
        let handle = self.ctx.scheduler().defer(move || {
            if let Some(inner) = weak.upgrade() {
                inner.fire_missing(&name);
            }
        });
        self.state
            .borrow_mut()
            .missing
            .insert(option.to_string(), handle);
    }

    fn fire_missing(&self, option: &str) {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed || state.missing.remove(option).is_none() {
                return;
            }
            if state.values.contains_key(option) {
                return;
            }
        }
        let message = format!("Missing required option \"{}\"", option);
        self.emit_error(ErrorKind::MissingRequired, option, None, message);
    }

    fn emit_change(&self, option: &str, value: Value, old_value: Value, initial: bool) {
        let event = ApiEvent::Change(ChangeEvent {
            element: self.element,
            option: option.to_string(),
            value,
            old_value,
            initial,
        });
        self.bus.emit(CHANGE, &event);
        self.bus.emit(&change_type(option), &event);
    }

    fn emit_error(&self, kind: ErrorKind, option: &str, value: Option<Value>, message: String) {
        let log_event = match kind {
            ErrorKind::MissingRequired => Event::MissingRequired,
            _ => Event::ValueRejected,
        };
        let element = self.element.to_string();
        log_event_with_fields(
            log_event,
            &[
                ("element", element.as_str()),
                ("kind", kind.as_str()),
                ("option", option),
            ],
        );

        let event = ApiEvent::Error(ErrorEvent {
            element: self.element,
            kind,
            option: Some(option.to_string()),
            value,
            message,
        });
        self.bus.emit(ERROR, &event);
    }

    fn teardown(&self) {
        let (tasks, watch) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            let tasks: Vec<_> = state
                .initials
                .drain()
                .chain(state.missing.drain())
                .map(|(_, handle)| handle)
                .collect();
            (tasks, state.watch.take())
        };

        let scheduler = self.ctx.scheduler();
        for handle in tasks {
            scheduler.cancel(handle);
        }
        if let Some(watch) = watch {
            watch.disconnect();
        }
        self.bus.clear();

        let id = self.id.to_string();
        log_event_with_fields(Event::BindingDestroyed, &[("binding", id.as_str())]);
    }
}

impl Drop for BindingInner {
    fn drop(&mut self) {
        if let Some(watch) = self.state.get_mut().watch.take() {
            watch.disconnect();
        }
    }
}
