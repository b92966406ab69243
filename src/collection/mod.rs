//! Collections of bindings
//!
//! A [`Collection`] owns one [`Binding`] per resolved element and forwards
//! every binding event to its own bus. Attached through a selector, it also
//! watches the host subtree: matching insertions get a binding (announced
//! synchronously with `newElement`), removals destroy theirs. Elements
//! present at attach time are announced on the next tick.

mod errors;

pub use errors::{AttachError, AttachResult};

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use uuid::Uuid;

use crate::binding::Binding;
use crate::events::{ApiEvent, ErrorEvent, ErrorKind, EventBus, ListenerId, ERROR, NEW_ELEMENT};
use crate::host::{ElementId, ElementQuery, HostContext, SubtreeRecord, SubtreeWatch, WatchHandle};
use crate::observability::{log_event_with_fields, Event};
use crate::runtime::TaskHandle;
use crate::schema::Schema;

/// What to attach to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every matching element, now and as the subtree changes
    Selector(String),
    Element(ElementId),
    Elements(Vec<ElementId>),
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl From<ElementId> for Target {
    fn from(element: ElementId) -> Self {
        Target::Element(element)
    }
}

impl From<Vec<ElementId>> for Target {
    fn from(elements: Vec<ElementId>) -> Self {
        Target::Elements(elements)
    }
}

impl From<&[ElementId]> for Target {
    fn from(elements: &[ElementId]) -> Self {
        Target::Elements(elements.to_vec())
    }
}

#[derive(Default)]
struct CollectionState {
    bindings: Vec<(ElementId, Binding)>,
    announcements: Vec<TaskHandle>,
    watch: Option<Box<dyn WatchHandle>>,
    destroyed: bool,
}

struct CollectionInner {
    id: Uuid,
    schema: Rc<Schema>,
    ctx: HostContext,
    selector: Option<String>,
    bus: EventBus<ApiEvent>,
    state: RefCell<CollectionState>,
}

/// Bindings of one schema over a set of elements.
///
/// Cloning yields another handle to the same collection.
#[derive(Clone)]
pub struct Collection {
    inner: Rc<CollectionInner>,
}

/// Resolve a target into elements, in order and without duplicates
fn resolve(ctx: &HostContext, target: &Target) -> AttachResult<Vec<ElementId>> {
    let host = ctx.host();
    let elements = match target {
        Target::Selector(selector) => {
            if !host.is_valid_selector(selector) {
                return Err(AttachError::InvalidTarget(format!("invalid selector \"{}\"", selector)));
            }
            host.query_all(selector)
        }
        Target::Element(element) => vec![*element],
        Target::Elements(elements) => elements.clone(),
    };

    if let Some(unknown) = elements.iter().find(|e| !host.is_element(**e)) {
        return Err(AttachError::InvalidTarget(format!("{} is not an element", unknown)));
    }

    let mut unique = Vec::with_capacity(elements.len());
    for element in elements {
        if !unique.contains(&element) {
            unique.push(element);
        }
    }
    Ok(unique)
}

impl Collection {
    /// Bind `schema` to every element of `target`.
    ///
    /// Either every element is bound or none is.
    pub fn attach(schema: Rc<Schema>, ctx: &HostContext, target: Target) -> AttachResult<Self> {
        let elements = resolve(ctx, &target)?;

        let mut bindings = Vec::with_capacity(elements.len());
        for element in elements {
            match Binding::attach(Rc::clone(&schema), ctx, element) {
                Ok(binding) => bindings.push((element, binding)),
                Err(err) => {
                    for (_, binding) in &bindings {
                        binding.destroy();
                    }
                    return Err(err);
                }
            }
        }

        let selector = match target {
            Target::Selector(selector) => Some(selector),
            _ => None,
        };
        let inner = Rc::new(CollectionInner {
            id: Uuid::new_v4(),
            schema,
            ctx: ctx.clone(),
            selector,
            bus: EventBus::new(),
            state: RefCell::new(CollectionState::default()),
        });

        for (element, binding) in bindings {
            inner.forward(&binding);
            inner.state.borrow_mut().bindings.push((element, binding));
            inner.schedule_announcement(element);
        }

        if inner.selector.is_some() {
            let weak = Rc::downgrade(&inner);
            let watch = ctx.host().watch_subtree(Rc::new(move |records: Vec<SubtreeRecord>| {
                if let Some(inner) = weak.upgrade() {
                    for record in records {
                        inner.handle_subtree(record);
                    }
                }
            }));
            inner.state.borrow_mut().watch = Some(watch);
        }

        let id = inner.id.to_string();
        let count = inner.state.borrow().bindings.len().to_string();
        log_event_with_fields(
            Event::CollectionAttached,
            &[
                ("collection", id.as_str()),
                ("elements", count.as_str()),
                ("selector", inner.selector.as_deref().unwrap_or("")),
            ],
        );

        Ok(Self { inner })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Selector the collection tracks, if attached through one
    pub fn selector(&self) -> Option<&str> {
        self.inner.selector.as_deref()
    }

    /// Bound elements, in binding order
    pub fn elements(&self) -> Vec<ElementId> {
        self.inner
            .state
            .borrow()
            .bindings
            .iter()
            .map(|(e, _)| *e)
            .collect()
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.inner
            .state
            .borrow()
            .bindings
            .iter()
            .map(|(_, b)| b.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Binding of an element
    pub fn for_element(&self, element: ElementId) -> AttachResult<Binding> {
        if self.is_destroyed() {
            return Err(AttachError::Destroyed);
        }
        if !self.inner.ctx.host().is_element(element) {
            return Err(AttachError::InvalidTarget(format!("{} is not an element", element)));
        }
        self.inner.binding(element).ok_or(AttachError::NotAttached(element))
    }

    /// Binding of the single element matching `selector`
    pub fn for_selector(&self, selector: &str) -> AttachResult<Binding> {
        if self.is_destroyed() {
            return Err(AttachError::Destroyed);
        }
        let host = self.inner.ctx.host();
        if !host.is_valid_selector(selector) {
            return Err(AttachError::InvalidTarget(format!("invalid selector \"{}\"", selector)));
        }
        match host.query_all(selector).as_slice() {
            [] => Err(AttachError::NoElementMatched(selector.to_string())),
            [element] => self.for_element(*element),
            many => Err(AttachError::AmbiguousElement {
                selector: selector.to_string(),
                count: many.len(),
            }),
        }
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

    /// Stop watching, drop listeners and destroy every binding. Idempotent.
    pub fn destroy(&self) {
        self.inner.teardown();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.state.borrow().destroyed
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.inner.id)
            .field("selector", &self.inner.selector)
            .field("elements", &self.elements())
            .finish()
    }
}

impl CollectionInner {
    fn binding(&self, element: ElementId) -> Option<Binding> {
        self.state
            .borrow()
            .bindings
            .iter()
            .find(|(e, _)| *e == element)
            .map(|(_, b)| b.clone())
    }

    /// Re-publish every event of `binding` on the collection bus
    fn forward(&self, binding: &Binding) {
        let bus = self.bus.clone();
        binding.on_any(move |ty, event| bus.emit(ty, event));
    }

    fn schedule_announcement(self: &Rc<Self>, element: ElementId) {
        let weak: Weak<CollectionInner> = Rc::downgrade(self);
        let handle = self.ctx.scheduler().defer(move || {
            if let Some(inner) = weak.upgrade() {
                if inner.binding(element).is_some() {
                    inner.bus.emit(NEW_ELEMENT, &ApiEvent::NewElement(element));
                }
            }
        });
        self.state.borrow_mut().announcements.push(handle);
    }

    fn handle_subtree(&self, record: SubtreeRecord) {
        if self.state.borrow().destroyed {
            return;
        }
        match record {
            SubtreeRecord::Added(element) => self.add(element),
            SubtreeRecord::Removed(element) => self.remove(element),
        }
    }

    fn add(&self, element: ElementId) {
        let Some(selector) = self.selector.as_deref() else {
            return;
        };
        let host = self.ctx.host();
        if !host.matches(element, selector) || self.binding(element).is_some() {
            return;
        }

        match Binding::attach(Rc::clone(&self.schema), &self.ctx, element) {
            Ok(binding) => {
                self.forward(&binding);
                self.state.borrow_mut().bindings.push((element, binding));

                let id = self.id.to_string();
                let el = element.to_string();
                log_event_with_fields(
                    Event::ElementAdded,
                    &[("collection", id.as_str()), ("element", el.as_str())],
                );
                self.bus.emit(NEW_ELEMENT, &ApiEvent::NewElement(element));
            }
            Err(err) => {
                let el = element.to_string();
                let message = err.to_string();
                log_event_with_fields(
                    Event::AttachFailed,
                    &[("element", el.as_str()), ("reason", message.as_str())],
                );
                let event = ApiEvent::Error(ErrorEvent {
                    element,
                    kind: ErrorKind::AttachFailed,
                    option: err.option().map(str::to_string),
                    value: None,
                    message,
                });
                self.bus.emit(ERROR, &event);
            }
        }
    }

    fn remove(&self, element: ElementId) {
        let removed = {
            let mut state = self.state.borrow_mut();
            state
                .bindings
                .iter()
                .position(|(e, _)| *e == element)
                .map(|index| state.bindings.remove(index).1)
        };
        let Some(binding) = removed else {
            return;
        };
        binding.destroy();

        let id = self.id.to_string();
        let el = element.to_string();
        log_event_with_fields(
            Event::ElementRemoved,
            &[("collection", id.as_str()), ("element", el.as_str())],
        );
    }

    fn teardown(&self) {
        let (bindings, announcements, watch) = {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            (
                std::mem::take(&mut state.bindings),
                std::mem::take(&mut state.announcements),
                state.watch.take(),
            )
        };

        if let Some(watch) = watch {
            watch.disconnect();
        }
        let scheduler = self.ctx.scheduler();
        for handle in announcements {
            scheduler.cancel(handle);
        }
        self.bus.clear();
        for (_, binding) in &bindings {
            binding.destroy();
        }

        let id = self.id.to_string();
        log_event_with_fields(Event::CollectionDestroyed, &[("collection", id.as_str())]);
    }
}

impl Drop for CollectionInner {
    fn drop(&mut self) {
        if let Some(watch) = self.state.get_mut().watch.take() {
            watch.disconnect();
        }
    }
}
