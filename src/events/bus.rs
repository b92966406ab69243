//! Ordered publish/subscribe
//!
//! # Invariants
//!
//! 1. `emit` invokes exact handlers, then wildcard (`*`) handlers, then
//!    one-shot exact handlers, then one-shot wildcard handlers, each group
//!    in registration order.
//! 2. A one-shot handler is removed before it runs and never runs twice.
//! 3. A handler removed (or cleared) during an emission does not run later
//!    in that emission; handlers added during an emission first run on the
//!    next one.
//! 4. Handler panics are not caught.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Event type matching every emission
pub const WILDCARD: &str = "*";

/// Event handler, called with the emitted type and payload
pub type Handler<P> = Rc<dyn Fn(&str, &P)>;

/// Handle identifying a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Listener<P> {
    id: ListenerId,
    handler: Handler<P>,
    /// Occurrences still to be ignored
    skip: Cell<usize>,
}

impl<P> Listener<P> {
    /// Consumes one occurrence; true if the handler should run
    fn ready(&self) -> bool {
        match self.skip.get() {
            0 => true,
            n => {
                self.skip.set(n - 1);
                false
            }
        }
    }
}

type ListenerList<P> = Vec<Rc<Listener<P>>>;

struct Registry<P> {
    next_id: u64,
    persistent: HashMap<String, ListenerList<P>>,
    one_shot: HashMap<String, ListenerList<P>>,
}

impl<P> Registry<P> {
    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    fn contains(&self, ty: &str, id: ListenerId) -> bool {
        self.persistent
            .get(ty)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }

    fn take_one_shot(&mut self, ty: &str, id: ListenerId) -> bool {
        let Some(list) = self.one_shot.get_mut(ty) else {
            return false;
        };
        match list.iter().position(|l| l.id == id) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Event bus with wildcard, one-shot and skip-N semantics.
///
/// Cloning yields another handle to the same registry.
pub struct EventBus<P> {
    inner: Rc<RefCell<Registry<P>>>,
}

impl<P> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("persistent", &registry.persistent.values().map(Vec::len).sum::<usize>())
            .field("one_shot", &registry.one_shot.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                persistent: HashMap::new(),
                one_shot: HashMap::new(),
            })),
        }
    }

    /// Register a persistent handler
    pub fn on(&self, ty: &str, handler: impl Fn(&str, &P) + 'static) -> ListenerId {
        self.register(ty, handler, 0, false)
    }

    /// Register a persistent handler for every event type
    pub fn on_any(&self, handler: impl Fn(&str, &P) + 'static) -> ListenerId {
        self.on(WILDCARD, handler)
    }

    /// Register a persistent handler that ignores the first `skip` occurrences
    pub fn on_after(&self, ty: &str, skip: usize, handler: impl Fn(&str, &P) + 'static) -> ListenerId {
        self.register(ty, handler, skip, false)
    }

    /// Register a handler for the next occurrence only
    pub fn once(&self, ty: &str, handler: impl Fn(&str, &P) + 'static) -> ListenerId {
        self.register(ty, handler, 0, true)
    }

    /// Register a handler for the occurrence after the next `skip`
    pub fn once_skipping(&self, ty: &str, skip: usize, handler: impl Fn(&str, &P) + 'static) -> ListenerId {
        self.register(ty, handler, skip, true)
    }

    /// Remove a handler. Returns false if it was not registered under `ty`.
    pub fn off(&self, ty: &str, id: ListenerId) -> bool {
        let mut guard = self.inner.borrow_mut();
        let registry = &mut *guard;
        let mut removed = false;
        for map in [&mut registry.persistent, &mut registry.one_shot] {
            if let Some(list) = map.get_mut(ty) {
                let before = list.len();
                list.retain(|l| l.id != id);
                removed |= list.len() != before;
            }
        }
        removed
    }

    /// Invoke every handler registered for `ty` and for the wildcard
    pub fn emit(&self, ty: &str, payload: &P) {
        let (exact, wildcard, once_exact, once_wildcard) = {
            let registry = self.inner.borrow();
            let snapshot = |map: &HashMap<String, ListenerList<P>>, key: &str| {
                map.get(key).cloned().unwrap_or_default()
            };
            (
                snapshot(&registry.persistent, ty),
                snapshot(&registry.persistent, WILDCARD),
                snapshot(&registry.one_shot, ty),
                snapshot(&registry.one_shot, WILDCARD),
            )
        };

        for (key, listeners) in [(ty, &exact), (WILDCARD, &wildcard)] {
            for listener in listeners {
                if !self.inner.borrow().contains(key, listener.id) {
                    continue;
                }
                if listener.ready() {
                    (listener.handler)(ty, payload);
                }
            }
        }

        for (key, listeners) in [(ty, &once_exact), (WILDCARD, &once_wildcard)] {
            for listener in listeners {
                // Still-skipping listeners stay registered
                let fire = {
                    let mut registry = self.inner.borrow_mut();
                    let live = registry
                        .one_shot
                        .get(key)
                        .is_some_and(|list| list.iter().any(|l| l.id == listener.id));
                    live && listener.ready() && registry.take_one_shot(key, listener.id)
                };
                if fire {
                    (listener.handler)(ty, payload);
                }
            }
        }
    }

    /// Remove every handler
    pub fn clear(&self) {
        let mut registry = self.inner.borrow_mut();
        registry.persistent.clear();
        registry.one_shot.clear();
    }

    /// Number of handlers registered under `ty`, one-shot included
    pub fn listener_count(&self, ty: &str) -> usize {
        let registry = self.inner.borrow();
        registry.persistent.get(ty).map_or(0, Vec::len) + registry.one_shot.get(ty).map_or(0, Vec::len)
    }

    fn register(&self, ty: &str, handler: impl Fn(&str, &P) + 'static, skip: usize, one_shot: bool) -> ListenerId {
        let mut registry = self.inner.borrow_mut();
        let id = registry.allocate();
        let listener = Rc::new(Listener {
            id,
            handler: Rc::new(handler),
            skip: Cell::new(skip),
        });
        let map = if one_shot {
            &mut registry.one_shot
        } else {
            &mut registry.persistent
        };
        map.entry(ty.to_string()).or_default().push(listener);
        id
    }
}
