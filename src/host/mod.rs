//! Host collaborators
//!
//! Bindings never touch a concrete document. They see the host through
//! these traits:
//!
//! - [`AttributeStore`] reads and writes string attributes
//! - [`AttributeWatch`] reports attribute mutations, in order, with the
//!   previous text
//! - [`SubtreeWatch`] reports element insertions and removals, in order
//! - [`ElementQuery`] resolves selectors
//!
//! Watch callbacks are delivered asynchronously through the shared
//! [`Scheduler`]. [`memory::MemoryDocument`] is an in-memory host
//! implementing all of them.

pub mod memory;
pub mod naming;

use std::fmt;
use std::rc::Rc;

use crate::runtime::Scheduler;

/// Identity of a host element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// One attribute mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    pub element: ElementId,
    pub attribute: String,
    /// Text before the mutation, `None` if the attribute was absent
    pub old_value: Option<String>,
}

/// One subtree mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtreeRecord {
    Added(ElementId),
    Removed(ElementId),
}

pub type AttributeCallback = Rc<dyn Fn(Vec<AttributeRecord>)>;
pub type SubtreeCallback = Rc<dyn Fn(Vec<SubtreeRecord>)>;

/// Live watch subscription
pub trait WatchHandle {
    /// Stop delivery. Undelivered records are dropped. Idempotent.
    fn disconnect(&self);
}

pub trait AttributeStore {
    fn get_attribute(&self, element: ElementId, name: &str) -> Option<String>;
    fn set_attribute(&self, element: ElementId, name: &str, value: &str);
    fn remove_attribute(&self, element: ElementId, name: &str);
}

pub trait AttributeWatch {
    /// Watch `element` for mutations of the attributes named in `filter`
    fn watch_attributes(
        &self,
        element: ElementId,
        filter: Vec<String>,
        callback: AttributeCallback,
    ) -> Box<dyn WatchHandle>;
}

pub trait SubtreeWatch {
    /// Watch the whole document for element insertion and removal
    fn watch_subtree(&self, callback: SubtreeCallback) -> Box<dyn WatchHandle>;
}

pub trait ElementQuery {
    /// Connected elements matching `selector`, in document order
    fn query_all(&self, selector: &str) -> Vec<ElementId>;
    fn matches(&self, element: ElementId, selector: &str) -> bool;
    /// Whether `element` names an element known to the host
    fn is_element(&self, element: ElementId) -> bool;
    fn is_valid_selector(&self, selector: &str) -> bool;
}

/// Everything a binding needs from its host
pub trait Host: AttributeStore + AttributeWatch + SubtreeWatch + ElementQuery {}

impl<T: AttributeStore + AttributeWatch + SubtreeWatch + ElementQuery> Host for T {}

/// A host paired with the scheduler its watches deliver on
#[derive(Clone)]
pub struct HostContext {
    host: Rc<dyn Host>,
    scheduler: Scheduler,
}

impl HostContext {
    pub fn new(host: Rc<dyn Host>, scheduler: Scheduler) -> Self {
        Self { host, scheduler }
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
