//! In-memory host document
//!
//! A flat set of elements, each with a tag, string attributes and a
//! connected flag. Only connected elements are visible to selectors and to
//! subtree watchers.
//!
//! Watchers follow mutation-observer semantics:
//! - every `set_attribute` produces a record, even when the text is unchanged
//! - removing an absent attribute produces no record
//! - records are batched per watcher and delivered as one microtask
//! - `disconnect` drops undelivered records
//!
//! Supported selectors: `tag`, `#id`, `.class`, `[attr]`, compounds of
//! those (`button.primary[data-x]`) and comma-separated groups.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{
    AttributeCallback, AttributeRecord, AttributeStore, AttributeWatch, ElementId, ElementQuery,
    HostContext, SubtreeCallback, SubtreeRecord, SubtreeWatch, WatchHandle,
};
use crate::runtime::Scheduler;

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    connected: bool,
}

impl ElementData {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }
}

struct Watcher<R> {
    callback: Rc<dyn Fn(Vec<R>)>,
    pending: Vec<R>,
    scheduled: bool,
    active: bool,
}

type SharedWatcher<R> = Rc<RefCell<Watcher<R>>>;

fn new_watcher<R>(callback: Rc<dyn Fn(Vec<R>)>) -> SharedWatcher<R> {
    Rc::new(RefCell::new(Watcher {
        callback,
        pending: Vec::new(),
        scheduled: false,
        active: true,
    }))
}

/// Queue a record and schedule delivery of the batch if none is pending
fn enqueue<R: 'static>(scheduler: &Scheduler, watcher: &SharedWatcher<R>, record: R) {
    let mut state = watcher.borrow_mut();
    if !state.active {
        return;
    }
    state.pending.push(record);
    if state.scheduled {
        return;
    }
    state.scheduled = true;

    let watcher = Rc::clone(watcher);
    scheduler.queue_microtask(move || {
        let (callback, records) = {
            let mut state = watcher.borrow_mut();
            state.scheduled = false;
            if !state.active {
                return;
            }
            (Rc::clone(&state.callback), std::mem::take(&mut state.pending))
        };
        if !records.is_empty() {
            callback(records);
        }
    });
}

struct WatchGuard<R> {
    watcher: SharedWatcher<R>,
}

impl<R> WatchHandle for WatchGuard<R> {
    fn disconnect(&self) {
        let mut state = self.watcher.borrow_mut();
        state.active = false;
        state.pending.clear();
    }
}

struct AttributeWatcher {
    element: ElementId,
    filter: Vec<String>,
    watcher: SharedWatcher<AttributeRecord>,
}

#[derive(Default)]
struct DocumentState {
    next_id: u64,
    elements: BTreeMap<ElementId, ElementData>,
    attribute_watchers: Vec<AttributeWatcher>,
    subtree_watchers: Vec<SharedWatcher<SubtreeRecord>>,
}

/// In-memory document implementing every host trait.
///
/// Cloning yields another handle to the same document.
#[derive(Clone)]
pub struct MemoryDocument {
    state: Rc<RefCell<DocumentState>>,
    scheduler: Scheduler,
}

impl MemoryDocument {
    pub fn new(scheduler: &Scheduler) -> Self {
        Self {
            state: Rc::new(RefCell::new(DocumentState::default())),
            scheduler: scheduler.clone(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Host context over this document
    pub fn context(&self) -> HostContext {
        HostContext::new(Rc::new(self.clone()), self.scheduler.clone())
    }

    /// Create a detached element
    pub fn create_element(&self, tag: &str) -> ElementId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = ElementId(state.next_id);
        state.elements.insert(
            id,
            ElementData {
                tag: tag.to_ascii_lowercase(),
                attributes: Vec::new(),
                connected: false,
            },
        );
        id
    }

    /// Create an element with attributes and connect it
    pub fn insert_element(&self, tag: &str, attributes: &[(&str, &str)]) -> ElementId {
        let id = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(id, name, value);
        }
        self.append(id);
        id
    }

    /// Connect an element. Returns false if unknown or already connected.
    pub fn append(&self, element: ElementId) -> bool {
        self.set_connected(element, true)
    }

    /// Disconnect an element. Returns false if unknown or already detached.
    pub fn detach(&self, element: ElementId) -> bool {
        self.set_connected(element, false)
    }

    pub fn is_connected(&self, element: ElementId) -> bool {
        self.state
            .borrow()
            .elements
            .get(&element)
            .is_some_and(|e| e.connected)
    }

    /// Attributes of an element in insertion order
    pub fn attributes(&self, element: ElementId) -> Vec<(String, String)> {
        self.state
            .borrow()
            .elements
            .get(&element)
            .map(|e| e.attributes.clone())
            .unwrap_or_default()
    }

    pub fn tag(&self, element: ElementId) -> Option<String> {
        self.state.borrow().elements.get(&element).map(|e| e.tag.clone())
    }

    fn set_connected(&self, element: ElementId, connected: bool) -> bool {
        let watchers = {
            let mut state = self.state.borrow_mut();
            match state.elements.get_mut(&element) {
                Some(data) if data.connected != connected => data.connected = connected,
                _ => return false,
            }
            state.subtree_watchers.retain(|w| w.borrow().active);
            state.subtree_watchers.clone()
        };

        let record = if connected {
            SubtreeRecord::Added(element)
        } else {
            SubtreeRecord::Removed(element)
        };
        for watcher in &watchers {
            enqueue(&self.scheduler, watcher, record);
        }
        true
    }

    fn notify_attribute(&self, element: ElementId, name: &str, old_value: Option<String>) {
        let watchers: Vec<_> = {
            let mut state = self.state.borrow_mut();
            state.attribute_watchers.retain(|w| w.watcher.borrow().active);
            state
                .attribute_watchers
                .iter()
                .filter(|w| w.element == element)
                .filter(|w| w.filter.is_empty() || w.filter.iter().any(|f| f == name))
                .map(|w| Rc::clone(&w.watcher))
                .collect()
        };

        for watcher in &watchers {
            let record = AttributeRecord {
                element,
                attribute: name.to_string(),
                old_value: old_value.clone(),
            };
            enqueue(&self.scheduler, watcher, record);
        }
    }
}

impl AttributeStore for MemoryDocument {
    fn get_attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .elements
            .get(&element)?
            .attribute(name)
            .map(str::to_string)
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
        let old_value = {
            let mut state = self.state.borrow_mut();
            let Some(data) = state.elements.get_mut(&element) else {
                return;
            };
            match data.attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, slot)) => Some(std::mem::replace(slot, value.to_string())),
                None => {
                    data.attributes.push((name.to_string(), value.to_string()));
                    None
                }
            }
        };
        self.notify_attribute(element, name, old_value);
    }

    fn remove_attribute(&self, element: ElementId, name: &str) {
        let old_value = {
            let mut state = self.state.borrow_mut();
            let Some(data) = state.elements.get_mut(&element) else {
                return;
            };
            let Some(index) = data.attributes.iter().position(|(n, _)| n == name) else {
                return;
            };
            data.attributes.remove(index).1
        };
        self.notify_attribute(element, name, Some(old_value));
    }
}

impl AttributeWatch for MemoryDocument {
    fn watch_attributes(
        &self,
        element: ElementId,
        filter: Vec<String>,
        callback: AttributeCallback,
    ) -> Box<dyn WatchHandle> {
        let watcher = new_watcher(callback);
        self.state.borrow_mut().attribute_watchers.push(AttributeWatcher {
            element,
            filter,
            watcher: Rc::clone(&watcher),
        });
        Box::new(WatchGuard { watcher })
    }
}

impl SubtreeWatch for MemoryDocument {
    fn watch_subtree(&self, callback: SubtreeCallback) -> Box<dyn WatchHandle> {
        let watcher = new_watcher(callback);
        self.state
            .borrow_mut()
            .subtree_watchers
            .push(Rc::clone(&watcher));
        Box::new(WatchGuard { watcher })
    }
}

impl ElementQuery for MemoryDocument {
    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        let Some(groups) = parse_selector(selector) else {
            return Vec::new();
        };
        self.state
            .borrow()
            .elements
            .iter()
            .filter(|(_, data)| data.connected && matches_groups(data, &groups))
            .map(|(id, _)| *id)
            .collect()
    }

    fn matches(&self, element: ElementId, selector: &str) -> bool {
        let Some(groups) = parse_selector(selector) else {
            return false;
        };
        self.state
            .borrow()
            .elements
            .get(&element)
            .is_some_and(|data| matches_groups(data, &groups))
    }

    fn is_element(&self, element: ElementId) -> bool {
        self.state.borrow().elements.contains_key(&element)
    }

    fn is_valid_selector(&self, selector: &str) -> bool {
        parse_selector(selector).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SimpleSelector {
    Tag(String),
    Id(String),
    Class(String),
    Attribute(String),
}

type Compound = Vec<SimpleSelector>;

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_selector(selector: &str) -> Option<Vec<Compound>> {
    selector.split(',').map(|group| parse_compound(group.trim())).collect()
}

fn parse_compound(text: &str) -> Option<Compound> {
    if text.is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    let mut rest = text;

    let tag_len = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
    if tag_len > 0 {
        parts.push(SimpleSelector::Tag(rest[..tag_len].to_ascii_lowercase()));
        rest = &rest[tag_len..];
    }

    while let Some(marker) = rest.chars().next() {
        rest = &rest[marker.len_utf8()..];
        let name_len = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
        if name_len == 0 {
            return None;
        }
        let name = rest[..name_len].to_string();
        rest = &rest[name_len..];

        match marker {
            '#' => parts.push(SimpleSelector::Id(name)),
            '.' => parts.push(SimpleSelector::Class(name)),
            '[' => {
                rest = rest.strip_prefix(']')?;
                parts.push(SimpleSelector::Attribute(name.to_ascii_lowercase()));
            }
            _ => return None,
        }
    }

    Some(parts)
}

fn matches_groups(data: &ElementData, groups: &[Compound]) -> bool {
    groups.iter().any(|compound| {
        compound.iter().all(|simple| match simple {
            SimpleSelector::Tag(tag) => data.tag == *tag,
            SimpleSelector::Id(id) => data.attribute("id") == Some(id.as_str()),
            SimpleSelector::Class(class) => data.has_class(class),
            SimpleSelector::Attribute(name) => data.attribute(name).is_some(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> (Scheduler, MemoryDocument) {
        let scheduler = Scheduler::new();
        let doc = MemoryDocument::new(&scheduler);
        (scheduler, doc)
    }

    fn collect_attributes(doc: &MemoryDocument, el: ElementId) -> (Rc<RefCell<Vec<Vec<AttributeRecord>>>>, Box<dyn WatchHandle>) {
        let batches = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&batches);
        let handle = doc.watch_attributes(
            el,
            vec!["data-a".to_string()],
            Rc::new(move |records| sink.borrow_mut().push(records)),
        );
        (batches, handle)
    }

    #[test]
    fn test_attribute_records_are_batched() {
        let (scheduler, doc) = document();
        let el = doc.insert_element("div", &[("data-a", "1")]);
        let (batches, _handle) = collect_attributes(&doc, el);

        doc.set_attribute(el, "data-a", "2");
        doc.set_attribute(el, "data-a", "2");
        doc.set_attribute(el, "data-b", "x");
        doc.remove_attribute(el, "data-a");
        doc.remove_attribute(el, "data-a");
        assert!(batches.borrow().is_empty());

        scheduler.run_microtasks();
        let batches = batches.borrow();
        assert_eq!(batches.len(), 1);
        let old: Vec<_> = batches[0].iter().map(|r| r.old_value.as_deref()).collect();
        assert_eq!(old, [Some("1"), Some("2"), Some("2")]);
    }

    #[test]
    fn test_disconnect_drops_pending_records() {
        let (scheduler, doc) = document();
        let el = doc.insert_element("div", &[]);
        let (batches, handle) = collect_attributes(&doc, el);

        doc.set_attribute(el, "data-a", "1");
        handle.disconnect();
        handle.disconnect();
        scheduler.run_until_idle();
        assert!(batches.borrow().is_empty());
    }

    #[test]
    fn test_subtree_records() {
        let (scheduler, doc) = document();
        let records = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&records);
        let _handle = doc.watch_subtree(Rc::new(move |batch| sink.borrow_mut().extend(batch)));

        let el = doc.create_element("div");
        assert!(doc.append(el));
        assert!(!doc.append(el));
        assert!(doc.detach(el));
        scheduler.run_microtasks();

        assert_eq!(*records.borrow(), [SubtreeRecord::Added(el), SubtreeRecord::Removed(el)]);
    }

    #[test]
    fn test_selectors() {
        let (_, doc) = document();
        let a = doc.insert_element("button", &[("class", "primary big"), ("id", "go")]);
        let b = doc.insert_element("div", &[("data-api", "")]);
        let detached = doc.create_element("button");

        assert_eq!(doc.query_all("button"), [a]);
        assert_eq!(doc.query_all("#go"), [a]);
        assert_eq!(doc.query_all(".big"), [a]);
        assert_eq!(doc.query_all("[data-api]"), [b]);
        assert_eq!(doc.query_all("button.primary, [data-api]"), [a, b]);
        assert!(doc.query_all("div.primary").is_empty());
        assert!(doc.matches(detached, "button"));

        for invalid in ["", "div,", "#", "[x", "div > span"] {
            assert!(!doc.is_valid_selector(invalid), "{invalid}");
        }
    }
}
