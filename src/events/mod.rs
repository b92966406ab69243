//! Event channel
//!
//! [`EventBus`] provides ordered publish/subscribe with wildcard, one-shot
//! and skip-N semantics. Bindings and collections publish [`ApiEvent`]s on
//! the `change`, `change:<option>`, `error` and `newElement` types.

mod bus;
mod payload;

pub use bus::{EventBus, Handler, ListenerId, WILDCARD};
pub use payload::{change_type, ApiEvent, ChangeEvent, ErrorEvent, ErrorKind, CHANGE, ERROR, NEW_ELEMENT};
