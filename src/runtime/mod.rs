//! Cooperative runtime
//!
//! Deferred work (initial notifications, missing-required errors, element
//! announcements) and host watch deliveries run on a [`Scheduler`].

mod scheduler;

pub use scheduler::{Job, Scheduler, TaskHandle};
