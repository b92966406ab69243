//! Single-threaded cooperative scheduler
//!
//! Two queues, in the manner of a browser event loop:
//!
//! - **Microtasks** run when the current job yields, before any task.
//!   Attribute-watch deliveries are microtasks.
//! - **Tasks** are deferred to the next tick and can be cancelled through
//!   their [`TaskHandle`]. Initial notifications are tasks.
//!
//! # Invariants
//!
//! 1. `tick()` first drains microtasks, then runs every task queued before
//!    the tick started, draining microtasks after each one.
//! 2. Tasks queued during a tick run on the next tick.
//! 3. A cancelled task never runs.
//! 4. No queue borrow is held while a job runs, so jobs may schedule or
//!    cancel freely.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Deferred unit of work
pub type Job = Box<dyn FnOnce()>;

/// Handle to a deferred task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Default)]
struct Queues {
    next_id: u64,
    microtasks: VecDeque<Job>,
    tasks: VecDeque<(TaskHandle, Job)>,
}

/// Cooperative scheduler shared by a host and its bindings.
///
/// Cloning yields another handle to the same queues.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<Queues>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queues = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("microtasks", &queues.microtasks.len())
            .field("tasks", &queues.tasks.len())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job to run before the next task
    pub fn queue_microtask(&self, job: impl FnOnce() + 'static) {
        self.inner.borrow_mut().microtasks.push_back(Box::new(job));
    }

    /// Queue a job for the next tick
    pub fn defer(&self, job: impl FnOnce() + 'static) -> TaskHandle {
        let mut queues = self.inner.borrow_mut();
        queues.next_id += 1;
        let handle = TaskHandle(queues.next_id);
        queues.tasks.push_back((handle, Box::new(job)));
        handle
    }

    /// Cancel a deferred task. Returns false if it already ran or was cancelled.
    pub fn cancel(&self, handle: TaskHandle) -> bool {
        let mut queues = self.inner.borrow_mut();
        match queues.tasks.iter().position(|(h, _)| *h == handle) {
            Some(index) => {
                queues.tasks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether the task is still waiting to run
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.inner.borrow().tasks.iter().any(|(h, _)| *h == handle)
    }

    /// Run microtasks until the queue is empty, including ones queued meanwhile.
    ///
    /// Returns the number of microtasks run.
    pub fn run_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = self.inner.borrow_mut().microtasks.pop_front();
            match job {
                Some(job) => {
                    job();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Advance one tick. Returns the number of tasks run.
    pub fn tick(&self) -> usize {
        self.run_microtasks();

        let boundary = self.inner.borrow().next_id;
        let mut ran = 0;
        loop {
            let job = {
                let mut queues = self.inner.borrow_mut();
                match queues.tasks.front() {
                    Some((handle, _)) if handle.0 <= boundary => queues.tasks.pop_front(),
                    _ => None,
                }
            };
            let Some((_, job)) = job else {
                return ran;
            };
            job();
            ran += 1;
            self.run_microtasks();
        }
    }

    /// Tick until both queues are empty.
    ///
    /// Does not return if jobs keep rescheduling themselves.
    pub fn run_until_idle(&self) {
        while !self.is_idle() {
            self.tick();
        }
    }

    pub fn is_idle(&self) -> bool {
        let queues = self.inner.borrow();
        queues.microtasks.is_empty() && queues.tasks.is_empty()
    }

    /// Number of tasks waiting for a tick
    pub fn pending_tasks(&self) -> usize {
        self.inner.borrow().tasks.len()
    }
}
