//! Cooperative single-threaded task queue.
//!
//! There is no parallelism anywhere in perch: concurrency only arises from
//! pending values whose settlement callbacks interleave with synchronous
//! code between turns of this queue. The notification scheduler and all
//! async settlements run here; hosts (and tests) drive it explicitly with
//! [`run_until_idle`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::Value;

thread_local! {
    static TASKS: RefCell<VecDeque<Box<dyn FnOnce()>>> = RefCell::new(VecDeque::new());
}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Schedules `f` for the next turn of the queue ("soon, but not now").
pub fn defer(f: impl FnOnce() + 'static) {
    TASKS.with(|q| q.borrow_mut().push_back(Box::new(f)));
}

pub fn pending_tasks() -> usize {
    TASKS.with(|q| q.borrow().len())
}

/// Drains the queue, including tasks enqueued while draining.
pub fn run_until_idle() {
    loop {
        let task = TASKS.with(|q| q.borrow_mut().pop_front());
        match task {
            Some(task) => task(),
            None => break,
        }
    }
}

/// A settlement outcome: resolved value or rejection value.
pub type Outcome = Result<Value, Value>;

/// An explicit future: a value that settles at most once, delivering the
/// outcome to registered callbacks asynchronously, in registration order.
#[derive(Clone)]
pub struct Deferred {
    inner: Rc<DeferredInner>,
}

struct DeferredInner {
    token: u64,
    state: RefCell<DeferredState>,
}

enum DeferredState {
    Unsettled(Vec<Box<dyn FnOnce(&Outcome)>>),
    Settled(Rc<Outcome>),
}

impl Deferred {
    pub fn new() -> Self {
        Deferred {
            inner: Rc::new(DeferredInner {
                token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
                state: RefCell::new(DeferredState::Unsettled(Vec::new())),
            }),
        }
    }

    /// Process-unique identity, shared with any pending markers this value
    /// installs in state slots.
    pub fn token(&self) -> u64 {
        self.inner.token
    }

    pub fn is_settled(&self) -> bool {
        matches!(*self.inner.state.borrow(), DeferredState::Settled(_))
    }

    pub fn resolve(&self, value: impl Into<Value>) {
        self.settle(Ok(value.into()));
    }

    pub fn reject(&self, error: impl Into<Value>) {
        self.settle(Err(error.into()));
    }

    fn settle(&self, outcome: Outcome) {
        let mut state = self.inner.state.borrow_mut();
        let callbacks = match &mut *state {
            DeferredState::Settled(_) => {
                log::warn!("deferred settled twice; second settlement ignored");
                return;
            }
            DeferredState::Unsettled(callbacks) => std::mem::take(callbacks),
        };
        let shared = Rc::new(outcome);
        *state = DeferredState::Settled(Rc::clone(&shared));
        drop(state);
        for callback in callbacks {
            let outcome = Rc::clone(&shared);
            defer(move || callback(&outcome));
        }
    }

    /// Registers a settlement callback. Callbacks never run synchronously,
    /// even when the value has already settled.
    pub fn on_settle(&self, callback: impl FnOnce(&Outcome) + 'static) {
        let mut state = self.inner.state.borrow_mut();
        match &mut *state {
            DeferredState::Unsettled(callbacks) => callbacks.push(Box::new(callback)),
            DeferredState::Settled(outcome) => {
                let outcome = Rc::clone(outcome);
                defer(move || callback(&outcome));
            }
        }
    }
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}
