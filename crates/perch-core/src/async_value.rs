//! Tunable async values.
//!
//! An [`AsyncValue`] wraps a value that may still be pending, together with
//! two projections: what a state slot shows while the value is in flight
//! (optimistic), and what gets written if it rejects. Instances are
//! immutable; every configurator returns a new value.

use std::rc::Rc;

use crate::tasks::Deferred;
use crate::value::{Face, Value};

#[derive(Clone)]
enum Source {
    Ready(Value),
    Pending(Deferred),
}

/// Projection applied to a slot while its write is pending.
#[derive(Clone, Default)]
pub enum Optimistic {
    /// Leave the slot observably untouched (default).
    #[default]
    Keep,
    /// Make the raw pending marker visible.
    Marker,
    /// Show a placeholder value.
    Shown(Value),
    /// Derive the placeholder from the previous slot value.
    Map(Rc<dyn Fn(&Value) -> Value>),
}

/// Projection applied when the pending computation rejects.
#[derive(Clone, Default)]
pub enum OnError {
    /// No write; the rejection is absorbed (default).
    #[default]
    Suppress,
    /// Write the rejection value itself.
    Store,
    /// Write a substitute value.
    Shown(Value),
    /// Derive the written value from the rejection value.
    Map(Rc<dyn Fn(&Value) -> Value>),
}

/// Which write a [`AsyncValue::write_value`] call is delivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    /// A ready value, written synchronously.
    Immediate,
    /// The pending marker, written synchronously before settlement.
    Optimistic,
    /// The settled (or error-projected) value, delivered asynchronously.
    Settled,
}

#[derive(Clone)]
pub struct AsyncValue {
    source: Source,
    on_wait: Optimistic,
    on_error: OnError,
}

impl AsyncValue {
    pub fn ready(value: impl Into<Value>) -> Self {
        AsyncValue {
            source: Source::Ready(value.into()),
            on_wait: Optimistic::default(),
            on_error: OnError::default(),
        }
    }

    pub fn pending(deferred: Deferred) -> Self {
        AsyncValue {
            source: Source::Pending(deferred),
            on_wait: Optimistic::default(),
            on_error: OnError::default(),
        }
    }

    /// The deferred behind this value, if it is a pending one.
    pub fn pending_deferred(&self) -> Option<Deferred> {
        match &self.source {
            Source::Pending(deferred) => Some(deferred.clone()),
            Source::Ready(_) => None,
        }
    }

    pub fn with_optimistic(self, projection: Optimistic) -> Self {
        AsyncValue {
            on_wait: projection,
            ..self
        }
    }

    pub fn with_error(self, projection: OnError) -> Self {
        AsyncValue {
            on_error: projection,
            ..self
        }
    }

    /// Make the pending marker itself visible while in flight.
    pub fn show_marker(self) -> Self {
        self.with_optimistic(Optimistic::Marker)
    }

    /// Show `placeholder` while in flight.
    pub fn show_while_pending(self, placeholder: impl Into<Value>) -> Self {
        self.with_optimistic(Optimistic::Shown(placeholder.into()))
    }

    /// Write the rejection value into the slot on failure.
    pub fn store_errors(self) -> Self {
        self.with_error(OnError::Store)
    }

    /// Write `substitute` into the slot on failure.
    pub fn show_on_error(self, substitute: impl Into<Value>) -> Self {
        self.with_error(OnError::Shown(substitute.into()))
    }

    fn face(&self) -> Face {
        match &self.on_wait {
            Optimistic::Keep => Face::Keep,
            Optimistic::Marker => Face::Raw,
            Optimistic::Shown(v) => Face::Shown(v.clone()),
            Optimistic::Map(f) => Face::Derive(Rc::clone(f)),
        }
    }

    /// The uniform write contract consumed by the mutation engine.
    ///
    /// Ready values go through `writer` immediately. Pending values write
    /// their marker, open a wait scope via `wait_start`, and on settlement
    /// close it first (`wait_finish` runs regardless of outcome, before any
    /// settled write) and then deliver the resolved value, or whatever the
    /// error projection yields on rejection.
    pub fn write_value<W>(
        &self,
        mut writer: W,
        wait_start: impl FnOnce(),
        wait_finish: impl FnOnce() + 'static,
    ) where
        W: FnMut(Value, WritePhase) + 'static,
    {
        match &self.source {
            Source::Ready(value) => writer(value.clone(), WritePhase::Immediate),
            Source::Pending(deferred) => {
                writer(
                    Value::pending_marker(deferred.token(), self.face()),
                    WritePhase::Optimistic,
                );
                wait_start();
                let on_error = self.on_error.clone();
                deferred.on_settle(move |outcome| {
                    wait_finish();
                    match outcome {
                        Ok(value) => writer(value.clone(), WritePhase::Settled),
                        Err(error) => match on_error {
                            OnError::Suppress => {}
                            OnError::Store => writer(error.clone(), WritePhase::Settled),
                            OnError::Shown(substitute) => writer(substitute, WritePhase::Settled),
                            OnError::Map(project) => writer(project(error), WritePhase::Settled),
                        },
                    }
                });
            }
        }
    }
}

impl From<Value> for AsyncValue {
    fn from(value: Value) -> Self {
        AsyncValue::ready(value)
    }
}

impl From<Deferred> for AsyncValue {
    fn from(deferred: Deferred) -> Self {
        AsyncValue::pending(deferred)
    }
}
