//! Path-based state mutation.
//!
//! One engine backs both `set_state` and `set_context`: it parses a write
//! (or an ordered batch of writes) against a nested [`Value`] tree,
//! auto-creating intermediate containers, and reports through a [`Trigger`]
//! whether anything actually changed. Async values additionally open a wait
//! scope and deliver their settled write later, guarded against supersession
//! by the pending marker's token.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::async_value::{AsyncValue, WritePhase};
use crate::error::Error;
use crate::path::{Key, Path};
use crate::tasks::Deferred;
use crate::trigger::Trigger;
use crate::value::{Face, Value};

/// A single slot write.
#[derive(Clone)]
pub enum Patch {
    /// Assign a value. Assigning `Undefined` deletes the key.
    Value(Value),
    /// Remove the target key.
    Delete,
    /// Write an asynchronous value, with wait-state propagation.
    Async(AsyncValue),
    /// Read-modify-write: invoked with the current slot value (`Undefined`
    /// when absent); the returned patch is applied in its place. Applied at
    /// most once per write; a resolver yielding another resolver is an
    /// error.
    With(Rc<dyn Fn(&Value) -> Patch>),
}

impl Patch {
    pub fn with(f: impl Fn(&Value) -> Patch + 'static) -> Patch {
        Patch::With(Rc::new(f))
    }
}

impl From<Value> for Patch {
    fn from(v: Value) -> Self {
        Patch::Value(v)
    }
}

impl From<bool> for Patch {
    fn from(v: bool) -> Self {
        Patch::Value(v.into())
    }
}

impl From<i64> for Patch {
    fn from(v: i64) -> Self {
        Patch::Value(v.into())
    }
}

impl From<i32> for Patch {
    fn from(v: i32) -> Self {
        Patch::Value(v.into())
    }
}

impl From<f64> for Patch {
    fn from(v: f64) -> Self {
        Patch::Value(v.into())
    }
}

impl From<&str> for Patch {
    fn from(v: &str) -> Self {
        Patch::Value(v.into())
    }
}

impl From<String> for Patch {
    fn from(v: String) -> Self {
        Patch::Value(v.into())
    }
}

impl From<AsyncValue> for Patch {
    fn from(v: AsyncValue) -> Self {
        Patch::Async(v)
    }
}

impl From<Deferred> for Patch {
    fn from(v: Deferred) -> Self {
        Patch::Async(AsyncValue::pending(v))
    }
}

/// One `set_state`/`set_context` call: a single write or an ordered batch.
pub enum Update {
    One(Path, Patch),
    Batch(Vec<(Path, Patch)>),
}

impl Update {
    fn into_writes(self) -> Result<Vec<(Path, Patch)>, Error> {
        match self {
            Update::One(path, patch) => Ok(vec![(path, patch)]),
            Update::Batch(writes) if writes.is_empty() => Err(Error::EmptyUpdate),
            Update::Batch(writes) => Ok(writes),
        }
    }
}

impl<P: Into<Path>, V: Into<Patch>> From<(P, V)> for Update {
    fn from((path, patch): (P, V)) -> Self {
        Update::One(path.into(), patch.into())
    }
}

impl<P: Into<Path>, V: Into<Patch>> From<Vec<(P, V)>> for Update {
    fn from(writes: Vec<(P, V)>) -> Self {
        Update::Batch(
            writes
                .into_iter()
                .map(|(p, v)| (p.into(), v.into()))
                .collect(),
        )
    }
}

/// A resolved path segment: `Append` is gone, replaced by the index it
/// resolved to at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CKey {
    Index(usize),
    Field(String),
}

/// Applies an update to `root`, firing `changed` once if any write changed
/// its target. Async settlements later fire their own standalone `changed`.
pub(crate) fn apply(
    root: &Rc<RefCell<Value>>,
    trigger: &Trigger,
    update: Update,
) -> Result<(), Error> {
    let writes = update.into_writes()?;
    let mut changed = false;
    for (path, patch) in writes {
        if path.keys().is_empty() {
            return Err(Error::EmptyUpdate);
        }
        let location = {
            let mut tree = root.borrow_mut();
            concretize(&mut tree, &path)
        };
        changed |= write_at(root, trigger, location, patch, true)?;
    }
    if changed {
        trigger.changed();
    }
    Ok(())
}

fn write_at(
    root: &Rc<RefCell<Value>>,
    trigger: &Trigger,
    location: Vec<CKey>,
    patch: Patch,
    allow_resolver: bool,
) -> Result<bool, Error> {
    match patch {
        Patch::With(resolve) => {
            if !allow_resolver {
                return Err(Error::NestedResolver);
            }
            let current = {
                let tree = root.borrow();
                peek(&tree, &location).cloned().unwrap_or_default()
            };
            let next = resolve(&current);
            write_at(root, trigger, location, next, false)
        }
        Patch::Delete | Patch::Value(Value::Undefined) => {
            let mut tree = root.borrow_mut();
            Ok(delete_at(&mut tree, &location))
        }
        Patch::Value(value) => {
            let mut tree = root.borrow_mut();
            Ok(assign_at(&mut tree, &location, value))
        }
        Patch::Async(value) => Ok(write_async(root, trigger, location, value)),
    }
}

fn write_async(
    root: &Rc<RefCell<Value>>,
    trigger: &Trigger,
    location: Vec<CKey>,
    value: AsyncValue,
) -> bool {
    let changed = Rc::new(Cell::new(false));
    let token = Rc::new(Cell::new(0u64));

    let writer = {
        let root = Rc::clone(root);
        let trigger = trigger.clone();
        let changed = Rc::clone(&changed);
        let token = Rc::clone(&token);
        move |value: Value, phase: WritePhase| match phase {
            WritePhase::Immediate => {
                let mut tree = root.borrow_mut();
                // An undefined resolved value deletes the key, same as the
                // settled phase.
                let wrote = if value.is_undefined() {
                    delete_at(&mut tree, &location)
                } else {
                    assign_at(&mut tree, &location, value)
                };
                if wrote {
                    changed.set(true);
                }
            }
            WritePhase::Optimistic => {
                let mut tree = root.borrow_mut();
                let prev = peek(&tree, &location).cloned().unwrap_or_default();
                if let Some((marker, observable)) = materialize(value, &prev) {
                    token.set(marker_token(&marker));
                    assign_at(&mut tree, &location, marker);
                    if observable {
                        changed.set(true);
                    }
                }
            }
            WritePhase::Settled => {
                if trigger.is_disconnected() {
                    return;
                }
                let wrote = {
                    let mut tree = root.borrow_mut();
                    settle_at(&mut tree, &location, token.get(), value)
                };
                if wrote {
                    trigger.changed();
                } else {
                    log::debug!("stale async write dropped (slot superseded)");
                }
            }
        }
    };

    let finish = {
        let trigger = trigger.clone();
        move || trigger.wait_finish()
    };
    value.write_value(writer, || trigger.wait_start(), finish);
    changed.get()
}

/// Fills a marker's `Keep`/`Derive` face in against the previous slot value
/// and reports whether the slot observably changed.
fn materialize(marker: Value, prev: &Value) -> Option<(Value, bool)> {
    let Value::Pending(m) = &marker else {
        log::debug!("optimistic write without a pending marker; ignored");
        return None;
    };
    let (face, observable) = match &m.face {
        Face::Keep => (Face::Shown(prev.clone()), false),
        Face::Raw => (Face::Raw, true),
        Face::Shown(v) => (Face::Shown(v.clone()), *v != *prev),
        Face::Derive(f) => {
            let shown = f(prev);
            let observable = shown != *prev;
            (Face::Shown(shown), observable)
        }
    };
    Some((Value::pending_marker(m.token, face), observable))
}

fn marker_token(marker: &Value) -> u64 {
    match marker {
        Value::Pending(m) => m.token,
        _ => 0,
    }
}

// --- navigation -------------------------------------------------------------

fn container_for(next: &Key) -> Value {
    match next {
        Key::Field(_) => Value::map(),
        Key::Index(_) | Key::Append => Value::list(),
    }
}

fn as_list(slot: &mut Value) -> &mut Vec<Value> {
    if !matches!(slot, Value::List(_)) {
        if matches!(slot, Value::Map(m) if !m.is_empty()) {
            log::warn!("path navigation replacing a populated map with a list");
        }
        *slot = Value::list();
    }
    match slot {
        Value::List(items) => items,
        _ => unreachable!("slot was just coerced to a list"),
    }
}

fn as_map(slot: &mut Value) -> &mut std::collections::BTreeMap<String, Value> {
    if !matches!(slot, Value::Map(_)) {
        if matches!(slot, Value::List(items) if !items.is_empty()) {
            log::warn!("path navigation replacing a populated list with a map");
        }
        *slot = Value::map();
    }
    match slot {
        Value::Map(map) => map,
        _ => unreachable!("slot was just coerced to a map"),
    }
}

/// Walks `path` against `root`, vivifying intermediate containers, and
/// returns the concrete location of the final slot. `Append` segments
/// resolve to the list length they found; a non-container (or a container
/// of the wrong kind) in the way is replaced.
fn concretize(root: &mut Value, path: &Path) -> Vec<CKey> {
    let keys = path.keys();
    let mut location = Vec::with_capacity(keys.len());
    let last_index = keys.len() - 1;
    let mut cur = root;
    for (i, key) in keys[..last_index].iter().enumerate() {
        let next = &keys[i + 1];
        let (slot, ckey) = enter(cur, key, next);
        location.push(ckey);
        cur = slot;
    }
    location.push(concrete_final(cur, &keys[last_index]));
    location
}

fn enter<'a>(cur: &'a mut Value, key: &Key, next: &Key) -> (&'a mut Value, CKey) {
    match key {
        Key::Append => {
            let items = as_list(cur);
            let index = items.len();
            items.push(container_for(next));
            (&mut items[index], CKey::Index(index))
        }
        Key::Index(i) => {
            if matches!(cur, Value::Map(_)) {
                return enter_field(cur, &i.to_string(), next);
            }
            let items = as_list(cur);
            if items.len() <= *i {
                items.resize(*i + 1, Value::Undefined);
            }
            let slot = &mut items[*i];
            if !slot.is_container() {
                *slot = container_for(next);
            }
            (slot, CKey::Index(*i))
        }
        Key::Field(name) => enter_field(cur, name, next),
    }
}

fn enter_field<'a>(cur: &'a mut Value, name: &str, next: &Key) -> (&'a mut Value, CKey) {
    let map = as_map(cur);
    let slot = map.entry(name.to_string()).or_insert(Value::Undefined);
    if !slot.is_container() {
        *slot = container_for(next);
    }
    (slot, CKey::Field(name.to_string()))
}

fn concrete_final(container: &mut Value, key: &Key) -> CKey {
    match key {
        Key::Append => CKey::Index(as_list(container).len()),
        Key::Index(i) => {
            if matches!(container, Value::Map(_)) {
                CKey::Field(i.to_string())
            } else {
                as_list(container);
                CKey::Index(*i)
            }
        }
        Key::Field(name) => {
            as_map(container);
            CKey::Field(name.clone())
        }
    }
}

fn peek<'a>(root: &'a Value, location: &[CKey]) -> Option<&'a Value> {
    let mut cur = root;
    for key in location {
        cur = match key {
            CKey::Field(name) => match cur {
                Value::Map(map) => map.get(name)?,
                _ => return None,
            },
            CKey::Index(i) => match cur {
                Value::List(items) => items.get(*i)?,
                _ => return None,
            },
        };
    }
    Some(cur)
}

fn peek_container<'a>(root: &'a mut Value, location: &[CKey]) -> Option<&'a mut Value> {
    let mut cur = root;
    for key in location {
        cur = match key {
            CKey::Field(name) => match cur {
                Value::Map(map) => map.get_mut(name)?,
                _ => return None,
            },
            CKey::Index(i) => match cur {
                Value::List(items) => items.get_mut(*i)?,
                _ => return None,
            },
        };
    }
    Some(cur)
}

// --- slot writes ------------------------------------------------------------

fn assign_at(root: &mut Value, location: &[CKey], value: Value) -> bool {
    let Some((last, front)) = location.split_last() else {
        return false;
    };
    match peek_container(root, front) {
        Some(container) => assign(container, last, value),
        None => false,
    }
}

fn delete_at(root: &mut Value, location: &[CKey]) -> bool {
    let Some((last, front)) = location.split_last() else {
        return false;
    };
    match peek_container(root, front) {
        Some(container) => remove(container, last),
        None => false,
    }
}

/// Honored only while the slot still holds the marker with `token`.
fn settle_at(root: &mut Value, location: &[CKey], token: u64, value: Value) -> bool {
    let Some((last, front)) = location.split_last() else {
        return false;
    };
    let Some(container) = peek_container(root, front) else {
        return false;
    };
    let holds = matches!(
        slot_of(container, last),
        Some(Value::Pending(m)) if m.token() == token
    );
    if !holds {
        return false;
    }
    if value.is_undefined() {
        remove(container, last);
    } else {
        assign(container, last, value);
    }
    true
}

fn slot_of<'a>(container: &'a Value, key: &CKey) -> Option<&'a Value> {
    match (container, key) {
        (Value::Map(map), CKey::Field(name)) => map.get(name),
        (Value::List(items), CKey::Index(i)) => items.get(*i),
        _ => None,
    }
}

fn assign(container: &mut Value, key: &CKey, value: Value) -> bool {
    match (container, key) {
        (Value::Map(map), CKey::Field(name)) => {
            let changed = map.get(name) != Some(&value);
            map.insert(name.clone(), value);
            changed
        }
        (Value::List(items), CKey::Index(i)) => {
            if items.len() <= *i {
                items.resize(*i + 1, Value::Undefined);
            }
            let changed = items[*i] != value;
            items[*i] = value;
            changed
        }
        _ => {
            log::debug!("write against a non-container slot dropped");
            false
        }
    }
}

fn remove(container: &mut Value, key: &CKey) -> bool {
    match (container, key) {
        (Value::Map(map), CKey::Field(name)) => map.remove(name).is_some(),
        (Value::List(items), CKey::Index(i)) => match items.get_mut(*i) {
            Some(slot) if !slot.is_undefined() => {
                *slot = Value::Undefined;
                true
            }
            _ => false,
        },
        _ => false,
    }
}
