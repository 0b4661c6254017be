use std::cell::RefCell;
use std::rc::Rc;

use crate::path::Path;
use crate::value::Value;

/// One component's writable context layer plus its inherited chain.
///
/// Reads fall through to ancestor layers by leading key, nearest first;
/// writes only ever touch the owning layer and never leak upward.
pub struct ContextLayer {
    own: Rc<RefCell<Value>>,
    parent: Option<Rc<ContextLayer>>,
}

impl ContextLayer {
    pub(crate) fn root() -> Rc<Self> {
        Rc::new(ContextLayer {
            own: Rc::new(RefCell::new(Value::map())),
            parent: None,
        })
    }

    pub(crate) fn inherit(parent: &Rc<ContextLayer>) -> Rc<Self> {
        Rc::new(ContextLayer {
            own: Rc::new(RefCell::new(Value::map())),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// The writable layer the mutation engine targets.
    pub(crate) fn own_root(&self) -> &Rc<RefCell<Value>> {
        &self.own
    }

    /// Resolves `path` against the nearest layer whose top level contains
    /// the leading key. A key set locally shadows the whole ancestor entry.
    pub fn get(&self, path: impl Into<Path>) -> Option<Value> {
        let path = path.into();
        let first = path.keys().first()?;
        let mut layer: Option<&ContextLayer> = Some(self);
        while let Some(current) = layer {
            let own = current.own.borrow();
            if own.contains_key(first) {
                return own.get_path(path.keys()).map(|v| v.settled().clone());
            }
            drop(own);
            layer = current.parent.as_deref();
        }
        None
    }
}
