use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::component::{Component, ComponentId};
use crate::tasks;
use crate::view::MountedView;

/// Batches per-component change events and delivers them to mounted views
/// once per turn of the task queue.
///
/// One notifier is shared by a whole component tree; sub-components inherit
/// their root's at creation.
pub struct Notifier {
    pending: RefCell<BTreeMap<ComponentId, Component>>,
    scheduled: Cell<bool>,
}

impl Notifier {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Notifier {
            pending: RefCell::new(BTreeMap::new()),
            scheduled: Cell::new(false),
        })
    }

    /// Records a changed component. Idempotent until the next flush; the
    /// first notification of a tick schedules exactly one flush.
    pub fn notify(self: &Rc<Self>, component: &Component) {
        self.pending
            .borrow_mut()
            .insert(component.id(), component.clone());
        if !self.scheduled.get() {
            self.scheduled.set(true);
            let notifier = Rc::clone(self);
            tasks::defer(move || notifier.flush());
        }
    }

    /// Takes the full pending set and updates every view mounted on each
    /// pending component. Views mounted or unmounted by those callbacks are
    /// not revisited within the same flush.
    pub fn flush(&self) {
        self.scheduled.set(false);
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        log::debug!("flushing {} change notification(s)", pending.len());
        for (_, component) in pending {
            let views: Vec<Rc<dyn MountedView>> = component.mounted_views();
            for view in views {
                view.update_state();
            }
        }
    }
}
