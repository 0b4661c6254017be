//! Host-side mounting of components.
//!
//! The core produces [`ViewNode`] trees and change notifications but never
//! renders anything itself. This crate supplies the two host pieces:
//!
//! - [`ViewHost`] — a mounted view that re-renders its component on every
//!   notification flush, dispatching between `render`, `render_wait`, and a
//!   terminal error view.
//! - [`Mount`] — a mount point owning at most one live component at a time,
//!   with factory-driven replacement.

pub mod tests;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use perch_core::{Behavior, Component, MountedView, ViewHandle, ViewNode};

/// Creates a root component with a host already mounted on it.
pub fn create_root(behavior: impl Behavior) -> (Component, Rc<ViewHost>) {
    let component = Component::create_root(behavior);
    let host = ViewHost::mount(&component);
    (component, host)
}

/// A mounted view over one component.
///
/// Holds the last rendered tree; each notification flush replaces it and
/// bumps the generation counter, so hosts can diff cheaply by generation.
pub struct ViewHost {
    component: Component,
    rendered: RefCell<ViewNode>,
    generation: Cell<u64>,
}

impl ViewHost {
    /// Attaches a new host to `component` and renders it once.
    pub fn mount(component: &Component) -> Rc<ViewHost> {
        let host = Rc::new(ViewHost {
            component: component.clone(),
            rendered: RefCell::new(ViewNode::empty()),
            generation: Cell::new(0),
        });
        component.attach_view(host.clone());
        host.refresh();
        host
    }

    /// Detaches from the component; the component itself stays live.
    pub fn unmount(self: &Rc<Self>) {
        let handle: ViewHandle = self.clone();
        self.component.detach_view(&handle);
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn rendered(&self) -> ViewNode {
        self.rendered.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    fn refresh(&self) {
        let content = self.render_current();
        *self.rendered.borrow_mut() = self.component.decorate(content);
        self.generation.set(self.generation.get() + 1);
    }

    /// Terminal state wins over waiting; waiting wins over `render` only
    /// when the behavior can show it.
    fn render_current(&self) -> ViewNode {
        if self.component.is_disconnected_state() {
            return ViewNode::text("Error: this component was disconnected");
        }
        if self.component.is_waiting_state() {
            if let Some(waiting) = self.component.render_wait() {
                return waiting;
            }
        }
        match self.component.render() {
            Ok(view) => view,
            Err(err) => {
                log::error!(
                    "render failed on component {}: {err}",
                    self.component.id()
                );
                ViewNode::text(format!("Error: {err}"))
            }
        }
    }
}

impl MountedView for ViewHost {
    fn update_state(&self) {
        self.refresh();
    }
}

type Factory = Box<dyn Fn() -> Component>;

/// A mount point owning at most one live component.
///
/// Replacing the factory while active swaps the mounted component: the old
/// one is disconnected before its host is unmounted, so its teardown hooks
/// run while the tree is still linked.
#[derive(Default)]
pub struct Mount {
    factory: RefCell<Option<Factory>>,
    active: Cell<bool>,
    current: RefCell<Option<Rc<ViewHost>>>,
}

impl Mount {
    pub fn new() -> Mount {
        Mount::default()
    }

    pub fn set_factory(&self, factory: impl Fn() -> Component + 'static) {
        *self.factory.borrow_mut() = Some(Box::new(factory));
        if self.active.get() {
            self.unmount_current();
            self.mount_current();
        }
    }

    pub fn activate(&self) {
        if self.active.replace(true) {
            return;
        }
        self.mount_current();
    }

    pub fn deactivate(&self) {
        if !self.active.replace(false) {
            return;
        }
        self.unmount_current();
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn host(&self) -> Option<Rc<ViewHost>> {
        self.current.borrow().clone()
    }

    fn mount_current(&self) {
        let factory = self.factory.borrow();
        let Some(factory) = factory.as_ref() else {
            log::warn!("mount activated without a component factory");
            return;
        };
        let component = factory();
        *self.current.borrow_mut() = Some(ViewHost::mount(&component));
    }

    fn unmount_current(&self) {
        if let Some(host) = self.current.borrow_mut().take() {
            host.component().disconnect();
            host.unmount();
        }
    }
}
