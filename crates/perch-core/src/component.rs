//! Component lifecycle and wait-state propagation.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::async_value::AsyncValue;
use crate::context::ContextLayer;
use crate::error::Error;
use crate::mutator::{self, Update};
use crate::notify::Notifier;
use crate::path::Path;
use crate::trigger::Trigger;
use crate::value::Value;
use crate::view::{ViewHandle, ViewNode};

pub type ComponentId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

bitflags! {
    /// Optional hooks a behavior declares, fixed at construction time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Hooks: u8 {
        /// `render` is implemented.
        const RENDER = 1 << 0;
        /// `render_wait` is implemented; waiting state is absorbed locally
        /// instead of propagating to the parent.
        const RENDER_WAIT = 1 << 1;
        /// `decorate` wraps every rendered tree.
        const DECORATE = 1 << 2;
    }
}

/// Per-component behavior: the subclass surface of the lifecycle core.
///
/// All hooks take `&self`; behaviors keep their own mutable bits in
/// `Cell`/`RefCell` fields or, more usually, in the component's state tree.
pub trait Behavior: 'static {
    /// Which optional hooks are implemented. Resolved once at construction.
    fn hooks(&self) -> Hooks {
        Hooks::RENDER
    }

    /// Runs after identity, parent link, and state are wired.
    fn init(&self, _cx: &Component) {}

    /// Runs during disconnect, after all children are gone.
    fn destroy(&self, _cx: &Component) {}

    fn render(&self, _cx: &Component) -> ViewNode {
        ViewNode::empty()
    }

    /// Shown instead of `render` while the component is waiting. Only
    /// consulted when `Hooks::RENDER_WAIT` is declared.
    fn render_wait(&self, _cx: &Component) -> ViewNode {
        ViewNode::empty()
    }

    /// Wraps every rendered tree. Only consulted when `Hooks::DECORATE` is
    /// declared.
    fn decorate(&self, _cx: &Component, content: ViewNode) -> ViewNode {
        content
    }

    fn child_added(&self, _cx: &Component, _child: &Component) {}

    fn child_removed(&self, _cx: &Component, _child: &Component) {}
}

struct ComponentInner {
    id: ComponentId,
    behavior: Box<dyn Behavior>,
    hooks: Hooks,
    parent: RefCell<Weak<ComponentInner>>,
    children: RefCell<BTreeMap<ComponentId, Component>>,
    named_slots: RefCell<BTreeMap<String, ComponentId>>,
    state: Rc<RefCell<Value>>,
    context: Rc<ContextLayer>,
    waiting: Cell<u32>,
    parent_waiting: Cell<bool>,
    disconnected: Cell<bool>,
    views: RefCell<SmallVec<[ViewHandle; 2]>>,
    notifier: Rc<Notifier>,
}

/// A node in the component ownership tree.
///
/// Cloning is cheap: a parent owns its children through the child map, and
/// children keep a non-owning back reference. Handles held elsewhere keep
/// the node alive but carry no ownership semantics.
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl Component {
    /// Creates a parentless root with a fresh context root and notifier.
    pub fn create_root(behavior: impl Behavior) -> Component {
        Self::create(None, Box::new(behavior))
    }

    fn create(parent: Option<&Component>, behavior: Box<dyn Behavior>) -> Component {
        let hooks = behavior.hooks();
        let (context, notifier) = match parent {
            Some(p) => (
                ContextLayer::inherit(&p.inner.context),
                Rc::clone(&p.inner.notifier),
            ),
            None => (ContextLayer::root(), Notifier::new()),
        };
        let inner = Rc::new(ComponentInner {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            behavior,
            hooks,
            parent: RefCell::new(parent.map_or_else(Weak::new, |p| Rc::downgrade(&p.inner))),
            children: RefCell::new(BTreeMap::new()),
            named_slots: RefCell::new(BTreeMap::new()),
            state: Rc::new(RefCell::new(Value::map())),
            context,
            waiting: Cell::new(0),
            parent_waiting: Cell::new(false),
            disconnected: Cell::new(false),
            views: RefCell::new(SmallVec::new()),
            notifier,
        });
        let component = Component { inner };
        if let Some(p) = parent {
            p.inner
                .children
                .borrow_mut()
                .insert(component.id(), component.clone());
        }
        component.inner.behavior.init(&component);
        if let Some(p) = parent {
            p.inner.behavior.child_added(p, &component);
        }
        component
    }

    pub fn create_sub_component(&self, behavior: impl Behavior) -> Component {
        Self::create(Some(self), Box::new(behavior))
    }

    /// Creates a child under a durable name, disconnecting any previous
    /// occupant of that name first.
    pub fn create_named_sub_component(
        &self,
        name: impl Into<String>,
        behavior: impl Behavior,
    ) -> Component {
        let name = name.into();
        if let Some(existing) = self.named_sub_component(&name) {
            existing.disconnect();
        }
        let child = Self::create(Some(self), Box::new(behavior));
        self.inner.named_slots.borrow_mut().insert(name, child.id());
        child
    }

    /// None if the name is unset or the referenced child is gone.
    pub fn named_sub_component(&self, name: &str) -> Option<Component> {
        let id = *self.inner.named_slots.borrow().get(name)?;
        self.inner.children.borrow().get(&id).cloned()
    }

    pub fn disconnect_named_sub_component(&self, name: &str) {
        if let Some(child) = self.named_sub_component(name) {
            child.disconnect();
        }
    }

    pub fn id(&self) -> ComponentId {
        self.inner.id
    }

    pub fn parent(&self) -> Option<Component> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Component { inner })
    }

    /// The top-most ancestor. The parent link is fixed at creation, so the
    /// walk always terminates.
    pub fn root(&self) -> Component {
        let mut cur = self.clone();
        while let Some(parent) = cur.parent() {
            cur = parent;
        }
        cur
    }

    pub fn is_waiting_state(&self) -> bool {
        self.inner.waiting.get() > 0
    }

    pub fn is_disconnected_state(&self) -> bool {
        self.inner.disconnected.get()
    }

    /// True when the behavior absorbs waiting locally via `render_wait`.
    pub fn is_able_to_wait(&self) -> bool {
        self.inner.hooks.contains(Hooks::RENDER_WAIT)
    }

    /// Opens a wait scope.
    ///
    /// The first scope on a component that cannot render its own waiting
    /// view is propagated to the parent *before* the local counter moves,
    /// so an ancestor chain sees at most one signal per waiting subtree no
    /// matter how many async writes are in flight below it.
    pub fn wait_start(&self) {
        if self.inner.disconnected.get() {
            return;
        }
        if !self.is_able_to_wait() && !self.inner.parent_waiting.get() {
            if let Some(parent) = self.parent() {
                self.inner.parent_waiting.set(true);
                parent.wait_start();
            }
        }
        self.inner.waiting.set(self.inner.waiting.get() + 1);
        self.notify_changed();
    }

    /// Closes a wait scope. Calling without a matching `wait_start` is an
    /// invariant violation.
    pub fn wait_finish(&self) -> Result<(), Error> {
        if self.inner.disconnected.get() {
            // In-flight settlements may still land after teardown; they only
            // release their scope.
            let waiting = self.inner.waiting.get();
            self.inner.waiting.set(waiting.saturating_sub(1));
            return Ok(());
        }
        let waiting = self.inner.waiting.get();
        if waiting == 0 {
            return Err(Error::UnmatchedWaitFinish);
        }
        self.inner.waiting.set(waiting - 1);
        self.notify_changed();
        if self.inner.waiting.get() == 0 && self.inner.parent_waiting.get() {
            self.inner.parent_waiting.set(false);
            if let Some(parent) = self.parent() {
                parent.wait_finish()?;
            }
        }
        Ok(())
    }

    /// Opens a wait scope for a pending value and schedules its release for
    /// when the value settles, success or failure. Ready values are a no-op.
    pub fn wait_for(&self, value: &AsyncValue) {
        if self.inner.disconnected.get() {
            return;
        }
        let Some(deferred) = value.pending_deferred() else {
            return;
        };
        self.wait_start();
        let this = self.clone();
        deferred.on_settle(move |_| {
            if let Err(err) = this.wait_finish() {
                log::error!("wait_for release failed on component {}: {err}", this.id());
            }
        });
    }

    /// Applies a state update through the path mutation engine.
    pub fn set_state(&self, update: impl Into<Update>) -> Result<(), Error> {
        if self.is_disconnected_state() {
            return Err(Error::Disconnected);
        }
        mutator::apply(&self.inner.state, &Trigger::new(self), update.into())
    }

    /// Like `set_state`, but every change notification walks the whole
    /// child subtree.
    pub fn set_state_recursive(&self, update: impl Into<Update>) -> Result<(), Error> {
        if self.is_disconnected_state() {
            return Err(Error::Disconnected);
        }
        mutator::apply(&self.inner.state, &Trigger::recursive(self), update.into())
    }

    /// Writes into this component's own context layer. Descendants read
    /// through it; ancestor layers are never touched.
    pub fn set_context(&self, update: impl Into<Update>) -> Result<(), Error> {
        if self.is_disconnected_state() {
            return Err(Error::Disconnected);
        }
        mutator::apply(
            self.inner.context.own_root(),
            &Trigger::new(self),
            update.into(),
        )
    }

    /// Reads a state slot; pending slots read as their visible face.
    pub fn state_value(&self, path: impl Into<Path>) -> Option<Value> {
        let path = path.into();
        self.inner
            .state
            .borrow()
            .get_path(path.keys())
            .map(|v| v.settled().clone())
    }

    /// Reads a raw state slot, pending markers included.
    pub fn state_raw(&self, path: impl Into<Path>) -> Option<Value> {
        let path = path.into();
        self.inner.state.borrow().get_path(path.keys()).cloned()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Reads from the context chain: own layer first, then ancestors.
    pub fn context_value(&self, path: impl Into<Path>) -> Option<Value> {
        self.inner.context.get(path)
    }

    pub fn notify_changed(&self) {
        self.inner.notifier.notify(self);
    }

    /// Depth-first: descendants are enqueued before this component, so
    /// their views refresh no later than the ancestor's.
    pub fn notify_changed_recursively(&self) {
        let children: Vec<Component> = self.inner.children.borrow().values().cloned().collect();
        for child in children {
            child.notify_changed_recursively();
        }
        self.notify_changed();
    }

    pub fn attach_view(&self, view: ViewHandle) {
        let mut views = self.inner.views.borrow_mut();
        if !views.iter().any(|v| Rc::ptr_eq(v, &view)) {
            views.push(view);
        }
    }

    pub fn detach_view(&self, view: &ViewHandle) {
        self.inner
            .views
            .borrow_mut()
            .retain(|v| !Rc::ptr_eq(v, view));
    }

    /// Snapshot of the currently mounted views.
    pub(crate) fn mounted_views(&self) -> Vec<ViewHandle> {
        self.inner.views.borrow().iter().cloned().collect()
    }

    pub fn hooks(&self) -> Hooks {
        self.inner.hooks
    }

    /// Invokes the behavior's render hook.
    pub fn render(&self) -> Result<ViewNode, Error> {
        if !self.inner.hooks.contains(Hooks::RENDER) {
            return Err(Error::MissingRender);
        }
        Ok(self.inner.behavior.render(self))
    }

    pub fn render_wait(&self) -> Option<ViewNode> {
        self.inner
            .hooks
            .contains(Hooks::RENDER_WAIT)
            .then(|| self.inner.behavior.render_wait(self))
    }

    pub fn decorate(&self, content: ViewNode) -> ViewNode {
        if self.inner.hooks.contains(Hooks::DECORATE) {
            self.inner.behavior.decorate(self, content)
        } else {
            content
        }
    }

    /// Tears the component down: children first, then release of any
    /// propagated wait scope, unlink from the parent, `destroy` and
    /// `child_removed` hooks, and one final change notification so attached
    /// views can render the terminal state.
    pub fn disconnect(&self) {
        if self.inner.disconnected.replace(true) {
            log::warn!("component {} disconnected twice", self.id());
            return;
        }
        let children: Vec<Component> = self.inner.children.borrow().values().cloned().collect();
        for child in children {
            child.disconnect();
        }

        let parent = self.parent();
        if let Some(parent) = &parent {
            if self.inner.parent_waiting.replace(false) {
                if let Err(err) = parent.wait_finish() {
                    log::error!(
                        "releasing propagated wait during disconnect of {} failed: {err}",
                        self.id()
                    );
                }
            }
            parent.inner.children.borrow_mut().remove(&self.id());
            parent
                .inner
                .named_slots
                .borrow_mut()
                .retain(|_, id| *id != self.id());
        }
        self.inner.behavior.destroy(self);
        if let Some(parent) = &parent {
            parent.inner.behavior.child_removed(parent, self);
        }
        *self.inner.parent.borrow_mut() = Weak::new();
        self.notify_changed();
    }
}

#[cfg(test)]
impl Component {
    pub(crate) fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    pub(crate) fn wait_count(&self) -> u32 {
        self.inner.waiting.get()
    }
}
