use std::rc::Rc;

/// Output of a behavior's render hooks.
///
/// Rendering itself lives in adapter crates; the core only produces and
/// moves these trees around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewNode {
    Text(String),
    Fragment(Vec<ViewNode>),
}

impl ViewNode {
    pub fn empty() -> Self {
        ViewNode::Fragment(Vec::new())
    }

    pub fn text(text: impl Into<String>) -> Self {
        ViewNode::Text(text.into())
    }
}

impl Default for ViewNode {
    fn default() -> Self {
        ViewNode::empty()
    }
}

/// A mounted external view handle.
///
/// The adapter's only obligation on `update_state` is to schedule a
/// re-render of that view; it must not re-enter a flush synchronously.
pub trait MountedView {
    fn update_state(&self);
}

/// Snapshot type handed out during a flush.
pub type ViewHandle = Rc<dyn MountedView>;
