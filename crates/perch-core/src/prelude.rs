pub use crate::async_value::{AsyncValue, OnError, Optimistic, WritePhase};
pub use crate::component::{Behavior, Component, ComponentId, Hooks};
pub use crate::context::ContextLayer;
pub use crate::error::Error;
pub use crate::mutator::{Patch, Update};
pub use crate::notify::Notifier;
pub use crate::path::{Key, Path};
pub use crate::tasks::{Deferred, Outcome, defer, pending_tasks, run_until_idle};
pub use crate::trigger::Trigger;
pub use crate::value::{Face, PendingMarker, Value};
pub use crate::view::{MountedView, ViewHandle, ViewNode};
