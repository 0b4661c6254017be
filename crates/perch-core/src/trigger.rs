use crate::component::Component;

/// Routes mutation-engine signals back into a component.
///
/// `changed` lands in the notification scheduler (optionally for the whole
/// subtree); wait signals drive the component's wait counter.
#[derive(Clone)]
pub struct Trigger {
    component: Component,
    recursively: bool,
}

impl Trigger {
    pub fn new(component: &Component) -> Self {
        Trigger {
            component: component.clone(),
            recursively: false,
        }
    }

    /// Variant whose `changed` walks the entire child subtree.
    pub fn recursive(component: &Component) -> Self {
        Trigger {
            component: component.clone(),
            recursively: true,
        }
    }

    pub fn changed(&self) {
        if self.component.is_disconnected_state() {
            return;
        }
        if self.recursively {
            self.component.notify_changed_recursively();
        } else {
            self.component.notify_changed();
        }
    }

    pub fn wait_start(&self) {
        self.component.wait_start();
    }

    pub fn wait_finish(&self) {
        if let Err(err) = self.component.wait_finish() {
            log::error!(
                "wait scope release failed on component {}: {err}",
                self.component.id()
            );
        }
    }

    pub(crate) fn is_disconnected(&self) -> bool {
        self.component.is_disconnected_state()
    }
}
