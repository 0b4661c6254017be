#[cfg(test)]
mod tests {
    use perch_core::{
        Behavior, Component, Deferred, Error, Hooks, ViewNode, tasks,
    };

    use crate::{Mount, ViewHost, create_root};

    struct Label;
    impl Behavior for Label {
        fn render(&self, cx: &Component) -> ViewNode {
            let text = cx.state_value("text").unwrap_or_default();
            ViewNode::text(text.as_str().unwrap_or("").to_string())
        }
    }

    struct Spinner;
    impl Behavior for Spinner {
        fn hooks(&self) -> Hooks {
            Hooks::RENDER | Hooks::RENDER_WAIT
        }
        fn render(&self, cx: &Component) -> ViewNode {
            let text = cx.state_value("text").unwrap_or_default();
            ViewNode::text(text.as_str().unwrap_or("").to_string())
        }
        fn render_wait(&self, _cx: &Component) -> ViewNode {
            ViewNode::text("loading")
        }
    }

    struct Framed;
    impl Behavior for Framed {
        fn hooks(&self) -> Hooks {
            Hooks::RENDER | Hooks::DECORATE
        }
        fn render(&self, _cx: &Component) -> ViewNode {
            ViewNode::text("inner")
        }
        fn decorate(&self, _cx: &Component, content: ViewNode) -> ViewNode {
            ViewNode::Fragment(vec![ViewNode::text("frame"), content])
        }
    }

    struct NoRender;
    impl Behavior for NoRender {
        fn hooks(&self) -> Hooks {
            Hooks::empty()
        }
    }

    #[test]
    fn host_rerenders_on_flush() {
        let (component, host) = create_root(Label);
        assert_eq!(host.rendered(), ViewNode::text(""));
        let initial = host.generation();

        component.set_state(("text", "hello")).unwrap();
        tasks::run_until_idle();
        assert_eq!(host.rendered(), ViewNode::text("hello"));
        assert_eq!(host.generation(), initial + 1);
    }

    #[test]
    fn waiting_component_shows_its_wait_view() {
        let (component, host) = create_root(Spinner);
        let d = Deferred::new();
        component.set_state(("text", d.clone())).unwrap();
        tasks::run_until_idle();
        assert_eq!(host.rendered(), ViewNode::text("loading"));

        d.resolve("done");
        tasks::run_until_idle();
        assert_eq!(host.rendered(), ViewNode::text("done"));
    }

    #[test]
    fn disconnected_component_renders_a_terminal_error() {
        let (component, host) = create_root(Label);
        component.disconnect();
        tasks::run_until_idle();
        assert_eq!(
            host.rendered(),
            ViewNode::text("Error: this component was disconnected")
        );
    }

    #[test]
    fn render_errors_become_error_views() {
        let (_component, host) = create_root(NoRender);
        assert_eq!(
            host.rendered(),
            ViewNode::text(format!("Error: {}", Error::MissingRender))
        );
    }

    #[test]
    fn decorate_wraps_every_rendered_tree() {
        let (_component, host) = create_root(Framed);
        assert_eq!(
            host.rendered(),
            ViewNode::Fragment(vec![ViewNode::text("frame"), ViewNode::text("inner")])
        );
    }

    #[test]
    fn unmounted_host_keeps_its_last_tree() {
        let (component, host) = create_root(Label);
        component.set_state(("text", "one")).unwrap();
        tasks::run_until_idle();
        host.unmount();

        component.set_state(("text", "two")).unwrap();
        tasks::run_until_idle();
        assert_eq!(host.rendered(), ViewNode::text("one"));
    }

    #[test]
    fn host_can_mount_on_a_sub_component() {
        let (root, _root_host) = create_root(Label);
        let child = root.create_sub_component(Label);
        let child_host = ViewHost::mount(&child);

        child.set_state(("text", "child")).unwrap();
        tasks::run_until_idle();
        assert_eq!(child_host.rendered(), ViewNode::text("child"));
    }

    #[test]
    fn mount_swaps_components_through_the_factory() {
        let mount = Mount::new();
        assert!(!mount.is_active());
        mount.set_factory(|| Component::create_root(Label));

        mount.activate();
        assert!(mount.is_active());
        let first = mount.host().unwrap();
        first.component().set_state(("text", "a")).unwrap();
        tasks::run_until_idle();
        assert_eq!(first.rendered(), ViewNode::text("a"));

        // Replacing the factory disconnects the old component.
        mount.set_factory(|| Component::create_root(Spinner));
        assert!(first.component().is_disconnected_state());
        let second = mount.host().unwrap();
        assert_ne!(first.component().id(), second.component().id());

        mount.deactivate();
        assert!(second.component().is_disconnected_state());
        assert!(mount.host().is_none());
    }
}
