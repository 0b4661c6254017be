//! A profile loader: plain writes, async writes with projections, teardown.

use perch_bridge::create_root;
use perch_core::{prelude::*, tasks};

struct Profile;

impl Behavior for Profile {
    fn hooks(&self) -> Hooks {
        Hooks::RENDER | Hooks::RENDER_WAIT
    }

    fn init(&self, cx: &Component) {
        if let Err(err) = cx.set_state(("name", "anonymous")) {
            log::error!("initial state write failed: {err}");
        }
    }

    fn render(&self, cx: &Component) -> ViewNode {
        let name = cx.state_value("name").unwrap_or_default();
        let motto = cx.state_value("motto").unwrap_or_default();
        ViewNode::Fragment(vec![
            ViewNode::text(format!("name:  {}", name.as_str().unwrap_or("?"))),
            ViewNode::text(format!("motto: {}", motto.as_str().unwrap_or("-"))),
        ])
    }

    fn render_wait(&self, _cx: &Component) -> ViewNode {
        ViewNode::text("fetching profile...")
    }
}

struct Badge;

impl Behavior for Badge {
    fn render(&self, cx: &Component) -> ViewNode {
        let count = cx.state_value("count").unwrap_or_default();
        ViewNode::text(format!("badges: {}", count.as_int().unwrap_or(0)))
    }
}

fn show(node: &ViewNode) -> String {
    match node {
        ViewNode::Text(text) => text.clone(),
        ViewNode::Fragment(children) => children
            .iter()
            .map(show)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let (profile, host) = create_root(Profile);
    tasks::run_until_idle();
    println!("--- initial ---\n{}", show(&host.rendered()));

    // A plain synchronous write.
    profile.set_state(("motto", "festina lente"))?;
    tasks::run_until_idle();
    println!("--- after sync write ---\n{}", show(&host.rendered()));

    // An async write: the component waits until the fetch settles.
    let fetch = Deferred::new();
    profile.set_state(("name", fetch.clone()))?;
    tasks::run_until_idle();
    println!("--- while pending ---\n{}", show(&host.rendered()));

    fetch.resolve("jane doe");
    tasks::run_until_idle();
    println!("--- settled ---\n{}", show(&host.rendered()));

    // A failing fetch with an error projection.
    let fetch = Deferred::new();
    profile.set_state((
        "motto",
        AsyncValue::pending(fetch.clone())
            .show_while_pending("...")
            .show_on_error("(unavailable)"),
    ))?;
    fetch.reject("503");
    tasks::run_until_idle();
    println!("--- after failed fetch ---\n{}", show(&host.rendered()));

    // A child with no wait view of its own: its async write propagates
    // upward and the root shows the waiting state for the whole subtree.
    let badge = profile.create_sub_component(Badge);
    let fetch = Deferred::new();
    badge.set_state(("count", fetch.clone()))?;
    tasks::run_until_idle();
    println!("--- child pending, root waits ---\n{}", show(&host.rendered()));

    fetch.resolve(3);
    tasks::run_until_idle();
    println!("--- child settled ---\n{}", show(&host.rendered()));

    profile.disconnect();
    tasks::run_until_idle();
    println!("--- after disconnect ---\n{}", show(&host.rendered()));

    Ok(())
}
