//! # Components, State, and Async Writes
//!
//! Perch is a retained component runtime built around three pieces:
//!
//! - [`Component`] — a node in an ownership tree with a behavior, its own
//!   state tree, and an inherited context chain.
//! - path writes — `set_state("a.b.2", v)` mutates a nested [`Value`] tree,
//!   creating intermediate containers on the way down.
//! - [`AsyncValue`] — a write whose value is still in flight, with tunable
//!   optimistic and error projections and automatic wait-state bookkeeping.
//!
//! ## Components
//!
//! A behavior is a plain struct implementing [`Behavior`]; hooks it does not
//! declare are never consulted:
//!
//! ```rust
//! use perch_core::*;
//!
//! struct Label;
//! impl Behavior for Label {
//!     fn render(&self, cx: &Component) -> ViewNode {
//!         let text = cx.state_value("text").unwrap_or_default();
//!         ViewNode::text(text.as_str().unwrap_or("").to_string())
//!     }
//! }
//!
//! let root = Component::create_root(Label);
//! root.set_state(("text", "hello")).unwrap();
//! assert_eq!(root.render().unwrap(), ViewNode::text("hello"));
//! ```
//!
//! ## Path writes
//!
//! Paths are dotted strings; all-digit segments index lists and `@` appends:
//!
//! ```rust
//! use perch_core::*;
//!
//! # struct Label;
//! # impl Behavior for Label {}
//! let root = Component::create_root(Label);
//! root.set_state(("rows.@", 1)).unwrap();
//! root.set_state(("rows.@", 2)).unwrap();
//! assert_eq!(root.state_value("rows.1"), Some(Value::Int(2)));
//! ```
//!
//! ## Async writes and waiting
//!
//! Writing a [`Deferred`] (or an [`AsyncValue`] built from one) opens a wait
//! scope on the component until it settles. A behavior that declares
//! `RENDER_WAIT` absorbs the waiting state; otherwise it propagates to the
//! nearest ancestor that can show it:
//!
//! ```rust
//! use perch_core::*;
//!
//! struct Loader;
//! impl Behavior for Loader {
//!     fn hooks(&self) -> Hooks {
//!         Hooks::RENDER | Hooks::RENDER_WAIT
//!     }
//!     fn render(&self, cx: &Component) -> ViewNode {
//!         ViewNode::text(format!("{:?}", cx.state_value("user")))
//!     }
//!     fn render_wait(&self, _cx: &Component) -> ViewNode {
//!         ViewNode::text("loading")
//!     }
//! }
//!
//! let root = Component::create_root(Loader);
//! let user = Deferred::new();
//! root.set_state(("user", user.clone())).unwrap();
//! assert!(root.is_waiting_state());
//!
//! user.resolve("jane");
//! tasks::run_until_idle();
//! assert!(!root.is_waiting_state());
//! assert_eq!(root.state_value("user"), Some(Value::from("jane")));
//! ```
//!
//! Everything is single-threaded: settlements and change-notification
//! flushes run on the cooperative queue in [`tasks`], which hosts drive
//! with [`tasks::run_until_idle`].

pub mod async_value;
pub mod component;
pub mod context;
pub mod error;
pub mod mutator;
pub mod notify;
pub mod path;
pub mod prelude;
pub mod tasks;
pub mod trigger;
pub mod value;
pub mod view;

pub use async_value::*;
pub use component::*;
pub use context::*;
pub use error::*;
pub use mutator::{Patch, Update};
pub use notify::*;
pub use path::*;
pub use tasks::{Deferred, Outcome};
pub use trigger::*;
pub use value::*;
pub use view::*;
