// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation-based component tree reconciliation.
//!
//! `canopy_core` turns an immutable description of a component tree into a
//! sealed, shareable snapshot (a *generation*), and turns the next
//! description plus a set of pending state updates into the next generation,
//! reusing every subtree that provably did not change.
//!
//! # Architecture
//!
//! Each build reads the previous generation and writes a new one:
//!
//! ```text
//!   previous ScopeRoot ──┐        StateUpdateMap
//!                        │              │
//!                        ▼              ▼
//!               DirtyIdSet::compute() (updated ids + ancestors)
//!                        │
//!   factory() ──► Component ──► BuildContext::build_root()
//!                                      │  per node: reuse | render | children | leaf
//!                                      ▼
//!                          BuildContext::exit() ──► new ScopeRoot (sealed)
//!                                      │
//!                                      ▼
//!                           animation::diff() ──► BoundsAnimation list
//! ```
//!
//! **[`id`]** — [`NodeId`](id::NodeId) identities derived from the parent id
//! and an explicit [`Key`](id::Key) or an implicit `(kind, occurrence)`
//! segment. No allocation table: the same position always hashes to the
//! same id.
//!
//! **[`component`]** — [`Component`](component::Component) descriptions with
//! props, initial state, environment values and a
//! [`Body`](component::Body): leaf, render callback or explicit children.
//!
//! **[`state`]** — opaque state payloads and the
//! [`StateUpdateMap`](state::StateUpdateMap) of pending updates.
//!
//! **[`tree`]** / **[`scope`]** — the node arena and the immutable,
//! `Send + Sync` [`ScopeRoot`](scope::ScopeRoot) that seals it.
//!
//! **[`dirty`]** — propagation of state updates up to the root.
//!
//! **[`context`]** — the [`BuildContext`](context::BuildContext) that owns
//! one build's frame stack, and the
//! [`RenderContext`](context::RenderContext) handed to render callbacks.
//!
//! **[`current`]** — the per-thread registry of in-progress builds.
//!
//! **[`animation`]** — pairing of bounds animations between generations.
//!
//! **[`layout`]** — the size range and layout result exchanged with an
//! external layout function.
//!
//! **[`listener`]** — the [`BuildListener`](listener::BuildListener) trait
//! and event types.
//!
//! **[`config`]** — triggers, per-build options, misuse policy and node
//! predicates.
//!
//! **[`engine`]** — the [`Engine`](engine::Engine) entry points tying it all
//! together.
//!
//! # Example
//!
//! ```
//! use std::convert::Infallible;
//!
//! use canopy_core::{BuildTrigger, Component, Engine, Key, ScopeRoot, StateUpdateMap, state};
//!
//! fn app() -> Component {
//!     let counter = Component::render("Counter", |ctx| {
//!         let n = ctx.state_as::<u32>().copied().unwrap_or(0);
//!         Ok(Some(Component::leaf("Text").with_props(n)))
//!     })
//!     .with_key("counter");
//!     Component::container("App", [counter])
//! }
//!
//! let engine = Engine::default();
//! let none = StateUpdateMap::new();
//! let first = engine
//!     .build(None, &none, BuildTrigger::empty(), || Ok::<_, Infallible>(app()))
//!     .unwrap();
//!
//! let counter = ScopeRoot::next_identity(Some(first.root), &Key::from("counter"));
//! let mut updates = StateUpdateMap::new();
//! updates.set(counter, state(1_u32));
//! let second = engine
//!     .build(
//!         Some(&first.scope_root),
//!         &updates,
//!         BuildTrigger::STATE_UPDATE,
//!         || Ok::<_, Infallible>(app()),
//!     )
//!     .unwrap();
//!
//! assert_eq!(second.scope_root.generation(), 2);
//! assert_eq!(second.stats.rendered, 1);
//! ```

pub mod animation;
pub mod component;
pub mod config;
pub mod context;
pub mod current;
pub mod dirty;
pub mod engine;
pub mod error;
pub mod id;
pub mod layout;
pub mod listener;
pub mod scope;
pub mod state;
pub mod tree;

pub use animation::BoundsAnimation;
pub use component::{BoxError, Component, EnvMode};
pub use config::{BuildOptions, BuildTrigger, EngineConfig, MisuseHandling, Predicates};
pub use context::{BuildContext, BuildPhase, BuildStats, RenderContext};
pub use current::{ActiveBuild, current};
pub use engine::{BuildAndLayoutResult, BuildResult, Engine};
pub use error::{BuildError, ErrorKind};
pub use id::{Key, NodeId};
pub use layout::{Layout, SizeRange};
pub use listener::BuildListener;
pub use scope::ScopeRoot;
pub use state::{State, StateUpdateMap, state};
pub use tree::Tree;
