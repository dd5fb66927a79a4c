// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component descriptions.
//!
//! A [`Component`] is an immutable, cheaply clonable description of one node:
//! its kind, an optional disambiguation [`Key`], its props, an optional
//! initial state, an optional environment value for descendants, and a
//! [`Body`] that says how its children are produced:
//!
//! - [`Body::Leaf`] — no children.
//! - [`Body::Render`] — a single child computed lazily from the node's
//!   current state by a render callback.
//! - [`Body::Children`] — children supplied up front, in declaration order.
//!
//! Render callbacks must derive their output only from the node's props,
//! state and environment. The reconciler may skip them entirely when the
//! node is reused from the previous generation.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::context::RenderContext;
use crate::id::Key;
use crate::state::State;

/// Boxed error type returned by factories and render callbacks.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Render callback: produces at most one child from the current state.
pub type RenderFn =
    Arc<dyn Fn(&RenderContext<'_>) -> Result<Option<Component>, BoxError> + Send + Sync>;

/// Externally supplied configuration of a component.
///
/// Implemented for every `PartialEq + Debug` type, so plain structs work as
/// props. Two props values are equal only if they have the same concrete type
/// and compare equal.
pub trait Props: Any + fmt::Debug + Send + Sync {
    /// Upcasts to [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Compares against props of an unknown concrete type.
    fn props_eq(&self, other: &dyn Props) -> bool;
}

impl<T> Props for T
where
    T: Any + PartialEq + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn props_eq(&self, other: &dyn Props) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// How an environment value affects reuse of the provider's descendants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvMode {
    /// The value is not expected to change between generations; descendants
    /// remain eligible for reuse.
    Const,
    /// The value may change; descendants are always rebuilt.
    Mutable,
}

/// A typed value a component provides to all of its descendants.
#[derive(Clone, Debug)]
pub struct Env {
    pub(crate) value: Arc<dyn Props>,
    pub(crate) mode: EnvMode,
}

impl Env {
    /// Returns the reuse mode of this value.
    #[must_use]
    pub fn mode(&self) -> EnvMode {
        self.mode
    }

    /// Returns the value if it is a `T`.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        (*self.value).as_any().downcast_ref::<T>()
    }

    fn same_as(&self, other: &Self) -> bool {
        self.mode == other.mode && (*self.value).props_eq(&*other.value)
    }
}

/// How a component produces its children.
#[derive(Clone)]
pub enum Body {
    /// No children.
    Leaf,
    /// One child computed lazily from state.
    Render(RenderFn),
    /// Children supplied up front.
    Children(Arc<[Component]>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf => f.write_str("Leaf"),
            Self::Render(_) => f.write_str("Render(..)"),
            Self::Children(children) => {
                f.debug_tuple("Children").field(&children.len()).finish()
            }
        }
    }
}

/// An immutable description of one node of the component tree.
#[derive(Clone)]
pub struct Component {
    kind: &'static str,
    key: Option<Key>,
    props: Arc<dyn Props>,
    initial_state: Option<State>,
    env: Option<Env>,
    body: Body,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("props", &self.props)
            .field("has_initial_state", &self.initial_state.is_some())
            .field("env", &self.env)
            .field("body", &self.body)
            .finish()
    }
}

impl Component {
    fn new(kind: &'static str, body: Body) -> Self {
        Self {
            kind,
            key: None,
            props: Arc::new(()),
            initial_state: None,
            env: None,
            body,
        }
    }

    /// Creates a leaf component.
    #[must_use]
    pub fn leaf(kind: &'static str) -> Self {
        Self::new(kind, Body::Leaf)
    }

    /// Creates a render component whose child is computed by `render`.
    #[must_use]
    pub fn render<F>(kind: &'static str, render: F) -> Self
    where
        F: Fn(&RenderContext<'_>) -> Result<Option<Self>, BoxError> + Send + Sync + 'static,
    {
        Self::new(kind, Body::Render(Arc::new(render)))
    }

    /// Creates a component with externally supplied children.
    #[must_use]
    pub fn container(kind: &'static str, children: impl IntoIterator<Item = Self>) -> Self {
        Self::new(kind, Body::Children(children.into_iter().collect()))
    }

    /// Sets the disambiguation key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the props.
    #[must_use]
    pub fn with_props<P: Props>(mut self, props: P) -> Self {
        self.props = Arc::new(props);
        self
    }

    /// Sets the state used the first time this node is constructed.
    #[must_use]
    pub fn with_initial_state(mut self, state: State) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Provides `value` to every descendant's [`RenderContext::env`].
    #[must_use]
    pub fn with_env<P: Props>(mut self, value: P, mode: EnvMode) -> Self {
        self.env = Some(Env {
            value: Arc::new(value),
            mode,
        });
        self
    }

    /// Returns the kind name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Returns the key, if any.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Returns the props.
    #[must_use]
    pub fn props(&self) -> &dyn Props {
        &*self.props
    }

    /// Returns the props as `P` if they have that type.
    #[must_use]
    pub fn props_as<P: Any>(&self) -> Option<&P> {
        (*self.props).as_any().downcast_ref::<P>()
    }

    /// Returns the initial state, if any.
    #[must_use]
    pub fn initial_state(&self) -> Option<&State> {
        self.initial_state.as_ref()
    }

    /// Returns the provided environment value, if any.
    #[must_use]
    pub fn env(&self) -> Option<&Env> {
        self.env.as_ref()
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Returns `true` if `self` and `other` have the same construction
    /// inputs: kind, key, props, environment, body shape and, for
    /// [`Body::Children`], the same inputs for every child.
    ///
    /// Render callbacks are not compared; their output is a function of
    /// props and state.
    #[must_use]
    pub fn same_inputs(&self, other: &Self) -> bool {
        if self.kind != other.kind || self.key != other.key {
            return false;
        }
        if !Arc::ptr_eq(&self.props, &other.props) && !(*self.props).props_eq(&*other.props) {
            return false;
        }
        let env_matches = match (&self.env, &other.env) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_as(b),
            _ => false,
        };
        if !env_matches {
            return false;
        }
        match (&self.body, &other.body) {
            (Body::Leaf, Body::Leaf) | (Body::Render(_), Body::Render(_)) => true,
            (Body::Children(a), Body::Children(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| a.same_inputs(b)))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Label(&'static str);

    #[derive(Debug, PartialEq)]
    struct Other(&'static str);

    #[test]
    fn props_compare_by_type_and_value() {
        let a: &dyn Props = &Label("x");
        assert!(a.props_eq(&Label("x")));
        assert!(!a.props_eq(&Label("y")));
        assert!(!a.props_eq(&Other("x")));
    }

    #[test]
    fn same_inputs_checks_props() {
        let a = Component::leaf("Text").with_props(Label("hi"));
        let b = Component::leaf("Text").with_props(Label("hi"));
        let c = Component::leaf("Text").with_props(Label("bye"));
        assert!(a.same_inputs(&b));
        assert!(!a.same_inputs(&c));
    }

    #[test]
    fn same_inputs_checks_kind_and_key() {
        let a = Component::leaf("Text").with_key("a");
        assert!(!a.same_inputs(&Component::leaf("Image").with_key("a")));
        assert!(!a.same_inputs(&Component::leaf("Text").with_key("b")));
        assert!(!a.same_inputs(&Component::leaf("Text")));
    }

    #[test]
    fn same_inputs_recurses_into_children() {
        let make = |label| {
            Component::container(
                "Stack",
                [
                    Component::leaf("Text").with_props(Label("fixed")),
                    Component::leaf("Text").with_props(Label(label)),
                ],
            )
        };
        assert!(make("x").same_inputs(&make("x")));
        assert!(!make("x").same_inputs(&make("y")));
    }

    #[test]
    fn same_inputs_checks_env() {
        let a = Component::leaf("Theme").with_env(Label("dark"), EnvMode::Const);
        let b = Component::leaf("Theme").with_env(Label("dark"), EnvMode::Const);
        let c = Component::leaf("Theme").with_env(Label("light"), EnvMode::Const);
        let d = Component::leaf("Theme").with_env(Label("dark"), EnvMode::Mutable);
        assert!(a.same_inputs(&b));
        assert!(!a.same_inputs(&c));
        assert!(!a.same_inputs(&d));
    }

    #[test]
    fn props_as_downcasts() {
        let c = Component::leaf("Text").with_props(Label("hi"));
        assert_eq!(c.props_as::<Label>(), Some(&Label("hi")));
        assert!(c.props_as::<Other>().is_none());
        assert_eq!(Component::leaf("Empty").props_as::<()>(), Some(&()));
    }

    #[test]
    fn env_get_downcasts() {
        let c = Component::leaf("Theme").with_env(Label("dark"), EnvMode::Const);
        let env = c.env().unwrap();
        assert_eq!(env.get::<Label>(), Some(&Label("dark")));
        assert_eq!(env.mode(), EnvMode::Const);
    }
}
