//! Shared context objects for scope resolution.
//!
//! A context is the caller-supplied object backing the second step of a
//! scope's name-resolution chain (locals first, context second, convenience
//! accessors last). Implementations expose dynamic members through
//! [`Context::responds_to`] and [`Context::call`], and may rebind themselves
//! to the active rendering environment through [`Context::for_env`] — e.g. to
//! build parts or render partials from context members.
//!
//! [`MapContext`] is a ready-made map-backed implementation for the common
//! case of a bag of named values.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::{Object, Value};
use minijinja::{Error, State};

use crate::env::EnvRef;
use crate::error::{Result, ViewError};

/// A user-supplied shared context, consulted when scope locals miss.
pub trait Context: Send + Sync {
    /// True if the context exposes a member with this name.
    fn responds_to(&self, name: &str) -> bool;

    /// Invokes the named member with the given arguments.
    ///
    /// Plain value members ignore `args`. Unknown names are an
    /// [`UnresolvedMember`](ViewError::UnresolvedMember) error; callers check
    /// [`responds_to`](Self::responds_to) first.
    fn call(&self, name: &str, args: &[Value]) -> Result<Value>;

    /// Rebinds the context to a rendering environment, returning the copy to
    /// use for that environment. Called once per environment construction.
    fn for_env(self: Arc<Self>, env: EnvRef) -> Arc<dyn Context>;
}

/// A map-backed context.
///
/// ```
/// use minijinja::value::Value;
/// use vellum::MapContext;
///
/// let ctx = MapContext::new()
///     .with("site_name", Value::from("Example"))
///     .with("year", Value::from(2026));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapContext {
    entries: HashMap<String, Value>,
    env: Option<EnvRef>,
}

impl MapContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named value, builder-style.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.entries.insert(name.into(), value);
        self
    }

    /// The environment this copy is bound to, if any.
    pub fn env(&self) -> Option<&EnvRef> {
        self.env.as_ref()
    }
}

impl Context for MapContext {
    fn responds_to(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn call(&self, name: &str, _args: &[Value]) -> Result<Value> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| ViewError::UnresolvedMember {
                receiver: "context",
                name: name.to_string(),
            })
    }

    fn for_env(self: Arc<Self>, env: EnvRef) -> Arc<dyn Context> {
        Arc::new(MapContext {
            entries: self.entries.clone(),
            env: Some(env),
        })
    }
}

/// Template-facing adapter: exposes a context as an engine object so the
/// `context` convenience accessor works inside templates.
#[derive(Clone)]
pub(crate) struct ContextObject(pub(crate) Arc<dyn Context>);

impl fmt::Debug for ContextObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextObject").finish()
    }
}

impl Object for ContextObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let name = key.as_str()?;
        if !self.0.responds_to(name) {
            return None;
        }
        self.0.call(name, &[]).ok()
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        Ok(self.0.call(name, args)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_context_responds_to() {
        let ctx = MapContext::new().with("greeting", Value::from("hello"));
        assert!(ctx.responds_to("greeting"));
        assert!(!ctx.responds_to("farewell"));
    }

    #[test]
    fn test_map_context_call() {
        let ctx = MapContext::new().with("greeting", Value::from("hello"));
        assert_eq!(ctx.call("greeting", &[]).unwrap(), Value::from("hello"));
        let err = ctx.call("farewell", &[]).unwrap_err();
        assert!(matches!(err, ViewError::UnresolvedMember { receiver: "context", .. }));
    }

    #[test]
    fn test_context_object_exposes_members() {
        let ctx: Arc<dyn Context> = Arc::new(MapContext::new().with("n", Value::from(3)));
        let value = Value::from_object(ContextObject(ctx));
        assert_eq!(value.get_attr("n").unwrap(), Value::from(3));
        assert!(value.get_attr("missing").unwrap().is_undefined());
    }
}
