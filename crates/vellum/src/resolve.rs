//! Name-resolution primitives shared by parts, scopes, and the context.
//!
//! Member access on parts and scopes walks an explicit, ordered resolution
//! chain. Each step reports [`Resolution::Found`] or [`Resolution::NotFound`];
//! a chain that ends in `NotFound` becomes a typed
//! [`UnresolvedMember`](crate::ViewError::UnresolvedMember) error rather than
//! a silent null.

use std::collections::HashMap;

use minijinja::value::{Object, Value};
use minijinja::{Error, ErrorKind, State};
use std::sync::Arc;

/// Outcome of one step (or a whole chain) of member resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The member resolved to this value.
    Found(Value),
    /// The member is not provided at this step.
    NotFound,
}

impl Resolution {
    /// True if this is a `Found`.
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// A value's method, bound for bare invocation from a template.
///
/// Templates call scope methods without a receiver (`{{ render("card") }}`),
/// but the engine only calls plain values. Exposing the method as a callable
/// value bridges the two: invoking the value dispatches `call_method` on the
/// bound target.
#[derive(Debug)]
pub(crate) struct BoundMethod {
    target: Value,
    name: String,
}

impl BoundMethod {
    pub(crate) fn new(target: Value, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
        }
    }
}

impl Object for BoundMethod {
    fn call(
        self: &Arc<Self>,
        state: &State<'_, '_>,
        args: &[Value],
    ) -> Result<Value, Error> {
        self.target.call_method(state, &self.name, args)
    }
}

/// Coerces a template-supplied map argument into a locals map.
///
/// Used by `render(...)`/`scope(...)` calls inside templates, where extra
/// locals arrive as a dict literal.
pub(crate) fn locals_from_value(value: &Value) -> Result<HashMap<String, Value>, Error> {
    let mut locals = HashMap::new();
    for key in value.try_iter()? {
        let entry = value.get_item(&key)?;
        let name = key
            .as_str()
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidOperation,
                    "local names must be strings",
                )
            })?
            .to_string();
        locals.insert(name, entry);
    }
    Ok(locals)
}
