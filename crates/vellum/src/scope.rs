//! Rendering scopes.
//!
//! A [`Scope`] is the evaluation context for one template: a bag of locals,
//! the shared context, and optional custom behavior. Name resolution walks a
//! fixed chain: the behavior's accessors first, then locals, then the
//! context, then the convenience accessors `format`/`context`/`locals`.
//!
//! Inside templates a scope is the root object, so `{{ user }}` reads a
//! local and `{{ render("sidebar") }}` renders a partial against the scope.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::{Object, Value};
use minijinja::{Error, State};

use vellum_inflect::{demodulize, underscore};

use crate::env::RenderEnv;
use crate::error::{Result, ViewError};
use crate::resolve::{locals_from_value, BoundMethod, Resolution};

/// Reference to a scope behavior: a registry key or a direct handle.
#[derive(Clone)]
pub enum ScopeRef {
    /// Resolve by camelized name through the scope registry.
    Named(String),
    /// Use this behavior verbatim, bypassing the registry.
    Behavior(Arc<dyn ScopeBehavior>),
}

impl fmt::Debug for ScopeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ScopeRef::Behavior(_) => f.debug_tuple("Behavior").finish(),
        }
    }
}

impl From<&str> for ScopeRef {
    fn from(name: &str) -> Self {
        ScopeRef::Named(name.to_string())
    }
}

impl From<String> for ScopeRef {
    fn from(name: String) -> Self {
        ScopeRef::Named(name)
    }
}

/// Custom behavior attached to a scope.
pub trait ScopeBehavior: Send + Sync {
    /// Resolves a custom accessor. `NotFound` falls through to locals and
    /// the context.
    fn resolve(&self, _scope: &Scope, _name: &str) -> Result<Resolution> {
        Ok(Resolution::NotFound)
    }
}

/// The fallback scope behavior: no custom accessors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScope;

impl ScopeBehavior for DefaultScope {}

/// The evaluation context for one template render.
#[derive(Clone)]
pub struct Scope {
    name: Option<String>,
    locals: HashMap<String, Value>,
    env: RenderEnv,
    behavior: Arc<dyn ScopeBehavior>,
}

impl Scope {
    /// Creates a scope. Built through the environment in normal use.
    pub fn new(
        name: Option<String>,
        locals: HashMap<String, Value>,
        env: RenderEnv,
        behavior: Arc<dyn ScopeBehavior>,
    ) -> Self {
        Self {
            name,
            locals,
            env,
            behavior,
        }
    }

    /// The behavior name this scope was built for, if named.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The scope's locals.
    pub fn locals(&self) -> &HashMap<String, Value> {
        &self.locals
    }

    /// The rendering environment the scope carries.
    pub fn env(&self) -> &RenderEnv {
        &self.env
    }

    /// Resolves a name, erroring when the whole chain misses.
    pub fn get(&self, name: &str) -> Result<Value> {
        match self.resolve(name)? {
            Resolution::Found(value) => Ok(value),
            Resolution::NotFound => Err(ViewError::UnresolvedMember {
                receiver: "scope",
                name: name.to_string(),
            }),
        }
    }

    /// Renders a partial against this scope.
    ///
    /// Without a name, the partial name falls back to the scope's own name;
    /// an anonymous scope has none and errors. Type-style names (explicit
    /// or own) reduce to their underscored last segment. With extra locals
    /// the partial renders against a fresh scope carrying only those locals
    /// (same behavior, same environment), not a merge. Partials rendered
    /// this way receive no content block.
    pub fn render(&self, name: Option<&str>, extra_locals: HashMap<String, Value>) -> Result<String> {
        let target = match name {
            Some(name) => partial_target(name),
            None => self.template_name()?,
        };
        if extra_locals.is_empty() {
            return self.env.partial(&target, self, None);
        }
        let fresh = Scope {
            name: self.name.clone(),
            locals: extra_locals,
            env: self.env.clone(),
            behavior: self.behavior.clone(),
        };
        self.env.partial(&target, &fresh, None)
    }

    /// Builds a child scope in the same environment.
    pub fn scope(&self, name: Option<&ScopeRef>, locals: HashMap<String, Value>) -> Result<Scope> {
        self.env.scope(name, locals)
    }

    /// The partial name derived from the scope's own name.
    fn template_name(&self) -> Result<String> {
        let name = self.name.as_deref().ok_or(ViewError::MissingPartialName)?;
        Ok(partial_target(name))
    }

    /// The ordered resolution chain behind every name lookup.
    fn resolve(&self, name: &str) -> Result<Resolution> {
        if let Resolution::Found(value) = self.behavior.resolve(self, name)? {
            return Ok(Resolution::Found(value));
        }
        if let Some(value) = self.locals.get(name) {
            return Ok(Resolution::Found(value.clone()));
        }
        if self.env.context().responds_to(name) {
            return Ok(Resolution::Found(self.env.context().call(name, &[])?));
        }
        match name {
            "format" => Ok(Resolution::Found(Value::from(self.env.format()))),
            "context" => Ok(Resolution::Found(self.env.context_value())),
            "locals" => Ok(Resolution::Found(Value::from_iter(
                self.locals
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            ))),
            _ => Ok(Resolution::NotFound),
        }
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.locals == other.locals
            && self.env.same_env(&other.env)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("locals", &self.locals.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Object for Scope {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let name = key.as_str()?;
        // A failing accessor flattens to a miss here; the engine reports it
        // as an undefined name. Rust-side callers get the typed error from
        // `Scope::get`.
        match self.resolve(name) {
            Ok(Resolution::Found(value)) => Some(value),
            Ok(Resolution::NotFound) => match name {
                // Bare render()/scope() calls in templates resolve here.
                "render" | "scope" => Some(Value::from_object(BoundMethod::new(
                    Value::from_dyn_object(self.clone()),
                    name,
                ))),
                _ => None,
            },
            Err(_) => None,
        }
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match name {
            "render" => {
                let (target, locals_arg) = split_name_and_locals(args);
                let locals = match locals_arg {
                    Some(extra) => locals_from_value(extra)?,
                    None => HashMap::new(),
                };
                // Explicit call form: Object::render would shadow the
                // inherent method through the Arc receiver.
                let out = Scope::render(self, target, locals)?;
                Ok(Value::from_safe_string(out))
            }
            "scope" => {
                let (target, locals_arg) = split_name_and_locals(args);
                let locals = match locals_arg {
                    Some(extra) => locals_from_value(extra)?,
                    None => HashMap::new(),
                };
                let scope_ref = target.map(|name| ScopeRef::Named(name.to_string()));
                let child = self.scope(scope_ref.as_ref(), locals)?;
                Ok(Value::from_object(child))
            }
            _ => {
                if self.env.context().responds_to(name) {
                    return Ok(self.env.context().call(name, args)?);
                }
                Err(Error::new(
                    minijinja::ErrorKind::UnknownMethod,
                    format!("scope has no method named {}", name),
                ))
            }
        }
    }
}

/// The template name for a partial reference. Type-style names
/// (`Widgets::Sidebar`, leading uppercase) reduce to the underscored last
/// segment; plain names pass through.
fn partial_target(name: &str) -> String {
    if name.contains("::") || name.starts_with(char::is_uppercase) {
        underscore(demodulize(name))
    } else {
        name.to_string()
    }
}

/// Splits optional leading name and trailing locals dict of a template-side
/// `render()`/`scope()` call.
fn split_name_and_locals(args: &[Value]) -> (Option<&str>, Option<&Value>) {
    match args.first() {
        Some(first) => match first.as_str() {
            Some(name) => (Some(name), args.get(1)),
            None => (None, Some(first)),
        },
        None => (None, None),
    }
}
