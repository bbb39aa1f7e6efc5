//! Parts: presentation-aware decorators around computed values.
//!
//! A [`Part`] wraps one `(name, value, environment)` triple. Templates see it
//! as an ordinary value — member access walks an explicit chain (decorated
//! attributes, then the behavior's custom accessors, then the wrapped value's
//! own members, then the convenience accessors `format`/`context`/`value`/
//! `name`) and rendering it prints the wrapped value's string form. Behavior
//! beyond the default comes from a [`PartBehavior`] registered in the view's
//! part registry.
//!
//! Parts are immutable: [`Part::with_options`] derives a new part, it never
//! mutates in place.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, ObjectRepr, Value, ValueKind};
use minijinja::{Error, State};

use crate::env::RenderEnv;
use crate::error::{Result, ViewError};
use crate::resolve::{locals_from_value, Resolution};
use crate::scope::{Scope, ScopeRef};

/// Reference to a decorator behavior: a registry key or a direct handle.
#[derive(Clone)]
pub enum DecoratorRef {
    /// Resolve by camelized name through the part registry.
    Named(String),
    /// Use this behavior verbatim, bypassing the registry.
    Behavior(Arc<dyn PartBehavior>),
}

impl fmt::Debug for DecoratorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoratorRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            DecoratorRef::Behavior(_) => f.debug_tuple("Behavior").finish(),
        }
    }
}

impl From<&str> for DecoratorRef {
    fn from(name: &str) -> Self {
        DecoratorRef::Named(name.to_string())
    }
}

impl From<String> for DecoratorRef {
    fn from(name: String) -> Self {
        DecoratorRef::Named(name)
    }
}

/// The `as:` override attached to an exposure or decorated attribute.
///
/// The two-element form `[collection, element]` overrides the collection and
/// element decorators independently; the one-element collection form leaves
/// the element override unset, falling back to registry resolution of the
/// singularized name.
#[derive(Clone, Debug)]
pub enum AsOverride {
    /// Single override: the decorator for a scalar, or the per-element
    /// decorator when the value turns out to be a sequence.
    One(DecoratorRef),
    /// Collection form: decorator for the sequence wrapper, and optionally
    /// one for the elements.
    Collection {
        /// Decorator for the wrapping collection part.
        collection: DecoratorRef,
        /// Decorator for each element part, if overridden.
        element: Option<DecoratorRef>,
    },
}

impl AsOverride {
    /// Single override by registry name.
    pub fn name(name: impl Into<String>) -> Self {
        AsOverride::One(DecoratorRef::Named(name.into()))
    }

    /// Single override by direct behavior handle.
    pub fn behavior(behavior: Arc<dyn PartBehavior>) -> Self {
        AsOverride::One(DecoratorRef::Behavior(behavior))
    }

    /// Collection + element override pair.
    pub fn pair(collection: impl Into<DecoratorRef>, element: impl Into<DecoratorRef>) -> Self {
        AsOverride::Collection {
            collection: collection.into(),
            element: Some(element.into()),
        }
    }

    /// Collection-only override; the element decorator stays unset.
    pub fn collection(collection: impl Into<DecoratorRef>) -> Self {
        AsOverride::Collection {
            collection: collection.into(),
            element: None,
        }
    }

    /// The (collection, element) split used when decorating a sequence.
    pub(crate) fn for_sequence(&self) -> (Option<&DecoratorRef>, Option<&DecoratorRef>) {
        match self {
            AsOverride::One(elem) => (None, Some(elem)),
            AsOverride::Collection {
                collection,
                element,
            } => (Some(collection), element.as_ref()),
        }
    }

    /// The override used when decorating a scalar.
    pub(crate) fn for_scalar(&self) -> &DecoratorRef {
        match self {
            AsOverride::One(one) => one,
            AsOverride::Collection { collection, .. } => collection,
        }
    }
}

/// An accessor a behavior marks as auto-decorating.
///
/// When the accessor is invoked, the underlying value (the behavior's own
/// override, or the wrapped value's member) is computed first and then passed
/// back through the part builder — the explicit equivalent of decorating an
/// overridden reader.
#[derive(Clone, Debug)]
pub struct DecoratedAttr {
    name: String,
    rename: Option<AsOverride>,
}

impl DecoratedAttr {
    /// Declares an auto-decorating accessor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rename: None,
        }
    }

    /// Overrides the decorator used for the accessor's value.
    pub fn with_as(mut self, rename: AsOverride) -> Self {
        self.rename = Some(rename);
        self
    }

    /// The accessor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decorator override, if any.
    pub fn rename(&self) -> Option<&AsOverride> {
        self.rename.as_ref()
    }
}

/// Custom behavior attached to a part.
///
/// The default implementations make a plain pass-through decorator; override
/// [`resolve`](Self::resolve) to add computed accessors and
/// [`decorated`](Self::decorated) to auto-decorate specific accessors.
pub trait PartBehavior: Send + Sync {
    /// Resolves a custom accessor. `NotFound` falls through to the wrapped
    /// value's own members.
    fn resolve(&self, _part: &Part, _name: &str) -> Result<Resolution> {
        Ok(Resolution::NotFound)
    }

    /// Accessors whose results are re-decorated through the part builder.
    fn decorated(&self) -> &[DecoratedAttr] {
        &[]
    }
}

/// The fallback decorator: no custom accessors, no decorated attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPart;

impl PartBehavior for DefaultPart {}

/// Overrides for [`Part::with_options`]. Unset fields keep the part's
/// current values.
#[derive(Default)]
pub struct PartOptions {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement wrapped value.
    pub value: Option<Value>,
    /// Replacement behavior.
    pub behavior: Option<Arc<dyn PartBehavior>>,
    /// Replacement rendering environment.
    pub env: Option<RenderEnv>,
}

/// A decorator wrapping one computed value.
#[derive(Clone)]
pub struct Part {
    name: String,
    value: Value,
    env: RenderEnv,
    behavior: Arc<dyn PartBehavior>,
}

impl Part {
    /// Wraps `value` under `name` in the given environment.
    pub fn new(
        name: impl Into<String>,
        value: Value,
        env: RenderEnv,
        behavior: Arc<dyn PartBehavior>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            env,
            behavior,
        }
    }

    /// The exposure name this part was built for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped raw value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The rendering environment the part carries.
    pub fn env(&self) -> &RenderEnv {
        &self.env
    }

    /// Derives a new part, overriding any of name, value, behavior, or
    /// environment.
    pub fn with_options(&self, options: PartOptions) -> Part {
        Part {
            name: options.name.unwrap_or_else(|| self.name.clone()),
            value: options.value.unwrap_or_else(|| self.value.clone()),
            env: options.env.unwrap_or_else(|| self.env.clone()),
            behavior: options.behavior.unwrap_or_else(|| self.behavior.clone()),
        }
    }

    /// Derives a copy of this part carried into a different environment.
    pub fn for_env(&self, env: RenderEnv) -> Part {
        self.with_options(PartOptions {
            env: Some(env),
            ..PartOptions::default()
        })
    }

    /// Resolves a member, erroring when the whole chain misses.
    pub fn get(&self, name: &str) -> Result<Value> {
        match self.resolve(name)? {
            Resolution::Found(value) => Ok(value),
            Resolution::NotFound => Err(ViewError::UnresolvedMember {
                receiver: "part",
                name: name.to_string(),
            }),
        }
    }

    /// Renders a partial with this part bound as a local.
    ///
    /// The local name is `rename` when given, the part's own name otherwise;
    /// `extra_locals` are merged alongside. `content` is exposed to the
    /// partial as its content block when given.
    pub fn render(
        &self,
        partial: &str,
        rename: Option<&str>,
        extra_locals: HashMap<String, Value>,
        content: Option<&str>,
    ) -> Result<String> {
        let local = rename.unwrap_or(&self.name).to_string();
        let mut locals = extra_locals;
        locals.insert(local, Value::from_object(self.clone()));
        let scope = self.env.scope(None, locals)?;
        self.env.partial(partial, &scope, content)
    }

    /// Builds (without rendering) a scope with this part bound under its own
    /// name, resolved against `scope_name` for behavior selection.
    pub fn scope(
        &self,
        scope_name: Option<&ScopeRef>,
        extra_locals: HashMap<String, Value>,
    ) -> Result<Scope> {
        let mut locals = extra_locals;
        locals.insert(self.name.clone(), Value::from_object(self.clone()));
        self.env.scope(scope_name, locals)
    }

    /// The ordered resolution chain behind every member access.
    fn resolve(&self, name: &str) -> Result<Resolution> {
        // Decorated attributes: compute the underlying value (behavior
        // override first, wrapped value second), then re-decorate.
        if let Some(attr) = self
            .behavior
            .decorated()
            .iter()
            .find(|attr| attr.name() == name)
        {
            let underlying = match self.behavior.resolve(self, name)? {
                Resolution::Found(value) => value,
                Resolution::NotFound => self.value_member(name),
            };
            if underlying.is_undefined() {
                return Ok(Resolution::NotFound);
            }
            if underlying.is_true() {
                let decorated = self.env.part_as(name, underlying, attr.rename())?;
                return Ok(Resolution::Found(decorated));
            }
            return Ok(Resolution::Found(underlying));
        }

        if let Resolution::Found(value) = self.behavior.resolve(self, name)? {
            return Ok(Resolution::Found(value));
        }

        // The wrapped value's own members take priority over the
        // convenience accessors.
        let member = self.value_member(name);
        if !member.is_undefined() {
            return Ok(Resolution::Found(member));
        }

        match name {
            "format" => Ok(Resolution::Found(Value::from(self.env.format()))),
            "context" => Ok(Resolution::Found(self.env.context_value())),
            "value" => Ok(Resolution::Found(self.value.clone())),
            "name" => Ok(Resolution::Found(Value::from(self.name.clone()))),
            _ => Ok(Resolution::NotFound),
        }
    }

    fn value_member(&self, name: &str) -> Value {
        self.value.get_attr(name).unwrap_or(Value::UNDEFINED)
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl PartialEq for Part {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.value == other.value
            && self.env.same_env(&other.env)
    }
}

impl Object for Part {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        if self.value.kind() == ValueKind::Seq {
            ObjectRepr::Seq
        } else {
            ObjectRepr::Map
        }
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let name = match key.as_str() {
            Some(name) => name,
            // Index access on collection parts goes to the wrapped sequence.
            None => {
                return self
                    .value
                    .get_item(key)
                    .ok()
                    .filter(|item| !item.is_undefined())
            }
        };
        // A failing accessor flattens to a miss here; the engine reports it
        // as an undefined name. Rust-side callers get the typed error from
        // `Part::get`.
        match self.resolve(name) {
            Ok(Resolution::Found(value)) => Some(value),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        if self.value.kind() == ValueKind::Seq {
            Enumerator::Seq(self.value.len().unwrap_or(0))
        } else {
            Enumerator::NonEnumerable
        }
    }

    fn call_method(
        self: &Arc<Self>,
        state: &State<'_, '_>,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match name {
            "render" => {
                let partial = require_str_arg(args, "render")?;
                let (rename, locals) = split_render_locals(args.get(1))?;
                // Explicit call form: Object::render would shadow the
                // inherent method through the Arc receiver. Template-side
                // calls carry no content block.
                let out = Part::render(self, partial, rename.as_deref(), locals, None)?;
                Ok(Value::from_safe_string(out))
            }
            "scope" => {
                let scope_name = args.first().and_then(|arg| arg.as_str());
                let locals = match args.get(1) {
                    Some(extra) => locals_from_value(extra)?,
                    None => HashMap::new(),
                };
                let scope_ref = scope_name.map(|name| ScopeRef::Named(name.to_string()));
                let scope = self.scope(scope_ref.as_ref(), locals)?;
                Ok(Value::from_object(scope))
            }
            // Anything else is forwarded to the wrapped value.
            _ => self.value.call_method(state, name, args),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        Self: Sized + 'static,
    {
        write!(f, "{}", self.value)
    }
}

fn require_str_arg<'a>(args: &'a [Value], method: &str) -> Result<&'a str, Error> {
    args.first().and_then(|arg| arg.as_str()).ok_or_else(|| {
        Error::new(
            minijinja::ErrorKind::MissingArgument,
            format!("{}() requires a partial name", method),
        )
    })
}

/// Splits the optional locals dict of a template-side `render()` call,
/// pulling out the special `as` key.
fn split_render_locals(
    arg: Option<&Value>,
) -> Result<(Option<String>, HashMap<String, Value>), Error> {
    let Some(arg) = arg else {
        return Ok((None, HashMap::new()));
    };
    let mut locals = locals_from_value(arg)?;
    let rename = locals
        .remove("as")
        .and_then(|v| v.as_str().map(str::to_string));
    Ok((rename, locals))
}
