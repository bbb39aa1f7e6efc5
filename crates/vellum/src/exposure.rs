//! Exposures: named, dependency-ordered value computations.
//!
//! An [`Exposure`] declares how one template-facing value is produced: from
//! a closure, from a named method on a bound receiver, or passed straight
//! through from the render input. Exposures may depend on each other; the
//! evaluation order is resolved over the whole [`ExposureSet`] (see the
//! `graph` module).
//!
//! Options control the output shape: `private` keeps a value available to
//! dependents but out of the rendered locals, `undecorated` skips part
//! decoration, `default` fills in the exposure's input key when the render
//! input lacks it, and an `as` override picks a non-default decorator.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::Value;

use crate::error::{Result, ViewError};
use crate::part::AsOverride;

/// Arguments handed to an exposure computation.
pub struct ExposureArgs<'a> {
    /// Values of the exposure's declared dependencies, in declaration order.
    pub deps: &'a [Value],
    /// The raw render input.
    pub input: &'a HashMap<String, Value>,
}

/// An exposure's computation closure.
pub type ExposureFn = Arc<dyn Fn(ExposureArgs<'_>) -> Result<Value> + Send + Sync>;

/// A receiver whose named methods back method-rule exposures.
pub trait ExposureMethods: Send + Sync {
    /// Invokes the named exposure method.
    fn call_exposure(&self, name: &str, args: ExposureArgs<'_>) -> Result<Value>;
}

/// How an exposure's value is produced.
#[derive(Clone)]
pub enum Rule {
    /// Call this closure.
    Function(ExposureFn),
    /// Call the named method on the set's bound receiver.
    Method(String),
    /// Read the input key of the exposure's name, falling back to the
    /// declared default.
    Passthrough,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Function(_) => f.write_str("Function"),
            Rule::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Rule::Passthrough => f.write_str("Passthrough"),
        }
    }
}

/// One named value computation.
#[derive(Clone)]
pub struct Exposure {
    name: String,
    rule: Rule,
    dependencies: Vec<String>,
    private: bool,
    decorate: bool,
    default: Option<Value>,
    rename: Option<AsOverride>,
}

impl Exposure {
    /// A passthrough exposure: its value is the input key of the same name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule: Rule::Passthrough,
            dependencies: Vec::new(),
            private: false,
            decorate: true,
            default: None,
            rename: None,
        }
    }

    /// An exposure computed by a closure.
    pub fn with(
        name: impl Into<String>,
        body: impl Fn(ExposureArgs<'_>) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            rule: Rule::Function(Arc::new(body)),
            ..Self::new(name)
        }
    }

    /// An exposure computed by a named method on the set's receiver.
    pub fn from_method(name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            rule: Rule::Method(method.into()),
            ..Self::new(name)
        }
    }

    /// Declares dependencies on other exposures, in evaluation order.
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = names.into_iter().map(Into::into).collect();
        self
    }

    /// Keeps the value out of the rendered locals. Dependents still see it.
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Skips part decoration for this value.
    pub fn undecorated(mut self) -> Self {
        self.decorate = false;
        self
    }

    /// Fallback value when the input lacks the exposure's key. A
    /// passthrough yields it directly; function and method rules see it as
    /// the key's value in their input.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Overrides the decorator used for this value.
    pub fn with_as(mut self, rename: AsOverride) -> Self {
        self.rename = Some(rename);
        self
    }

    /// The exposure name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared dependencies.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// True if the value is kept out of the rendered locals.
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// True if the value is decorated into a part.
    pub fn decorate(&self) -> bool {
        self.decorate
    }

    /// The decorator override, if any.
    pub fn rename(&self) -> Option<&AsOverride> {
        self.rename.as_ref()
    }

    /// Computes the raw value.
    pub(crate) fn evaluate(
        &self,
        deps: &[Value],
        input: &HashMap<String, Value>,
        receiver: Option<&Arc<dyn ExposureMethods>>,
    ) -> Result<Value> {
        match &self.rule {
            Rule::Function(body) => {
                let input = self.defaulted_input(input);
                body(ExposureArgs { deps, input: &input })
            }
            Rule::Method(method) => match receiver {
                Some(receiver) => {
                    let input = self.defaulted_input(input);
                    receiver.call_exposure(method, ExposureArgs { deps, input: &input })
                }
                None => Err(ViewError::Config(format!(
                    "exposure {} calls method {} but no receiver is bound",
                    self.name, method
                ))),
            },
            Rule::Passthrough => Ok(input
                .get(&self.name)
                .cloned()
                .or_else(|| self.default.clone())
                .unwrap_or(Value::UNDEFINED)),
        }
    }

    /// The input a computation sees: when a default is declared and the
    /// input lacks the exposure's key, the default fills that key in.
    fn defaulted_input<'a>(
        &self,
        input: &'a HashMap<String, Value>,
    ) -> Cow<'a, HashMap<String, Value>> {
        match &self.default {
            Some(default) if !input.contains_key(&self.name) => {
                let mut filled = input.clone();
                filled.insert(self.name.clone(), default.clone());
                Cow::Owned(filled)
            }
            _ => Cow::Borrowed(input),
        }
    }
}

impl fmt::Debug for Exposure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exposure")
            .field("name", &self.name)
            .field("rule", &self.rule)
            .field("dependencies", &self.dependencies)
            .field("private", &self.private)
            .field("decorate", &self.decorate)
            .finish()
    }
}

/// A declaration-ordered collection of exposures.
#[derive(Clone, Default)]
pub struct ExposureSet {
    exposures: Vec<Exposure>,
    receiver: Option<Arc<dyn ExposureMethods>>,
}

impl ExposureSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exposure, builder-style. Re-adding a name replaces the
    /// existing exposure in place, keeping its declaration position.
    pub fn add(mut self, exposure: Exposure) -> Self {
        match self
            .exposures
            .iter_mut()
            .find(|existing| existing.name() == exposure.name())
        {
            Some(existing) => *existing = exposure,
            None => self.exposures.push(exposure),
        }
        self
    }

    /// A copy of this set, for extending without touching the original.
    pub fn derive(&self) -> Self {
        self.clone()
    }

    /// Binds the receiver that backs method-rule exposures.
    pub fn bind(mut self, receiver: Arc<dyn ExposureMethods>) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// The bound receiver, if any.
    pub(crate) fn receiver(&self) -> Option<&Arc<dyn ExposureMethods>> {
        self.receiver.as_ref()
    }

    /// Looks up an exposure by name.
    pub fn get(&self, name: &str) -> Option<&Exposure> {
        self.exposures.iter().find(|exposure| exposure.name() == name)
    }

    /// True if the name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Exposures in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Exposure> {
        self.exposures.iter()
    }

    /// Number of declared exposures.
    pub fn len(&self) -> usize {
        self.exposures.len()
    }

    /// True if no exposures are declared.
    pub fn is_empty(&self) -> bool {
        self.exposures.is_empty()
    }
}

impl fmt::Debug for ExposureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExposureSet")
            .field(
                "exposures",
                &self.exposures.iter().map(Exposure::name).collect::<Vec<_>>(),
            )
            .field("bound", &self.receiver.is_some())
            .finish()
    }
}
