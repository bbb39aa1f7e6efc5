//! The rendering environment shared by every object in one render.
//!
//! [`RenderEnv`] bundles the renderer (paths, format, engine), the bound
//! context, and the part and scope builders. Scopes and parts created during
//! a render all carry the same environment, so nested renders agree on
//! format, lookup paths, and context.
//!
//! Collaborators that need to reach back into the environment (contexts and
//! builders) hold an [`EnvRef`], a weak handle bound at construction time.
//! The strong/weak split means a part keeping its environment alive does not
//! keep the environment's builders alive circularly.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use minijinja::value::Value;

use vellum_inflect::Inflector;

use crate::context::{Context, ContextObject};
use crate::error::{Result, ViewError};
use crate::part::AsOverride;
use crate::part_builder::PartBuilder;
use crate::renderer::Renderer;
use crate::scope::{Scope, ScopeRef};
use crate::scope_builder::ScopeBuilder;

struct EnvInner {
    renderer: Renderer,
    context: Arc<dyn Context>,
    scope_builder: ScopeBuilder,
    part_builder: PartBuilder,
    inflector: Inflector,
}

/// The environment for one render: renderer, context, and builders.
#[derive(Clone)]
pub struct RenderEnv {
    inner: Arc<EnvInner>,
}

impl RenderEnv {
    /// Builds an environment, binding the context and both builders to it.
    pub fn new(
        renderer: Renderer,
        context: Arc<dyn Context>,
        scope_builder: ScopeBuilder,
        part_builder: PartBuilder,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<EnvInner>| {
            let env_ref = EnvRef(weak.clone());
            EnvInner {
                context: context.for_env(env_ref.clone()),
                scope_builder: scope_builder.for_env(env_ref.clone()),
                part_builder: part_builder.for_env(env_ref),
                renderer,
                inflector: Inflector,
            }
        });
        Self { inner }
    }

    /// The active render format.
    pub fn format(&self) -> &str {
        self.inner.renderer.format()
    }

    /// The renderer bound to this environment.
    pub fn renderer(&self) -> &Renderer {
        &self.inner.renderer
    }

    /// The bound context.
    pub fn context(&self) -> &Arc<dyn Context> {
        &self.inner.context
    }

    /// The context wrapped as a template-facing value.
    pub fn context_value(&self) -> Value {
        Value::from_object(ContextObject(self.inner.context.clone()))
    }

    /// The inflector used for decorator name derivation.
    pub fn inflector(&self) -> &Inflector {
        &self.inner.inflector
    }

    /// Decorates `value` as a part named `name`.
    pub fn part(&self, name: &str, value: Value) -> Result<Value> {
        self.inner.part_builder.build(name, value, None)
    }

    /// Decorates `value` with an explicit decorator override.
    pub fn part_as(&self, name: &str, value: Value, rename: Option<&AsOverride>) -> Result<Value> {
        self.inner.part_builder.build(name, value, rename)
    }

    /// Builds a scope over `locals`, resolving behavior from `name`.
    pub fn scope(&self, name: Option<&ScopeRef>, locals: HashMap<String, Value>) -> Result<Scope> {
        self.inner.scope_builder.build(name, locals)
    }

    /// Renders the named template with `scope` as its evaluation context.
    pub fn template(&self, name: &str, scope: &Scope) -> Result<String> {
        self.inner
            .renderer
            .template(name, Value::from_object(scope.clone()), None)
    }

    /// Renders the named template with an inner content block, for layouts.
    pub fn template_with_content(
        &self,
        name: &str,
        scope: &Scope,
        content: &str,
    ) -> Result<String> {
        self.inner
            .renderer
            .template(name, Value::from_object(scope.clone()), Some(content))
    }

    /// Renders a partial (underscore-prefixed template) against `scope`,
    /// with an optional content block.
    pub fn partial(&self, name: &str, scope: &Scope, content: Option<&str>) -> Result<String> {
        self.inner
            .renderer
            .partial(name, Value::from_object(scope.clone()), content)
    }

    /// Returns an environment rebased into `dir`.
    ///
    /// All collaborators are re-bound to the new environment, so parts and
    /// scopes built under it resolve templates relative to `dir`.
    pub fn chdir(&self, dir: &str) -> RenderEnv {
        RenderEnv::new(
            self.inner.renderer.chdir(dir),
            self.inner.context.clone(),
            self.inner.scope_builder.clone(),
            self.inner.part_builder.clone(),
        )
    }

    /// True if `other` is this exact environment instance.
    pub fn same_env(&self, other: &RenderEnv) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A weak handle to this environment.
    pub fn downgrade(&self) -> EnvRef {
        EnvRef(Arc::downgrade(&self.inner))
    }
}

impl fmt::Debug for RenderEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderEnv")
            .field("renderer", &self.inner.renderer)
            .finish()
    }
}

/// Weak handle to a [`RenderEnv`], held by bound collaborators.
#[derive(Clone)]
pub struct EnvRef(Weak<EnvInner>);

impl EnvRef {
    /// Upgrades to the environment, erroring if it has been dropped.
    pub fn get(&self) -> Result<RenderEnv> {
        self.0
            .upgrade()
            .map(|inner| RenderEnv { inner })
            .ok_or(ViewError::Unbound)
    }
}

impl fmt::Debug for EnvRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvRef").finish()
    }
}
