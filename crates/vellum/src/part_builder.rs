//! Decorating values into parts.
//!
//! The builder turns an exposure value into its template-facing part. Scalar
//! values get one part; sequences get a collection part whose elements are
//! each decorated under the singularized name. Behavior selection goes
//! through the part registry by camelized name, with [`DefaultPart`] as the
//! fallback, memoized per builder.

use std::fmt;

use minijinja::value::{Value, ValueKind};
use std::sync::Arc;

use vellum_inflect::camelize;

use crate::env::EnvRef;
use crate::error::{Result, ViewError};
use crate::part::{AsOverride, DecoratorRef, DefaultPart, Part, PartBehavior};
use crate::registry::{PartRegistry, ResolutionCache};

/// Builds parts from exposure values, resolving behaviors by name.
#[derive(Clone)]
pub struct PartBuilder {
    registry: PartRegistry,
    cache: ResolutionCache<Arc<dyn PartBehavior>>,
    env: Option<EnvRef>,
}

impl PartBuilder {
    /// Creates a builder over a registry. The builder is inert until bound
    /// to an environment.
    pub fn new(registry: PartRegistry) -> Self {
        Self {
            registry,
            cache: ResolutionCache::new(),
            env: None,
        }
    }

    /// Binds the builder to an environment. The behavior cache is shared
    /// with the unbound original.
    pub fn for_env(self, env: EnvRef) -> Self {
        Self {
            env: Some(env),
            ..self
        }
    }

    /// The behavior resolution cache.
    pub fn cache(&self) -> &ResolutionCache<Arc<dyn PartBehavior>> {
        &self.cache
    }

    /// Decorates `value` as a part named `name`.
    ///
    /// Sequences become a collection part over per-element parts; the
    /// element name is the singularized `name`. `rename` overrides behavior
    /// selection for the part (and, in its pair form, for the elements).
    pub fn build(&self, name: &str, value: Value, rename: Option<&AsOverride>) -> Result<Value> {
        let env = self.env.as_ref().ok_or(ViewError::Unbound)?.get()?;

        if value.kind() == ValueKind::Seq {
            let (coll_ref, elem_ref) = match rename {
                Some(rename) => rename.for_sequence(),
                None => (None, None),
            };
            let elem_name = env.inflector().singularize(name);
            let elem_behavior = self.behavior_for(&elem_name, elem_ref);

            let elements: Vec<Value> = value
                .try_iter()
                .map_err(ViewError::from)?
                .map(|item| {
                    Value::from_object(Part::new(
                        elem_name.clone(),
                        item,
                        env.clone(),
                        elem_behavior.clone(),
                    ))
                })
                .collect();

            let behavior = self.behavior_for(name, coll_ref);
            return Ok(Value::from_object(Part::new(
                name,
                Value::from(elements),
                env,
                behavior,
            )));
        }

        let behavior = self.behavior_for(name, rename.map(AsOverride::for_scalar));
        Ok(Value::from_object(Part::new(name, value, env, behavior)))
    }

    fn behavior_for(
        &self,
        name: &str,
        rename: Option<&DecoratorRef>,
    ) -> Arc<dyn PartBehavior> {
        match rename {
            Some(DecoratorRef::Behavior(behavior)) => behavior.clone(),
            Some(DecoratorRef::Named(named)) => self.lookup(named),
            None => self.lookup(name),
        }
    }

    fn lookup(&self, name: &str) -> Arc<dyn PartBehavior> {
        let key = camelize(name);
        self.cache.get_or_insert(&key, || {
            self.registry
                .get(&key)
                .unwrap_or_else(|| Arc::new(DefaultPart))
        })
    }
}

impl fmt::Debug for PartBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartBuilder")
            .field("registry", &self.registry)
            .field("bound", &self.env.is_some())
            .finish()
    }
}
