//! Building scopes from locals.
//!
//! Mirrors the part builder: behavior selection goes through the scope
//! registry by camelized name with [`DefaultScope`] as the fallback,
//! memoized per builder.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::Value;

use vellum_inflect::camelize;

use crate::env::EnvRef;
use crate::error::{Result, ViewError};
use crate::registry::{ResolutionCache, ScopeRegistry};
use crate::scope::{DefaultScope, Scope, ScopeBehavior, ScopeRef};

/// Builds scopes, resolving behaviors by name.
#[derive(Clone)]
pub struct ScopeBuilder {
    registry: ScopeRegistry,
    cache: ResolutionCache<Arc<dyn ScopeBehavior>>,
    env: Option<EnvRef>,
}

impl ScopeBuilder {
    /// Creates a builder over a registry. The builder is inert until bound
    /// to an environment.
    pub fn new(registry: ScopeRegistry) -> Self {
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
    pub fn cache(&self) -> &ResolutionCache<Arc<dyn ScopeBehavior>> {
        &self.cache
    }

    /// Builds a scope over `locals`.
    ///
    /// With a named reference the behavior comes from the registry (default
    /// fallback on a miss) and the scope keeps the name for partial-name
    /// derivation. Without a reference the scope is anonymous.
    pub fn build(&self, name: Option<&ScopeRef>, locals: HashMap<String, Value>) -> Result<Scope> {
        let env = self.env.as_ref().ok_or(ViewError::Unbound)?.get()?;
        let (scope_name, behavior) = match name {
            None => (None, Arc::new(DefaultScope) as Arc<dyn ScopeBehavior>),
            Some(ScopeRef::Behavior(behavior)) => (None, behavior.clone()),
            Some(ScopeRef::Named(named)) => {
                let key = camelize(named);
                let behavior = self.cache.get_or_insert(&key, || {
                    self.registry
                        .get(&key)
                        .unwrap_or_else(|| Arc::new(DefaultScope))
                });
                (Some(named.clone()), behavior)
            }
        };
        Ok(Scope::new(scope_name, locals, env, behavior))
    }
}

impl fmt::Debug for ScopeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeBuilder")
            .field("registry", &self.registry)
            .field("bound", &self.env.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolution;
    use crate::test_support::{env_with, test_env};
    use crate::registry::PartRegistry;

    struct Marker;
    impl ScopeBehavior for Marker {
        fn resolve(&self, _scope: &Scope, name: &str) -> Result<Resolution> {
            if name == "marked" {
                return Ok(Resolution::Found(Value::from(true)));
            }
            Ok(Resolution::NotFound)
        }
    }

    #[test]
    fn test_anonymous_scope_gets_default_behavior() {
        let env = test_env();
        let scope = env.scope(None, HashMap::new()).unwrap();
        assert!(scope.name().is_none());
        assert!(scope.get("marked").is_err());
    }

    #[test]
    fn test_named_scope_resolves_registered_behavior() {
        let registry = ScopeRegistry::new().add("SidebarMenu", Arc::new(Marker));
        let env = env_with(PartRegistry::new(), registry);
        let named = ScopeRef::from("sidebar_menu");
        let scope = env.scope(Some(&named), HashMap::new()).unwrap();
        assert_eq!(scope.name(), Some("sidebar_menu"));
        assert_eq!(scope.get("marked").unwrap(), Value::from(true));
    }

    #[test]
    fn test_unregistered_name_falls_back_to_default() {
        let env = test_env();
        let named = ScopeRef::from("unknown");
        let scope = env.scope(Some(&named), HashMap::new()).unwrap();
        assert_eq!(scope.name(), Some("unknown"));
        assert!(scope.get("marked").is_err());
    }

    #[test]
    fn test_direct_behavior_reference() {
        let env = test_env();
        let by_handle = ScopeRef::Behavior(Arc::new(Marker));
        let scope = env.scope(Some(&by_handle), HashMap::new()).unwrap();
        assert!(scope.name().is_none());
        assert_eq!(scope.get("marked").unwrap(), Value::from(true));
    }

    #[test]
    fn test_unbound_builder_errors() {
        let builder = ScopeBuilder::new(ScopeRegistry::new());
        let err = builder.build(None, HashMap::new()).unwrap_err();
        assert!(matches!(err, ViewError::Unbound));
    }
}
