//! Template engine abstraction.
//!
//! The rendering core treats the template engine as an external collaborator
//! behind the [`TemplateEngine`] trait: given a resolved template path, a
//! scope value serving as the full evaluation context, and an optional
//! content block, produce a string. The default implementation is
//! [`MiniJinjaEngine`].
//!
//! Template sources are read from disk on each render, so edits to template
//! files are picked up without restarting during development.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use minijinja::value::{Object, Value};
use minijinja::{Environment, UndefinedBehavior};

use crate::error::{Result, ViewError};
use crate::path::TEMPLATE_EXTENSIONS;

/// A template engine that renders a template file against a scope object.
///
/// The scope value is the template's entire evaluation context: every
/// top-level name in the template resolves through it. `content` carries the
/// already-rendered inner output when a layout template wraps it; the engine
/// must expose it to the template as `content`.
pub trait TemplateEngine: Send + Sync {
    /// Renders the template at `path` with `scope` as the root context.
    fn render(&self, path: &Path, scope: Value, content: Option<&str>) -> Result<String>;

    /// File extensions this engine can render, in priority order.
    fn extensions(&self) -> &[&str] {
        TEMPLATE_EXTENSIONS
    }
}

/// MiniJinja-based template engine.
///
/// Runs with strict undefined behavior: using a name the scope cannot resolve
/// is a render error, never silent empty output.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    /// Creates a new engine with strict undefined behavior.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }

    /// Returns a reference to the underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Returns a mutable reference to the underlying MiniJinja environment,
    /// for registering custom filters or functions.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, path: &Path, scope: Value, content: Option<&str>) -> Result<String> {
        let source = std::fs::read_to_string(path).map_err(|source| ViewError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let root = Value::from_object(RenderRoot {
            scope,
            content: content.map(str::to_string),
        });
        Ok(self.env.render_str(&source, root)?)
    }
}

/// Root context handed to the engine: the scope, plus the layout content
/// block under the `content` name.
#[derive(Debug)]
struct RenderRoot {
    scope: Value,
    content: Option<String>,
}

impl Object for RenderRoot {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let name = key.as_str()?;
        if name == "content" {
            if let Some(content) = &self.content {
                return Some(Value::from_safe_string(content.clone()));
            }
        }
        match self.scope.get_attr(name) {
            Ok(value) if !value.is_undefined() => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for MiniJinjaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiniJinjaEngine").finish()
    }
}
