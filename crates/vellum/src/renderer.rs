//! Template rendering over an ordered list of lookup paths.
//!
//! [`Renderer`] resolves logical template names through its [`TemplatePath`]
//! list (first hit wins), then delegates to the [`TemplateEngine`]. It also
//! carries the active render format and the current-directory position:
//! [`chdir`](Renderer::chdir) rebases every path so relative nested renders
//! resolve against the new directory.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use minijinja::value::Value;

use crate::engine::TemplateEngine;
use crate::error::{Result, ViewError};
use crate::path::TemplatePath;

/// Renders templates resolved from an ordered path list.
#[derive(Clone)]
pub struct Renderer {
    paths: Vec<TemplatePath>,
    format: String,
    engine: Arc<dyn TemplateEngine>,
}

impl Renderer {
    /// Creates a renderer over `paths` with the given format and engine.
    pub fn new(
        paths: Vec<TemplatePath>,
        format: impl Into<String>,
        engine: Arc<dyn TemplateEngine>,
    ) -> Self {
        Self {
            paths,
            format: format.into(),
            engine,
        }
    }

    /// The active render format (e.g. "html").
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Resolves a logical template name to a file, trying each path in order.
    pub fn lookup(&self, name: &str) -> Option<PathBuf> {
        self.paths
            .iter()
            .find_map(|path| path.lookup_with(name, &self.format, self.engine.extensions()))
    }

    /// Renders the named template with `scope` as its evaluation context.
    ///
    /// `content` carries the inner output when a layout wraps another render.
    pub fn template(&self, name: &str, scope: Value, content: Option<&str>) -> Result<String> {
        match self.lookup(name) {
            Some(path) => self.engine.render(&path, scope, content),
            None => Err(ViewError::TemplateNotFound {
                name: name.to_string(),
                searched: self.searched_dirs(),
            }),
        }
    }

    /// Renders a partial: the last segment of the logical name is prefixed
    /// with an underscore (`users/header` → `users/_header`).
    ///
    /// `content` is exposed to the partial as its `content` block when
    /// given.
    pub fn partial(&self, name: &str, scope: Value, content: Option<&str>) -> Result<String> {
        self.template(&partial_name(name), scope, content)
    }

    /// Returns a renderer rebased into `dir` relative to every path.
    pub fn chdir(&self, dir: &str) -> Renderer {
        Self {
            paths: self.paths.iter().map(|path| path.chdir(dir)).collect(),
            format: self.format.clone(),
            engine: self.engine.clone(),
        }
    }

    fn searched_dirs(&self) -> Vec<String> {
        self.paths
            .iter()
            .map(|path| path.dir().display().to_string())
            .collect()
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("paths", &self.paths)
            .field("format", &self.format)
            .finish()
    }
}

fn partial_name(name: &str) -> String {
    match name.rsplit_once('/') {
        Some((dir, base)) => format!("{}/_{}", dir, base),
        None => format!("_{}", name),
    }
}
