//! Views: configured, renderable units.
//!
//! A [`View`] ties together everything one render needs: template paths and
//! name, optional layout, format, exposures, registries, context, and the
//! engine. Configuration is immutable once the view is built; each
//! [`render`](View::render) call constructs a fresh environment, evaluates
//! the exposures against the call's input, and renders the template (and
//! layout) against the resulting scope.
//!
//! ```no_run
//! use std::collections::HashMap;
//! use vellum::{Exposure, View, ViewConfig};
//!
//! # fn main() -> Result<(), vellum::ViewError> {
//! let view = View::new(
//!     ViewConfig::new("users/index")
//!         .path("templates")
//!         .layout("app")
//!         .expose(Exposure::new("users")),
//! )?;
//! let rendered = view.render(HashMap::new())?;
//! println!("{}", rendered);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use minijinja::value::Value;
use serde::Serialize;

use crate::context::{Context, MapContext};
use crate::engine::{MiniJinjaEngine, TemplateEngine};
use crate::env::RenderEnv;
use crate::error::{Result, ViewError};
use crate::exposure::{Exposure, ExposureMethods, ExposureSet};
use crate::part_builder::PartBuilder;
use crate::path::TemplatePath;
use crate::registry::{PartRegistry, ScopeRegistry};
use crate::renderer::Renderer;
use crate::scope::ScopeRef;
use crate::scope_builder::ScopeBuilder;

/// Builder-style configuration for a [`View`].
#[derive(Clone)]
pub struct ViewConfig {
    template: String,
    paths: Vec<PathBuf>,
    layout: Option<String>,
    format: String,
    scope: Option<ScopeRef>,
    exposures: ExposureSet,
    parts: PartRegistry,
    scopes: ScopeRegistry,
    context: Arc<dyn Context>,
}

impl ViewConfig {
    /// Starts a configuration for the named template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            paths: Vec::new(),
            layout: None,
            format: "html".to_string(),
            scope: None,
            exposures: ExposureSet::new(),
            parts: PartRegistry::new(),
            scopes: ScopeRegistry::new(),
            context: Arc::new(MapContext::new()),
        }
    }

    /// Adds a template lookup path. Paths are searched in the order added.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Wraps renders in the named layout (looked up under `layouts/`).
    pub fn layout(mut self, name: impl Into<String>) -> Self {
        self.layout = Some(name.into());
        self
    }

    /// Sets the render format. Defaults to `html`.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Gives the template's root scope a named or direct behavior.
    pub fn scope(mut self, scope: impl Into<ScopeRef>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Declares an exposure. Re-declaring a name replaces it in place.
    pub fn expose(mut self, exposure: Exposure) -> Self {
        self.exposures = self.exposures.add(exposure);
        self
    }

    /// Replaces the whole exposure set.
    pub fn exposures(mut self, exposures: ExposureSet) -> Self {
        self.exposures = exposures;
        self
    }

    /// Registers a part behavior under a camelized type name.
    pub fn part(
        mut self,
        name: impl Into<String>,
        behavior: Arc<dyn crate::part::PartBehavior>,
    ) -> Self {
        self.parts = self.parts.add(name, behavior);
        self
    }

    /// Registers a scope behavior under a camelized type name.
    pub fn scope_behavior(
        mut self,
        name: impl Into<String>,
        behavior: Arc<dyn crate::scope::ScopeBehavior>,
    ) -> Self {
        self.scopes = self.scopes.add(name, behavior);
        self
    }

    /// Sets the default context for renders.
    pub fn context(mut self, context: Arc<dyn Context>) -> Self {
        self.context = context;
        self
    }
}

impl fmt::Debug for ViewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewConfig")
            .field("template", &self.template)
            .field("paths", &self.paths)
            .field("layout", &self.layout)
            .field("format", &self.format)
            .field("exposures", &self.exposures)
            .finish()
    }
}

/// A configured, renderable view.
///
/// The template paths and behavior builders live on the view, so their
/// lookup and resolution caches persist for the view's lifetime and are
/// shared by every render.
pub struct View {
    config: ViewConfig,
    engine: Arc<dyn TemplateEngine>,
    paths: Vec<TemplatePath>,
    scope_builder: ScopeBuilder,
    part_builder: PartBuilder,
}

impl View {
    /// Builds a view over the default MiniJinja engine.
    pub fn new(config: ViewConfig) -> Result<Self> {
        Self::with_engine(config, Arc::new(MiniJinjaEngine::new()))
    }

    /// Builds a view over a custom engine.
    pub fn with_engine(config: ViewConfig, engine: Arc<dyn TemplateEngine>) -> Result<Self> {
        if config.template.is_empty() {
            return Err(ViewError::Config("a view needs a template name".into()));
        }
        if config.paths.is_empty() {
            return Err(ViewError::Config(format!(
                "view {} has no template paths",
                config.template
            )));
        }
        let paths = config.paths.iter().map(TemplatePath::new).collect();
        let scope_builder = ScopeBuilder::new(config.scopes.clone());
        let part_builder = PartBuilder::new(config.parts.clone());
        Ok(Self {
            config,
            engine,
            paths,
            scope_builder,
            part_builder,
        })
    }

    /// Binds the receiver backing method-rule exposures.
    pub fn with_receiver(mut self, receiver: Arc<dyn ExposureMethods>) -> Self {
        self.config.exposures = self.config.exposures.bind(receiver);
        self
    }

    /// The view's configuration.
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Renders with the configured context.
    pub fn render(&self, input: HashMap<String, Value>) -> Result<Rendered> {
        self.render_with(self.config.context.clone(), input)
    }

    /// Renders with a call-time context in place of the configured one.
    pub fn render_with(
        &self,
        context: Arc<dyn Context>,
        input: HashMap<String, Value>,
    ) -> Result<Rendered> {
        let env = self.environment(context);
        // Exposures and the root scope carry the environment positioned at
        // the template itself, so partials rendered from the template (or
        // from its parts and scopes) resolve relative to the template's
        // directory, falling back upward toward the path root.
        let template_env = env.chdir(&self.config.template);
        let locals = self.config.exposures.evaluate(&input, &template_env)?;

        let scope = template_env.scope(self.config.scope.as_ref(), locals.clone())?;
        let mut output = env.template(&self.config.template, &scope)?;

        if let Some(layout) = &self.config.layout {
            let layout_name = format!("layouts/{}", layout);
            let layout_env = env.chdir(&layout_name);
            let layout_scope = layout_env.scope(None, locals.clone())?;
            output = env.template_with_content(&layout_name, &layout_scope, &output)?;
        }

        Ok(Rendered { output, locals })
    }

    fn environment(&self, context: Arc<dyn Context>) -> RenderEnv {
        // Clones share the underlying lookup and resolution caches.
        let renderer = Renderer::new(
            self.paths.clone(),
            self.config.format.clone(),
            self.engine.clone(),
        );
        RenderEnv::new(
            renderer,
            context,
            self.scope_builder.clone(),
            self.part_builder.clone(),
        )
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("config", &self.config)
            .finish()
    }
}

/// The result of a render: the output string plus the evaluated locals.
#[derive(Debug, Clone)]
pub struct Rendered {
    output: String,
    locals: HashMap<String, Value>,
}

impl Rendered {
    /// The rendered output.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// One evaluated local by name, as the template saw it.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// All evaluated locals.
    pub fn locals(&self) -> &HashMap<String, Value> {
        &self.locals
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output)
    }
}

/// Builds a render input map from any serializable value with named fields.
pub fn input_from<T: Serialize>(input: &T) -> Result<HashMap<String, Value>> {
    let value = Value::from_serialize(input);
    let mut map = HashMap::new();
    for key in value.try_iter().map_err(ViewError::from)? {
        let entry = value.get_item(&key).map_err(ViewError::from)?;
        let name = key
            .as_str()
            .ok_or_else(|| ViewError::Config("input keys must be strings".into()))?
            .to_string();
        map.insert(name, entry);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn input(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_config_requires_template_and_paths() {
        let err = View::new(ViewConfig::new("")).unwrap_err();
        assert!(matches!(err, ViewError::Config(_)));

        let err = View::new(ViewConfig::new("index")).unwrap_err();
        assert!(matches!(err, ViewError::Config(_)));
    }

    #[test]
    fn test_render_exposure_into_template() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "greet.html.jinja", "Hello, {{ user }}!");

        let view = View::new(
            ViewConfig::new("greet")
                .path(tmp.path())
                .expose(Exposure::new("user")),
        )
        .unwrap();
        let rendered = view
            .render(input(&[("user", Value::from("Ada"))]))
            .unwrap();
        assert_eq!(rendered.output(), "Hello, Ada!");
        assert!(rendered.get("user").is_some());
    }

    #[test]
    fn test_layout_wraps_template_output() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "page.html.jinja", "body");
        write(tmp.path(), "layouts/app.html.jinja", "<html>{{ content }}</html>");

        let view = View::new(ViewConfig::new("page").path(tmp.path()).layout("app")).unwrap();
        let rendered = view.render(HashMap::new()).unwrap();
        assert_eq!(rendered.output(), "<html>body</html>");
    }

    #[test]
    fn test_layout_sees_locals() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "page.html.jinja", "x");
        write(
            tmp.path(),
            "layouts/app.html.jinja",
            "{{ title }}|{{ content }}",
        );

        let view = View::new(
            ViewConfig::new("page")
                .path(tmp.path())
                .layout("app")
                .expose(Exposure::new("title").undecorated()),
        )
        .unwrap();
        let rendered = view
            .render(input(&[("title", Value::from("T"))]))
            .unwrap();
        assert_eq!(rendered.output(), "T|x");
    }

    #[test]
    fn test_render_with_call_time_context() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "page.html.jinja", "{{ site }}");

        let view = View::new(ViewConfig::new("page").path(tmp.path())).unwrap();
        let ctx = Arc::new(MapContext::new().with("site", Value::from("Example")));
        let rendered = view.render_with(ctx, HashMap::new()).unwrap();
        assert_eq!(rendered.output(), "Example");
    }

    #[test]
    fn test_partial_resolves_relative_to_template_dir() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "users/index.html.jinja", "{{ render(\"card\") }}");
        write(tmp.path(), "users/_card.html.jinja", "card");

        let view = View::new(ViewConfig::new("users/index").path(tmp.path())).unwrap();
        let rendered = view.render(HashMap::new()).unwrap();
        assert_eq!(rendered.output(), "card");
    }

    #[test]
    fn test_lookup_cache_persists_across_renders() {
        let tmp = TempDir::new().unwrap();
        let view = View::new(ViewConfig::new("late").path(tmp.path())).unwrap();
        let err = view.render(HashMap::new()).unwrap_err();
        assert!(matches!(err, ViewError::TemplateNotFound { .. }));

        // The miss is cached for the life of the view, so a template
        // appearing afterwards stays invisible.
        write(tmp.path(), "late.html.jinja", "now");
        let err = view.render(HashMap::new()).unwrap_err();
        assert!(matches!(err, ViewError::TemplateNotFound { .. }));
    }

    #[test]
    fn test_missing_template_reports_searched_paths() {
        let tmp = TempDir::new().unwrap();
        let view = View::new(ViewConfig::new("absent").path(tmp.path())).unwrap();
        let err = view.render(HashMap::new()).unwrap_err();
        assert!(matches!(err, ViewError::TemplateNotFound { .. }));
    }

    #[test]
    fn test_rendered_display_is_output() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "page.html.jinja", "out");
        let view = View::new(ViewConfig::new("page").path(tmp.path())).unwrap();
        assert_eq!(view.render(HashMap::new()).unwrap().to_string(), "out");
    }

    #[test]
    fn test_input_from_serializable_struct() {
        #[derive(Serialize)]
        struct In {
            user: &'static str,
            count: u32,
        }

        let map = input_from(&In {
            user: "ada",
            count: 2,
        })
        .unwrap();
        assert_eq!(map["user"], Value::from("ada"));
        assert_eq!(map["count"], Value::from(2));
    }
}
