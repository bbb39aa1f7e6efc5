//! # Vellum - Template View Rendering
//!
//! `vellum` renders file-based templates through configured views: declared
//! exposures compute the values a template needs, those values are decorated
//! into presentation-aware parts, and everything is evaluated inside a scope
//! that resolves names against locals and a shared context.
//!
//! ## Core Concepts
//!
//! - [`View`] / [`ViewConfig`]: a renderable unit tying template, paths,
//!   layout, exposures, and registries together
//! - [`Exposure`] / [`ExposureSet`]: named value computations with
//!   dependencies, evaluated in dependency order
//! - [`Part`]: a decorator wrapping one value with template-facing behavior
//! - [`Scope`]: the evaluation context for one template, resolving names
//!   through behavior, locals, context, and convenience accessors
//! - [`TemplatePath`]: file lookup with shared-directory and upward fallback
//! - [`TemplateEngine`]: the engine seam; [`MiniJinjaEngine`] is the default
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::collections::HashMap;
//! use minijinja::value::Value;
//! use vellum::{Exposure, ExposureArgs, View, ViewConfig};
//!
//! # fn main() -> Result<(), vellum::ViewError> {
//! let view = View::new(
//!     ViewConfig::new("users/index")
//!         .path("templates")
//!         .layout("app")
//!         .expose(Exposure::new("users"))
//!         .expose(
//!             Exposure::with("count", |args: ExposureArgs<'_>| {
//!                 Ok(Value::from(args.deps[0].len().unwrap_or(0)))
//!             })
//!             .depends_on(["users"])
//!             .undecorated(),
//!         ),
//! )?;
//!
//! let mut input = HashMap::new();
//! input.insert(
//!     "users".to_string(),
//!     Value::from(vec![Value::from("ada"), Value::from("grace")]),
//! );
//! let rendered = view.render(input)?;
//! println!("{}", rendered);
//! # Ok(())
//! # }
//! ```
//!
//! ## Parts and Scopes
//!
//! Every truthy exposure value reaches the template wrapped in a [`Part`].
//! Custom behaviors registered on the view add computed accessors:
//!
//! ```
//! use std::sync::Arc;
//! use minijinja::value::Value;
//! use vellum::{Part, PartBehavior, Resolution, ViewConfig};
//!
//! struct UserPart;
//!
//! impl PartBehavior for UserPart {
//!     fn resolve(&self, part: &Part, name: &str) -> Result<Resolution, vellum::ViewError> {
//!         if name == "display_name" {
//!             let raw = part.value().get_attr("name").unwrap_or(Value::UNDEFINED);
//!             return Ok(Resolution::Found(Value::from(format!("~{}~", raw))));
//!         }
//!         Ok(Resolution::NotFound)
//!     }
//! }
//!
//! let config = ViewConfig::new("users/show")
//!     .path("templates")
//!     .part("User", Arc::new(UserPart));
//! ```

// Internal modules
pub mod context;
pub mod engine;
pub mod env;
mod error;
pub mod exposure;
mod graph;
pub mod part;
pub mod part_builder;
pub mod path;
pub mod prelude;
pub mod registry;
pub mod renderer;
mod resolve;
pub mod scope;
pub mod scope_builder;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

// Error type
pub use error::{Result, ViewError};

// View exports
pub use view::{input_from, Rendered, View, ViewConfig};

// Exposure exports
pub use exposure::{Exposure, ExposureArgs, ExposureFn, ExposureMethods, ExposureSet, Rule};

// Part exports
pub use part::{
    AsOverride, DecoratedAttr, DecoratorRef, DefaultPart, Part, PartBehavior, PartOptions,
};
pub use part_builder::PartBuilder;

// Scope exports
pub use scope::{DefaultScope, Scope, ScopeBehavior, ScopeRef};
pub use scope_builder::ScopeBuilder;

// Resolution primitives
pub use resolve::Resolution;

// Environment exports
pub use context::{Context, MapContext};
pub use env::{EnvRef, RenderEnv};

// Rendering exports
pub use engine::{MiniJinjaEngine, TemplateEngine};
pub use path::{LookupCache, TemplatePath, TEMPLATE_EXTENSIONS};
pub use registry::{PartRegistry, ResolutionCache, ScopeRegistry};
pub use renderer::Renderer;
