//! Rendering prelude for convenient imports.
//!
//! Re-exports the types most renders touch, so one line pulls in the whole
//! surface:
//!
//! ```rust,ignore
//! use vellum::prelude::*;
//!
//! let view = View::new(
//!     ViewConfig::new("users/index")
//!         .path("templates")
//!         .expose(Exposure::new("users")),
//! )?;
//! ```

// View configuration and rendering
pub use crate::view::{input_from, Rendered, View, ViewConfig};

// Exposures
pub use crate::exposure::{Exposure, ExposureArgs, ExposureMethods, ExposureSet};

// Decoration and scoping
pub use crate::part::{AsOverride, DecoratedAttr, Part, PartBehavior};
pub use crate::resolve::Resolution;
pub use crate::scope::{Scope, ScopeBehavior, ScopeRef};

// Context and errors
pub use crate::context::{Context, MapContext};
pub use crate::error::{Result, ViewError};

// Re-export minijinja::value::Value for convenience
pub use minijinja::value::Value;
