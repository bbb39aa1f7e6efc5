//! Error types for the rendering pipeline.
//!
//! [`ViewError`] is the single error type surfaced by all public operations.
//! It distinguishes configuration errors (cycles, undeclared dependencies,
//! missing paths), lookup failures (template not found, carrying the searched
//! directories), evaluation errors (propagated from exposure rules or the
//! template engine), and unresolved member access on parts and scopes.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring or executing a render.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Exposure dependencies form a cycle. Fatal configuration error,
    /// detected before any exposure is evaluated.
    #[error("cyclic exposure dependency: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// The exposures on the cycle, in dependency order, with the first
        /// name repeated at the end.
        cycle: Vec<String>,
    },

    /// An exposure declared a dependency on a name that is not a declared
    /// exposure. Programmer error, not a runtime condition.
    #[error("exposure '{exposure}' depends on undeclared exposure '{dependency}'")]
    UnknownDependency {
        /// The exposure whose declaration is at fault.
        exposure: String,
        /// The name it referenced.
        dependency: String,
    },

    /// No template file matched the logical name in any configured path.
    #[error("template not found: \"{name}\" (searched: {})", .searched.join(", "))]
    TemplateNotFound {
        /// The logical template name that was requested.
        name: String,
        /// The directories that were probed, in order.
        searched: Vec<String>,
    },

    /// `Scope::render` was called without a partial name on an anonymous
    /// scope.
    #[error("no partial name given and the scope has no name")]
    MissingPartialName,

    /// A member lookup on a part or scope matched nothing in its resolution
    /// chain. Distinguishes "no such member" from a legitimate null value.
    #[error("no member '{name}' on {receiver}")]
    UnresolvedMember {
        /// What was being resolved against ("part", "scope", "context").
        receiver: &'static str,
        /// The requested member name.
        name: String,
    },

    /// Invalid view configuration (missing template name, empty path list,
    /// method-rule exposure without a bound receiver).
    #[error("invalid view configuration: {0}")]
    Config(String),

    /// A builder was asked to build before being bound to a rendering
    /// environment, or the environment it was bound to is gone.
    #[error("builder is not bound to a rendering environment")]
    Unbound,

    /// Template syntax or rendering failure from the template engine.
    #[error("template error: {0}")]
    Template(String),

    /// Failed to read a template file from disk.
    #[error("failed to read template {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An exposure rule failed. Propagated unchanged to the caller.
    #[error("{0}")]
    Evaluation(String),
}

/// Result type for rendering operations.
pub type Result<T, E = ViewError> = std::result::Result<T, E>;

impl From<minijinja::Error> for ViewError {
    fn from(err: minijinja::Error) -> Self {
        ViewError::Template(err.to_string())
    }
}

// Scope and part methods invoked from inside a template must surface
// failures through the engine's error type.
impl From<ViewError> for minijinja::Error {
    fn from(err: ViewError) -> Self {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_names_members() {
        let err = ViewError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic exposure dependency: a -> b -> a");
    }

    #[test]
    fn test_not_found_display_lists_paths() {
        let err = ViewError::TemplateNotFound {
            name: "users/show".into(),
            searched: vec!["/app/templates".into(), "/shared".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("users/show"));
        assert!(msg.contains("/app/templates"));
        assert!(msg.contains("/shared"));
    }

    #[test]
    fn test_minijinja_roundtrip() {
        let err = ViewError::MissingPartialName;
        let mj: minijinja::Error = err.into();
        let back: ViewError = mj.into();
        assert!(matches!(back, ViewError::Template(_)));
    }
}
