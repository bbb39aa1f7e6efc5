//! Shared helpers for unit tests.

use std::path::Path;
use std::sync::Arc;

use crate::context::{Context, MapContext};
use crate::engine::MiniJinjaEngine;
use crate::env::RenderEnv;
use crate::part_builder::PartBuilder;
use crate::path::TemplatePath;
use crate::registry::{PartRegistry, ScopeRegistry};
use crate::renderer::Renderer;
use crate::scope_builder::ScopeBuilder;

/// An environment over an unremarkable directory, for tests that never
/// actually resolve a template.
pub(crate) fn test_env() -> RenderEnv {
    env_over(std::env::temp_dir())
}

/// An environment whose renderer looks up templates under `dir`.
pub(crate) fn env_over(dir: impl AsRef<Path>) -> RenderEnv {
    build(
        dir.as_ref(),
        Arc::new(MapContext::new()),
        PartRegistry::new(),
        ScopeRegistry::new(),
    )
}

/// An environment with the given registries.
pub(crate) fn env_with(parts: PartRegistry, scopes: ScopeRegistry) -> RenderEnv {
    build(
        &std::env::temp_dir(),
        Arc::new(MapContext::new()),
        parts,
        scopes,
    )
}

/// An environment with the given context.
pub(crate) fn env_with_context(context: Arc<dyn Context>) -> RenderEnv {
    build(
        &std::env::temp_dir(),
        context,
        PartRegistry::new(),
        ScopeRegistry::new(),
    )
}

fn build(
    dir: &Path,
    context: Arc<dyn Context>,
    parts: PartRegistry,
    scopes: ScopeRegistry,
) -> RenderEnv {
    let renderer = Renderer::new(
        vec![TemplatePath::new(dir)],
        "html",
        Arc::new(MiniJinjaEngine::new()),
    );
    RenderEnv::new(
        renderer,
        context,
        ScopeBuilder::new(scopes),
        PartBuilder::new(parts),
    )
}
