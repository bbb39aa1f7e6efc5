//! Directory-scoped template lookup with upward fallback.
//!
//! A [`TemplatePath`] pairs a current directory with the root it was
//! configured from. Looking up a logical name probes the directory itself,
//! then its `shared/` subdirectory, then walks upward one directory at a time
//! until the root has been probed. Results (including misses) are cached in an
//! explicit, injectable [`LookupCache`] keyed by
//! `(directory, root, name, format)` — templates on disk are assumed immutable
//! for the life of the process.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Recognized template file extensions in priority order.
///
/// A logical name `greeting` with format `html` matches `greeting.html.jinja`
/// before `greeting.html.txt`.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["jinja", "jinja2", "j2", "txt"];

/// Cache key for one lookup: where we looked and what for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    /// Directory the lookup started from.
    pub dir: PathBuf,
    /// Root directory bounding the upward walk.
    pub root: PathBuf,
    /// Logical template name.
    pub name: String,
    /// Render format (e.g. "html").
    pub format: String,
}

/// Thread-safe memo of lookup results, shared across concurrent renders.
///
/// Misses are cached too: a `None` entry records that the full fallback walk
/// found nothing. The cache is cheap to clone (shared storage) and can be
/// cleared for test isolation.
#[derive(Clone, Default)]
pub struct LookupCache {
    entries: Arc<RwLock<HashMap<LookupKey, Option<PathBuf>>>>,
}

impl LookupCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for `key`, computing and storing it on miss.
    pub fn fetch(
        &self,
        key: LookupKey,
        compute: impl FnOnce() -> Option<PathBuf>,
    ) -> Option<PathBuf> {
        {
            let entries = match self.entries.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(hit) = entries.get(&key) {
                return hit.clone();
            }
        }
        let result = compute();
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.entry(key).or_insert_with(|| result.clone());
        result
    }

    /// Number of cached lookups (hits and misses).
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// True if nothing has been cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all cached entries.
    pub fn clear(&self) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.clear();
    }
}

impl fmt::Debug for LookupCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupCache")
            .field("entries", &self.len())
            .finish()
    }
}

/// A `(directory, root)` pair for template lookup.
///
/// Immutable: [`chdir`](Self::chdir) derives a new value sharing the same
/// cache, never mutating the original.
#[derive(Debug, Clone)]
pub struct TemplatePath {
    dir: PathBuf,
    root: PathBuf,
    cache: LookupCache,
}

impl TemplatePath {
    /// Creates a path rooted (and currently positioned) at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            dir: root.clone(),
            root,
            cache: LookupCache::new(),
        }
    }

    /// Replaces the lookup cache, e.g. with one shared across views.
    pub fn with_cache(mut self, cache: LookupCache) -> Self {
        self.cache = cache;
        self
    }

    /// The current lookup directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The configured root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derives a new path positioned at `dir` below the current directory.
    pub fn chdir(&self, dir: &str) -> Self {
        Self {
            dir: self.dir.join(dir),
            root: self.root.clone(),
            cache: self.cache.clone(),
        }
    }

    /// Locates a template file for `name` + `format`, walking upward.
    ///
    /// Probes `dir/{name}.{format}.{ext}` over [`TEMPLATE_EXTENSIONS`], then
    /// `dir/shared/…`, then the parent directory, stopping once the root has
    /// been probed.
    pub fn lookup(&self, name: &str, format: &str) -> Option<PathBuf> {
        self.lookup_with(name, format, TEMPLATE_EXTENSIONS)
    }

    /// Like [`lookup`](Self::lookup) with an explicit extension list, so the
    /// engine adapter stays authoritative about what it can render.
    pub fn lookup_with(&self, name: &str, format: &str, extensions: &[&str]) -> Option<PathBuf> {
        let key = LookupKey {
            dir: self.dir.clone(),
            root: self.root.clone(),
            name: name.to_string(),
            format: format.to_string(),
        };
        self.cache
            .fetch(key, || self.search(name, format, extensions))
    }

    fn search(&self, name: &str, format: &str, extensions: &[&str]) -> Option<PathBuf> {
        if let Some(hit) = probe(&self.dir, name, format, extensions) {
            return Some(hit);
        }
        if let Some(hit) = probe(&self.dir.join("shared"), name, format, extensions) {
            return Some(hit);
        }
        if self.dir != self.root {
            if let Some(parent) = self.dir.parent() {
                let above = Self {
                    dir: parent.to_path_buf(),
                    root: self.root.clone(),
                    cache: self.cache.clone(),
                };
                return above.lookup_with(name, format, extensions);
            }
        }
        None
    }
}

fn probe(dir: &Path, name: &str, format: &str, extensions: &[&str]) -> Option<PathBuf> {
    for ext in extensions {
        let candidate = dir.join(format!("{}.{}.{}", name, format, ext));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_lookup_direct_hit() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "greeting.html.jinja", "hi");

        let path = TemplatePath::new(tmp.path());
        let hit = path.lookup("greeting", "html").unwrap();
        assert_eq!(hit, tmp.path().join("greeting.html.jinja"));
    }

    #[test]
    fn test_lookup_extension_priority() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "greeting.html.txt", "low");
        write(tmp.path(), "greeting.html.jinja", "high");

        let path = TemplatePath::new(tmp.path());
        let hit = path.lookup("greeting", "html").unwrap();
        assert!(hit.to_string_lossy().ends_with(".jinja"));
    }

    #[test]
    fn test_lookup_shared_fallback() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "shared/header.html.jinja", "hdr");

        let path = TemplatePath::new(tmp.path());
        let hit = path.lookup("header", "html").unwrap();
        assert_eq!(hit, tmp.path().join("shared/header.html.jinja"));
    }

    #[test]
    fn test_lookup_walks_upward_to_root_shared() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "shared/footer.html.jinja", "ftr");
        fs::create_dir_all(tmp.path().join("users/admin")).unwrap();

        let path = TemplatePath::new(tmp.path()).chdir("users").chdir("admin");
        let hit = path.lookup("footer", "html").unwrap();
        assert_eq!(hit, tmp.path().join("shared/footer.html.jinja"));
    }

    #[test]
    fn test_lookup_does_not_walk_above_root() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "outside.html.jinja", "x");
        fs::create_dir_all(tmp.path().join("views")).unwrap();

        // Rooted at views/: the file one level above must stay invisible.
        let path = TemplatePath::new(tmp.path().join("views"));
        assert!(path.lookup("outside", "html").is_none());
    }

    #[test]
    fn test_lookup_miss_is_cached() {
        let tmp = TempDir::new().unwrap();
        let path = TemplatePath::new(tmp.path());

        assert!(path.lookup("missing", "html").is_none());
        let cached = path.lookup("missing", "html");
        assert!(cached.is_none());

        // The template appearing later is not picked up: process-lifetime cache.
        write(tmp.path(), "missing.html.jinja", "late");
        assert!(path.lookup("missing", "html").is_none());
    }

    #[test]
    fn test_chdir_produces_new_value() {
        let tmp = TempDir::new().unwrap();
        let path = TemplatePath::new(tmp.path());
        let sub = path.chdir("users");
        assert_eq!(path.dir(), tmp.path());
        assert_eq!(sub.dir(), tmp.path().join("users"));
        assert_eq!(sub.root(), tmp.path());
    }

    #[test]
    fn test_cache_clear_resets() {
        let tmp = TempDir::new().unwrap();
        let cache = LookupCache::new();
        let path = TemplatePath::new(tmp.path()).with_cache(cache.clone());

        assert!(path.lookup("missing", "html").is_none());
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
