//! String inflection helpers for the vellum view-rendering pipeline.
//!
//! This crate provides the four transforms the rendering core needs to move
//! between exposure names, decorator registry keys, and template names:
//!
//! - [`camelize`]: `"user_article"` → `"UserArticle"`
//! - [`underscore`]: `"UserArticle"` → `"user_article"`
//! - [`demodulize`]: `"parts::UserArticle"` → `"UserArticle"`
//! - [`singularize`]: `"articles"` → `"article"`
//!
//! All transforms are pure string operations — no regex, no allocation beyond
//! the returned `String`. Singularization uses a sorted irregular-noun table
//! with binary search plus standard English suffix rules.
//!
//! # Example
//!
//! ```
//! use vellum_inflect::{camelize, singularize, underscore};
//!
//! assert_eq!(camelize("user_articles"), "UserArticles");
//! assert_eq!(singularize("dependencies"), "dependency");
//! assert_eq!(underscore("UserArticle"), "user_article");
//! ```

/// Irregular plural → singular mappings, sorted by plural for binary search.
static IRREGULARS: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("axes", "axis"),
    ("bases", "basis"),
    ("children", "child"),
    ("crises", "crisis"),
    ("criteria", "criterion"),
    ("data", "datum"),
    ("diagnoses", "diagnosis"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("hypotheses", "hypothesis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("media", "medium"),
    ("men", "man"),
    ("mice", "mouse"),
    ("oxen", "ox"),
    ("people", "person"),
    ("statuses", "status"),
    ("teeth", "tooth"),
    ("theses", "thesis"),
    ("vertices", "vertex"),
    ("women", "woman"),
];

/// Words that are the same in singular and plural form, sorted.
static UNCOUNTABLE: &[&str] = &[
    "equipment",
    "fish",
    "information",
    "money",
    "news",
    "series",
    "sheep",
    "species",
];

/// Converts a plural English word to its singular form.
///
/// Handles irregular plurals, uncountable nouns (returned unchanged), and the
/// standard suffix rules (`-ies` → `-y`, `-ves` → `-f`/`-fe`, `-es` after a
/// sibilant, plain `-s`). Words that already look singular are returned
/// unchanged. Only the last `/`- or `_`-free tail matters for the rules, so
/// compound names like `"blog_posts"` become `"blog_post"`.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    // Apply rules to the final underscore-separated segment so compound
    // exposure names inflect on their head noun.
    if let Some(idx) = word.rfind('_') {
        let (head, tail) = word.split_at(idx + 1);
        return format!("{}{}", head, singularize_word(tail));
    }
    singularize_word(word)
}

fn singularize_word(word: &str) -> String {
    let lower = word.to_ascii_lowercase();

    if UNCOUNTABLE.binary_search(&lower.as_str()).is_ok() {
        return word.to_string();
    }
    if let Ok(idx) = IRREGULARS.binary_search_by_key(&lower.as_str(), |(p, _)| p) {
        return IRREGULARS[idx].1.to_string();
    }

    // -ies → -y (dependencies → dependency), but not for short words like "ties"
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() > 1 {
            return format!("{}y", stem);
        }
    }
    // -ves → -f (wolves → wolf); knife-style words need -fe but are rare
    // enough that -f plus the irregular table covers real exposure names
    if let Some(stem) = word.strip_suffix("ves") {
        return format!("{}f", stem);
    }
    // -es after a sibilant: boxes → box, dishes → dish, classes → class
    if let Some(stem) = word.strip_suffix("es") {
        if stem.ends_with('x')
            || stem.ends_with('z')
            || stem.ends_with("ch")
            || stem.ends_with("sh")
            || stem.ends_with("ss")
        {
            return stem.to_string();
        }
    }
    // Plain -s, but not -ss (class) or -us (status)
    if let Some(stem) = word.strip_suffix('s') {
        if !stem.ends_with('s') && !stem.ends_with('u') && !stem.is_empty() {
            return stem.to_string();
        }
    }

    word.to_string()
}

/// Converts a snake_case (optionally `/`-separated) name to CamelCase.
///
/// Every `/` segment is camelized, with its underscores as word
/// boundaries, and the segments are joined with `::` so registry keys can
/// mirror module paths.
///
/// ```
/// use vellum_inflect::camelize;
/// assert_eq!(camelize("user_article"), "UserArticle");
/// assert_eq!(camelize("admin/user_article"), "Admin::UserArticle");
/// ```
pub fn camelize(name: &str) -> String {
    name.split('/')
        .map(camelize_segment)
        .collect::<Vec<_>>()
        .join("::")
}

fn camelize_segment(segment: &str) -> String {
    segment
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Converts a CamelCase (optionally `::`-qualified) name to snake_case.
///
/// The inverse of [`camelize`]: `::` separators become `/`.
///
/// ```
/// use vellum_inflect::underscore;
/// assert_eq!(underscore("UserArticle"), "user_article");
/// assert_eq!(underscore("Admin::UserArticle"), "admin/user_article");
/// ```
pub fn underscore(name: &str) -> String {
    name.split("::")
        .map(underscore_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn underscore_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    let mut prev_lower = false;
    for ch in segment.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

/// Strips any `::`-qualified namespace, leaving the final name.
///
/// ```
/// use vellum_inflect::demodulize;
/// assert_eq!(demodulize("parts::UserArticle"), "UserArticle");
/// assert_eq!(demodulize("UserArticle"), "UserArticle");
/// ```
pub fn demodulize(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

/// Unit-struct handle bundling the inflection functions.
///
/// The rendering environment threads an `Inflector` value so collaborators
/// (part builder, scope rendering) call inflection through one seam.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inflector;

impl Inflector {
    /// See [`camelize`].
    pub fn camelize(&self, name: &str) -> String {
        camelize(name)
    }

    /// See [`underscore`].
    pub fn underscore(&self, name: &str) -> String {
        underscore(name)
    }

    /// See [`demodulize`].
    pub fn demodulize<'a>(&self, name: &'a str) -> &'a str {
        demodulize(name)
    }

    /// See [`singularize`].
    pub fn singularize(&self, word: &str) -> String {
        singularize(word)
    }
}
