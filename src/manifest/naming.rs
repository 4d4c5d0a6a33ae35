//! Route and identifier derivation from a file's path relative to the scan root.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path};

static ROUTE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("route token regex should be valid"));

/// Words that cannot be used as a binding name in an ES module
const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let", "new",
    "null", "package", "private", "protected", "public", "return", "static", "super", "switch",
    "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while", "with", "yield",
];

/// Whether `name` is reserved in strict-mode module code
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Path segments of `relative` with the extension removed from the last one
fn segments(relative: &Path) -> Vec<String> {
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();
    if let Some(last) = segments.last_mut() {
        if let Some(stem) = Path::new(last.as_str()).file_stem() {
            *last = stem.to_string_lossy().into_owned();
        }
    }
    segments
}

/// URL route for a source file.
///
/// `[param]` segments become `:param`, a trailing `index` is elided and the
/// root is exactly `/`.
///
/// ```rust
/// use autoapi::manifest::route_for;
/// use std::path::Path;
///
/// assert_eq!(route_for(Path::new("index.ts")), "/");
/// assert_eq!(route_for(Path::new("test/index.ts")), "/test");
/// assert_eq!(route_for(Path::new("default/[post]/comments/[id].ts")), "/default/:post/comments/:id");
/// ```
pub fn route_for(relative: &Path) -> String {
    let mut segments = segments(relative);
    if segments.last().map(String::as_str) == Some("index") {
        segments.pop();
    }
    let route = segments
        .iter()
        .map(|s| ROUTE_TOKEN.replace_all(s, ":$1").into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{route}")
}

/// JavaScript identifier seed for a source file.
///
/// Segments are joined with `_`, anything outside `[A-Za-z0-9_$]` becomes `_`
/// and a leading digit is prefixed with `_`. The result is not yet unique;
/// see [`unique_identifier`].
pub fn identifier_for(relative: &Path) -> String {
    sanitize_identifier(&segments(relative).join("_"))
}

/// Replace characters that cannot appear in a JavaScript identifier.
///
/// A leading digit or a reserved word gets a `_` prefix.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut ident: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if ident.is_empty()
        || ident.starts_with(|c: char| c.is_ascii_digit())
        || is_reserved_word(&ident)
    {
        ident.insert(0, '_');
    }
    ident
}

/// Make `name` unique among `seen`, suffixing `_1`, `_2`, … on collision.
///
/// Seed `seen` with the names the enclosing module declares itself so a
/// generated import never redeclares them.
pub(crate) fn unique_identifier(seen: &mut HashSet<String>, name: &str) -> String {
    if seen.insert(name.to_string()) {
        return name.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{name}_{counter}");
        if seen.insert(candidate.clone()) {
            tracing::debug!("duplicate identifier '{name}' -> using '{candidate}'");
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_for_literal_cases() {
        assert_eq!(route_for(Path::new("index.ts")), "/");
        assert_eq!(route_for(Path::new("test/index.ts")), "/test");
        assert_eq!(route_for(Path::new("test/test.ts")), "/test/test");
        assert_eq!(
            route_for(Path::new("default/[post]/comments/[id].ts")),
            "/default/:post/comments/:id"
        );
    }

    #[test]
    fn test_route_for_other_extensions_and_nesting() {
        assert_eq!(route_for(Path::new("index.js")), "/");
        assert_eq!(route_for(Path::new("users/[id]/index.mjs")), "/users/:id");
        assert_eq!(route_for(Path::new("a/b/c.tsx")), "/a/b/c");
        assert_eq!(route_for(Path::new("post-[slug].ts")), "/post-:slug");
    }

    #[test]
    fn test_route_for_only_trailing_index_is_elided() {
        assert_eq!(route_for(Path::new("index/list.ts")), "/index/list");
    }

    #[test]
    fn test_identifier_for() {
        assert_eq!(identifier_for(Path::new("index.js")), "index");
        assert_eq!(identifier_for(Path::new("test/index.ts")), "test_index");
        assert_eq!(identifier_for(Path::new("default/patch.ts")), "default_patch");
        assert_eq!(
            identifier_for(Path::new("default/[post]/comments/[id].ts")),
            "default__post__comments__id_"
        );
        assert_eq!(identifier_for(Path::new("v1/user-list.ts")), "v1_user_list");
        assert_eq!(identifier_for(Path::new("2fa/verify.ts")), "_2fa_verify");
    }

    #[test]
    fn test_sanitize_identifier_keeps_dollar() {
        assert_eq!(sanitize_identifier("$store"), "$store");
        assert_eq!(sanitize_identifier("a.b c"), "a_b_c");
        assert_eq!(sanitize_identifier(""), "_");
    }

    #[test]
    fn test_reserved_words_are_prefixed() {
        assert_eq!(identifier_for(Path::new("delete.ts")), "_delete");
        assert_eq!(identifier_for(Path::new("new.js")), "_new");
        assert_eq!(identifier_for(Path::new("users/delete.ts")), "users_delete");
        assert_eq!(sanitize_identifier("class"), "_class");
        assert_eq!(sanitize_identifier("classes"), "classes");
    }

    #[test]
    fn test_unique_identifier_respects_seeded_names() {
        let mut seen: HashSet<String> = ["router".to_string(), "express".to_string()].into();
        assert_eq!(unique_identifier(&mut seen, "router"), "router_1");
        assert_eq!(unique_identifier(&mut seen, "express"), "express_1");
        assert_eq!(unique_identifier(&mut seen, "users"), "users");
    }

    #[test]
    fn test_unique_identifier() {
        let mut seen = HashSet::new();
        assert_eq!(unique_identifier(&mut seen, "index"), "index");
        assert_eq!(unique_identifier(&mut seen, "index"), "index_1");
        assert_eq!(unique_identifier(&mut seen, "index"), "index_2");
        assert_eq!(unique_identifier(&mut seen, "index_1_x"), "index_1_x");
    }
}
