//! Relative import specifiers between generated modules and their sources.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn to_specifier(path: &Path) -> String {
    path.components()
        .map(|c| match c {
            Component::RootDir => String::new(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Import specifier for `target` as seen from a module living in `from_dir`.
///
/// Both paths are compared lexically, so they must share a base: both
/// absolute, or both relative to the same directory. The working directory is
/// never consulted. When only `target` is absolute there is no relative path
/// to compute and its absolute form is returned instead.
///
/// The result always uses forward slashes and, for relative results, starts
/// with `./` or `../`.
///
/// ```rust
/// use autoapi::generator::imports::relative_import;
/// use std::path::Path;
///
/// assert_eq!(relative_import(Path::new("generated"), Path::new("api/index.ts")), "../api/index.ts");
/// assert_eq!(relative_import(Path::new("generated"), Path::new("generated/api.ts")), "./api.ts");
/// ```
pub fn relative_import(from_dir: &Path, target: &Path) -> String {
    if target.is_absolute() && !from_dir.is_absolute() {
        return to_specifier(&normalize(target));
    }
    let (from, to) = (normalize(from_dir), normalize(target));

    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    let joined = parts.join("/");
    if joined.starts_with("../") || joined == ".." {
        joined
    } else {
        format!("./{joined}")
    }
}
