//! Lexical path handling.
//!
//! Paths in the VFS are always `/`-separated and absolute once resolved.
//! Nothing here touches the tree: `..` is collapsed textually, and symlinks
//! are only followed later, during lookup.

/// Resolve `path` to a normalized absolute path.
///
/// Relative paths are taken against `cwd`; a leading `~` component is
/// replaced with `home`. `.` and `..` components are collapsed, `..` at the
/// root stays at the root, and repeated or trailing separators disappear.
///
/// Resolution is idempotent: resolving an already-resolved path returns it
/// unchanged.
pub fn resolve(path: &str, cwd: &str, home: &str) -> String {
    let expanded;
    let path = if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/") {
        expanded = format!("{home}/{rest}");
        &expanded
    } else {
        path
    };

    if path.starts_with('/') {
        normalize(path)
    } else {
        normalize(&format!("{cwd}/{path}"))
    }
}

/// Collapse `.`, `..` and duplicate separators. Always returns an absolute
/// path; a relative input is treated as relative to `/`.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Join a child name onto a directory path and normalize the result.
pub fn join(dir: &str, name: &str) -> String {
    if name.starts_with('/') {
        normalize(name)
    } else {
        normalize(&format!("{dir}/{name}"))
    }
}

/// Split a normalized path into its parent directory and final name.
///
/// Returns `None` for the root, which has no parent.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    if path == "/" {
        return None;
    }
    let idx = path.rfind('/')?;
    let parent = if idx == 0 { "/" } else { &path[..idx] };
    Some((parent, &path[idx + 1..]))
}

/// Final component of a path, as `basename` would print it.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "" } else { "/" };
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Directory portion of a path, as `dirname` would print it.
pub fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" };
    }
    match trimmed.rfind('/') {
        None => ".",
        Some(idx) => {
            let dir = trimmed[..idx].trim_end_matches('/');
            if dir.is_empty() {
                "/"
            } else {
                dir
            }
        }
    }
}

/// Components of a normalized absolute path, root excluded.
pub fn components(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

/// A name that may appear as a single directory entry.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/", "/", "/")]
    #[case("a/b", "/home/user", "/home/user/a/b")]
    #[case("../..", "/home/user", "/")]
    #[case("../../../..", "/home/user", "/")]
    #[case("/usr//bin/", "/", "/usr/bin")]
    #[case("./x/./y/..", "/tmp", "/tmp/x")]
    #[case("~", "/tmp", "/home/user")]
    #[case("~/notes", "/tmp", "/home/user/notes")]
    #[case("~other", "/tmp", "/tmp/~other")]
    fn resolves(#[case] input: &str, #[case] cwd: &str, #[case] expected: &str) {
        assert_eq!(resolve(input, cwd, "/home/user"), expected);
    }

    #[rstest]
    #[case("a/../b/./c")]
    #[case("/x/y/../../..")]
    #[case("~/deep/../er")]
    #[case("////")]
    fn resolution_is_idempotent(#[case] input: &str) {
        let once = resolve(input, "/srv/app", "/home/user");
        assert_eq!(resolve(&once, "/elsewhere", "/nowhere"), once);
    }

    #[test]
    fn components_walk_both_ways() {
        assert_eq!(components("/usr//local/bin/").collect::<Vec<_>>(), ["usr", "local", "bin"]);
        assert_eq!(components("/usr/local/bin").rev().collect::<Vec<_>>(), ["bin", "local", "usr"]);
        assert_eq!(components("/").count(), 0);
    }

    #[test]
    fn split_parent_of_top_level() {
        assert_eq!(split_parent("/etc"), Some(("/", "etc")));
        assert_eq!(split_parent("/etc/hosts"), Some(("/etc", "hosts")));
        assert_eq!(split_parent("/"), None);
    }

    #[rstest]
    #[case("/usr/bin/ls", "ls", "/usr/bin")]
    #[case("notes.txt", "notes.txt", ".")]
    #[case("/", "/", "/")]
    #[case("dir/", "dir", ".")]
    #[case("/top", "top", "/")]
    fn basename_and_dirname(#[case] input: &str, #[case] base: &str, #[case] dir: &str) {
        assert_eq!(basename(input), base);
        assert_eq!(dirname(input), dir);
    }
}
