//! Brace alternation (`{a,b,c}`).

/// Expand the brace groups of a pattern into every alternative.
///
/// Groups nest and multiply: `{a,b}{1,2}` yields four patterns. A pattern
/// without a balanced group is returned unchanged.
///
/// ```
/// use termsim_glob::expand_braces;
/// assert_eq!(expand_braces("plain"), vec!["plain"]);
/// assert_eq!(expand_braces("x.{c,h}"), vec!["x.c", "x.h"]);
/// ```
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close)) = outer_group(pattern) else {
        return vec![pattern.to_string()];
    };

    let head = &pattern[..open];
    let body = &pattern[open + 1..close];
    let tail = &pattern[close + 1..];

    let alternatives = split_top_level(body);
    if alternatives.len() < 2 {
        // `{x}` is not an alternation in bash either
        return vec![pattern.to_string()];
    }

    alternatives
        .into_iter()
        .flat_map(|alt| expand_braces(&format!("{head}{alt}{tail}")))
        .collect()
}

/// Byte offsets of the first balanced `{ ... }` group.
fn outer_group(pattern: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut open = None;
    let mut escaped = false;

    for (i, c) in pattern.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => {
                if depth == 0 {
                    open = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return open.map(|o| (o, i));
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_groups() {
        assert_eq!(expand_braces("{a,b{1,2}}"), vec!["a", "b1", "b2"]);
    }

    #[test]
    fn multiple_groups_multiply() {
        assert_eq!(expand_braces("{a,b}{1,2}"), vec!["a1", "a2", "b1", "b2"]);
    }

    #[test]
    fn single_alternative_is_literal() {
        assert_eq!(expand_braces("{solo}"), vec!["{solo}"]);
    }

    #[test]
    fn unbalanced_is_literal() {
        assert_eq!(expand_braces("{a,b"), vec!["{a,b"]);
    }

    #[test]
    fn empty_alternative() {
        assert_eq!(expand_braces("file{,.bak}"), vec!["file", "file.bak"]);
    }
}
