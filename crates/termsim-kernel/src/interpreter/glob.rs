//! Filename expansion of unquoted glob words against the VFS.
//!
//! A pattern is split on `/` into segments. Literal segments must exist;
//! wildcard segments are matched against directory listings, so matches
//! come out in listing order. Results keep the form the user typed:
//! `docs/*.md` expands to `docs/a.md`, never to an absolute path.

use termsim_glob::Pattern;

use super::parser::Word;
use crate::vfs::{path, Vfs};

/// One `/`-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    /// Plain name, escapes already removed.
    Literal(String),
    /// Name with wildcards.
    Pattern(Pattern),
}

impl Segment {
    fn parse(part: &str) -> Self {
        if has_wildcard(part) {
            Segment::Pattern(Pattern::new(part))
        } else {
            Segment::Literal(unescape(part))
        }
    }
}

/// A partial match: the components typed so far and where they lead.
struct Candidate {
    shown: Vec<String>,
    dir: String,
}

/// Expand one word into the arguments it stands for.
///
/// Words without an unquoted wildcard, and patterns matching nothing,
/// come back as their literal text.
pub fn expand_word(word: &Word, vfs: &Vfs, cwd: &str) -> Vec<String> {
    let Some(pattern) = &word.pattern else {
        return vec![word.text.clone()];
    };

    let matches = expand_pattern(pattern, vfs, cwd);
    if matches.is_empty() {
        vec![word.text.clone()]
    } else {
        matches
    }
}

fn expand_pattern(pattern: &str, vfs: &Vfs, cwd: &str) -> Vec<String> {
    let absolute = pattern.starts_with('/');
    let trailing_slash = pattern.len() > 1 && pattern.ends_with('/');
    let segments: Vec<Segment> = pattern
        .split('/')
        .filter(|part| !part.is_empty())
        .map(Segment::parse)
        .collect();

    let start = if absolute { "/".to_string() } else { path::normalize(cwd) };
    let mut candidates = vec![Candidate {
        shown: Vec::new(),
        dir: start,
    }];

    for (i, segment) in segments.iter().enumerate() {
        let needs_dir = i + 1 < segments.len() || trailing_slash;
        let mut next = Vec::new();

        for candidate in &candidates {
            match segment {
                Segment::Literal(name) => {
                    let full = path::normalize(&path::join(&candidate.dir, name));
                    let found = if needs_dir {
                        vfs.is_dir(&full)
                    } else {
                        vfs.lstat(&full).is_ok()
                    };
                    if found {
                        next.push(candidate.extend(name, full));
                    }
                }
                Segment::Pattern(glob) => {
                    let Ok(entries) = vfs.list(&candidate.dir) else {
                        continue;
                    };
                    for entry in entries {
                        if entry.name.starts_with('.') && !glob.matches_hidden() {
                            continue;
                        }
                        if !glob.matches(&entry.name) {
                            continue;
                        }
                        let full = path::join(&candidate.dir, &entry.name);
                        if needs_dir && !vfs.is_dir(&full) {
                            continue;
                        }
                        next.push(candidate.extend(&entry.name, full));
                    }
                }
            }
        }

        candidates = next;
        if candidates.is_empty() {
            return Vec::new();
        }
    }

    candidates
        .into_iter()
        .map(|c| {
            let mut text = c.shown.join("/");
            if absolute {
                text.insert(0, '/');
            }
            if trailing_slash {
                text.push('/');
            }
            text
        })
        .collect()
}

impl Candidate {
    fn extend(&self, name: &str, dir: String) -> Candidate {
        let mut shown = self.shown.clone();
        shown.push(name.to_string());
        Candidate { shown, dir }
    }
}

/// True if `part` has a `*`, `?` or `[` that is not backslash-escaped.
fn has_wildcard(part: &str) -> bool {
    let mut chars = part.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '*' | '?' | '[' => return true,
            _ => {}
        }
    }
    false
}

fn unescape(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut chars = part.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vfs() -> Vfs {
        let mut vfs = Vfs::new();
        vfs.mkdir("/work/docs", true).unwrap();
        vfs.mkdir("/work/src", true).unwrap();
        for file in [
            "/work/a.txt",
            "/work/b.txt",
            "/work/c.md",
            "/work/.hidden.txt",
            "/work/docs/guide.md",
            "/work/docs/intro.md",
            "/work/src/main.rs",
        ] {
            vfs.write(file, b"x", false).unwrap();
        }
        vfs
    }

    fn glob(pattern: &str) -> Word {
        Word {
            text: pattern.replace('\\', ""),
            pattern: Some(pattern.to_string()),
        }
    }

    #[test]
    fn star_in_cwd() {
        assert_eq!(
            expand_word(&glob("*.txt"), &vfs(), "/work"),
            vec!["a.txt", "b.txt"]
        );
    }

    #[test]
    fn hidden_needs_explicit_dot() {
        assert_eq!(
            expand_word(&glob(".*.txt"), &vfs(), "/work"),
            vec![".hidden.txt"]
        );
    }

    #[test]
    fn path_prefix_is_kept() {
        assert_eq!(
            expand_word(&glob("docs/*.md"), &vfs(), "/work"),
            vec!["docs/guide.md", "docs/intro.md"]
        );
        assert_eq!(
            expand_word(&glob("/work/src/*"), &vfs(), "/"),
            vec!["/work/src/main.rs"]
        );
    }

    #[test]
    fn wildcard_directories() {
        assert_eq!(
            expand_word(&glob("*/*.md"), &vfs(), "/work"),
            vec!["docs/guide.md", "docs/intro.md"]
        );
        assert_eq!(expand_word(&glob("*/"), &vfs(), "/work"), vec!["docs/", "src/"]);
    }

    #[test]
    fn classes_and_braces() {
        assert_eq!(
            expand_word(&glob("[ab].txt"), &vfs(), "/work"),
            vec!["a.txt", "b.txt"]
        );
        assert_eq!(
            expand_word(&glob("*.{md,txt}"), &vfs(), "/work"),
            vec!["a.txt", "b.txt", "c.md"]
        );
    }

    #[test]
    fn no_match_is_literal() {
        assert_eq!(expand_word(&glob("*.zip"), &vfs(), "/work"), vec!["*.zip"]);
        assert_eq!(expand_word(&glob("nope/*"), &vfs(), "/work"), vec!["nope/*"]);
    }

    #[test]
    fn plain_words_untouched() {
        let word = Word::literal("*.txt");
        assert_eq!(expand_word(&word, &vfs(), "/work"), vec!["*.txt"]);
    }

    #[test]
    fn escaped_wildcard_is_literal_segment() {
        assert!(!has_wildcard("a\\*b"));
        assert_eq!(unescape("a\\*b"), "a*b");
    }
}
