//! termsim-glob: shell-style filename patterns.
//!
//! Provides:
//! - **Pattern**: a compiled glob (`*`, `?`, `[abc]`, `[a-z]`, `[!x]`, `\*`)
//! - **expand_braces**: `{a,b}` alternation, applied before compilation
//! - **glob_match** / **contains_glob**: one-shot helpers for callers that
//!   don't need to keep a compiled pattern around
//!
//! Matching is case-sensitive and operates on a single path component; the
//! caller is responsible for splitting paths on `/`.

mod braces;
mod pattern;

pub use braces::expand_braces;
pub use pattern::Pattern;

/// Check if a word contains glob metacharacters (`*`, `?`, `[`).
///
/// ```
/// use termsim_glob::contains_glob;
/// assert!(contains_glob("*.txt"));
/// assert!(contains_glob("log[0-9]"));
/// assert!(!contains_glob("notes.txt"));
/// ```
pub fn contains_glob(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Match `input` against a glob `pattern`.
///
/// ```
/// use termsim_glob::glob_match;
/// assert!(glob_match("*.rs", "main.rs"));
/// assert!(glob_match("file?.txt", "file1.txt"));
/// assert!(glob_match("*.{md,txt}", "README.md"));
/// assert!(!glob_match("*.rs", "main.go"));
/// ```
pub fn glob_match(pattern: &str, input: &str) -> bool {
    Pattern::new(pattern).matches(input)
}
