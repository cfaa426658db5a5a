//! Compiled glob patterns.

use crate::braces::expand_braces;

/// One unit of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(char),
    /// `?`
    AnyChar,
    /// `*`
    AnyRun,
    Class(CharClass),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CharClass {
    negated: bool,
    ranges: Vec<(char, char)>,
}

impl CharClass {
    fn contains(&self, c: char) -> bool {
        let hit = self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
        hit != self.negated
    }
}

impl Piece {
    fn accepts(&self, c: char) -> bool {
        match self {
            Piece::Literal(l) => *l == c,
            Piece::AnyChar => true,
            Piece::AnyRun => true,
            Piece::Class(class) => class.contains(c),
        }
    }
}

/// A compiled glob pattern, possibly with several brace alternatives.
///
/// ```
/// use termsim_glob::Pattern;
///
/// let p = Pattern::new("[a-c]*.log");
/// assert!(p.matches("app.log"));
/// assert!(!p.matches("zed.log"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    alternatives: Vec<Vec<Piece>>,
}

impl Pattern {
    /// Compile a pattern. Never fails: malformed classes match literally.
    pub fn new(source: &str) -> Self {
        let alternatives = expand_braces(source)
            .iter()
            .map(|alt| compile(alt))
            .collect();
        Self {
            source: source.to_string(),
            alternatives,
        }
    }

    /// The text this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the pattern explicitly starts with a dot, so it may match
    /// hidden entries.
    pub fn matches_hidden(&self) -> bool {
        self.alternatives
            .iter()
            .any(|alt| matches!(alt.first(), Some(Piece::Literal('.'))))
    }

    /// Match the whole of `input`.
    pub fn matches(&self, input: &str) -> bool {
        let text: Vec<char> = input.chars().collect();
        self.alternatives.iter().any(|alt| match_pieces(alt, &text))
    }
}

fn compile(source: &str) -> Vec<Piece> {
    let chars: Vec<char> = source.chars().collect();
    let mut pieces = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Runs of stars collapse into one
                if pieces.last() != Some(&Piece::AnyRun) {
                    pieces.push(Piece::AnyRun);
                }
                i += 1;
            }
            '?' => {
                pieces.push(Piece::AnyChar);
                i += 1;
            }
            '\\' if i + 1 < chars.len() => {
                pieces.push(Piece::Literal(chars[i + 1]));
                i += 2;
            }
            '[' => match parse_class(&chars[i..]) {
                Some((class, used)) => {
                    pieces.push(Piece::Class(class));
                    i += used;
                }
                None => {
                    pieces.push(Piece::Literal('['));
                    i += 1;
                }
            },
            c => {
                pieces.push(Piece::Literal(c));
                i += 1;
            }
        }
    }
    pieces
}

/// Parse `[...]` at the start of `chars`. Returns the class and the number
/// of chars consumed, or `None` when the bracket is never closed.
fn parse_class(chars: &[char]) -> Option<(CharClass, usize)> {
    let mut i = 1;
    let negated = matches!(chars.get(i), Some('!') | Some('^'));
    if negated {
        i += 1;
    }

    let body_start = i;
    let mut ranges = Vec::new();

    loop {
        let c = *chars.get(i)?;
        // `]` right after the opener is a literal member
        if c == ']' && i > body_start {
            return Some((CharClass { negated, ranges }, i + 1));
        }
        match (chars.get(i + 1), chars.get(i + 2)) {
            (Some('-'), Some(&hi)) if hi != ']' => {
                ranges.push((c, hi));
                i += 3;
            }
            _ => {
                ranges.push((c, c));
                i += 1;
            }
        }
    }
}

/// Iterative wildcard match with a single backtrack point per `*`.
fn match_pieces(pieces: &[Piece], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        match pieces.get(p) {
            Some(Piece::AnyRun) => {
                resume = Some((p, t));
                p += 1;
            }
            Some(piece) if piece.accepts(text[t]) => {
                p += 1;
                t += 1;
            }
            _ => match resume {
                Some((star, consumed)) => {
                    p = star + 1;
                    t = consumed + 1;
                    resume = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }

    pieces[p..].iter().all(|piece| *piece == Piece::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("hello", "hello", true)]
    #[case("hello", "hell", false)]
    #[case("", "", true)]
    #[case("*", "", true)]
    #[case("*", "anything", true)]
    #[case("*.txt", "notes.txt", true)]
    #[case("*.txt", "notes.txt.bak", false)]
    #[case("a*b*c", "aXXbYYc", true)]
    #[case("a*b*c", "aXXbYY", false)]
    #[case("?", "x", true)]
    #[case("?", "", false)]
    #[case("file?.log", "file7.log", true)]
    #[case("[abc]", "b", true)]
    #[case("[abc]", "d", false)]
    #[case("[a-z]1", "q1", true)]
    #[case("[!a-z]", "Q", true)]
    #[case("[^a-z]", "q", false)]
    #[case("[]x]", "]", true)]
    #[case("[a-]", "-", true)]
    #[case("\\*", "*", true)]
    #[case("\\*", "x", false)]
    #[case("[unclosed", "[unclosed", true)]
    #[case("*.{rs,toml}", "Cargo.toml", true)]
    #[case("Makefile", "makefile", false)]
    fn matching(#[case] pattern: &str, #[case] input: &str, #[case] expected: bool) {
        assert_eq!(
            Pattern::new(pattern).matches(input),
            expected,
            "pattern {pattern:?} against {input:?}"
        );
    }

    #[test]
    fn adversarial_stars_terminate() {
        let pattern = Pattern::new(&"*a".repeat(40));
        let input = "a".repeat(39);
        assert!(!pattern.matches(&input));
    }

    #[test]
    fn hidden_detection() {
        assert!(Pattern::new(".*").matches_hidden());
        assert!(Pattern::new("{.bashrc,x}").matches_hidden());
        assert!(!Pattern::new("*").matches_hidden());
    }

    #[test]
    fn unicode_is_one_char() {
        assert!(Pattern::new("caf?").matches("café"));
    }
}
