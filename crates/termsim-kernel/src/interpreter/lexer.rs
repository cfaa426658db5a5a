//! Tokenizer for expanded command lines.
//!
//! Produces operators (`&&`, `||`, `|`, `;`, `&`, redirections) and word
//! fragments. Adjacent fragments with no blank between them form one word:
//! `"a b"c'd'` is a single word `a bcd`. Quote handling lives entirely in
//! the fragment callbacks, so operator characters inside quotes never
//! become operators.
//!
//! Each fragment carries two renderings: `text` with quotes and escapes
//! removed, and `pattern` for glob matching, in which quoted or escaped
//! metacharacters are backslash-protected.

use std::fmt;

use logos::{Lexer, Logos};

/// Lexer error types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LexerError {
    #[default]
    UnexpectedCharacter,
    /// A quote was opened and never closed.
    UnterminatedQuote(char),
    /// A backslash at the very end of the line.
    TrailingBackslash,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerError::UnexpectedCharacter => write!(f, "unexpected character"),
            LexerError::UnterminatedQuote(q) => {
                write!(f, "unexpected EOF while looking for matching `{q}'")
            }
            LexerError::TrailingBackslash => write!(f, "syntax error: unexpected end of file"),
        }
    }
}

/// A piece of a word.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub text: String,
    pub pattern: String,
    /// Contains an unquoted, unescaped `*`, `?` or `[`.
    pub glob: bool,
}

/// Tokens produced by the command-line lexer.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(error = LexerError)]
pub enum Token {
    #[regex(r"[ \t\r\n]+")]
    Blank,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("|")]
    Pipe,

    #[token(";")]
    Semi,

    #[token("&")]
    Amp,

    #[token(">>")]
    Append,

    #[token(">")]
    Great,

    #[token("<")]
    Less,

    #[token("2>")]
    ErrGreat,

    #[token("2>>")]
    ErrAppend,

    #[token("2>&1")]
    ErrToOut,

    #[regex(r"'[^']*'", lex_single_quoted)]
    SingleQuoted(Fragment),

    #[regex(r#""([^"\\]|\\(.|\n))*""#, lex_double_quoted)]
    DoubleQuoted(Fragment),

    #[regex(r#"([^ \t\r\n'"|;&<>\\]|\\.)+"#, lex_bare)]
    Bare(Fragment),
}

impl Token {
    /// Source text of an operator token, for error messages.
    pub fn operator_text(&self) -> Option<&'static str> {
        Some(match self {
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Pipe => "|",
            Token::Semi => ";",
            Token::Amp => "&",
            Token::Append => ">>",
            Token::Great => ">",
            Token::Less => "<",
            Token::ErrGreat => "2>",
            Token::ErrAppend => "2>>",
            Token::ErrToOut => "2>&1",
            _ => return None,
        })
    }
}

fn lex_single_quoted(lex: &mut Lexer<Token>) -> Fragment {
    let slice = lex.slice();
    let text = slice[1..slice.len() - 1].to_string();
    Fragment {
        pattern: escape_pattern(&text),
        text,
        glob: false,
    }
}

fn lex_double_quoted(lex: &mut Lexer<Token>) -> Fragment {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next) if matches!(next, '"' | '\\' | '$' | '`') => {
                    text.push(next);
                    chars.next();
                }
                Some('\n') => {
                    chars.next();
                }
                _ => text.push(c),
            }
        } else {
            text.push(c);
        }
    }
    Fragment {
        pattern: escape_pattern(&text),
        text,
        glob: false,
    }
}

fn lex_bare(lex: &mut Lexer<Token>) -> Fragment {
    let mut fragment = Fragment::default();
    let mut chars = lex.slice().chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    fragment.text.push(next);
                    fragment.pattern.push('\\');
                    fragment.pattern.push(next);
                }
            }
            '*' | '?' | '[' => {
                fragment.glob = true;
                fragment.text.push(c);
                fragment.pattern.push(c);
            }
            _ => {
                fragment.text.push(c);
                fragment.pattern.push(c);
            }
        }
    }
    fragment
}

/// Backslash-protect everything the glob matcher treats specially.
pub fn escape_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '{' | '}' | ',' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Tokenize a whole line.
///
/// An unquoted `#` that begins a word starts a comment running to the end
/// of the line.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
    let mut lexer = Token::lexer(source);
    let mut tokens: Vec<Token> = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(Token::Bare(_)) if lexer.slice().starts_with('#') && at_word_start(tokens.last()) => {
                break;
            }
            Ok(token) => tokens.push(token),
            Err(_) => {
                return Err(match lexer.slice().chars().next() {
                    Some(q @ ('\'' | '"')) => LexerError::UnterminatedQuote(q),
                    Some('\\') => LexerError::TrailingBackslash,
                    _ => LexerError::UnexpectedCharacter,
                });
            }
        }
    }
    Ok(tokens)
}

/// True when the next token would begin a new word.
fn at_word_start(previous: Option<&Token>) -> bool {
    match previous {
        None | Some(Token::Blank) => true,
        Some(token) => token.operator_text().is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(text: &str) -> Token {
        Token::Bare(Fragment {
            text: text.into(),
            pattern: text.into(),
            glob: false,
        })
    }

    #[test]
    fn operators_and_words() {
        let tokens = tokenize("a&&b||c|d;e&").unwrap();
        assert_eq!(
            tokens,
            vec![
                bare("a"),
                Token::AndAnd,
                bare("b"),
                Token::OrOr,
                bare("c"),
                Token::Pipe,
                bare("d"),
                Token::Semi,
                bare("e"),
                Token::Amp,
            ]
        );
    }

    #[test]
    fn redirections() {
        let tokens = tokenize("x>>f 2>/dev/null <in 2>&1").unwrap();
        assert!(tokens.contains(&Token::Append));
        assert!(tokens.contains(&Token::ErrGreat));
        assert!(tokens.contains(&Token::Less));
        assert!(tokens.contains(&Token::ErrToOut));
    }

    #[test]
    fn operators_inside_quotes_are_text() {
        let tokens = tokenize("echo 'a && b' \"c | d\"").unwrap();
        assert_eq!(tokens.len(), 5);
        assert!(matches!(&tokens[2], Token::SingleQuoted(f) if f.text == "a && b"));
        assert!(matches!(&tokens[4], Token::DoubleQuoted(f) if f.text == "c | d"));
    }

    #[test]
    fn escapes() {
        let tokens = tokenize(r#"a\ b "q\"x\n" \*"#).unwrap();
        assert!(matches!(&tokens[0], Token::Bare(f) if f.text == "a b"));
        assert!(matches!(&tokens[2], Token::DoubleQuoted(f) if f.text == "q\"x\\n"));
        assert!(matches!(&tokens[4], Token::Bare(f) if f.text == "*" && !f.glob && f.pattern == "\\*"));
    }

    #[test]
    fn glob_flag() {
        let tokens = tokenize("*.txt '*.md'").unwrap();
        assert!(matches!(&tokens[0], Token::Bare(f) if f.glob));
        assert!(matches!(&tokens[2], Token::SingleQuoted(f) if !f.glob && f.pattern == "\\*.md"));
    }

    #[test]
    fn comments_end_the_line() {
        assert_eq!(
            tokenize("echo a # it's a note").unwrap(),
            vec![bare("echo"), Token::Blank, bare("a"), Token::Blank]
        );
        assert_eq!(tokenize("true;# done").unwrap(), vec![bare("true"), Token::Semi]);
    }

    #[test]
    fn hash_inside_a_word_is_text() {
        let tokens = tokenize("echo a#b '#' \\#x").unwrap();
        assert!(matches!(&tokens[2], Token::Bare(f) if f.text == "a#b"));
        assert!(matches!(&tokens[4], Token::SingleQuoted(f) if f.text == "#"));
        assert!(matches!(&tokens[6], Token::Bare(f) if f.text == "#x"));
    }

    #[test]
    fn unterminated_quotes() {
        assert_eq!(tokenize("echo 'abc"), Err(LexerError::UnterminatedQuote('\'')));
        assert_eq!(tokenize("echo \"abc"), Err(LexerError::UnterminatedQuote('"')));
        assert_eq!(tokenize("echo abc\\"), Err(LexerError::TrailingBackslash));
    }
}
