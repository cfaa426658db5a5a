//! Text-level expansion that runs before a line is tokenized: aliases,
//! then (after history) variables and `~`.

use std::collections::BTreeMap;

use rand::Rng;

use super::scope::{is_valid_name, Scope};

/// What `$0` expands to.
pub const SHELL_NAME: &str = "-bash";

/// Characters that end a command word.
const WORD_END: &[char] = &[';', '|', '&', '<', '>'];

/// Replace the first word of `line` with its alias, once.
///
/// Only the first whitespace-delimited token is considered and the result
/// is not rescanned, so `alias ls='ls -F'` cannot loop.
pub fn expand_alias(line: &str, aliases: &BTreeMap<String, String>) -> String {
    let indent = line.len() - line.trim_start().len();
    let rest = &line[indent..];
    let end = rest
        .find(|c: char| c.is_whitespace() || WORD_END.contains(&c))
        .unwrap_or(rest.len());
    let word = &rest[..end];

    match aliases.get(word) {
        Some(replacement) if !word.is_empty() => {
            format!("{}{}{}", &line[..indent], replacement, &rest[end..])
        }
        _ => line.to_string(),
    }
}

/// Values the variable expander reads besides the scope.
#[derive(Debug, Clone, Default)]
pub struct SpecialParams {
    /// `$?`
    pub last_status: i64,
    /// `$$`
    pub pid: u32,
    /// `$!`, empty until something has run in the background.
    pub last_background: Option<u32>,
    /// `$SECONDS`
    pub seconds: u64,
    /// Replacement for a leading `~`.
    pub home: String,
}

/// Expand `$NAME`, `${NAME}`, `${NAME:-default}`, `${#NAME}`, special
/// parameters, and a leading `~`, honoring quotes.
///
/// Nothing inside single quotes changes. A backslash protects the next
/// character. Unset variables expand to the empty string.
///
/// Expanded values are escaped so the tokenizer treats any operator or
/// quote characters they contain as plain text; whitespace still splits
/// words and glob characters still glob, as they would in bash.
pub fn expand_variables(line: &str, scope: &Scope, special: &SpecialParams) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match (quote, c) {
            (Some('\''), '\'') => {
                quote = None;
                out.push(c);
                i += 1;
            }
            (Some('\''), _) => {
                out.push(c);
                i += 1;
            }
            (_, '\\') => {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
            }
            (None, '\'') | (None, '"') => {
                quote = Some(c);
                out.push(c);
                i += 1;
            }
            (Some('"'), '"') => {
                quote = None;
                out.push(c);
                i += 1;
            }
            (_, '$') => match parameter(&chars[i + 1..], scope, special) {
                Some((value, used)) => {
                    escape_into(&mut out, &value, quote.is_some());
                    i += 1 + used;
                }
                None => {
                    out.push(c);
                    i += 1;
                }
            },
            (None, '~') if starts_word(&chars, i) && ends_tilde(&chars, i + 1) => {
                escape_into(&mut out, &special.home, false);
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Resolve the parameter after a `$`. Returns the value and the number of
/// chars consumed, or `None` when the `$` is literal.
fn parameter(rest: &[char], scope: &Scope, special: &SpecialParams) -> Option<(String, usize)> {
    let first = *rest.first()?;
    match first {
        '{' => {
            let close = rest.iter().position(|c| *c == '}')?;
            let inner: String = rest[1..close].iter().collect();
            braced(&inner, scope, special).map(|value| (value, close + 1))
        }
        c if c == '?' || c == '$' || c == '!' || c == '#' || c.is_ascii_digit() => {
            Some((lookup(&c.to_string(), scope, special), 1))
        }
        c if c.is_ascii_alphabetic() || c == '_' => {
            let name: String = rest
                .iter()
                .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
                .collect();
            let used = name.len();
            Some((lookup(&name, scope, special), used))
        }
        _ => None,
    }
}

fn braced(inner: &str, scope: &Scope, special: &SpecialParams) -> Option<String> {
    if let Some(name) = inner.strip_prefix('#') {
        if is_valid_name(name) {
            return Some(lookup(name, scope, special).chars().count().to_string());
        }
    }
    if let Some((name, default)) = inner.split_once(":-") {
        if is_valid_name(name) {
            let value = lookup(name, scope, special);
            return Some(if value.is_empty() {
                default.to_string()
            } else {
                value
            });
        }
    }
    let special_name = inner.len() == 1 && inner.chars().all(|c| "?$!#".contains(c) || c.is_ascii_digit());
    (is_valid_name(inner) || special_name).then(|| lookup(inner, scope, special))
}

fn lookup(name: &str, scope: &Scope, special: &SpecialParams) -> String {
    match name {
        "?" => special.last_status.to_string(),
        "$" => special.pid.to_string(),
        "!" => special
            .last_background
            .map(|pid| pid.to_string())
            .unwrap_or_default(),
        "#" => "0".to_string(),
        "0" => SHELL_NAME.to_string(),
        n if n.len() == 1 && n.chars().all(|c| c.is_ascii_digit()) => String::new(),
        "RANDOM" => rand::thread_rng().gen_range(0..32768).to_string(),
        "SECONDS" => special.seconds.to_string(),
        _ => scope.get(name).unwrap_or_default().to_string(),
    }
}

/// Append an expanded value so the tokenizer reads it literally.
fn escape_into(out: &mut String, value: &str, in_double_quotes: bool) {
    for c in value.chars() {
        let special = if in_double_quotes {
            matches!(c, '"' | '\\' | '$' | '`')
        } else {
            matches!(c, '\'' | '"' | '\\' | ';' | '|' | '&' | '<' | '>' | '#')
        };
        if special {
            out.push('\\');
        }
        out.push(c);
    }
}

fn starts_word(chars: &[char], i: usize) -> bool {
    i == 0 || chars[i - 1].is_whitespace() || WORD_END.contains(&chars[i - 1])
}

fn ends_tilde(chars: &[char], j: usize) -> bool {
    match chars.get(j) {
        None => true,
        Some(c) => *c == '/' || c.is_whitespace() || WORD_END.contains(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        let mut scope = Scope::new();
        scope.export("HOME", "/home/user");
        scope.export("USER", "user");
        scope.set("PIPEY", "a|b");
        scope
    }

    fn special() -> SpecialParams {
        SpecialParams {
            last_status: 3,
            pid: 4242,
            last_background: None,
            seconds: 7,
            home: "/home/user".into(),
        }
    }

    fn expand(line: &str) -> String {
        expand_variables(line, &scope(), &special())
    }

    #[test]
    fn alias_first_word_only() {
        let mut aliases = BTreeMap::new();
        aliases.insert("ll".to_string(), "ls -la".to_string());
        assert_eq!(expand_alias("ll /tmp", &aliases), "ls -la /tmp");
        assert_eq!(expand_alias("  ll", &aliases), "  ls -la");
        assert_eq!(expand_alias("ll; ll", &aliases), "ls -la; ll");
        assert_eq!(expand_alias("echo ll", &aliases), "echo ll");
        assert_eq!(expand_alias("", &aliases), "");
    }

    #[test]
    fn alias_is_not_recursive() {
        let mut aliases = BTreeMap::new();
        aliases.insert("ls".to_string(), "ls -F".to_string());
        assert_eq!(expand_alias("ls", &aliases), "ls -F");
    }

    #[test]
    fn simple_and_braced() {
        assert_eq!(expand("echo $USER ${HOME}"), "echo user /home/user");
        assert_eq!(expand("echo ${USER}name"), "echo username");
        assert_eq!(expand("echo ${#USER}"), "echo 4");
        assert_eq!(expand("echo ${NOPE:-fallback}"), "echo fallback");
    }

    #[test]
    fn unset_is_empty() {
        assert_eq!(expand("echo [$UNSET_VAR]"), "echo []");
    }

    #[test]
    fn specials() {
        assert_eq!(expand("$? $$ $# $0 $1"), "3 4242 0 -bash ");
        assert_eq!(expand("[$!]"), "[]");
        assert_eq!(expand("$SECONDS"), "7");
        let random: u32 = expand("$RANDOM").parse().unwrap();
        assert!(random < 32768);
    }

    #[test]
    fn quotes() {
        assert_eq!(expand("echo '$USER'"), "echo '$USER'");
        assert_eq!(expand("echo \"$USER\""), "echo \"user\"");
        assert_eq!(expand("echo \\$USER"), "echo \\$USER");
        assert_eq!(expand("echo \"it's $USER\""), "echo \"it's user\"");
    }

    #[test]
    fn lone_dollar_is_literal() {
        assert_eq!(expand("echo $ 5$"), "echo $ 5$");
        assert_eq!(expand("echo ${unclosed"), "echo ${unclosed");
    }

    #[test]
    fn tilde_at_word_start() {
        assert_eq!(expand("cd ~"), "cd /home/user");
        assert_eq!(expand("ls ~/docs"), "ls /home/user/docs");
        assert_eq!(expand("echo a~b '~' \"~\""), "echo a~b '~' \"~\"");
        assert_eq!(expand("echo ~other"), "echo ~other");
    }

    #[test]
    fn values_cannot_inject_operators() {
        assert_eq!(expand("echo $PIPEY"), "echo a\\|b");
        assert_eq!(expand("echo \"$PIPEY\""), "echo \"a|b\"");
    }
}
