//! Command history and `!` event expansion.

use std::collections::VecDeque;

use thiserror::Error;

/// Default number of entries kept.
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("{0}: event not found")]
    EventNotFound(String),
}

/// Bounded list of previously entered lines.
///
/// Entries keep absolute numbers: once the oldest entries fall off the
/// front, the survivors keep the numbers `history` showed for them.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
    dropped: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the bound, dropping the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.trim();
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push_back(line.into());
        self.trim();
    }

    fn trim(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything and restart numbering at 1.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dropped = 0;
    }

    /// Entries with their absolute numbers, oldest first.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &str)> {
        let base = self.dropped + 1;
        self.entries
            .iter()
            .enumerate()
            .map(move |(i, line)| (base + i, line.as_str()))
    }

    /// Entry by absolute number.
    pub fn get(&self, number: usize) -> Option<&str> {
        let index = number.checked_sub(self.dropped + 1)?;
        self.entries.get(index).map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// The `n`th entry counting back from the newest (1 = newest).
    pub fn from_end(&self, n: usize) -> Option<&str> {
        if n == 0 {
            return None;
        }
        let index = self.entries.len().checked_sub(n)?;
        self.entries.get(index).map(String::as_str)
    }

    /// Newest entry starting with `prefix`.
    pub fn find_prefix(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|line| line.starts_with(prefix))
            .map(String::as_str)
    }

    /// Newest entry containing `needle`.
    pub fn find_containing(&self, needle: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|line| line.contains(needle))
            .map(String::as_str)
    }
}

/// Expand `!!`, `!n`, `!-n`, `!prefix` and `!?text?` against `history`.
///
/// Returns `Ok(None)` when the line contains no event designator. `!`
/// inside single quotes, after a backslash, after `$`, or followed by
/// whitespace, `=`, `(` or `"` stays literal.
pub fn expand_history(line: &str, history: &History) -> Result<Option<String>, HistoryError> {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut changed = false;
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '\\' if !in_single && i + 1 < chars.len() => {
                out.push(c);
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            '!' if !in_single && (i == 0 || chars[i - 1] != '$') => {
                if let Some((event, used)) = designator(&chars[i + 1..]) {
                    let token: String = chars[i..i + 1 + used].iter().collect();
                    let found = match &event {
                        Event::Last => history.last(),
                        Event::Number(n) => history.get(*n),
                        Event::FromEnd(n) => history.from_end(*n),
                        Event::Prefix(p) => history.find_prefix(p),
                        Event::Containing(s) => history.find_containing(s),
                    };
                    let text = found.ok_or(HistoryError::EventNotFound(token))?;
                    out.push_str(text);
                    changed = true;
                    i += 1 + used;
                    continue;
                }
            }
            _ => {}
        }
        out.push(c);
        i += 1;
    }

    Ok(changed.then_some(out))
}

enum Event {
    Last,
    Number(usize),
    FromEnd(usize),
    Prefix(String),
    Containing(String),
}

/// Parse what follows a `!`. Returns the event and the chars consumed.
fn designator(rest: &[char]) -> Option<(Event, usize)> {
    let first = *rest.first()?;
    match first {
        '!' => Some((Event::Last, 1)),
        '?' => {
            let body: String = rest[1..].iter().take_while(|c| **c != '?').collect();
            let closed = rest.get(1 + body.chars().count()) == Some(&'?');
            let used = 1 + body.chars().count() + usize::from(closed);
            (!body.is_empty()).then_some((Event::Containing(body), used))
        }
        '-' => {
            let digits: String = rest[1..].iter().take_while(|c| c.is_ascii_digit()).collect();
            let n = digits.parse().ok()?;
            Some((Event::FromEnd(n), 1 + digits.len()))
        }
        c if c.is_ascii_digit() => {
            let digits: String = rest.iter().take_while(|c| c.is_ascii_digit()).collect();
            let n = digits.parse().ok()?;
            Some((Event::Number(n), digits.len()))
        }
        c if c.is_whitespace() || matches!(c, '=' | '(' | '"') => None,
        _ => {
            let word: String = rest
                .iter()
                .take_while(|c| {
                    !c.is_whitespace()
                        && !matches!(**c, ';' | '&' | '|' | '<' | '>' | '(' | ')' | '"' | '\'')
                })
                .collect();
            let used = word.chars().count();
            (!word.is_empty()).then_some((Event::Prefix(word), used))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(lines: &[&str]) -> History {
        let mut h = History::new(100);
        for line in lines {
            h.push(*line);
        }
        h
    }

    #[test]
    fn bounded_with_absolute_numbers() {
        let mut h = History::new(2);
        h.push("one");
        h.push("two");
        h.push("three");
        let numbered: Vec<_> = h.numbered().collect();
        assert_eq!(numbered, vec![(2, "two"), (3, "three")]);
        assert_eq!(h.get(1), None);
        assert_eq!(h.get(3), Some("three"));
    }

    #[test]
    fn bang_bang() {
        let h = history(&["echo hi"]);
        assert_eq!(
            expand_history("!! | wc -l", &h).unwrap().as_deref(),
            Some("echo hi | wc -l")
        );
    }

    #[test]
    fn numbered_and_relative() {
        let h = history(&["ls", "pwd", "whoami"]);
        assert_eq!(expand_history("!1", &h).unwrap().as_deref(), Some("ls"));
        assert_eq!(expand_history("!-2", &h).unwrap().as_deref(), Some("pwd"));
    }

    #[test]
    fn prefix_and_substring() {
        let h = history(&["echo one", "ls -la", "echo two"]);
        assert_eq!(expand_history("!ec", &h).unwrap().as_deref(), Some("echo two"));
        assert_eq!(expand_history("!?-la?", &h).unwrap().as_deref(), Some("ls -la"));
    }

    #[test]
    fn missing_event() {
        let h = history(&["ls"]);
        assert_eq!(
            expand_history("!nope", &h),
            Err(HistoryError::EventNotFound("!nope".into()))
        );
        assert_eq!(
            HistoryError::EventNotFound("!nope".into()).to_string(),
            "!nope: event not found"
        );
    }

    #[test]
    fn literal_bangs_are_left_alone() {
        let h = history(&["ls"]);
        for line in ["echo 'wow!!'", "echo \\!!", "echo $!", "echo hi !", "[ ! -f x ]", "echo \"hey!\""] {
            assert_eq!(expand_history(line, &h).unwrap(), None, "{line}");
        }
    }

    #[test]
    fn no_history_means_bang_bang_fails() {
        let h = History::default();
        assert!(expand_history("!!", &h).is_err());
    }
}
