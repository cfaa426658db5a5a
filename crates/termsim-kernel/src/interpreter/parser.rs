//! Command-line structure: links joined by `;`, `&&`, `||`, `&`; each link
//! a pipeline of stages joined by `|`; each stage a list of words plus
//! optional redirections.

use thiserror::Error;

use super::lexer::{tokenize, Fragment, LexerError, Token};

/// Errors that make a line unrunnable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error near unexpected token `{0}'")]
    UnexpectedToken(String),

    #[error("syntax error: unexpected end of file")]
    UnexpectedEof,

    #[error("{0}")]
    Lex(LexerError),
}

impl From<LexerError> for ParseError {
    fn from(err: LexerError) -> Self {
        ParseError::Lex(err)
    }
}

/// One shell word after quote removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    /// Glob pattern, present only when the word has unquoted metacharacters.
    pub pattern: Option<String>,
}

impl Word {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pattern: None,
        }
    }
}

/// How a link is gated on the status of the link before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connector {
    /// First link, or after `;` / `&`.
    #[default]
    Always,
    /// After `&&`.
    IfSuccess,
    /// After `||`.
    IfFailure,
}

impl Connector {
    /// Whether a link with this connector runs, given the previous status.
    pub fn should_run(self, last_status: i64) -> bool {
        match self {
            Connector::Always => true,
            Connector::IfSuccess => last_status == 0,
            Connector::IfFailure => last_status != 0,
        }
    }
}

/// A file redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: Word,
    pub append: bool,
}

/// Where stderr goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorRedirect {
    File(Redirect),
    /// `2>&1`
    Stdout,
}

/// One command in a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stage {
    pub words: Vec<Word>,
    pub input: Option<Word>,
    pub output: Option<Redirect>,
    pub errors: Option<ErrorRedirect>,
    /// Reads the previous stage's stdout.
    pub piped_in: bool,
    /// Feeds its stdout to the next stage.
    pub piped_out: bool,
}

impl Stage {
    fn is_empty(&self) -> bool {
        self.words.is_empty()
            && self.input.is_none()
            && self.output.is_none()
            && self.errors.is_none()
    }

    /// The words joined back together, for job listings.
    pub fn display(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn display(&self) -> String {
        self.stages
            .iter()
            .map(Stage::display)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub connector: Connector,
    pub pipeline: Pipeline,
    /// Terminated by `&`.
    pub background: bool,
}

/// A fully parsed line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLine {
    pub links: Vec<Link>,
}

/// Parse an already-expanded line.
pub fn parse(source: &str) -> Result<CommandLine, ParseError> {
    let mut parser = LineParser::default();
    for token in tokenize(source)? {
        parser.feed(token)?;
    }
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingRedirect {
    Input,
    Output { append: bool },
    Errors { append: bool },
}

#[derive(Default)]
struct LineParser {
    links: Vec<Link>,
    stages: Vec<Stage>,
    stage: Stage,
    word: Option<WordBuilder>,
    redirect: Option<(PendingRedirect, &'static str)>,
    connector: Connector,
    /// The last operator needs a command after it (`&&`, `||`, `|`).
    awaiting: bool,
}

#[derive(Default)]
struct WordBuilder {
    text: String,
    pattern: String,
    glob: bool,
}

impl WordBuilder {
    fn push(&mut self, fragment: Fragment) {
        self.text.push_str(&fragment.text);
        self.pattern.push_str(&fragment.pattern);
        self.glob |= fragment.glob;
    }

    fn build(self) -> Word {
        Word {
            text: self.text,
            pattern: self.glob.then_some(self.pattern),
        }
    }
}

impl LineParser {
    fn feed(&mut self, token: Token) -> Result<(), ParseError> {
        let op = token.operator_text();
        match token {
            Token::Blank => self.end_word(),
            Token::SingleQuoted(f) | Token::DoubleQuoted(f) | Token::Bare(f) => {
                self.word.get_or_insert_with(WordBuilder::default).push(f);
                self.awaiting = false;
                Ok(())
            }
            Token::Less | Token::Great | Token::Append | Token::ErrGreat | Token::ErrAppend => {
                self.end_word()?;
                let op = op.unwrap_or_default();
                if let Some((_, pending)) = self.redirect {
                    return Err(ParseError::UnexpectedToken(pending.to_string()));
                }
                let kind = match token {
                    Token::Less => PendingRedirect::Input,
                    Token::Great => PendingRedirect::Output { append: false },
                    Token::Append => PendingRedirect::Output { append: true },
                    Token::ErrGreat => PendingRedirect::Errors { append: false },
                    _ => PendingRedirect::Errors { append: true },
                };
                self.redirect = Some((kind, op));
                Ok(())
            }
            Token::ErrToOut => {
                self.end_word()?;
                if let Some((_, pending)) = self.redirect {
                    return Err(ParseError::UnexpectedToken(pending.to_string()));
                }
                self.stage.errors = Some(ErrorRedirect::Stdout);
                Ok(())
            }
            Token::Pipe => {
                self.end_word()?;
                self.end_stage("|")?;
                self.awaiting = true;
                Ok(())
            }
            Token::AndAnd | Token::OrOr | Token::Semi | Token::Amp => {
                self.end_word()?;
                let op = op.unwrap_or_default();
                self.end_link(op, matches!(token, Token::Amp))?;
                self.connector = match token {
                    Token::AndAnd => Connector::IfSuccess,
                    Token::OrOr => Connector::IfFailure,
                    _ => Connector::Always,
                };
                self.awaiting = matches!(token, Token::AndAnd | Token::OrOr);
                Ok(())
            }
        }
    }

    fn end_word(&mut self) -> Result<(), ParseError> {
        let Some(builder) = self.word.take() else {
            return Ok(());
        };
        let word = builder.build();
        match self.redirect.take() {
            None => self.stage.words.push(word),
            Some((PendingRedirect::Input, _)) => self.stage.input = Some(word),
            Some((PendingRedirect::Output { append }, _)) => {
                self.stage.output = Some(Redirect { target: word, append })
            }
            Some((PendingRedirect::Errors { append }, _)) => {
                self.stage.errors = Some(ErrorRedirect::File(Redirect { target: word, append }))
            }
        }
        Ok(())
    }

    fn end_stage(&mut self, op: &str) -> Result<(), ParseError> {
        if self.redirect.is_some() || self.stage.is_empty() {
            return Err(ParseError::UnexpectedToken(op.to_string()));
        }
        self.stages.push(std::mem::take(&mut self.stage));
        Ok(())
    }

    fn end_link(&mut self, op: &str, background: bool) -> Result<(), ParseError> {
        self.end_stage(op)?;
        let link = Link {
            connector: self.connector,
            pipeline: self.take_pipeline(),
            background,
        };
        self.links.push(link);
        Ok(())
    }

    fn take_pipeline(&mut self) -> Pipeline {
        let mut stages = std::mem::take(&mut self.stages);
        let last = stages.len().saturating_sub(1);
        for (i, stage) in stages.iter_mut().enumerate() {
            stage.piped_in = i > 0;
            stage.piped_out = i < last;
        }
        Pipeline { stages }
    }

    fn finish(mut self) -> Result<CommandLine, ParseError> {
        self.end_word()?;
        if self.redirect.is_some() {
            return Err(ParseError::UnexpectedToken("newline".to_string()));
        }
        if self.stage.is_empty() {
            if self.awaiting || !self.stages.is_empty() {
                return Err(ParseError::UnexpectedEof);
            }
        } else {
            self.end_link("newline", false)?;
        }
        Ok(CommandLine { links: self.links })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(stage: &Stage) -> Vec<&str> {
        stage.words.iter().map(|w| w.text.as_str()).collect()
    }

    #[test]
    fn chain_operators() {
        let line = parse("a && b || c; d").unwrap();
        let connectors: Vec<_> = line.links.iter().map(|l| l.connector).collect();
        assert_eq!(
            connectors,
            vec![
                Connector::Always,
                Connector::IfSuccess,
                Connector::IfFailure,
                Connector::Always
            ]
        );
    }

    #[test]
    fn pipeline_stages() {
        let line = parse("cat f | grep x | wc -l").unwrap();
        let stages = &line.links[0].pipeline.stages;
        assert_eq!(stages.len(), 3);
        assert_eq!(argv(&stages[2]), vec!["wc", "-l"]);
        assert!(!stages[0].piped_in && stages[0].piped_out);
        assert!(stages[1].piped_in && stages[1].piped_out);
        assert!(stages[2].piped_in && !stages[2].piped_out);
    }

    #[test]
    fn quoted_operators_stay_in_words() {
        let line = parse("echo 'a;b' \"c&&d\" e\\|f").unwrap();
        assert_eq!(line.links.len(), 1);
        assert_eq!(
            argv(&line.links[0].pipeline.stages[0]),
            vec!["echo", "a;b", "c&&d", "e|f"]
        );
    }

    #[test]
    fn adjacent_fragments_join() {
        let line = parse("echo \"a b\"c'd'").unwrap();
        assert_eq!(argv(&line.links[0].pipeline.stages[0]), vec!["echo", "a bcd"]);
    }

    #[test]
    fn redirections() {
        let line = parse("sort < in > out 2>> log").unwrap();
        let stage = &line.links[0].pipeline.stages[0];
        assert_eq!(argv(stage), vec!["sort"]);
        assert_eq!(stage.input, Some(Word::literal("in")));
        assert_eq!(
            stage.output,
            Some(Redirect {
                target: Word::literal("out"),
                append: false
            })
        );
        assert!(matches!(&stage.errors, Some(ErrorRedirect::File(r)) if r.append));
    }

    #[test]
    fn background_marks_its_link() {
        let line = parse("sleep 1 & echo hi &").unwrap();
        assert_eq!(line.links.len(), 2);
        assert!(line.links.iter().all(|l| l.background));

        let line = parse("a && b &").unwrap();
        assert!(!line.links[0].background);
        assert!(line.links[1].background);
    }

    #[test]
    fn trailing_semicolon_is_fine() {
        assert_eq!(parse("echo hi;").unwrap().links.len(), 1);
        assert!(parse("").unwrap().links.is_empty());
        assert!(parse("   ").unwrap().links.is_empty());
    }

    #[test]
    fn glob_pattern_only_when_unquoted() {
        let line = parse("ls *.txt '*.md' \"x\"*").unwrap();
        let words = &line.links[0].pipeline.stages[0].words;
        assert_eq!(words[1].pattern.as_deref(), Some("*.txt"));
        assert_eq!(words[2].pattern, None);
        assert_eq!(words[3].pattern.as_deref(), Some("x*"));
    }

    #[test]
    fn syntax_errors() {
        assert_eq!(
            parse("&& ls"),
            Err(ParseError::UnexpectedToken("&&".into()))
        );
        assert_eq!(parse("ls ;; ls"), Err(ParseError::UnexpectedToken(";".into())));
        assert_eq!(parse("| wc"), Err(ParseError::UnexpectedToken("|".into())));
        assert_eq!(parse("ls &&"), Err(ParseError::UnexpectedEof));
        assert_eq!(parse("ls |"), Err(ParseError::UnexpectedEof));
        assert_eq!(
            parse("echo >"),
            Err(ParseError::UnexpectedToken("newline".into()))
        );
        assert_eq!(
            parse("echo 'open").unwrap_err().to_string(),
            "unexpected EOF while looking for matching `''"
        );
    }
}
