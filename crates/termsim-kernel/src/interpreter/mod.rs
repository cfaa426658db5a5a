//! Interpreter module for termsim.
//!
//! Turns one raw input line into something the scheduler can run.
//!
//! # Architecture
//!
//! Expansion is textual and strictly ordered:
//!
//! 1. **Alias**: first word replaced once ([`expand_alias`])
//! 2. **History**: `!!`, `!n`, `!-n`, `!prefix` ([`expand_history`])
//! 3. **Variables**: `$NAME`, `${NAME}`, specials, leading `~` ([`expand_variables`])
//!
//! The expanded text is then tokenized with logos ([`tokenize`]) and parsed
//! into links, pipelines and stages ([`parse`]). Glob expansion happens per
//! word at execution time ([`expand_word`]) because it reads the VFS as it
//! is when the stage starts.
//!
//! # Example
//!
//! ```
//! use termsim_kernel::interpreter::{parse, Connector};
//!
//! let line = parse("ls /tmp | wc -l && echo ok").unwrap();
//! assert_eq!(line.links.len(), 2);
//! assert_eq!(line.links[1].connector, Connector::IfSuccess);
//! ```

mod expand;
mod glob;
mod history;
mod lexer;
mod parser;
mod result;
mod scope;

pub use expand::{expand_alias, expand_variables, SpecialParams, SHELL_NAME};
pub use glob::expand_word;
pub use history::{expand_history, History, HistoryError, DEFAULT_HISTORY_SIZE};
pub use lexer::{escape_pattern, tokenize, Fragment, LexerError, Token};
pub use parser::{
    parse, CommandLine, Connector, ErrorRedirect, Link, ParseError, Pipeline, Redirect, Stage,
    Word,
};
pub use result::{ExecResult, ERROR_PREFIX};
pub(crate) use result::push_line;
pub use scope::{is_valid_name, split_assignment, Scope};
