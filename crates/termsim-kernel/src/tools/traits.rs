//! Core tool traits and types.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::interpreter::ExecResult;

use super::context::ExecContext;

/// Schema for a tool option.
#[derive(Debug, Clone)]
pub struct ParamSchema {
    /// Canonical name; also accepted as `--name`.
    pub name: String,
    /// Description for help text.
    pub description: String,
    /// Whether the option consumes a value (`-n 5`, `-n5`, `--lines=5`).
    pub takes_value: bool,
    /// Other spellings, e.g. `-n`.
    pub aliases: Vec<String>,
}

impl ParamSchema {
    /// A boolean switch.
    pub fn flag(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            takes_value: false,
            aliases: Vec::new(),
        }
    }

    /// An option that takes a value.
    pub fn option(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            takes_value: true,
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    fn answers_to(&self, spelling: &str) -> bool {
        self.aliases.iter().any(|a| a == spelling)
            || spelling.strip_prefix("--") == Some(self.name.as_str())
    }

    /// `-n, --lines` style label for help output.
    pub fn label(&self) -> String {
        let mut names: Vec<String> = self.aliases.clone();
        if !self.aliases.iter().any(|a| a == &format!("--{}", self.name)) {
            names.push(format!("--{}", self.name));
        }
        let mut label = names.join(", ");
        if self.takes_value {
            label.push_str(" <");
            label.push_str(&self.name.to_uppercase());
            label.push('>');
        }
        label
    }
}

/// Schema describing a tool's interface.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    /// Tool name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Option definitions.
    pub params: Vec<ParamSchema>,
    /// Usage examples: (description, command line).
    pub examples: Vec<(String, String)>,
    /// Pass every argument through as positional, skipping option parsing.
    pub raw: bool,
}

impl ToolSchema {
    /// Create a new tool schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            examples: Vec::new(),
            raw: false,
        }
    }

    /// Add an option to the schema.
    pub fn param(mut self, param: ParamSchema) -> Self {
        self.params.push(param);
        self
    }

    /// Add a usage example.
    pub fn example(mut self, description: impl Into<String>, command: impl Into<String>) -> Self {
        self.examples.push((description.into(), command.into()));
        self
    }

    /// Disable option parsing (for `echo`, `export` and friends).
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    fn find(&self, spelling: &str) -> Option<&ParamSchema> {
        self.params.iter().find(|p| p.answers_to(spelling))
    }
}

/// Parsed arguments ready for tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    /// Arguments exactly as the user gave them (after expansion).
    pub argv: Vec<String>,
    /// Positional arguments in order.
    pub positional: Vec<String>,
    /// Option values by canonical name.
    pub named: HashMap<String, String>,
    /// Switches that were set, by canonical name (or the bare letter if the
    /// schema does not know it).
    pub flags: HashSet<String>,
}

impl ToolArgs {
    /// Create empty args.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `argv` against `schema`.
    ///
    /// Understands bundled short switches (`-la`), short options with an
    /// attached or separate value (`-n5`, `-n 5`), long options (`--all`,
    /// `--lines=5`, `--lines 5`) and `--` to end option parsing. A lone `-`
    /// and negative numbers such as `-3` stay positional.
    pub fn parse(schema: &ToolSchema, argv: Vec<String>) -> Self {
        let mut args = ToolArgs {
            argv: argv.clone(),
            ..Default::default()
        };
        if schema.raw {
            args.positional = argv;
            return args;
        }

        let mut iter = argv.into_iter();
        while let Some(arg) = iter.next() {
            if arg == "--" {
                args.positional.extend(iter.by_ref());
                break;
            }
            if arg == "-" || !arg.starts_with('-') || is_negative_number(&arg) {
                args.positional.push(arg);
                continue;
            }

            if let Some(long) = arg.strip_prefix("--") {
                let (name, inline) = match long.split_once('=') {
                    Some((name, value)) => (name, Some(value.to_string())),
                    None => (long, None),
                };
                match schema.find(&format!("--{name}")) {
                    Some(param) if param.takes_value => {
                        let value = inline.or_else(|| iter.next()).unwrap_or_default();
                        args.named.insert(param.name.clone(), value);
                    }
                    Some(param) => {
                        args.flags.insert(param.name.clone());
                    }
                    None => match inline {
                        Some(value) => {
                            args.named.insert(name.to_string(), value);
                        }
                        None => {
                            args.flags.insert(name.to_string());
                        }
                    },
                }
                continue;
            }

            // Short bundle: -abc, -n5
            let letters: Vec<char> = arg[1..].chars().collect();
            for (i, letter) in letters.iter().enumerate() {
                match schema.find(&format!("-{letter}")) {
                    Some(param) if param.takes_value => {
                        let attached: String = letters[i + 1..].iter().collect();
                        let value = if attached.is_empty() {
                            iter.next().unwrap_or_default()
                        } else {
                            attached
                        };
                        args.named.insert(param.name.clone(), value);
                        break;
                    }
                    Some(param) => {
                        args.flags.insert(param.name.clone());
                    }
                    None => {
                        args.flags.insert(letter.to_string());
                    }
                }
            }
        }
        args
    }

    /// Get a positional argument by index.
    pub fn get_positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    /// Get an option value by canonical name.
    pub fn get_named(&self, key: &str) -> Option<&str> {
        self.named.get(key).map(String::as_str)
    }

    /// Check if a switch is set.
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    /// First unknown switch, for `invalid option` messages.
    pub fn unknown_flag(&self, schema: &ToolSchema) -> Option<&str> {
        self.flags
            .iter()
            .find(|f| !schema.params.iter().any(|p| &p.name == *f))
            .map(String::as_str)
    }
}

fn is_negative_number(arg: &str) -> bool {
    arg.len() > 1 && arg[1..].chars().all(|c| c.is_ascii_digit())
}

/// A tool that can be executed.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's name (used for lookup).
    fn name(&self) -> &str;

    /// Get the tool's schema.
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with the given arguments and context.
    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ToolSchema {
        ToolSchema::new("head", "Output the first part of files")
            .param(ParamSchema::option("lines", "Number of lines").with_aliases(["-n"]))
            .param(ParamSchema::flag("quiet", "Never print headers").with_aliases(["-q"]))
    }

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn short_and_long_values() {
        for items in [
            &["-n", "5", "f"][..],
            &["-n5", "f"],
            &["--lines=5", "f"],
            &["--lines", "5", "f"],
        ] {
            let args = ToolArgs::parse(&schema(), argv(items));
            assert_eq!(args.get_named("lines"), Some("5"), "{items:?}");
            assert_eq!(args.positional, vec!["f"]);
        }
    }

    #[test]
    fn bundles_and_unknown_letters() {
        let args = ToolArgs::parse(&schema(), argv(&["-qx", "a"]));
        assert!(args.has_flag("quiet"));
        assert!(args.has_flag("x"));
        assert_eq!(args.unknown_flag(&schema()), Some("x"));
    }

    #[test]
    fn dash_and_double_dash() {
        let args = ToolArgs::parse(&schema(), argv(&["-", "--", "-q", "-3"]));
        assert_eq!(args.positional, vec!["-", "-q", "-3"]);
        assert!(!args.has_flag("quiet"));
    }

    #[test]
    fn negative_numbers_are_positional() {
        let args = ToolArgs::parse(&schema(), argv(&["-3", "f"]));
        assert_eq!(args.positional, vec!["-3", "f"]);
    }

    #[test]
    fn raw_schema_skips_parsing() {
        let schema = ToolSchema::new("echo", "Print").raw();
        let args = ToolArgs::parse(&schema, argv(&["-n", "hi"]));
        assert_eq!(args.positional, vec!["-n", "hi"]);
        assert!(args.flags.is_empty());
    }

    #[test]
    fn help_label() {
        assert_eq!(schema().params[0].label(), "-n, --lines <LINES>");
        assert_eq!(schema().params[1].label(), "-q, --quiet");
    }
}
