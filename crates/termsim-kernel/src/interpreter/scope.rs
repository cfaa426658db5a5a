//! Shell variables.
//!
//! One flat namespace, last write wins. Variables set with `export` (and
//! the login environment) are marked exported and show up in `env`; plain
//! `NAME=value` assignments do not.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: BTreeMap<String, String>,
    exported: BTreeSet<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Set a shell variable, keeping its exported flag.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Set and export.
    pub fn export(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.exported.insert(name.clone());
        self.vars.insert(name, value.into());
    }

    /// Mark an existing (or empty) variable exported.
    pub fn mark_exported(&mut self, name: &str) {
        self.vars.entry(name.to_string()).or_default();
        self.exported.insert(name.to_string());
    }

    pub fn is_exported(&self, name: &str) -> bool {
        self.exported.contains(name)
    }

    /// Remove a variable. Returns its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.exported.remove(name);
        self.vars.remove(name)
    }

    /// All variables, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Exported variables, sorted by name.
    pub fn exported(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| self.exported.contains(*k))
    }
}

/// True for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split `NAME=value` when `NAME` is a valid variable name.
pub fn split_assignment(word: &str) -> Option<(&str, &str)> {
    let (name, value) = word.split_once('=')?;
    is_valid_name(name).then_some((name, value))
}
