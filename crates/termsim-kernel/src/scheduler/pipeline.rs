//! Pipeline execution.
//!
//! Stages run left to right on the session's single context. Each stage's
//! captured stdout becomes the next stage's stdin; the pipeline reports the
//! final stage's stdout and status. stderr from every stage is kept, so an
//! error in the middle of `a | b | c` is still shown.

use std::sync::Arc;

use crate::dispatch::CommandDispatcher;
use crate::interpreter::{
    expand_word, push_line, split_assignment, ErrorRedirect, ExecResult, Pipeline, Redirect,
    Stage, Word, ERROR_PREFIX,
};
use crate::tools::{ExecContext, OutputContext};

/// Runs parsed pipelines through a dispatcher.
pub struct PipelineRunner {
    dispatcher: Arc<dyn CommandDispatcher>,
}

impl PipelineRunner {
    pub fn new(dispatcher: Arc<dyn CommandDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Execute a pipeline.
    ///
    /// The interrupt flag is checked before each stage; once it is set the
    /// remaining stages are skipped and whatever ran so far is returned.
    pub async fn run(&self, pipeline: &Pipeline, ctx: &mut ExecContext) -> ExecResult {
        let mut errors = String::new();
        let mut piped: Option<String> = None;
        let mut last = ExecResult::success("");

        for stage in &pipeline.stages {
            if ctx.interrupt.is_set() {
                tracing::debug!("pipeline interrupted");
                break;
            }
            let stdin = if stage.piped_in { piped.take() } else { None };
            let result = self.run_stage(stage, stdin, ctx).await;

            push_line(&mut errors, &result.err);
            if stage.piped_out {
                piped = Some(result.out.clone());
            }
            last = result;
        }

        last.err = errors;
        last
    }

    async fn run_stage(&self, stage: &Stage, piped: Option<String>, ctx: &mut ExecContext) -> ExecResult {
        let mut argv: Vec<String> = stage
            .words
            .iter()
            .flat_map(|w| expand_word(w, &ctx.vfs, &ctx.cwd))
            .collect();

        let split = argv
            .iter()
            .position(|w| split_assignment(w).is_none())
            .unwrap_or(argv.len());
        let assignments: Vec<(String, String)> = argv
            .drain(..split)
            .filter_map(|w| split_assignment(&w).map(|(n, v)| (n.to_string(), v.to_string())))
            .collect();

        let stdin = match &stage.input {
            Some(word) => match read_input(word, ctx) {
                Ok(text) => Some(text),
                Err(result) => return result,
            },
            None => piped,
        };

        if let Some(redirect) = &stage.output {
            if let Err(result) = open_target(redirect, ctx) {
                return result;
            }
        }
        if let Some(ErrorRedirect::File(redirect)) = &stage.errors {
            if let Err(result) = open_target(redirect, ctx) {
                return result;
            }
        }

        let mut result = if argv.is_empty() {
            for (name, value) in assignments {
                ctx.scope.set(name, value);
            }
            ExecResult::success("")
        } else {
            let saved = apply_temporary(&assignments, ctx);
            ctx.stdin = stdin;
            ctx.output = if stage.piped_out || stage.output.is_some() {
                OutputContext::Piped
            } else {
                OutputContext::Terminal
            };

            let name = argv.remove(0);
            let result = self.dispatcher.dispatch(&name, argv, ctx).await;

            ctx.stdin = None;
            ctx.output = OutputContext::Terminal;
            restore(saved, ctx);
            result
        };

        match &stage.errors {
            Some(ErrorRedirect::Stdout) => {
                let err = std::mem::take(&mut result.err);
                push_line(&mut result.out, &err);
            }
            Some(ErrorRedirect::File(redirect)) => {
                let err = std::mem::take(&mut result.err);
                let mut text = String::new();
                push_line(&mut text, &err);
                if let Err(failure) = write_target(redirect, &text, ctx) {
                    return failure;
                }
            }
            None => {}
        }

        if let Some(redirect) = &stage.output {
            let out = std::mem::take(&mut result.out);
            if let Err(failure) = write_target(redirect, &out, ctx) {
                result.code = failure.code;
                push_line(&mut result.err, &failure.err);
            }
        }

        result
    }
}

/// A variable's state before a `NAME=value cmd` prefix changed it.
struct Saved {
    name: String,
    value: Option<String>,
    exported: bool,
}

fn apply_temporary(assignments: &[(String, String)], ctx: &mut ExecContext) -> Vec<Saved> {
    assignments
        .iter()
        .map(|(name, value)| {
            let saved = Saved {
                name: name.clone(),
                value: ctx.scope.get(name).map(str::to_string),
                exported: ctx.scope.is_exported(name),
            };
            ctx.scope.export(name.clone(), value.clone());
            saved
        })
        .collect()
}

fn restore(saved: Vec<Saved>, ctx: &mut ExecContext) {
    for Saved { name, value, exported } in saved.into_iter().rev() {
        ctx.scope.remove(&name);
        if let Some(value) = value {
            if exported {
                ctx.scope.export(name, value);
            } else {
                ctx.scope.set(name, value);
            }
        }
    }
}

/// Expand a redirection target to exactly one path.
fn target_path(word: &Word, ctx: &ExecContext) -> Result<String, ExecResult> {
    let mut expanded = expand_word(word, &ctx.vfs, &ctx.cwd);
    if expanded.len() != 1 || expanded[0].is_empty() {
        return Err(ExecResult::failure(
            1,
            format!("{ERROR_PREFIX} {}: ambiguous redirect", word.text),
        ));
    }
    Ok(expanded.remove(0))
}

fn read_input(word: &Word, ctx: &mut ExecContext) -> Result<String, ExecResult> {
    let name = target_path(word, ctx)?;
    let resolved = ctx.resolve_path(&name);
    ctx.vfs
        .read_to_string(&resolved)
        .map_err(|e| ExecResult::failure(1, format!("{ERROR_PREFIX} {name}: {}", e.reason())))
}

/// Create or truncate a redirect target before the command runs.
fn open_target(redirect: &Redirect, ctx: &mut ExecContext) -> Result<(), ExecResult> {
    let name = target_path(&redirect.target, ctx)?;
    let resolved = ctx.resolve_path(&name);
    let result = if redirect.append && ctx.vfs.exists(&resolved) {
        Ok(())
    } else {
        ctx.vfs.write(&resolved, b"", false)
    };
    result.map_err(|e| ExecResult::failure(1, format!("{ERROR_PREFIX} {name}: {}", e.reason())))
}

fn write_target(redirect: &Redirect, text: &str, ctx: &mut ExecContext) -> Result<(), ExecResult> {
    if text.is_empty() {
        return Ok(());
    }
    let name = target_path(&redirect.target, ctx)?;
    let resolved = ctx.resolve_path(&name);
    ctx.vfs
        .write(&resolved, text.as_bytes(), true)
        .map_err(|e| ExecResult::failure(1, format!("{ERROR_PREFIX} {name}: {}", e.reason())))
}
