//! chmod, chown — Change permission bits and ownership.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::path;

use super::{display_join, lookup_id, missing_operand};

/// Chmod tool: change file mode bits.
///
/// Modes are octal (`755`) or symbolic (`u+x,go-w`, `a=r`, `+X`). Since
/// `-x` is both a switch spelling and a mode, argv is parsed here rather
/// than through the schema.
pub struct Chmod;

#[async_trait]
impl Tool for Chmod {
    fn name(&self) -> &str {
        "chmod"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("chmod", "Change file mode bits")
            .param(
                ParamSchema::flag("recursive", "Change files and directories recursively")
                    .with_aliases(["-R"]),
            )
            .param(ParamSchema::flag("verbose", "Output a diagnostic for every file").with_aliases(["-v"]))
            .example("Make a script executable", "chmod +x run.sh")
            .example("Owner-only access", "chmod 600 secret.txt")
            .raw()
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let mut recursive = false;
        let mut verbose = false;
        let mut operands = Vec::new();
        for arg in args.positional {
            match arg.as_str() {
                "-R" | "--recursive" => recursive = true,
                "-v" | "--verbose" => verbose = true,
                "-Rv" | "-vR" => {
                    recursive = true;
                    verbose = true;
                }
                _ => operands.push(arg),
            }
        }

        let Some((mode, files)) = operands.split_first() else {
            return missing_operand("chmod");
        };
        if files.is_empty() {
            return ExecResult::failure(
                1,
                format!("chmod: missing operand after '{mode}'\nTry 'chmod --help' for more information."),
            );
        }
        if apply_mode(mode, 0o644, false).is_none() {
            return ExecResult::failure(1, format!("chmod: invalid mode: '{mode}'"));
        }

        let mut out = String::new();
        let mut err = String::new();
        for file in files {
            let resolved = ctx.resolve_path(file);
            if !ctx.vfs.exists(&resolved) {
                err.push_str(&format!(
                    "chmod: cannot access '{file}': No such file or directory\n"
                ));
                continue;
            }
            let targets = if recursive {
                walk_tree(ctx, &resolved, file)
            } else {
                vec![(resolved, file.clone())]
            };
            for (target, shown) in targets {
                let Ok(meta) = ctx.vfs.stat(&target) else {
                    continue;
                };
                let Some(new_mode) = apply_mode(mode, meta.mode, meta.is_dir()) else {
                    continue;
                };
                if let Err(e) = ctx.vfs.chmod(&target, new_mode) {
                    err.push_str(&format!("chmod: changing permissions of '{shown}': {}\n", e.reason()));
                    continue;
                }
                if verbose {
                    out.push_str(&format!(
                        "mode of '{shown}' changed from {:04o} to {new_mode:04o}\n",
                        meta.mode
                    ));
                }
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, out, err)
    }
}

/// Chown tool: change file owner and group.
pub struct Chown;

#[async_trait]
impl Tool for Chown {
    fn name(&self) -> &str {
        "chown"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("chown", "Change file owner and group")
            .param(
                ParamSchema::flag("recursive", "Operate on files and directories recursively")
                    .with_aliases(["-R"]),
            )
            .example("Give a tree to a user", "chown -R user:user project")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some((spec, files)) = args.positional.split_first() else {
            return missing_operand("chown");
        };
        if files.is_empty() {
            return ExecResult::failure(
                1,
                format!("chown: missing operand after '{spec}'\nTry 'chown --help' for more information."),
            );
        }

        let (owner, group) = match spec.split_once([':', '.']) {
            Some((owner, group)) => (non_empty(owner), non_empty(group)),
            None => (non_empty(spec), None),
        };
        if let Some(owner) = owner {
            if lookup_id(ctx, "/etc/passwd", owner).is_none() && owner.parse::<u32>().is_err() {
                return ExecResult::failure(1, format!("chown: invalid user: '{spec}'"));
            }
        }
        if let Some(group) = group {
            if lookup_id(ctx, "/etc/group", group).is_none() && group.parse::<u32>().is_err() {
                return ExecResult::failure(1, format!("chown: invalid group: '{spec}'"));
            }
        }

        let mut err = String::new();
        for file in files {
            let resolved = ctx.resolve_path(file);
            if !ctx.vfs.exists(&resolved) {
                err.push_str(&format!(
                    "chown: cannot access '{file}': No such file or directory\n"
                ));
                continue;
            }
            let targets = if args.has_flag("recursive") {
                walk_tree(ctx, &resolved, file)
            } else {
                vec![(resolved, file.clone())]
            };
            for (target, shown) in targets {
                if let Err(e) = ctx.vfs.chown(&target, owner, group) {
                    err.push_str(&format!("chown: changing ownership of '{shown}': {}\n", e.reason()));
                }
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, "", err)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

/// `root` and everything below it, depth first, as (absolute, display) pairs.
fn walk_tree(ctx: &ExecContext, root: &str, shown: &str) -> Vec<(String, String)> {
    let mut found = vec![(root.to_string(), shown.to_string())];
    if ctx.vfs.is_symlink(root) {
        return found;
    }
    if let Ok(entries) = ctx.vfs.list(root) {
        for entry in entries {
            let child = path::join(root, &entry.name);
            let child_shown = display_join(shown, &entry.name);
            if entry.meta.is_dir() {
                found.extend(walk_tree(ctx, &child, &child_shown));
            } else if !entry.meta.is_symlink() {
                found.push((child, child_shown));
            }
        }
    }
    found
}

/// Apply an octal or symbolic mode to `current`. `None` for a bad mode.
fn apply_mode(spec: &str, current: u32, is_dir: bool) -> Option<u32> {
    if !spec.is_empty() && spec.chars().all(|c| c.is_digit(8)) {
        return u32::from_str_radix(spec, 8).ok().filter(|m| *m <= 0o7777);
    }

    let mut mode = current;
    for clause in spec.split(',') {
        let op_at = clause.find(['+', '-', '='])?;
        let (who_text, rest) = clause.split_at(op_at);

        let mut who = 0u32;
        for c in who_text.chars() {
            who |= match c {
                'u' => 0o4700,
                'g' => 0o2070,
                'o' => 0o1007,
                'a' => 0o7777,
                _ => return None,
            };
        }
        if who == 0 {
            who = 0o7777;
        }

        let mut chars = rest.chars().peekable();
        while let Some(op) = chars.next() {
            let mut perms = 0u32;
            while let Some(&c) = chars.peek() {
                if matches!(c, '+' | '-' | '=') {
                    break;
                }
                perms |= match c {
                    'r' => 0o444,
                    'w' => 0o222,
                    'x' => 0o111,
                    'X' if is_dir || mode & 0o111 != 0 => 0o111,
                    'X' => 0,
                    's' => 0o6000,
                    't' => 0o1000,
                    _ => return None,
                };
                chars.next();
            }
            let bits = perms & who;
            mode = match op {
                '+' => mode | bits,
                '-' => mode & !bits,
                '=' => (mode & !(who & 0o7777)) | bits,
                _ => return None,
            };
        }
    }
    Some(mode & 0o7777)
}
