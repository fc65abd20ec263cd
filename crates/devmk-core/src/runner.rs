use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::{Config, GlobalOptions};
use crate::help;
use crate::outcome::ExecutionOutcome;
use crate::process;
use crate::target::{CommandStep, Target};

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub target: String,
    pub cwd: Utf8PathBuf,
}

/// Resolve the requested target's prerequisite chain and run it to
/// completion, one child process at a time.
///
/// Unknown targets and failing steps are reported through the outcome
/// status; `Err` is reserved for runner-side problems such as an unreadable
/// working directory.
///
/// # Errors
///
/// Returns an error when a report file cannot be created or a glob argument
/// cannot be expanded.
pub fn execute(
    global: &GlobalOptions,
    config: &Config,
    request: &RunRequest,
) -> Result<ExecutionOutcome> {
    let target = match request.target.parse::<Target>() {
        Ok(target) => target,
        Err(err) => {
            return Ok(ExecutionOutcome::user_error(
                err.to_string(),
                json!({
                    "reason": "unknown_target",
                    "hint": "Run `devmk help` to list the available targets.",
                }),
            ))
        }
    };

    if target == Target::Help {
        return Ok(ExecutionOutcome::success(
            help::render_target_listing(),
            json!({ "passthrough": true }),
        ));
    }

    let chain = target.chain();
    let chain_names: Vec<String> = chain.iter().map(ToString::to_string).collect();

    if global.dry_run {
        let planned: Vec<Value> = chain
            .iter()
            .flat_map(|link| link.steps(config))
            .map(|step| {
                json!({
                    "command": step.rendered(),
                    "suppressed": step.allow_failure,
                })
            })
            .collect();
        let message = format!("dry-run: {} step(s) planned", planned.len());
        return Ok(ExecutionOutcome::success(
            message,
            json!({
                "target": target.to_string(),
                "chain": chain_names,
                "planned": planned,
            }),
        ));
    }

    let mut steps = Vec::new();
    let mut suppressed_failures = 0u32;
    for link in &chain {
        for step in link.steps(config) {
            let code = run_step(&step, &request.cwd, &mut steps)?;
            let Some(code) = code else {
                // spawn failure on a non-suppressed step
                let message = format!("failed to start `{}`", step.rendered());
                return Ok(ExecutionOutcome::failure(
                    message,
                    json!({
                        "target": target.to_string(),
                        "chain": chain_names,
                        "steps": steps,
                    }),
                ));
            };
            if code == 0 {
                continue;
            }
            if step.allow_failure {
                // run_step already warned about the failure
                suppressed_failures += 1;
                continue;
            }
            let message = format!("step `{}` exited with {code}", step.rendered());
            return Ok(ExecutionOutcome::failure(
                message,
                json!({
                    "target": target.to_string(),
                    "chain": chain_names,
                    "steps": steps,
                    "code": code,
                }),
            ));
        }
    }

    let message = if suppressed_failures > 0 {
        format!("finished ({suppressed_failures} suppressed failure(s))")
    } else {
        "finished".to_string()
    };
    Ok(ExecutionOutcome::success(
        message,
        json!({
            "target": target.to_string(),
            "chain": chain_names,
            "steps": steps,
        }),
    ))
}

/// Run one step and push its record. Returns the exit code, or `None` when
/// the program could not be started and the step does not allow failure.
fn run_step(step: &CommandStep, cwd: &Utf8Path, steps: &mut Vec<Value>) -> Result<Option<i32>> {
    let args = expand_globs(&step.args, cwd)?;
    info!(command = %step.rendered(), "running");

    let spawned = match &step.stdout_to {
        Some(path) => process::run_command_to_file(
            &step.program,
            &args,
            cwd.as_std_path(),
            cwd.join(path).as_std_path(),
        ),
        None => process::run_command_streaming(&step.program, &args, cwd.as_std_path()),
    };

    let output = match spawned {
        Ok(output) => output,
        Err(err) if step.allow_failure => {
            warn!(command = %step.rendered(), error = %err, "step could not start (suppressed)");
            steps.push(json!({
                "program": step.program,
                "args": args,
                "code": -1,
                "error": format!("{err:#}"),
                "suppressed": true,
            }));
            return Ok(Some(-1));
        }
        Err(err) => {
            steps.push(json!({
                "program": step.program,
                "args": args,
                "error": format!("{err:#}"),
                "suppressed": false,
            }));
            return Ok(None);
        }
    };

    if output.code != 0 && step.allow_failure {
        warn!(command = %step.rendered(), code = output.code, "step failed (suppressed)");
    }
    steps.push(json!({
        "program": step.program,
        "args": args,
        "code": output.code,
        "stdout": output.stdout,
        "stderr": output.stderr,
        "suppressed": step.allow_failure,
    }));
    Ok(Some(output.code))
}

/// Expand shell-style glob arguments (the publish chain's `dist/*`) against
/// the working directory. An empty expansion passes the literal pattern
/// through, as `make`'s shell would.
fn expand_globs(args: &[String], cwd: &Utf8Path) -> Result<Vec<String>> {
    let mut expanded = Vec::with_capacity(args.len());
    for arg in args {
        if !arg.contains('*') {
            expanded.push(arg.clone());
            continue;
        }
        let (dir, pattern) = arg.rsplit_once('/').unwrap_or((".", arg.as_str()));
        let matcher = globset::Glob::new(pattern)
            .with_context(|| format!("invalid glob `{arg}`"))?
            .compile_matcher();
        let mut matched = Vec::new();
        if let Ok(entries) = fs_err::read_dir(cwd.join(dir).as_std_path()) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if matcher.is_match(&name) {
                    matched.push(format!("{dir}/{name}"));
                }
            }
        }
        matched.sort();
        if matched.is_empty() {
            expanded.push(arg.clone());
        } else {
            expanded.append(&mut matched);
        }
    }
    Ok(expanded)
}
