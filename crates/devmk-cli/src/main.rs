use atty::Stream;
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use color_eyre::{eyre::eyre, Result};
use devmk_core::{
    CommandStatus, Config, ConfigOverrides, ExecutionOutcome, GlobalOptions, RunRequest,
};
use serde_json::Value;

mod style;

use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = DevmkCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
        dry_run: cli.dry_run,
    };
    let overrides = ConfigOverrides {
        interpreter: cli.python.clone(),
        venv_dir: cli.venv.clone(),
        linter: cli.lint_cmd.clone(),
        lint_package: cli.lint_package.clone(),
        index_url: cli.index_url.clone(),
    };
    let config = Config::from_env(&overrides);

    let cwd = Utf8PathBuf::from_path_buf(std::env::current_dir()?)
        .map_err(|path| eyre!("working directory is not valid UTF-8: {}", path.display()))?;
    let request = RunRequest {
        target: cli.target.clone().unwrap_or_else(|| "help".to_string()),
        cwd,
    };

    let outcome = devmk_core::execute(&global, &config, &request).map_err(|err| eyre!("{err:?}"))?;
    let code = emit_output(&cli, &request, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("devmk_cli={level},devmk_core={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn emit_output(cli: &DevmkCli, request: &RunRequest, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = outcome.status.exit_code();
    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));

    if cli.json {
        let payload = devmk_core::to_json_response(outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !cli.quiet {
        if is_passthrough(&outcome.details) {
            println!("{}", outcome.message);
        } else {
            let message = format_status_message(&request.target, outcome);
            println!("{}", style.status(&outcome.status, &message));
            if let Some(hint) = hint_from_details(&outcome.details) {
                let hint_line = format!("Hint: {hint}");
                println!("{}", style.info(&hint_line));
            }
        }
    }

    Ok(code)
}

fn format_status_message(target: &str, outcome: &ExecutionOutcome) -> String {
    // unknown-target errors already carry the requested name
    let prefix = match outcome.status {
        CommandStatus::UserError => "devmk".to_string(),
        _ => format!("devmk {target}"),
    };
    if outcome.message.is_empty() {
        prefix
    } else {
        format!("{prefix}: {}", outcome.message)
    }
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

fn is_passthrough(details: &Value) -> bool {
    details
        .as_object()
        .and_then(|map| map.get("passthrough"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[derive(Parser, Debug)]
#[command(
    name = "devmk",
    author,
    version,
    about = "Make-style chore runner for Python projects",
    long_about = "Named targets wrapping venv setup, editable installs, linting, packaging, and publishing.",
    after_help = "Targets:\n  help, lint, pre-commit, setup-venv, install-local, dist-local, publish\n\nExamples:\n  devmk lint\n  devmk install-local\n  DEVMK_PYTHON=python3.12 devmk setup-venv\n  devmk publish --index-url https://test.pypi.org/legacy/\n"
)]
struct DevmkCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (failures are still reflected in the exit code)"
    )]
    quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q")]
    trace: bool,
    #[arg(long, help = "Emit {status,message,details} JSON envelopes")]
    json: bool,
    #[arg(long, help = "Disable colored human output")]
    no_color: bool,
    #[arg(long, help = "Print the resolved command chain without running it")]
    dry_run: bool,
    #[arg(long, value_name = "CMD", help = "Interpreter used outside the venv [default: python]")]
    python: Option<String>,
    #[arg(long, value_name = "DIR", help = "Virtual environment directory [default: .venv]")]
    venv: Option<String>,
    #[arg(long, value_name = "CMD", help = "Linter command [default: pylint]")]
    lint_cmd: Option<String>,
    #[arg(long, value_name = "PATH", help = "Package or path handed to the linter [default: .]")]
    lint_package: Option<String>,
    #[arg(long, value_name = "URL", help = "Package-index upload URL [default: PyPI]")]
    index_url: Option<String>,
    #[arg(value_name = "TARGET", help = "Target to run (defaults to help)")]
    target: Option<String>,
}
