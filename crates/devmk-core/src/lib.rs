//! Core library for `devmk`: a fixed table of make-style chore targets for
//! Python projects, and a strictly sequential runner that executes them by
//! spawning the underlying command-line tools.

mod config;
mod help;
mod outcome;
mod process;
mod runner;
mod target;

pub use config::{
    Config, ConfigOverrides, GlobalOptions, DEFAULT_INDEX_URL, DEFAULT_INTERPRETER,
    DEFAULT_LINTER, DEFAULT_VENV_DIR,
};
pub use help::{render_target_listing, NAME_COLUMN_WIDTH};
pub use outcome::{to_json_response, CommandStatus, ExecutionOutcome};
pub use process::RunOutput;
pub use runner::{execute, RunRequest};
pub use target::{CommandStep, Target, UnknownTarget};
