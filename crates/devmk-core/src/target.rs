use camino::Utf8PathBuf;
use strum::IntoEnumIterator;

use crate::config::Config;

/// The fixed set of chore targets. Display names use kebab-case, matching
/// what the operator types on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Target {
    Help,
    Lint,
    PreCommit,
    SetupVenv,
    InstallLocal,
    DistLocal,
    Publish,
}

#[derive(Debug, thiserror::Error)]
#[error("No rule to make target '{0}'")]
pub struct UnknownTarget(pub String);

impl std::str::FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Target::iter()
            .find(|target| target.to_string() == raw)
            .ok_or_else(|| UnknownTarget(raw.to_string()))
    }
}

impl Target {
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Target::Help => "Show this listing",
            Target::Lint => "Run the linter and render an html report (best effort)",
            Target::PreCommit => "Run pre-commit hooks across all tracked files",
            Target::SetupVenv => "Create the virtual environment and upgrade pip",
            Target::InstallLocal => "Editable install with dev extras into the venv",
            Target::DistLocal => "Build sdist and wheel inside the venv",
            Target::Publish => "Build artifacts and upload them to the package index",
        }
    }

    #[must_use]
    pub fn prerequisite(self) -> Option<Target> {
        match self {
            Target::InstallLocal | Target::DistLocal => Some(Target::SetupVenv),
            _ => None,
        }
    }

    /// Prerequisites first, the requested target last.
    #[must_use]
    pub fn chain(self) -> Vec<Target> {
        let mut chain = vec![self];
        let mut cursor = self;
        while let Some(prereq) = cursor.prerequisite() {
            chain.insert(0, prereq);
            cursor = prereq;
        }
        chain
    }

    /// The ordered command list for this target, with configuration values
    /// substituted in. `help` is rendered internally and owns no commands.
    #[must_use]
    pub fn steps(self, config: &Config) -> Vec<CommandStep> {
        let py = config.interpreter();
        let venv_py = config.venv_python();
        match self {
            Target::Help => Vec::new(),
            Target::Lint => vec![
                CommandStep::new(
                    config.linter(),
                    &[
                        config.lint_package(),
                        "--output-format=pylint_report.CustomJsonReporter",
                    ],
                )
                .stdout_to("pylint.json")
                .allow_failure(),
                CommandStep::new("pylint_report", &["pylint.json", "-o", "pylint.html"])
                    .allow_failure(),
            ],
            Target::PreCommit => vec![CommandStep::new("pre-commit", &["run", "--all-files"])],
            Target::SetupVenv => vec![
                CommandStep::new(py, &["-m", "venv", config.venv_dir()]),
                CommandStep::new(
                    venv_py.as_str(),
                    &["-m", "pip", "install", "--upgrade", "pip"],
                ),
            ],
            Target::InstallLocal => vec![CommandStep::new(
                venv_py.as_str(),
                &["-m", "pip", "install", "-e", ".[dev]"],
            )],
            Target::DistLocal => vec![
                CommandStep::new(venv_py.as_str(), &["-m", "pip", "install", "build"]),
                CommandStep::new(venv_py.as_str(), &["-m", "build"]),
            ],
            Target::Publish => vec![
                CommandStep::new(py, &["-m", "pip", "install", "build"]),
                CommandStep::new(py, &["-m", "build"]),
                CommandStep::new(py, &["-m", "pip", "install", "twine"]),
                CommandStep::new(
                    py,
                    &[
                        "-m",
                        "twine",
                        "upload",
                        "--repository-url",
                        config.index_url(),
                        "dist/*",
                    ],
                ),
            ],
        }
    }
}

/// One external command in a target's ordered list.
#[derive(Debug, Clone)]
pub struct CommandStep {
    pub program: String,
    pub args: Vec<String>,
    /// A non-zero exit from this step is logged and ignored.
    pub allow_failure: bool,
    /// Redirect the child's stdout into this file (relative to the working
    /// directory), as the shell `>` would.
    pub stdout_to: Option<Utf8PathBuf>,
}

impl CommandStep {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            allow_failure: false,
            stdout_to: None,
        }
    }

    fn allow_failure(mut self) -> Self {
        self.allow_failure = true;
        self
    }

    fn stdout_to(mut self, path: &str) -> Self {
        self.stdout_to = Some(Utf8PathBuf::from(path));
        self
    }

    /// Shell-style rendering for logs and dry runs.
    #[must_use]
    pub fn rendered(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        let mut line = parts.join(" ");
        if let Some(path) = &self.stdout_to {
            line.push_str(" > ");
            line.push_str(path.as_str());
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, EnvSnapshot};

    fn test_config() -> Config {
        Config::from_snapshot(&EnvSnapshot::testing(&[]), &ConfigOverrides::default())
    }

    #[test]
    fn every_target_parses_from_its_display_name() {
        for target in Target::iter() {
            let name = target.to_string();
            assert_eq!(name.parse::<Target>().unwrap(), target, "{name}");
        }
    }

    #[test]
    fn kebab_case_names_match_the_cli_surface() {
        let names: Vec<String> = Target::iter().map(|t| t.to_string()).collect();
        assert_eq!(
            names,
            [
                "help",
                "lint",
                "pre-commit",
                "setup-venv",
                "install-local",
                "dist-local",
                "publish",
            ]
        );
    }

    #[test]
    fn unrecognized_name_reports_no_rule() {
        let err = "frobnicate".parse::<Target>().unwrap_err();
        assert_eq!(err.to_string(), "No rule to make target 'frobnicate'");
    }

    #[test]
    fn install_and_dist_depend_on_setup_venv() {
        assert_eq!(
            Target::InstallLocal.chain(),
            vec![Target::SetupVenv, Target::InstallLocal]
        );
        assert_eq!(
            Target::DistLocal.chain(),
            vec![Target::SetupVenv, Target::DistLocal]
        );
        assert_eq!(Target::Publish.chain(), vec![Target::Publish]);
    }

    #[test]
    fn only_lint_steps_are_suppressed() {
        let config = test_config();
        for target in Target::iter() {
            for step in target.steps(&config) {
                assert_eq!(step.allow_failure, target == Target::Lint, "{target}");
            }
        }
    }

    #[test]
    fn lint_redirects_the_json_report() {
        let config = test_config();
        let steps = Target::Lint.steps(&config);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].program, "pylint");
        assert_eq!(steps[0].stdout_to.as_deref().map(|p| p.as_str()), Some("pylint.json"));
        assert_eq!(steps[1].program, "pylint_report");
        assert!(steps[1].stdout_to.is_none());
    }

    #[test]
    fn publish_builds_before_uploading() {
        let config = test_config();
        let steps = Target::Publish.steps(&config);
        let rendered: Vec<String> = steps.iter().map(CommandStep::rendered).collect();
        assert_eq!(rendered.len(), 4);
        assert!(rendered[1].contains("-m build"));
        assert!(rendered[3].contains("twine upload"));
        assert!(rendered[3].contains("https://upload.pypi.org/legacy/"));
        assert!(rendered[3].ends_with("dist/*"));
    }

    #[cfg(unix)]
    #[test]
    fn venv_targets_use_the_venv_interpreter() {
        let config = test_config();
        let steps = Target::InstallLocal.steps(&config);
        assert_eq!(steps[0].program, ".venv/bin/python");
        let steps = Target::SetupVenv.steps(&config);
        assert_eq!(steps[0].program, "python");
        assert_eq!(steps[1].program, ".venv/bin/python");
    }

    #[test]
    fn rendered_includes_redirection() {
        let config = test_config();
        let line = Target::Lint.steps(&config)[0].rendered();
        assert!(line.ends_with("> pylint.json"), "{line}");
    }
}
