use assert_cmd::cargo::cargo_bin_cmd;

const TARGET_NAMES: [&str; 7] = [
    "help",
    "lint",
    "pre-commit",
    "setup-venv",
    "install-local",
    "dist-local",
    "publish",
];

fn listing(args: &[&str]) -> String {
    let assert = cargo_bin_cmd!("devmk").args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 listing")
}

#[test]
fn help_prints_one_padded_line_per_target() {
    let output = listing(&["help"]);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), TARGET_NAMES.len());
    for (line, name) in lines.iter().zip(TARGET_NAMES) {
        let expected = format!("{name:<15} ");
        assert!(line.starts_with(&expected), "line {line:?} for {name}");
        assert!(line.len() > 16, "description missing in {line:?}");
    }
}

#[test]
fn help_is_the_default_target() {
    assert_eq!(listing(&[]), listing(&["help"]));
}

#[test]
fn clap_help_names_every_target() {
    let output = listing(&["--help"]);
    for name in TARGET_NAMES {
        assert!(output.contains(name), "--help missing {name}: {output}");
    }
}
