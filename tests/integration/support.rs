//! Fixtures shared by the integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use dupebridge::cli::Cli;
use dupebridge::error::ExitCode;

/// Write `content` to `dir/name` and return the full path.
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// An empty config file so the user's own config never leaks into a test.
pub fn empty_config(dir: &Path) -> PathBuf {
    write_file(dir, "config.toml", b"")
}

/// Run the CLI with `args` after the program name.
pub fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["dupebridge", "--quiet", "--no-color"];
    argv.extend_from_slice(args);
    dupebridge::run_app(Cli::try_parse_from(argv).unwrap())
}

/// Run `report` over `roots`, writing to `csv`.
pub fn run_report(config: &Path, roots: &[&Path], csv: &Path) -> anyhow::Result<ExitCode> {
    let config = config.to_str().unwrap();
    let csv = csv.to_str().unwrap();
    let mut args = vec!["--config", config, "report", "--csv-file", csv];
    for root in roots {
        args.push("--path");
        args.push(root.to_str().unwrap());
    }
    run(&args)
}

/// Set `remove_file` to `true` on the report row for `file_name`.
pub fn mark_for_removal(csv: &Path, file_name: &str) {
    let needle = format!(",{},", file_name);
    let text = fs::read_to_string(csv).unwrap();
    let mut marked = 0;
    let updated: Vec<String> = text
        .lines()
        .map(|line| {
            if line.contains(&needle) && line.ends_with(",false") {
                marked += 1;
                format!("{},true", line.trim_end_matches(",false"))
            } else {
                line.to_string()
            }
        })
        .collect();
    assert_eq!(marked, 1, "expected exactly one row for {}", file_name);
    fs::write(csv, updated.join("\n") + "\n").unwrap();
}
