//! Golden-test harness for the workbench: every case under
//! `golden-tests/tests/` is run twice with the same seed and must produce
//! byte-identical reports (the determinism invariant), which are then also
//! compared against the persisted expected output. Missing expected files are
//! created from the first run.
//!
//! Run from the workspace root: `cargo run --bin golden-tests`.

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::process::Command;

static ARGS_FILE: &str = "args";
static EXPECTED_DIR: &str = "expected";
static REPORTS_A: &str = "reports-a";
static REPORTS_B: &str = "reports-b";

struct TestCase {
    dir: PathBuf,
    name: String,
    args: String,
}

fn main() -> anyhow::Result<()> {
    let mut test_cases = Vec::new();
    let test_dirs =
        std::fs::read_dir("golden-tests/tests").context("golden tests root directory not found")?;
    for entry in test_dirs {
        let entry = entry?;
        let path = entry.path();

        if !path.is_dir() {
            println!(
                "skipping path `{}` because it's not a directory",
                path.display()
            );
            continue;
        }

        let args_path = path.join(ARGS_FILE);
        let args = std::fs::read_to_string(&args_path)
            .with_context(|| format!("no `{ARGS_FILE}` file found at `{}`", args_path.display()))?;

        test_cases.push(TestCase {
            name: path.display().to_string(),
            dir: path,
            args,
        })
    }

    let mut errored = false;
    for test_case in test_cases {
        let name = test_case.name.clone();
        match run_case(&test_case) {
            Err(e) => {
                println!("{name}: error\n{e:?}");
                errored = true;
            }
            Ok(diffs) if !diffs.is_empty() => {
                println!("{name}: ❌");
                for (file, diff) in diffs {
                    println!("`{file}` differs:\n{diff}");
                }
                errored = true;
            }
            Ok(_) => println!("{name}: ✅"),
        }
    }

    if errored {
        bail!("one or more golden tests failed");
    }

    Ok(())
}

/// Runs the case twice and returns the observed diffs (empty = pass).
fn run_case(test_case: &TestCase) -> anyhow::Result<Vec<(String, String)>> {
    let reports_a = test_case.dir.join(REPORTS_A);
    let reports_b = test_case.dir.join(REPORTS_B);
    for dir in [&reports_a, &reports_b] {
        if dir.exists() {
            std::fs::remove_dir_all(dir).context("failed to clean report directory")?;
        }
    }

    run_workbench(&test_case.args, &reports_a)?;
    run_workbench(&test_case.args, &reports_b)?;

    let mut diffs = Vec::new();

    // Determinism: the two identically seeded runs must agree byte-for-byte
    for entry in std::fs::read_dir(&reports_a).context("first run produced no reports")? {
        let path_a = entry?.path();
        let file_name = path_a
            .file_name()
            .and_then(|n| n.to_str())
            .context("report file name is not UTF-8")?
            .to_string();
        let contents_a = std::fs::read_to_string(&path_a)?;
        let contents_b = std::fs::read_to_string(reports_b.join(&file_name))
            .with_context(|| format!("second run did not produce `{file_name}`"))?;

        if contents_a != contents_b {
            diffs.push((
                format!("{file_name} (run A vs run B)"),
                diff::diff_to_string(&contents_a, &contents_b),
            ));
            continue;
        }

        // Golden comparison; persist the expectation when it doesn't exist yet
        let expected_path = test_case.dir.join(EXPECTED_DIR).join(&file_name);
        if expected_path.is_file() {
            let expected = std::fs::read_to_string(&expected_path)?;
            if expected != contents_a {
                diffs.push((
                    format!("{file_name} (expected vs actual)"),
                    diff::diff_to_string(&expected, &contents_a),
                ));
            }
        } else {
            std::fs::create_dir_all(test_case.dir.join(EXPECTED_DIR))?;
            std::fs::write(&expected_path, &contents_a)
                .context("failed to persist expected report")?;
            println!("persisted `{}`", expected_path.display());
        }
    }

    Ok(diffs)
}

fn run_workbench(args: &str, report_dir: &Path) -> anyhow::Result<()> {
    let output = Command::new("cargo")
        .arg("run")
        .arg("--release")
        .arg("--bin")
        .arg("dtn-workbench")
        .arg("--")
        .arg("run")
        .args(args.split_whitespace())
        .arg("--report-dir")
        .arg(report_dir)
        .output()
        .context("dtn-workbench process crashed")?;

    if !output.status.success() {
        bail!(
            "dtn-workbench exited with {}:\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(())
}

mod diff {
    use console::{style, Style};
    use similar::{ChangeTag, TextDiff};
    use std::fmt::{self, Write};

    struct Line(Option<usize>);

    impl fmt::Display for Line {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            match self.0 {
                None => write!(f, "    "),
                Some(idx) => write!(f, "{:<4}", idx + 1),
            }
        }
    }

    pub fn diff_to_string(old: &str, new: &str) -> String {
        let mut output = String::new();
        let diff = TextDiff::from_lines(old, new);

        for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
            if idx > 0 {
                _ = writeln!(output, "{:-^1$}", "-", 80);
            }
            for op in group {
                for change in diff.iter_inline_changes(op) {
                    let (sign, s) = match change.tag() {
                        ChangeTag::Delete => ("-", Style::new().red()),
                        ChangeTag::Insert => ("+", Style::new().green()),
                        ChangeTag::Equal => (" ", Style::new().dim()),
                    };
                    _ = write!(
                        output,
                        "{}{} |{}",
                        style(Line(change.old_index())).dim(),
                        style(Line(change.new_index())).dim(),
                        s.apply_to(sign).bold(),
                    );
                    for (emphasized, value) in change.iter_strings_lossy() {
                        if emphasized {
                            _ = write!(output, "{}", s.apply_to(value).underlined().on_black());
                        } else {
                            _ = write!(output, "{}", s.apply_to(value));
                        }
                    }
                    if change.missing_newline() {
                        _ = writeln!(output);
                    }
                }
            }
        }

        output
    }
}
