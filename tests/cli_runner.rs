// Drives the `test_runner` binary end to end.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

fn runner() -> Command {
    Command::cargo_bin("test_runner").unwrap()
}

#[test]
fn full_run_exits_with_failed_test_count() {
    runner()
        .arg("--no-color")
        .assert()
        .code(1)
        .stdout(
            contains("[========] Running 6 test cases")
                .and(contains("[  PASS  ] demo.mocked_storage"))
                .and(contains("[  FAIL  ] broken.deliberate_failure (3 assertions)"))
                .and(contains("[========] Passed 5 test cases"))
                .and(contains("[========] Failed 1 test cases")),
        );
}

#[test]
fn single_passing_test() {
    runner()
        .args(["--no-color", "demo.inline_mock"])
        .assert()
        .success()
        .stdout(contains("[  PASS  ] demo.inline_mock (4 assertions)").and(contains("Running").not()));
}

#[test]
fn single_failing_test_returns_failed_assertions() {
    runner()
        .args(["--no-color", "broken.deliberate_failure"])
        .assert()
        .code(2)
        .stdout(contains("'false' is false").and(contains("'true' is true")));
}

#[test]
fn unknown_test_name_exits_with_minus_one() {
    runner()
        .args(["--no-color", "demo.nonexistent"])
        .assert()
        .code(255)
        .stdout(contains("[  FAIL  ] error because of bad test name"));
}

#[test]
fn malformed_test_name_exits_with_minus_one() {
    runner()
        .args(["--no-color", "nodot"])
        .assert()
        .code(255)
        .stdout(contains("bad test name").and(contains("help:")));
}

#[test]
fn fails_only_reports_failures() {
    runner()
        .args(["--no-color", "--fails-only"])
        .assert()
        .code(1)
        .stdout(
            contains("broken.deliberate_failure")
                .and(contains("demo.arithmetic").not())
                .and(contains("Passed").not()),
        );
}

#[test]
fn colors_by_default() {
    runner()
        .arg("demo.arithmetic")
        .assert()
        .success()
        .stdout(contains("\x1b[32m[  PASS  ]\x1b[0m demo.arithmetic (3 assertions)"));
}

#[test]
fn oneliners_move_cursor_up() {
    runner()
        .args(["--no-color", "--oneliners", "demo.strings"])
        .assert()
        .success()
        .stdout(contains("\x1b[1A[  PASS  ] demo.strings (2 assertions)"));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    runner().arg("--verbose").assert().failure().stderr(contains("--verbose"));
}
