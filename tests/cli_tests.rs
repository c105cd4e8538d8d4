use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

fn stdout_of(script: &str) -> String {
    let assert = run_cli(script).success();
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

#[test]
fn cli_computes_critical_path() {
    run_cli("task 1 Dig 3\ntask 2 Pour 2\ntask 3 Cure 4\ndep 1 2\ndep 1 3\ncompute\nquit\n")
        .success()
        .stdout(str_contains("Computed (tasks=3, critical=2, finish=7, duration=7, path=1->3)"));
}

#[test]
fn cli_reports_cycles() {
    run_cli("task 1 A 1\ntask 2 B 1\ndep 1 2\ndep 2 1 SS 0\ncompute\nquit\n")
        .success()
        .stdout(str_contains("Compute error: cyclic dependency: 1 -> 2 -> 1"));
}

#[test]
fn cli_levels_within_float() {
    let output = stdout_of(
        "task 1 A 2\ntask 2 B 2\ntask 3 Long 6\nresource crew 1\nassign 1 crew 1\nassign 2 crew 1\nlevel within-float\nquit\n",
    );
    assert!(
        output.contains("Leveled (within-float, 1 shifted, 0 conflicts left, finish=6)"),
        "unexpected output:\n{output}"
    );
    assert!(output.contains("task 1 delayed 0 -> 2"));
}

#[test]
fn cli_baseline_compare_shows_slip() {
    let output = stdout_of(
        "task 1 Dig 3\ntask 2 Pour 2\ndep 1 2\ncompute\nbaseline create approved plan\ntask 1 Dig 5\ncompute\nbaseline compare 1\nbaseline list\nquit\n",
    );
    assert!(output.contains("Baseline 1 created."));
    assert!(output.contains("Project finish variance: +2"));
    assert!(output.contains("task 2 finish 5 -> 7 (+2)"));
    assert!(output.contains("approved plan"));
}

#[test]
fn cli_baseline_requires_schedule() {
    run_cli("task 1 A 2\nbaseline create early\nquit\n")
        .success()
        .stdout(str_contains("Error: no schedule has been computed"));
}

#[test]
fn cli_exports_csv_to_stdout() {
    let output = stdout_of("task 1 A 2\ntask 2 B 1\ndep 1 2 SS 1\ncompute\nexport csv\nquit\n");
    assert!(output.contains("task_id,name,duration"));
    assert!(output.contains("predecessor,successor,kind,lag"));
    assert!(output.contains("1,2,SS,1"));
}

#[test]
fn cli_rejects_unknown_export_format() {
    run_cli("task 1 A 2\ncompute\nexport xml\nquit\n")
        .success()
        .stdout(str_contains("Export error: unsupported export format 'xml'"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().into_owned();
    let script = format!(
        "task 1 Persisted 4\nsave {path}\ntask 2 Temp 1\nload {path}\nshow\nquit\n"
    );
    let output = stdout_of(&script);
    assert!(output.contains(&format!("Loaded 1 tasks from {path}.")));
    let after_reload = output.split("Loaded 1 tasks").last().unwrap_or_default();
    assert!(after_reload.contains("Persisted"));
    assert!(
        !after_reload.contains("Temp"),
        "temporary task should not appear after reload:\n{after_reload}"
    );
}

#[test]
fn cli_unknown_command_hints_help() {
    run_cli("frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command. Type 'help'."));
}
