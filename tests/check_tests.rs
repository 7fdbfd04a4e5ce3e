use assert_cmd::Command;
use predicates::str::{contains, is_empty};

fn vcpu() -> Command {
    let mut cmd = Command::cargo_bin("vcpu").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn checks_valid_program() {
    vcpu()
        .arg("check")
        .arg("tests/files/factorial.asm")
        .assert()
        .success()
        .stdout(is_empty())
        .stderr(contains("Checking target tests/files/factorial.asm"))
        .stderr(contains("Success no errors found!"));
}

#[test]
fn reports_every_error() {
    vcpu()
        .arg("check")
        .arg("tests/files/check_errors.asm")
        .assert()
        .failure()
        .stdout(is_empty())
        .stderr(contains("Undefined label `.missing`"))
        .stderr(contains("Cannot write to immediate `$2`"))
        .stderr(contains("Found 2 errors."));
}

#[test]
fn check_does_not_run() {
    // Would loop forever if executed
    vcpu()
        .arg("check")
        .write_stdin(".top\np\njmp .top\n")
        .assert()
        .success()
        .stdout(is_empty())
        .stderr(contains("Checking standard input"));
}

#[test]
fn check_warns_on_duplicate_label() {
    vcpu()
        .arg("check")
        .arg("tests/files/duplicate_label.asm")
        .assert()
        .success()
        .stderr(contains("Duplicate label `.target` on line 4"))
        .stderr(contains("Success no errors found!"));
}
