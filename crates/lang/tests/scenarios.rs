//! End-to-end scenarios: run the compiled `numen` binary against a real
//! source file and assert on its captured standard output. `print` writes
//! directly to the process's real stdout, so only a subprocess run (not a
//! call into the library) can observe it.

use std::io::Write;
use std::process::Command;

const BINARY: &str = env!("CARGO_BIN_EXE_numen");

/// Write `source` to a temp `.numen` file, run the binary against it, and
/// return its captured stdout as a `String`.
fn run(source: &str) -> String {
    let mut file = tempfile::Builder::new()
        .suffix(".numen")
        .tempfile()
        .expect("failed to create temp source file");
    file.write_all(source.as_bytes()).expect("failed to write temp source file");

    let output = Command::new(BINARY)
        .arg(file.path())
        .output()
        .expect("failed to run the numen binary");

    assert!(
        output.status.success(),
        "expected success, got {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be utf8")
}

#[test]
fn adds_two_ints() {
    assert_eq!(run("1 2 + print"), "3\n");
}

#[test]
fn concatenates_strings() {
    assert_eq!(run(r#""hello " "world" + print"#), "hello world\n");
}

#[test]
fn let_binds_and_reads_back() {
    assert_eq!(run("3 x let x x * print"), "9\n");
}

#[test]
fn calls_a_user_defined_function() {
    assert_eq!(run("fun sq n as n n * ret end 4 sq print"), "16\n");
}

#[test]
fn while_loop_rebinds_and_prints_each_iteration() {
    assert_eq!(run("0 i let while i 5 < do i print i 1 + i let end"), "0\n1\n2\n3\n4\n");
}

#[test]
fn modulo_is_true_remainder() {
    assert_eq!(run("7 2 % print"), "1\n");
}

#[test]
fn mixed_int_float_arithmetic_coerces_to_float() {
    assert_eq!(run("1.5 2 + print"), "3.5\n");
}

#[test]
fn if_else_selects_the_true_branch() {
    assert_eq!(run(r#"5 3 > if "yes" print else "no" print end"#), "yes\n");
}
