use std::process::{Command, Output};

// Prompts are split with '' so the shell's echo of the command line never
// contains the text being matched; only the command's real output does.

fn passtty(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_passtty"))
        .args(["--shell", "/bin/sh"])
        .args(args)
        .output()
        .expect("Failed to execute passtty")
}

#[test]
fn test_password_entered_and_output_passed_through() {
    let output = passtty(&[
        "--password",
        "hunter2",
        "--",
        r#"stty -echo; printf 'pass''word: '; read p; echo "got:$p""#,
    ]);

    assert!(
        output.status.success(),
        "passtty failed with stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("got:hunter2"), "stdout: {stdout}");
}

#[test]
fn test_exit_code_mirrors_child() {
    let output = passtty(&[
        "-p",
        "hunter2",
        "--",
        r#"stty -echo; printf 'pass''word: '; read p; echo "done:$p"; exit 3"#,
    ]);

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_password_from_env() {
    let output = Command::new(env!("CARGO_BIN_EXE_passtty"))
        .args(["--shell", "/bin/sh", "--env", "--"])
        .arg(r#"stty -echo; printf 'pass''word: '; read p; echo "env:$p""#)
        .env("SSHPASS", "from-env")
        .output()
        .expect("Failed to execute passtty");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("env:from-env"), "stdout: {stdout}");
}

#[test]
fn test_host_authenticity_confirmed() {
    let output = passtty(&[
        "-p",
        "hunter2",
        "--",
        r#"printf '%s' 'The auth''enticity of host x (yes/no)? '; read a; stty -echo; printf 'pass''word: '; read p; echo "ans:$a got:$p""#,
    ]);

    assert!(
        output.status.success(),
        "passtty failed with stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ans:yes got:hunter2"), "stdout: {stdout}");
}

#[test]
fn test_host_authenticity_disabled() {
    let output = passtty(&[
        "-p",
        "hunter2",
        "--disable-ssh-host-confirm",
        "--",
        r#"printf '%s\n' 'The auth''enticity of host x'; sleep 5"#,
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("host authenticity confirmation required"),
        "stderr: {stderr}"
    );
}

#[test]
fn test_failure_marker() {
    let output = passtty(&[
        "-p",
        "wrong",
        "--",
        r#"stty -echo; printf 'pass''word: '; read p; echo "Permission den""ied""#,
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("authentication failure"), "stderr: {stderr}");
}

#[test]
fn test_repeated_prompt_is_failure() {
    let output = passtty(&[
        "-p",
        "wrong",
        "--",
        r#"stty -echo; printf 'pass''word: '; read p; printf 'pass''word: '; read p"#,
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("authentication failure"), "stderr: {stderr}");
}

#[test]
fn test_custom_prompt() {
    let output = passtty(&[
        "-p",
        "1234",
        "--prompt",
        "PIN>",
        "--",
        r#"stty -echo; printf 'PI''N> '; read p; echo "pin:$p""#,
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pin:1234"), "stdout: {stdout}");
}

#[test]
fn test_timeout() {
    let started = std::time::Instant::now();
    let output = passtty(&["-p", "hunter2", "--timeout", "300ms", "--", "sleep 5"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("timed out"), "stderr: {stderr}");
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

#[test]
fn test_missing_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_passtty"))
        .args(["-p", "hunter2"])
        .output()
        .expect("Failed to execute passtty");

    assert!(!output.status.success());
}
