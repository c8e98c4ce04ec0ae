use std::process::Command;

#[test]
fn no_arguments_prints_usage_and_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_viewer"))
        .output()
        .expect("failed to run viewer");

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "unexpected usage output: {stdout:?}");
    assert!(lines[0].starts_with("Usage: "));
    assert!(lines[0].ends_with(" <model_file> [msaa]"));
    assert_eq!(lines[1], "  msaa - Enable 4x MSAA antialiasing");
}

#[cfg(unix)]
#[test]
fn non_utf8_model_path_does_not_panic() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    let mut child = Command::new(env!("CARGO_BIN_EXE_viewer"))
        .arg(OsStr::from_bytes(b"caf\xe9.obj"))
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run viewer");

    // Headless machines exit on window creation; with a display the viewer
    // keeps running on the failed-load screen until killed.
    let deadline = Instant::now() + Duration::from_secs(5);
    while child.try_wait().expect("failed to poll viewer").is_none() && Instant::now() < deadline
    {
        std::thread::sleep(Duration::from_millis(50));
    }
    let _ = child.kill();

    let output = child.wait_with_output().expect("failed to collect viewer");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_ne!(output.status.code(), Some(101), "viewer panicked: {stderr}");
    assert!(!stderr.contains("panicked"), "viewer panicked: {stderr}");
}
