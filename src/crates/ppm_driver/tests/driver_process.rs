use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde_json::{json, Value};
use tempfile::tempdir;

fn driver_bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ppm-driver"))
}

fn driver_command() -> Command {
    let mut cmd = Command::new(driver_bin_path());
    cmd.env("PPM_DRIVER_COOLDOWN_MS", "0")
        .env("PPM_DRIVER_SEED", "11")
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    cmd
}

#[test]
fn wrong_marker_exits_with_status_two() {
    let mut child = driver_command().spawn().expect("driver should launch");
    let mut stdin = child.stdin.take().expect("stdin");
    stdin.write_all(b"PMP").expect("write marker");
    drop(stdin);

    let mut stdout = String::new();
    child
        .stdout
        .take()
        .expect("stdout")
        .read_to_string(&mut stdout)
        .expect("read output");
    let status = child.wait().expect("driver should exit");

    assert_eq!(status.code(), Some(2));
    assert!(stdout.is_empty(), "no protocol traffic expected: {stdout}");
}

#[test]
fn serves_create_then_delete_over_stdio() {
    let dir = tempdir().expect("temp dir");
    let transcript = dir.path().join("transcript");

    let mut child = driver_command()
        .env("PPM_DRIVER_TRANSCRIPT", &transcript)
        .spawn()
        .expect("driver should launch");
    let mut stdin = child.stdin.take().expect("stdin");
    let mut lines = BufReader::new(child.stdout.take().expect("stdout")).lines();

    stdin.write_all(b"PpM").expect("write marker");
    stdin.flush().expect("flush marker");

    let create: Value = serde_json::from_str(&lines.next().expect("create line").unwrap())
        .expect("create should be json");
    assert_eq!(create["method"], json!("Server.CreateObject"));
    assert_eq!(create["id"], json!(1));
    assert!(create["params"][0]["PhysicsOptions"]["Destination"].is_object());

    writeln!(stdin, "{}", json!({ "id": 1, "result": 42 })).expect("reply");
    stdin.flush().expect("flush reply");

    let delete: Value = serde_json::from_str(&lines.next().expect("delete line").unwrap())
        .expect("delete should be json");
    assert_eq!(
        delete,
        json!({ "id": 0, "method": "Server.DeleteObject", "params": [42] })
    );

    // The next create goes out, then the driver sees EOF and stops cleanly.
    drop(stdin);
    let status = child.wait().expect("driver should exit");
    assert_eq!(status.code(), Some(0));

    let recorded = std::fs::read_to_string(&transcript).expect("transcript");
    assert_eq!(recorded, "{\"id\":1,\"result\":42}\n");
}

#[test]
fn malformed_reply_exits_with_failure() {
    let mut child = driver_command().spawn().expect("driver should launch");
    let mut stdin = child.stdin.take().expect("stdin");
    stdin.write_all(b"PpMnot json\n").expect("write input");
    drop(stdin);

    let mut stdout = String::new();
    child
        .stdout
        .take()
        .expect("stdout")
        .read_to_string(&mut stdout)
        .expect("read output");
    let status = child.wait().expect("driver should exit");

    assert_eq!(status.code(), Some(1));
    let sent: Vec<_> = stdout.lines().collect();
    assert_eq!(sent.len(), 1, "only the create should be sent: {stdout}");
    assert!(sent[0].contains("Server.CreateObject"));
}
