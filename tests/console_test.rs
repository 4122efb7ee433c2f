use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn hearth_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hearth"))
}

/// Run the console in `tmp` with `script` piped to stdin.
fn run_console(tmp: &TempDir, script: &str) -> Output {
    let mut child = hearth_cmd()
        .current_dir(tmp.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // The child may exit (e.g. on a fatal startup error) before consuming all
    // of stdin, which surfaces here as a BrokenPipe. That is expected for such
    // cases, so only a genuine write failure should abort the test.
    match child.stdin.as_mut().unwrap().write_all(script.as_bytes()) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
        Err(e) => panic!("failed to write to child stdin: {e}"),
    }
    child.wait_with_output().unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn first_line(output: &Output) -> String {
    stdout_of(output).lines().next().unwrap().to_string()
}

#[test]
fn test_create_then_show() {
    let tmp = TempDir::new().unwrap();

    let output = run_console(&tmp, "create User\n");
    assert!(output.status.success());
    let id = first_line(&output);
    assert_eq!(id.len(), 36);

    let output = run_console(&tmp, &format!("show User {id}\n"));
    assert!(output.status.success());
    let shown = first_line(&output);
    assert!(shown.starts_with(&format!("[User] ({id})")));
}

#[test]
fn test_records_survive_restart() {
    let tmp = TempDir::new().unwrap();

    let output = run_console(&tmp, "create State\n");
    let id = first_line(&output);
    assert!(tmp.path().join("file.json").exists());

    // fresh process, same working directory
    let output = run_console(&tmp, &format!("show State {id}\n"));
    assert!(output.status.success());
    assert!(first_line(&output).starts_with(&format!("[State] ({id})")));
}

#[test]
fn test_destroy_then_show_reports_no_instance() {
    let tmp = TempDir::new().unwrap();

    let output = run_console(&tmp, "create State\n");
    let id = first_line(&output);

    let script = format!("destroy State {id}\nshow State {id}\n");
    let output = run_console(&tmp, &script);
    assert!(output.status.success());
    assert_eq!(first_line(&output), "** no instance found **");
}

#[test]
fn test_update_then_show_reflects_attribute() {
    let tmp = TempDir::new().unwrap();

    let output = run_console(&tmp, "create Amenity\n");
    let id = first_line(&output);

    let script = format!("update Amenity {id} name \"Pool\"\nshow Amenity {id}\n");
    let output = run_console(&tmp, &script);
    assert!(output.status.success());
    assert!(first_line(&output).contains("'name': 'Pool'"));
}

#[test]
fn test_all_lists_everything_and_filters_by_kind() {
    let tmp = TempDir::new().unwrap();

    run_console(&tmp, "create User\ncreate City\ncreate City\n");

    let output = run_console(&tmp, "all\nall City\n");
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    let mut lines = stdout.lines();

    let everything = lines.next().unwrap();
    assert_eq!(everything.matches("[User]").count(), 1);
    assert_eq!(everything.matches("[City]").count(), 2);

    let cities = lines.next().unwrap();
    assert_eq!(cities.matches("[City]").count(), 2);
    assert!(!cities.contains("[User]"));
}

#[test]
fn test_unknown_kind_is_rejected_without_mutation() {
    let tmp = TempDir::new().unwrap();

    let script = "create Hotel\nshow Hotel 1\ndestroy Hotel 1\nupdate Hotel 1 name x\nall Hotel\n";
    let output = run_console(&tmp, script);
    assert!(output.status.success());
    for line in stdout_of(&output).lines() {
        assert_eq!(line, "** class doesn't exist **");
    }
    assert!(!tmp.path().join("file.json").exists());
}

#[test]
fn test_dotted_count() {
    let tmp = TempDir::new().unwrap();

    let script = "create Amenity\ncreate Amenity\ncreate Amenity\ncreate User\n";
    run_console(&tmp, script);

    let output = run_console(&tmp, "Amenity.count()\n");
    assert!(output.status.success());
    assert_eq!(first_line(&output), "3");
}

#[test]
fn test_dotted_update_with_mapping() {
    let tmp = TempDir::new().unwrap();

    let output = run_console(&tmp, "create Place\n");
    let id = first_line(&output);

    let script = format!(
        "Place.update(\"{id}\", {{'name': 'Cabin', 'max_guest': 4}})\nshow Place {id}\n"
    );
    let output = run_console(&tmp, &script);
    assert!(output.status.success());
    let shown = first_line(&output);
    assert!(shown.contains("'name': 'Cabin'"));
    assert!(shown.contains("'max_guest': 4"));
}

#[test]
fn test_quit_stops_the_loop() {
    let tmp = TempDir::new().unwrap();

    let output = run_console(&tmp, "quit\ncreate User\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "");
    assert!(!tmp.path().join("file.json").exists());
}

#[test]
fn test_end_of_input_exits_cleanly() {
    let tmp = TempDir::new().unwrap();

    let output = run_console(&tmp, "");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn test_unrecognized_input_is_silent() {
    let tmp = TempDir::new().unwrap();

    let output = run_console(&tmp, "frobnicate\nHotel.all()\nUser.show(bare)\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn test_corrupt_storage_file_is_fatal() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("file.json"), "{broken").unwrap();

    let output = run_console(&tmp, "all\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
}

#[test]
fn test_coercion_failure_is_fatal() {
    let tmp = TempDir::new().unwrap();

    let output = run_console(&tmp, "create Place\n");
    let id = first_line(&output);

    let output = run_console(&tmp, &format!("update Place {id} max_guest many\n"));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot coerce"));
}

#[test]
fn test_file_flag_overrides_storage_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("records.json");

    let mut child = hearth_cmd()
        .current_dir(tmp.path())
        .args(["--file", path.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(b"create Review\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert!(path.exists());
    assert!(!tmp.path().join("file.json").exists());
}
