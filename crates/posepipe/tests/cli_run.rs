#![cfg(all(unix, feature = "cli"))]

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;

use posepipe::wire::{LandmarkSet, MessageReader};

const WIDTH: usize = 4;
const HEIGHT: usize = 2;
const FRAME_SIZE: usize = WIDTH * HEIGHT * 3;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/posepipe-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn posepipe() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_posepipe"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn run_over(frames: &Path, points: &Path, extra: &[&str]) -> Output {
    posepipe()
        .arg("--format")
        .arg("json")
        .arg("run")
        .arg("--frames")
        .arg(frames)
        .arg("--points")
        .arg(points)
        .arg("--width")
        .arg(WIDTH.to_string())
        .arg("--height")
        .arg(HEIGHT.to_string())
        .args(extra)
        .output()
        .expect("run should start")
}

fn decode_file(path: &Path) -> Vec<LandmarkSet> {
    let bytes = fs::read(path).expect("points file should exist");
    MessageReader::new(Cursor::new(bytes))
        .map(|message| {
            posepipe::wire::decode_landmarks(&message.expect("message should frame"))
                .expect("payload should decode")
        })
        .collect()
}

#[test]
fn clean_run_writes_one_message_per_frame() {
    let dir = unique_temp_dir("clean");
    let frames = dir.join("frames.raw");
    let points = dir.join("points.bin");
    fs::write(&frames, vec![7u8; FRAME_SIZE * 3]).unwrap();

    let output = run_over(&frames, &points, &[]);

    assert!(output.status.success(), "{output:?}");
    let sets = decode_file(&points);
    assert_eq!(sets.len(), 3);
    assert!(sets.iter().all(LandmarkSet::is_empty));
    assert_eq!(fs::read(&points).unwrap(), vec![0u8; 12]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"frames_processed\":3"));
    assert!(stdout.contains("\"state\":\"draining\""));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn truncated_frame_exits_60() {
    let dir = unique_temp_dir("truncated");
    let frames = dir.join("frames.raw");
    let points = dir.join("points.bin");
    fs::write(&frames, vec![1u8; FRAME_SIZE * 2 - 1]).unwrap();

    let output = run_over(&frames, &points, &[]);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("truncated-frame"), "{stderr}");
    assert_eq!(decode_file(&points).len(), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn replay_results_are_written_in_frame_order() {
    let dir = unique_temp_dir("replay");
    let frames = dir.join("frames.raw");
    let points = dir.join("points.bin");
    let replay = dir.join("poses.json");
    fs::write(&frames, vec![0u8; FRAME_SIZE * 3]).unwrap();
    fs::write(
        &replay,
        r#"[
            [{"x": 0.5, "y": 0.25, "z": -1.0}],
            {"error": "transient", "message": "blur"},
            [{"x": 1.0, "y": 2.0, "z": 3.0}, {"x": 4.0, "y": 5.0, "z": 6.0}]
        ]"#,
    )
    .unwrap();

    let output = run_over(
        &frames,
        &points,
        &["--estimator", "replay", "--replay", replay.to_str().unwrap()],
    );

    assert!(output.status.success(), "{output:?}");
    let sets = decode_file(&points);
    assert_eq!(sets.len(), 3);
    assert_eq!(sets[0].points()[0].y, 0.25);
    assert!(sets[1].is_empty());
    assert_eq!(sets[2].len(), 2);
    assert_eq!(sets[2].points()[1].z, 6.0);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"empty_detections\":0"), "{stdout}");
    assert!(stdout.contains("\"recovered_failures\":1"), "{stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn fatal_estimator_error_exits_1() {
    let dir = unique_temp_dir("fatal");
    let frames = dir.join("frames.raw");
    let points = dir.join("points.bin");
    let replay = dir.join("poses.json");
    fs::write(&frames, vec![0u8; FRAME_SIZE * 4]).unwrap();
    fs::write(&replay, r#"[[], {"error": "fatal", "message": "model lost"}]"#).unwrap();

    let output = run_over(
        &frames,
        &points,
        &["--estimator", "replay", "--replay", replay.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("estimation-failure"), "{stderr}");
    assert_eq!(decode_file(&points).len(), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn zero_width_is_usage_error() {
    let dir = unique_temp_dir("geometry");
    let output = posepipe()
        .arg("run")
        .arg("--frames")
        .arg(dir.join("frames.raw"))
        .arg("--points")
        .arg(dir.join("points.bin"))
        .arg("--width")
        .arg("0")
        .output()
        .expect("run should start");

    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("invalid frame geometry").count(), 1, "{stderr}");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn oversized_geometry_is_usage_error() {
    let dir = unique_temp_dir("oversized");
    let frames = dir.join("frames.raw");
    fs::write(&frames, b"").unwrap();

    let output = posepipe()
        .arg("run")
        .arg("--frames")
        .arg(&frames)
        .arg("--points")
        .arg(dir.join("points.bin"))
        .arg("--width")
        .arg("200000")
        .arg("--height")
        .arg("200000")
        .output()
        .expect("run should start");

    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "), "{stderr}");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn failure_is_reported_once_at_default_log_level() {
    let dir = unique_temp_dir("one-diagnostic");
    let frames = dir.join("frames.raw");
    fs::write(&frames, vec![1u8; FRAME_SIZE * 2 - 1]).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_posepipe"))
        .env_remove("POSEPIPE_LOG")
        .env_remove("POSEPIPE_LOG_LEVEL")
        .arg("run")
        .arg("--frames")
        .arg(&frames)
        .arg("--points")
        .arg(dir.join("points.bin"))
        .arg("--width")
        .arg(WIDTH.to_string())
        .arg("--height")
        .arg(HEIGHT.to_string())
        .output()
        .expect("run should start");

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr
        .lines()
        .filter(|line| line.contains("truncated"))
        .collect();
    assert_eq!(lines.len(), 1, "{stderr}");
    assert!(lines[0].starts_with("error: pipeline failed [truncated-frame]"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_frame_file_is_transport_error() {
    let dir = unique_temp_dir("missing");
    let output = run_over(&dir.join("absent.raw"), &dir.join("points.bin"), &[]);

    assert_eq!(output.status.code(), Some(3));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn stdio_endpoints_stream_through() {
    let mut child = posepipe()
        .arg("run")
        .arg("--frames")
        .arg("-")
        .arg("--points")
        .arg("-")
        .arg("--width")
        .arg(WIDTH.to_string())
        .arg("--height")
        .arg(HEIGHT.to_string())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("run should start");

    let mut stdin = child.stdin.take().expect("stdin should be piped");
    stdin.write_all(&vec![0u8; FRAME_SIZE * 2]).unwrap();
    drop(stdin);

    let output = child.wait_with_output().expect("run should finish");
    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0u8; 8]);
}

#[test]
fn named_pipes_end_to_end() {
    let dir = unique_temp_dir("fifo");
    let frames = dir.join("frame_pipe");
    let points = dir.join("points_pipe");

    let status = posepipe()
        .arg("mkfifo")
        .arg(&frames)
        .arg(&points)
        .stdout(Stdio::null())
        .status()
        .expect("mkfifo should run");
    assert!(status.success());

    let child = posepipe()
        .arg("run")
        .arg("--frames")
        .arg(&frames)
        .arg("--points")
        .arg(&points)
        .arg("--width")
        .arg(WIDTH.to_string())
        .arg("--height")
        .arg(HEIGHT.to_string())
        .stdout(Stdio::null())
        .spawn()
        .expect("run should start");

    // Frame pipe first, matching the order the pipeline opens them.
    let producer = {
        let frames = frames.clone();
        thread::spawn(move || {
            let mut pipe = fs::OpenOptions::new()
                .write(true)
                .open(&frames)
                .expect("frame pipe should open");
            pipe.write_all(&vec![9u8; FRAME_SIZE * 4]).unwrap();
        })
    };

    let mut received = Vec::new();
    fs::File::open(&points)
        .expect("points pipe should open")
        .read_to_end(&mut received)
        .unwrap();
    producer.join().unwrap();

    let output = child.wait_with_output().expect("run should finish");
    assert!(output.status.success());
    assert_eq!(received, vec![0u8; 16]);

    let _ = fs::remove_dir_all(&dir);
}
