use std::io::{IsTerminal, Write};
use std::path::Path;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use posepipe::pipeline::PipelineReport;
use posepipe::wire::{encode_landmarks, LandmarkPoint, LandmarkSet};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct LandmarksOutput<'a> {
    message: u64,
    count: usize,
    landmarks: &'a [LandmarkPoint],
}

#[derive(Serialize)]
struct FifoOutput<'a> {
    path: &'a Path,
    created: bool,
}

pub fn print_landmarks(message: u64, set: &LandmarkSet, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", landmarks_json(message, set)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["MESSAGE", "POINT", "X", "Y", "Z"]);
            if set.is_empty() {
                table.add_row(vec![message.to_string(), "-".to_string()]);
            }
            for (i, point) in set.iter().enumerate() {
                table.add_row(vec![
                    message.to_string(),
                    i.to_string(),
                    point.x.to_string(),
                    point.y.to_string(),
                    point.z.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", landmarks_pretty(message, set)),
        OutputFormat::Raw => print_raw(&encode_landmarks(set)),
    }
}

pub fn print_report(report: &PipelineReport, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAMES", "MESSAGES", "EMPTY", "RECOVERED"])
                .add_row(vec![
                    report.frames_processed.to_string(),
                    report.messages_written.to_string(),
                    report.empty_detections.to_string(),
                    report.recovered_failures.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frames={} messages={} empty={} recovered={}",
                report.frames_processed,
                report.messages_written,
                report.empty_detections,
                report.recovered_failures
            );
        }
    }
}

pub fn print_fifo(path: &Path, created: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            let out = FifoOutput { path, created };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            let verb = if created { "created" } else { "exists" };
            println!("{verb} {}", path.display());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn landmarks_json(message: u64, set: &LandmarkSet) -> String {
    let out = LandmarksOutput {
        message,
        count: set.len(),
        landmarks: set.points(),
    };
    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
}

fn landmarks_pretty(message: u64, set: &LandmarkSet) -> String {
    if set.is_empty() {
        return format!("message={message} landmarks=0 (no pose)");
    }
    let points: Vec<String> = set
        .iter()
        .map(|p| format!("({:.4}, {:.4}, {:.4})", p.x, p.y, p.z))
        .collect();
    format!(
        "message={message} landmarks={} {}",
        set.len(),
        points.join(" ")
    )
}
