use std::io::{IsTerminal, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use flamingo_frame::{ImageFrame, Response};
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
struct ResponseOutput<'a> {
    kind: &'static str,
    command: u32,
    command_name: Option<&'a str>,
    status: i32,
    hardware_id: i32,
    subsystem_id: i32,
    client_id: i32,
    int_data: [i32; 3],
    data_bits: u32,
    double_data: f64,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

pub fn print_response(response: &Response, command_name: Option<&str>, format: OutputFormat) {
    let frame = &response.frame;
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                kind: "response",
                command: frame.command,
                command_name,
                status: frame.status,
                hardware_id: frame.hardware_id,
                subsystem_id: frame.subsystem_id,
                client_id: frame.client_id,
                int_data: frame.int_data,
                data_bits: frame.data_bits,
                double_data: frame.double_data,
                payload_size: response.payload.len(),
                payload: payload_preview(&response.payload),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "STATUS", "PARAMS", "VALUE", "BITS", "PAYLOAD"])
                .add_row(vec![
                    command_label(frame.command, command_name),
                    frame.status.to_string(),
                    format!("{:?}", frame.int_data),
                    frame.double_data.to_string(),
                    format!("{:#x}", frame.data_bits),
                    payload_preview(&response.payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "command={} status={} params={:?} value={} bits={:#x} size={} payload={}",
                command_label(frame.command, command_name),
                frame.status,
                frame.int_data,
                frame.double_data,
                frame.data_bits,
                response.payload.len(),
                payload_preview(&response.payload)
            );
        }
        OutputFormat::Raw => print_raw(&response.payload),
    }
}

#[derive(Serialize)]
struct ImageOutput<'a> {
    kind: &'static str,
    index: u64,
    width: u32,
    height: u32,
    start_plane: u32,
    stop_plane: u32,
    payload_size: u32,
    min: u16,
    max: u16,
    mean: f64,
    saved: Option<&'a Path>,
}

pub fn print_image(index: u64, image: &ImageFrame, saved: Option<&Path>, format: OutputFormat) {
    let stats = PixelStats::of(image.pixels());
    match format {
        OutputFormat::Json => {
            let out = ImageOutput {
                kind: "image",
                index,
                width: image.width(),
                height: image.height(),
                start_plane: image.header.start_index(),
                stop_plane: image.header.stop_index(),
                payload_size: image.header.payload_size(),
                min: stats.min,
                max: stats.max,
                mean: stats.mean,
                saved,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "SIZE", "PLANES", "MIN", "MAX", "MEAN", "SAVED"])
                .add_row(vec![
                    index.to_string(),
                    format!("{}x{}", image.width(), image.height()),
                    format!(
                        "{}..{}",
                        image.header.start_index(),
                        image.header.stop_index()
                    ),
                    stats.min.to_string(),
                    stats.max.to_string(),
                    format!("{:.1}", stats.mean),
                    saved.map(|p| p.display().to_string()).unwrap_or_default(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "image={} size={}x{} planes={}..{} min={} max={} mean={:.1}",
                index,
                image.width(),
                image.height(),
                image.header.start_index(),
                image.header.stop_index(),
                stats.min,
                stats.max,
                stats.mean
            );
        }
        OutputFormat::Raw => {
            let bytes: Vec<u8> = image
                .pixels()
                .iter()
                .flat_map(|p| p.to_le_bytes())
                .collect();
            print_raw(&bytes);
        }
    }
}

#[derive(Serialize)]
struct MockReady {
    kind: &'static str,
    command_addr: String,
    live_addr: String,
}

/// Always a single JSON line so scripts can pick up the bound ports.
pub fn print_mock_ready(command_addr: SocketAddr, live_addr: SocketAddr) {
    print_json(&MockReady {
        kind: "mock-ready",
        command_addr: command_addr.to_string(),
        live_addr: live_addr.to_string(),
    });
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
    let _ = std::io::stdout().flush();
}

fn command_label(code: u32, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{name} ({code})"),
        None => code.to_string(),
    }
}

fn payload_preview(payload: &[u8]) -> String {
    if payload.is_empty() {
        return String::new();
    }
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

struct PixelStats {
    min: u16,
    max: u16,
    mean: f64,
}

impl PixelStats {
    fn of(pixels: &[u16]) -> Self {
        if pixels.is_empty() {
            return Self {
                min: 0,
                max: 0,
                mean: 0.0,
            };
        }
        let (min, max, sum) = pixels.iter().fold((u16::MAX, 0u16, 0u64), |acc, &p| {
            (acc.0.min(p), acc.1.max(p), acc.2 + u64::from(p))
        });
        Self {
            min,
            max,
            mean: sum as f64 / pixels.len() as f64,
        }
    }
}
