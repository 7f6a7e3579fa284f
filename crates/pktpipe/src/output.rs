use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pktpipe_frame::Packet;
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
struct PacketOutput<'a> {
    schema_id: &'a str,
    address: &'a str,
    length: usize,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

impl<'a> PacketOutput<'a> {
    fn new(packet: &Packet, address: &'a str) -> Self {
        Self {
            schema_id: "https://schemas.3leaps.dev/pktpipe/cli/v1/packet-received.schema.json",
            address,
            length: packet.wire_size(),
            payload_size: packet.payload.len(),
            payload: payload_preview(packet.payload.as_ref()),
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_packet(packet: &Packet, address: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PacketOutput::new(packet, address);
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "LENGTH", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    address.to_string(),
                    packet.wire_size().to_string(),
                    packet.payload.len().to_string(),
                    payload_preview(packet.payload.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "address={} length={} size={} payload={}",
                address,
                packet.wire_size(),
                packet.payload.len(),
                payload_preview(packet.payload.as_ref())
            );
        }
        OutputFormat::Raw => {
            print_raw(packet.payload.as_ref());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_marks_binary_payloads() {
        assert_eq!(payload_preview(b"hello"), "hello");
        assert_eq!(payload_preview(&[0xff, 0xfe, 0x00]), "<binary 3 bytes>");
    }

    #[test]
    fn json_output_carries_wire_and_payload_sizes() {
        let packet = Packet::new(b"ping".to_vec());
        let value = serde_json::to_value(PacketOutput::new(&packet, "svc_1"))
            .expect("output should serialize");

        assert_eq!(value["address"], "svc_1");
        assert_eq!(value["length"], 5);
        assert_eq!(value["payload_size"], 4);
        assert_eq!(value["payload"], "ping");
        assert!(value["schema_id"]
            .as_str()
            .is_some_and(|id| id.ends_with("packet-received.schema.json")));
    }
}
