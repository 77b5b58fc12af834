//! Plain-text rendering of engine values for terminal output.

use common::prelude::{BlobStats, FileContent, Node, SweepReport};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn timestamp(t: OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_else(|_| t.to_string())
}

/// One `ls` line: kind marker, size, name (directories get a trailing `/`).
pub fn node_row(node: &Node) -> String {
    if node.is_dir() {
        format!("d {:>10}  {}/", "-", node.name)
    } else {
        format!("f {:>10}  {}", node.size, node.name)
    }
}

/// Long `ls` line, with content type and modification time.
pub fn node_row_long(node: &Node) -> String {
    format!(
        "{}  {:<24}  {}",
        node_row(node),
        node.content_type,
        timestamp(node.updated_at)
    )
}

pub fn listing(nodes: &[Node], long: bool) -> String {
    nodes
        .iter()
        .map(|n| if long { node_row_long(n) } else { node_row(n) })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn info(node: &Node) -> String {
    let mut out = format!(
        "Path: {}\nName: {}\nType: {}\nSize: {} bytes\nContent-Type: {}\nOwner: {}\nCreated: {}\nUpdated: {}",
        node.path,
        node.name,
        node.node_type(),
        node.size,
        node.content_type,
        node.owner_id,
        timestamp(node.created_at),
        timestamp(node.updated_at),
    );
    if let Some(blob_id) = node.blob_id() {
        out.push_str(&format!("\nBlob: {}", blob_id));
    }
    out
}

/// Text content as-is; anything else as a hex dump.
pub fn content(path: &str, content: &FileContent) -> String {
    match content.as_text() {
        Some(text) => text.to_string(),
        None => {
            let hex = content
                .bytes
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "File: {}\nSize: {} bytes\nBinary content ({}, hex): {}",
                path,
                content.bytes.len(),
                content.content_type,
                hex
            )
        }
    }
}

pub fn stats(stats: &BlobStats) -> String {
    format!(
        "Blobs: {}\nStored bytes: {}\nOrphaned blobs: {}",
        stats.blob_count, stats.total_bytes, stats.orphan_count
    )
}

pub fn sweep(label: &str, report: &SweepReport) -> String {
    let mut out = format!(
        "{}: reclaimed {}, failed {}",
        label,
        report.reclaimed.len(),
        report.failed.len()
    );
    for id in &report.failed {
        out.push_str(&format!("\n  failed: {}", id));
    }
    out
}
