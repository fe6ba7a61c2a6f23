// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//!
//! Output formatting for `docsync` commands.
//!
//! - **Table**: Human-readable columnar output using `comfy-table`.
//! - **JSON**: Pretty-printed JSON for scripts.

use clap::ValueEnum;
use comfy_table::{Cell, ContentArrangement, Table};
use docsync_attachments::{CollectReport, SavedAttachment};
use docsync_store::DocumentRevision;
use serde_json::{json, Value};

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn format_revision(revision: &DocumentRevision, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => pretty(&json!({
            "id": revision.doc_id,
            "rev": revision.rev_id.to_string(),
            "sequence": revision.sequence,
        })),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec![Cell::new("Field"), Cell::new("Value")]);
            table.add_row(vec![Cell::new("id"), Cell::new(&revision.doc_id)]);
            table.add_row(vec![Cell::new("rev"), Cell::new(revision.rev_id.to_string())]);
            table.add_row(vec![Cell::new("sequence"), Cell::new(revision.sequence)]);
            table.to_string()
        }
    }
}

pub fn format_attachments(attachments: &[SavedAttachment], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let rows: Vec<Value> = attachments
                .iter()
                .map(|a| {
                    json!({
                        "name": a.name,
                        "type": a.mime_type,
                        "length": a.length,
                        "revpos": a.revpos,
                        "digest": a.key.to_hex(),
                    })
                })
                .collect();
            pretty(&Value::Array(rows))
        }
        OutputFormat::Table => {
            if attachments.is_empty() {
                return "(no attachments)".to_string();
            }
            let mut table = new_table();
            table.set_header(vec!["name", "type", "length", "revpos", "digest"]);
            for a in attachments {
                table.add_row(vec![
                    Cell::new(&a.name),
                    Cell::new(&a.mime_type),
                    Cell::new(a.length),
                    Cell::new(a.revpos),
                    Cell::new(a.key.to_hex()),
                ]);
            }
            table.to_string()
        }
    }
}

pub fn format_report(report: &CollectReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => pretty(&json!({
            "scanned": report.scanned,
            "retained": report.retained,
            "deleted": report.deleted,
            "failed": report.failed,
        })),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["scanned", "retained", "deleted", "failed"]);
            table.add_row(vec![
                report.scanned,
                report.retained,
                report.deleted,
                report.failed,
            ]);
            table.to_string()
        }
    }
}
