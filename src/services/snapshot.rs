//! CSV rendering of a record snapshot
//!
//! Used both as the table handed to the summarization gateway and for the
//! admin export. Fields are quoted per RFC 4180 when they contain a comma,
//! a double quote or a line break.

use crate::storage::sqlite::format_timestamp;
use crate::types::QualityRecord;

/// Column order shared by every CSV this crate writes
pub const CSV_HEADER: &str = "id,branch,chef_name,dish_name,score,notes,created_at";

/// Serialize up to `cap` records, newest first
///
/// `records` are expected newest first, as the store returns them; when there
/// are more than `cap`, the oldest are dropped.
pub fn serialize_snapshot(records: &[QualityRecord], cap: usize) -> String {
    let mut newest: Vec<&QualityRecord> = records.iter().collect();
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    newest.truncate(cap);

    let mut out = String::with_capacity(CSV_HEADER.len() + newest.len() * 64);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for record in newest {
        push_row(&mut out, record);
    }
    out
}

/// Serialize every record, newest first
pub fn serialize_all(records: &[QualityRecord]) -> String {
    serialize_snapshot(records, records.len())
}

fn push_row(out: &mut String, record: &QualityRecord) {
    let fields = [
        record.id.to_string(),
        quote(&record.branch),
        quote(&record.chef_name),
        quote(&record.dish_name),
        record.score.to_string(),
        quote(&record.notes),
        format_timestamp(&record.created_at),
    ];
    out.push_str(&fields.join(","));
    out.push('\n');
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
