//! RFC 4180 CSV encoding of rendered report rows.

use std::borrow::Cow;

use crate::{layout::ReportLayout, row::ReportRow};

/// Header line followed by one line per row, CRLF-terminated.
pub fn to_csv(layout: &ReportLayout, rows: &[ReportRow]) -> String {
    let mut out = header_record(layout);
    out.push_str(&rows_to_csv(rows));
    out
}

/// The encoded header line alone, CRLF included.
pub fn header_record(layout: &ReportLayout) -> String {
    let mut out = String::new();
    write_record(&mut out, layout.headers());
    out
}

/// Data lines only, for appending to a file that already has its header.
pub fn rows_to_csv(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    for row in rows {
        write_record(&mut out, row.cells.iter().map(String::as_str));
    }
    out
}

fn write_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (idx, field) in fields.into_iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field));
    }
    out.push_str("\r\n");
}

/// Quote a field that contains a comma, quote, CR, or LF; double inner quotes.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}
