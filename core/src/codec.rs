//! Plain-text record encoding for pod resources.
//!
//! # Design
//! A record set travels as one text blob: every record's `Display` form
//! followed by `'\n'`. Decoding splits on `'\n'` and drops trailing empty
//! fields, so the trailing separator written by `encode_records` does not
//! come back as an extra record.
//!
//! Two boundary cases fall out of those rules and are kept on purpose:
//! - the empty string decodes to `[""]`, not `[]`, so an encoded empty set
//!   does not round-trip;
//! - trailing empty records are lost (`["a", ""]` encodes to `"a\n\n"`,
//!   which decodes to `["a"]`).
//!
//! Records whose text contains `'\n'` are split into several records on the
//! way back. Callers that need exact round-trips must avoid embedded
//! newlines.

use std::fmt::Display;

/// Record separator used on the wire.
pub const RECORD_SEPARATOR: char = '\n';

/// Encode `records` as newline-terminated text.
///
/// `encode_records(&["one", "2", "true"])` yields `"one\n2\ntrue\n"`.
pub fn encode_records<T: Display>(records: &[T]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.to_string());
        out.push(RECORD_SEPARATOR);
    }
    out
}

/// Decode newline-separated text back into records.
pub fn decode_records(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut records: Vec<String> = text.split(RECORD_SEPARATOR).map(str::to_string).collect();
    while records.last().is_some_and(|r| r.is_empty()) {
        records.pop();
    }
    records
}
