//! Minimal CSV encoding for the buyer export endpoint.
//!
//! Follows RFC 4180 quoting: a field containing a double quote, comma, or
//! newline is wrapped in double quotes with embedded quotes doubled. All
//! other fields are written verbatim.

/// Returns the field encoded for inclusion in a CSV row.
pub fn escape_field(field: &str) -> String {
    if field.contains('"') || field.contains(',') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Append one CSV row (escaped, comma-joined, newline-terminated) to `out`.
pub fn write_row(out: &mut String, fields: &[String]) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape_field(field));
    }
    out.push('\n');
}
