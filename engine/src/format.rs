//! Cell rendering for display.
//!
//! Every cell becomes a string: NULL is spelled out, timestamps are
//! normalized, blobs are decoded when they are plausibly text and summarized
//! otherwise. When a search term is active the output is HTML-escaped and
//! matches are wrapped in `<mark>` tags, so the strings are safe to drop
//! into markup as-is.

use crate::backend::{CellValue, SqlRow};

/// Rendered form of SQL NULL.
pub const NULL_DISPLAY: &str = "NULL";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders one row. `search_term` empty means plain text output.
pub fn format_row(row: &SqlRow, search_term: &str) -> Vec<String> {
    row.iter().map(|cell| format_cell(cell, search_term)).collect()
}

/// Renders one cell, highlighting the search term if present.
pub fn format_cell(cell: &CellValue, search_term: &str) -> String {
    let text = match cell {
        CellValue::Null => NULL_DISPLAY.to_string(),
        CellValue::Int(v) => v.to_string(),
        CellValue::Float(v) => v.to_string(),
        CellValue::Text(s) => s.clone(),
        CellValue::Blob(bytes) => decode_blob(bytes),
        CellValue::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
    };
    if search_term.is_empty() {
        text
    } else {
        highlight(&html_escape(&text), search_term)
    }
}

/// Decodes a blob for display: UTF-8 if valid, printable Latin-1 as a last
/// resort, and a size placeholder for everything else.
fn decode_blob(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    if bytes.iter().copied().all(is_printable_latin1) {
        return bytes.iter().map(|&b| b as char).collect();
    }
    format!("<Binary {} bytes>", bytes.len())
}

fn is_printable_latin1(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\r' | 0x20..=0x7e | 0xa0..=0xff)
}

/// Escapes the characters that matter in element content. Ampersand goes
/// first so the other replacements are not double-escaped.
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Wraps each case-insensitive occurrence of `term` in `<mark>` tags. The
/// match runs over the already-escaped text, so a term containing markup
/// characters simply never matches.
pub fn highlight(escaped: &str, term: &str) -> String {
    if term.is_empty() {
        return escaped.to_string();
    }
    let haystack = escaped.to_ascii_lowercase();
    let needle = term.to_ascii_lowercase();

    let mut out = String::with_capacity(escaped.len());
    let mut pos = 0;
    while let Some(found) = haystack[pos..].find(&needle) {
        let start = pos + found;
        let end = start + needle.len();
        out.push_str(&escaped[pos..start]);
        out.push_str("<mark>");
        out.push_str(&escaped[start..end]);
        out.push_str("</mark>");
        pos = end;
    }
    out.push_str(&escaped[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn null_and_numbers_render_plainly() {
        assert_eq!(format_cell(&CellValue::Null, ""), "NULL");
        assert_eq!(format_cell(&CellValue::Int(-42), ""), "-42");
        assert_eq!(format_cell(&CellValue::Float(2.5), ""), "2.5");
    }

    #[test]
    fn timestamps_use_a_fixed_layout() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(
            format_cell(&CellValue::Timestamp(ts), ""),
            "2024-03-09 14:05:00"
        );
    }

    #[test]
    fn utf8_blobs_decode_as_text() {
        let cell = CellValue::Blob("héllo".as_bytes().to_vec());
        assert_eq!(format_cell(&cell, ""), "héllo");
    }

    #[test]
    fn latin1_blobs_decode_when_fully_printable() {
        // 0xe9 is é in Latin-1 but not valid UTF-8 on its own
        let cell = CellValue::Blob(vec![b'c', b'a', b'f', 0xe9]);
        assert_eq!(format_cell(&cell, ""), "café");
    }

    #[test]
    fn control_bytes_force_the_binary_placeholder() {
        let cell = CellValue::Blob(vec![0x00, 0x01, 0xff, 0x80]);
        assert_eq!(format_cell(&cell, ""), "<Binary 4 bytes>");
    }

    #[test]
    fn escaping_happens_before_highlighting() {
        let cell = CellValue::Text("a<b & smith".to_string());
        assert_eq!(
            format_cell(&cell, "smith"),
            "a&lt;b &amp; <mark>smith</mark>"
        );
    }

    #[test]
    fn highlight_is_case_insensitive_and_repeats() {
        assert_eq!(
            highlight("Smith and SMITH", "smith"),
            "<mark>Smith</mark> and <mark>SMITH</mark>"
        );
    }

    #[test]
    fn term_with_markup_characters_never_matches_escaped_text() {
        let cell = CellValue::Text("x < y".to_string());
        assert_eq!(format_cell(&cell, "<"), "x &lt; y");
    }

    #[test]
    fn repeated_formatting_is_stable_over_mixed_cells() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        let row: SqlRow = vec![
            CellValue::Null,
            CellValue::Blob(vec![0xff, 0x00, 0xfe]),
            CellValue::Timestamp(ts),
        ];
        let expected = vec![
            "NULL".to_string(),
            "<Binary 3 bytes>".to_string(),
            "2024-03-09 14:05:00".to_string(),
        ];
        for _ in 0..1000 {
            assert_eq!(format_row(&row, ""), expected);
        }
    }

    #[test]
    fn highlight_does_not_compound_over_repeated_passes() {
        let mut text = html_escape("agent smith");
        for _ in 0..1000 {
            let next = highlight(&text, "zzz");
            assert_eq!(next, text);
            text = next;
        }
    }

    #[test]
    fn format_row_maps_every_cell() {
        let row: SqlRow = vec![
            CellValue::Int(1),
            CellValue::Text("Smith".to_string()),
            CellValue::Null,
        ];
        assert_eq!(
            format_row(&row, "smith"),
            vec!["1", "<mark>Smith</mark>", "NULL"]
        );
    }
}
