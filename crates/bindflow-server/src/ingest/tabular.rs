//! Forgiving delimited-text parser for uploaded ligand and target tables
//!
//! The parser never fails: malformed input degrades to partial data instead
//! of rejecting the whole submission. An unterminated quoted field yields a
//! best-effort field, and a trailing record without a line terminator is
//! flushed at end of input.

/// Parsed tabular file: one header row plus the raw data rows.
///
/// Records whose cells all trim to empty are discarded before the first
/// surviving record becomes the header row. Row cell counts are not
/// validated against the header count; short rows simply have missing cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabularDocument {
    /// Header cells, trimmed
    pub headers: Vec<String>,
    /// Data rows, kept unmodified
    pub rows: Vec<Vec<String>>,
}

impl TabularDocument {
    /// Case-insensitive position of a header column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InQuotes,
}

/// Parse delimited text into a [`TabularDocument`].
///
/// A leading byte order mark is stripped. The scanner has two states: in
/// `Normal`, a quote enters quoted mode, the separator ends the current
/// field, and `\n`, `\r`, or `\r\n` (consumed as one terminator) ends the
/// current record. In `InQuotes`, a doubled quote emits one literal quote
/// and everything else, separators and line terminators included, is copied
/// literally.
pub fn parse(text: &str, separator: char) -> TabularDocument {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = ScanState::Normal;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match state {
            ScanState::Normal => {
                if ch == '"' {
                    state = ScanState::InQuotes;
                } else if ch == separator {
                    record.push(std::mem::take(&mut field));
                } else if ch == '\n' || ch == '\r' {
                    if ch == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                } else {
                    field.push(ch);
                }
            },
            ScanState::InQuotes => {
                if ch == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        state = ScanState::Normal;
                    }
                } else {
                    field.push(ch);
                }
            },
        }
    }

    // Flush a trailing partial record. An unterminated quoted field ends up
    // here as a best-effort field.
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    let mut surviving = records
        .into_iter()
        .filter(|r| r.iter().any(|cell| !cell.trim().is_empty()));

    let headers = match surviving.next() {
        Some(first) => first.iter().map(|cell| cell.trim().to_string()).collect(),
        None => Vec::new(),
    };
    let rows = surviving.collect();

    TabularDocument { headers, rows }
}

/// Quote a field so that [`parse`] yields it back unchanged.
///
/// Only needed when the field contains the separator, a quote, or a line
/// terminator.
pub fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_csv(text: &str) -> TabularDocument {
        parse(text, ',')
    }

    #[test]
    fn test_simple_table() {
        let doc = parse_csv("smiles,name\nCCO,ethanol\nC,methane\n");
        assert_eq!(doc.headers, vec!["smiles", "name"]);
        assert_eq!(doc.rows.len(), 2);
        assert_eq!(doc.rows[0], vec!["CCO", "ethanol"]);
    }

    #[test]
    fn test_headers_are_trimmed_rows_are_not() {
        let doc = parse_csv(" smiles , name \nCCO, ethanol \n");
        assert_eq!(doc.headers, vec!["smiles", "name"]);
        assert_eq!(doc.rows[0], vec!["CCO", " ethanol "]);
    }

    #[test]
    fn test_strips_byte_order_mark() {
        let doc = parse_csv("\u{feff}smiles\nCCO\n");
        assert_eq!(doc.headers, vec!["smiles"]);
    }

    #[test]
    fn test_crlf_and_bare_cr_terminators() {
        let doc = parse_csv("a,b\r\n1,2\r3,4\n");
        assert_eq!(doc.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_quoted_separator_and_newline() {
        let doc = parse_csv("name,memo\nx,\"a,b\nc\"\n");
        assert_eq!(doc.rows[0], vec!["x", "a,b\nc"]);
    }

    #[test]
    fn test_doubled_quote_escapes() {
        let doc = parse_csv("name\n\"say \"\"hi\"\"\"\n");
        assert_eq!(doc.rows[0], vec!["say \"hi\""]);
    }

    #[test]
    fn test_unterminated_quote_yields_best_effort_field() {
        let doc = parse_csv("name\n\"unclosed,value");
        assert_eq!(doc.rows, vec![vec!["unclosed,value"]]);
    }

    #[test]
    fn test_blank_records_are_dropped() {
        let doc = parse_csv("\n  ,  \nsmiles\n\nCCO\n");
        assert_eq!(doc.headers, vec!["smiles"]);
        assert_eq!(doc.rows, vec![vec!["CCO"]]);
    }

    #[test]
    fn test_trailing_partial_record_is_flushed() {
        let doc = parse_csv("a,b\n1,2");
        assert_eq!(doc.rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn test_short_rows_are_kept() {
        let doc = parse_csv("a,b,c\n1\n1,2,3,4\n");
        assert_eq!(doc.rows[0], vec!["1"]);
        assert_eq!(doc.rows[1], vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_empty_input() {
        let doc = parse_csv("");
        assert!(doc.headers.is_empty());
        assert!(doc.rows.is_empty());
    }

    #[test]
    fn test_quote_round_trip() {
        for original in ["a,b", "line\nbreak", "say \"hi\"", "plain"] {
            let text = format!("col\n{}\n", quote_field(original));
            let doc = parse_csv(&text);
            assert_eq!(doc.rows[0][0], original, "round trip failed for {original:?}");
        }
    }

    #[test]
    fn test_column_index_is_case_insensitive() {
        let doc = parse_csv("SMILES,Name\nCCO,ethanol\n");
        assert_eq!(doc.column_index("smiles"), Some(0));
        assert_eq!(doc.column_index("NAME"), Some(1));
        assert_eq!(doc.column_index("sequence"), None);
    }
}
