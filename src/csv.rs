// src/csv.rs
use std::io::{self, Write};
use std::mem::take;

/* ---------------- Parsing ---------------- */

/// Minimal CSV parser (quotes + CRLF tolerant). Blank lines are skipped.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = s!();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // double-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => {
                row.push(take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) { chars.next(); }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush a trailing row without newline, even if quotes were unterminated.
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// First record of `text` only; cheap header peek for large stores.
pub fn first_row(text: &str, sep: char) -> Option<Vec<String>> {
    let end = first_record_end(text);
    parse_rows(&text[..end], sep).into_iter().next()
}

// Byte offset just past the first unquoted line break (or end of text).
fn first_record_end(text: &str) -> usize {
    let mut in_quotes = false;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => return i + 1,
            _ => {}
        }
    }
    text.len()
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single row to any writer.
pub fn write_row<W: Write>(mut w: W, row: &[String], sep: char) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first { write!(w, "{}", sep)?; } else { first = false; }
        if needs_quotes(cell, sep) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_commas_and_crlf() {
        let text = "a,b\r\n\"x, y\",\"say \"\"hi\"\"\"\r\n\r\nlast,row";
        let rows = parse_rows(text, ',');
        assert_eq!(rows, vec![
            vec![s!("a"), s!("b")],
            vec![s!("x, y"), s!("say \"hi\"")],
            vec![s!("last"), s!("row")],
        ]);
    }

    #[test]
    fn write_then_parse_keeps_awkward_cells() {
        let row = vec![s!("Bazinga, Co"), s!("line\nbreak"), s!("")];
        let mut buf = Vec::new();
        write_row(&mut buf, &row, ',').unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "\"Bazinga, Co\",\"line\nbreak\",\n");
        assert_eq!(parse_rows(&text, ','), vec![row]);
    }

    #[test]
    fn header_peek_respects_quotes() {
        let text = "\"a\nb\",c\n1,2\n";
        assert_eq!(first_row(text, ','), Some(vec![s!("a\nb"), s!("c")]));
        assert_eq!(first_row("", ','), None);
    }
}
