//! Minimal CSV/TSV loader that produces a [`ListDataProvider`].

use super::ListDataProvider;
use crate::types::CellValue;

/// Field separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
        }
    }
}

impl ListDataProvider {
    /// Parse comma-separated text; every non-empty line becomes one data row.
    ///
    /// Numbers and booleans are detected per field; quoted fields keep embedded
    /// separators and `""` escapes.
    pub fn from_csv(text: &str) -> Self {
        Self::from_delimited(text, Delimiter::Comma)
    }

    pub fn from_delimited(text: &str, delimiter: Delimiter) -> Self {
        let sep = delimiter.as_char();
        let rows = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                split_csv_line(line, sep)
                    .iter()
                    .map(|field| CellValue::parse(field))
                    .collect()
            })
            .collect();
        Self::from_values(rows)
    }
}

/// Split a CSV line respecting quoted fields.
fn split_csv_line(line: &str, sep: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == sep {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}
