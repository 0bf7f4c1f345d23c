use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value as seen by the layer stack.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "t", content = "v")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl CellValue {
    /// Interpret user input, detecting the value type.
    ///
    /// - Empty string → `Empty`
    /// - "true"/"false" (case-insensitive) → `Boolean`
    /// - Parseable as f64 → `Number`
    /// - Otherwise → `Text`
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Boolean(false);
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return CellValue::Number(n);
        }
        CellValue::Text(trimmed.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Boolean(true) => f.write_str("TRUE"),
            CellValue::Boolean(false) => f.write_str("FALSE"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// Stable business identity of a row object, independent of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a row object represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowKind {
    /// A regular data row backed by the source collection.
    #[default]
    Data,
    /// A synthetic row (group header, summary) that is not a data record.
    Summary,
}

/// One row of the backing collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowObject {
    pub id: RowId,
    #[serde(default)]
    pub kind: RowKind,
    pub cells: Vec<CellValue>,
}

impl RowObject {
    /// Create a data row.
    pub fn new(id: RowId, cells: Vec<CellValue>) -> Self {
        Self {
            id,
            kind: RowKind::Data,
            cells,
        }
    }

    /// Create a synthetic summary row.
    pub fn summary(id: RowId, cells: Vec<CellValue>) -> Self {
        Self {
            id,
            kind: RowKind::Summary,
            cells,
        }
    }

    /// Value at `column`, `None` past the end of the row.
    pub fn cell(&self, column: usize) -> Option<&CellValue> {
        self.cells.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("" => CellValue::Empty ; "empty")]
    #[test_case("  TRUE " => CellValue::Boolean(true) ; "boolean")]
    #[test_case("42.5" => CellValue::Number(42.5) ; "number")]
    #[test_case("hello" => CellValue::Text("hello".into()) ; "text")]
    fn test_parse(input: &str) -> CellValue {
        CellValue::parse(input)
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Boolean(false).to_string(), "FALSE");
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Empty.to_string(), "");
    }
}
