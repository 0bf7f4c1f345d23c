use serde::{Deserialize, Serialize};

/// Grid dimension a coordinate or structural change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Axis {
    Column,
    Row,
}

impl Axis {
    /// The other dimension.
    pub fn other(self) -> Self {
        match self {
            Axis::Column => Axis::Row,
            Axis::Row => Axis::Column,
        }
    }

    /// Name used in persisted property keys (`column`/`row`).
    pub fn property_name(self) -> &'static str {
        match self {
            Axis::Column => "column",
            Axis::Row => "row",
        }
    }

    /// Capitalized name used inside camel-case property keys.
    pub fn title(self) -> &'static str {
        match self {
            Axis::Column => "Column",
            Axis::Row => "Row",
        }
    }
}
