use serde::ser::{Serialize, SerializeMap, Serializer};

/// One harvested table row: column name to trimmed cell text, in the order
/// the columns appeared in the document.
///
/// Deduplication identity is the sorted (column, value) pair set, so two rows
/// with the same content under a different column order compare equal. The
/// key is content-only: the source exposes no stable row id, and legitimately
/// distinct rows with identical visible text will merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    /// Dedup key: the cell pairs sorted and debug-formatted. The quoting
    /// keeps adjacent cells from running together.
    pub fn content_key(&self) -> String {
        let mut pairs: Vec<&(String, String)> = self.cells.iter().collect();
        pairs.sort();
        format!("{pairs:?}")
    }
}

impl FromIterator<(String, String)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub rows_collected: usize,
    pub exported: bool,
    pub reused_session: bool,
}
