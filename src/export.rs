use crate::models::Row;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write the full harvest as a pretty-printed JSON array, overwriting any
/// previous export at the same path.
pub fn write_rows(path: &Path, rows: &[Row]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.flush()
}
