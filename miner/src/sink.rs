//! CSV tables for mined events and releases.

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use toggle_core::{Column, EventSink, ToggleEvent, ToggleRow};

/// How an existing output table is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Keep existing rows; the header is only written to a new or empty file.
    #[default]
    Append,
    /// Truncate and start over.
    Overwrite,
}

/// A CSV file with a fixed header.
pub struct CsvWriter {
    path: PathBuf,
    out: BufWriter<File>,
    rows: usize,
}

impl CsvWriter {
    /// Open `path`, creating parent directories. The header is written at
    /// most once per file.
    pub fn create(path: &Path, headers: &[&str], mode: WriteMode) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = match mode {
            WriteMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
            WriteMode::Overwrite => File::create(path)?,
        };
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            rows: 0,
        };
        if needs_header {
            writer.write_line(headers.iter().copied())?;
        }
        Ok(writer)
    }

    /// Append one record.
    pub fn write_row<S: AsRef<str>>(&mut self, cells: &[S]) -> io::Result<()> {
        self.write_line(cells.iter().map(AsRef::as_ref))?;
        self.rows += 1;
        Ok(())
    }

    fn write_line<'a>(&mut self, cells: impl Iterator<Item = &'a str>) -> io::Result<()> {
        let line = cells.map(escape).collect::<Vec<_>>().join(",");
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")
    }

    /// Flush and return the number of rows written by this writer.
    pub fn finish(mut self) -> io::Result<usize> {
        self.out.flush()?;
        Ok(self.rows)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
pub fn escape(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}

/// Event sink writing one row per event with a profile's column set.
pub struct ToggleTable {
    writer: CsvWriter,
    columns: Vec<Column>,
}

impl ToggleTable {
    pub fn create(path: &Path, columns: Vec<Column>, mode: WriteMode) -> io::Result<Self> {
        let headers: Vec<&str> = columns.iter().map(Column::header).collect();
        let writer = CsvWriter::create(path, &headers, mode)?;
        Ok(Self { writer, columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    pub fn finish(self) -> io::Result<usize> {
        self.writer.finish()
    }
}

impl EventSink for ToggleTable {
    type Error = io::Error;

    fn accept(&mut self, event: &ToggleEvent<'_>) -> Result<(), Self::Error> {
        let row = ToggleRow::from(event);
        let cells: Vec<String> = self.columns.iter().map(|c| row.cell(*c)).collect();
        self.writer.write_row(&cells)
    }
}
