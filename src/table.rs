use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::row::OutputRow;

/// Receives the rows of a section in frame order.
pub trait RowSink {
    fn push(&mut self, row: OutputRow) -> Result<()>;

    /// Called after every batch of rows.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RowSink for Vec<OutputRow> {
    fn push(&mut self, row: OutputRow) -> Result<()> {
        Vec::push(self, row);
        Ok(())
    }
}

/// Raw height table written as rows arrive: header line, then one line per row.
pub struct RowWriter {
    out: BufWriter<File>,
    rows: usize,
}

impl RowWriter {
    /// Creates the file and writes the header right away.
    pub fn create(path: &Path, columns: &[String]) -> Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{}", columns.iter().join(","))?;
        out.flush()?;
        Ok(RowWriter { out, rows: 0 })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl RowSink for RowWriter {
    fn push(&mut self, row: OutputRow) -> Result<()> {
        writeln!(self.out, "{}", row.to_csv_line())?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Comma separated table kept as text cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().filter(|line| !line.trim().is_empty());
        let columns: Vec<String> = lines
            .next()
            .ok_or_else(|| Error::table("missing header"))?
            .split(',')
            .map(|c| c.trim().to_owned())
            .collect();

        let mut rows = vec![];
        for (i, line) in lines.enumerate() {
            let cells: Vec<String> = line.split(',').map(|c| c.trim().to_owned()).collect();
            if cells.len() != columns.len() {
                return Err(Error::table(format!(
                    "row {} has {} cells, header has {}",
                    i + 1,
                    cells.len(),
                    columns.len()
                )));
            }
            rows.push(cells);
        }
        Ok(Table { columns, rows })
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
            .map_err(|e| Error::table(format!("{}: {e}", path.display())))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{}", self.columns.iter().join(","))?;
        for row in &self.rows {
            writeln!(out, "{}", row.iter().join(","))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Cells of column `index` as numbers, empty cells as NaN.
    pub fn numeric_column(&self, index: usize) -> Result<Vec<f64>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let cell = &row[index];
                if cell.is_empty() {
                    return Ok(f64::NAN);
                }
                cell.parse::<f64>().map_err(|_| {
                    Error::table(format!(
                        "row {}, column {}: {cell:?} is not a number",
                        i + 1,
                        self.columns[index]
                    ))
                })
            })
            .collect()
    }
}
