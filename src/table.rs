//! Minimal tabular row container used by the pipeline.
//!
//! Columns are ordered and addressed by name; every cell is a string.
//! CSV encoding/decoding lives behind the `with-csv` feature so the core
//! stays free of I/O concerns.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column '{0}' not found")]
    MissingColumn(String),
    #[error("row has {got} cells, table has {expected} columns")]
    RowWidth { expected: usize, got: usize },
    #[cfg(feature = "with-csv")]
    #[error("CSV error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows (headers excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), TableError> {
        if row.len() != self.headers.len() {
            return Err(TableError::RowWidth {
                expected: self.headers.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Copy of the table with one extra column filled with `value` on every row.
    pub fn with_constant_column(&self, name: &str, value: &str) -> Table {
        let mut headers = self.headers.clone();
        headers.push(name.to_string());
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.push(value.to_string());
                row
            })
            .collect();
        Table { headers, rows }
    }
}

#[cfg(feature = "with-csv")]
impl Table {
    /// Read a CSV stream into a table, keeping every value as a string.
    ///
    /// Short rows are padded with empty cells and long rows truncated so the
    /// table stays rectangular, mirroring lenient spreadsheet ingestion.
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|source| TableError::Csv { source })?
            .iter()
            .map(str::to_string)
            .collect();
        let width = headers.len();
        let mut table = Table::new(headers);
        for record in rdr.records() {
            let record = record.map_err(|source| TableError::Csv { source })?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Encode the table as UTF-8 CSV bytes (headers first).
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, TableError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(&self.headers)
            .map_err(|source| TableError::Csv { source })?;
        for row in &self.rows {
            wtr.write_record(row)
                .map_err(|source| TableError::Csv { source })?;
        }
        wtr.into_inner()
            .map_err(|e| TableError::Csv { source: e.into_error().into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(vec!["email".into(), "name".into()]);
        t.push_row(vec!["a@x.com".into(), "Ada".into()]).unwrap();
        t
    }

    #[test]
    fn column_lookup() {
        let t = sample();
        assert_eq!(t.column_index("name").unwrap(), 1);
        assert!(matches!(
            t.column_index("missing"),
            Err(TableError::MissingColumn(_))
        ));
    }

    #[test]
    fn rejects_ragged_row() {
        let mut t = sample();
        let err = t.push_row(vec!["only-one".into()]).unwrap_err();
        assert!(matches!(err, TableError::RowWidth { expected: 2, got: 1 }));
    }

    #[test]
    fn constant_column_appended() {
        let t = sample().with_constant_column("reasons", "suppressed");
        assert_eq!(t.headers().last().map(String::as_str), Some("reasons"));
        assert_eq!(t.rows()[0][2], "suppressed");
    }

    #[cfg(feature = "with-csv")]
    #[test]
    fn csv_reads_padded_rows() {
        let data = "email,name\na@x.com,Ada\nb@x.com\n";
        let t = Table::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[1], vec!["b@x.com".to_string(), String::new()]);
    }
}
