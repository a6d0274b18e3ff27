//! Flat tables and their CSV rendering.

use serde::Serialize;

use super::error::RenderError;

/// A report flattened into header and rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Column names.
    pub headers: Vec<String>,
    /// Rows, each as wide as `headers`.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    #[must_use]
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.rows.push(row.into_iter().map(|c| c.to_string()).collect());
    }
}

/// Writes a table as RFC 4180 CSV with a header line.
///
/// # Errors
///
/// Returns `RenderError::Csv` if writing fails.
pub fn render_csv(table: &Table) -> Result<Vec<u8>, RenderError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| RenderError::Csv(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_csv_quotes_fields() {
        let mut table = Table::new(["number", "customer", "total"]);
        table.push(["COT-2026-0001", "Acme, Inc.", "21.40"]);
        table.push(["COT-2026-0002", "Say \"hi\"", "5.00"]);

        let csv = String::from_utf8(render_csv(&table).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "number,customer,total");
        assert_eq!(lines[1], "COT-2026-0001,\"Acme, Inc.\",21.40");
        assert_eq!(lines[2], "COT-2026-0002,\"Say \"\"hi\"\"\",5.00");
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let table = Table::new(["a", "b"]);
        let csv = String::from_utf8(render_csv(&table).unwrap()).unwrap();
        assert_eq!(csv, "a,b\n");
    }
}
