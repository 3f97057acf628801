use std::path::Path;

use crate::error::{BatchError, Result};

/// A single spreadsheet cell, decoupled from the file format it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// String rendering used for reference values and duplicate keys.
    /// Integral floats drop the trailing ".0" a spreadsheet adds.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", *f as i64)
                } else {
                    f.to_string()
                }
            }
            Cell::Text(s) => s.trim().to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }

    /// Truthiness of flag columns like `jafoiprocessado`.
    pub fn as_bool(&self) -> bool {
        match self {
            Cell::Bool(b) => *b,
            Cell::Int(i) => *i != 0,
            Cell::Float(f) => *f != 0.0,
            Cell::Text(s) => matches!(
                s.trim().to_lowercase().as_str(),
                "true" | "1" | "sim" | "yes" | "verdadeiro"
            ),
            Cell::Empty => false,
        }
    }

    fn from_csv_field(field: &str) -> Cell {
        if field.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(field.to_string())
        }
    }
}

/// Column-name-addressed table. Header names are lowercased and trimmed on
/// ingestion so lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<&str>, rows: Vec<Vec<Cell>>) -> Self {
        Self::from_owned(headers.into_iter().map(str::to_string).collect(), rows)
    }

    pub fn from_owned(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        Table { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.headers.iter().position(|h| *h == wanted)
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .cloned()
            .unwrap_or(Cell::Empty)
    }

    pub fn cell_by_name(&self, row: usize, name: &str) -> Cell {
        match self.column_index(name) {
            Some(col) => self.cell(row, col),
            None => Cell::Empty,
        }
    }

    /// Which of `required` are absent from the header row.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| self.column_index(c).is_none())
            .map(|c| c.to_string())
            .collect()
    }
}

/// Load a tabular file by extension. CSV always works; XLSX needs the
/// `xlsx` feature.
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => load_csv(path),
        #[cfg(feature = "xlsx")]
        "xlsx" | "xls" | "xlsm" => load_xlsx(path),
        _ => Err(BatchError::UnsupportedFile(path.display().to_string())),
    }
}

fn load_csv(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        match &headers {
            None => {
                headers = Some(record.iter().map(str::to_string).collect());
            }
            Some(h) => {
                let mut row: Vec<Cell> = record.iter().map(Cell::from_csv_field).collect();
                row.resize(h.len().max(row.len()), Cell::Empty);
                rows.push(row);
            }
        }
    }
    let headers = headers.ok_or_else(|| {
        BatchError::Other(format!("{}: file is empty", path.display()))
    })?;
    Ok(Table::from_owned(headers, rows))
}

#[cfg(feature = "xlsx")]
fn load_xlsx(path: &Path) -> Result<Table> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| BatchError::Other(format!("Failed to open XLSX: {e}")))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| BatchError::Other(format!("{}: workbook has no sheets", path.display())))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| BatchError::Other(format!("Failed to read sheet '{sheet}': {e}")))?;

    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(row) => row.iter().map(data_to_text).collect(),
        None => {
            return Err(BatchError::Other(format!(
                "{}: sheet '{sheet}' is empty",
                path.display()
            )))
        }
    };
    let mut rows = Vec::new();
    for row in iter {
        let mut cells: Vec<Cell> = row.iter().map(data_to_cell).collect();
        cells.resize(headers.len().max(cells.len()), Cell::Empty);
        rows.push(cells);
    }
    Ok(Table::from_owned(headers, rows))
}

#[cfg(feature = "xlsx")]
fn data_to_cell(data: &calamine::Data) -> Cell {
    use calamine::Data;
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => Cell::from_csv_field(s),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

#[cfg(feature = "xlsx")]
fn data_to_text(data: &calamine::Data) -> String {
    data_to_cell(data).to_text()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_text() {
        assert_eq!(Cell::Int(1234).to_text(), "1234");
        assert_eq!(Cell::Float(123.0).to_text(), "123");
        assert_eq!(Cell::Float(100.5).to_text(), "100.5");
        assert_eq!(Cell::Text("  abc ".to_string()).to_text(), "abc");
        assert_eq!(Cell::Empty.to_text(), "");
    }

    #[test]
    fn test_cell_as_bool() {
        assert!(Cell::Bool(true).as_bool());
        assert!(Cell::Int(1).as_bool());
        assert!(Cell::Text("TRUE".to_string()).as_bool());
        assert!(Cell::Text("sim".to_string()).as_bool());
        assert!(!Cell::Text("false".to_string()).as_bool());
        assert!(!Cell::Empty.as_bool());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let table = Table::new(vec!["Matricula", " IDSETOR ", "Valor"], vec![]);
        assert_eq!(table.column_index("matricula"), Some(0));
        assert_eq!(table.column_index("idsetor"), Some(1));
        assert_eq!(table.column_index("VALOR"), Some(2));
        assert_eq!(table.column_index("nome"), None);
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "Matricula,IdSetor,Valor\n1234,5,\"100,50\"\n,,\n").unwrap();
        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["matricula", "idsetor", "valor"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), Cell::Text("1234".to_string()));
        assert_eq!(table.cell_by_name(0, "valor"), Cell::Text("100,50".to_string()));
        assert!(table.cell(1, 0).is_empty());
    }

    #[test]
    fn test_load_csv_pads_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        std::fs::write(&path, "a,b,c\n1\n").unwrap();
        let table = load_table(&path).unwrap();
        assert_eq!(table.cell(0, 2), Cell::Empty);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "x").unwrap();
        assert!(matches!(
            load_table(&path),
            Err(BatchError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn test_missing_columns() {
        let table = Table::new(vec!["matricula", "nome"], vec![]);
        assert!(table.missing_columns(&["matricula"]).is_empty());
        assert_eq!(table.missing_columns(&["id empresa", "nome"]), vec!["id empresa"]);
    }
}
