use std::collections::HashMap;

use crate::error::{BatchError, Result};
use crate::normalize::normalize_identifier;
use crate::table::Table;

/// The three reference spreadsheets, each with its own column contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Employees,
    CostCenters,
    Categories,
}

impl RefKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Employees => "employees",
            Self::CostCenters => "cost centers",
            Self::Categories => "categories",
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            // The stakeholder id lives in the third positional column,
            // historically auto-named, so it cannot be required by name.
            Self::Employees => &["matricula"],
            Self::CostCenters => &["id empresa", "id cliente"],
            Self::Categories => &["id", "nome"],
        }
    }

    /// Fatal precondition check, run before any row processing.
    pub fn validate(&self, table: &Table, file: &str) -> Result<()> {
        let mut missing = table.missing_columns(self.required_columns());
        if *self == Self::Employees && table.headers.len() < 3 {
            missing.push("<stakeholder id (third column)>".to_string());
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BatchError::MissingColumns {
                file: file.to_string(),
                columns: missing.join(", "),
            })
        }
    }
}

/// Lookup map plus the keys that were overwritten while building it.
/// Duplicate keys are last-write-wins, never an error; the caller decides
/// whether to warn.
#[derive(Debug, Default)]
pub struct RefIndex {
    map: HashMap<i64, String>,
    pub overwritten: Vec<i64>,
}

impl RefIndex {
    pub fn get(&self, key: i64) -> Option<&str> {
        self.map.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    fn insert(&mut self, key: i64, value: String) {
        if self.map.insert(key, value).is_some() {
            self.overwritten.push(key);
        }
    }
}

fn require_column(table: &Table, name: &str, file: &str) -> Result<usize> {
    table.column_index(name).ok_or_else(|| BatchError::MissingColumns {
        file: file.to_string(),
        columns: name.to_string(),
    })
}

/// matricula (normalized) → stakeholder id, read from the third column.
/// Rows whose key does not normalize, or whose id cell is blank, are
/// skipped; they could never match anyway.
pub fn build_employee_index(table: &Table, file: &str) -> Result<RefIndex> {
    RefKind::Employees.validate(table, file)?;
    let key_col = require_column(table, "matricula", file)?;
    let mut index = RefIndex::default();
    for row in 0..table.len() {
        let Some(key) = normalize_identifier(&table.cell(row, key_col)) else {
            continue;
        };
        let value = table.cell(row, 2).to_text();
        if value.is_empty() {
            continue;
        }
        index.insert(key, value);
    }
    Ok(index)
}

/// id empresa (normalized) → id cliente.
pub fn build_cost_center_index(table: &Table, file: &str) -> Result<RefIndex> {
    RefKind::CostCenters.validate(table, file)?;
    let key_col = require_column(table, "id empresa", file)?;
    let value_col = require_column(table, "id cliente", file)?;
    let mut index = RefIndex::default();
    for row in 0..table.len() {
        let Some(key) = normalize_identifier(&table.cell(row, key_col)) else {
            continue;
        };
        let value = table.cell(row, value_col).to_text();
        if value.is_empty() {
            continue;
        }
        index.insert(key, value);
    }
    Ok(index)
}

/// Category name → category id. Names are matched case-insensitively.
pub fn build_category_index(table: &Table, file: &str) -> Result<HashMap<String, String>> {
    RefKind::Categories.validate(table, file)?;
    let id_col = require_column(table, "id", file)?;
    let name_col = require_column(table, "nome", file)?;
    let mut index = HashMap::new();
    for row in 0..table.len() {
        let name = table.cell(row, name_col).to_text();
        let id = table.cell(row, id_col).to_text();
        if name.is_empty() || id.is_empty() {
            continue;
        }
        index.insert(name.to_lowercase(), id);
    }
    Ok(index)
}
